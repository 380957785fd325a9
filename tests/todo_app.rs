//! A small application driven end to end through the facade crate.

use serde_json::json;
use weft::prelude::*;
use weft::{MemoryDom, NativeEvent, TopLevelType};

#[derive(Debug, Default)]
struct Todos {
    next: u32,
    items: Vec<(u32, String, bool)>,
}

/// Adds an item per click on "add"; clicking an item toggles it, double
/// clicking removes it.
struct TodoList;

impl Component for TodoList {
    type Props = String;
    type State = Todos;

    fn init_state(_title: &String) -> Todos {
        Todos::default()
    }

    fn project(title: &String, state: &Todos, id: &IdPath) -> Projection {
        let add = {
            let id = id.clone();
            Projection::element(ElementProps::new("button").text("add").on(
                EventKind::Click,
                move |_, rt| {
                    rt.update_state::<TodoList>(&id, |todos| {
                        todos.next += 1;
                        let label = format!("item {}", todos.next);
                        todos.items.push((todos.next, label, false));
                    })
                },
            ))
        };

        let items = state.items.iter().fold(
            ElementProps::new("ul"),
            |list, (key, label, done)| {
                let toggle = id.clone();
                let remove = id.clone();
                let key = *key;
                let mut item = ElementProps::new("li")
                    .text(label.clone())
                    .on(EventKind::Click, move |_, rt| {
                        rt.update_state::<TodoList>(&toggle, |todos| {
                            if let Some(entry) = todos.items.iter_mut().find(|e| e.0 == key) {
                                entry.2 = !entry.2;
                            }
                        })
                    })
                    .on(EventKind::DoubleClick, move |_, rt| {
                        rt.update_state::<TodoList>(&remove, |todos| {
                            todos.items.retain(|e| e.0 != key);
                        })
                    });
                if *done {
                    item = item
                        .merge_style(json!({ "text-decoration": "line-through" }))
                        .unwrap();
                }
                list.child(format!("t{key}"), Projection::element(item))
            },
        );

        Projection::element(
            ElementProps::new("div")
                .child("title", Projection::element(ElementProps::new("h1").text(title.clone())))
                .child("add", add)
                .child("items", Projection::element(items)),
        )
    }
}

fn dom(rt: &Runtime) -> &MemoryDom {
    rt.dom_as::<MemoryDom>().unwrap()
}

fn event(kind: TopLevelType, target: &str) -> NativeEvent {
    NativeEvent::new(kind).with_target(IdPath::parse(target).unwrap())
}

fn mounted() -> (Runtime, IdPath) {
    weft::logging::init();
    let mut rt = Runtime::new(MemoryDom::with_container("app"));
    let root = rt
        .mount("app", &Projection::of::<TodoList>("Todo".into()), MountMode::Immediate)
        .unwrap();
    (rt, root)
}

#[test]
fn adding_items_grows_the_keyed_list() {
    let (mut rt, root) = mounted();
    assert_eq!(root.as_str(), ".top");
    assert_eq!(dom(&rt).text(".top.s.title"), Some("Todo"));
    assert!(dom(&rt).child_ids(".top.s.items").is_empty());

    rt.dispatch(event(TopLevelType::Click, ".top.s.add")).unwrap();
    rt.dispatch(event(TopLevelType::Click, ".top.s.add")).unwrap();

    assert_eq!(
        dom(&rt).child_ids(".top.s.items"),
        [".top.s.items.t1", ".top.s.items.t2"]
    );
    assert_eq!(dom(&rt).text(".top.s.items.t2"), Some("item 2"));
}

#[test]
fn toggling_styles_and_removal_releases_listeners() {
    let (mut rt, _root) = mounted();
    for _ in 0..3 {
        rt.dispatch(event(TopLevelType::Click, ".top.s.add")).unwrap();
    }

    rt.dispatch(event(TopLevelType::Click, ".top.s.items.t2")).unwrap();
    assert_eq!(
        dom(&rt).attribute(".top.s.items.t2", "style"),
        Some("text-decoration: line-through;")
    );

    rt.dispatch(event(TopLevelType::Click, ".top.s.items.t2")).unwrap();
    assert_eq!(dom(&rt).attribute(".top.s.items.t2", "style"), None);

    rt.dispatch(event(TopLevelType::DoubleClick, ".top.s.items.t2")).unwrap();
    assert_eq!(
        dom(&rt).child_ids(".top.s.items"),
        [".top.s.items.t1", ".top.s.items.t3"]
    );
    assert!(!dom(&rt).contains(".top.s.items.t2"));
    assert!(
        rt.listeners()
            .keys()
            .iter()
            .all(|key| !key.starts_with(".top.s.items.t2@"))
    );
}

#[test]
fn unmounting_the_app_clears_everything() {
    let (mut rt, root) = mounted();
    rt.dispatch(event(TopLevelType::Click, ".top.s.add")).unwrap();

    rt.unmount(&root).unwrap();

    assert!(dom(&rt).child_ids("app").is_empty());
    assert!(rt.listeners().keys().is_empty());
    assert_eq!(rt.roots().count(), 0);
}
