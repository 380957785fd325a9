//! End-to-end scenarios for reconciliation and event dispatch.
//!
//! Every test drives a [`Runtime`] over a [`MemoryDom`] and checks the DOM
//! shape, the mutation log and the registries afterwards.

use core::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use crate::{
    Component, ElementProps, Error, EventKind, IdPath, MemoryDom, Mode, MountMode, Mutation,
    NativeEvent, Projection, Runtime, RuntimeConfig, Timer, TimerRequest, TopLevelType,
};

// ============================================================================
// Test Infrastructure
// ============================================================================

fn id(raw: &str) -> IdPath {
    IdPath::parse(raw).unwrap()
}

fn runtime() -> Runtime {
    Runtime::new(MemoryDom::with_container("app"))
}

fn memory(rt: &Runtime) -> &MemoryDom {
    rt.dom_as::<MemoryDom>().unwrap()
}

fn take_mutations(rt: &mut Runtime) -> Vec<Mutation> {
    rt.dom_as_mut::<MemoryDom>().unwrap().take_mutations()
}

fn li(name: &str) -> Projection {
    Projection::element(ElementProps::new("li").text(name))
}

fn list(names: &[&str]) -> Projection {
    let props = names
        .iter()
        .fold(ElementProps::new("ul"), |props, name| props.child(*name, li(name)));
    Projection::element(props)
}

fn ids(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| (*s).to_owned()).collect()
}

type Log = Rc<RefCell<Vec<String>>>;

fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

/// Appends `label` to `log` whenever invoked.
fn record(
    log: &Log,
    label: &str,
) -> impl Fn(&crate::AbstractEvent, &mut Runtime) -> crate::Result<()> + 'static {
    let log = Rc::clone(log);
    let label = label.to_owned();
    move |_, _| {
        log.borrow_mut().push(label.clone());
        Ok(())
    }
}

fn click(target: &str) -> NativeEvent {
    NativeEvent::new(TopLevelType::Click).with_target(id(target))
}

/// A button counting its own clicks.
struct Counter;

impl Component for Counter {
    type Props = String;
    type State = u32;

    fn init_state(_label: &String) -> u32 {
        0
    }

    fn project(label: &String, count: &u32, id: &IdPath) -> Projection {
        let id = id.clone();
        Projection::element(
            ElementProps::new("button")
                .text(format!("{label}: {count}"))
                .on(EventKind::Click, move |_, rt| {
                    rt.update_state::<Counter>(&id, |count| *count += 1)
                }),
        )
    }
}

/// Projects a `div` or a `span` depending on its props.
struct Switcher;

impl Component for Switcher {
    type Props = bool;
    type State = ();

    fn init_state(_props: &bool) {}

    fn project(as_div: &bool, _state: &(), _id: &IdPath) -> Projection {
        let tag = if *as_div { "div" } else { "span" };
        Projection::element(ElementProps::new(tag).text(tag))
    }
}

/// Remembers the last props it was handed.
struct Echo;

impl Component for Echo {
    type Props = String;
    type State = Vec<String>;

    fn init_state(props: &String) -> Vec<String> {
        vec![props.clone()]
    }

    fn prop_trigger(next: &String, seen: &mut Vec<String>) {
        seen.push(next.clone());
    }

    fn project(props: &String, _state: &Vec<String>, _id: &IdPath) -> Projection {
        li(props)
    }
}

// ============================================================================
// Reconciliation
// ============================================================================

#[test]
fn mount_renders_the_tree_under_the_container() {
    let mut rt = runtime();
    let root = rt.mount("app", &list(&["a", "b"]), MountMode::Immediate).unwrap();
    assert_eq!(root, id(".top"));
    let dom = memory(&rt);
    assert_eq!(dom.child_ids("app"), ids(&[".top"]));
    assert_eq!(dom.child_ids(".top"), ids(&[".top.a", ".top.b"]));
    assert_eq!(dom.text(".top.b"), Some("b"));
    assert_eq!(rt.registry().len(), 3);
}

#[test]
fn roots_get_numbered_names() {
    let mut rt = runtime();
    let first = rt.mount("app", &li("x"), MountMode::Immediate).unwrap();
    let second = rt.mount("app", &li("y"), MountMode::Immediate).unwrap();
    let third = rt.mount("app", &li("z"), MountMode::Immediate).unwrap();
    assert_eq!(
        [first.as_str(), second.as_str(), third.as_str()],
        [".top", ".top1", ".top2"]
    );
    rt.unmount(&second).unwrap();
    assert_eq!(memory(&rt).child_ids("app"), ids(&[".top", ".top2"]));
    assert!(matches!(rt.unmount(&second), Err(Error::UnknownInstance(_))));
}

#[test]
fn kept_children_keep_their_instance() {
    let mut rt = runtime();
    rt.mount("app", &list(&["a", "b", "c"]), MountMode::Immediate)
        .unwrap();
    let before = rt.instance(&id(".top.b")).unwrap();

    rt.update_root(&id(".top"), &list(&["a", "b", "c", "d"]))
        .unwrap();

    let after = rt.instance(&id(".top.b")).unwrap();
    assert!(Rc::ptr_eq(&before, &after));
    assert_eq!(
        memory(&rt).child_ids(".top"),
        ids(&[".top.a", ".top.b", ".top.c", ".top.d"])
    );
}

#[test]
fn identical_update_touches_nothing() {
    let mut rt = runtime();
    let tree = |value: &str| {
        Projection::element(
            ElementProps::new("form")
                .child("counter", Projection::of::<Counter>("clicks".to_owned()))
                .child(
                    "name",
                    Projection::element(ElementProps::new("input").value(value)),
                )
                .child("items", list(&["x", "y"]))
                .placeholder("hidden"),
        )
    };
    rt.mount("app", &tree("ada"), MountMode::Immediate).unwrap();
    take_mutations(&mut rt);

    rt.update_root(&id(".top"), &tree("ada")).unwrap();
    assert!(take_mutations(&mut rt).is_empty());

    // the user typed; re-asserting what is already there must not write
    rt.dom_as_mut::<MemoryDom>()
        .unwrap()
        .type_value(".top.name", "grace");
    rt.update_root(&id(".top"), &tree("grace")).unwrap();
    assert!(take_mutations(&mut rt).is_empty());

    rt.update_root(&id(".top"), &tree("")).unwrap();
    assert_eq!(
        take_mutations(&mut rt),
        [Mutation::Value {
            id: ".top.name".to_owned()
        }]
    );
}

#[test]
fn changed_props_write_only_the_difference() {
    let mut rt = runtime();
    let item = |class: Option<&str>, color: &str, text: &str| {
        let props = ElementProps::new("div")
            .attr("title", "fixed")
            .style_property("color", color)
            .text(text);
        Projection::element(match class {
            Some(class) => props.class(class),
            None => props,
        })
    };
    rt.mount("app", &item(Some("on"), "red", "hi"), MountMode::Immediate)
        .unwrap();
    take_mutations(&mut rt);

    rt.update_root(&id(".top"), &item(None, "blue", "hi")).unwrap();
    let dom = memory(&rt);
    assert_eq!(dom.attribute(".top", "class"), None);
    assert_eq!(dom.attribute(".top", "style"), Some("color: blue;"));
    assert_eq!(dom.attribute(".top", "title"), Some("fixed"));
    assert_eq!(
        take_mutations(&mut rt),
        [
            Mutation::Attribute {
                id: ".top".to_owned(),
                name: "class".to_owned()
            },
            Mutation::Attribute {
                id: ".top".to_owned(),
                name: "style".to_owned()
            },
        ]
    );

    rt.update_root(&id(".top"), &item(None, "blue", "bye")).unwrap();
    assert_eq!(memory(&rt).text(".top"), Some("bye"));
    assert_eq!(
        take_mutations(&mut rt),
        [Mutation::Content {
            id: ".top".to_owned()
        }]
    );
}

#[test]
fn scroll_top_is_written_when_it_changes() {
    let mut rt = runtime();
    let pane = |top: f64| Projection::element(ElementProps::new("div").scroll_top(top));
    rt.mount("app", &pane(0.0), MountMode::Immediate).unwrap();
    rt.update_root(&id(".top"), &pane(120.0)).unwrap();
    assert_eq!(memory(&rt).scroll_top(".top"), Some(120.0));
    take_mutations(&mut rt);
    rt.update_root(&id(".top"), &pane(120.0)).unwrap();
    assert!(take_mutations(&mut rt).is_empty());
}

#[test]
fn dangerous_html_goes_through_the_explicit_path() {
    let mut rt = runtime();
    rt.mount(
        "app",
        &Projection::element(ElementProps::new("div").dangerous_html("<b>x</b>")),
        MountMode::Immediate,
    )
    .unwrap();
    assert_eq!(memory(&rt).inner_html(".top"), Some("<b>x</b>"));

    let err = rt
        .mount(
            "app",
            &Projection::element(ElementProps::new("div").attr("innerHTML", "<b>x</b>")),
            MountMode::Immediate,
        )
        .unwrap_err();
    assert_eq!(err, Error::UnsafeInnerHtml(id(".top1")));
    assert!(rt.instance(&id(".top1")).is_none());
    assert_eq!(memory(&rt).child_ids("app"), ids(&[".top"]));
}

#[test]
fn type_change_remounts_the_slot() {
    let mut rt = runtime();
    let with = |child: Projection| Projection::element(ElementProps::new("div").child("slot", child));
    rt.mount(
        "app",
        &with(Projection::element(
            ElementProps::new("p").on(EventKind::Click, |_, _| Ok(())),
        )),
        MountMode::Immediate,
    )
    .unwrap();
    let before = rt.instance(&id(".top.slot")).unwrap();
    take_mutations(&mut rt);

    rt.update_root(&id(".top"), &with(li("now a list item")))
        .unwrap();

    let after = rt.instance(&id(".top.slot")).unwrap();
    assert!(!Rc::ptr_eq(&before, &after));
    assert_eq!(after.borrow().maker().name(), "li");
    assert!(rt.listeners().is_empty());
    assert_eq!(
        take_mutations(&mut rt),
        [
            Mutation::Remove {
                id: ".top.slot".to_owned()
            },
            Mutation::Insert {
                parent: ".top".to_owned(),
                id: ".top.slot".to_owned()
            },
        ]
    );
}

#[test]
fn composite_type_change_replaces_in_place() {
    let mut rt = runtime();
    rt.mount("app", &Projection::of::<Switcher>(true), MountMode::Immediate)
        .unwrap();
    assert_eq!(memory(&rt).text(".top.s"), Some("div"));
    take_mutations(&mut rt);

    rt.update_root(&id(".top"), &Projection::of::<Switcher>(false))
        .unwrap();

    assert_eq!(memory(&rt).text(".top.s"), Some("span"));
    assert_eq!(
        take_mutations(&mut rt),
        [Mutation::Replace {
            old: ".top.s".to_owned(),
            new: ".top.s".to_owned()
        }]
    );
}

#[test]
fn prop_trigger_runs_before_every_control() {
    let mut rt = runtime();
    rt.mount("app", &Projection::of::<Echo>("a".to_owned()), MountMode::Immediate)
        .unwrap();
    rt.update_root(&id(".top"), &Projection::of::<Echo>("b".to_owned()))
        .unwrap();
    rt.update_root(&id(".top"), &Projection::of::<Echo>("c".to_owned()))
        .unwrap();
    let seen = rt
        .with_component::<Echo, _>(&id(".top"), |echo| echo.state().clone())
        .unwrap();
    assert_eq!(seen, ["a", "b", "c"]);
    assert_eq!(memory(&rt).text(".top.s"), Some("c"));
}

#[test]
fn falsy_children_are_placeholders_without_dom() {
    let mut rt = runtime();
    let tree = |show: bool| {
        let props = ElementProps::new("div").child("first", li("first"));
        let props = if show {
            props.child("maybe", li("maybe"))
        } else {
            props.placeholder("maybe")
        };
        Projection::element(props.child("last", li("last")))
    };
    rt.mount("app", &tree(false), MountMode::Immediate).unwrap();
    assert_eq!(memory(&rt).child_ids(".top"), ids(&[".top.first", ".top.last"]));

    rt.update_root(&id(".top"), &tree(true)).unwrap();
    assert_eq!(
        memory(&rt).child_ids(".top"),
        ids(&[".top.first", ".top.maybe", ".top.last"])
    );

    rt.update_root(&id(".top"), &tree(false)).unwrap();
    assert_eq!(memory(&rt).child_ids(".top"), ids(&[".top.first", ".top.last"]));
    assert!(rt.instance(&id(".top.maybe")).is_none());
}

#[test]
fn eviction_pool_reuses_displaced_children() {
    let mut rt = runtime();
    rt.mount(
        "app",
        &list(&["A", "B", "C", "D", "E", "F", "Z", "Q"]),
        MountMode::Immediate,
    )
    .unwrap();
    let z = rt.instance(&id(".top.Z")).unwrap();
    let q = rt.instance(&id(".top.Q")).unwrap();
    take_mutations(&mut rt);

    rt.update_root(
        &id(".top"),
        &list(&["A", "B", "C", "D", "E", "F", "Q", "R", "Z"]),
    )
    .unwrap();

    assert_eq!(
        memory(&rt).child_ids(".top"),
        ids(&[
            ".top.A", ".top.B", ".top.C", ".top.D", ".top.E", ".top.F", ".top.Q", ".top.R",
            ".top.Z"
        ])
    );
    assert!(Rc::ptr_eq(&z, &rt.instance(&id(".top.Z")).unwrap()));
    assert!(Rc::ptr_eq(&q, &rt.instance(&id(".top.Q")).unwrap()));
    assert_eq!(rt.registry().len(), 10);
    // Q only stepped over the evicted Z, so it stays where it is
    assert_eq!(
        take_mutations(&mut rt),
        [
            Mutation::Insert {
                parent: ".top".to_owned(),
                id: ".top.R".to_owned()
            },
            Mutation::Move {
                id: ".top.Z".to_owned(),
                after: Some(".top.R".to_owned())
            },
        ]
    );
}

#[test]
fn unclaimed_evictions_are_deallocated() {
    let mut rt = runtime();
    rt.mount("app", &list(&["A", "B", "C", "D"]), MountMode::Immediate)
        .unwrap();
    take_mutations(&mut rt);

    rt.update_root(&id(".top"), &list(&["D", "A", "X"])).unwrap();

    assert_eq!(
        memory(&rt).child_ids(".top"),
        ids(&[".top.D", ".top.A", ".top.X"])
    );
    assert!(rt.instance(&id(".top.B")).is_none());
    assert!(rt.instance(&id(".top.C")).is_none());
    assert_eq!(rt.registry().len(), 4);
    let removed: Vec<_> = take_mutations(&mut rt)
        .into_iter()
        .filter(|m| matches!(m, Mutation::Remove { .. }))
        .collect();
    assert_eq!(removed.len(), 2);
}

#[test]
fn reversing_keyed_children_keeps_every_instance() {
    let mut rt = runtime();
    let names = ["a", "b", "c", "d", "e"];
    rt.mount("app", &list(&names), MountMode::Immediate).unwrap();
    let before: Vec<_> = names
        .iter()
        .map(|name| rt.instance(&id(".top").child(name)).unwrap())
        .collect();

    let mut reversed = names;
    reversed.reverse();
    rt.update_root(&id(".top"), &list(&reversed)).unwrap();

    assert_eq!(
        memory(&rt).child_ids(".top"),
        ids(&[".top.e", ".top.d", ".top.c", ".top.b", ".top.a"])
    );
    for (name, old) in names.iter().zip(&before) {
        assert!(Rc::ptr_eq(old, &rt.instance(&id(".top").child(name)).unwrap()));
    }
}

#[test]
fn deleting_from_the_middle_only_removes() {
    let mut rt = runtime();
    rt.mount("app", &list(&["A", "X", "B", "C", "D", "E"]), MountMode::Immediate)
        .unwrap();
    take_mutations(&mut rt);

    rt.update_root(&id(".top"), &list(&["A", "B", "C", "D", "E"]))
        .unwrap();

    assert_eq!(
        take_mutations(&mut rt),
        [Mutation::Remove {
            id: ".top.X".to_owned()
        }]
    );
    assert_eq!(
        memory(&rt).child_ids(".top"),
        ids(&[".top.A", ".top.B", ".top.C", ".top.D", ".top.E"])
    );
}

#[test]
fn inserting_in_the_middle_only_inserts() {
    let mut rt = runtime();
    rt.mount("app", &list(&["A", "B", "C"]), MountMode::Immediate)
        .unwrap();
    let b = rt.instance(&id(".top.B")).unwrap();
    take_mutations(&mut rt);

    rt.update_root(&id(".top"), &list(&["A", "N", "B", "C"]))
        .unwrap();

    assert_eq!(
        take_mutations(&mut rt),
        [Mutation::Insert {
            parent: ".top".to_owned(),
            id: ".top.N".to_owned()
        }]
    );
    assert_eq!(
        memory(&rt).child_ids(".top"),
        ids(&[".top.A", ".top.N", ".top.B", ".top.C"])
    );
    assert!(Rc::ptr_eq(&b, &rt.instance(&id(".top.B")).unwrap()));
}

#[test]
fn a_failed_pass_leaves_the_list_usable() {
    let mut rt = runtime();
    rt.mount("app", &list(&["A", "B"]), MountMode::Immediate)
        .unwrap();
    let a = rt.instance(&id(".top.A")).unwrap();

    // a new child that fails to mount
    let bad = Projection::element(
        ElementProps::new("ul")
            .child("A", li("A"))
            .child("B", li("B"))
            .child(
                "bad",
                Projection::element(ElementProps::new("li").attr("innerHTML", "<b>x</b>")),
            ),
    );
    assert_eq!(
        rt.update_root(&id(".top"), &bad),
        Err(Error::UnsafeInnerHtml(id(".top.bad")))
    );
    assert!(rt.instance(&id(".top.bad")).is_none());

    // an existing child that fails to control
    let bad = Projection::element(
        ElementProps::new("ul")
            .child("B", li("B"))
            .child("A", Projection::element(ElementProps::new("li").attr("innerHTML", "")))
            .child("C", li("C")),
    );
    assert!(rt.update_root(&id(".top"), &bad).is_err());

    rt.update_root(&id(".top"), &list(&["A", "B"])).unwrap();
    assert_eq!(memory(&rt).child_ids(".top"), ids(&[".top.A", ".top.B"]));
    assert!(Rc::ptr_eq(&a, &rt.instance(&id(".top.A")).unwrap()));
    assert_eq!(rt.registry().len(), 3);
}

#[test]
fn keys_that_are_not_segments_are_rejected() {
    let mut rt = runtime();
    assert_eq!(
        rt.mount("app", &list(&["alice@example.com"]), MountMode::Immediate),
        Err(Error::InvalidKey("alice@example.com".to_owned()))
    );
    assert_eq!(rt.registry().len(), 0);
    assert!(memory(&rt).child_ids("app").is_empty());

    let root = rt
        .mount("app", &list(&["alice", "bob"]), MountMode::Immediate)
        .unwrap();
    take_mutations(&mut rt);
    assert_eq!(
        rt.update_root(&root, &list(&["alice", ""])),
        Err(Error::InvalidKey(String::new()))
    );
    assert!(take_mutations(&mut rt).is_empty());
    rt.update_root(&root, &list(&["bob"])).unwrap();
    assert_eq!(memory(&rt).child_ids(root.as_str()), [format!("{root}.bob")]);
}

#[test]
fn ordered_children_shrink_and_grow() {
    let mut rt = runtime();
    let items = |n: usize| {
        Projection::element(
            ElementProps::new("ol").ordered((0..n).map(|i| li(&i.to_string())).collect()),
        )
    };
    rt.mount("app", &items(5), MountMode::Immediate).unwrap();
    let first = rt.instance(&id(".top.0")).unwrap();
    take_mutations(&mut rt);

    rt.update_root(&id(".top"), &items(2)).unwrap();
    assert_eq!(memory(&rt).child_ids(".top"), ids(&[".top.0", ".top.1"]));
    let removed = take_mutations(&mut rt)
        .iter()
        .filter(|m| matches!(m, Mutation::Remove { .. }))
        .count();
    assert_eq!(removed, 3);

    rt.update_root(&id(".top"), &items(5)).unwrap();
    assert_eq!(
        memory(&rt).child_ids(".top"),
        ids(&[".top.0", ".top.1", ".top.2", ".top.3", ".top.4"])
    );
    assert_eq!(memory(&rt).text(".top.4"), Some("4"));
    assert!(Rc::ptr_eq(&first, &rt.instance(&id(".top.0")).unwrap()));
    assert_eq!(rt.registry().len(), 6);
}

#[test]
fn switching_children_shape_remounts_them() {
    let mut rt = runtime();
    rt.mount("app", &list(&["a", "b"]), MountMode::Immediate).unwrap();
    rt.update_root(
        &id(".top"),
        &Projection::element(ElementProps::new("ul").ordered(vec![li("x")])),
    )
    .unwrap();
    assert_eq!(memory(&rt).child_ids(".top"), ids(&[".top.0"]));
    assert_eq!(rt.registry().len(), 2);
}

// ============================================================================
// Listener lifecycle
// ============================================================================

#[test]
fn removed_subtrees_release_their_listeners() {
    let mut rt = runtime();
    let noop = |kind: EventKind| move |props: ElementProps| props.on(kind, |_, _| Ok(()));
    let tree = |with_b: bool| {
        let b = Projection::element(
            noop(EventKind::Click)(ElementProps::new("li"))
                .child("inner", Projection::element(noop(EventKind::Tap)(ElementProps::new("span")))),
        );
        let bx = Projection::element(noop(EventKind::Click)(ElementProps::new("li")));
        let props = ElementProps::new("ul");
        let props = if with_b { props.child("b", b) } else { props };
        Projection::element(props.child("bx", bx))
    };
    rt.mount("app", &tree(true), MountMode::Immediate).unwrap();
    assert_eq!(
        rt.listeners().keys(),
        [".top.b.inner@onTap", ".top.b@onClick", ".top.bx@onClick"]
    );

    rt.update_root(&id(".top"), &tree(false)).unwrap();
    assert_eq!(rt.listeners().keys(), [".top.bx@onClick"]);
    assert!(rt.instance(&id(".top.b.inner")).is_none());
}

#[test]
fn listeners_are_replaced_on_every_control() {
    let mut rt = runtime();
    let calls = log();
    let button = |label: &str| {
        Projection::element(ElementProps::new("button").on(EventKind::Click, record(&calls, label)))
    };
    rt.mount("app", &button("old"), MountMode::Immediate).unwrap();
    rt.update_root(&id(".top"), &button("new")).unwrap();
    rt.dispatch(click(".top")).unwrap();
    assert_eq!(entries(&calls), ["new"]);

    rt.update_root(&id(".top"), &Projection::element(ElementProps::new("button")))
        .unwrap();
    assert!(rt.listeners().is_empty());
}

#[test]
fn unmounting_a_root_clears_everything() {
    let mut rt = runtime();
    let root = rt
        .mount("app", &Projection::of::<Counter>("n".to_owned()), MountMode::Immediate)
        .unwrap();
    rt.unmount(&root).unwrap();
    assert!(rt.registry().is_empty());
    assert!(rt.listeners().is_empty());
    assert!(memory(&rt).child_ids("app").is_empty());
}

// ============================================================================
// State updates
// ============================================================================

#[test]
fn click_updates_component_state() {
    let mut rt = runtime();
    rt.mount("app", &Projection::of::<Counter>("clicks".to_owned()), MountMode::Immediate)
        .unwrap();
    assert_eq!(memory(&rt).text(".top.s"), Some("clicks: 0"));

    rt.dispatch(click(".top.s")).unwrap();
    rt.dispatch(click(".top.s")).unwrap();

    assert_eq!(memory(&rt).text(".top.s"), Some("clicks: 2"));
    let count = rt
        .with_component::<Counter, _>(&id(".top"), |counter| *counter.state())
        .unwrap();
    assert_eq!(count, 2);
}

#[test]
fn update_while_projecting_is_rejected() {
    let mut rt = runtime();
    rt.mount("app", &Projection::of::<Counter>("n".to_owned()), MountMode::Immediate)
        .unwrap();
    let instance = rt.instance(&id(".top")).unwrap();
    let _busy = instance.borrow_mut();
    assert_eq!(
        rt.update_state::<Counter>(&id(".top"), |n| *n += 1),
        Err(Error::UpdateWhileProjecting(id(".top")))
    );
}

#[test]
fn update_state_checks_the_target() {
    let mut rt = runtime();
    rt.mount("app", &Projection::of::<Counter>("n".to_owned()), MountMode::Immediate)
        .unwrap();
    assert!(matches!(
        rt.update_state::<Echo>(&id(".top"), |_| {}),
        Err(Error::ComponentMismatch { .. })
    ));
    assert_eq!(
        rt.update_state::<Counter>(&id(".nowhere"), |_| {}),
        Err(Error::UnknownInstance(id(".nowhere")))
    );
}

// ============================================================================
// Contract violations
// ============================================================================

#[test]
fn control_before_mount_fails() {
    let mut rt = runtime();
    let projection = li("x");
    let instance = projection.instantiate().unwrap();
    let err = instance
        .borrow_mut()
        .do_control(&mut rt, projection.props())
        .unwrap_err();
    assert_eq!(err, Error::ControlWithoutBackingDom { component: "li" });
}

#[test]
fn one_instance_cannot_live_at_two_paths() {
    let mut rt = runtime();
    let instance = li("x").instantiate().unwrap();
    instance
        .borrow_mut()
        .gen_markup(&mut rt, &id(".a"), true, true)
        .unwrap();
    let err = instance
        .borrow_mut()
        .gen_markup(&mut rt, &id(".b"), true, true)
        .unwrap_err();
    assert_eq!(err, Error::ChildUsedTwice(id(".b")));
}

#[test]
fn style_merge_rejects_arrays() {
    let merged = ElementProps::new("div")
        .style_property("color", "red")
        .merge_style(json!({ "margin": "0", "color": "blue" }))
        .unwrap();
    assert_eq!(merged.style().get("color"), Some(&json!("blue")));
    assert_eq!(merged.style().get("margin"), Some(&json!("0")));
    assert_eq!(
        ElementProps::new("div")
            .merge_style(json!({ "margin": [0, 1] }))
            .unwrap_err(),
        Error::MergeNonObject { found: "array" }
    );
}

// ============================================================================
// Event delegation
// ============================================================================

#[test]
fn bubbling_honours_modes() {
    let mut rt = runtime();
    let calls = log();
    let tree = Projection::element(
        ElementProps::new("div")
            .on(EventKind::Click, record(&calls, "top"))
            .on_mode(EventKind::Click, Mode::FirstHandler, record(&calls, "top first"))
            .child(
                "mid",
                Projection::element(
                    ElementProps::new("div")
                        .on_mode(EventKind::Click, Mode::FirstHandler, record(&calls, "mid first"))
                        .on_mode(EventKind::Click, Mode::Direct, record(&calls, "mid direct"))
                        .child(
                            "leaf",
                            Projection::element(ElementProps::new("span").on_mode(
                                EventKind::Click,
                                Mode::Direct,
                                record(&calls, "leaf direct"),
                            )),
                        ),
                ),
            ),
    );
    rt.mount("app", &tree, MountMode::Immediate).unwrap();

    rt.dispatch(click(".top.mid.leaf")).unwrap();
    assert_eq!(entries(&calls), ["leaf direct", "mid first", "top"]);

    calls.borrow_mut().clear();
    rt.dispatch(click(".top.mid")).unwrap();
    assert_eq!(entries(&calls), ["mid direct", "mid first", "top"]);

    calls.borrow_mut().clear();
    rt.dispatch(click(".top")).unwrap();
    assert_eq!(entries(&calls), ["top first", "top"]);
}

#[test]
fn events_without_target_reach_nobody() {
    let mut rt = runtime();
    let calls = log();
    rt.mount(
        "app",
        &Projection::element(ElementProps::new("div").on(EventKind::Click, record(&calls, "top"))),
        MountMode::Immediate,
    )
    .unwrap();
    rt.dispatch(NativeEvent::new(TopLevelType::Click)).unwrap();
    assert!(entries(&calls).is_empty());
}

#[test]
fn handler_errors_propagate() {
    let mut rt = runtime();
    rt.mount(
        "app",
        &Projection::element(
            ElementProps::new("div").on(EventKind::KeyDown, |event, _| {
                Err(Error::handler(format!(
                    "unexpected key {}",
                    event.native.key.as_deref().unwrap_or("?")
                )))
            }),
        ),
        MountMode::Immediate,
    )
    .unwrap();
    let err = rt
        .dispatch(
            NativeEvent::new(TopLevelType::KeyDown)
                .with_target(id(".top"))
                .with_key("q"),
        )
        .unwrap_err();
    assert_eq!(err, Error::Handler("unexpected key q".to_owned()));
}

#[test]
fn drag_and_tap_are_told_apart() {
    let mut rt = runtime();
    let calls = log();
    let drags = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&drags);
    rt.mount(
        "app",
        &Projection::element(
            ElementProps::new("div")
                .on(EventKind::Drag, move |event, _| {
                    seen.borrow_mut().push(event.drag.map(|d| d.delta_x()));
                    Ok(())
                })
                .on(EventKind::DragDone, record(&calls, "done"))
                .on(EventKind::Tap, record(&calls, "tap")),
        ),
        MountMode::Immediate,
    )
    .unwrap();
    let at = |kind, x, time| {
        NativeEvent::new(kind)
            .with_target(id(".top"))
            .at(x, 0.0)
            .with_timestamp(time)
    };

    rt.dispatch(at(TopLevelType::MouseDown, 0.0, 0.0)).unwrap();
    assert!(rt.session().is_pressing());
    assert_eq!(rt.session().armed(), 1);
    rt.dispatch(at(TopLevelType::MouseMove, 1.0, 1.0)).unwrap();
    rt.dispatch(at(TopLevelType::MouseMove, 20.0, 2.0)).unwrap();
    rt.dispatch(at(TopLevelType::MouseUp, 20.0, 3.0)).unwrap();
    assert_eq!(*drags.borrow(), [Some(20.0)]);
    assert_eq!(entries(&calls), ["done"]);
    assert!(!rt.session().is_pressing());

    calls.borrow_mut().clear();
    rt.dispatch(at(TopLevelType::TouchStart, 0.0, 10.0)).unwrap();
    rt.dispatch(at(TopLevelType::TouchEnd, 2.0, 60.0)).unwrap();
    assert_eq!(entries(&calls), ["tap"]);
    assert_eq!(rt.session().armed(), 0);
}

#[test]
fn moves_without_a_press_are_ignored() {
    let mut rt = runtime();
    let calls = log();
    rt.mount(
        "app",
        &Projection::element(ElementProps::new("div").on(EventKind::Drag, record(&calls, "drag"))),
        MountMode::Immediate,
    )
    .unwrap();
    rt.dispatch(
        NativeEvent::new(TopLevelType::MouseMove)
            .with_target(id(".top"))
            .at(50.0, 50.0)
            .with_timestamp(100.0),
    )
    .unwrap();
    rt.dispatch(NativeEvent::new(TopLevelType::TouchCancel)).unwrap();
    assert!(entries(&calls).is_empty());
}

#[test]
fn hover_walks_through_the_common_ancestor() {
    let mut rt = runtime();
    let calls = log();
    let hoverable = |name: &str, props: ElementProps| {
        props
            .on(EventKind::MouseIn, record(&calls, &format!("in {name}")))
            .on(EventKind::MouseOut, record(&calls, &format!("out {name}")))
    };
    let tree = Projection::element(
        hoverable("top", ElementProps::new("div"))
            .child(
                "a",
                Projection::element(
                    hoverable("a", ElementProps::new("div"))
                        .child("x", Projection::element(hoverable("x", ElementProps::new("span")))),
                ),
            )
            .child("b", Projection::element(hoverable("b", ElementProps::new("div")))),
    );
    rt.mount("app", &tree, MountMode::Immediate).unwrap();

    rt.dispatch(
        NativeEvent::new(TopLevelType::MouseOut)
            .with_target(id(".top.a.x"))
            .with_related_target(id(".top.b")),
    )
    .unwrap();
    assert_eq!(entries(&calls), ["out x", "out a", "in b"]);

    // paired mouseover is ignored; the mouseout already covered it
    calls.borrow_mut().clear();
    rt.dispatch(
        NativeEvent::new(TopLevelType::MouseOver)
            .with_target(id(".top.b"))
            .with_related_target(id(".top.a.x")),
    )
    .unwrap();
    assert!(entries(&calls).is_empty());

    // entering from outside the window
    rt.dispatch(
        NativeEvent::new(TopLevelType::MouseOver)
            .with_target(id(".top.a.x"))
            .across_window_edge(),
    )
    .unwrap();
    assert_eq!(entries(&calls), ["in top", "in a", "in x"]);
}

#[test]
fn entering_from_a_host_node_fires_mouse_in_once() {
    let mut rt = runtime();
    let calls = log();
    rt.mount(
        "app",
        &Projection::element(
            ElementProps::new("div")
                .on(EventKind::MouseIn, record(&calls, "in"))
                .on(EventKind::MouseOut, record(&calls, "out")),
        ),
        MountMode::Immediate,
    )
    .unwrap();

    // the container `app` carries no id-path, so it shows up as `None`
    rt.dispatch(NativeEvent::new(TopLevelType::MouseOut).with_related_target(id(".top")))
        .unwrap();
    rt.dispatch(NativeEvent::new(TopLevelType::MouseOver).with_target(id(".top")))
        .unwrap();
    assert_eq!(entries(&calls), ["in"]);

    // leaving the window and coming back through its edge
    calls.borrow_mut().clear();
    rt.dispatch(
        NativeEvent::new(TopLevelType::MouseOut)
            .with_target(id(".top"))
            .across_window_edge(),
    )
    .unwrap();
    rt.dispatch(
        NativeEvent::new(TopLevelType::MouseOver)
            .with_target(id(".top"))
            .across_window_edge(),
    )
    .unwrap();
    assert_eq!(entries(&calls), ["out", "in"]);
}

#[test]
fn hover_ignores_dispatch_modes() {
    let mut rt = runtime();
    let calls = log();
    let tree = Projection::element(
        ElementProps::new("div")
            .on_mode(EventKind::MouseIn, Mode::Direct, record(&calls, "top direct"))
            .child(
                "leaf",
                Projection::element(ElementProps::new("span").on_mode(
                    EventKind::MouseIn,
                    Mode::FirstHandler,
                    record(&calls, "leaf first"),
                )),
            ),
    );
    rt.mount("app", &tree, MountMode::Immediate).unwrap();

    rt.dispatch(
        NativeEvent::new(TopLevelType::MouseOver)
            .with_target(id(".top.leaf"))
            .across_window_edge(),
    )
    .unwrap();
    assert_eq!(entries(&calls), ["top direct", "leaf first"]);
}

#[test]
fn runaway_walks_are_aborted() {
    let mut rt = runtime();
    let calls = log();
    rt.mount(
        "app",
        &Projection::element(ElementProps::new("div").on(EventKind::Click, record(&calls, "top"))),
        MountMode::Immediate,
    )
    .unwrap();
    let deep = (0..=crate::event::MAX_BUBBLE_STEPS).fold(id(".top"), |id, i| id.child_index(i));
    rt.dispatch(NativeEvent::new(TopLevelType::Click).with_target(deep))
        .unwrap();
    assert!(entries(&calls).is_empty());
}

#[test]
fn resize_bursts_are_coalesced() {
    let mut rt = Runtime::with_config(
        MemoryDom::with_container("app"),
        RuntimeConfig::new().with_resize_batch(50),
    );
    let calls = log();
    rt.mount(
        "app",
        &Projection::element(
            ElementProps::new("div")
                .on(EventKind::Resize, record(&calls, "outer"))
                .child(
                    "inner",
                    Projection::element(ElementProps::new("div").on(EventKind::Resize, record(&calls, "inner"))),
                ),
        ),
        MountMode::Immediate,
    )
    .unwrap();

    for _ in 0..3 {
        rt.dispatch(NativeEvent::new(TopLevelType::Resize)).unwrap();
    }
    assert!(entries(&calls).is_empty());
    assert_eq!(
        rt.take_timer_requests(),
        [TimerRequest {
            timer: Timer::ResizeFlush,
            delay_ms: 50
        }]
    );

    rt.fire_timer(Timer::ResizeFlush).unwrap();
    rt.fire_timer(Timer::ResizeFlush).unwrap();
    assert_eq!(entries(&calls), ["outer", "inner"]);
}

#[test]
fn resize_without_window_dispatches_each_event() {
    let mut rt = runtime();
    let calls = log();
    rt.mount(
        "app",
        &Projection::element(ElementProps::new("div").on(EventKind::Resize, record(&calls, "r"))),
        MountMode::Immediate,
    )
    .unwrap();
    rt.dispatch(NativeEvent::new(TopLevelType::Resize)).unwrap();
    rt.dispatch(NativeEvent::new(TopLevelType::Resize)).unwrap();
    assert_eq!(entries(&calls), ["r", "r"]);
    assert!(rt.take_timer_requests().is_empty());
}

// ============================================================================
// Two-pass mounting
// ============================================================================

#[test]
fn two_pass_mount_defers_handlers() {
    let mut rt = Runtime::with_config(
        MemoryDom::with_container("app"),
        RuntimeConfig::new().with_deferral(5),
    );
    let root = rt
        .mount("app", &Projection::of::<Counter>("n".to_owned()), MountMode::TwoPass)
        .unwrap();
    assert_eq!(memory(&rt).child_ids("app"), ids(&[".top"]));
    assert!(rt.listeners().is_empty());
    assert!(rt.has_deferred_handlers());
    assert_eq!(
        rt.take_timer_requests(),
        [TimerRequest {
            timer: Timer::DeferredHandlers,
            delay_ms: 5
        }]
    );

    // clicks before the second pass reach nobody
    rt.dispatch(click(".top.s")).unwrap();
    assert_eq!(memory(&rt).text(".top.s"), Some("n: 0"));

    take_mutations(&mut rt);
    rt.fire_timer(Timer::DeferredHandlers).unwrap();
    assert!(take_mutations(&mut rt).is_empty());
    assert_eq!(rt.listeners().keys(), [".top.s@onClick"]);
    assert!(!rt.has_deferred_handlers());

    rt.dispatch(click(".top.s")).unwrap();
    assert_eq!(memory(&rt).text(".top.s"), Some("n: 1"));
    assert_eq!(rt.register_deferred_handlers().unwrap(), 0);
    assert!(rt.roots().any(|r| *r == root));
}
