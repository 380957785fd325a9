//! Projections, instances and the component contract.
//!
//! A [`Projection`] is a request to materialise a component; an [`Instance`]
//! is the live object made from it. The reconciler only ever talks to
//! instances through [`Instance::gen_markup`] and [`Instance::do_control`], so
//! the concrete kind of a child never matters to it.
//!
//! The set of instance kinds is closed:
//!
//! - [`Composite`]: a standard component with a single structure child,
//! - [`Element`]: a native tag whose [`Children`] are keyed or ordered.

mod composite;
mod element;

use core::{
    any::{Any, TypeId, type_name},
    cell::RefCell,
    fmt,
};
use std::rc::Rc;

pub use composite::{Composite, STRUCTURE_KEY};
pub use element::{Children, Element, ElementProps};

use crate::{Error, Result, id::IdPath, markup::Markup, runtime::Runtime};

/// Type-erased props carried by a projection.
pub type Props = Rc<dyn Any>;

/// Shared handle to a live instance.
pub type InstanceRef = Rc<RefCell<dyn Instance>>;

/// Constructor identity plus the factory that builds instances.
///
/// Two makers are equal iff they build the same component type; for native
/// elements the tag is part of the identity, so `div` to `span` remounts.
#[derive(Clone, Copy)]
pub struct Maker {
    type_id: TypeId,
    tag: Option<&'static str>,
    name: &'static str,
    make: fn(Props) -> Result<InstanceRef>,
}

impl Maker {
    /// The maker of composite component `C`.
    #[must_use]
    pub fn of<C: Component>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            tag: None,
            name: type_name::<C>(),
            make: Composite::<C>::make,
        }
    }

    /// The maker of a native element with the given tag.
    #[must_use]
    pub fn element(tag: &'static str) -> Self {
        Self {
            type_id: TypeId::of::<Element>(),
            tag: Some(tag),
            name: tag,
            make: Element::make,
        }
    }

    /// Human readable name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for Maker {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.tag == other.tag
    }
}

impl Eq for Maker {}

impl fmt::Debug for Maker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Maker({})", self.name)
    }
}

/// An immutable `{maker, props}` descriptor.
#[derive(Clone)]
pub struct Projection {
    maker: Maker,
    props: Props,
}

impl Projection {
    /// Projects composite component `C`.
    pub fn of<C: Component>(props: C::Props) -> Self {
        Self {
            maker: Maker::of::<C>(),
            props: Rc::new(props),
        }
    }

    /// Projects a native element.
    #[must_use]
    pub fn element(props: ElementProps) -> Self {
        Self {
            maker: Maker::element(props.tag()),
            props: Rc::new(props),
        }
    }

    /// The constructor identity.
    #[must_use]
    pub const fn maker(&self) -> Maker {
        self.maker
    }

    /// The props, shared.
    #[must_use]
    pub fn props(&self) -> Props {
        Rc::clone(&self.props)
    }

    /// Allocates a fresh, not yet mounted instance.
    ///
    /// # Errors
    ///
    /// Fails if the props do not belong to the maker.
    pub fn instantiate(&self) -> Result<InstanceRef> {
        (self.maker.make)(self.props())
    }

    /// Returns `true` if `instance` was built by this projection's maker.
    #[must_use]
    pub fn matches(&self, instance: &InstanceRef) -> bool {
        instance.borrow().maker() == self.maker
    }
}

impl fmt::Debug for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Projection({})", self.maker.name)
    }
}

/// The capability the reconciler consumes from every live instance.
pub trait Instance: Any {
    /// Identity of the constructor that built this instance.
    fn maker(&self) -> Maker;

    /// The id-path assigned at mount time, or `None` before that.
    fn id(&self) -> Option<&IdPath>;

    /// Id of the DOM node that carries this instance's content.
    fn dom_id(&self) -> Option<IdPath>;

    /// Assigns `id` (first call only) and produces markup and/or registers
    /// event handlers for the whole subtree.
    ///
    /// Calling it again with the same id re-walks the existing subtree, which
    /// is how a two-pass mount registers handlers after the first paint.
    ///
    /// # Errors
    ///
    /// [`Error::ChildUsedTwice`] if the instance already lives at another id.
    fn gen_markup(
        &mut self,
        rt: &mut Runtime,
        id: &IdPath,
        do_markup: bool,
        do_handlers: bool,
    ) -> Result<Option<Markup>>;

    /// Applies new props, reconciling the subtree in place.
    ///
    /// # Errors
    ///
    /// [`Error::ControlWithoutBackingDom`] before `gen_markup`, or any error
    /// raised while reconciling children.
    fn do_control(&mut self, rt: &mut Runtime, props: Props) -> Result<()>;

    /// Upcast for inspection.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for state updates.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// The authoring side of a standard component.
///
/// ```
/// use weft_core::{Component, ElementProps, IdPath, Projection};
///
/// struct Greeting;
///
/// impl Component for Greeting {
///     type Props = String;
///     type State = ();
///
///     fn init_state(_props: &String) {}
///
///     fn project(props: &String, _state: &(), _id: &IdPath) -> Projection {
///         Projection::element(ElementProps::new("h1").text(format!("Hello, {props}!")))
///     }
/// }
/// ```
pub trait Component: Sized + 'static {
    /// Props handed in by the parent.
    type Props: 'static;
    /// Internal state.
    type State: 'static;

    /// Initial state of a freshly allocated instance.
    fn init_state(props: &Self::Props) -> Self::State;

    /// Called before every `do_control` with the incoming props.
    fn prop_trigger(next: &Self::Props, state: &mut Self::State) {
        let _ = (next, state);
    }

    /// Computes the single structure child. `id` is the instance's own
    /// id-path, for handlers that update this component's state.
    fn project(props: &Self::Props, state: &Self::State, id: &IdPath) -> Projection;
}

/// Assigns `id` to an instance's id slot. Returns `true` on the first call.
pub(crate) fn claim_id(slot: &mut Option<IdPath>, id: &IdPath) -> Result<bool> {
    match slot {
        Some(existing) if existing == id => Ok(false),
        Some(_) => Err(Error::ChildUsedTwice(id.clone())),
        None => {
            *slot = Some(id.clone());
            Ok(true)
        }
    }
}

pub(crate) fn downcast_props<T: 'static>(props: Props, expected: &'static str) -> Result<Rc<T>> {
    props
        .downcast::<T>()
        .map_err(|_| Error::PropsMismatch { expected })
}
