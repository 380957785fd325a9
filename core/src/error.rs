//! Error type shared by the reconciler and the event runtime.
//!
//! Every variant except [`Error::Dom`] and [`Error::Handler`] is a programmer
//! contract violation: it is raised synchronously and the reconciliation pass
//! that hit it stops where it is. Nothing is rolled back, so the DOM may be
//! left partially updated; the next successful pass converges it again.

use thiserror::Error;

use crate::id::IdPath;

/// Errors produced by `weft-core`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// An instance was controlled before any id-path had been assigned to it.
    #[error("control without backing dom ({component})")]
    ControlWithoutBackingDom {
        /// Type name of the offending component.
        component: &'static str,
    },
    /// An id-path was mounted while another instance still owns it.
    #[error("using child twice: `{0}` is already mounted")]
    ChildUsedTwice(IdPath),
    /// A state update reached an instance that is still computing its projection.
    #[error("cannot update state before you're done projecting (`{0}`)")]
    UpdateWhileProjecting(IdPath),
    /// A child key or root name cannot serve as an id-path segment.
    #[error("`{0}` is not a valid id-path segment: keys must be non-empty and free of `.`")]
    InvalidKey(String),
    /// Raw HTML was routed through a plain attribute instead of `Content::DangerousHtml`.
    #[error("`innerHTML` on `{0}` must be set through `Content::DangerousHtml`")]
    UnsafeInnerHtml(IdPath),
    /// `deep_merge` was handed something other than a plain object.
    #[error("deep merge is only defined over plain objects, found {found}")]
    MergeNonObject {
        /// JSON kind that was rejected.
        found: &'static str,
    },
    /// No instance is registered under the id-path.
    #[error("no instance is mounted at `{0}`")]
    UnknownInstance(IdPath),
    /// The instance under the id-path is not of the requested component type.
    #[error("instance at `{id}` is not a `{expected}`")]
    ComponentMismatch {
        /// Id-path that was looked up.
        id: IdPath,
        /// Type name that was expected.
        expected: &'static str,
    },
    /// Props of the wrong type were handed to a component.
    #[error("props passed to `{expected}` have the wrong type")]
    PropsMismatch {
        /// Type name of the component that rejected the props.
        expected: &'static str,
    },
    /// The DOM boundary reported a failure.
    #[error("dom error: {0}")]
    Dom(String),
    /// An event handler failed.
    #[error("handler failed: {0}")]
    Handler(String),
}

impl Error {
    /// Wraps an arbitrary handler failure.
    pub fn handler(message: impl core::fmt::Display) -> Self {
        Self::Handler(message.to_string())
    }

    /// Wraps a DOM failure.
    pub fn dom(message: impl core::fmt::Display) -> Self {
        Self::Dom(message.to_string())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;
