use core::fmt;

/// Error type produced by the web backend.
#[derive(Debug, Clone)]
pub enum WebError {
    /// The DOM APIs are not accessible (e.g., when executed outside of a browser).
    DomUnavailable,
    /// The requested mounting node cannot be located.
    RootNotFound(String),
    /// Wrapper around JavaScript exceptions.
    Js(String),
    /// The runtime is borrowed by a handler that is still running.
    Busy,
    /// The runtime rejected an operation.
    Core(weft_core::Error),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DomUnavailable => write!(f, "DOM is not available"),
            Self::RootNotFound(id) => write!(f, "Failed to find DOM element with id `{id}`"),
            Self::Js(msg) => write!(f, "JavaScript error: {msg}"),
            Self::Busy => write!(f, "runtime is busy dispatching an event"),
            Self::Core(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for WebError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Core(err) => Some(err),
            _ => None,
        }
    }
}

impl From<wasm_bindgen::JsValue> for WebError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        value
            .as_string()
            .map_or_else(|| Self::Js(format!("{value:?}")), Self::Js)
    }
}

impl From<weft_core::Error> for WebError {
    fn from(value: weft_core::Error) -> Self {
        Self::Core(value)
    }
}

impl From<WebError> for weft_core::Error {
    fn from(value: WebError) -> Self {
        match value {
            WebError::Core(err) => err,
            other => Self::dom(other),
        }
    }
}

impl From<WebError> for wasm_bindgen::JsValue {
    fn from(value: WebError) -> Self {
        match value {
            WebError::Js(msg) => Self::from(msg),
            other => Self::from(other.to_string()),
        }
    }
}

/// Converts a thrown JavaScript value into a runtime error.
pub(crate) fn js(value: wasm_bindgen::JsValue) -> weft_core::Error {
    WebError::from(value).into()
}
