use wasm_bindgen::prelude::*;
use weft_core::{IdPath, MountMode, Projection, Runtime, RuntimeConfig};

use crate::{
    dom::{DomRoot, WebDom},
    error::WebError,
    renderer::WebRenderer,
};

/// Builder for [`WebApp`].
#[derive(Debug, Default, Clone)]
pub struct WebAppBuilder {
    root_id: Option<String>,
    config: RuntimeConfig,
    mode: MountMode,
}

impl WebAppBuilder {
    /// Creates a new builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the DOM element identifier that should host the application.
    #[must_use]
    pub fn with_root_id(mut self, id: impl Into<String>) -> Self {
        self.root_id = Some(id.into());
        self
    }

    /// Replaces the runtime configuration.
    #[must_use]
    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Reads the runtime configuration from JSON, e.g. embedded in the host page.
    ///
    /// # Errors
    ///
    /// Returns [`WebError::Js`] if the JSON does not describe a configuration.
    pub fn with_config_json(self, raw: &str) -> Result<Self, WebError> {
        let config =
            RuntimeConfig::from_json(raw).map_err(|err| WebError::Js(err.to_string()))?;
        Ok(self.with_config(config))
    }

    /// Renders markup first and registers handlers on a later tick.
    #[must_use]
    pub const fn two_pass(mut self, enabled: bool) -> Self {
        self.mode = if enabled {
            MountMode::TwoPass
        } else {
            MountMode::Immediate
        };
        self
    }

    /// Finalises the builder and creates a [`WebApp`].
    ///
    /// # Errors
    ///
    /// Returns an error if the DOM root element cannot be found or the native
    /// listeners cannot be installed.
    pub fn build(self) -> Result<WebApp, WebError> {
        let root = DomRoot::new(self.root_id.as_deref())?;
        let runtime = Runtime::with_config(WebDom::new()?, self.config);
        let mut renderer = WebRenderer::new(runtime);
        renderer.install()?;
        Ok(WebApp {
            root,
            renderer,
            mode: self.mode,
        })
    }
}

/// Entry point for running `weft` inside the browser.
#[wasm_bindgen]
#[derive(Debug)]
pub struct WebApp {
    root: DomRoot,
    renderer: WebRenderer,
    mode: MountMode,
}

impl WebApp {
    /// Provides access to the renderer.
    #[must_use]
    pub const fn renderer(&self) -> &WebRenderer {
        &self.renderer
    }

    /// The element the application renders into.
    #[must_use]
    pub const fn root(&self) -> &DomRoot {
        &self.root
    }

    /// Mounts a new root under the host element.
    ///
    /// # Errors
    ///
    /// Propagates runtime and DOM errors.
    pub fn render(&self, projection: &Projection) -> Result<IdPath, WebError> {
        self.renderer.mount(&self.root.id(), projection, self.mode)
    }

    /// Reconciles a root previously returned by [`WebApp::render`].
    ///
    /// # Errors
    ///
    /// Propagates runtime and DOM errors.
    pub fn update(&self, root: &IdPath, projection: &Projection) -> Result<(), WebError> {
        self.renderer.update_root(root, projection)
    }
}

#[wasm_bindgen]
impl WebApp {
    /// Creates a new [`WebApp`] using the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the DOM root element cannot be found or initialized.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<Self, WebError> {
        WebAppBuilder::new().build()
    }

    /// Unmounts every root and empties the host element.
    ///
    /// # Errors
    ///
    /// Returns an error if a root cannot be unmounted or the DOM rejects the removal.
    #[wasm_bindgen]
    pub fn clear(&self) -> Result<(), WebError> {
        let roots = self
            .renderer
            .with_runtime(|rt| rt.roots().cloned().collect::<Vec<_>>())?;
        for root in &roots {
            self.renderer.unmount(root)?;
        }
        self.root.clear()
    }

    /// Number of mounted roots.
    #[wasm_bindgen(js_name = rootCount)]
    pub fn root_count(&self) -> Result<usize, WebError> {
        self.renderer.with_runtime(|rt| rt.roots().count())
    }
}
