//! Application state management

use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::engine::LayoutEngine;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    engine: Arc<dyn LayoutEngine>,
}

impl AppState {
    /// Create a new application state around an already constructed engine
    pub fn new(config: Config, engine: Arc<dyn LayoutEngine>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, engine }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the layout engine
    pub fn engine(&self) -> &dyn LayoutEngine {
        self.inner.engine.as_ref()
    }

    /// Root directory for scratch workspaces, if configured
    pub fn temp_root(&self) -> Option<&Path> {
        self.inner.config.upload.temp_root.as_deref()
    }
}
