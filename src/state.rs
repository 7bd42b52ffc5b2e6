//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::extract::ExtractOptions;

/// Shared application state
///
/// Read-only after startup; every request works on its own buffers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    extract_options: ExtractOptions,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let extract_options = config.extract_options();
        Self {
            inner: Arc::new(AppStateInner {
                config,
                extract_options,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Options applied to every extraction
    pub fn extract_options(&self) -> ExtractOptions {
        self.inner.extract_options
    }
}
