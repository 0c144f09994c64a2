//! Application state management
use parking_lot::RwLock;
use shortcut_core::{AppContext, Config, CoreError, Result};
use std::sync::Arc;

/// Thread-safe application state wrapper
#[derive(Clone)]
pub struct AppState {
    context: Arc<RwLock<Option<AppContext>>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self::from_context(AppContext::open(config))
    }

    pub fn from_context(context: AppContext) -> Self {
        Self {
            context: Arc::new(RwLock::new(Some(context))),
        }
    }

    pub fn with_context<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&AppContext) -> Result<T>,
    {
        let guard = self.context.read();
        match guard.as_ref() {
            Some(context) => f(context),
            None => Err(CoreError::NotInitialized),
        }
    }

    /// Flush and release the context; later requests fail
    pub fn shutdown(&self) {
        if let Some(context) = self.context.write().take() {
            context.shutdown();
        }
    }
}
