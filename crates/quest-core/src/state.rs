use crate::catalog::AppCatalog;
use crate::errors::{QuestError, Result};
use std::sync::{Arc, PoisonError, RwLock};

/// Process-wide holder for the loaded catalog, shared by the bridge entry points.
#[derive(Clone, Default)]
pub struct CatalogState {
    inner: Arc<RwLock<Option<AppCatalog>>>,
}

impl CatalogState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_catalog(&self, catalog: AppCatalog) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(catalog);
    }

    pub fn with_catalog<T>(&self, f: impl FnOnce(&AppCatalog) -> Result<T>) -> Result<T> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(guard.as_ref().ok_or(QuestError::NotLoaded)?)
    }

    pub fn with_catalog_mut<T>(&self, f: impl FnOnce(&mut AppCatalog) -> Result<T>) -> Result<T> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(guard.as_mut().ok_or(QuestError::NotLoaded)?)
    }
}
