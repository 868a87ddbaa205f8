//! Application state shared across handlers

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::db::{DualPools, PgUserStore, UserStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    primary: Arc<dyn UserStore>,
    secondary: Arc<dyn UserStore>,
    form_page: PathBuf,
}

impl AppState {
    pub fn new(
        primary: Arc<dyn UserStore>,
        secondary: Arc<dyn UserStore>,
        form_page: impl Into<PathBuf>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                primary,
                secondary,
                form_page: form_page.into(),
            }),
        }
    }

    /// State backed by live PostgreSQL pools.
    pub fn from_pools(pools: DualPools, form_page: impl Into<PathBuf>) -> Self {
        Self::new(
            Arc::new(PgUserStore::new(pools.primary)),
            Arc::new(PgUserStore::new(pools.secondary)),
            form_page,
        )
    }

    pub fn primary(&self) -> &dyn UserStore {
        self.inner.primary.as_ref()
    }

    pub fn secondary(&self) -> &dyn UserStore {
        self.inner.secondary.as_ref()
    }

    pub fn form_page(&self) -> &Path {
        &self.inner.form_page
    }
}
