pub mod arena;
pub mod browser_scraper;

pub use arena::*;
pub use browser_scraper::*;

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;

use crate::{
    domain::{RawRecord, Source},
    error::SourceError,
};

/// Fetches candidate images from one platform.
///
/// Implementations never panic on upstream trouble: every failure comes back
/// as a [`SourceError`] tagged with the platform, and the caller treats it as
/// "this platform contributed nothing".
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source(&self) -> Source;

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RawRecord>, SourceError>;
}

/// The adapters a process was configured with, keyed by platform.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<Source, Arc<dyn SourceAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        AdapterRegistry::default()
    }

    pub fn register(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.adapters.insert(adapter.source(), adapter);
        self
    }

    pub fn get(&self, source: Source) -> Option<Arc<dyn SourceAdapter>> {
        self.adapters.get(&source).cloned()
    }
}
