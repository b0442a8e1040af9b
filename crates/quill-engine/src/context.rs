//! Entry point owning the shared metadata cache.

use crate::builder::QueryBuilder;
use crate::config::Config;
use quill_common::utils::error::Result;
use quill_core::metadata::{Entity, MetadataCache, TableMetadata};
use std::sync::Arc;

/// Hands out query builders that share one metadata cache.
///
/// Cloning is cheap and clones share the cache, so a context can be passed
/// to every thread that builds queries. Each builder it creates is owned by
/// a single caller.
#[derive(Debug, Clone)]
pub struct QueryContext {
    cache: Arc<MetadataCache>,
    config: Config,
}

impl QueryContext {
    /// Creates a context with a fresh cache.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](quill_common::Error::Config) if the
    /// configuration is invalid.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_cache(Arc::new(MetadataCache::new()), config)
    }

    /// Creates a context over an existing cache.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](quill_common::Error::Config) if the
    /// configuration is invalid.
    pub fn with_cache(cache: Arc<MetadataCache>, config: Config) -> Result<Self> {
        config.validate()?;
        tracing::debug!(dialect = ?config.dialect, "created query context");
        Ok(Self { cache, config })
    }

    /// Starts a query over `T`.
    #[must_use]
    pub fn query<T: Entity>(&self) -> QueryBuilder<T> {
        QueryBuilder::new(Arc::clone(&self.cache), self.config.clone())
    }

    /// Registers `T` ahead of its first query and returns its metadata.
    pub fn register<T: Entity>(&self) -> Arc<TableMetadata> {
        self.cache.resolve::<T>()
    }

    /// The shared cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Default for QueryContext {
    fn default() -> Self {
        Self {
            cache: Arc::new(MetadataCache::new()),
            config: Config::default(),
        }
    }
}
