//! Loader trait: build status plus the barrier queries wait on.

use async_trait::async_trait;
use social_engine::QueryEngine;
use social_types::{BuildError, LoadStatus, QueryError};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("load failed: {0}")]
    Failed(String),
    #[error("loader stopped before finishing")]
    Aborted,
}

/// Source of the one frozen snapshot a process serves.
///
/// Contract: `engine` never hands out a partially built store. It returns
/// `QueryError::NotReady` until the build has completed successfully.
#[async_trait]
pub trait Loader: Send + Sync {
    /// Current phase of the build.
    fn status(&self) -> LoadStatus;

    /// The query engine if the snapshot is Ready.
    fn engine(&self) -> Result<QueryEngine, QueryError>;

    /// Block until the build finishes; `Err` when it failed.
    async fn wait_ready(&self) -> Result<QueryEngine, LoadError>;
}
