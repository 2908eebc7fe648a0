//! Load lifecycle: a store is `Loading` until the build finishes, then `Ready`
//! (or `Failed`). The transition is one-way.

use crate::UserId;
use serde::{Deserialize, Serialize};

/// Counters reported once a build completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub users: usize,
    pub edges: usize,
    pub root: UserId,
    #[serde(default)]
    pub skipped_rows: u64,
    #[serde(default)]
    pub skipped_edges: u64,
    pub elapsed_ms: u64,
}

/// State of the one-time build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum LoadStatus {
    Loading { rows_processed: u64 },
    Ready(LoadSummary),
    Failed { error: String },
}

impl Default for LoadStatus {
    fn default() -> Self {
        LoadStatus::Loading { rows_processed: 0 }
    }
}

impl LoadStatus {
    /// `Ready` and `Failed` never change again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoadStatus::Loading { .. })
    }
}
