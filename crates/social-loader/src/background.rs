//! Background build: one blocking worker reads the CSV and freezes the
//! snapshot while a `watch` channel publishes progress and the final outcome.

use crate::{CsvSource, LoadError, Loader};
use async_trait::async_trait;
use social_engine::{BuildConfig, QueryEngine, SnapshotBuilder};
use social_types::{BuildError, LoadStatus, LoadSummary, QueryError};
use std::io::Read;
use std::path::PathBuf;
use std::time::Instant;
use tokio::sync::watch;

/// Rows between progress events.
pub const DEFAULT_PROGRESS_EVERY: u64 = 100_000;

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub path: PathBuf,
    pub build: BuildConfig,
    /// Drop unparseable rows (logged at warn) instead of failing the build.
    pub skip_malformed: bool,
    /// Hop ceiling handed to the query engine.
    pub max_hops: Option<usize>,
    pub progress_every: u64,
}

impl LoaderConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            build: BuildConfig::default(),
            skip_malformed: false,
            max_hops: None,
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }

    pub fn with_build(mut self, build: BuildConfig) -> Self {
        self.build = build;
        self
    }

    pub fn with_skip_malformed(mut self, skip: bool) -> Self {
        self.skip_malformed = skip;
        self
    }

    pub fn with_max_hops(mut self, max_hops: Option<usize>) -> Self {
        self.max_hops = max_hops;
        self
    }
}

/// Read every row from `source` and freeze the result.
///
/// `progress` is called with the number of rows read every
/// `config.progress_every` rows.
pub fn load<R: Read>(
    source: &mut CsvSource<R>,
    config: &LoaderConfig,
    mut progress: impl FnMut(u64),
) -> Result<(QueryEngine, LoadSummary), LoadError> {
    let started = Instant::now();
    let every = config.progress_every.max(1);
    let mut builder = SnapshotBuilder::new(config.build.clone());
    let mut rows = 0u64;
    let mut skipped_rows = 0u64;

    for (row_no, row) in source.rows() {
        rows = row_no;
        let added = row
            .map_err(LoadError::from)
            .and_then(|raw| Ok(builder.add_row(row_no, &raw)?));
        if let Err(err) = added {
            if !(config.skip_malformed && is_row_level(&err)) {
                return Err(err);
            }
            skipped_rows += 1;
            tracing::warn!(row = row_no, error = %err, "skipping malformed row");
        }
        if row_no % every == 0 {
            tracing::info!(rows = row_no, users = builder.user_count(), "loading");
            progress(row_no);
        }
    }
    tracing::info!(
        rows,
        users = builder.user_count(),
        edges = builder.edge_count(),
        skipped_rows,
        "rows read, building snapshot"
    );

    let snapshot = builder.finish()?;
    let summary = LoadSummary {
        users: snapshot.user_count(),
        edges: snapshot.edge_count(),
        root: snapshot.root(),
        skipped_rows,
        skipped_edges: snapshot.edge_stats().removed(),
        elapsed_ms: started.elapsed().as_millis() as u64,
    };
    let engine = QueryEngine::from(snapshot).with_max_hops(config.max_hops);
    Ok((engine, summary))
}

fn is_row_level(err: &LoadError) -> bool {
    match err {
        LoadError::Csv(e) => !e.is_io_error(),
        LoadError::Build(BuildError::MalformedRow { .. }) => true,
        _ => false,
    }
}

#[derive(Clone)]
enum Phase {
    Loading { rows_processed: u64 },
    Ready { engine: QueryEngine, summary: LoadSummary },
    Failed { error: String },
}

impl Phase {
    fn status(&self) -> LoadStatus {
        match self {
            Phase::Loading { rows_processed } => LoadStatus::Loading {
                rows_processed: *rows_processed,
            },
            Phase::Ready { summary, .. } => LoadStatus::Ready(summary.clone()),
            Phase::Failed { error } => LoadStatus::Failed {
                error: error.clone(),
            },
        }
    }
}

/// Loader that builds on a blocking worker and answers `NotReady` until done.
pub struct BackgroundLoader {
    phase: watch::Receiver<Phase>,
}

impl BackgroundLoader {
    /// Start loading `config.path`. Must be called inside a tokio runtime.
    pub fn spawn(config: LoaderConfig) -> Self {
        Self::spawn_with(config, |config| CsvSource::open(&config.path))
    }

    /// Start loading from an in-memory or already-open reader.
    pub fn from_reader<R>(reader: R, config: LoaderConfig) -> Self
    where
        R: Read + Send + 'static,
    {
        Self::spawn_with(config, move |_| Ok(CsvSource::from_reader(reader)))
    }

    fn spawn_with<R, F>(config: LoaderConfig, open: F) -> Self
    where
        R: Read,
        F: FnOnce(&LoaderConfig) -> Result<CsvSource<R>, LoadError> + Send + 'static,
    {
        let (tx, rx) = watch::channel(Phase::Loading { rows_processed: 0 });
        tokio::task::spawn_blocking(move || {
            tracing::info!(path = %config.path.display(), "load started");
            let result = open(&config).and_then(|mut source| {
                load(&mut source, &config, |rows| {
                    tx.send_replace(Phase::Loading {
                        rows_processed: rows,
                    });
                })
            });
            let phase = match result {
                Ok((engine, summary)) => {
                    tracing::info!(
                        users = summary.users,
                        edges = summary.edges,
                        root = summary.root,
                        elapsed_ms = summary.elapsed_ms,
                        "snapshot ready"
                    );
                    Phase::Ready { engine, summary }
                }
                Err(e) => {
                    tracing::error!(error = %e, "load failed");
                    Phase::Failed {
                        error: e.to_string(),
                    }
                }
            };
            tx.send_replace(phase);
        });
        Self { phase: rx }
    }
}

#[async_trait]
impl Loader for BackgroundLoader {
    fn status(&self) -> LoadStatus {
        self.phase.borrow().status()
    }

    fn engine(&self) -> Result<QueryEngine, QueryError> {
        match &*self.phase.borrow() {
            Phase::Ready { engine, .. } => Ok(engine.clone()),
            _ => Err(QueryError::NotReady),
        }
    }

    async fn wait_ready(&self) -> Result<QueryEngine, LoadError> {
        let mut rx = self.phase.clone();
        let phase = rx
            .wait_for(|p| p.status().is_terminal())
            .await
            .map_err(|_| LoadError::Aborted)?
            .clone();
        match phase {
            Phase::Ready { engine, .. } => Ok(engine),
            Phase::Failed { error } => Err(LoadError::Failed(error)),
            Phase::Loading { .. } => Err(LoadError::Aborted),
        }
    }
}
