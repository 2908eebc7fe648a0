//! Ingestion for socialdb: CSV rows in, a Ready [`social_engine::QueryEngine`] out.

mod background;
mod source;
mod trait_;

pub use background::{load, BackgroundLoader, LoaderConfig, DEFAULT_PROGRESS_EVERY};
pub use source::CsvSource;
pub use trait_::{LoadError, Loader};
