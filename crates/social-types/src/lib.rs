//! Core types and traits for the socialdb in-memory social-graph database.
//!
//! Records, attributes, predicates and the error taxonomy live here so every
//! other crate (index, graph, engine, loader, api) agrees on them.

mod attribute;
mod dto;
mod lifecycle;
mod record;
mod traits;

pub use attribute::*;
pub use dto::*;
pub use lifecycle::*;
pub use record::*;
pub use traits::*;
