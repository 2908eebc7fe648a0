//! HTTP surface for socialdb.

pub mod config;
pub mod server;
