//! streamtap - tap a sharded event stream to disk.
//!
//! Listens to a named stream, optionally decodes each record's payload
//! against a schema fetched from a registry, and persists results as
//! idempotent per-record JSON artifacts, with optional run-wide envelope
//! and CSV exports. One independently-advancing pipeline per shard, a
//! single aggregator task for shared state, and a global event-time stop.

pub mod app;
pub mod domain;
pub mod engine;
pub mod io;
pub mod prelude;
pub mod schema;
pub mod streaming;
pub mod transport;
