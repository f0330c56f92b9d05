//! Observability infrastructure
//!
//! Structured logging via `tracing`. Lifecycle code emits `info!` on state
//! transitions, `warn!` on swallowed failures and `debug!` for HTTP attempts;
//! this module installs the subscriber that renders them.

pub mod logging;

pub use logging::{build_filter, init_tracing};
