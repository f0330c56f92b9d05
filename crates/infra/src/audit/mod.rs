//! Audit trail plumbing
//!
//! The lifecycle manager appends to a [`ChannelAuditLogger`], which only
//! enqueues. An [`AuditWorker`] drains the queue in the background and hands
//! batches to the [`SqliteAuditSink`].

pub mod worker;

pub use worker::{AuditWorker, ChannelAuditLogger};

pub use crate::database::SqliteAuditSink;
