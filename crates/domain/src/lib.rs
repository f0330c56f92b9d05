//! # TenantLink Domain
//!
//! Business domain types and models for TenantLink.
//!
//! This crate contains:
//! - The tenant integration configuration document and its parts
//! - Integration definitions (the shape of the compiled-in catalog)
//! - Domain error types and Result definitions
//! - Configuration structures
//!
//! ## Architecture
//! - No dependencies on other TenantLink crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
