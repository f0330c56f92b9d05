//! Infrastructure error conversions.

mod conversions;

pub use conversions::InfraError;
pub(crate) use conversions::{describe_http_error, map_join_error, IntoStoreError};
