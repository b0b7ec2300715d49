//! Infrastructure layer - External service implementations

pub mod api_key;
pub mod cache;
pub mod logging;
pub mod principal;
pub mod rate_limit;
