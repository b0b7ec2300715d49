//! API middleware components

pub mod access_gate;
pub mod guard;
pub mod logging;

pub use access_gate::{access_gate, extract_api_key, API_KEY_HEADER};
pub use guard::{require_flags, FlagRequirement, MatchMode};
pub use logging::{logging_middleware, truncate_for_log};
