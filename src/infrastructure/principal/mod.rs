//! Principal infrastructure
//!
//! Principal store backends and the flag directory built on them.

mod directory;
mod in_memory;
mod postgres;

pub use directory::StoreFlagDirectory;
pub use in_memory::InMemoryPrincipalStore;
pub use postgres::PostgresPrincipalStore;
