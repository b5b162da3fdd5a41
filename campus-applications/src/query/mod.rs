//! Query/cache layer
//!
//! Server reads are cached per structured key; mutations name themselves and
//! the dependency graph in [`invalidation`] decides which reads go stale.

pub mod cache;
pub mod invalidation;
pub mod keys;

pub use cache::{CacheStats, FetchResult, QueryCache, QuerySnapshot, DEFAULT_STALE_TIME};
pub use invalidation::Mutation;
pub use keys::{keys as query_keys, QueryKey};
