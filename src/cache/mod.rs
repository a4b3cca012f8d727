//! Tagged query cache.

pub mod store;
pub mod tag;

pub use store::{CachedQuery, EntryStatus, QueryCache};
pub use tag::{CacheKey, Tag};
