//! Frameloom Cache
//!
//! Caching layer between the render surface and the export pipeline:
//! - Byte-accounted LRU + TTL frame cache with hit/miss accounting
//! - Dependency-keyed memoization for derived values
//! - Debounce/throttle adapters for cache-adjacent callback traffic

pub mod frame_cache;
pub mod limiter;
pub mod memo;

pub use frame_cache::*;
pub use limiter::*;
pub use memo::*;
