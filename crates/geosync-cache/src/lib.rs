//! # geosync-cache
//!
//! Cache provider implementation for GeoSync. A single in-memory
//! provider (moka) backs the status snapshot cache; the [`CacheProvider`]
//! trait seam lives in `geosync-core`.
//!
//! [`CacheProvider`]: geosync_core::traits::cache::CacheProvider

pub mod memory;

pub use memory::MemoryCacheProvider;
