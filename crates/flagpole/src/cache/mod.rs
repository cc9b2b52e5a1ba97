//! # Rule-Set Cache
//!
//! Pluggable key/value store for serialized rule-set documents.
//!
//! ## Backends
//!
//! * [`MemoryCache`] - volatile in-process map
//! * [`FilesystemCache`] - durable one-file-per-key store
//! * [`NullCache`] - discards everything, forcing a remote fetch per load
//!
//! All operations are asynchronous and infallible at the interface: absence
//! is reported as `None`/`false`, and backend I/O failures are logged and
//! degrade to a miss, never surfacing to the caller.

use std::time::Duration;

use async_trait::async_trait;

pub mod filesystem;
pub mod memory;
pub mod null;

pub use filesystem::FilesystemCache;
pub use memory::MemoryCache;
pub use null::NullCache;

#[async_trait]
pub trait FlagCache: Send + Sync + std::fmt::Debug {
    /// Retrieves a value. Expired entries are treated as absent.
    async fn get(&self, key: &str) -> Option<String>;
    /// Stores a value, optionally expiring after `ttl`. Without a ttl the
    /// entry never expires.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>);
    /// True when a live entry exists for the key.
    async fn contains(&self, key: &str) -> bool;
    /// Removes one entry.
    async fn remove(&self, key: &str);
    /// Removes every entry managed by this cache.
    async fn clear(&self);
}
