//! Durable dedup cache
//!
//! This module provides the existence-oriented key-value store used to skip
//! already-processed provider records across runs. The store is backed by a
//! single SQLite database opened once per process and shared across all
//! concurrently running partitions; the internal connection lock serializes
//! writers so callers need no additional locking. Callers must still not
//! assume atomicity of a separate read-then-write pair - the atomic
//! [`DedupCache::insert_if_absent`] is the one dedup gate.

mod store;

pub use store::{CacheError, CacheOptions, CacheResult, DedupCache};
