//! [`KeyValueStore`](crate::traits::KeyValueStore) implementations.
//!
//! * [`memory::MemoryStore`] keeps everything in process; tests use it.
//! * [`file::JsonFileStore`] persists a single JSON object to disk and is
//!   what the daemon uses in place of browser local storage.

pub mod file;
pub mod memory;
