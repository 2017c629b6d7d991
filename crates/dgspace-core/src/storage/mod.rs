//! Durable client-side storage.
//!
//! This module provides:
//! - `KeyValueStore`: string key/value storage with file, keychain and
//!   in-memory backends
//! - `SessionStore`: the persisted session record (credential + profile)
//!   kept as two entries that are written and cleared together

pub mod backend;
pub mod session_store;

pub use backend::{FileStore, KeyValueStore, KeyringStore, MemoryStore};
pub use session_store::{SessionStore, StoredSession, TOKEN_KEY, USER_KEY};
