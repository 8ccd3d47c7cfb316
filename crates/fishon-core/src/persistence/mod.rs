//! Durable key/value storage for the client.
//!
//! # File Locations
//!
//! Everything lives in a single file under the storage directory:
//!
//! ```text
//! ~/.config/fishon/               (or FISHON_HOME)
//! └── storage.json                # { "token": "<credential>" }
//! ```
//!
//! # Atomic Writes
//!
//! Saves write `storage.json.tmp` first and rename it over `storage.json`,
//! so a crash never leaves a half-written file behind.

pub mod storage;

pub use storage::{LocalStorage, StorageError, STORAGE_FILE, TOKEN_KEY};
