//! # Fedchain Store
//!
//! Persistence for the federation's chain state: the genesis header and the
//! per-type lists of xfield changes. Provides a trait-based interface with
//! SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The store abstracts chain-state storage behind the [`XFieldStore`] trait,
//! so the chain facade stays storage-agnostic. The primary implementation is
//! [`SqliteStore`], with [`MemoryStore`] for testing. [`StoreExt`] loads and
//! saves a whole [`fedchain_core::XFieldHistory`] at once.
//!
//! ## Key Types
//!
//! - [`XFieldStore`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`AppendResult`] - Result of appending an xfield change
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fedchain_store::{SqliteStore, StoreExt, XFieldStore};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("fedchain.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     let genesis = store.get_genesis().await.unwrap();
//!     let history = store.load_history().await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Consensus encoding at rest**: rows hold the same bytes the block-tree
//!   database uses, and are checked against their indexed columns on read
//! - **Idempotent appends**: Appending the same change twice returns `AlreadyExists`
//! - **Conflict detection**: A different change from the same block returns `Conflict`

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{AppendResult, StoreExt, XFieldStore};
