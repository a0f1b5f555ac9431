//! Document store for the storefront.
//!
//! Holds three collections (products, orders, user profiles) and commits
//! multi-document write batches atomically. Two backends share the
//! [`DocumentStore`] trait: an in-memory store and PostgreSQL.

pub mod batch;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use batch::{StockGuard, WriteBatch, WriteOp, validate_batch};
pub use error::{Result, StoreError};
pub use memory::InMemoryDocumentStore;
pub use postgres::{CHANGE_CHANNEL, PostgresDocumentStore};
pub use store::{
    CommitReceipt, DocumentStore, DocumentStoreExt, OrderFeed, ProfileFeed, sort_newest_first,
};
