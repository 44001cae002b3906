//! Persistence collaborator boundary.
//!
//! The core consumes a generic document store keyed by referral id. Stores
//! evaluate a [`QuerySpec`](crate::query::QuerySpec) through its `matches`
//! and `sort` methods, provide atomic single-document replacement, and
//! enforce the one cross-document invariant: history-number uniqueness at
//! insert time.
//!
//! Two implementations are provided: an in-memory store for tests and
//! development, and a sharded JSON file store.

use crate::query::QuerySpec;
use crate::referral::{Referral, ReferralId};

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Failures surfaced by a store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("a referral with history number {0} already exists")]
    DuplicateHistoryNumber(String),
    #[error("referral not found")]
    NotFound,
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to read referral document: {0}")]
    DocumentRead(std::io::Error),
    #[error("failed to write referral document: {0}")]
    DocumentWrite(std::io::Error),
    #[error("failed to serialize referral document: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize referral document: {0}")]
    Deserialization(serde_json::Error),
}

/// A document store for referrals.
///
/// Operations on different referrals are independent; concurrent updates to
/// the same referral resolve by last write wins.
pub trait ReferralStore: Send + Sync {
    /// All referrals satisfying the spec, in the spec's order.
    fn find(&self, query: &QuerySpec) -> Result<Vec<Referral>, StoreError>;

    /// A single referral by id, if present.
    fn find_by_id(&self, id: ReferralId) -> Result<Option<Referral>, StoreError>;

    /// Persist a new referral.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateHistoryNumber` if another referral
    /// already carries the same patient history number.
    fn insert(&self, referral: &Referral) -> Result<(), StoreError>;

    /// Replace an existing referral document as a whole.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no document with the referral's id
    /// exists.
    fn replace(&self, referral: &Referral) -> Result<(), StoreError>;
}
