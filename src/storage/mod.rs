//! Local persistence: generated keys and the submission journal.
//!
//! # Security
//! `FileKeyStore` writes private keys in plaintext. That is acceptable for
//! disposable deposit keys only; implement [`KeyStore`] over a vault for
//! anything else.

pub mod journal;
pub mod keystore;

use std::path::PathBuf;
use thiserror::Error;

pub use journal::{EntryStatus, JournalCheck, JournalEntry, SubmissionJournal};
pub use keystore::{FileKeyStore, KeyStore};

/// Errors from local persistence.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A key file could not be created or written.
    #[error("Failed to write {}: {source}", path.display())]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The journal could not be read, parsed or written.
    #[error("Journal {}: {reason}", path.display())]
    Journal { path: PathBuf, reason: String },
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
