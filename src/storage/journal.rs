//! Submission journal.
//!
//! One JSON file recording every signed transaction and what became of it, so
//! a rerun can tell "already sent" from "signed but never broadcast".
//!
//! ```text
//! signed ──broadcast ok──▶ submitted ──receipt──▶ confirmed
//!    │
//!    └──node rejected──▶ failed
//! ```

use alloy::primitives::{Address, Bytes, TxHash};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::storage::{StorageError, StorageResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Signed,
    Submitted,
    Confirmed,
    Failed,
}

/// One signed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub run_id: Uuid,
    pub chain_id: u64,
    pub contract: Address,
    pub sender: Address,
    pub nonce: u64,
    pub deposit_address: Address,
    pub tx_hash: TxHash,
    /// Signed EIP-2718 bytes, kept so an interrupted run can re-broadcast them.
    pub raw_tx: Bytes,
    pub status: EntryStatus,
    /// Seconds since the Unix epoch.
    pub updated_at: u64,
}

/// What the journal says about a prospective run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalCheck {
    /// Nothing recorded for this sender; go ahead.
    Fresh,
    /// A transaction already went out.
    AlreadySubmitted(JournalEntry),
    /// A transaction was signed for the current nonce but never confirmed as sent.
    Resumable(JournalEntry),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct JournalFile {
    entries: Vec<JournalEntry>,
}

/// File-backed journal of submissions.
#[derive(Debug)]
pub struct SubmissionJournal {
    path: PathBuf,
    entries: Vec<JournalEntry>,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl SubmissionJournal {
    /// Open the journal at `path`; a missing file is an empty journal.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let entries = match fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => Vec::new(),
            Ok(content) => {
                let file: JournalFile =
                    serde_json::from_str(&content).map_err(|e| StorageError::Journal {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    })?;
                file.entries
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(StorageError::Journal {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "Journal opened");
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Look for earlier runs by `sender` against `contract` on `chain_id`.
    pub fn check(
        &self,
        chain_id: u64,
        contract: Address,
        sender: Address,
        current_nonce: u64,
    ) -> JournalCheck {
        let relevant = || {
            self.entries.iter().rev().filter(move |e| {
                e.chain_id == chain_id && e.contract == contract && e.sender == sender
            })
        };

        // An unsent transaction at the current nonce is resumed even when
        // older submissions exist.
        if let Some(entry) =
            relevant().find(|e| e.status == EntryStatus::Signed && e.nonce == current_nonce)
        {
            return JournalCheck::Resumable(entry.clone());
        }

        // A signed entry below the account nonce went out before the run died.
        let sent = relevant().find(|e| match e.status {
            EntryStatus::Submitted | EntryStatus::Confirmed => true,
            EntryStatus::Signed => e.nonce < current_nonce,
            EntryStatus::Failed => false,
        });
        match sent {
            Some(entry) => JournalCheck::AlreadySubmitted(entry.clone()),
            None => JournalCheck::Fresh,
        }
    }

    /// Insert or replace the entry with the same `run_id`, then persist.
    pub fn record(&mut self, mut entry: JournalEntry) -> StorageResult<()> {
        entry.updated_at = now_secs();
        match self.entries.iter_mut().find(|e| e.run_id == entry.run_id) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        self.persist()
    }

    /// Change the status of the entry for `run_id`, then persist.
    pub fn set_status(&mut self, run_id: Uuid, status: EntryStatus) -> StorageResult<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.run_id == run_id)
            .ok_or_else(|| StorageError::Journal {
                path: self.path.clone(),
                reason: format!("no entry for run {}", run_id),
            })?;
        entry.status = status;
        entry.updated_at = now_secs();
        tracing::debug!(run_id = %run_id, status = ?status, "Journal entry updated");
        self.persist()
    }

    /// Write via a temp file and rename so a crash never leaves half a journal.
    fn persist(&self) -> StorageResult<()> {
        let journal_error = |reason: String| StorageError::Journal {
            path: self.path.clone(),
            reason,
        };

        let file = JournalFile {
            entries: self.entries.clone(),
        };
        let serialised =
            serde_json::to_string_pretty(&file).map_err(|e| journal_error(e.to_string()))?;

        let mut tmp = self.path.as_os_str().to_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, serialised.as_bytes())
            .map_err(|e| journal_error(format!("writing {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &self.path).map_err(|e| journal_error(e.to_string()))?;
        Ok(())
    }
}
