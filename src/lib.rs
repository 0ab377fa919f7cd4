//! One-shot `createDCA` submission.
//!
//! Loads an operator key and a contract ABI, generates a deposit key pair,
//! then builds, signs and broadcasts a single DCA-schedule transaction.

pub mod blockchain;
pub mod config;
pub mod dca;
pub mod observability;
pub mod storage;

pub use config::SubmitterConfig;
pub use dca::{DcaRun, RunError, RunOptions, RunReport};
