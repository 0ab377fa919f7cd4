//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (address, nonce, tx_hash)
//!     → the `create_dca` span carrying the run ID
//!
//! Consumers:
//!     → stderr via the fmt layer
//! ```
//!
//! # Design Decisions
//! - Logs go to stderr; stdout is reserved for the run result
//! - Private keys and full RPC URLs are never logged

pub mod logging;

pub use logging::init_logging;
