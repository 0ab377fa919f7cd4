//! DCA schedule creation.
//!
//! # Data Flow
//! ```text
//! SubmitterConfig.dca + deposit address
//!     → types.rs (CallParameters → call arguments)
//!     → pipeline.rs (DcaRun: load, check, generate, build, sign, broadcast)
//! ```

pub mod pipeline;
pub mod types;

pub use pipeline::{generate_deposit_credential, DcaRun, RunError, RunOptions, RunReport};
pub use types::{CallParameters, DcaType, ParameterError};
