//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides: RPC_ENDPOINT, DCA_*)
//!     → validation.rs (semantic checks)
//!     → SubmitterConfig (validated, immutable for the run)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Endpoint and contract address have no compiled-in value
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{read_config, resolve_config, ConfigError};
pub use schema::{BlockchainConfig, ContractConfig, DcaConfig, SecretsConfig, SubmitterConfig};
