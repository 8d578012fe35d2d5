//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → cli.rs (flags and env vars override file values)
//!     → validation.rs (semantic checks)
//!     → NodeConfig (validated, immutable)
//!     → consumed once by lifecycle::startup to build the Node
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Cli;
pub use schema::NodeConfig;
pub use schema::ListenerConfig;
pub use schema::ProxyConfig;
pub use schema::TlsConfig;
