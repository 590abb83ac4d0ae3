//! Client configuration.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → ClientConfig::to_request (base Request with hooks)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Per-call requests derive from the base with `Request::with`

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{ClientConfig, DebugConfig, Decoding, Encoding, TransportKind};
pub use validation::{validate_config, ValidationError};
