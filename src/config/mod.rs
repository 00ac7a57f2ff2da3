//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (YAML, `profiles` mapping)
//!     → loader.rs (read, parse, select profile)
//!     → ConnectionProfile (endpoint + signing secret, immutable)
//!
//! command-line flags
//!     → ClientSettings
//!     → validation.rs (semantic checks)
//! ```
//!
//! # Design Decisions
//! - Resolved once per process, before any network activity
//! - Any failure here is fatal; nothing is retried
//! - Settings have defaults so only the profile file is required

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{resolve_profile, ConfigError, ConfigResult};
pub use schema::{ClientSettings, ConnectionProfile, ProfilesFile, DEFAULT_PROFILE};
pub use validation::{validate_settings, ValidationError};
