//! Command-line client for the `coin_list` Move package.
//!
//! Resolves a connection profile, then either drives one entry-function
//! transaction through draft, sign, submit and confirmation, or runs one
//! read-only view query, and prints the result.

pub mod blockchain;
pub mod cli;
pub mod config;
pub mod error;
pub mod observability;
pub mod payload;

pub use blockchain::{ChainClient, RestClient, SigningIdentity};
pub use config::{ClientSettings, ConnectionProfile};
pub use error::CliError;
