//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Configure log level from flags and environment
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Logs go to stderr; stdout carries command results only
//! - `RUST_LOG` overrides the level chosen by flags

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Verbosity requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Debug,
    Trace,
}

impl Verbosity {
    /// Map `--quiet` and the `-v` count to a verbosity.
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => Verbosity::Quiet,
            (false, 0) => Verbosity::Normal,
            (false, 1) => Verbosity::Debug,
            (false, _) => Verbosity::Trace,
        }
    }

    /// Default filter directive for this crate.
    pub fn directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "coin_list_cli=warn",
            Verbosity::Normal => "coin_list_cli=info",
            Verbosity::Debug => "coin_list_cli=debug,reqwest=debug",
            Verbosity::Trace => "coin_list_cli=trace,reqwest=trace,hyper_util=debug",
        }
    }
}

/// Install the global subscriber. Call once, early in `main`.
pub fn init(verbosity: Verbosity) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| verbosity.directive().into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
