//! `coin-list` binary.
//!
//! # Architecture Overview
//!
//! ```text
//!   argv ──▶ cli (flags + one subcommand per registry operation)
//!              │
//!              ▼
//!            config ──▶ ConnectionProfile ──▶ RestClient + SigningIdentity
//!              │
//!              ├─ entry op ──▶ payload ──▶ transaction pipeline
//!              │                 (draft → sign → submit → wait → fetch)
//!              │
//!              └─ view op  ──▶ query executor
//!              │
//!              ▼
//!            stdout (record / decoded listing), exit code
//! ```

use std::process::ExitCode;

use coin_list_cli::{cli, observability};

#[tokio::main]
async fn main() -> ExitCode {
    let parsed = cli::parse();
    observability::logging::init(parsed.globals.verbosity());

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        operation = parsed.operation.name,
        "coin-list starting"
    );

    match cli::run(parsed).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {}", e);
            if let Some(hash) = e.pending_hash() {
                eprintln!("Transaction {} may still be committed; check it before retrying.", hash);
            }
            ExitCode::from(e.exit_code())
        }
    }
}
