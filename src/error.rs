//! Top-level error type and process exit codes.

use thiserror::Error;

use crate::blockchain::query::QueryError;
use crate::blockchain::transaction::TxError;
use crate::blockchain::types::{BlockchainError, TxHash};
use crate::config::ConfigError;
use crate::payload::PayloadError;

/// Anything that ends a command early.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error("cannot create node client: {0}")]
    Client(#[source] BlockchainError),

    /// The named operation failed somewhere in the submission pipeline.
    #[error("`{operation}` failed: {source}")]
    Transaction {
        operation: &'static str,
        #[source]
        source: TxError,
    },

    #[error(transparent)]
    Query(#[from] QueryError),

    /// Committed on chain, but execution aborted.
    #[error("transaction {hash} was committed but failed: {vm_status}")]
    Aborted { hash: TxHash, vm_status: String },

    #[error("cannot render output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code; zero is reserved for success.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Config(_) => 2,
            CliError::Payload(_) => 3,
            CliError::Transaction { source, .. } if source.is_ambiguous() => 5,
            CliError::Client(_) | CliError::Transaction { .. } => 4,
            CliError::Query(_) => 6,
            CliError::Aborted { .. } => 7,
            CliError::Output(_) => 1,
        }
    }

    /// Hash worth reporting when the transaction may still land.
    pub fn pending_hash(&self) -> Option<&TxHash> {
        match self {
            CliError::Transaction { source, .. } if source.is_ambiguous() => source.hash(),
            _ => None,
        }
    }
}
