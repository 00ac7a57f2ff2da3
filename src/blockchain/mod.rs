//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Config profile (private key, REST URL)
//!     → wallet.rs (identity, address, signing)
//!     → client.rs (REST node client with timeouts)
//!     → transaction.rs (draft, sign, submit, wait, fetch)
//!     → query.rs (view functions, decoding)
//! ```
//!
//! # Security Constraints
//! - Private keys only from the selected config profile
//! - Never log private keys or sensitive data
//! - All node calls have configurable timeouts
//! - Confirmation waits are always bounded

pub mod client;
pub mod envelope;
pub mod query;
pub mod transaction;
pub mod type_tag;
pub mod types;
pub mod wallet;

pub use client::{ChainClient, RestClient};
pub use envelope::{EntryFunction, ModuleId, RawTransaction, SignedTransaction, TransactionPayload};
pub use query::{CoinInfo, QueryError, QueryExecutor};
pub use transaction::{SubmissionPipeline, SubmitOptions, TxError, TxStage};
pub use type_tag::TypeTag;
pub use types::{AccountAddress, BlockchainError, TransactionOutcome, TxHash};
pub use wallet::{SigningIdentity, SigningSecret};
