//! Transaction submission pipeline.
//!
//! ```text
//! Drafted → Signed → Submitted → Pending → Confirmed
//! ```
//!
//! Each stage waits on the node before advancing. Stages never repeat or
//! reorder, and nothing is retried: a rejected submission must be re-drafted
//! by the caller. Once a transaction is Submitted, every later failure leaves
//! its fate unknown and is reported as such.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::blockchain::client::ChainClient;
use crate::blockchain::envelope::TransactionPayload;
use crate::blockchain::types::{
    BlockchainError, TransactionOptions, TransactionOutcome, TxHash, WaitOutcome, WaitPolicy,
};
use crate::blockchain::wallet::SigningIdentity;

/// Pipeline stage, in the order they are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TxStage {
    Drafted,
    Signed,
    Submitted,
    Pending,
    Confirmed,
}

impl fmt::Display for TxStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TxStage::Drafted => "drafted",
            TxStage::Signed => "signed",
            TxStage::Submitted => "submitted",
            TxStage::Pending => "pending",
            TxStage::Confirmed => "confirmed",
        };
        f.write_str(name)
    }
}

/// Failures of the submission pipeline.
#[derive(Debug, Error)]
pub enum TxError {
    /// Payload could not be turned into a transaction.
    #[error("failed to draft transaction: {0}")]
    Draft(#[source] BlockchainError),

    /// Credential could not sign the drafted transaction.
    #[error("failed to sign transaction: {0}")]
    Signing(#[source] BlockchainError),

    /// Node refused the transaction; nothing was submitted.
    #[error("transaction rejected by node: {0}")]
    SubmissionRejected(#[source] BlockchainError),

    /// Lost the node after the transaction may have been accepted.
    #[error("lost contact with node after transaction was {stage}; outcome unknown: {source}")]
    Unreachable {
        stage: TxStage,
        hash: Option<TxHash>,
        #[source]
        source: BlockchainError,
    },

    /// Transaction was not committed within the wait bound.
    #[error("transaction {hash} not confirmed within {waited:?}; it may still be committed later")]
    ConfirmationTimeout { hash: TxHash, waited: Duration },

    /// Node confirmed the transaction but does not return its record.
    #[error("transaction {hash} was confirmed but its record was not found")]
    RecordNotFound { hash: TxHash },
}

impl TxError {
    /// True when the transaction may or may not have landed on chain.
    pub fn is_ambiguous(&self) -> bool {
        matches!(
            self,
            TxError::Unreachable { .. }
                | TxError::ConfirmationTimeout { .. }
                | TxError::RecordNotFound { .. }
        )
    }

    /// Hash of the submitted transaction, when one was assigned.
    pub fn hash(&self) -> Option<&TxHash> {
        match self {
            TxError::Unreachable { hash, .. } => hash.as_ref(),
            TxError::ConfirmationTimeout { hash, .. } | TxError::RecordNotFound { hash } => {
                Some(hash)
            }
            _ => None,
        }
    }
}

/// Result type for the submission pipeline.
pub type TxResult<T> = Result<T, TxError>;

/// Caller-tunable pipeline settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitOptions {
    pub transaction: TransactionOptions,
    pub wait: WaitPolicy,
}

/// Drives one payload through draft, sign, submit, wait and fetch.
pub struct SubmissionPipeline<'a, C: ChainClient + ?Sized> {
    client: &'a C,
    identity: &'a SigningIdentity,
    options: SubmitOptions,
    stages: Vec<TxStage>,
}

impl<'a, C: ChainClient + ?Sized> SubmissionPipeline<'a, C> {
    pub fn new(client: &'a C, identity: &'a SigningIdentity, options: SubmitOptions) -> Self {
        Self {
            client,
            identity,
            options,
            stages: Vec::with_capacity(5),
        }
    }

    /// Stages reached by the last [`submit`](Self::submit) call, in order.
    pub fn stages(&self) -> &[TxStage] {
        &self.stages
    }

    fn advance(&mut self, stage: TxStage) {
        debug_assert!(
            self.stages.last().map_or(true, |last| *last < stage),
            "stage {stage} reached out of order"
        );
        tracing::debug!(stage = %stage, "Transaction stage reached");
        self.stages.push(stage);
    }

    /// Submit `payload` and return its finalized record.
    pub async fn submit(&mut self, payload: TransactionPayload) -> TxResult<TransactionOutcome> {
        self.stages.clear();
        let function = payload.function_id();

        let raw = self
            .client
            .generate_transaction(self.identity.address(), payload, &self.options.transaction)
            .await
            .map_err(TxError::Draft)?;
        tracing::info!(
            function = %function,
            sender = %raw.sender,
            sequence_number = raw.sequence_number,
            max_gas_amount = raw.max_gas_amount,
            gas_unit_price = raw.gas_unit_price,
            "Transaction drafted"
        );
        self.advance(TxStage::Drafted);

        let signed = self
            .client
            .sign_transaction(self.identity, raw)
            .map_err(TxError::Signing)?;
        self.advance(TxStage::Signed);

        let pending = self
            .client
            .submit_transaction(&signed)
            .await
            .map_err(|e| {
                if e.is_client_error() {
                    TxError::SubmissionRejected(e)
                } else {
                    TxError::Unreachable {
                        stage: TxStage::Signed,
                        hash: None,
                        source: e,
                    }
                }
            })?;
        let hash = pending.hash;
        tracing::info!(hash = %hash, "Transaction submitted");
        self.advance(TxStage::Submitted);

        self.advance(TxStage::Pending);
        match self
            .client
            .wait_for_transaction(&hash, &self.options.wait)
            .await
        {
            Ok(WaitOutcome::Committed) => {}
            Ok(WaitOutcome::TimedOut { waited }) => {
                tracing::warn!(hash = %hash, ?waited, "Transaction not confirmed in time");
                return Err(TxError::ConfirmationTimeout { hash, waited });
            }
            Err(source) => {
                return Err(TxError::Unreachable {
                    stage: TxStage::Pending,
                    hash: Some(hash),
                    source,
                })
            }
        }

        let outcome = self
            .client
            .get_transaction_by_hash(&hash)
            .await
            .map_err(|source| TxError::Unreachable {
                stage: TxStage::Pending,
                hash: Some(hash),
                source,
            })?
            .ok_or(TxError::RecordNotFound { hash })?;
        if outcome.hash != hash {
            tracing::warn!(
                hash = %hash,
                returned = %outcome.hash,
                "Node returned the record of a different transaction"
            );
            return Err(TxError::RecordNotFound { hash });
        }
        self.advance(TxStage::Confirmed);

        tracing::info!(
            hash = %outcome.hash,
            version = ?outcome.version,
            success = ?outcome.success,
            vm_status = outcome.vm_status.as_deref().unwrap_or("unknown"),
            "Transaction confirmed"
        );

        Ok(outcome)
    }
}
