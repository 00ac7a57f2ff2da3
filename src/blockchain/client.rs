//! Node client: the capabilities the pipeline and query path need, and an
//! HTTP implementation against the node's REST API.
//!
//! # Responsibilities
//! - Draft transactions (sequence number, chain id, gas price)
//! - Submit signed transactions and look them up by hash
//! - Poll for commitment within a bounded wait
//! - Invoke read-only view functions
//! - Bound every request with a timeout

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::time::{interval, timeout};
use url::Url;

use crate::blockchain::envelope::{RawTransaction, SignedTransaction, TransactionPayload};
use crate::blockchain::types::{
    u64_string, AccountAddress, BlockchainError, BlockchainResult, PendingTransaction,
    TransactionOptions, TransactionOutcome, TransactionStatus, TxHash, ViewRequest, WaitOutcome,
    WaitPolicy,
};
use crate::blockchain::wallet::SigningIdentity;

/// Content type for BCS-encoded signed transactions.
pub const SIGNED_TRANSACTION_BCS: &str = "application/x.aptos.signed_transaction+bcs";

/// Everything the submission pipeline and query executor ask of a node.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Build an unsigned transaction for `sender` carrying `payload`.
    async fn generate_transaction(
        &self,
        sender: AccountAddress,
        payload: TransactionPayload,
        options: &TransactionOptions,
    ) -> BlockchainResult<RawTransaction>;

    /// Sign a drafted transaction. Signing is local by default.
    fn sign_transaction(
        &self,
        identity: &SigningIdentity,
        raw: RawTransaction,
    ) -> BlockchainResult<SignedTransaction> {
        identity.sign_transaction(raw)
    }

    /// Hand a signed transaction to the node's pending pool.
    async fn submit_transaction(
        &self,
        signed: &SignedTransaction,
    ) -> BlockchainResult<PendingTransaction>;

    /// Current standing of a submitted transaction.
    async fn transaction_status(&self, hash: &TxHash) -> BlockchainResult<TransactionStatus>;

    /// Full record of a transaction, `None` if the node does not know the hash.
    async fn get_transaction_by_hash(
        &self,
        hash: &TxHash,
    ) -> BlockchainResult<Option<TransactionOutcome>>;

    /// Invoke a read-only function and return the raw JSON result.
    async fn view(&self, request: &ViewRequest) -> BlockchainResult<Value>;

    /// Poll until the transaction is committed or the policy's timeout elapses.
    async fn wait_for_transaction(
        &self,
        hash: &TxHash,
        policy: &WaitPolicy,
    ) -> BlockchainResult<WaitOutcome> {
        let started = Instant::now();

        let result = timeout(policy.timeout, async {
            let mut ticker = interval(policy.poll_interval);

            loop {
                ticker.tick().await;

                match self.transaction_status(hash).await? {
                    TransactionStatus::Committed => return Ok(()),
                    status => {
                        tracing::debug!(hash = %hash, ?status, "Transaction not yet committed");
                    }
                }
            }
        })
        .await;

        match result {
            Ok(Ok(())) => Ok(WaitOutcome::Committed),
            Ok(Err(e)) => Err(e),
            Err(_) => Ok(WaitOutcome::TimedOut {
                waited: started.elapsed(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LedgerInfo {
    chain_id: u8,
}

#[derive(Debug, Deserialize)]
struct AccountInfo {
    #[serde(with = "u64_string")]
    sequence_number: u64,
}

#[derive(Debug, Deserialize)]
struct GasEstimation {
    gas_estimate: u64,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    error_code: Option<String>,
}

/// REST client bound to a single node endpoint.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    request_timeout: Duration,
}

impl RestClient {
    /// Create a client for `base_url` (e.g. `https://fullnode.devnet.aptoslabs.com/v1`).
    pub fn new(base_url: Url, request_timeout: Duration) -> BlockchainResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| BlockchainError::Unreachable(format!("HTTP client setup failed: {}", e)))?;

        // Relative joins only append when the base ends with a slash.
        let mut base_url = base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        tracing::debug!(base_url = %base_url, ?request_timeout, "REST client initialized");

        Ok(Self {
            http,
            base_url,
            request_timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> BlockchainResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| BlockchainError::Encode(format!("invalid endpoint path '{}': {}", path, e)))
    }

    /// Send a request within the timeout and turn non-success statuses into errors.
    async fn send(&self, request: RequestBuilder) -> BlockchainResult<Response> {
        let response = match timeout(self.request_timeout, request.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) if e.is_timeout() => {
                return Err(BlockchainError::Timeout(self.request_timeout))
            }
            Ok(Err(e)) => return Err(BlockchainError::Unreachable(e.to_string())),
            Err(_) => return Err(BlockchainError::Timeout(self.request_timeout)),
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body: ApiErrorBody = serde_json::from_str(&text).unwrap_or_default();
        let message = if body.message.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            body.message
        };

        Err(BlockchainError::Api {
            status: status.as_u16(),
            code: body.error_code,
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> BlockchainResult<T> {
        let text = response
            .text()
            .await
            .map_err(|e| BlockchainError::Unreachable(format!("reading response body: {}", e)))?;
        serde_json::from_str(&text).map_err(|e| BlockchainError::Decode(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> BlockchainResult<T> {
        let url = self.endpoint(path)?;
        let response = self.send(self.http.get(url).header(ACCEPT, "application/json")).await?;
        Self::decode(response).await
    }

    /// Chain id of the connected network.
    pub async fn chain_id(&self) -> BlockchainResult<u8> {
        let info: LedgerInfo = self.get_json("").await?;
        Ok(info.chain_id)
    }

    /// Next sequence number of `address`.
    pub async fn sequence_number(&self, address: AccountAddress) -> BlockchainResult<u64> {
        let info: AccountInfo = self.get_json(&format!("accounts/{}", address)).await?;
        Ok(info.sequence_number)
    }

    /// Node's current gas unit price estimate.
    pub async fn estimate_gas_price(&self) -> BlockchainResult<u64> {
        let estimate: GasEstimation = self.get_json("estimate_gas_price").await?;
        Ok(estimate.gas_estimate)
    }

    async fn fetch_record(&self, hash: &TxHash) -> BlockchainResult<Option<TransactionOutcome>> {
        match self.get_json::<Value>(&format!("transactions/by_hash/{}", hash)).await {
            Ok(record) => TransactionOutcome::from_record(record).map(Some),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl ChainClient for RestClient {
    async fn generate_transaction(
        &self,
        sender: AccountAddress,
        payload: TransactionPayload,
        options: &TransactionOptions,
    ) -> BlockchainResult<RawTransaction> {
        let sequence_number = self.sequence_number(sender).await?;
        let chain_id = self.chain_id().await?;
        let gas_unit_price = match options.gas_unit_price {
            Some(price) => price,
            None => self.estimate_gas_price().await?,
        };

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        Ok(RawTransaction {
            sender,
            sequence_number,
            payload,
            max_gas_amount: options.max_gas_amount,
            gas_unit_price,
            expiration_timestamp_secs: now + options.expiration_secs,
            chain_id,
        })
    }

    async fn submit_transaction(
        &self,
        signed: &SignedTransaction,
    ) -> BlockchainResult<PendingTransaction> {
        let url = self.endpoint("transactions")?;
        let body = signed.to_bcs()?;
        let response = self
            .send(
                self.http
                    .post(url)
                    .header(CONTENT_TYPE, SIGNED_TRANSACTION_BCS)
                    .header(ACCEPT, "application/json")
                    .body(body),
            )
            .await?;

        if response.status() != StatusCode::ACCEPTED {
            tracing::debug!(status = %response.status(), "Unexpected submission status");
        }
        Self::decode(response).await
    }

    async fn transaction_status(&self, hash: &TxHash) -> BlockchainResult<TransactionStatus> {
        Ok(match self.fetch_record(hash).await? {
            None => TransactionStatus::Unknown,
            Some(outcome) if outcome.is_committed() => TransactionStatus::Committed,
            Some(_) => TransactionStatus::Pending,
        })
    }

    async fn get_transaction_by_hash(
        &self,
        hash: &TxHash,
    ) -> BlockchainResult<Option<TransactionOutcome>> {
        self.fetch_record(hash).await
    }

    async fn view(&self, request: &ViewRequest) -> BlockchainResult<Value> {
        let url = self.endpoint("view")?;
        let response = self
            .send(
                self.http
                    .post(url)
                    .header(ACCEPT, "application/json")
                    .json(request),
            )
            .await?;
        Self::decode(response).await
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url.as_str())
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
