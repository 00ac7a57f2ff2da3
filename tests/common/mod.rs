//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use axum::Router;
use serde_json::{json, Value};
use sha3::{Digest, Sha3_256};
use tokio::net::TcpListener;
use url::Url;

use coin_list_cli::blockchain::client::ChainClient;
use coin_list_cli::blockchain::types::{
    BlockchainError, BlockchainResult, PendingTransaction, TransactionOptions,
    TransactionOutcome, TransactionStatus, ViewRequest,
};
use coin_list_cli::blockchain::{
    AccountAddress, RawTransaction, SignedTransaction, SigningIdentity, SigningSecret,
    TransactionPayload, TxHash,
};

pub const TEST_PRIVATE_KEY: &str =
    "0x9bf49a6a0755f953811fce125f2683d50429c3bb49e074147e0089a52eae155f";

pub fn test_identity() -> SigningIdentity {
    SigningIdentity::from_secret(&SigningSecret::from_hex(TEST_PRIVATE_KEY).unwrap())
}

/// A coin record as the view endpoint returns it.
pub fn coin_info_json(name: &str, symbol: &str) -> Value {
    json!({
        "name": name,
        "symbol": symbol,
        "coingecko_id": symbol.to_lowercase(),
        "decimals": 8,
        "logo_url": format!("https://example.com/{}.svg", symbol.to_lowercase()),
        "project_url": "https://example.com",
        "token_type": {
            "account_address": "0x1",
            "module_name": format!("0x{}", hex::encode(name.to_lowercase())),
            "struct_name": format!("0x{}", hex::encode(symbol)),
        },
        "extensions": { "data": [] }
    })
}

pub fn committed_record(hash: &TxHash, success: bool) -> Value {
    json!({
        "type": "user_transaction",
        "hash": hash.to_string(),
        "version": "42",
        "success": success,
        "vm_status": if success { "Executed successfully" } else { "Move abort: 0x1" },
        "gas_used": "7",
    })
}

/// How a submitted transaction progresses on the mock node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finality {
    /// Committed on the n-th status poll.
    AfterPolls(u64),
    Never,
}

/// In-memory node that records every call made against it.
pub struct MockNode {
    calls: Mutex<Vec<&'static str>>,
    sequence_number: AtomicU64,
    polls: AtomicU64,
    submitted: Mutex<Vec<SignedTransaction>>,
    accepted: Mutex<Vec<TxHash>>,
    views: Mutex<Vec<ViewRequest>>,
    known: Mutex<HashMap<TxHash, u64>>,
    missing_account: bool,
    foreign_sender: bool,
    stale_sequence: bool,
    unavailable: bool,
    finality: Finality,
    lose_records: bool,
    misdirect_records: bool,
    failed_execution: bool,
    view_response: Result<Value, BlockchainError>,
}

impl Default for MockNode {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNode {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            sequence_number: AtomicU64::new(5),
            polls: AtomicU64::new(0),
            submitted: Mutex::new(Vec::new()),
            accepted: Mutex::new(Vec::new()),
            views: Mutex::new(Vec::new()),
            known: Mutex::new(HashMap::new()),
            missing_account: false,
            foreign_sender: false,
            stale_sequence: false,
            unavailable: false,
            finality: Finality::AfterPolls(2),
            lose_records: false,
            misdirect_records: false,
            failed_execution: false,
            view_response: Ok(json!([[]])),
        }
    }

    /// The sender account does not exist on chain.
    pub fn without_account(mut self) -> Self {
        self.missing_account = true;
        self
    }

    /// Draft transactions for an account other than the signer.
    pub fn with_foreign_sender(mut self) -> Self {
        self.foreign_sender = true;
        self
    }

    /// Submissions fail with a server error; the transaction may or may not be in the pool.
    pub fn unavailable_on_submit(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Draft with a sequence number the node has already consumed.
    pub fn with_stale_sequence(mut self) -> Self {
        self.stale_sequence = true;
        self
    }

    pub fn with_finality(mut self, finality: Finality) -> Self {
        self.finality = finality;
        self
    }

    /// Committed transactions can no longer be fetched.
    pub fn losing_records(mut self) -> Self {
        self.lose_records = true;
        self
    }

    /// Lookups by hash return the record of some other transaction.
    pub fn misdirecting_records(mut self) -> Self {
        self.misdirect_records = true;
        self
    }

    /// Committed transactions report a Move abort.
    pub fn failing_execution(mut self) -> Self {
        self.failed_execution = true;
        self
    }

    pub fn with_view(mut self, response: Value) -> Self {
        self.view_response = Ok(response);
        self
    }

    pub fn with_view_error(mut self, error: BlockchainError) -> Self {
        self.view_response = Err(error);
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| **c == name).count()
    }

    pub fn submitted(&self) -> Vec<SignedTransaction> {
        self.submitted.lock().unwrap().clone()
    }

    /// Hashes handed out on acceptance, in order.
    pub fn accepted(&self) -> Vec<TxHash> {
        self.accepted.lock().unwrap().clone()
    }

    pub fn views(&self) -> Vec<ViewRequest> {
        self.views.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn hash_of(signed: &SignedTransaction) -> BlockchainResult<TxHash> {
        let digest = Sha3_256::digest(signed.to_bcs()?);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Ok(TxHash::new(bytes))
    }
}

#[async_trait]
impl ChainClient for MockNode {
    async fn generate_transaction(
        &self,
        sender: AccountAddress,
        payload: TransactionPayload,
        options: &TransactionOptions,
    ) -> BlockchainResult<RawTransaction> {
        self.record("generate");
        if self.missing_account {
            return Err(BlockchainError::Api {
                status: 404,
                code: Some("account_not_found".into()),
                message: format!("Account not found: {}", sender),
            });
        }

        let current = self.sequence_number.load(Ordering::SeqCst);
        let sequence_number = if self.stale_sequence {
            current.saturating_sub(1)
        } else {
            current
        };

        Ok(RawTransaction {
            sender: if self.foreign_sender {
                AccountAddress::ONE
            } else {
                sender
            },
            sequence_number,
            payload,
            max_gas_amount: options.max_gas_amount,
            gas_unit_price: options.gas_unit_price.unwrap_or(100),
            expiration_timestamp_secs: 1_700_000_000 + options.expiration_secs,
            chain_id: 4,
        })
    }

    fn sign_transaction(
        &self,
        identity: &SigningIdentity,
        raw: RawTransaction,
    ) -> BlockchainResult<SignedTransaction> {
        self.record("sign");
        identity.sign_transaction(raw)
    }

    async fn submit_transaction(
        &self,
        signed: &SignedTransaction,
    ) -> BlockchainResult<PendingTransaction> {
        self.record("submit");
        if self.unavailable {
            return Err(BlockchainError::Api {
                status: 503,
                code: Some("internal_error".into()),
                message: "Service Unavailable".into(),
            });
        }
        let expected = self.sequence_number.load(Ordering::SeqCst);
        if signed.raw().sequence_number != expected {
            return Err(BlockchainError::Api {
                status: 400,
                code: Some("vm_error".into()),
                message: "Invalid transaction: SEQUENCE_NUMBER_TOO_OLD".into(),
            });
        }

        let hash = Self::hash_of(signed)?;
        self.sequence_number.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().unwrap().push(signed.clone());
        self.accepted.lock().unwrap().push(hash);
        self.known.lock().unwrap().insert(hash, 0);
        Ok(PendingTransaction { hash })
    }

    async fn transaction_status(&self, hash: &TxHash) -> BlockchainResult<TransactionStatus> {
        self.record("status");
        self.polls.fetch_add(1, Ordering::SeqCst);

        let mut known = self.known.lock().unwrap();
        let Some(polls) = known.get_mut(hash) else {
            return Ok(TransactionStatus::Unknown);
        };
        *polls += 1;

        Ok(match self.finality {
            Finality::AfterPolls(n) if *polls >= n => TransactionStatus::Committed,
            _ => TransactionStatus::Pending,
        })
    }

    async fn get_transaction_by_hash(
        &self,
        hash: &TxHash,
    ) -> BlockchainResult<Option<TransactionOutcome>> {
        self.record("get");
        if self.lose_records || !self.known.lock().unwrap().contains_key(hash) {
            return Ok(None);
        }
        let returned = if self.misdirect_records {
            TxHash::new([0xee; 32])
        } else {
            *hash
        };
        TransactionOutcome::from_record(committed_record(&returned, !self.failed_execution))
            .map(Some)
    }

    async fn view(&self, request: &ViewRequest) -> BlockchainResult<Value> {
        self.record("view");
        self.views.lock().unwrap().push(request.clone());
        self.view_response.clone()
    }
}

/// Serve `app` on an ephemeral local port and return its `/v1` base URL.
pub async fn spawn_node(app: Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/v1", addr).parse().unwrap()
}
