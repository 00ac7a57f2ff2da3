//! Chain-specific types and error definitions.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Length in bytes of an account address and of a transaction hash.
pub const HASH_LENGTH: usize = 32;

/// Errors that can occur while talking to a node.
#[derive(Debug, Clone, Error)]
pub enum BlockchainError {
    /// Connection failed or the request could not be sent.
    #[error("node unreachable: {0}")]
    Unreachable(String),

    /// Request did not complete within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Node answered with a non-success status.
    #[error("node returned HTTP {status}: {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// A value could not be encoded for the wire.
    #[error("encoding failed: {0}")]
    Encode(String),

    /// Signing failed or the signer does not match the transaction.
    #[error("signing failed: {0}")]
    Signing(String),
}

impl BlockchainError {
    /// True when the node answered 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlockchainError::Api { status: 404, .. })
    }

    /// True when the node looked at the request and refused it.
    pub fn is_client_error(&self) -> bool {
        matches!(self, BlockchainError::Api { status, .. } if (400..500).contains(status))
    }
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Error produced when parsing an address or hash from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid hex value `{input}`: {reason}")]
pub struct HexParseError {
    pub input: String,
    pub reason: String,
}

fn parse_fixed_hex(input: &str, allow_short: bool) -> Result<[u8; HASH_LENGTH], HexParseError> {
    let fail = |reason: &str| HexParseError {
        input: input.to_string(),
        reason: reason.to_string(),
    };
    let digits = input.strip_prefix("0x").unwrap_or(input);
    if digits.is_empty() {
        return Err(fail("no hex digits"));
    }
    if digits.len() > HASH_LENGTH * 2 {
        return Err(fail("longer than 32 bytes"));
    }
    if !allow_short && digits.len() != HASH_LENGTH * 2 {
        return Err(fail("expected 64 hex digits"));
    }
    let padded = format!("{:0>64}", digits);
    let mut out = [0u8; HASH_LENGTH];
    hex::decode_to_slice(&padded, &mut out).map_err(|e| fail(&e.to_string()))?;
    Ok(out)
}

/// 32-byte on-chain account address.
///
/// Parses the short form (`0x1`) as well as the full 64-digit form and always
/// displays the full lowercase form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AccountAddress([u8; HASH_LENGTH]);

impl AccountAddress {
    pub const ONE: Self = {
        let mut bytes = [0u8; HASH_LENGTH];
        bytes[HASH_LENGTH - 1] = 1;
        Self(bytes)
    };

    pub const fn new(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    /// Full `0x`-prefixed hex form.
    pub fn to_hex_literal(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for AccountAddress {
    type Err = HexParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed_hex(s.trim(), true).map(Self)
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex_literal())
    }
}

impl fmt::Debug for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountAddress({})", self)
    }
}

/// Transaction hash returned by the node on acceptance.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash([u8; HASH_LENGTH]);

impl TxHash {
    pub const fn new(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }
}

impl FromStr for TxHash {
    type Err = HexParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed_hex(s.trim(), false).map(Self)
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self)
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Deserializes a `u64` that the node may render either as a JSON string or a number.
pub(crate) mod u64_string {
    use serde::{de, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Str(String),
        Num(u64),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Str(s) => s.parse().map_err(de::Error::custom),
            Repr::Num(n) => Ok(n),
        }
    }
}

fn lenient_u64(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

/// Parameters for drafting a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOptions {
    /// Gas ceiling for the transaction.
    pub max_gas_amount: u64,
    /// Fixed gas unit price; the node's estimate is used when unset.
    pub gas_unit_price: Option<u64>,
    /// Seconds from now after which the node must drop the transaction.
    pub expiration_secs: u64,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            max_gas_amount: 1000,
            gas_unit_price: None,
            expiration_secs: 30,
        }
    }
}

/// Bounds for confirmation polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Total time to wait before giving up.
    pub timeout: Duration,
    /// Delay between status polls.
    pub poll_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Node acknowledgement of an accepted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PendingTransaction {
    pub hash: TxHash,
}

/// Where a submitted transaction currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Node does not (yet) know the hash.
    Unknown,
    /// In the pending pool.
    Pending,
    /// Included in a committed block.
    Committed,
}

/// Result of a bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Committed,
    TimedOut { waited: Duration },
}

/// Finalized transaction record as reported by the node.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionOutcome {
    pub hash: TxHash,
    /// Record type, e.g. `user_transaction` or `pending_transaction`.
    pub kind: String,
    pub version: Option<u64>,
    pub success: Option<bool>,
    pub vm_status: Option<String>,
    pub gas_used: Option<u64>,
    /// Full JSON record, printed verbatim.
    pub record: Value,
}

impl TransactionOutcome {
    pub const PENDING_KIND: &'static str = "pending_transaction";

    /// Build an outcome from the node's JSON transaction record.
    pub fn from_record(record: Value) -> BlockchainResult<Self> {
        let kind = record
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| BlockchainError::Decode("transaction record has no `type`".into()))?
            .to_string();
        let hash = record
            .get("hash")
            .and_then(Value::as_str)
            .ok_or_else(|| BlockchainError::Decode("transaction record has no `hash`".into()))?
            .parse()
            .map_err(|e: HexParseError| BlockchainError::Decode(e.to_string()))?;

        Ok(Self {
            hash,
            kind,
            version: record.get("version").and_then(lenient_u64),
            success: record.get("success").and_then(Value::as_bool),
            vm_status: record
                .get("vm_status")
                .and_then(Value::as_str)
                .map(str::to_string),
            gas_used: record.get("gas_used").and_then(lenient_u64),
            record,
        })
    }

    /// True once the record is no longer in the pending pool.
    pub fn is_committed(&self) -> bool {
        self.kind != Self::PENDING_KIND
    }

    /// True when the node reports the transaction as executed successfully.
    pub fn is_success(&self) -> bool {
        self.success.unwrap_or(false)
    }
}

/// Request body for a read-only view function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewRequest {
    /// Fully qualified function id, e.g. `0x1::coin::balance`.
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_short_address_is_padded() {
        let addr: AccountAddress = "0x1".parse().unwrap();
        assert_eq!(addr, AccountAddress::ONE);
        assert_eq!(
            addr.to_string(),
            "0x0000000000000000000000000000000000000000000000000000000000000001"
        );
    }

    #[test]
    fn test_address_without_prefix() {
        let addr: AccountAddress = "ab".parse().unwrap();
        assert_eq!(addr.as_bytes()[31], 0xab);
    }

    #[test]
    fn test_invalid_address() {
        assert!("0x".parse::<AccountAddress>().is_err());
        assert!("0xzz".parse::<AccountAddress>().is_err());
        let too_long = format!("0x{}", "1".repeat(65));
        assert!(too_long.parse::<AccountAddress>().is_err());
    }

    #[test]
    fn test_hash_requires_full_length() {
        assert!("0x1".parse::<TxHash>().is_err());
        let hash: TxHash = format!("0x{}", "ab".repeat(32)).parse().unwrap();
        assert_eq!(hash.to_string(), format!("0x{}", "ab".repeat(32)));
    }

    #[test]
    fn test_outcome_from_record() {
        let hash = format!("0x{}", "01".repeat(32));
        let outcome = TransactionOutcome::from_record(json!({
            "type": "user_transaction",
            "hash": hash,
            "version": "42",
            "success": true,
            "vm_status": "Executed successfully",
            "gas_used": "17",
        }))
        .unwrap();

        assert_eq!(outcome.hash.to_string(), hash);
        assert_eq!(outcome.version, Some(42));
        assert_eq!(outcome.gas_used, Some(17));
        assert!(outcome.is_committed());
        assert!(outcome.is_success());
    }

    #[test]
    fn test_pending_record_is_not_committed() {
        let outcome = TransactionOutcome::from_record(json!({
            "type": "pending_transaction",
            "hash": format!("0x{}", "02".repeat(32)),
        }))
        .unwrap();
        assert!(!outcome.is_committed());
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_record_without_hash() {
        let err = TransactionOutcome::from_record(json!({ "type": "user_transaction" }))
            .unwrap_err();
        assert!(matches!(err, BlockchainError::Decode(_)));
    }

    #[test]
    fn test_error_display() {
        let err = BlockchainError::Api {
            status: 400,
            code: Some("vm_error".into()),
            message: "SEQUENCE_NUMBER_TOO_OLD".into(),
        };
        assert_eq!(err.to_string(), "node returned HTTP 400: SEQUENCE_NUMBER_TOO_OLD");
        assert!(err.is_client_error());
        assert!(!err.is_not_found());

        let err = BlockchainError::Timeout(Duration::from_secs(10));
        assert_eq!(err.to_string(), "request timed out after 10s");
    }

    #[test]
    fn test_default_options() {
        let options = TransactionOptions::default();
        assert_eq!(options.max_gas_amount, 1000);
        assert_eq!(options.gas_unit_price, None);
        assert_eq!(WaitPolicy::default().timeout, Duration::from_secs(30));
    }
}
