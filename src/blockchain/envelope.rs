//! Transaction envelope: payload, raw (unsigned) transaction and signed transaction.
//!
//! Everything here serializes with BCS exactly as the node expects it on the
//! `application/x.aptos.signed_transaction+bcs` submission path.

use serde::{Serialize, Serializer};
use sha3::{Digest, Sha3_256};

use crate::blockchain::type_tag::TypeTag;
use crate::blockchain::types::{AccountAddress, BlockchainError, BlockchainResult};

/// Domain separator hashed in front of every raw transaction before signing.
const RAW_TRANSACTION_SALT: &[u8] = b"APTOS::RawTransaction";

/// Module handle: publishing address plus module name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleId {
    pub address: AccountAddress,
    pub name: String,
}

/// Call of a public entry function with pre-encoded arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryFunction {
    pub module: ModuleId,
    pub function: String,
    pub ty_args: Vec<TypeTag>,
    /// Each argument BCS-encoded on its own.
    pub args: Vec<Vec<u8>>,
}

impl EntryFunction {
    /// Fully qualified function id, e.g. `0x1::coin::transfer`.
    pub fn function_id(&self) -> String {
        format!("{}::{}::{}", self.module.address, self.module.name, self.function)
    }
}

/// Opaque instruction carried by a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionPayload {
    EntryFunction(EntryFunction),
}

impl TransactionPayload {
    pub fn function_id(&self) -> String {
        match self {
            TransactionPayload::EntryFunction(f) => f.function_id(),
        }
    }
}

impl Serialize for TransactionPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            // Discriminants 0 and 1 belong to script and module-bundle payloads.
            TransactionPayload::EntryFunction(f) => {
                serializer.serialize_newtype_variant("TransactionPayload", 2, "EntryFunction", f)
            }
        }
    }
}

/// Unsigned transaction bound to a sender and sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawTransaction {
    pub sender: AccountAddress,
    pub sequence_number: u64,
    pub payload: TransactionPayload,
    pub max_gas_amount: u64,
    pub gas_unit_price: u64,
    pub expiration_timestamp_secs: u64,
    pub chain_id: u8,
}

impl RawTransaction {
    /// Bytes that get signed: salt hash followed by the BCS body.
    pub fn signing_message(&self) -> BlockchainResult<Vec<u8>> {
        let body = bcs::to_bytes(self).map_err(|e| BlockchainError::Encode(e.to_string()))?;
        let mut message = Sha3_256::digest(RAW_TRANSACTION_SALT).to_vec();
        message.extend_from_slice(&body);
        Ok(message)
    }
}

/// Proof of authorization attached to a raw transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TransactionAuthenticator {
    Ed25519 {
        public_key: Vec<u8>,
        signature: Vec<u8>,
    },
}

/// Raw transaction plus authenticator, ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedTransaction {
    raw_txn: RawTransaction,
    authenticator: TransactionAuthenticator,
}

impl SignedTransaction {
    pub fn new(raw_txn: RawTransaction, authenticator: TransactionAuthenticator) -> Self {
        Self {
            raw_txn,
            authenticator,
        }
    }

    pub fn raw(&self) -> &RawTransaction {
        &self.raw_txn
    }

    pub fn authenticator(&self) -> &TransactionAuthenticator {
        &self.authenticator
    }

    /// Submission body.
    pub fn to_bcs(&self) -> BlockchainResult<Vec<u8>> {
        bcs::to_bytes(self).map_err(|e| BlockchainError::Encode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_raw() -> RawTransaction {
        RawTransaction {
            sender: AccountAddress::ONE,
            sequence_number: 7,
            payload: TransactionPayload::EntryFunction(EntryFunction {
                module: ModuleId {
                    address: AccountAddress::ONE,
                    name: "coin_list".into(),
                },
                function: "create_list".into(),
                ty_args: vec![],
                args: vec![],
            }),
            max_gas_amount: 1000,
            gas_unit_price: 100,
            expiration_timestamp_secs: 1_700_000_000,
            chain_id: 4,
        }
    }

    #[test]
    fn test_function_id() {
        let raw = sample_raw();
        assert_eq!(
            raw.payload.function_id(),
            format!("{}::coin_list::create_list", AccountAddress::ONE)
        );
    }

    #[test]
    fn test_raw_transaction_layout() {
        let raw = sample_raw();
        let bytes = bcs::to_bytes(&raw).unwrap();

        // sender
        assert_eq!(&bytes[..32], AccountAddress::ONE.as_bytes());
        // sequence number, little endian
        assert_eq!(&bytes[32..40], &7u64.to_le_bytes());
        // entry function payload discriminant
        assert_eq!(bytes[40], 2);
        // trailing chain id
        assert_eq!(*bytes.last().unwrap(), 4);
    }

    #[test]
    fn test_signing_message_prefix() {
        let raw = sample_raw();
        let message = raw.signing_message().unwrap();
        let salt = Sha3_256::digest(RAW_TRANSACTION_SALT);
        assert_eq!(&message[..32], salt.as_slice());
        assert_eq!(&message[32..], bcs::to_bytes(&raw).unwrap().as_slice());
    }

    #[test]
    fn test_signed_transaction_appends_authenticator() {
        let raw = sample_raw();
        let raw_len = bcs::to_bytes(&raw).unwrap().len();
        let signed = SignedTransaction::new(
            raw,
            TransactionAuthenticator::Ed25519 {
                public_key: vec![1; 32],
                signature: vec![2; 64],
            },
        );
        let bytes = signed.to_bcs().unwrap();
        // variant + (len + 32) + (len + 64)
        assert_eq!(bytes.len(), raw_len + 1 + 33 + 65);
        assert_eq!(bytes[raw_len], 0);
    }
}
