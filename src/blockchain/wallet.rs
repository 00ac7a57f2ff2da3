//! Signing identity and transaction signing.
//!
//! # Security
//! - Private keys come only from the resolved config profile
//! - Keys are never logged or serialized

use ed25519_dalek::{Signer, SigningKey};
use sha3::{Digest, Sha3_256};
use std::fmt;
use thiserror::Error;

use crate::blockchain::envelope::{RawTransaction, SignedTransaction, TransactionAuthenticator};
use crate::blockchain::types::{AccountAddress, BlockchainError, BlockchainResult};

/// Scheme byte appended to a single Ed25519 public key when deriving its address.
const ED25519_SCHEME: u8 = 0x00;

/// Prefix some tools put in front of an Ed25519 private key.
const ED25519_KEY_PREFIX: &str = "ed25519-priv-";

/// Private key decoding failure.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("expected 32 bytes, got {0}")]
    Length(usize),
}

/// Raw 32-byte Ed25519 private key.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret([u8; 32]);

impl SigningSecret {
    /// Decode a hex private key (with or without `0x` and `ed25519-priv-` prefixes).
    pub fn from_hex(private_key_hex: &str) -> Result<Self, KeyError> {
        let key = private_key_hex.trim();
        let key = key.strip_prefix(ED25519_KEY_PREFIX).unwrap_or(key);
        let key = key.strip_prefix("0x").unwrap_or(key);

        let bytes = hex::decode(key)?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::Length(bytes.len()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

/// Account authorized to sign transactions.
#[derive(Clone)]
pub struct SigningIdentity {
    key: SigningKey,
    address: AccountAddress,
}

impl SigningIdentity {
    /// Derive the identity (and its address) from a private key.
    pub fn from_secret(secret: &SigningSecret) -> Self {
        let key = SigningKey::from_bytes(&secret.0);
        let address = derive_address(&key.verifying_key().to_bytes());

        tracing::debug!(address = %address, "Signing identity derived");

        Self { key, address }
    }

    pub fn address(&self) -> AccountAddress {
        self.address
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }

    /// Sign a raw transaction.
    ///
    /// Fails when the transaction names a different sender, since the node would
    /// reject the authenticator anyway.
    pub fn sign_transaction(&self, raw: RawTransaction) -> BlockchainResult<SignedTransaction> {
        if raw.sender != self.address {
            return Err(BlockchainError::Signing(format!(
                "transaction sender {} does not match signer {}",
                raw.sender, self.address
            )));
        }

        let message = raw.signing_message()?;
        let signature = self.key.sign(&message);

        Ok(SignedTransaction::new(
            raw,
            TransactionAuthenticator::Ed25519 {
                public_key: self.public_key().to_vec(),
                signature: signature.to_bytes().to_vec(),
            },
        ))
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Address of a single-key Ed25519 account: `sha3_256(public_key || scheme)`.
pub fn derive_address(public_key: &[u8; 32]) -> AccountAddress {
    let mut hasher = Sha3_256::new();
    hasher.update(public_key);
    hasher.update([ED25519_SCHEME]);
    AccountAddress::new(hasher.finalize().into())
}
