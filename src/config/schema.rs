//! Configuration schema definitions.
//!
//! The profile file mirrors the `config.yaml` written by the node's own CLI:
//! a `profiles` mapping whose entries carry a REST endpoint and a private key.
//! Keys this tool does not use (`public_key`, `account`, `faucet_url`, ...)
//! are accepted and ignored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

use crate::blockchain::transaction::SubmitOptions;
use crate::blockchain::types::{AccountAddress, TransactionOptions, WaitPolicy};
use crate::blockchain::wallet::SigningSecret;

/// Profile name used when none is given.
pub const DEFAULT_PROFILE: &str = "default";

/// Root of the profile file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProfilesFile {
    /// Named profiles. An entry may be present but empty.
    pub profiles: Option<BTreeMap<String, Option<ProfileEntry>>>,
}

/// One profile as written on disk.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProfileEntry {
    /// Node REST endpoint, e.g. `https://fullnode.devnet.aptoslabs.com/v1`.
    pub rest_url: Option<String>,

    /// Hex-encoded Ed25519 private key.
    pub private_key: Option<String>,

    /// Address the `coin_list` package is published under.
    pub module_address: Option<String>,
}

/// Validated connection settings of the selected profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionProfile {
    /// Profile name it was resolved from.
    pub name: String,
    pub endpoint_url: Url,
    pub signing_secret: SigningSecret,
    /// Package address pinned by the profile, if any.
    pub module_address: Option<AccountAddress>,
}

/// Client tuning taken from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Gas ceiling per transaction.
    pub max_gas_amount: u64,

    /// Fixed gas unit price; the node's estimate is used when unset.
    pub gas_unit_price: Option<u64>,

    /// Seconds a drafted transaction stays valid.
    pub expiration_secs: u64,

    /// Per-request timeout for every node call.
    pub request_timeout: Duration,

    /// Upper bound on waiting for a transaction to commit.
    pub confirm_timeout: Duration,

    /// Delay between confirmation polls.
    pub poll_interval: Duration,

    /// Address the contract package is published under. Overrides the profile.
    pub module_address: Option<AccountAddress>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        let transaction = TransactionOptions::default();
        let wait = WaitPolicy::default();
        Self {
            max_gas_amount: transaction.max_gas_amount,
            gas_unit_price: transaction.gas_unit_price,
            expiration_secs: transaction.expiration_secs,
            request_timeout: Duration::from_secs(10),
            confirm_timeout: wait.timeout,
            poll_interval: wait.poll_interval,
            module_address: None,
        }
    }
}

impl ClientSettings {
    /// Pipeline options derived from these settings.
    pub fn submit_options(&self) -> SubmitOptions {
        SubmitOptions {
            transaction: TransactionOptions {
                max_gas_amount: self.max_gas_amount,
                gas_unit_price: self.gas_unit_price,
                expiration_secs: self.expiration_secs,
            },
            wait: WaitPolicy {
                timeout: self.confirm_timeout,
                poll_interval: self.poll_interval,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ClientSettings::default();
        assert_eq!(settings.max_gas_amount, 1000);
        assert_eq!(settings.request_timeout, Duration::from_secs(10));
        assert_eq!(settings.confirm_timeout, Duration::from_secs(30));
        assert!(settings.module_address.is_none());
    }

    #[test]
    fn test_submit_options() {
        let settings = ClientSettings {
            max_gas_amount: 5000,
            gas_unit_price: Some(150),
            confirm_timeout: Duration::from_secs(5),
            ..ClientSettings::default()
        };
        let options = settings.submit_options();
        assert_eq!(options.transaction.max_gas_amount, 5000);
        assert_eq!(options.transaction.gas_unit_price, Some(150));
        assert_eq!(options.wait.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let file: ProfilesFile = serde_yaml::from_str(
            r#"
profiles:
  default:
    private_key: "0x01"
    public_key: "0x02"
    account: "0x03"
    rest_url: "http://localhost:8080/v1"
    faucet_url: "http://localhost:8081"
"#,
        )
        .unwrap();
        let profiles = file.profiles.unwrap();
        let entry = profiles["default"].as_ref().unwrap();
        assert_eq!(entry.rest_url.as_deref(), Some("http://localhost:8080/v1"));
        assert!(entry.module_address.is_none());
    }
}
