//! Read-only queries against the coin registry.
//!
//! A query is a single view-function round trip: no polling, no retries.
//! Failures are split between the node not answering and the answer not
//! matching the type it is decoded into.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::blockchain::client::ChainClient;
use crate::blockchain::type_tag::TypeTag;
use crate::blockchain::types::{AccountAddress, BlockchainError, ViewRequest};
use crate::blockchain::wallet::SigningIdentity;

/// Module holding the registry view functions.
pub const COIN_LIST_MODULE: &str = "coin_list";

/// Query failures.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Node could not be reached or refused the call.
    #[error("query {function} failed: {source}")]
    Unreachable {
        function: String,
        #[source]
        source: BlockchainError,
    },

    /// Response did not match the expected shape.
    #[error("query {function} returned an unexpected shape: {reason}")]
    Decode { function: String, reason: String },
}

/// Result type for queries.
pub type QueryResult<T> = Result<T, QueryError>;

/// Identity of an on-chain type as stored by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInfo {
    pub account_address: String,
    #[serde(deserialize_with = "hex_utf8")]
    pub module_name: String,
    #[serde(deserialize_with = "hex_utf8")]
    pub struct_name: String,
}

impl TypeInfo {
    /// `address::module::Struct`
    pub fn type_name(&self) -> String {
        format!(
            "{}::{}::{}",
            self.account_address, self.module_name, self.struct_name
        )
    }
}

/// Single key/value entry of a registry extension map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    pub key: String,
    pub value: String,
}

/// Extension map as the node renders it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extensions {
    pub data: Vec<Extension>,
}

/// Registry entry for one coin type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinInfo {
    pub name: String,
    pub symbol: String,
    pub coingecko_id: String,
    pub decimals: u8,
    pub logo_url: String,
    pub project_url: String,
    pub token_type: TypeInfo,
    pub extensions: Extensions,
}

/// Move `vector<u8>` names arrive as `0x`-prefixed hex.
fn hex_utf8<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    use serde::de::Error;

    let s = String::deserialize(deserializer)?;
    if !s.starts_with("0x") {
        return Ok(s);
    }
    let bytes = hex::decode(&s[2..]).map_err(D::Error::custom)?;
    String::from_utf8(bytes).map_err(D::Error::custom)
}

/// Runs view functions through a chain client.
pub struct QueryExecutor<'a, C: ChainClient + ?Sized> {
    client: &'a C,
    identity: &'a SigningIdentity,
    module_address: AccountAddress,
}

impl<'a, C: ChainClient + ?Sized> QueryExecutor<'a, C> {
    /// `identity` only names who is asking; nothing is signed.
    pub fn new(client: &'a C, identity: &'a SigningIdentity, module_address: AccountAddress) -> Self {
        Self {
            client,
            identity,
            module_address,
        }
    }

    /// Invoke `module::function` and decode its first return value as `T`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        module: &str,
        function: &str,
        type_args: &[TypeTag],
        args: Vec<Value>,
    ) -> QueryResult<T> {
        let request = ViewRequest {
            function: format!("{}::{}::{}", self.module_address, module, function),
            type_arguments: type_args.iter().map(ToString::to_string).collect(),
            arguments: args,
        };
        tracing::debug!(
            function = %request.function,
            reader = %self.identity.address(),
            "Running view function"
        );

        let response = self
            .client
            .view(&request)
            .await
            .map_err(|source| match source {
                BlockchainError::Decode(reason) => QueryError::Decode {
                    function: request.function.clone(),
                    reason,
                },
                source => QueryError::Unreachable {
                    function: request.function.clone(),
                    source,
                },
            })?;

        let decode_error = |reason: String| QueryError::Decode {
            function: request.function.clone(),
            reason,
        };

        let first = match response {
            Value::Array(mut values) if !values.is_empty() => values.swap_remove(0),
            other => return Err(decode_error(format!("expected a non-empty array, got {}", other))),
        };
        serde_json::from_value(first).map_err(|e| decode_error(e.to_string()))
    }

    /// Every coin in the global registry.
    pub async fn fetch_all_registered_coin_info(&self) -> QueryResult<Vec<CoinInfo>> {
        self.call(COIN_LIST_MODULE, "fetch_all_registered_coin_info", &[], vec![])
            .await
    }

    /// Every coin on the list owned by `owner`.
    pub async fn fetch_full_list(&self, owner: AccountAddress) -> QueryResult<Vec<CoinInfo>> {
        self.call(
            COIN_LIST_MODULE,
            "fetch_full_list",
            &[],
            vec![Value::String(owner.to_string())],
        )
        .await
    }
}
