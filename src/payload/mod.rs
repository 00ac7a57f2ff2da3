//! Payload construction for the `coin_list` package.
//!
//! Every contract entry point and view function is one row of [`OPERATIONS`].
//! The same table drives argument parsing, payload building and the CLI
//! subcommands, so adding an entry point is a one-line change.

use serde_json::Value;
use thiserror::Error;

use crate::blockchain::envelope::{EntryFunction, ModuleId, TransactionPayload};
use crate::blockchain::type_tag::{TypeTag, TypeTagError};
use crate::blockchain::types::AccountAddress;

/// Payload construction failures.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),

    #[error("{operation} expects {expected} {what}, got {actual}")]
    ArgumentCount {
        operation: &'static str,
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid value `{value}` for argument `{name}`: expected {expected}")]
    InvalidArgument {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error(transparent)]
    InvalidTypeTag(#[from] TypeTagError),

    #[error("cannot encode argument `{name}`: {reason}")]
    Encode { name: &'static str, reason: String },

    #[error("{0} is a read-only query and has no transaction payload")]
    NotAnEntryFunction(&'static str),
}

/// Result type for payload construction.
pub type PayloadResult<T> = Result<T, PayloadError>;

/// Move type of a positional argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    String,
    U64,
    Bool,
    Address,
}

impl ArgKind {
    fn expected(self) -> &'static str {
        match self {
            ArgKind::String => "a string",
            ArgKind::U64 => "an unsigned 64-bit integer",
            ArgKind::Bool => "`true` or `false`",
            ArgKind::Address => "a hex account address",
        }
    }
}

/// Positional argument of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: &'static str,
    pub kind: ArgKind,
}

const fn arg(name: &'static str, kind: ArgKind) -> ArgSpec {
    ArgSpec { name, kind }
}

/// Whether an operation writes (transaction) or reads (view function).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Entry,
    View,
}

/// One contract function reachable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    /// Subcommand name.
    pub name: &'static str,
    pub module: &'static str,
    pub function: &'static str,
    pub about: &'static str,
    pub kind: OperationKind,
    /// Names of the generic type parameters, passed as type tags.
    pub type_params: &'static [&'static str],
    pub args: &'static [ArgSpec],
}

const COIN_TYPE: &[&str] = &["CoinType"];
const KEY_VALUE: &[ArgSpec] = &[arg("key", ArgKind::String), arg("value", ArgKind::String)];

/// Every supported operation.
pub const OPERATIONS: &[Operation] = &[
    Operation {
        name: "coin-list:add-extension",
        module: "coin_list",
        function: "add_extension",
        about: "Attach a key/value extension to a registered coin",
        kind: OperationKind::Entry,
        type_params: COIN_TYPE,
        args: KEY_VALUE,
    },
    Operation {
        name: "coin-list:add-to-list",
        module: "coin_list",
        function: "add_to_list",
        about: "Add a registered coin to the signer's list",
        kind: OperationKind::Entry,
        type_params: COIN_TYPE,
        args: &[],
    },
    Operation {
        name: "coin-list:add-to-registry-by-signer",
        module: "coin_list",
        function: "add_to_registry_by_signer",
        about: "Register or update coin metadata",
        kind: OperationKind::Entry,
        type_params: COIN_TYPE,
        args: &[
            arg("name", ArgKind::String),
            arg("symbol", ArgKind::String),
            arg("coingecko_id", ArgKind::String),
            arg("logo_url", ArgKind::String),
            arg("project_url", ArgKind::String),
            arg("is_update", ArgKind::Bool),
        ],
    },
    Operation {
        name: "coin-list:create-list",
        module: "coin_list",
        function: "create_list",
        about: "Create an empty coin list owned by the signer",
        kind: OperationKind::Entry,
        type_params: &[],
        args: &[],
    },
    Operation {
        name: "coin-list:drop-extension",
        module: "coin_list",
        function: "drop_extension",
        about: "Remove a key/value extension from a registered coin",
        kind: OperationKind::Entry,
        type_params: COIN_TYPE,
        args: KEY_VALUE,
    },
    Operation {
        name: "coin-list:initialize",
        module: "coin_list",
        function: "initialize",
        about: "Initialize the coin registry",
        kind: OperationKind::Entry,
        type_params: &[],
        args: &[],
    },
    Operation {
        name: "coin-list:remove-from-list",
        module: "coin_list",
        function: "remove_from_list",
        about: "Remove a coin from the signer's list",
        kind: OperationKind::Entry,
        type_params: COIN_TYPE,
        args: &[],
    },
    Operation {
        name: "devnet-coins:deploy",
        module: "devnet_coins",
        function: "deploy",
        about: "Register devnet coins",
        kind: OperationKind::Entry,
        type_params: &[],
        args: &[],
    },
    Operation {
        name: "devnet-coins:mint-to-wallet",
        module: "devnet_coins",
        function: "mint_to_wallet",
        about: "Mint devnet coins to the signer",
        kind: OperationKind::Entry,
        type_params: COIN_TYPE,
        args: &[arg("amount", ArgKind::U64)],
    },
    Operation {
        name: "coin-list:query-fetch-all-registered-coin-info",
        module: "coin_list",
        function: "fetch_all_registered_coin_info",
        about: "List every coin in the registry",
        kind: OperationKind::View,
        type_params: &[],
        args: &[],
    },
    Operation {
        name: "coin-list:query-fetch-full-list",
        module: "coin_list",
        function: "fetch_full_list",
        about: "List every coin on an owner's list",
        kind: OperationKind::View,
        type_params: &[],
        args: &[arg("list_owner_addr", ArgKind::Address)],
    },
];

/// Look up an operation by subcommand name.
pub fn find(name: &str) -> Option<&'static Operation> {
    OPERATIONS.iter().find(|op| op.name == name)
}

/// A parsed positional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    String(String),
    U64(u64),
    Bool(bool),
    Address(AccountAddress),
}

impl ArgValue {
    /// Parse `raw` as `spec` demands.
    pub fn parse(spec: &ArgSpec, raw: &str) -> PayloadResult<Self> {
        let invalid = || PayloadError::InvalidArgument {
            name: spec.name,
            value: raw.to_string(),
            expected: spec.kind.expected(),
        };
        Ok(match spec.kind {
            ArgKind::String => ArgValue::String(raw.to_string()),
            ArgKind::U64 => ArgValue::U64(raw.trim().parse().map_err(|_| invalid())?),
            ArgKind::Bool => match raw.trim() {
                "true" => ArgValue::Bool(true),
                "false" => ArgValue::Bool(false),
                _ => return Err(invalid()),
            },
            ArgKind::Address => ArgValue::Address(raw.parse().map_err(|_| invalid())?),
        })
    }

    /// Entry-function argument encoding.
    pub fn to_bcs(&self) -> Result<Vec<u8>, bcs::Error> {
        match self {
            ArgValue::String(s) => bcs::to_bytes(s),
            ArgValue::U64(n) => bcs::to_bytes(n),
            ArgValue::Bool(b) => bcs::to_bytes(b),
            ArgValue::Address(a) => bcs::to_bytes(a),
        }
    }

    /// View-function argument encoding; `u64` travels as a string.
    pub fn to_json(&self) -> Value {
        match self {
            ArgValue::String(s) => Value::String(s.clone()),
            ArgValue::U64(n) => Value::String(n.to_string()),
            ArgValue::Bool(b) => Value::Bool(*b),
            ArgValue::Address(a) => Value::String(a.to_string()),
        }
    }
}

/// Typed arguments of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub operation: &'static Operation,
    pub type_args: Vec<TypeTag>,
    pub args: Vec<ArgValue>,
}

impl Invocation {
    /// Validate raw strings against the operation's signature.
    pub fn parse(
        operation: &'static Operation,
        raw_type_args: &[String],
        raw_args: &[String],
    ) -> PayloadResult<Self> {
        check_count(operation, "type arguments", operation.type_params.len(), raw_type_args.len())?;
        check_count(operation, "arguments", operation.args.len(), raw_args.len())?;

        let type_args = raw_type_args
            .iter()
            .map(|raw| raw.parse::<TypeTag>())
            .collect::<Result<Vec<_>, _>>()?;
        let args = operation
            .args
            .iter()
            .zip(raw_args)
            .map(|(spec, raw)| ArgValue::parse(spec, raw))
            .collect::<PayloadResult<Vec<_>>>()?;

        Ok(Self {
            operation,
            type_args,
            args,
        })
    }

    /// Build the transaction payload for an entry function published at `module_address`.
    pub fn build_payload(&self, module_address: AccountAddress) -> PayloadResult<TransactionPayload> {
        if self.operation.kind != OperationKind::Entry {
            return Err(PayloadError::NotAnEntryFunction(self.operation.name));
        }

        let args = self
            .operation
            .args
            .iter()
            .zip(&self.args)
            .map(|(spec, value)| {
                value.to_bcs().map_err(|e| PayloadError::Encode {
                    name: spec.name,
                    reason: e.to_string(),
                })
            })
            .collect::<PayloadResult<Vec<_>>>()?;

        Ok(TransactionPayload::EntryFunction(EntryFunction {
            module: ModuleId {
                address: module_address,
                name: self.operation.module.to_string(),
            },
            function: self.operation.function.to_string(),
            ty_args: self.type_args.clone(),
            args,
        }))
    }

    /// Arguments in view-function form.
    pub fn json_args(&self) -> Vec<Value> {
        self.args.iter().map(ArgValue::to_json).collect()
    }
}

fn check_count(
    operation: &'static Operation,
    what: &'static str,
    expected: usize,
    actual: usize,
) -> PayloadResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(PayloadError::ArgumentCount {
            operation: operation.name,
            what,
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_operation_names_are_unique() {
        let names: HashSet<_> = OPERATIONS.iter().map(|op| op.name).collect();
        assert_eq!(names.len(), OPERATIONS.len());
        assert!(find("coin-list:create-list").is_some());
        assert!(find("coin-list:nope").is_none());
    }

    #[test]
    fn test_registry_payload() {
        let op = find("coin-list:add-to-registry-by-signer").unwrap();
        let invocation = Invocation::parse(
            op,
            &strings(&["0x1::aptos_coin::AptosCoin"]),
            &strings(&["Aptos", "APT", "aptos", "https://logo", "https://aptos", "false"]),
        )
        .unwrap();

        let payload = invocation.build_payload(AccountAddress::ONE).unwrap();
        let TransactionPayload::EntryFunction(function) = payload;
        assert_eq!(function.module.name, "coin_list");
        assert_eq!(function.function, "add_to_registry_by_signer");
        assert_eq!(function.ty_args.len(), 1);
        assert_eq!(function.args.len(), 6);
        assert_eq!(function.args[0], vec![5, b'A', b'p', b't', b'o', b's']);
        assert_eq!(function.args[5], vec![0]);
    }

    #[test]
    fn test_mint_amount_encoding() {
        let op = find("devnet-coins:mint-to-wallet").unwrap();
        let invocation =
            Invocation::parse(op, &strings(&["0x1::aptos_coin::AptosCoin"]), &strings(&["258"]))
                .unwrap();
        let TransactionPayload::EntryFunction(function) =
            invocation.build_payload(AccountAddress::ONE).unwrap();
        assert_eq!(function.module.name, "devnet_coins");
        assert_eq!(function.args[0], 258u64.to_le_bytes().to_vec());
    }

    #[test]
    fn test_wrong_argument_count() {
        let op = find("coin-list:add-extension").unwrap();
        let err = Invocation::parse(op, &strings(&["u64"]), &strings(&["key"])).unwrap_err();
        assert!(matches!(
            err,
            PayloadError::ArgumentCount {
                expected: 2,
                actual: 1,
                ..
            }
        ));

        let err = Invocation::parse(op, &[], &strings(&["k", "v"])).unwrap_err();
        assert!(matches!(err, PayloadError::ArgumentCount { what: "type arguments", .. }));
    }

    #[test]
    fn test_strict_bool() {
        let spec = arg("is_update", ArgKind::Bool);
        assert_eq!(ArgValue::parse(&spec, "true").unwrap(), ArgValue::Bool(true));
        assert!(matches!(
            ArgValue::parse(&spec, "yes"),
            Err(PayloadError::InvalidArgument { name: "is_update", .. })
        ));
    }

    #[test]
    fn test_invalid_values() {
        assert!(ArgValue::parse(&arg("amount", ArgKind::U64), "-1").is_err());
        assert!(ArgValue::parse(&arg("owner", ArgKind::Address), "0xnothex").is_err());

        let op = find("coin-list:add-to-list").unwrap();
        let err = Invocation::parse(op, &strings(&["0x1::coin"]), &[]).unwrap_err();
        assert!(matches!(err, PayloadError::InvalidTypeTag(_)));
    }

    #[test]
    fn test_view_has_no_payload() {
        let op = find("coin-list:query-fetch-full-list").unwrap();
        let invocation = Invocation::parse(op, &[], &strings(&["0x1"])).unwrap();
        assert_eq!(
            invocation.json_args(),
            vec![Value::String(AccountAddress::ONE.to_string())]
        );
        assert!(matches!(
            invocation.build_payload(AccountAddress::ONE),
            Err(PayloadError::NotAnEntryFunction(_))
        ));
    }
}
