//! Command-line surface.
//!
//! Global flags are declared with clap's derive API; one subcommand per row of
//! [`OPERATIONS`](crate::payload::OPERATIONS) is generated with the builder API,
//! so the CLI and the payload registry cannot drift apart.

pub mod output;

use clap::{value_parser, Arg, ArgAction, Args, Command, FromArgMatches};
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use crate::blockchain::client::{ChainClient, RestClient};
use crate::blockchain::query::{CoinInfo, QueryExecutor};
use crate::blockchain::transaction::SubmissionPipeline;
use crate::blockchain::types::AccountAddress;
use crate::blockchain::wallet::SigningIdentity;
use crate::config::{self, validate_settings, ClientSettings, ConfigError, DEFAULT_PROFILE};
use crate::error::CliError;
use crate::observability::logging::Verbosity;
use crate::payload::{self, ArgKind, Invocation, Operation, OperationKind, OPERATIONS};

pub use output::CommandOutput;

/// Flags shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Path to the profile config (as written by `aptos init`)
    #[arg(short, long, value_name = "PATH")]
    pub config: PathBuf,

    /// Config profile to use
    #[arg(short, long, value_name = "PROFILE", default_value = DEFAULT_PROFILE)]
    pub profile: String,

    /// Gas ceiling per transaction
    #[arg(long, value_name = "UNITS", default_value_t = 1000)]
    pub max_gas: u64,

    /// Fixed gas unit price (defaults to the node's estimate)
    #[arg(long, value_name = "OCTAS")]
    pub gas_unit_price: Option<u64>,

    /// Seconds a drafted transaction stays valid
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub expiration_secs: u64,

    /// Timeout for each request to the node
    #[arg(long, value_name = "SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,

    /// Maximum time to wait for a transaction to commit
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub confirm_timeout_secs: u64,

    /// Delay between confirmation polls
    #[arg(long, value_name = "MILLIS", default_value_t = 500)]
    pub poll_interval_ms: u64,

    /// Address the coin_list package is published under (overrides the profile's `module_address`)
    #[arg(long, value_name = "ADDRESS")]
    pub module_address: Option<AccountAddress>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl GlobalArgs {
    pub fn settings(&self) -> ClientSettings {
        ClientSettings {
            max_gas_amount: self.max_gas,
            gas_unit_price: self.gas_unit_price,
            expiration_secs: self.expiration_secs,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            confirm_timeout: Duration::from_secs(self.confirm_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            module_address: self.module_address,
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}

/// A fully parsed command line.
#[derive(Debug, Clone)]
pub struct ParsedCommand {
    pub globals: GlobalArgs,
    pub operation: &'static Operation,
    /// Raw type tags, in declaration order.
    pub type_args: Vec<String>,
    /// Raw positional arguments, in declaration order.
    pub args: Vec<String>,
}

fn arg_help(kind: ArgKind) -> &'static str {
    match kind {
        ArgKind::String => "String argument",
        ArgKind::U64 => "Unsigned 64-bit integer",
        ArgKind::Bool => "`true` or `false`",
        ArgKind::Address => "Account address (hex)",
    }
}

fn operation_command(op: &'static Operation) -> Command {
    let type_args = op.type_params.iter().map(|param| {
        Arg::new(*param)
            .value_name(*param)
            .help("Type tag, e.g. 0x1::aptos_coin::AptosCoin")
            .value_parser(value_parser!(String))
            .required(true)
    });
    let args = op.args.iter().map(|spec| {
        Arg::new(spec.name)
            .help(arg_help(spec.kind))
            .value_parser(value_parser!(String))
            .required(true)
    });

    Command::new(op.name).about(op.about).args(type_args).args(args)
}

/// Full command tree.
pub fn command() -> Command {
    let root = Command::new("coin-list")
        .about("Submit transactions and run queries against the coin_list contract")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true);

    GlobalArgs::augment_args(root).subcommands(OPERATIONS.iter().map(operation_command))
}

/// Parse a command line.
pub fn parse_from<I, T>(args: I) -> Result<ParsedCommand, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let mut cmd = command();
    let matches = cmd.try_get_matches_from_mut(args)?;
    let globals = GlobalArgs::from_arg_matches(&matches)?;

    let Some((name, sub)) = matches.subcommand() else {
        return Err(cmd.error(clap::error::ErrorKind::MissingSubcommand, "no operation given"));
    };
    let Some(operation) = payload::find(name) else {
        return Err(cmd.error(
            clap::error::ErrorKind::InvalidSubcommand,
            format!("unknown operation `{}`", name),
        ));
    };

    let value = |id: &str| sub.get_one::<String>(id).cloned().unwrap_or_default();

    Ok(ParsedCommand {
        globals,
        operation,
        type_args: operation.type_params.iter().map(|p| value(*p)).collect(),
        args: operation.args.iter().map(|a| value(a.name)).collect(),
    })
}

/// Parse the process arguments, exiting with usage on error.
pub fn parse() -> ParsedCommand {
    parse_from(std::env::args_os()).unwrap_or_else(|e| e.exit())
}

/// Run one operation against an already connected client.
pub async fn execute<C: ChainClient + ?Sized>(
    client: &C,
    identity: &SigningIdentity,
    settings: &ClientSettings,
    invocation: &Invocation,
) -> Result<CommandOutput, CliError> {
    let operation = invocation.operation;
    let module_address = match settings.module_address {
        Some(address) => address,
        None => {
            tracing::warn!(
                signer = %identity.address(),
                "No module address in flags or profile; assuming the signer published coin_list"
            );
            identity.address()
        }
    };
    tracing::debug!(
        operation = operation.name,
        module_address = %module_address,
        "Executing operation"
    );

    match operation.kind {
        OperationKind::Entry => {
            let payload = invocation.build_payload(module_address)?;
            let mut pipeline = SubmissionPipeline::new(client, identity, settings.submit_options());
            let outcome = pipeline
                .submit(payload)
                .await
                .map_err(|source| CliError::Transaction {
                    operation: operation.name,
                    source,
                })?;
            Ok(CommandOutput::Transaction(outcome))
        }
        OperationKind::View => {
            let executor = QueryExecutor::new(client, identity, module_address);
            let coins: Vec<CoinInfo> = executor
                .call(
                    operation.module,
                    operation.function,
                    &invocation.type_args,
                    invocation.json_args(),
                )
                .await?;
            Ok(CommandOutput::Coins(coins))
        }
    }
}

/// Resolve config, connect, run the operation and print its result.
pub async fn run(parsed: ParsedCommand) -> Result<(), CliError> {
    let mut settings = parsed.globals.settings();
    validate_settings(&settings).map_err(ConfigError::Validation)?;
    let invocation = Invocation::parse(parsed.operation, &parsed.type_args, &parsed.args)?;

    let profile = config::resolve_profile(&parsed.globals.config, &parsed.globals.profile)?;
    let client = RestClient::new(profile.endpoint_url.clone(), settings.request_timeout)
        .map_err(CliError::Client)?;
    let identity = SigningIdentity::from_secret(&profile.signing_secret);
    if settings.module_address.is_none() {
        settings.module_address = profile.module_address;
    }

    println!("Using address {}", identity.address());
    tracing::info!(
        profile = %profile.name,
        endpoint = %profile.endpoint_url,
        address = %identity.address(),
        "Connected"
    );

    let output = execute(&client, &identity, &settings, &invocation).await?;
    println!("{}", output.render()?);

    if let CommandOutput::Transaction(outcome) = &output {
        if !outcome.is_success() {
            return Err(CliError::Aborted {
                hash: outcome.hash,
                vm_status: outcome
                    .vm_status
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string()),
            });
        }
    }

    Ok(())
}
