//! Command-line caller: paste a curl command, pick a strategy, see the
//! response.

use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use curlrelay_core::{command, DispatchConfig, Dispatcher, StrategyKind};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Execute a curl-style command through a direct call or a relay.
#[derive(Parser, Debug)]
#[command(name = "curlrelay", version)]
struct Cli {
    /// How the request reaches its target: direct, local, hosted, opaque or
    /// prefix.
    #[arg(short, long, default_value = "direct")]
    strategy: StrategyKind,
    /// Local relay endpoint (overrides CURLRELAY_LOCAL_RELAY).
    #[arg(long, value_name = "URL")]
    local_relay: Option<String>,
    /// Hosted relay endpoint (overrides CURLRELAY_HOSTED_RELAY).
    #[arg(long, value_name = "URL")]
    hosted_relay: Option<String>,
    /// Give up after this many seconds (overrides CURLRELAY_TIMEOUT_SECS).
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
    /// Print the parsed request as JSON instead of executing it.
    #[arg(long)]
    parse_only: bool,
    /// Raise log verbosity (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// The command text. Read from stdin when omitted.
    #[arg(
        value_name = "COMMAND",
        num_args = 0..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    command: Vec<String>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let raw = if cli.command.is_empty() {
        io::read_to_string(io::stdin().lock()).context("failed to read command from stdin")?
    } else {
        join_args(&cli.command)
    };
    if raw.trim().is_empty() {
        bail!("Paste a cURL command first");
    }

    let descriptor = command::parse(&raw);
    debug!(?descriptor, "parsed command");
    if cli.parse_only {
        println!("{}", serde_json::to_string_pretty(&descriptor)?);
        return Ok(ExitCode::SUCCESS);
    }
    if !descriptor.has_url() {
        bail!("No URL found in cURL command");
    }

    let config = resolve_config(&cli)?;
    let dispatcher = Dispatcher::new(config);
    eprintln!("{}", Dispatcher::describe(&descriptor, cli.strategy));

    let outcome = dispatcher.execute(&descriptor, cli.strategy)?;
    eprintln!("{}", outcome.summary());
    println!("{}", outcome.pretty_body());

    Ok(if outcome.ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn resolve_config(cli: &Cli) -> Result<DispatchConfig> {
    let mut config = DispatchConfig::from_env().context("invalid environment configuration")?;
    if let Some(url) = &cli.local_relay {
        config.local_relay_url = url.clone();
    }
    if let Some(url) = &cli.hosted_relay {
        config.hosted_relay_url = url.clone();
    }
    if let Some(secs) = cli.timeout {
        config.timeout = Some(Duration::from_secs(secs));
    }
    Ok(config)
}

/// Rebuild command text from arguments the shell already split, re-quoting
/// any argument that would otherwise fall apart on whitespace or quotes.
fn join_args(args: &[String]) -> String {
    args.iter()
        .map(|arg| quote_arg(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_arg(arg: &str) -> String {
    let has_single = arg.contains('\'');
    let has_double = arg.contains('"');
    if arg.is_empty() || !(has_single || has_double || arg.chars().any(char::is_whitespace)) {
        return arg.to_string();
    }
    match (has_single, has_double) {
        (false, _) => format!("'{arg}'"),
        (true, false) => format!("\"{arg}\""),
        // Adjacent quoted segments join into one token: 'it'"'"'s'
        (true, true) => format!("'{}'", arg.replace('\'', r#"'"'"'"#)),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();
}
