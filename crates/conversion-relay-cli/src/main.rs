// crates/conversion-relay-cli/src/main.rs
// ============================================================================
// Module: Conversion Relay CLI Entry Point
// Description: Command dispatcher for serving and config utilities.
// Purpose: Run the relay server and inspect its configuration.
// Dependencies: clap, conversion-relay-config, conversion-relay-server, tokio.
// ============================================================================

//! ## Overview
//! `conversion-relay serve` loads configuration, resolves the bearer token
//! from the environment and serves the relay endpoint until the listener
//! fails. `config check` validates a file without starting the server and
//! `config example` prints a canonical configuration.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use conversion_relay_config::RelayConfig;
use conversion_relay_config::config_toml_example;
use conversion_relay_server::RelayServer;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "conversion-relay", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the conversion relay server.
    Serve(ConfigArgs),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a configuration file and report the resolved settings.
    Check(ConfigArgs),
    /// Print a canonical example configuration.
    Example,
}

/// Shared config path argument.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Optional config file path (defaults to conversion-relay.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Commands::Serve(args) => command_serve(args).await,
        Commands::Config {
            command,
        } => match command {
            ConfigCommand::Check(args) => command_config_check(&args),
            ConfigCommand::Example => command_config_example(),
        },
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(args: ConfigArgs) -> CliResult<ExitCode> {
    let config = load_config(&args)?;
    let credentials = config.credentials();
    if !credentials.is_configured() {
        write_stderr_line(&format!(
            "conversion-relay: WARNING: {} is not set; conversions will be rejected with 500",
            config.upstream.token_env
        ))
        .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    let server = RelayServer::with_credentials(config, credentials)
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `config check` command.
fn command_config_check(args: &ConfigArgs) -> CliResult<ExitCode> {
    let config = load_config(args)?;
    for line in describe_config(&config, config.credentials().is_configured()) {
        write_stdout_line(&line).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `config example` command.
fn command_config_example() -> CliResult<ExitCode> {
    let mut stdout = std::io::stdout();
    stdout
        .write_all(config_toml_example().as_bytes())
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads and validates configuration for a command.
fn load_config(args: &ConfigArgs) -> CliResult<RelayConfig> {
    RelayConfig::load(args.config.as_deref())
        .map_err(|err| CliError::new(format!("config load failed: {err}")))
}

/// Summarizes a validated configuration without exposing the token.
fn describe_config(config: &RelayConfig, token_configured: bool) -> Vec<String> {
    let token_state = if token_configured { "set" } else { "not set" };
    let audit = match (config.audit.enabled, &config.audit.path) {
        (false, _) => "disabled".to_string(),
        (true, Some(path)) => format!("file {path}"),
        (true, None) => "stderr".to_string(),
    };
    vec![
        "config ok".to_string(),
        format!("bind: {}", config.server.bind),
        format!("path: {}", config.server.path),
        format!("max_body_bytes: {}", config.server.max_body_bytes),
        format!("upstream: {}", config.upstream.url),
        format!("token: {} ({token_state})", config.upstream.token_env),
        format!("audit: {audit}"),
    ]
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
