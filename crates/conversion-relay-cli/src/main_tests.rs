// crates/conversion-relay-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Tests
// Description: Unit tests for argument parsing and config helpers.
// Purpose: Ensure the command surface parses as documented.
// Dependencies: clap, conversion-relay-config, tempfile
// ============================================================================

//! ## Overview
//! Validates subcommand parsing, config loading through `--config`, and the
//! config summary printed by `config check`.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;

use clap::Parser;
use conversion_relay_config::RelayConfig;

use super::Cli;
use super::Commands;
use super::ConfigArgs;
use super::ConfigCommand;
use super::describe_config;
use super::load_config;

// ============================================================================
// SECTION: Parsing
// ============================================================================

#[test]
fn serve_accepts_config_flag() {
    let cli = Cli::try_parse_from(["conversion-relay", "serve", "--config", "relay.toml"]).unwrap();
    match cli.command {
        Commands::Serve(args) => assert_eq!(args.config.as_deref(), Some(Path::new("relay.toml"))),
        Commands::Config {
            ..
        } => panic!("expected serve"),
    }
}

#[test]
fn config_check_and_example_parse() {
    let cli = Cli::try_parse_from(["conversion-relay", "config", "check"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Config {
            command: ConfigCommand::Check(ConfigArgs {
                config: None
            })
        }
    ));
    let cli = Cli::try_parse_from(["conversion-relay", "config", "example"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Config {
            command: ConfigCommand::Example
        }
    ));
}

#[test]
fn missing_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["conversion-relay"]).is_err());
    assert!(Cli::try_parse_from(["conversion-relay", "relay"]).is_err());
}

// ============================================================================
// SECTION: Config Helpers
// ============================================================================

#[test]
fn load_config_reads_explicit_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[server]\npath = \"/hooks/conversion\"").unwrap();
    let args = ConfigArgs {
        config: Some(file.path().to_path_buf()),
    };
    let config = load_config(&args).unwrap();
    assert_eq!(config.server.path, "/hooks/conversion");
}

#[test]
fn load_config_reports_invalid_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[server]\nmax_body_bytes = 0").unwrap();
    let args = ConfigArgs {
        config: Some(file.path().to_path_buf()),
    };
    let err = load_config(&args).unwrap_err();
    assert!(err.to_string().starts_with("config load failed"));
}

#[test]
fn describe_config_never_prints_token_value() {
    let config = RelayConfig::default();
    let lines = describe_config(&config, true);
    assert_eq!(lines[0], "config ok");
    assert!(lines.iter().any(|line| line == "token: PARTNERSTACK_TOKEN (set)"));
    assert!(lines.iter().any(|line| line == "audit: stderr"));
    let missing = describe_config(&config, false);
    assert!(missing.iter().any(|line| line == "token: PARTNERSTACK_TOKEN (not set)"));
}
