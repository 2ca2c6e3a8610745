//! # crm CLI
//!
//! Command-line access to the crm-core validators, currency masks and
//! API record normalization.
//!
//! ## Usage
//! ```text
//! crm check cpf 529.982.247-25          → valid        (exit 0)
//! crm check cep 0131010                 → invalid      (exit 1)
//! crm mask 123456                       → R$ 1.234,56
//! crm unmask "R$ 1.234,56" --number     → 1234.56
//! crm format cnpj 11222333000181        → 11.222.333/0001-81
//! crm total --subtotal 1.000,00 --fee 50,00 --discount 100,00
//!                                       → R$ 950,00
//! crm normalize client record.json      → normalized JSON
//! ```
//!
//! Results go to stdout; logs (`CRM_LOG`) go to stderr.

mod commands;
mod config;
mod error;

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::{CheckKind, EntityKind, FormatKind};
use crate::config::CliConfig;

/// crm: Brazilian document and currency helpers for the school CRM
#[derive(Parser, Debug)]
#[command(name = "crm", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a CPF, CNPJ, phone or CEP (exit 1 when invalid)
    Check {
        #[arg(value_enum)]
        kind: CheckKind,
        /// Value as typed, punctuation allowed
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Mask keystrokes as currency (digits read as centavos)
    Mask {
        #[arg(allow_hyphen_values = true)]
        raw: String,
    },

    /// Turn a masked amount back into a canonical decimal
    Unmask {
        #[arg(allow_hyphen_values = true)]
        masked: String,
        /// Print as a number instead of a two-decimal string
        #[arg(long)]
        number: bool,
    },

    /// Format a CPF, CNPJ, phone or CEP for display
    Format {
        #[arg(value_enum)]
        kind: FormatKind,
        value: String,
    },

    /// Enrollment total: subtotal + fee - discount
    Total {
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        subtotal: String,
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        fee: String,
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        discount: String,
        /// Print the API payload instead of the display total
        #[arg(long)]
        json: bool,
    },

    /// Normalize an API record (or array of records) from a file, `-` for stdin
    Normalize {
        #[arg(value_enum)]
        entity: EntityKind,
        file: PathBuf,
    },
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = CliConfig::load().context("failed to load configuration")?;
    init_tracing(&config.log_filter);
    tracing::debug!(
        locale = %config.locale,
        currency = %config.currency_code,
        "configuration loaded"
    );

    let outcome = commands::run(cli.command, &config)?;
    println!("{}", outcome.output);

    if outcome.exit_code != 0 {
        process::exit(outcome.exit_code);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Commands {
        let argv = std::iter::once("crm").chain(args.iter().copied());
        Cli::try_parse_from(argv).unwrap().command
    }

    #[test]
    fn test_parse_check() {
        match parse(&["check", "cpf", "529.982.247-25"]) {
            Commands::Check { kind, value } => {
                assert_eq!(kind, CheckKind::Cpf);
                assert_eq!(value, "529.982.247-25");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_total_with_negative_discount() {
        match parse(&["total", "--subtotal", "1.000,00", "--discount", "-5,00", "--json"]) {
            Commands::Total {
                subtotal,
                fee,
                discount,
                json,
            } => {
                assert_eq!(subtotal, "1.000,00");
                assert_eq!(fee, "");
                assert_eq!(discount, "-5,00");
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_normalize_stdin() {
        match parse(&["normalize", "enrollment", "-"]) {
            Commands::Normalize { entity, file } => {
                assert_eq!(entity, EntityKind::Enrollment);
                assert_eq!(file, PathBuf::from("-"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["crm", "check", "rg", "123"]).is_err());
        assert!(Cli::try_parse_from(["crm", "unmask"]).is_err());
    }

    #[test]
    fn test_parse_then_run() {
        let command = parse(&["total", "--subtotal", "1000,00", "--fee", "50,00", "--discount", "100,00"]);
        let outcome = commands::run(command, &CliConfig::default()).unwrap();
        assert_eq!(outcome.output, "R$ 950,00");
    }
}
