//! Subcommand handlers.
//!
//! Each handler returns the text for stdout and an exit code; `main` does
//! the printing. Nothing here touches the terminal directly.

use std::io::Read;
use std::path::Path;

use clap::ValueEnum;
use serde_json::Value;

use crm_core::document::{self, format_cep, format_cnpj, format_cpf, format_document, format_phone};
use crm_core::{Client, Enrollment, EnrollmentPricing, KanbanStage};

use crate::config::CliConfig;
use crate::error::CliError;
use crate::Commands;

/// What a subcommand produced.
#[derive(Debug, PartialEq, Eq)]
pub struct Outcome {
    pub output: String,
    pub exit_code: i32,
}

impl Outcome {
    fn ok(output: impl Into<String>) -> Self {
        Outcome {
            output: output.into(),
            exit_code: 0,
        }
    }
}

/// Field kinds for `check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CheckKind {
    Cpf,
    Cnpj,
    /// CPF or CNPJ, by digit count
    Document,
    Phone,
    Cep,
}

/// Field kinds for `format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatKind {
    Cpf,
    Cnpj,
    Document,
    Phone,
    Cep,
}

/// API record kinds for `normalize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntityKind {
    Client,
    Enrollment,
    Stage,
}

/// Runs one subcommand.
pub fn run(command: Commands, config: &CliConfig) -> Result<Outcome, CliError> {
    match command {
        Commands::Check { kind, value } => Ok(check(kind, &value)),
        Commands::Mask { raw } => Ok(Outcome::ok(crm_core::money::apply_currency_mask(
            &raw,
            &config.currency,
        ))),
        Commands::Unmask { masked, number } => Ok(unmask(&masked, number, config)),
        Commands::Format { kind, value } => format(kind, &value).map(Outcome::ok),
        Commands::Total {
            subtotal,
            fee,
            discount,
            json,
        } => total(&subtotal, &fee, &discount, json, config),
        Commands::Normalize { entity, file } => {
            let input = read_input(&file)?;
            normalize(entity, &input).map(Outcome::ok)
        }
    }
}

fn check(kind: CheckKind, value: &str) -> Outcome {
    let valid = match kind {
        CheckKind::Cpf => document::is_valid_cpf(value),
        CheckKind::Cnpj => document::is_valid_cnpj(value),
        CheckKind::Document => document::is_valid_cpf_or_cnpj(value),
        CheckKind::Phone => document::is_valid_phone(value),
        CheckKind::Cep => document::is_valid_cep(value),
    };
    tracing::debug!(?kind, valid, "checked value");

    if valid {
        Outcome::ok("valid")
    } else {
        Outcome {
            output: "invalid".to_string(),
            exit_code: 1,
        }
    }
}

fn unmask(masked: &str, number: bool, config: &CliConfig) -> Outcome {
    let amount = config.currency.parse(masked).unwrap_or_default();
    if number {
        Outcome::ok(amount.to_f64().to_string())
    } else {
        Outcome::ok(amount.to_canonical_string())
    }
}

fn format(kind: FormatKind, value: &str) -> Result<String, CliError> {
    let (name, formatted) = match kind {
        FormatKind::Cpf => ("CPF", format_cpf(value)),
        FormatKind::Cnpj => ("CNPJ", format_cnpj(value)),
        FormatKind::Document => ("CPF/CNPJ", format_document(value)),
        FormatKind::Phone => ("phone", format_phone(value)),
        FormatKind::Cep => ("CEP", format_cep(value)),
    };
    formatted.ok_or_else(|| CliError::Unformattable {
        kind: name,
        value: value.to_string(),
    })
}

fn total(
    subtotal: &str,
    fee: &str,
    discount: &str,
    json: bool,
    config: &CliConfig,
) -> Result<Outcome, CliError> {
    let read = |s: &str| config.currency.parse(s).unwrap_or_default();
    let pricing = EnrollmentPricing::new(read(subtotal), read(fee), read(discount));

    if json {
        Ok(Outcome::ok(serde_json::to_string_pretty(&pricing.to_payload())?))
    } else {
        Ok(Outcome::ok(pricing.total().format(&config.currency)))
    }
}

fn read_input(file: &Path) -> Result<String, CliError> {
    let read_err = |source| CliError::Read {
        path: file.to_path_buf(),
        source,
    };

    if file == Path::new("-") {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .map_err(read_err)?;
        Ok(input)
    } else {
        std::fs::read_to_string(file).map_err(read_err)
    }
}

/// Normalizes one record, or each element of an array of records.
fn normalize(entity: EntityKind, input: &str) -> Result<String, CliError> {
    let value: Value = serde_json::from_str(input)?;

    let normalized = match &value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| normalize_record(entity, item))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        record => normalize_record(entity, record)?,
    };

    Ok(serde_json::to_string_pretty(&normalized)?)
}

fn normalize_record(entity: EntityKind, record: &Value) -> Result<Value, CliError> {
    let normalized = match entity {
        EntityKind::Client => serde_json::to_value(Client::from_api(record)?)?,
        EntityKind::Enrollment => serde_json::to_value(Enrollment::from_api(record)?)?,
        EntityKind::Stage => serde_json::to_value(KanbanStage::from_api(record)?)?,
    };
    Ok(normalized)
}
