//! CLI configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;

use crm_core::{CoreError, CurrencyFormat, DEFAULT_CURRENCY, DEFAULT_LOCALE};
use tracing_subscriber::EnvFilter;

/// Default tracing filter directive.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// BCP 47 locale (`CRM_LOCALE`)
    pub locale: String,

    /// ISO 4217 currency code (`CRM_CURRENCY`)
    pub currency_code: String,

    /// Tracing filter directive (`CRM_LOG`)
    pub log_filter: String,

    /// Format resolved from `locale` and `currency_code`
    pub currency: CurrencyFormat,
}

impl CliConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns the value of a
    /// variable if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let locale = read("CRM_LOCALE", DEFAULT_LOCALE);
        let currency_code = read("CRM_CURRENCY", DEFAULT_CURRENCY);
        let log_filter = read("CRM_LOG", DEFAULT_LOG_FILTER);

        EnvFilter::try_new(&log_filter)
            .map_err(|_| ConfigError::InvalidValue("CRM_LOG".to_string()))?;

        let currency = CurrencyFormat::for_locale(&locale, &currency_code)?;

        Ok(CliConfig {
            locale,
            currency_code,
            log_filter,
            currency,
        })
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            locale: DEFAULT_LOCALE.to_string(),
            currency_code: DEFAULT_CURRENCY.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            currency: CurrencyFormat::BRL,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error(transparent)]
    Currency(#[from] CoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<CliConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CliConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.locale, "pt-BR");
        assert_eq!(config.currency_code, "BRL");
        assert_eq!(config.log_filter, "warn");
        assert_eq!(config.currency, CurrencyFormat::BRL);
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = load(&[("CRM_LOCALE", "  "), ("CRM_LOG", "")]).unwrap();
        assert_eq!(config.locale, "pt-BR");
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn test_en_us_dollars() {
        let config = load(&[("CRM_LOCALE", "en-US"), ("CRM_CURRENCY", "usd")]).unwrap();
        assert_eq!(config.currency, CurrencyFormat::USD);
    }

    #[test]
    fn test_unsupported_pair() {
        let err = load(&[("CRM_LOCALE", "fr-FR")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Currency(CoreError::UnsupportedLocale { .. })
        ));
        assert_eq!(err.to_string(), "Unsupported locale/currency: fr-FR/BRL");
    }

    #[test]
    fn test_invalid_log_filter() {
        let err = load(&[("CRM_LOG", "crm=verbose")]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for CRM_LOG");
    }
}
