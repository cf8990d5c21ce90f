use crate::core::config::data::Config;
use crate::core::personality::{Personality, PersonalityError};
use crate::core::pricing::{
    DisplayCurrency, PricingEntry, PricingTable, DEFAULT_CURRENCY_CODE, DEFAULT_CURRENCY_RATE,
};
use crate::core::provider::DEFAULT_BASE_URL;
use std::fmt;
use tracing::warn;

pub const DEFAULT_MODEL: &str = "gpt-4o";

pub const SETTABLE_KEYS: &[&str] = &["model", "base-url", "personality", "currency", "pricing"];

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigKeyError {
    UnknownKey(String),
    InvalidValue { key: &'static str, reason: String },
}

impl fmt::Display for ConfigKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigKeyError::UnknownKey(key) => write!(
                f,
                "Unknown config key: {key} (expected one of: {})",
                SETTABLE_KEYS.join(", ")
            ),
            ConfigKeyError::InvalidValue { key, reason } => {
                write!(f, "Invalid value for {key}: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigKeyError {}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigKeyError {
    ConfigKeyError::InvalidValue {
        key,
        reason: reason.into(),
    }
}

fn parse_non_negative(key: &'static str, raw: &str) -> Result<f64, ConfigKeyError> {
    let value: f64 = raw
        .parse()
        .map_err(|_| invalid(key, format!("'{raw}' is not a number")))?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(key, format!("'{raw}' must be zero or positive")));
    }
    Ok(value)
}

impl Config {
    pub fn effective_model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn effective_base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn effective_personality(&self) -> Result<Personality, PersonalityError> {
        match &self.personality {
            Some(text) => Personality::new(text),
            None => Ok(Personality::default()),
        }
    }

    pub fn display_currency(&self) -> DisplayCurrency {
        DisplayCurrency::new(
            self.currency_code
                .clone()
                .unwrap_or_else(|| DEFAULT_CURRENCY_CODE.to_string()),
            self.effective_currency_rate(),
        )
    }

    /// Hand-edited files bypass `set`, so a rate that is NaN, infinite or
    /// negative falls back to the default.
    fn effective_currency_rate(&self) -> f64 {
        match self.currency_rate {
            Some(rate) if rate.is_finite() && rate >= 0.0 => rate,
            Some(rate) => {
                warn!(rate, "Ignoring invalid currency_rate in config");
                DEFAULT_CURRENCY_RATE
            }
            None => DEFAULT_CURRENCY_RATE,
        }
    }

    pub fn pricing_table(&self) -> PricingTable {
        PricingTable::with_overrides(&self.pricing)
    }

    /// Applies `pionier set <key> <value...>`, returning a confirmation line.
    pub fn set_value(&mut self, key: &str, value: &[String]) -> Result<String, ConfigKeyError> {
        let joined = value.join(" ");
        match key {
            "model" => {
                let model = joined.trim();
                if model.is_empty() {
                    return Err(invalid("model", "model id cannot be empty"));
                }
                self.model = Some(model.to_string());
                Ok(format!("Set model to: {model}"))
            }
            "base-url" => {
                let url = joined.trim();
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(invalid("base-url", "must start with http:// or https://"));
                }
                self.base_url = Some(url.trim_end_matches('/').to_string());
                Ok(format!("Set base-url to: {url}"))
            }
            "personality" => {
                let personality =
                    Personality::new(&joined).map_err(|err| invalid("personality", err.to_string()))?;
                self.personality = Some(personality.as_str().to_string());
                Ok("Set personality".to_string())
            }
            "currency" => {
                let [code, rate] = value else {
                    return Err(invalid("currency", "expected <CODE> <RATE>, e.g. PLN 3.97"));
                };
                let rate = parse_non_negative("currency", rate)?;
                let code = code.to_ascii_uppercase();
                self.currency_code = Some(code.clone());
                self.currency_rate = Some(rate);
                Ok(format!("Set currency to: {code} at {rate} per USD"))
            }
            "pricing" => {
                let [model, input, output] = value else {
                    return Err(invalid(
                        "pricing",
                        "expected <MODEL> <INPUT_PER_MILLION> <OUTPUT_PER_MILLION>",
                    ));
                };
                let entry = PricingEntry {
                    model: model.to_ascii_lowercase(),
                    input_per_million: parse_non_negative("pricing", input)?,
                    output_per_million: parse_non_negative("pricing", output)?,
                };
                self.pricing.retain(|existing| !existing.model.eq_ignore_ascii_case(model));
                let confirmation = format!(
                    "Set pricing for {}: ${} in / ${} out per million tokens",
                    entry.model, entry.input_per_million, entry.output_per_million
                );
                self.pricing.push(entry);
                Ok(confirmation)
            }
            other => Err(ConfigKeyError::UnknownKey(other.to_string())),
        }
    }

    pub fn unset_value(&mut self, key: &str, value: Option<&str>) -> Result<String, ConfigKeyError> {
        match key {
            "model" => self.model = None,
            "base-url" => self.base_url = None,
            "personality" => self.personality = None,
            "currency" => {
                self.currency_code = None;
                self.currency_rate = None;
            }
            "pricing" => {
                let Some(model) = value else {
                    return Err(invalid("pricing", "specify the model to unset"));
                };
                self.pricing.retain(|existing| !existing.model.eq_ignore_ascii_case(model));
                return Ok(format!("Unset pricing for: {model}"));
            }
            other => return Err(ConfigKeyError::UnknownKey(other.to_string())),
        }
        Ok(format!("Unset {key}"))
    }
}
