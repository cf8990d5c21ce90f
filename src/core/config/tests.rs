use super::data::Config;
use super::defaults::{ConfigKeyError, DEFAULT_MODEL};
use super::io::ConfigError;
use crate::core::personality::Personality;
use crate::core::pricing::PricingEntry;
use crate::core::provider::DEFAULT_BASE_URL;
use std::fs;
use tempfile::TempDir;

fn words(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nonexistent_config.toml");

    let config = Config::load_from_path(&config_path).expect("Failed to load config");

    assert_eq!(config, Config::default());
    assert_eq!(config.effective_model(), DEFAULT_MODEL);
    assert_eq!(config.effective_base_url(), DEFAULT_BASE_URL);
    assert_eq!(
        config.effective_personality().expect("default personality"),
        Personality::default()
    );
}

#[test]
fn test_config_persistence_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config
        .set_value("model", &words(&["gpt-4o-mini"]))
        .expect("set model");
    config
        .set_value("currency", &words(&["eur", "0.92"]))
        .expect("set currency");
    config
        .set_value("pricing", &words(&["my-model", "1.5", "3"]))
        .expect("set pricing");
    config.save_to_path(&config_path).expect("Failed to save config");

    let loaded = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(loaded, config);
    assert_eq!(loaded.effective_model(), "gpt-4o-mini");
    assert_eq!(loaded.display_currency().code, "EUR");
    assert!(loaded.pricing_table().get("my-model").is_some());

    let mut loaded = loaded;
    loaded.unset_value("currency", None).expect("unset currency");
    loaded.save_to_path(&config_path).expect("Failed to save again");
    let reloaded = Config::load_from_path(&config_path).expect("Failed to reload");
    assert_eq!(reloaded.currency_code, None);
    assert_eq!(reloaded.display_currency().code, "PLN");
    assert_eq!(reloaded.effective_model(), "gpt-4o-mini");
}

#[test]
fn parse_errors_name_the_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "model = [not toml").expect("write bad config");

    let err = Config::load_from_path(&config_path).expect_err("parse should fail");
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn pricing_tables_are_read_from_toml() {
    let config: Config = toml::from_str(
        r#"
model = "local-llama"

[[pricing]]
model = "local-llama"
input_per_million = 0.0
output_per_million = 0.0
"#,
    )
    .expect("config should parse");

    assert_eq!(
        config.pricing,
        vec![PricingEntry {
            model: "local-llama".to_string(),
            input_per_million: 0.0,
            output_per_million: 0.0,
        }]
    );
    assert!(config.pricing_table().get(config.effective_model()).is_some());
}

#[test]
fn setting_pricing_twice_replaces_the_entry() {
    let mut config = Config::default();
    config
        .set_value("pricing", &words(&["GPT-4o", "2.5", "10"]))
        .expect("first");
    config
        .set_value("pricing", &words(&["gpt-4o", "3", "12"]))
        .expect("second");
    assert_eq!(config.pricing.len(), 1);
    assert_eq!(config.pricing[0].input_per_million, 3.0);

    config
        .unset_value("pricing", Some("gpt-4o"))
        .expect("unset pricing");
    assert!(config.pricing.is_empty());
}

#[test]
fn invalid_values_are_rejected() {
    let mut config = Config::default();
    assert!(matches!(
        config.set_value("currency", &words(&["PLN", "-1"])),
        Err(ConfigKeyError::InvalidValue { key: "currency", .. })
    ));
    assert!(matches!(
        config.set_value("base-url", &words(&["api.example.com"])),
        Err(ConfigKeyError::InvalidValue { key: "base-url", .. })
    ));
    let too_long = "x".repeat(1001);
    assert!(matches!(
        config.set_value("personality", &[too_long]),
        Err(ConfigKeyError::InvalidValue {
            key: "personality",
            ..
        })
    ));
    assert!(matches!(
        config.set_value("theme", &words(&["dark"])),
        Err(ConfigKeyError::UnknownKey(_))
    ));
    assert_eq!(config, Config::default());
}

#[test]
fn unusable_currency_rate_in_file_falls_back_to_default() {
    for raw in ["nan", "-1.0", "inf"] {
        let config: Config =
            toml::from_str(&format!("currency_code = \"EUR\"\ncurrency_rate = {raw}\n"))
                .expect("parse config");
        let currency = config.display_currency();
        assert_eq!(currency.code, "EUR");
        assert_eq!(currency.rate, 3.97, "rate from {raw}");
    }

    let config: Config = toml::from_str("currency_rate = 0.92\n").expect("parse config");
    assert_eq!(config.display_currency().rate, 0.92);
}

#[test]
fn base_url_trailing_slash_is_dropped() {
    let mut config = Config::default();
    config
        .set_value("base-url", &words(&["http://localhost:8080/v1/"]))
        .expect("set base-url");
    assert_eq!(config.effective_base_url(), "http://localhost:8080/v1");
}

#[test]
fn render_all_lists_every_key() {
    let mut config = Config::default();
    config
        .set_value("personality", &words(&["Be", "terse."]))
        .expect("set personality");
    let rendered = config.render_all();
    assert!(rendered.contains("model: (unset)"));
    assert!(rendered.contains("    Be terse."));
    assert!(rendered.contains("pricing: (built-in only)"));
}

