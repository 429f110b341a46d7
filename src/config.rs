//! Configuration management for sitetaxon
//!
//! Configuration is loaded from `./config/sitetaxon.toml`. Every scoring
//! threshold used by the pipeline is a config value; the shipped template and
//! the `Default` impls below carry the same numbers.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::taxonomy::BUCKET_CAP_RANGE;

/// Configuration file path relative to working directory
pub const CONFIG_PATH: &str = "./config/sitetaxon.toml";

/// Default configuration file content
pub const DEFAULT_CONFIG: &str = include_str!("../config/sitetaxon.toml");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found at {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Configuration field '{field}' is out of range: {value} (expected {expected})")]
    OutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Invalid URL in '{field}': {url}")]
    InvalidUrl { field: String, url: String },

    #[error("Configuration field '{field}' cannot be empty")]
    EmptyRequired { field: String },
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,
    #[serde(default)]
    pub keywords: KeywordsConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

/// Activity scoring weights
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifierConfig {
    pub keyword_weight: f64,
    pub navigation_weight: f64,
    pub headline_weight: f64,
    /// confidence = min(score / normalization_divisor, 1.0)
    pub normalization_divisor: f64,
    pub max_activities: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            keyword_weight: 2.0,
            navigation_weight: 10.0,
            headline_weight: 8.0,
            normalization_divisor: 20.0,
            max_activities: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    pub high_confidence: f64,
    pub medium_confidence: f64,
    pub fallback_category: String,
    pub fallback_subcategory: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            high_confidence: 0.7,
            medium_confidence: 0.4,
            fallback_category: "Business Services".to_string(),
            fallback_subcategory: "General".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub enabled: bool,
    pub base_url: String,
    #[serde(default = "default_registry_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_registry_timeout_ms() -> u64 {
    5000
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://localhost:8080".to_string(),
            timeout_ms: default_registry_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaxonomyConfig {
    /// Dataset replacing the embedded taxonomy
    #[serde(default)]
    pub dataset_path: Option<PathBuf>,
    /// File the store is saved to after expansions, and preferred on load if it exists
    #[serde(default)]
    pub persist_path: Option<PathBuf>,
    pub bucket_cap: usize,
    pub max_merge_per_expansion: usize,
    pub max_reported_additions: usize,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            dataset_path: None,
            persist_path: None,
            bucket_cap: 15,
            max_merge_per_expansion: 5,
            max_reported_additions: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeywordsConfig {
    pub max_per_category: usize,
    pub max_content_hints: usize,
}

impl Default for KeywordsConfig {
    fn default() -> Self {
        Self {
            max_per_category: 30,
            max_content_hints: 10,
        }
    }
}

/// Thresholds for the summary scores
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoringConfig {
    pub business_high: f64,
    pub business_medium: f64,
    pub excellent_total: usize,
    pub excellent_categories: usize,
    pub good_total: usize,
    pub good_categories: usize,
    pub fair_total: usize,
    pub fair_categories: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            business_high: 0.7,
            business_medium: 0.4,
            excellent_total: 80,
            excellent_categories: 6,
            good_total: 50,
            good_categories: 5,
            fair_total: 25,
            fair_categories: 4,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(Path::new(CONFIG_PATH))
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.classifier;
        check_positive("classifier.keyword_weight", c.keyword_weight)?;
        check_positive("classifier.navigation_weight", c.navigation_weight)?;
        check_positive("classifier.headline_weight", c.headline_weight)?;
        check_positive("classifier.normalization_divisor", c.normalization_divisor)?;
        if c.max_activities == 0 {
            return Err(out_of_range("classifier.max_activities", 0, ">= 1"));
        }

        let r = &self.resolver;
        check_unit("resolver.high_confidence", r.high_confidence)?;
        check_unit("resolver.medium_confidence", r.medium_confidence)?;
        if r.medium_confidence > r.high_confidence {
            return Err(out_of_range(
                "resolver.medium_confidence",
                r.medium_confidence,
                "<= resolver.high_confidence",
            ));
        }
        check_not_empty("resolver.fallback_category", &r.fallback_category)?;
        check_not_empty("resolver.fallback_subcategory", &r.fallback_subcategory)?;

        if self.registry.enabled {
            let url = &self.registry.base_url;
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl {
                    field: "registry.base_url".to_string(),
                    url: url.clone(),
                });
            }
            if self.registry.timeout_ms == 0 {
                return Err(out_of_range("registry.timeout_ms", 0, ">= 1"));
            }
        }

        let t = &self.taxonomy;
        if !BUCKET_CAP_RANGE.contains(&t.bucket_cap) {
            return Err(out_of_range(
                "taxonomy.bucket_cap",
                t.bucket_cap,
                &format!("{}-{}", BUCKET_CAP_RANGE.start(), BUCKET_CAP_RANGE.end()),
            ));
        }

        if self.keywords.max_per_category == 0 {
            return Err(out_of_range("keywords.max_per_category", 0, ">= 1"));
        }

        let s = &self.scoring;
        check_unit("scoring.business_high", s.business_high)?;
        check_unit("scoring.business_medium", s.business_medium)?;
        if s.business_medium > s.business_high {
            return Err(out_of_range("scoring.business_medium", s.business_medium, "<= scoring.business_high"));
        }
        if !(s.excellent_total >= s.good_total && s.good_total >= s.fair_total) {
            return Err(out_of_range(
                "scoring.good_total",
                s.good_total,
                "excellent_total >= good_total >= fair_total",
            ));
        }

        Ok(())
    }

    pub fn registry_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.registry.timeout_ms)
    }

    /// Create default configuration file at the standard location
    pub fn create_default_config() -> Result<PathBuf, ConfigError> {
        let path = Path::new(CONFIG_PATH);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::File::create(path)?;
        file.write_all(DEFAULT_CONFIG.as_bytes())?;

        Ok(path.to_path_buf())
    }

    /// Check if stdin is a TTY (interactive terminal)
    pub fn is_interactive() -> bool {
        io::stdin().is_terminal()
    }

    /// Prompt user to create default config (only in interactive mode)
    pub fn prompt_create_config() -> Result<Option<PathBuf>, ConfigError> {
        if !Self::is_interactive() {
            return Ok(None);
        }

        print!("Configuration file not found. Create default config? [Y/n] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim().to_lowercase();

        if input.is_empty() || input == "y" || input == "yes" {
            let path = Self::create_default_config()?;
            Ok(Some(path))
        } else {
            Ok(None)
        }
    }
}

fn out_of_range(field: &str, value: impl ToString, expected: &str) -> ConfigError {
    ConfigError::OutOfRange {
        field: field.to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    }
}

fn check_positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(out_of_range(field, value, "> 0"))
    }
}

fn check_unit(field: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(out_of_range(field, value, "0.0-1.0"))
    }
}

fn check_not_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::EmptyRequired {
            field: field.to_string(),
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config: Result<AppConfig, _> = toml::from_str(DEFAULT_CONFIG);
        assert!(config.is_ok(), "Default config should parse: {:?}", config.err());
    }

    #[test]
    fn test_default_config_validates() {
        let config: AppConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert!(config.validate().is_ok(), "Default config should validate");
    }

    #[test]
    fn test_template_matches_default_impls() {
        let parsed: AppConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        let defaults = AppConfig::default();
        assert_eq!(parsed.classifier.navigation_weight, defaults.classifier.navigation_weight);
        assert_eq!(parsed.resolver.high_confidence, defaults.resolver.high_confidence);
        assert_eq!(parsed.taxonomy.bucket_cap, defaults.taxonomy.bucket_cap);
        assert_eq!(parsed.scoring.excellent_total, defaults.scoring.excellent_total);
        assert_eq!(parsed.keywords.max_per_category, defaults.keywords.max_per_category);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: AppConfig = toml::from_str("[registry]\nenabled = true\nbase_url = \"https://registry.test\"\n").unwrap();
        assert!(config.registry.enabled);
        assert_eq!(config.registry.timeout_ms, 5000);
        assert_eq!(config.classifier.max_activities, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bucket_cap_out_of_range_rejected() {
        let mut config = AppConfig::default();
        config.taxonomy.bucket_cap = 50;
        assert!(matches!(config.validate(), Err(ConfigError::OutOfRange { .. })));
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let mut config = AppConfig::default();
        config.resolver.medium_confidence = 0.9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_registry_url_validated_only_when_enabled() {
        let mut config = AppConfig::default();
        config.registry.base_url = "ftp://nowhere".to_string();
        assert!(config.validate().is_ok());
        config.registry.enabled = true;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn test_load_from_missing_path() {
        let result = AppConfig::load_from_path(Path::new("/nonexistent/sitetaxon.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
