//! Configuration for Mindvane.

use secrecy::{ExposeSecret, SecretString};

use crate::error::ConfigError;

/// Main configuration for the crate.
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            database: DatabaseConfig::from_env()?,
            llm: LlmConfig::from_env()?,
        })
    }
}

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: SecretString,
    pub pool_size: usize,
}

impl DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = optional_env("DATABASE_URL")?.ok_or_else(|| ConfigError::MissingRequired {
            key: "DATABASE_URL".to_string(),
            hint: "Set DATABASE_URL to a PostgreSQL connection string".to_string(),
        })?;

        let pool_size = optional_env("DATABASE_POOL_SIZE")?
            .map(|s| s.parse())
            .transpose()
            .map_err(|e| ConfigError::InvalidValue {
                key: "DATABASE_POOL_SIZE".to_string(),
                message: format!("must be a positive integer: {e}"),
            })?
            .unwrap_or(10);

        Ok(Self {
            url: SecretString::from(url),
            pool_size,
        })
    }

    /// Get the database URL (exposes the secret).
    pub fn url(&self) -> &str {
        self.url.expose_secret()
    }
}

/// Per-tier text-generation configuration.
///
/// A tier left unconfigured is how "client unavailable" is represented;
/// everything downstream degrades to canned replies or keyword fallbacks.
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub fast: Option<TierConfig>,
    pub balanced: Option<TierConfig>,
    pub deep: Option<TierConfig>,
}

impl LlmConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            fast: TierConfig::from_env("FAST")?,
            balanced: TierConfig::from_env("BALANCED")?,
            deep: TierConfig::from_env("DEEP")?,
        })
    }
}

/// Connection settings for one generation tier.
#[derive(Debug, Clone)]
pub struct TierConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<SecretString>,
    pub max_tokens: Option<u32>,
}

impl TierConfig {
    /// Read one tier from `LLM_<TIER>_*` variables. The tier exists iff its
    /// model is set.
    fn from_env(tier: &str) -> Result<Option<Self>, ConfigError> {
        let Some(model) = optional_env(&format!("LLM_{tier}_MODEL"))? else {
            return Ok(None);
        };

        let base_url = optional_env(&format!("LLM_{tier}_BASE_URL"))?
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string());
        let api_key = optional_env(&format!("LLM_{tier}_API_KEY"))?.map(SecretString::from);
        let max_tokens = optional_env(&format!("LLM_{tier}_MAX_TOKENS"))?
            .map(|s| s.parse())
            .transpose()
            .map_err(|e| ConfigError::InvalidValue {
                key: format!("LLM_{tier}_MAX_TOKENS"),
                message: format!("must be a positive integer: {e}"),
            })?;

        Ok(Some(Self {
            base_url,
            model,
            api_key,
            max_tokens,
        }))
    }
}

/// Read an environment variable, treating empty values as unset.
fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}
