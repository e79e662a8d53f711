//! Configuration for the glysearch pipeline.
//!
//! Settings are loaded from a TOML file under the user config directory and
//! then overridden from the environment: provider API keys come from the
//! provider-specific variable or the shared `LLM_API_KEY`, and the default
//! provider from `LLM_PROVIDER`.

use anyhow::{Context, Result, anyhow};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::cache::CacheConfig;
use crate::log_debug;
use crate::providers::{Provider, ProviderConfig, SHARED_API_KEY_ENV};

/// Environment variable selecting the default provider
pub const PROVIDER_ENV: &str = "LLM_PROVIDER";

/// Configuration structure for the glysearch application
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Config {
    /// Default LLM provider
    pub default_provider: String,
    /// Provider-specific configurations
    pub providers: HashMap<String, ProviderConfig>,
    /// Extraction retry-loop settings
    #[serde(default)]
    pub search: SearchConfig,
    /// Rate limiter settings
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Audit log settings
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Extraction retry-loop settings
#[derive(Deserialize, Serialize, Clone, Copy, Debug)]
pub struct SearchConfig {
    /// Output cap passed to the provider
    pub max_tokens: u32,
    /// Total provider attempts before giving up
    pub max_retries: u32,
    /// Per-call timeout on the provider, in seconds
    pub request_timeout_seconds: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            max_retries: 2,
            request_timeout_seconds: 30,
        }
    }
}

/// Rate limiter settings
#[derive(Deserialize, Serialize, Clone, Copy, Debug)]
pub struct RateLimitConfig {
    /// Admissions allowed per window
    pub max_requests: usize,
    /// Window length in seconds
    pub time_window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            time_window_seconds: 3600,
        }
    }
}

/// Audit log settings
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct AuditConfig {
    /// Whether to record calls in the audit database
    #[serde(default)]
    pub enabled: bool,
    /// Path of the audit database; defaults next to the config file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

impl Config {
    /// Load the configuration file (if any) and apply environment overrides
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        let mut config = if config_path.exists() {
            let config_content = fs::read_to_string(&config_path)?;
            toml::from_str(&config_content).with_context(|| {
                format!("Invalid configuration file at {}", config_path.display())
            })?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        log_debug!("Configuration loaded: provider={}", config.default_provider);
        Ok(config)
    }

    /// Save the configuration to the file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        let config_content = toml::to_string(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    /// Pull the default provider and API keys from the environment.
    ///
    /// A provider-specific variable wins over the shared `LLM_API_KEY`;
    /// neither overrides a key already present in the config file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(provider) = std::env::var(PROVIDER_ENV)
            && !provider.trim().is_empty()
        {
            self.default_provider = provider.trim().to_lowercase();
        }

        let shared_key = std::env::var(SHARED_API_KEY_ENV).ok();
        for provider in Provider::ALL {
            let entry = self
                .providers
                .entry(provider.name().to_string())
                .or_insert_with(|| ProviderConfig::with_defaults(*provider));
            if entry.has_api_key() {
                continue;
            }
            if let Ok(key) = std::env::var(provider.api_key_env()) {
                entry.api_key = key;
            } else if let Some(key) = &shared_key {
                entry.api_key.clone_from(key);
            }
        }
    }

    /// Get the configuration for a specific provider
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.providers
            .get(provider)
            .or_else(|| self.providers.get(&provider.to_lowercase()))
    }

    /// Update the configuration with new values
    pub fn update(
        &mut self,
        provider: Option<String>,
        api_key: Option<String>,
        model: Option<String>,
    ) -> Result<()> {
        if let Some(provider) = provider {
            let parsed: Provider = provider.parse()?;
            self.default_provider = parsed.name().to_string();
            self.providers
                .entry(parsed.name().to_string())
                .or_insert_with(|| ProviderConfig::with_defaults(parsed));
        }

        let provider_config = self
            .providers
            .get_mut(&self.default_provider)
            .context("Could not get default provider")?;

        if let Some(key) = api_key {
            provider_config.api_key = key;
        }
        if let Some(model) = model {
            provider_config.model = model;
        }

        Ok(())
    }

    /// Get the path to the configuration file
    fn get_config_path() -> Result<PathBuf> {
        let mut path =
            config_dir().ok_or_else(|| anyhow!("Unable to determine config directory"))?;
        path.push("glysearch");
        fs::create_dir_all(&path)?;
        path.push("config.toml");
        Ok(path)
    }

    /// Default path of the audit database, next to the config file
    pub fn default_audit_db_path() -> Result<PathBuf> {
        let mut path = Self::get_config_path()?;
        path.set_file_name("audit.db");
        Ok(path)
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut providers = HashMap::new();
        for provider in Provider::ALL {
            providers.insert(
                provider.name().to_string(),
                ProviderConfig::with_defaults(*provider),
            );
        }

        Self {
            default_provider: Provider::default().name().to_string(),
            providers,
            search: SearchConfig::default(),
            rate_limit: RateLimitConfig::default(),
            cache: CacheConfig::default(),
            audit: AuditConfig::default(),
        }
    }
}
