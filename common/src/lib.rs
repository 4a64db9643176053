/*!
common/src/lib.rs

Shared configuration types and secret handling for taxcat.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader merging a default config file with an optional override
- Resolution of the required service secrets from the environment
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const DEFAULT_AZURE_ENDPOINT: &str = "https://westus.api.cognitive.microsoft.com";
pub const DEFAULT_AZURE_PATH: &str = "/text/analytics/v2.1/entities";
pub const DEFAULT_AZURE_KEY_ENV: &str = "AZURE_ACCESS_KEY";

pub const DEFAULT_WATSON_ENDPOINT: &str = "https://gateway.watsonplatform.net";
pub const DEFAULT_WATSON_PATH: &str = "/natural-language-understanding/api/v1/analyze";
pub const DEFAULT_WATSON_VERSION: &str = "2018-11-16";
pub const DEFAULT_WATSON_KEY_ENV: &str = "WATSON_ACCESS_KEY";

pub const DEFAULT_WP_PASSWORD_ENV: &str = "WP_APPLICATION_PASSWORD";
pub const DEFAULT_RESULTS_PATH: &str = "results.txt";

/// Organization/Person extractor section (`[azure]`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AzureConfig {
    /// Scheme + host, e.g. "https://westus.api.cognitive.microsoft.com"
    pub endpoint: Option<String>,
    pub path: Option<String>,
    /// Name of the environment variable holding the subscription key
    pub api_key_env: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl AzureConfig {
    pub fn url(&self) -> String {
        join_url(
            self.endpoint.as_deref().unwrap_or(DEFAULT_AZURE_ENDPOINT),
            self.path.as_deref().unwrap_or(DEFAULT_AZURE_PATH),
        )
    }

    pub fn key_env(&self) -> &str {
        self.api_key_env.as_deref().unwrap_or(DEFAULT_AZURE_KEY_ENV)
    }
}

/// General entity/concept extractor section (`[watson]`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatsonConfig {
    pub endpoint: Option<String>,
    pub path: Option<String>,
    /// API version date sent as the `version` query parameter
    pub version: Option<String>,
    pub api_key_env: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl WatsonConfig {
    pub fn url(&self) -> String {
        join_url(
            self.endpoint.as_deref().unwrap_or(DEFAULT_WATSON_ENDPOINT),
            self.path.as_deref().unwrap_or(DEFAULT_WATSON_PATH),
        )
    }

    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or(DEFAULT_WATSON_VERSION)
    }

    pub fn key_env(&self) -> &str {
        self.api_key_env.as_deref().unwrap_or(DEFAULT_WATSON_KEY_ENV)
    }
}

/// Settings for driving the `wp` command line binary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WpCliConfig {
    /// Executable to run (defaults to `wp` on PATH)
    pub binary: Option<String>,
    /// WordPress install directory, forwarded as `--path=`
    pub wordpress_path: Option<String>,
}

/// Settings for the WordPress REST API adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestHostConfig {
    /// Site root, e.g. "https://blog.example.com"
    pub base_url: String,
    pub username: String,
    /// Environment variable holding the application password
    pub password_env: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl RestHostConfig {
    pub fn password_env(&self) -> &str {
        self.password_env.as_deref().unwrap_or(DEFAULT_WP_PASSWORD_ENV)
    }
}

/// Host platform section (`[host]`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostConfig {
    pub adapter: Option<String>, // "wp-cli", "rest"
    pub wp_cli: Option<WpCliConfig>,
    pub rest: Option<RestHostConfig>,
}

/// Report output section (`[report]`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    pub results_path: Option<String>,
}

impl ReportConfig {
    pub fn results_path(&self) -> &str {
        self.results_path.as_deref().unwrap_or(DEFAULT_RESULTS_PATH)
    }
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub azure: AzureConfig,
    #[serde(default)]
    pub watson: WatsonConfig,
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

impl Config {
    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence). Missing files are
    /// skipped, so running with neither yields the built-in defaults.
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for path in [default_path, override_path].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse configuration: {}", path.display()))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

fn join_url(endpoint: &str, path: &str) -> String {
    format!("{}/{}", endpoint.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// A required secret was absent, empty or whitespace-only.
#[derive(Debug, thiserror::Error)]
#[error("required secret `{0}` is missing or empty")]
pub struct MissingSecret(pub String);

/// Look up `name` and reject absent or blank values.
pub fn require_secret<F>(lookup: &F, name: &str) -> std::result::Result<String, MissingSecret>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(MissingSecret(name.to_string())),
    }
}

/// API keys for both text-analysis services, validated once at startup.
#[derive(Clone)]
pub struct Secrets {
    pub azure_key: String,
    pub watson_key: String,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("azure_key", &"<redacted>")
            .field("watson_key", &"<redacted>")
            .finish()
    }
}

impl Secrets {
    /// Read both keys from the process environment.
    pub fn from_env(config: &Config) -> std::result::Result<Self, MissingSecret> {
        Self::resolve(config, &|name: &str| std::env::var(name).ok())
    }

    /// Read both keys through `lookup`. The Azure key is checked first.
    pub fn resolve<F>(config: &Config, lookup: &F) -> std::result::Result<Self, MissingSecret>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            azure_key: require_secret(lookup, config.azure.key_env())?,
            watson_key: require_secret(lookup, config.watson.key_env())?,
        })
    }
}
