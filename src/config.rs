//! Run configuration.
//!
//! The optional config file carries the taxonomy and non-secret model
//! settings. Model settings resolve in priority order:
//! 1. CLI flags (`--provider`, `--endpoint`, `--api-key`, `--model`)
//! 2. the config file
//! 3. `FTAG_*` environment variables
//! 4. the provider's default model (model only)
//!
//! The credential is never read from the config file.
use crate::model::{ModelConfig, Provider, RetryPolicy};
use crate::taxonomy;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: u32 = 1;
const CONFIG_DIR_NAME: &str = "feedback-tagger";
const CONFIG_FILE_NAME: &str = "config.json";

pub const ENV_PROVIDER: &str = "FTAG_PROVIDER";
pub const ENV_ENDPOINT: &str = "FTAG_ENDPOINT";
pub const ENV_API_KEY: &str = "FTAG_API_KEY";
pub const ENV_MODEL: &str = "FTAG_MODEL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaggerConfig {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default = "taxonomy::default_labels")]
    pub labels: Vec<String>,
    #[serde(default = "taxonomy::default_descriptions")]
    pub descriptions: Vec<String>,
    #[serde(default = "default_feedback_column")]
    pub feedback_column: String,
    #[serde(default = "default_result_column")]
    pub result_column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryOverride>,
}

/// Partial override of the provider's default retry policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_backoff_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// Model settings given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ModelOverrides {
    pub provider: Option<Provider>,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
}

fn default_feedback_column() -> String {
    taxonomy::FEEDBACK_COLUMN.to_string()
}

fn default_result_column() -> String {
    taxonomy::RESULT_COLUMN.to_string()
}

/// Built-in configuration used when no config file is found.
pub fn default_config() -> TaggerConfig {
    TaggerConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        provider: None,
        endpoint: None,
        model: None,
        labels: taxonomy::default_labels(),
        descriptions: taxonomy::default_descriptions(),
        feedback_column: default_feedback_column(),
        result_column: default_result_column(),
        retry: None,
    }
}

/// Per-user config location, e.g. `~/.config/feedback-tagger/config.json`.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

pub fn load_config(path: &Path) -> Result<TaggerConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: TaggerConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    validate_config(&config).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

/// Load the explicit config, else the per-user config if present, else defaults.
pub fn load_effective_config(explicit: Option<&Path>) -> Result<(TaggerConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        return Ok((load_config(path)?, Some(path.to_path_buf())));
    }
    match user_config_path().filter(|path| path.is_file()) {
        Some(path) => Ok((load_config(&path)?, Some(path))),
        None => Ok((default_config(), None)),
    }
}

pub fn validate_config(config: &TaggerConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    if config.labels.is_empty() {
        return Err(anyhow!("labels must contain at least one entry"));
    }
    let mut seen = HashSet::new();
    for label in &config.labels {
        if label.trim().is_empty() {
            return Err(anyhow!("labels must be non-empty strings"));
        }
        if !seen.insert(label.to_lowercase()) {
            return Err(anyhow!("duplicate label {label:?}"));
        }
        if taxonomy::is_sentinel(label) {
            return Err(anyhow!("label {label:?} is reserved for per-row outcomes"));
        }
    }
    if config.feedback_column.trim().is_empty() {
        return Err(anyhow!("feedback_column must be non-empty"));
    }
    if config.result_column.trim().is_empty() {
        return Err(anyhow!("result_column must be non-empty"));
    }
    if config.feedback_column == config.result_column {
        return Err(anyhow!(
            "result_column must differ from feedback_column ({:?})",
            config.feedback_column
        ));
    }
    if let Some(retry) = &config.retry {
        if retry.max_attempts == Some(0) {
            return Err(anyhow!("retry.max_attempts must be at least 1"));
        }
    }
    Ok(())
}

/// Resolve the model call settings, failing if any required one is missing.
pub fn resolve_model_config(
    config: &TaggerConfig,
    overrides: &ModelOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ModelConfig> {
    let env = |name: &str| non_empty(env(name));

    let provider = match overrides.provider.or(config.provider) {
        Some(provider) => Some(provider),
        None => env(ENV_PROVIDER)
            .map(|raw| raw.parse::<Provider>())
            .transpose()
            .map_err(|err| anyhow!("{ENV_PROVIDER}: {err}"))?,
    };
    let endpoint = non_empty(overrides.endpoint.clone())
        .or_else(|| non_empty(config.endpoint.clone()))
        .or_else(|| env(ENV_ENDPOINT));
    let api_key = non_empty(overrides.api_key.clone()).or_else(|| env(ENV_API_KEY));

    let mut missing = Vec::new();
    if provider.is_none() {
        missing.push(format!("provider (--provider or {ENV_PROVIDER})"));
    }
    if endpoint.is_none() {
        missing.push(format!("endpoint (--endpoint or {ENV_ENDPOINT})"));
    }
    if api_key.is_none() {
        missing.push(format!("api key (--api-key or {ENV_API_KEY})"));
    }
    let (Some(provider), Some(endpoint), Some(api_key)) = (provider, endpoint, api_key) else {
        return Err(anyhow!(
            "missing model configuration: {}",
            missing.join(", ")
        ));
    };

    let model = non_empty(overrides.model.clone())
        .or_else(|| non_empty(config.model.clone()))
        .or_else(|| env(ENV_MODEL))
        .unwrap_or_else(|| provider.default_model().to_string());

    Ok(ModelConfig {
        provider,
        endpoint,
        api_key,
        model,
        retry: retry_policy(provider, config.retry.as_ref()),
    })
}

/// Provider default policy with any configured fields laid over it.
pub fn retry_policy(provider: Provider, retry: Option<&RetryOverride>) -> RetryPolicy {
    let mut policy = provider.default_retry_policy();
    if let Some(retry) = retry {
        if let Some(max_attempts) = retry.max_attempts {
            policy.max_attempts = max_attempts;
        }
        if let Some(ms) = retry.initial_backoff_ms {
            policy.initial_backoff = Duration::from_millis(ms);
        }
        if let Some(ms) = retry.timeout_ms {
            policy.timeout = Some(Duration::from_millis(ms));
        }
    }
    policy
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
