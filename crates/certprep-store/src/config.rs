//! Configuration and repository factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use certprep_core::traits::AttemptRepository;

use crate::json::JsonFileAttemptStore;
use crate::memory::InMemoryAttemptStore;
use crate::retry::RetryingRepository;

/// Where completed attempts are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Lost when the process exits.
    Memory,
    Json {
        #[serde(default = "default_store_path")]
        path: PathBuf,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Json {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./certprep-data/attempts.json")
}

/// Top-level certprep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertprepConfig {
    /// User ID recorded on attempts. `${VAR}` references are expanded.
    #[serde(default = "default_user")]
    pub user: String,
    /// Directory searched for question banks.
    #[serde(default = "default_bank_dir")]
    pub bank_dir: PathBuf,
    #[serde(default)]
    pub store: StoreConfig,
    /// Retries for transient save failures.
    #[serde(default = "default_save_retries")]
    pub save_retries: u32,
    /// Initial delay between save retries in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

fn default_user() -> String {
    "${USER}".to_string()
}
fn default_bank_dir() -> PathBuf {
    PathBuf::from("./question-banks")
}
fn default_save_retries() -> u32 {
    2
}
fn default_retry_delay() -> u64 {
    250
}

const ANONYMOUS_USER: &str = "anonymous";

impl Default for CertprepConfig {
    fn default() -> Self {
        Self {
            user: default_user(),
            bank_dir: default_bank_dir(),
            store: StoreConfig::default(),
            save_retries: default_save_retries(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not expanded again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut from = 0;
    while let Some(offset) = result[from..].find("${") {
        let start = from + offset;
        let Some(len) = result[start..].find('}') else {
            break;
        };
        let value = std::env::var(&result[start + 2..start + len]).unwrap_or_default();
        result.replace_range(start..start + len + 1, &value);
        from = start + value.len();
    }
    result
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order without an explicit path:
/// 1. `certprep.toml` in the current directory
/// 2. `~/.config/certprep/config.toml`
///
/// Environment variable overrides: `CERTPREP_USER`, `CERTPREP_STORE_PATH`.
pub fn load_config_from(path: Option<&Path>) -> Result<CertprepConfig> {
    let config_path = match path {
        Some(p) => {
            anyhow::ensure!(p.exists(), "config file not found: {}", p.display());
            Some(p.to_path_buf())
        }
        None => {
            let local = PathBuf::from("certprep.toml");
            if local.exists() {
                Some(local)
            } else {
                config_dir()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<CertprepConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            config
        }
        None => CertprepConfig::default(),
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

fn apply_env_overrides(config: &mut CertprepConfig) {
    if let Ok(user) = std::env::var("CERTPREP_USER") {
        config.user = user;
    }
    if let Ok(path) = std::env::var("CERTPREP_STORE_PATH") {
        config.store = StoreConfig::Json {
            path: PathBuf::from(path),
        };
    }

    config.user = resolve_env_vars(&config.user).trim().to_string();
    if config.user.is_empty() {
        config.user = ANONYMOUS_USER.to_string();
    }
    if let StoreConfig::Json { path } = &mut config.store {
        *path = PathBuf::from(resolve_env_vars(&path.to_string_lossy()));
    }
}

fn config_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("certprep"))
}

/// Create the repository a store configuration describes.
pub fn create_repository(config: &StoreConfig) -> Arc<dyn AttemptRepository> {
    match config {
        StoreConfig::Memory => Arc::new(InMemoryAttemptStore::new()),
        StoreConfig::Json { path } => Arc::new(JsonFileAttemptStore::new(path.clone())),
    }
}

/// Create the configured repository, wrapped with save retries when enabled.
pub fn open_repository(config: &CertprepConfig) -> Arc<dyn AttemptRepository> {
    let repository = create_repository(&config.store);
    tracing::debug!("using {} attempt store", repository.name());
    if config.save_retries == 0 {
        return repository;
    }
    Arc::new(RetryingRepository::new(
        repository,
        config.save_retries,
        Duration::from_millis(config.retry_delay_ms),
    ))
}
