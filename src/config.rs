//! Top-level application configuration.
//!
//! Configuration is stored in `.shopdesk/config.yaml` and includes:
//! - The admin API base URL and bearer token
//! - Paging defaults and the delete reconciliation policy
//! - Per-resource settings (path, id field, search fields, columns)

use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShopdeskError};
use crate::list::mutation::DeletePolicy;
use crate::list::pagination::FetchStrategy;
use crate::paths::{format_relative_path, shopdesk_root};

/// Environment variable that overrides the configured token.
pub const TOKEN_ENV_VAR: &str = "SHOPDESK_TOKEN";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    /// Remote operation timeout in seconds (default: 30)
    #[serde(default = "default_remote_timeout")]
    pub remote_timeout: u64,

    /// Rows per page (default: 10)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Batch size for resources filtered entirely in memory (default: 500)
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: u32,

    #[serde(default)]
    pub delete_policy: DeletePolicy,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: BTreeMap<String, ResourceConfig>,
}

fn default_remote_timeout() -> u64 {
    30
}

fn default_page_size() -> u32 {
    10
}

fn default_fetch_limit() -> u32 {
    500
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            auth: AuthConfig::default(),
            remote_timeout: default_remote_timeout(),
            page_size: default_page_size(),
            fetch_limit: default_fetch_limit(),
            delete_policy: DeletePolicy::default(),
            resources: BTreeMap::new(),
        }
    }
}

/// API endpoint configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Authentication configuration
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// How a resource is paged and searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Fetch one page at a time from the server
    #[default]
    Server,
    /// Fetch a bounded batch once, then search and page in memory
    Client,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Server => write!(f, "server"),
            StrategyKind::Client => write!(f, "client"),
        }
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = ShopdeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "server" => Ok(StrategyKind::Server),
            "client" => Ok(StrategyKind::Client),
            _ => Err(ShopdeskError::Config(format!(
                "unknown strategy '{s}', expected 'server' or 'client'"
            ))),
        }
    }
}

/// Settings for one backend resource (vouchers, brands, orders, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Path below the API base URL
    pub path: String,

    #[serde(default = "default_id_field")]
    pub id_field: String,

    /// Fields matched by the search box; empty means all text fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_fields: Vec<String>,

    /// Columns shown by `list`; empty means inferred from the data
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,

    #[serde(default)]
    pub strategy: StrategyKind,

    /// Query parameter the backend reads the search term from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_param: Option<String>,
}

fn default_id_field() -> String {
    "id".to_string()
}

impl ResourceConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            id_field: default_id_field(),
            search_fields: Vec::new(),
            columns: Vec::new(),
            strategy: StrategyKind::default(),
            search_param: None,
        }
    }

    /// Resolve the paging strategy using the global batch size.
    pub fn fetch_strategy(&self, fetch_limit: u32) -> FetchStrategy {
        match self.strategy {
            StrategyKind::Server => FetchStrategy::ServerPaged {
                server_search: self.search_param.is_some(),
            },
            StrategyKind::Client => FetchStrategy::ClientSide {
                fetch_limit: fetch_limit.max(1),
            },
        }
    }

    /// Apply a `resources.<name>.<field>` setting.
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<()> {
        match field {
            "path" => {
                if value.trim_matches('/').is_empty() {
                    return Err(ShopdeskError::Config(
                        "resource path cannot be empty".to_string(),
                    ));
                }
                self.path = value.to_string();
            }
            "id_field" => self.id_field = value.to_string(),
            "search_fields" => self.search_fields = split_list(value),
            "columns" => self.columns = split_list(value),
            "strategy" => self.strategy = value.parse()?,
            "search_param" => {
                self.search_param = Some(value.to_string()).filter(|v| !v.is_empty());
            }
            _ => {
                return Err(ShopdeskError::Config(format!(
                    "unknown resource field '{field}'. Valid fields: path, id_field, search_fields, columns, strategy, search_param"
                )));
            }
        }
        Ok(())
    }

    /// Read a `resources.<name>.<field>` setting.
    pub fn get_field(&self, field: &str) -> Result<String> {
        let value = match field {
            "path" => self.path.clone(),
            "id_field" => self.id_field.clone(),
            "search_fields" => self.search_fields.join(","),
            "columns" => self.columns.join(","),
            "strategy" => self.strategy.to_string(),
            "search_param" => self.search_param.clone().unwrap_or_default(),
            _ => {
                return Err(ShopdeskError::Config(format!(
                    "unknown resource field '{field}'"
                )));
            }
        };
        Ok(value)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        shopdesk_root().join("config.yaml")
    }

    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            ShopdeskError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to read config at {}: {}",
                    format_relative_path(&path),
                    e
                ),
            ))
        })?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(&path, content).map_err(|e| {
            ShopdeskError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to write config at {}: {}",
                    format_relative_path(&path),
                    e
                ),
            ))
        })?;

        // Owner read/write only, the file may hold a token
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    /// Get the API token from the environment or the config file
    pub fn token(&self) -> Option<String> {
        if let Ok(token) = env::var(TOKEN_ENV_VAR)
            && !token.is_empty()
        {
            return Some(token);
        }

        self.auth.token.clone().filter(|t| !t.is_empty())
    }

    pub fn set_token(&mut self, token: String) {
        self.auth.token = Some(token);
    }

    pub fn base_url(&self) -> Result<String> {
        self.api
            .base_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                ShopdeskError::Config(
                    "api.base_url not configured. Run: shopdesk config set api.base_url <url>"
                        .to_string(),
                )
            })
    }

    /// Settings for `name`, falling back to a resource at path `name`.
    pub fn resource(&self, name: &str) -> Result<ResourceConfig> {
        if name.trim_matches('/').is_empty() {
            return Err(ShopdeskError::InvalidInput(
                "resource name cannot be empty".to_string(),
            ));
        }
        Ok(self
            .resources
            .get(name)
            .cloned()
            .unwrap_or_else(|| ResourceConfig::new(name)))
    }

    /// Get the remote operation timeout duration
    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout)
    }

    /// Apply a dotted `key = value` setting.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api.base_url" => {
                url::Url::parse(value)?;
                self.api.base_url = Some(value.to_string());
            }
            "auth.token" => self.set_token(value.to_string()),
            "remote_timeout" => self.remote_timeout = parse_number(key, value)?,
            "page_size" => self.page_size = parse_positive(key, value)?,
            "fetch_limit" => self.fetch_limit = parse_positive(key, value)?,
            "delete_policy" => self.delete_policy = value.parse()?,
            _ => {
                let (name, field) = split_resource_key(key)?;
                let mut resource = self.resource(name)?;
                resource.set_field(field, value)?;
                self.resources.insert(name.to_string(), resource);
            }
        }
        Ok(())
    }

    /// Read a dotted setting. Returns `None` for unset optional values.
    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "api.base_url" => self.api.base_url.clone(),
            "auth.token" => self.token(),
            "remote_timeout" => Some(self.remote_timeout.to_string()),
            "page_size" => Some(self.page_size.to_string()),
            "fetch_limit" => Some(self.fetch_limit.to_string()),
            "delete_policy" => Some(self.delete_policy.to_string()),
            _ => {
                let (name, field) = split_resource_key(key)?;
                match self.resources.get(name) {
                    Some(resource) => Some(resource.get_field(field)?),
                    None => None,
                }
            }
        };
        Ok(value)
    }
}

/// Keys accepted by `config set` and `config get`.
pub const VALID_KEYS: &str = "api.base_url, auth.token, remote_timeout, page_size, fetch_limit, delete_policy, resources.<name>.<field>";

fn split_resource_key(key: &str) -> Result<(&str, &str)> {
    let unknown = || {
        ShopdeskError::Config(format!(
            "unknown config key '{key}'. Valid keys: {VALID_KEYS}"
        ))
    };

    let rest = key.strip_prefix("resources.").ok_or_else(unknown)?;
    let (name, field) = rest.rsplit_once('.').ok_or_else(unknown)?;
    if name.is_empty() || field.is_empty() {
        return Err(unknown());
    }
    Ok((name, field))
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value.parse::<u64>().map_err(|_| {
        ShopdeskError::Config(format!(
            "invalid value '{value}' for {key}. Expected a whole number"
        ))
    })
}

fn parse_positive(key: &str, value: &str) -> Result<u32> {
    match value.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ShopdeskError::Config(format!(
            "invalid value '{value}' for {key}. Expected a positive number"
        ))),
    }
}
