//! Configuration commands for managing shopdesk settings.
//!
//! - `config show`: Display current configuration
//! - `config get`: Read one value
//! - `config set`: Set a configuration value

use owo_colors::OwoColorize;
use serde_json::json;

use super::CommandOutput;
use crate::config::{Config, VALID_KEYS};
use crate::error::{Result, ShopdeskError};

/// Keys whose values are never printed in full
const SENSITIVE_KEYS: &[&str] = &["auth.token"];

/// Mask a sensitive value by showing only the first 2 and last 2 characters
fn mask_sensitive_value(value: &str) -> String {
    let char_count = value.chars().count();
    if char_count > 4 {
        let first: String = value.chars().take(2).collect();
        let last: String = value.chars().skip(char_count - 2).collect();
        format!("{first}...{last}")
    } else {
        "****".to_string()
    }
}

/// Reject underscore-for-dot typos such as `api_base_url`.
fn validate_config_key(key: &str) -> Result<&str> {
    if key.contains('.') || matches!(key, "remote_timeout" | "page_size" | "fetch_limit" | "delete_policy") {
        return Ok(key);
    }

    if let Some(pos) = key.find('_') {
        let dot_version = format!("{}.{}", &key[..pos], &key[pos + 1..]);
        return Err(ShopdeskError::Config(format!(
            "invalid config key '{key}'. Use dot notation: '{dot_version}'"
        )));
    }
    Err(ShopdeskError::Config(format!(
        "unknown config key '{key}'. Valid keys: {VALID_KEYS}"
    )))
}

/// Show current configuration
pub fn cmd_config_show(json: bool) -> Result<()> {
    let config = Config::load()?;
    let token_configured = config.token().is_some();

    let resources_json: serde_json::Map<String, serde_json::Value> = config
        .resources
        .iter()
        .map(|(name, resource)| -> Result<(String, serde_json::Value)> {
            Ok((name.clone(), serde_json::to_value(resource)?))
        })
        .collect::<Result<_>>()?;

    let json_output = json!({
        "api": { "base_url": config.api.base_url },
        "auth": { "token_configured": token_configured },
        "remote_timeout": config.remote_timeout,
        "page_size": config.page_size,
        "fetch_limit": config.fetch_limit,
        "delete_policy": config.delete_policy.to_string(),
        "resources": resources_json,
        "config_file": Config::config_path().to_string_lossy(),
    });

    let mut text_output = String::new();
    text_output.push_str(&format!("{}\n\n", "Configuration:".cyan().bold()));

    match &config.api.base_url {
        Some(url) => text_output.push_str(&format!("{}: {url}\n", "api.base_url".cyan())),
        None => text_output.push_str(&format!(
            "{}: {}\n",
            "api.base_url".cyan(),
            "not configured".dimmed()
        )),
    }

    // Never show the token itself
    let token_status = if token_configured {
        "configured".green().to_string()
    } else {
        "not configured".dimmed().to_string()
    };
    text_output.push_str(&format!("{}: {token_status}\n", "auth.token".cyan()));

    text_output.push_str(&format!(
        "{}: {}s\n",
        "remote_timeout".cyan(),
        config.remote_timeout
    ));
    text_output.push_str(&format!("{}: {}\n", "page_size".cyan(), config.page_size));
    text_output.push_str(&format!("{}: {}\n", "fetch_limit".cyan(), config.fetch_limit));
    text_output.push_str(&format!(
        "{}: {}\n",
        "delete_policy".cyan(),
        config.delete_policy
    ));

    if !config.resources.is_empty() {
        text_output.push_str(&format!("\n{}:\n", "resources".cyan()));
        for (name, resource) in &config.resources {
            text_output.push_str(&format!(
                "  {name}: /{} ({}, id: {})\n",
                resource.path.trim_start_matches('/'),
                resource.strategy,
                resource.id_field
            ));
        }
    }

    text_output.push('\n');
    text_output.push_str(&format!(
        "{}",
        format!("Config file: {}", Config::config_path().display()).dimmed()
    ));

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(json)
}

/// Set a configuration value
pub fn cmd_config_set(key: &str, value: &str, json: bool) -> Result<()> {
    validate_config_key(key)?;

    let mut config = Config::load()?;
    config.set_value(key, value)?;
    config.save()?;

    let sensitive = SENSITIVE_KEYS.contains(&key);
    let json_output = if sensitive {
        json!({ "action": "config_set", "key": key, "success": true })
    } else {
        json!({ "action": "config_set", "key": key, "value": value, "success": true })
    };
    let text_output = if sensitive {
        format!("Set {}", key.cyan())
    } else {
        format!("Set {} to {}", key.cyan(), value)
    };

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(json)
}

/// Get a specific configuration value
pub fn cmd_config_get(key: &str, json: bool) -> Result<()> {
    validate_config_key(key)?;

    let config = Config::load()?;
    let value = config.get_value(key)?;
    let sensitive = SENSITIVE_KEYS.contains(&key);

    let (json_output, text_output) = match value {
        Some(value) if sensitive => {
            let masked = mask_sensitive_value(&value);
            let json = json!({
                "key": key,
                "value": masked,
                "configured": true,
                "masked": true,
            });
            let text = format!("{masked} (masked - showing first 2 and last 2 characters)");
            (json, text)
        }
        Some(value) => {
            let text = value.clone();
            (json!({ "key": key, "value": value, "configured": true }), text)
        }
        None => (
            json!({ "key": key, "value": null, "configured": false }),
            format!("{}", "not configured".dimmed()),
        ),
    };

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(json)
}
