use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::Context;
use console_core::Credentials;
use shared::protocol::{AUTORELOAD_INTERVAL, POST_DISPATCH_REDIRECT_DELAY};

pub const DEFAULT_CONFIG_PATH: &str = "console.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub access_token: Option<String>,
    pub user_id: Option<String>,
    pub reload_interval_ms: u64,
    pub redirect_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".into(),
            access_token: None,
            user_id: None,
            reload_interval_ms: AUTORELOAD_INTERVAL.as_millis() as u64,
            redirect_delay_ms: POST_DISPATCH_REDIRECT_DELAY.as_millis() as u64,
        }
    }
}

impl Settings {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            access_token: self.access_token.clone(),
            user_id: self.user_id.clone(),
        }
    }

    pub fn reload_interval(&self) -> Duration {
        Duration::from_millis(self.reload_interval_ms)
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }
}

/// Defaults, then the TOML file (if any), then the process environment.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            let table = toml::from_str::<HashMap<String, toml::Value>>(&raw)
                .with_context(|| format!("invalid config file '{}'", path.display()))?;
            apply_file(&mut settings, &scalar_entries(table));
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()));
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

/// Keeps string and integer entries as text; other TOML types are ignored.
fn scalar_entries(table: HashMap<String, toml::Value>) -> HashMap<String, String> {
    table
        .into_iter()
        .filter_map(|(key, value)| match value {
            toml::Value::String(text) => Some((key, text)),
            toml::Value::Integer(number) => Some((key, number.to_string())),
            _ => None,
        })
        .collect()
}

fn apply_file(settings: &mut Settings, file_cfg: &HashMap<String, String>) {
    if let Some(v) = file_cfg.get("base_url") {
        settings.base_url = v.clone();
    }
    if let Some(v) = file_cfg.get("access_token") {
        settings.access_token = Some(v.clone());
    }
    if let Some(v) = file_cfg.get("user_id") {
        settings.user_id = Some(v.clone());
    }
    if let Some(parsed) = file_cfg.get("reload_interval_ms").and_then(|v| v.parse().ok()) {
        settings.reload_interval_ms = parsed;
    }
    if let Some(parsed) = file_cfg.get("redirect_delay_ms").and_then(|v| v.parse().ok()) {
        settings.redirect_delay_ms = parsed;
    }
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("CONSOLE_BASE_URL") {
        settings.base_url = v;
    }
    if let Some(v) = var("APP__BASE_URL") {
        settings.base_url = v;
    }

    if let Some(v) = var("CONSOLE_ACCESS_TOKEN") {
        settings.access_token = Some(v);
    }
    if let Some(v) = var("CONSOLE_USER_ID") {
        settings.user_id = Some(v);
    }

    if let Some(parsed) = var("APP__RELOAD_INTERVAL_MS").and_then(|v| v.parse().ok()) {
        settings.reload_interval_ms = parsed;
    }
    if let Some(parsed) = var("APP__REDIRECT_DELAY_MS").and_then(|v| v.parse().ok()) {
        settings.redirect_delay_ms = parsed;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
