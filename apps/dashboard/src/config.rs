use std::{collections::HashMap, fs, path::Path};

use anyhow::{bail, Context};
use shared::domain::TypeFilter;
use url::Url;

pub const CONFIG_FILE: &str = "dashboard.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub log_filter: String,
    pub default_library_type: TypeFilter,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".into(),
            log_filter: "info".into(),
            default_library_type: TypeFilter::All,
        }
    }
}

impl Settings {
    /// Parsed base URL of the intake backend. Only http(s) is accepted.
    pub fn server_url(&self) -> anyhow::Result<Url> {
        let url = Url::parse(self.server_url.trim())
            .with_context(|| format!("invalid server url '{}'", self.server_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("server url must start with http:// or https://: {url}");
        }
        Ok(url)
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();
    apply_file(&mut settings, Path::new(CONFIG_FILE));
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file(settings: &mut Settings, path: &Path) {
    let Ok(raw) = fs::read_to_string(path) else {
        return;
    };
    match toml::from_str::<HashMap<String, String>>(&raw) {
        Ok(file_cfg) => apply_table(settings, &file_cfg),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable config file")
        }
    }
}

fn apply_table(settings: &mut Settings, file_cfg: &HashMap<String, String>) {
    if let Some(v) = file_cfg.get("server_url") {
        settings.server_url = v.clone();
    }
    if let Some(v) = file_cfg.get("log_filter") {
        settings.log_filter = v.clone();
    }
    if let Some(v) = file_cfg.get("library_type") {
        if let Ok(parsed) = v.parse::<TypeFilter>() {
            settings.default_library_type = parsed;
        }
    }
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("DASHBOARD_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = var("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = var("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    if let Some(v) = var("APP__LIBRARY_TYPE") {
        if let Ok(parsed) = v.parse::<TypeFilter>() {
            settings.default_library_type = parsed;
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
