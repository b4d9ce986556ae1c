//! Backend endpoint configuration: defaults, then `assistant.toml`, then
//! environment overrides.

use std::{collections::HashMap, fs};

use url::Url;

#[derive(Debug, Clone)]
pub struct Settings {
    pub backend_url: String,
    pub request_timeout_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:8000".into(),
            request_timeout_seconds: 30,
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("assistant.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            apply_overrides(&mut settings, &file_cfg);
        }
    }

    if let Ok(v) = std::env::var("BACKEND_URL") {
        settings.backend_url = v;
    }
    if let Ok(v) = std::env::var("APP__BACKEND_URL") {
        settings.backend_url = v;
    }
    if let Ok(v) = std::env::var("APP__REQUEST_TIMEOUT_SECONDS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_seconds = parsed;
        }
    }

    settings
}

fn apply_overrides(settings: &mut Settings, overrides: &HashMap<String, String>) {
    if let Some(v) = overrides.get("backend_url") {
        settings.backend_url = v.clone();
    }
    if let Some(v) = overrides.get("request_timeout_seconds") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_seconds = parsed;
        }
    }
}

pub fn validate_backend_url(raw: &str) -> Result<(), String> {
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(url) => Err(format!("unsupported scheme '{}' in backend url", url.scheme())),
        Err(err) => Err(format!("invalid backend url: {err}")),
    }
}
