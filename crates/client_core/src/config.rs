use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use config::{Config, Environment, File};
use serde::{Deserialize, Deserializer, Serialize};
use shared::domain::Currency;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
/// Looked up in the working directory when no explicit config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "bankdash.toml";
pub const ENV_PREFIX: &str = "APP";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub api_base_url: String,
    pub session_path: PathBuf,
    pub request_timeout_secs: u64,
    #[serde(deserialize_with = "deserialize_currency")]
    pub currency: Currency,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            session_path: default_session_path(),
            request_timeout_secs: 30,
            currency: Currency::Inr,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("failed to render settings as toml")
    }
}

pub fn default_session_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bankdash")
        .join("session.json")
}

/// Defaults, then the config file, then `APP__*` environment variables.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let defaults = Settings::default();

    let mut builder = Config::builder()
        .set_default("api_base_url", defaults.api_base_url.clone())?
        .set_default(
            "session_path",
            defaults.session_path.to_string_lossy().into_owned(),
        )?
        .set_default("request_timeout_secs", defaults.request_timeout_secs)?
        .set_default("currency", defaults.currency.code())?
        .set_default("log_filter", defaults.log_filter.clone())?;

    builder = match config_path {
        Some(path) => builder.add_source(File::from(path).required(true)),
        None => builder.add_source(File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false)),
    };

    let mut settings: Settings = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("failed to assemble settings")?
        .try_deserialize()
        .context("invalid settings")?;

    settings.api_base_url = normalize_base_url(&settings.api_base_url)
        .with_context(|| format!("invalid api_base_url '{}'", settings.api_base_url))?;

    Ok(settings)
}

/// Trims the URL, adds `http://` when no scheme is given and drops trailing slashes
/// so request paths can be appended directly.
pub fn normalize_base_url(raw: &str) -> Result<String, url::ParseError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(DEFAULT_API_BASE_URL.to_string());
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    let parsed = Url::parse(&candidate)?;
    if parsed.cannot_be_a_base() {
        return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase);
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

fn deserialize_currency<'de, D>(deserializer: D) -> Result<Currency, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn adds_scheme_and_strips_trailing_slash() {
        assert_eq!(
            normalize_base_url("bank.example.com:8000/").expect("url"),
            "http://bank.example.com:8000"
        );
        assert_eq!(
            normalize_base_url(" https://api.bank.in/v1/ ").expect("url"),
            "https://api.bank.in/v1"
        );
    }

    #[test]
    fn empty_url_falls_back_to_default() {
        assert_eq!(normalize_base_url("  ").expect("url"), DEFAULT_API_BASE_URL);
    }

    #[test]
    fn rejects_garbage_url() {
        assert!(normalize_base_url("http://exa mple.com").is_err());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bankdash.toml");
        fs::write(
            &path,
            "api_base_url = \"api.bank.test/\"\ncurrency = \"eur\"\n",
        )
        .expect("write config");

        let settings = load_settings(Some(&path)).expect("load");
        assert_eq!(settings.api_base_url, "http://api.bank.test");
        assert_eq!(settings.currency, Currency::Eur);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(load_settings(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn environment_overrides_timeout() {
        std::env::set_var("APP__REQUEST_TIMEOUT_SECS", "7");
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bankdash.toml");
        fs::write(&path, "request_timeout_secs = 90\n").expect("write config");

        let settings = load_settings(Some(&path)).expect("load");
        std::env::remove_var("APP__REQUEST_TIMEOUT_SECS");
        assert_eq!(settings.request_timeout_secs, 7);
    }

    #[test]
    fn settings_render_as_toml() {
        let rendered = Settings::default().to_toml().expect("toml");
        assert!(rendered.contains("api_base_url = \"http://localhost:8000\""));
        assert!(rendered.contains("currency = \"INR\""));
    }
}
