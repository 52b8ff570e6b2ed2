//! Daemon configuration: TOML file, then environment, then command line.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use verifier_engine::DEFAULT_IGNORABLE_REVERTS;
use verifier_net::Url;

mod defaults {
    use std::path::PathBuf;

    pub fn poll_interval_ms() -> u64 { 5000 }
    pub fn request_timeout_ms() -> u64 { 30_000 }
    pub fn max_schema_bytes() -> usize { verifier_net::DEFAULT_MAX_DOCUMENT_BYTES }
    pub fn data_dir() -> PathBuf { "./verifier-data".into() }
    pub fn ignorable_reverts() -> Vec<String> {
        verifier_engine::DEFAULT_IGNORABLE_REVERTS.iter().map(|s| s.to_string()).collect()
    }
}

pub const ENV_LEDGER_URL: &str = "VERIFIER_LEDGER_URL";
pub const ENV_CONTENT_STORE_URL: &str = "VERIFIER_CONTENT_STORE_URL";
pub const ENV_SIGNING_KEY: &str = "VERIFIER_SIGNING_KEY";
pub const ENV_POLL_INTERVAL_MS: &str = "VERIFIER_POLL_INTERVAL_MS";
pub const ENV_DATA_DIR: &str = "VERIFIER_DATA_DIR";
pub const ENV_START_BLOCK: &str = "VERIFIER_START_BLOCK";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "VERIFIER_REQUEST_TIMEOUT_MS";
pub const ENV_MAX_SCHEMA_BYTES: &str = "VERIFIER_MAX_SCHEMA_BYTES";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue { key: String, value: String, reason: String },

    #[error("missing required configuration {key} ({hint})")]
    MissingRequired { key: String, hint: String },
}

/// Values given on the command line. `None` leaves the lower layer in place.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub ledger_url: Option<String>,
    pub content_store_url: Option<String>,
    pub poll_interval_ms: Option<u64>,
}

#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifierConfig {
    #[serde(default = "defaults::poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub ledger_url: Option<String>,
    #[serde(default)]
    pub content_store_url: Option<String>,
    /// Credential for vote submission.
    #[serde(default)]
    pub signing_key: Option<String>,
    #[serde(default = "defaults::ignorable_reverts")]
    pub ignorable_reverts: Vec<String>,
    #[serde(default = "defaults::data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "defaults::request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Largest interface description fetched from the content store.
    #[serde(default = "defaults::max_schema_bytes")]
    pub max_schema_bytes: usize,
    #[serde(default)]
    pub start_block: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: defaults::poll_interval_ms(),
            ledger_url: None,
            content_store_url: None,
            signing_key: None,
            ignorable_reverts: defaults::ignorable_reverts(),
            data_dir: defaults::data_dir(),
            request_timeout_ms: defaults::request_timeout_ms(),
            max_schema_bytes: defaults::max_schema_bytes(),
            start_block: 0,
        }
    }
}

// The signing key must never reach a log line
impl fmt::Debug for VerifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifierConfig")
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("ledger_url", &self.ledger_url)
            .field("content_store_url", &self.content_store_url)
            .field("signing_key", &self.signing_key.as_ref().map(|_| "<redacted>"))
            .field("ignorable_reverts", &self.ignorable_reverts)
            .field("data_dir", &self.data_dir)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("max_schema_bytes", &self.max_schema_bytes)
            .field("start_block", &self.start_block)
            .finish()
    }
}

impl VerifierConfig {
    /// Layer file, process environment and `overrides`, then validate.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Apply `VERIFIER_*` variables as resolved by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_LEDGER_URL) {
            self.ledger_url = Some(v);
        }
        if let Some(v) = lookup(ENV_CONTENT_STORE_URL) {
            self.content_store_url = Some(v);
        }
        if let Some(v) = lookup(ENV_SIGNING_KEY) {
            self.signing_key = Some(v);
        }
        if let Some(v) = lookup(ENV_DATA_DIR) {
            self.data_dir = v.into();
        }
        if let Some(v) = lookup(ENV_POLL_INTERVAL_MS) {
            self.poll_interval_ms = parse_number(ENV_POLL_INTERVAL_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_REQUEST_TIMEOUT_MS) {
            self.request_timeout_ms = parse_number(ENV_REQUEST_TIMEOUT_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_MAX_SCHEMA_BYTES) {
            self.max_schema_bytes = parse_number(ENV_MAX_SCHEMA_BYTES, &v)?;
        }
        if let Some(v) = lookup(ENV_START_BLOCK) {
            self.start_block = parse_number(ENV_START_BLOCK, &v)?;
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(dir) = &overrides.data_dir {
            self.data_dir = dir.clone();
        }
        if let Some(url) = &overrides.ledger_url {
            self.ledger_url = Some(url.clone());
        }
        if let Some(url) = &overrides.content_store_url {
            self.content_store_url = Some(url.clone());
        }
        if let Some(ms) = overrides.poll_interval_ms {
            self.poll_interval_ms = ms;
        }
    }

    /// Checks what every subcommand relies on. Endpoints and the signing key
    /// are only required by the commands that talk to the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(invalid("poll_interval_ms", "0", "must be greater than zero"));
        }
        if self.request_timeout_ms == 0 {
            return Err(invalid("request_timeout_ms", "0", "must be greater than zero"));
        }
        if self.max_schema_bytes == 0 {
            return Err(invalid("max_schema_bytes", "0", "must be greater than zero"));
        }
        if let Some(url) = &self.ledger_url {
            parse_url("ledger_url", url)?;
        }
        if let Some(url) = &self.content_store_url {
            parse_url("content_store_url", url)?;
        }
        Ok(())
    }

    pub fn ledger_endpoint(&self) -> Result<Url, ConfigError> {
        let url = self.ledger_url.as_deref().ok_or_else(|| ConfigError::MissingRequired {
            key: "ledger_url".into(),
            hint: format!("set it in the config file, {ENV_LEDGER_URL} or --ledger-url"),
        })?;
        parse_url("ledger_url", url)
    }

    pub fn content_store_endpoint(&self) -> Result<Url, ConfigError> {
        let url = self.content_store_url.as_deref().ok_or_else(|| ConfigError::MissingRequired {
            key: "content_store_url".into(),
            hint: format!("set it in the config file, {ENV_CONTENT_STORE_URL} or --content-store-url"),
        })?;
        parse_url("content_store_url", url)
    }

    pub fn signing_key(&self) -> Result<&str, ConfigError> {
        match self.signing_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ConfigError::MissingRequired {
                key: "signing_key".into(),
                hint: format!("set {ENV_SIGNING_KEY}"),
            }),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Whether the configured allow-list differs from the built-in one.
    pub fn custom_ignorable_reverts(&self) -> bool {
        self.ignorable_reverts.iter().map(String::as_str).ne(DEFAULT_IGNORABLE_REVERTS.iter().copied())
    }
}

fn invalid(key: &str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue { key: key.into(), value: value.into(), reason: reason.into() }
}

fn parse_number<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|e| invalid(key, value, format!("must be a non-negative integer: {e}")))
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| invalid(key, value, e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(key, value, format!("unsupported scheme {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = VerifierConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.data_dir, PathBuf::from("./verifier-data"));
        assert_eq!(config.start_block, 0);
        assert_eq!(config.max_schema_bytes, 8 * 1024 * 1024);
        assert!(!config.custom_ignorable_reverts());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_then_env_then_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verifier.toml");
        std::fs::write(
            &path,
            r#"
poll_interval_ms = 1000
ledger_url = "http://file-ledger:8545"
content_store_url = "http://file-ipfs:8080"
ignorable_reverts = ["You already voted"]
start_block = 12
"#,
        )
        .unwrap();

        let mut config = VerifierConfig::from_file(&path).unwrap();
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.request_timeout_ms, 30_000);
        assert!(config.custom_ignorable_reverts());

        config
            .apply_env(env(&[
                (ENV_LEDGER_URL, "http://env-ledger:8545"),
                (ENV_START_BLOCK, "40"),
                (ENV_SIGNING_KEY, "secret"),
                (ENV_MAX_SCHEMA_BYTES, "65536"),
            ]))
            .unwrap();
        config.apply_overrides(&Overrides {
            poll_interval_ms: Some(250),
            ..Default::default()
        });
        config.validate().unwrap();

        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.start_block, 40);
        assert_eq!(config.max_schema_bytes, 65536);
        assert_eq!(config.ledger_endpoint().unwrap().host_str(), Some("env-ledger"));
        assert_eq!(config.content_store_endpoint().unwrap().host_str(), Some("file-ipfs"));
        assert_eq!(config.signing_key().unwrap(), "secret");
    }

    #[test]
    fn test_unknown_file_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verifier.toml");
        std::fs::write(&path, "poll_intervall_ms = 10\n").unwrap();
        assert!(matches!(VerifierConfig::from_file(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = VerifierConfig::default();
        let err = config.apply_env(env(&[(ENV_POLL_INTERVAL_MS, "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == ENV_POLL_INTERVAL_MS));

        config.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = VerifierConfig::default();
        config.ledger_url = Some("not a url".into());
        assert!(config.validate().is_err());

        config.ledger_url = Some("ftp://ledger".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_network_settings() {
        let config = VerifierConfig::default();
        assert!(matches!(config.ledger_endpoint(), Err(ConfigError::MissingRequired { .. })));
        assert!(matches!(config.signing_key(), Err(ConfigError::MissingRequired { .. })));
    }

    #[test]
    fn test_debug_redacts_signing_key() {
        let config = VerifierConfig { signing_key: Some("hunter2".into()), ..Default::default() };
        let printed = format!("{config:?}");
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("<redacted>"));
    }
}
