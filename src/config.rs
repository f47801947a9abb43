//! # Configuration Module
//!
//! Runtime settings read from the environment (after `.env` is loaded),
//! plus the bot token loader.

use std::path::PathBuf;

use thiserror::Error;

use crate::dialogue::FlowOptions;

// Defaults for optional settings
pub const DEFAULT_MAX_BATCH_SERIES: usize = 50;
pub const DEFAULT_SEND_MAX_RETRIES: u32 = 3;
pub const DEFAULT_SEND_RETRY_DELAY_MS: u64 = 2000;
pub const DEFAULT_SEND_MAX_RETRY_DELAY_MS: u64 = 10_000;
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024; // 50MB, Bot API download limit is 20MB

pub const TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";
pub const TOKEN_FILE_VAR: &str = "TELEGRAM_BOT_TOKEN_FILE";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("bot token not found: set {TOKEN_VAR} or {TOKEN_FILE_VAR}")]
    MissingToken,

    #[error("failed to read token file {path}: {source}")]
    TokenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Retry behaviour for document delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total send attempts, at least one is always made
    pub max_attempts: u32,
    /// Base delay between attempts in milliseconds
    pub base_delay_ms: u64,
    /// Maximum delay between attempts in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_SEND_MAX_RETRIES,
            base_delay_ms: DEFAULT_SEND_RETRY_DELAY_MS,
            max_delay_ms: DEFAULT_SEND_MAX_RETRY_DELAY_MS,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

/// Bot settings, everything except the token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Show a summary with Generate / Cancel buttons before generating
    pub confirm_before_generate: bool,
    /// Maximum number of series accepted in one batch
    pub max_batch_series: usize,
    /// Largest accepted upload for the TXT to CSV converter
    pub max_upload_bytes: u64,
    pub retry: RetryConfig,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            confirm_before_generate: false,
            max_batch_series: DEFAULT_MAX_BATCH_SERIES,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            retry: RetryConfig::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl Settings {
    /// Read settings from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, falling back to defaults for unset keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let retry = RetryConfig {
            max_attempts: parse_or("SEND_MAX_RETRIES", &lookup, defaults.retry.max_attempts)?,
            base_delay_ms: parse_or("SEND_RETRY_DELAY_MS", &lookup, defaults.retry.base_delay_ms)?,
            max_delay_ms: parse_or(
                "SEND_MAX_RETRY_DELAY_MS",
                &lookup,
                defaults.retry.max_delay_ms,
            )?,
        };

        let confirm_before_generate = match lookup("CONFIRM_BEFORE_GENERATE") {
            Some(value) => parse_bool("CONFIRM_BEFORE_GENERATE", &value)?,
            None => defaults.confirm_before_generate,
        };

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("") | Some("plain") | Some("text") => LogFormat::Plain,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        let max_batch_series = parse_or("MAX_BATCH_SERIES", &lookup, defaults.max_batch_series)?;
        if max_batch_series == 0 {
            return Err(ConfigError::InvalidValue {
                key: "MAX_BATCH_SERIES",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            confirm_before_generate,
            max_batch_series,
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", &lookup, defaults.max_upload_bytes)?,
            retry,
            log_format,
        })
    }

    /// Options consumed by the conversation state machine
    pub fn flow_options(&self) -> FlowOptions {
        FlowOptions {
            confirm_before_generate: self.confirm_before_generate,
            max_batch_series: self.max_batch_series,
        }
    }
}

fn parse_or<T, F>(key: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

/// Load the bot token from `TELEGRAM_BOT_TOKEN`, or from the file named by
/// `TELEGRAM_BOT_TOKEN_FILE`
pub fn load_token() -> Result<String, ConfigError> {
    resolve_token(|key| std::env::var(key).ok(), |path| std::fs::read_to_string(path))
}

/// Token resolution with injectable environment and file access
pub fn resolve_token<F, R>(lookup: F, read_file: R) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    R: Fn(&PathBuf) -> std::io::Result<String>,
{
    if let Some(token) = lookup(TOKEN_VAR) {
        let token = token.trim();
        if !token.is_empty() {
            return Ok(token.to_string());
        }
    }

    if let Some(path) = lookup(TOKEN_FILE_VAR) {
        let path = PathBuf::from(path.trim());
        let content = read_file(&path).map_err(|source| ConfigError::TokenFile {
            path: path.clone(),
            source,
        })?;
        let token = content.trim();
        if !token.is_empty() {
            return Ok(token.to_string());
        }
    }

    Err(ConfigError::MissingToken)
}
