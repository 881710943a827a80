use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_LANGUAGE: &str = "en-US";
pub const DEFAULT_SYNC_OFFSET_MS: f64 = -60.0;
pub const MAX_SYNC_OFFSET_MS: f64 = 2_000.0;
pub const ENV_AVATAR_LANGUAGE: &str = "AVATAR_LANGUAGE";
pub const ENV_AVATAR_SYNC_OFFSET_MS: &str = "AVATAR_SYNC_OFFSET_MS";

/// BCP-47-ish language tag, e.g. "en-US" or "es".
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyLanguage);
        }
        Ok(Self(v))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Primary subtag: "en-US" -> "en".
    pub fn primary(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

impl Default for LanguageCode {
    fn default() -> Self {
        Self(DEFAULT_LANGUAGE.to_owned())
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Milliseconds added to the lip-sync clock to compensate for TTS startup
/// latency. Negative values make the mouth lead the audio.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct SyncOffset {
    pub offset_ms: f64,
}

impl SyncOffset {
    pub fn new(offset_ms: f64) -> Result<Self, ConfigError> {
        if !offset_ms.is_finite() || offset_ms.abs() > MAX_SYNC_OFFSET_MS {
            return Err(ConfigError::SyncOffsetOutOfRange(offset_ms));
        }
        Ok(Self { offset_ms })
    }
}

impl Default for SyncOffset {
    fn default() -> Self {
        Self {
            offset_ms: DEFAULT_SYNC_OFFSET_MS,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct AvatarConfig {
    pub language: LanguageCode,
    pub sync_offset: SyncOffset,
    /// Host-reported "prefers reduced motion" state at session start.
    pub prefers_reduced_motion: bool,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("language code must not be empty")]
    EmptyLanguage,
    #[error("sync offset {0} ms outside ±{MAX_SYNC_OFFSET_MS} ms")]
    SyncOffsetOutOfRange(f64),
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn resolve_language(
    cli_value: Option<String>,
    env: &impl Env,
) -> Result<LanguageCode, ConfigError> {
    match cli_value {
        Some(v) => LanguageCode::new(v),
        None => match env.var(ENV_AVATAR_LANGUAGE) {
            Some(v) => LanguageCode::new(v),
            None => Ok(LanguageCode::default()),
        },
    }
}

pub fn resolve_sync_offset(
    cli_value: Option<f64>,
    env: &impl Env,
) -> Result<SyncOffset, ConfigError> {
    match cli_value {
        Some(v) => SyncOffset::new(v),
        None => match env.var(ENV_AVATAR_SYNC_OFFSET_MS) {
            Some(v) => {
                let parsed = v
                    .parse::<f64>()
                    .map_err(|_| ConfigError::SyncOffsetOutOfRange(f64::NAN))?;
                SyncOffset::new(parsed)
            }
            None => Ok(SyncOffset::default()),
        },
    }
}
