// SPDX-License-Identifier: AGPL-3.0-or-later
//! Translator configuration, read from TOML
//!
//! ```toml
//! source_lang = "en"
//! target_lang = "de"
//!
//! [markup]
//! base_url = "/w/"
//!
//! [backend]
//! kind = "remote"
//!
//! [backend.remote]
//! endpoint = "http://localhost:1188/translate"
//! timeout_secs = 60
//! ```

use crate::error::{Result, TranslationError};
use remarkup_core::ParseConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub source_lang: String,
    pub target_lang: String,
    pub markup: ParseConfig,
    pub backend: BackendConfig,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            source_lang: "en".to_string(),
            target_lang: "de".to_string(),
            markup: ParseConfig::default(),
            backend: BackendConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Remote,
    Dictionary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub remote: RemoteConfig,
    pub dictionary: DictionaryConfig,
}

/// DeepLX-compatible HTTP service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub endpoint: String,
    /// Sent as a bearer token when set
    pub api_key: Option<String>,
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
    /// Send each text run separately instead of the whole document
    pub split_text_runs: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:1188/translate".to_string(),
            api_key: None,
            connect_timeout_secs: 10,
            timeout_secs: 60,
            split_text_runs: false,
        }
    }
}

impl RemoteConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    /// Stem of the exported spreadsheet's file name
    pub name: String,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            name: "dictionary".to_string(),
        }
    }
}

impl TranslatorConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| TranslationError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.source_lang.trim().is_empty() || self.target_lang.trim().is_empty() {
            return Err(TranslationError::Config(
                "source_lang and target_lang must not be empty".to_string(),
            ));
        }
        if self.backend.kind == BackendKind::Remote && self.backend.remote.endpoint.trim().is_empty() {
            return Err(TranslationError::Config(
                "backend.remote.endpoint must be set for the remote backend".to_string(),
            ));
        }
        if self.backend.remote.timeout_secs == 0 {
            return Err(TranslationError::Config(
                "backend.remote.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
