// SPDX-License-Identifier: AGPL-3.0-or-later
//! Remote backend: a DeepLX-compatible HTTP translation service
//!
//! Request: `POST {endpoint}` with `{"text", "source_lang", "target_lang"}`.
//! Response: `{"code": 200, "data": "..."}`.

use crate::backend::TranslationBackend;
use crate::config::RemoteConfig;
use crate::error::{Result, TranslationError};
use crate::extract::{collect_text_runs, replace_text_runs};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

#[derive(Debug, Serialize)]
struct DeepLxRequest<'a> {
    text: &'a str,
    source_lang: &'a str,
    target_lang: &'a str,
}

#[derive(Debug, Deserialize)]
struct DeepLxResponse {
    code: u16,
    data: Option<String>,
    message: Option<String>,
}

pub struct RemoteBackend {
    client: reqwest::Client,
    config: RemoteConfig,
}

impl RemoteBackend {
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.timeout())
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    async fn request(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        let body = DeepLxRequest {
            text,
            source_lang,
            target_lang,
        };
        let mut request = self.client.post(&self.config.endpoint).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        trace!(bytes = text.len(), endpoint = %self.config.endpoint, "sending translation request");
        let response: DeepLxResponse = request.send().await?.error_for_status()?.json().await?;

        if response.code != 200 {
            return Err(TranslationError::Backend {
                backend: self.name().to_string(),
                message: response
                    .message
                    .unwrap_or_else(|| format!("service answered with code {}", response.code)),
            });
        }
        response
            .data
            .ok_or_else(|| TranslationError::InvalidResponse("missing `data` field".to_string()))
    }
}

#[async_trait]
impl TranslationBackend for RemoteBackend {
    fn name(&self) -> &str {
        "remote"
    }

    fn is_remote_service(&self) -> bool {
        true
    }

    async fn translate(
        &mut self,
        source_lang: &str,
        target_lang: &str,
        text: &str,
        origin_id: &str,
    ) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }
        if !self.config.split_text_runs {
            debug!(origin = origin_id, "translating whole document");
            return self.request(text, source_lang, target_lang).await;
        }

        let runs = collect_text_runs(text);
        debug!(origin = origin_id, runs = runs.len(), "translating text runs");
        let mut replacements = Vec::with_capacity(runs.len());
        for run in runs {
            let translated = self.request(&run.text, source_lang, target_lang).await?;
            replacements.push((run, translated));
        }
        Ok(replace_text_runs(text, &replacements))
    }
}
