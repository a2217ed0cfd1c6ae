// SPDX-License-Identifier: AGPL-3.0-or-later
//! Translation orchestrator
//!
//! shield → translate → repair → reinsert, on pseudo-XML. The backend never
//! sees code or verbatim text, and whatever it does to the newline markers is
//! undone before the result is parsed again.

use crate::backend::TranslationBackend;
use crate::error::Result;
use crate::shield::shield;
use remarkup_core::xml::repair_newline_markers;
use remarkup_core::RemarkupEngine;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// A document to translate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Stable identifier; translation keys are derived from it
    pub id: String,
    pub title: String,
    /// Remarkup
    pub content: String,
}

impl SourceDocument {
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Outcome for one document of a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentOutcome {
    pub id: String,
    /// Translated Remarkup, or a message naming what went wrong
    pub result: std::result::Result<String, String>,
}

impl DocumentOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

pub struct Translator {
    engine: RemarkupEngine,
}

impl Translator {
    pub fn new(engine: RemarkupEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &RemarkupEngine {
        &self.engine
    }

    /// Remote backends send content off the machine and need consent first
    pub fn requires_confirmation(backend: &dyn TranslationBackend) -> bool {
        backend.is_remote_service()
    }

    /// Translate a pseudo-XML document
    pub async fn translate_document(
        &self,
        source_lang: &str,
        target_lang: &str,
        xml: &str,
        origin_id: &str,
        backend: &mut dyn TranslationBackend,
    ) -> Result<String> {
        let shielded = shield(xml)?;
        debug!(
            origin = origin_id,
            backend = backend.name(),
            fragments = shielded.fragments.len(),
            "translating document"
        );

        let translated = backend
            .translate(source_lang, target_lang, &shielded.text, origin_id)
            .await?;
        let repaired = repair_newline_markers(&translated);
        Ok(shielded.unshield(&repaired))
    }

    /// Remarkup in, translated Remarkup out
    pub async fn translate_markup(
        &self,
        source_lang: &str,
        target_lang: &str,
        markup: &str,
        origin_id: &str,
        backend: &mut dyn TranslationBackend,
    ) -> Result<String> {
        let xml = self.engine.to_xml(markup);
        let translated = self
            .translate_document(source_lang, target_lang, &xml, origin_id, backend)
            .await?;
        Ok(self.engine.from_xml(&translated)?)
    }

    /// Translate documents one after another
    ///
    /// A failing document does not stop the batch; its outcome carries the
    /// error instead.
    pub async fn translate_batch(
        &self,
        source_lang: &str,
        target_lang: &str,
        documents: &[SourceDocument],
        backend: &mut dyn TranslationBackend,
    ) -> Vec<DocumentOutcome> {
        let mut outcomes = Vec::with_capacity(documents.len());
        for document in documents {
            let result = self
                .translate_markup(source_lang, target_lang, &document.content, &document.id, backend)
                .await
                .map_err(|e| {
                    warn!(document = %document.id, error = %e, "translation failed");
                    format!("{}: {e}", document.id)
                });
            outcomes.push(DocumentOutcome {
                id: document.id.clone(),
                result,
            });
        }

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        info!(documents = documents.len(), failed, "batch translated");
        outcomes
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(RemarkupEngine::new())
    }
}
