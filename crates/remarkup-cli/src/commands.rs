// SPDX-License-Identifier: AGPL-3.0-or-later
//! Command implementations

use anyhow::{bail, Context, Result};
use remarkup_core::{LinkedObject, RemarkupEngine, TokenList};
use remarkup_translate::backends::{export_units, DictionaryBackend, ImportedDocument, RemoteBackend};
use remarkup_translate::config::BackendKind;
use remarkup_translate::{FileBackend, SourceDocument, TranslationBackend, Translator, TranslatorConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Token dump printed by `remarkup tokens`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenReport {
    pub word_count: usize,
    pub char_count: usize,
    pub linked_objects: Vec<LinkedObject>,
    pub tokens: TokenList,
}

/// Per-document line of the `import-dictionary` report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub path: PathBuf,
    /// Translated title
    pub title: String,
    pub more_translation_needed: bool,
}

/// Read a file, or standard input for `None` and `-`
pub async fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            use tokio::io::AsyncReadExt;
            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .context("Failed to read standard input")?;
            Ok(input)
        }
    }
}

/// Write to a file, or standard output for `None`
pub async fn write_output(path: Option<&Path>, content: &[u8]) -> Result<()> {
    match path {
        Some(path) => tokio::fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            use tokio::io::AsyncWriteExt;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(content).await?;
            stdout.flush().await?;
            Ok(())
        }
    }
}

/// Configuration from `path`, or defaults
pub fn load_config(path: Option<&Path>) -> Result<TranslatorConfig> {
    match path {
        Some(path) => TranslatorConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(TranslatorConfig::default()),
    }
}

pub fn engine(config: &TranslatorConfig) -> RemarkupEngine {
    RemarkupEngine::with_config(config.markup.clone())
}

/// Load a Remarkup file as a translatable document; the file stem is its id
pub async fn load_document(path: &Path) -> Result<SourceDocument> {
    let content = read_input(Some(path)).await?;
    let id = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .with_context(|| format!("No usable file name in {}", path.display()))?;
    let title = content
        .lines()
        .find_map(|line| {
            let line = line.trim();
            line.starts_with('=')
                .then(|| line.trim_matches('=').trim().to_string())
                .filter(|title| !title.is_empty())
        })
        .unwrap_or_else(|| id.clone());
    Ok(SourceDocument::new(id, title, content))
}

pub fn tokens(engine: &RemarkupEngine, markup: &str, pretty: bool) -> Result<String> {
    let output = engine.parse(markup);
    let report = TokenReport {
        word_count: output.word_count(),
        char_count: output.char_count(),
        linked_objects: output.linked_objects,
        tokens: output.tokens,
    };
    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    Ok(json)
}

pub fn from_xml(engine: &RemarkupEngine, xml: &str) -> Result<String> {
    engine.from_xml(xml).context("Failed to import pseudo-XML")
}

/// Backend selected by the configuration
///
/// A remote backend is refused unless the user confirmed that the document
/// may be sent to the service.
pub async fn backend(
    config: &TranslatorConfig,
    confirmed: bool,
    dictionary: Option<&Path>,
) -> Result<Box<dyn TranslationBackend>> {
    let backend: Box<dyn TranslationBackend> = match config.backend.kind {
        BackendKind::Remote => Box::new(
            RemoteBackend::new(config.backend.remote.clone())
                .context("Failed to set up the remote backend")?,
        ),
        BackendKind::Dictionary => {
            let mut backend = DictionaryBackend::with_name(&config.backend.dictionary.name);
            if let Some(path) = dictionary {
                let bytes = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let count = backend.import_file(&bytes)?;
                info!(count, path = %path.display(), "loaded dictionary");
            }
            Box::new(backend)
        }
    };

    if Translator::requires_confirmation(backend.as_ref()) && !confirmed {
        bail!(
            "The {} backend sends document content to {}; pass --yes to confirm",
            backend.name(),
            config.backend.remote.endpoint
        );
    }
    Ok(backend)
}

pub async fn translate(
    config: &TranslatorConfig,
    markup: &str,
    origin_id: &str,
    confirmed: bool,
    dictionary: Option<&Path>,
) -> Result<String> {
    let mut backend = backend(config, confirmed, dictionary).await?;
    let translator = Translator::new(engine(config));
    debug!(origin = origin_id, backend = backend.name(), "translating");
    translator
        .translate_markup(
            &config.source_lang,
            &config.target_lang,
            markup,
            origin_id,
            backend.as_mut(),
        )
        .await
        .with_context(|| format!("Failed to translate {origin_id}"))
}

/// Record the units of every document and serialize them as CSV
pub async fn export_dictionary(
    config: &TranslatorConfig,
    documents: &[SourceDocument],
) -> Result<Vec<u8>> {
    let translator = Translator::new(engine(config));
    let mut backend = DictionaryBackend::with_name(&config.backend.dictionary.name);
    for document in documents {
        backend
            .import_dictionary(&translator, &config.source_lang, &config.target_lang, document)
            .await
            .with_context(|| format!("Failed to extract {}", document.id))?;
    }
    info!(documents = documents.len(), units = backend.units().len(), "exported dictionary");
    Ok(export_units(backend.units())?)
}

/// Apply a CSV dictionary to every document
pub async fn import_dictionary(
    config: &TranslatorConfig,
    dictionary: &[u8],
    documents: &[SourceDocument],
) -> Result<Vec<ImportedDocument>> {
    let translator = Translator::new(engine(config));
    let mut backend = DictionaryBackend::with_name(&config.backend.dictionary.name);
    let count = backend
        .import_file(dictionary)
        .context("Failed to read the dictionary")?;
    debug!(count, "dictionary entries");

    let mut imported = Vec::with_capacity(documents.len());
    for document in documents {
        imported.push(
            backend
                .import_dictionary(&translator, &config.source_lang, &config.target_lang, document)
                .await
                .with_context(|| format!("Failed to translate {}", document.id))?,
        );
    }
    if backend.has_unprocessed_entries() {
        info!("some dictionary entries belong to documents that were not imported");
    }
    Ok(imported)
}
