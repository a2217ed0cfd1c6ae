// SPDX-License-Identifier: AGPL-3.0-or-later
//! Dictionary backend: translation through a spreadsheet
//!
//! The first pass records every text run of a document as a translation unit
//! and exports them as CSV. Once a translator has filled in the third column
//! the file is imported again and the same pass applies the translations.

use crate::backend::{FileBackend, TranslationBackend};
use crate::error::{Result, TranslationError};
use crate::extract::{collect_text_runs, replace_text_runs};
use crate::orchestrator::{SourceDocument, Translator};
use crate::unit::{KeySequence, TranslationUnit};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Column headers of the exchanged spreadsheet
pub const CSV_HEADER: [&str; 3] = ["Key", "Original text", "Translation"];

/// Separates the keys of units sharing one original text
const KEY_SEPARATOR: &str = "|";

/// Serialize units as CSV, one row per distinct original text
pub fn export_units(units: &[TranslationUnit]) -> Result<Vec<u8>> {
    let mut rows: Vec<(Vec<&str>, &str, &str)> = Vec::new();
    let mut by_original: HashMap<&str, usize> = HashMap::new();
    for unit in units {
        match by_original.get(unit.original_text.as_str()) {
            Some(&row) => {
                rows[row].0.push(unit.key.as_str());
                if rows[row].2.is_empty() {
                    rows[row].2 = unit.translated_text.as_str();
                }
            }
            None => {
                by_original.insert(unit.original_text.as_str(), rows.len());
                rows.push((
                    vec![unit.key.as_str()],
                    unit.original_text.as_str(),
                    unit.translated_text.as_str(),
                ));
            }
        }
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for (keys, original, translation) in rows {
        let keys = keys.join(KEY_SEPARATOR);
        writer.write_record([keys.as_str(), original, translation])?;
    }
    writer
        .into_inner()
        .map_err(|e| TranslationError::Io(e.into_error()))
}

/// Read units back from CSV, splitting combined keys
pub fn import_units(bytes: &[u8]) -> Result<Vec<TranslationUnit>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let mut units = Vec::new();
    for record in reader.records() {
        let record = record?;
        let original = record.get(1).unwrap_or("");
        let translation = record.get(2).unwrap_or("");
        for key in record
            .get(0)
            .unwrap_or("")
            .split(KEY_SEPARATOR)
            .map(str::trim)
            .filter(|key| !key.is_empty())
        {
            units.push(TranslationUnit::new(key, original).with_translation(translation));
        }
    }
    Ok(units)
}

#[derive(Debug, Clone)]
struct DictionaryEntry {
    key: String,
    translated_text: String,
    processed: bool,
}

/// A document after the dictionary was applied to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedDocument {
    pub title: String,
    pub content: String,
    /// Untranslated runs or unused dictionary entries remain
    pub more_translation_needed: bool,
}

/// Records units on the way out and applies translations on the way in
#[derive(Debug, Clone)]
pub struct DictionaryBackend {
    name: String,
    entries: Vec<DictionaryEntry>,
    units: Vec<TranslationUnit>,
    missing: usize,
}

impl DictionaryBackend {
    pub fn new() -> Self {
        Self::with_name("dictionary")
    }

    /// `name` becomes the stem of the exported file name
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            units: Vec::new(),
            missing: 0,
        }
    }

    /// Add or replace dictionary entries, returning how many were read
    pub fn load(&mut self, units: impl IntoIterator<Item = TranslationUnit>) -> usize {
        let mut count = 0;
        for unit in units {
            count += 1;
            match self.entries.iter_mut().find(|entry| entry.key == unit.key) {
                Some(entry) => {
                    entry.translated_text = unit.translated_text;
                    entry.processed = false;
                }
                None => self.entries.push(DictionaryEntry {
                    key: unit.key,
                    translated_text: unit.translated_text,
                    processed: false,
                }),
            }
        }
        debug!(count, total = self.entries.len(), "loaded dictionary entries");
        count
    }

    /// Entry for `key`: an exact match, or else the first entry whose key
    /// contains `key`
    ///
    /// The fallback exists for combined `a|b` keys stored verbatim. It can
    /// pick the wrong entry when one key is a substring of another.
    fn lookup(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.key == key)
            .or_else(|| self.entries.iter().position(|entry| entry.key.contains(key)))
    }

    /// Translation stored for `key`, if any
    pub fn translation(&self, key: &str) -> Option<&str> {
        self.lookup(key)
            .map(|index| self.entries[index].translated_text.as_str())
            .filter(|text| !text.trim().is_empty())
    }

    /// Units recorded by translation passes so far
    pub fn units(&self) -> &[TranslationUnit] {
        &self.units
    }

    pub fn take_units(&mut self) -> Vec<TranslationUnit> {
        std::mem::take(&mut self.units)
    }

    /// Whether some loaded entries were not used by any pass yet
    pub fn has_unprocessed_entries(&self) -> bool {
        self.entries.iter().any(|entry| !entry.processed)
    }

    /// Runs left untranslated by the most recent pass
    pub fn missing_translations(&self) -> usize {
        self.missing
    }

    fn record(&mut self, unit: TranslationUnit) {
        if !self.units.iter().any(|known| known.key == unit.key) {
            self.units.push(unit);
        }
    }

    /// Apply the dictionary to a document's title and content
    ///
    /// More passes are needed while some run of this document lacks a
    /// translation or some loaded entry was never used, which is the case
    /// when the dictionary also covers child documents not imported yet.
    pub async fn import_dictionary(
        &mut self,
        translator: &Translator,
        source_lang: &str,
        target_lang: &str,
        document: &SourceDocument,
    ) -> Result<ImportedDocument> {
        let title_origin = format!("{}:title", document.id);
        let title = translator
            .translate_markup(source_lang, target_lang, &document.title, &title_origin, self)
            .await?;
        let mut missing = self.missing;

        let content = translator
            .translate_markup(source_lang, target_lang, &document.content, &document.id, self)
            .await?;
        missing += self.missing;

        let unprocessed = self.has_unprocessed_entries();
        info!(document = %document.id, missing, unprocessed, "applied dictionary");
        Ok(ImportedDocument {
            title,
            content,
            more_translation_needed: unprocessed || missing > 0,
        })
    }
}

impl Default for DictionaryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranslationBackend for DictionaryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_remote_service(&self) -> bool {
        false
    }

    async fn translate(
        &mut self,
        _source_lang: &str,
        _target_lang: &str,
        text: &str,
        origin_id: &str,
    ) -> Result<String> {
        let mut keys = KeySequence::new(origin_id);
        let mut replacements = Vec::new();
        self.missing = 0;

        for run in collect_text_runs(text) {
            let key = keys.next_key(&run.text);
            let found = self.lookup(&key);
            if let Some(index) = found {
                self.entries[index].processed = true;
            }
            let translation = found
                .map(|index| self.entries[index].translated_text.clone())
                .filter(|translated| !translated.trim().is_empty());

            let mut unit = TranslationUnit::new(key, run.text.clone());
            match translation {
                Some(translated) => {
                    unit = unit.with_translation(translated.clone());
                    replacements.push((run, translated));
                }
                None => self.missing += 1,
            }
            self.record(unit);
        }

        debug!(
            origin = origin_id,
            translated = replacements.len(),
            missing = self.missing,
            "dictionary pass"
        );
        Ok(replace_text_runs(text, &replacements))
    }
}

impl FileBackend for DictionaryBackend {
    fn file_bytes(&self) -> Result<Vec<u8>> {
        export_units(&self.units)
    }

    fn content_type(&self) -> &'static str {
        "text/csv"
    }

    fn file_name(&self) -> String {
        format!("{}.csv", self.name)
    }

    fn import_file(&mut self, bytes: &[u8]) -> Result<usize> {
        let units = import_units(bytes)?;
        Ok(self.load(units))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::translation_key;
    use pretty_assertions::assert_eq;

    fn unit(key: &str, original: &str, translation: &str) -> TranslationUnit {
        TranslationUnit::new(key, original).with_translation(translation)
    }

    #[test]
    fn test_export_dedupes_by_original_text() {
        let units = vec![
            unit("k1", "Hello", ""),
            unit("k2", "World", ""),
            unit("k3", "Hello", "Hallo"),
        ];
        let csv = String::from_utf8(export_units(&units).unwrap()).unwrap();
        assert_eq!(
            csv,
            "Key,Original text,Translation\nk1|k3,Hello,Hallo\nk2,World,\n"
        );
    }

    #[test]
    fn test_dedup_round_trip_splits_keys() {
        let units = vec![unit("k1", "Hello", "Hallo"), unit("k2", "Hello", "")];
        let bytes = export_units(&units).unwrap();
        let imported = import_units(&bytes).unwrap();
        assert_eq!(
            imported,
            vec![unit("k1", "Hello", "Hallo"), unit("k2", "Hello", "Hallo")]
        );
    }

    #[test]
    fn test_import_handles_quoting() {
        let csv = "Key,Original text,Translation\nk1,\"a, \"\"b\"\"\",\"c\nd\"\n";
        let units = import_units(csv.as_bytes()).unwrap();
        assert_eq!(units, vec![unit("k1", "a, \"b\"", "c\nd")]);
    }

    #[test]
    fn test_lookup_prefers_exact_then_substring() {
        let mut backend = DictionaryBackend::new();
        backend.load(vec![unit("aa|bb", "x", "combined"), unit("bb", "y", "exact")]);
        assert_eq!(backend.translation("bb"), Some("exact"));
        assert_eq!(backend.translation("aa"), Some("combined"));
        assert_eq!(backend.translation("cc"), None);
    }

    #[tokio::test]
    async fn test_first_pass_records_units() {
        let mut backend = DictionaryBackend::with_name("guide");
        let xml = "Hello <Bold>world</Bold> <N>[1]</N>";
        let out = backend.translate("en", "de", xml, "doc").await.unwrap();
        assert_eq!(out, xml);
        assert_eq!(backend.missing_translations(), 2);

        let keys: Vec<_> = backend.units().iter().map(|u| u.key.clone()).collect();
        assert_eq!(
            keys,
            vec![translation_key("doc", "Hello", 1), translation_key("doc", "world", 2)]
        );
        assert_eq!(backend.file_name(), "guide.csv");
        assert_eq!(backend.content_type(), "text/csv");
    }

    #[tokio::test]
    async fn test_second_pass_applies_translations() {
        let xml = "Hello <Bold>world</Bold>";
        let mut first = DictionaryBackend::new();
        first.translate("en", "de", xml, "doc").await.unwrap();

        let mut edited = first.take_units();
        edited[0].translated_text = "Hallo".to_string();
        edited[1].translated_text = "Welt".to_string();
        let bytes = export_units(&edited).unwrap();

        let mut second = DictionaryBackend::new();
        assert_eq!(second.import_file(&bytes).unwrap(), 2);
        assert!(second.has_unprocessed_entries());
        let out = second.translate("en", "de", xml, "doc").await.unwrap();
        assert_eq!(out, "Hallo <Bold>Welt</Bold>");
        assert_eq!(second.missing_translations(), 0);
        assert!(!second.has_unprocessed_entries());
    }

    #[tokio::test]
    async fn test_unused_entries_of_child_document_need_another_pass() {
        let translator = Translator::default();
        let mut backend = DictionaryBackend::new();
        backend.load(vec![
            unit(&translation_key("parent", "Hello", 1), "Hello", "Hallo"),
            unit(&translation_key("child", "World", 1), "World", "Welt"),
        ]);

        let parent = SourceDocument::new("parent", "", "Hello");
        let imported = backend
            .import_dictionary(&translator, "en", "de", &parent)
            .await
            .unwrap();
        assert_eq!(imported.content, "Hallo");
        assert_eq!(backend.missing_translations(), 0);
        assert!(imported.more_translation_needed);

        let child = SourceDocument::new("child", "", "World");
        let imported = backend
            .import_dictionary(&translator, "en", "de", &child)
            .await
            .unwrap();
        assert_eq!(imported.content, "Welt");
        assert!(!imported.more_translation_needed);
    }

    #[tokio::test]
    async fn test_repeated_text_shares_one_row_and_translates_everywhere() {
        let translator = Translator::default();
        let document = SourceDocument::new("doc", "", "Hello world\n\nHello world");

        let mut first = DictionaryBackend::new();
        let pass = first
            .import_dictionary(&translator, "en", "de", &document)
            .await
            .unwrap();
        assert!(pass.more_translation_needed);

        let csv = String::from_utf8(first.file_bytes().unwrap()).unwrap();
        let first_key = translation_key("doc", "Hello world", 1);
        let second_key = translation_key("doc", "Hello world", 2);
        assert_eq!(
            csv,
            format!("Key,Original text,Translation\n{first_key}|{second_key},Hello world,\n")
        );

        let filled = csv.replace(",Hello world,\n", ",Hello world,Hallo Welt\n");
        let mut second = DictionaryBackend::new();
        assert_eq!(second.import_file(filled.as_bytes()).unwrap(), 2);
        let imported = second
            .import_dictionary(&translator, "en", "de", &document)
            .await
            .unwrap();
        assert_eq!(imported.content, "Hallo Welt\n\nHallo Welt");
        assert!(!imported.more_translation_needed);
    }

    #[tokio::test]
    async fn test_object_references_are_never_units() {
        let mut backend = DictionaryBackend::new();
        let xml = r#"<ObjectReference type="F">{F42}</ObjectReference>"#;
        let out = backend.translate("en", "de", xml, "doc").await.unwrap();
        assert_eq!(out, xml);
        assert!(backend.units().is_empty());
    }
}
