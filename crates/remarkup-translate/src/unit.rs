// SPDX-License-Identifier: AGPL-3.0-or-later
//! Translation units and their keys

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One translatable text run, with or without its translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationUnit {
    pub key: String,
    pub original_text: String,
    pub translated_text: String,
}

impl TranslationUnit {
    pub fn new(key: impl Into<String>, original_text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            original_text: original_text.into(),
            translated_text: String::new(),
        }
    }

    pub fn with_translation(mut self, translated_text: impl Into<String>) -> Self {
        self.translated_text = translated_text.into();
        self
    }

    pub fn is_translated(&self) -> bool {
        !self.translated_text.trim().is_empty()
    }
}

/// `sha256_hex(origin_id + text)` followed by a four digit sequence number
pub fn translation_key(origin_id: &str, text: &str, sequence: usize) -> String {
    let digest = Sha256::new()
        .chain_update(origin_id.as_bytes())
        .chain_update(text.as_bytes())
        .finalize();
    format!("{digest:x}{sequence:04}")
}

/// Hands out keys for the runs of one document, in document order
#[derive(Debug, Clone)]
pub struct KeySequence<'a> {
    origin_id: &'a str,
    next: usize,
}

impl<'a> KeySequence<'a> {
    pub fn new(origin_id: &'a str) -> Self {
        Self { origin_id, next: 1 }
    }

    pub fn next_key(&mut self, text: &str) -> String {
        let key = translation_key(self.origin_id, text, self.next);
        self.next += 1;
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_key_shape() {
        let key = translation_key("doc-1", "Hello", 1);
        assert_eq!(key.len(), 64 + 4);
        assert!(key.ends_with("0001"));
        assert!(key[..64].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_key_depends_on_origin_and_text() {
        assert_ne!(translation_key("a", "x", 1), translation_key("b", "x", 1));
        assert_ne!(translation_key("a", "x", 1), translation_key("a", "y", 1));
        assert_eq!(translation_key("a", "x", 7), translation_key("a", "x", 7));
    }

    #[test]
    fn test_sequence_is_strictly_increasing() {
        let mut keys = KeySequence::new("doc");
        let suffixes: Vec<String> = ["a", "b", "a"]
            .iter()
            .map(|text| keys.next_key(text)[64..].to_string())
            .collect();
        assert_eq!(suffixes, vec!["0001", "0002", "0003"]);
    }
}
