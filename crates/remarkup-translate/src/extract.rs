// SPDX-License-Identifier: AGPL-3.0-or-later
//! Translatable text runs of a pseudo-XML document
//!
//! A run is the literal text between two tags. Runs without a letter (markers,
//! numbers, punctuation) and object references such as `{F42}` are never
//! offered for translation.

use once_cell::sync::Lazy;
use regex::Regex;
use remarkup_core::html::{decode_entities, escape_html};
use remarkup_core::xml::{tokenize, BrokenXmlToken};

static OBJECT_REFERENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\{[FTM][^}]*\}$").unwrap());
static LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{L}").unwrap());

/// A text run, decoded and trimmed, with its position in the pseudo-XML
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    /// Byte offset of the raw run in the pseudo-XML
    pub start: usize,
    /// Byte length of the raw run
    pub length: usize,
    pub leading: String,
    pub text: String,
    pub trailing: String,
}

impl TextRun {
    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

/// Whether a decoded, trimmed run should be translated
pub fn is_translatable(text: &str) -> bool {
    !OBJECT_REFERENCE.is_match(text) && LETTER.is_match(text)
}

/// Translatable runs in document order
pub fn collect_text_runs(xml: &str) -> Vec<TextRun> {
    tokenize(xml)
        .into_iter()
        .filter_map(|token| match token {
            BrokenXmlToken::Text {
                start,
                length,
                text,
            } => {
                let decoded = decode_entities(&text);
                let trimmed = decoded.trim();
                if !is_translatable(trimmed) {
                    return None;
                }
                let leading_len = decoded.len() - decoded.trim_start().len();
                let trailing_len = decoded.len() - decoded.trim_end().len();
                Some(TextRun {
                    start,
                    length,
                    leading: decoded[..leading_len].to_string(),
                    text: trimmed.to_string(),
                    trailing: decoded[decoded.len() - trailing_len..].to_string(),
                })
            }
            _ => None,
        })
        .collect()
}

/// Put translated runs back, keeping their surrounding whitespace
///
/// `replacements` must be in document order, as returned by
/// [`collect_text_runs`].
pub fn replace_text_runs(xml: &str, replacements: &[(TextRun, String)]) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut pos = 0;
    for (run, translated) in replacements {
        out.push_str(&xml[pos..run.start]);
        out.push_str(&escape_html(&run.leading));
        out.push_str(&escape_html(translated));
        out.push_str(&escape_html(&run.trailing));
        pos = run.end();
    }
    out.push_str(&xml[pos..]);
    out
}
