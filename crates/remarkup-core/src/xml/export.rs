// SPDX-License-Identifier: AGPL-3.0-or-later
//! Token tree → pseudo-XML
//!
//! Tag delimiters are written as private-use placeholders while the document
//! is assembled, so nested exports can be embedded as content and escaped by
//! their parents without mangling their structure. They become real angle
//! brackets once, when the top-level export finishes.

use crate::grammar::Grammar;
use crate::html::escape_html;
use crate::token::{Attributes, RuleKind, Token, TokenList};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Stands in for `<` until the export is finished
pub const TAG_OPEN: char = '\u{E000}';
/// Stands in for `>` until the export is finished
pub const TAG_CLOSE: char = '\u{E001}';

static TRAILING_NEWLINE_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\s*\x{E000}N\x{E001}\[\d+\]\x{E000}/N\x{E001})+\s*$").unwrap()
});

/// Serialize a token list to pseudo-XML
pub fn to_xml(grammar: &Grammar, tokens: &TokenList) -> String {
    let mut writer = XmlWriter::new(grammar);
    writer.tokens(tokens.as_slice());
    let xml = writer.finish();
    debug!(tokens = tokens.len(), bytes = xml.len(), "exported pseudo-XML");
    xml
}

/// Accumulates pseudo-XML; rules write their tokens through it
pub struct XmlWriter<'g> {
    grammar: &'g Grammar,
    out: String,
    has_content: bool,
}

impl<'g> XmlWriter<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            out: String::new(),
            has_content: false,
        }
    }

    /// Write a sequence of tokens, dispatching each to the rule that owns it
    pub fn tokens(&mut self, tokens: &[Token]) {
        for (index, token) in tokens.iter().enumerate() {
            match token.kind {
                RuleKind::Text => self.text(&token.text),
                RuleKind::Newline => {
                    if self.has_content {
                        self.newline_marker(index);
                    }
                }
                kind => match self.grammar.rule(kind) {
                    Some(rule) => rule.to_xml(token, self),
                    None => self.text(&token.text),
                },
            }
        }
    }

    /// `<Tag attrs>children</Tag>`
    pub fn element(&mut self, token: &Token) {
        let Some(tag) = token.kind.tag_name() else {
            self.text(&token.text);
            return;
        };
        self.open(tag, &token.attributes);
        self.tokens(&token.children);
        self.close(tag);
    }

    /// `<Tag attrs>escaped text</Tag>`
    pub fn text_element(&mut self, tag: &str, attributes: &Attributes, text: &str) {
        self.open(tag, attributes);
        self.text(text);
        self.close(tag);
    }

    pub fn open(&mut self, tag: &str, attributes: &Attributes) {
        self.has_content = true;
        self.out.push(TAG_OPEN);
        self.out.push_str(tag);
        self.attributes(attributes);
        self.out.push(TAG_CLOSE);
    }

    pub fn close(&mut self, tag: &str) {
        self.out.push(TAG_OPEN);
        self.out.push('/');
        self.out.push_str(tag);
        self.out.push(TAG_CLOSE);
    }

    /// `<Tag attrs />`
    pub fn auto_close(&mut self, tag: &str, attributes: &Attributes) {
        self.has_content = true;
        self.out.push(TAG_OPEN);
        self.out.push_str(tag);
        self.attributes(attributes);
        self.out.push_str(" /");
        self.out.push(TAG_CLOSE);
    }

    /// Escaped literal content
    pub fn text(&mut self, text: &str) {
        if !text.trim().is_empty() {
            self.has_content = true;
        }
        self.push_escaped(text);
    }

    /// Literal placeholder characters become character references so they
    /// survive `finish`
    fn push_escaped(&mut self, text: &str) {
        let escaped = escape_html(text);
        if escaped.contains([TAG_OPEN, TAG_CLOSE]) {
            self.out.push_str(
                &escaped
                    .replace(TAG_OPEN, "&#xE000;")
                    .replace(TAG_CLOSE, "&#xE001;"),
            );
        } else {
            self.out.push_str(&escaped);
        }
    }

    fn newline_marker(&mut self, index: usize) {
        self.out.push(TAG_OPEN);
        self.out.push_str("N");
        self.out.push(TAG_CLOSE);
        self.out.push_str(&format!("[{index}]"));
        self.out.push(TAG_OPEN);
        self.out.push_str("/N");
        self.out.push(TAG_CLOSE);
    }

    fn attributes(&mut self, attributes: &Attributes) {
        for (key, value) in attributes {
            self.out.push(' ');
            self.out.push_str(key);
            self.out.push_str("=\"");
            self.push_escaped(value);
            self.out.push('"');
        }
    }

    /// Drop trailing newline markers and restore the tag delimiters
    pub fn finish(self) -> String {
        let trimmed = TRAILING_NEWLINE_MARKERS.replace(&self.out, "");
        trimmed
            .chars()
            .map(|ch| match ch {
                TAG_OPEN => '<',
                TAG_CLOSE => '>',
                other => other,
            })
            .collect()
    }
}
