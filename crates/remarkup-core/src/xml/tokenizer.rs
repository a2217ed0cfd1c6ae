// SPDX-License-Identifier: AGPL-3.0-or-later
//! Permissive tokenizer for the intermediate pseudo-XML
//!
//! The input may have been through a machine translator, so nothing here is
//! allowed to fail: anything that does not look like a well-shaped tag is
//! returned as text and left for the importer to judge.

use crate::token::Attributes;

/// One lexical unit of pseudo-XML
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokenXmlToken {
    Text {
        start: usize,
        length: usize,
        text: String,
    },
    OpeningTag {
        start: usize,
        length: usize,
        name: String,
        attributes: Attributes,
    },
    ClosingTag {
        start: usize,
        length: usize,
        name: String,
    },
    AutoCloseTag {
        start: usize,
        length: usize,
        name: String,
        attributes: Attributes,
    },
}

impl BrokenXmlToken {
    pub fn start(&self) -> usize {
        match self {
            Self::Text { start, .. }
            | Self::OpeningTag { start, .. }
            | Self::ClosingTag { start, .. }
            | Self::AutoCloseTag { start, .. } => *start,
        }
    }

    pub fn length(&self) -> usize {
        match self {
            Self::Text { length, .. }
            | Self::OpeningTag { length, .. }
            | Self::ClosingTag { length, .. }
            | Self::AutoCloseTag { length, .. } => *length,
        }
    }

    pub fn end(&self) -> usize {
        self.start() + self.length()
    }

    /// Tag name for any tag variant
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Text { .. } => None,
            Self::OpeningTag { name, .. }
            | Self::ClosingTag { name, .. }
            | Self::AutoCloseTag { name, .. } => Some(name),
        }
    }
}

/// Split pseudo-XML into text and tag tokens
pub fn tokenize(input: &str) -> Vec<BrokenXmlToken> {
    let mut tokens = Vec::new();
    let mut text_start: Option<usize> = None;
    let mut pos = 0;

    while pos < input.len() {
        if input[pos..].starts_with('<') {
            if let Some(tag) = parse_tag(input, pos) {
                if let Some(start) = text_start.take() {
                    tokens.push(text_token(input, start, pos));
                }
                pos = tag.end();
                tokens.push(tag);
                continue;
            }
        }
        text_start.get_or_insert(pos);
        pos += input[pos..].chars().next().map_or(1, char::len_utf8);
    }

    if let Some(start) = text_start {
        tokens.push(text_token(input, start, input.len()));
    }
    tokens
}

/// Index of the closing tag matching the opening tag at `open`, counting
/// nested tags of the same name
pub fn find_closing_tag(tokens: &[BrokenXmlToken], open: usize, name: &str) -> Option<usize> {
    if !matches!(tokens.get(open), Some(BrokenXmlToken::OpeningTag { name: n, .. }) if n == name) {
        return None;
    }
    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate().skip(open) {
        match token {
            BrokenXmlToken::OpeningTag { name: n, .. } if n == name => depth += 1,
            BrokenXmlToken::ClosingTag { name: n, .. } if n == name => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

fn text_token(input: &str, start: usize, end: usize) -> BrokenXmlToken {
    BrokenXmlToken::Text {
        start,
        length: end - start,
        text: input[start..end].to_string(),
    }
}

/// Parse a tag starting at `start` (which holds `<`)
fn parse_tag(input: &str, start: usize) -> Option<BrokenXmlToken> {
    let mut cursor = Cursor::new(input, start + 1);

    if cursor.eat('/') {
        let name = cursor.name()?;
        cursor.skip_whitespace();
        cursor.expect('>')?;
        return Some(BrokenXmlToken::ClosingTag {
            start,
            length: cursor.pos - start,
            name,
        });
    }

    let name = cursor.name()?;
    let mut attributes = Attributes::new();
    loop {
        let had_space = cursor.skip_whitespace();
        if cursor.eat('>') {
            return Some(BrokenXmlToken::OpeningTag {
                start,
                length: cursor.pos - start,
                name,
                attributes,
            });
        }
        if cursor.eat('/') {
            cursor.skip_whitespace();
            cursor.expect('>')?;
            return Some(BrokenXmlToken::AutoCloseTag {
                start,
                length: cursor.pos - start,
                name,
                attributes,
            });
        }
        if !had_space {
            return None;
        }
        let key = cursor.name()?;
        cursor.skip_whitespace();
        cursor.expect('=')?;
        cursor.skip_whitespace();
        let value = cursor.quoted()?;
        attributes.insert(key, value);
    }
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str, pos: usize) -> Self {
        Self { input, pos }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Option<()> {
        self.eat(expected).then_some(())
    }

    fn skip_whitespace(&mut self) -> bool {
        let before = self.pos;
        while let Some(ch) = self.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.pos += ch.len_utf8();
        }
        self.pos != before
    }

    /// `[A-Za-z][A-Za-z0-9_-]*`
    fn name(&mut self) -> Option<String> {
        let start = self.pos;
        match self.peek() {
            Some(ch) if ch.is_ascii_alphabetic() => self.pos += 1,
            _ => return None,
        }
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                self.pos += 1;
            } else {
                break;
            }
        }
        Some(self.input[start..self.pos].to_string())
    }

    fn quoted(&mut self) -> Option<String> {
        let quote = self.peek().filter(|q| *q == '"' || *q == '\'')?;
        self.pos += 1;
        let rest = &self.input[self.pos..];
        let close = rest.find(quote)?;
        let value = rest[..close].to_string();
        if value.contains('<') {
            return None;
        }
        self.pos += close + 1;
        Some(value)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // Property: tokens tile the input without gaps or overlaps
        #[test]
        fn prop_tokens_tile_input(input in "(<|>|/|=|\"|[A-Za-z]{1,4}| |é){0,40}") {
            let tokens = tokenize(&input);
            let mut pos = 0;
            for token in &tokens {
                prop_assert_eq!(token.start(), pos);
                pos = token.end();
            }
            prop_assert_eq!(pos, input.len());
        }
    }
}
