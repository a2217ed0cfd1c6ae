// SPDX-License-Identifier: AGPL-3.0-or-later
//! Token tree produced by the rule dispatcher
//!
//! Every token is an immutable snapshot of one rule application (or of a run
//! of literal characters no rule claimed). The tree keeps exact source text and
//! offsets so the pseudo-XML exporter can reproduce the markup faithfully.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use unicode_segmentation::UnicodeSegmentation;

/// Rule-specific key/value pairs carried by a token or a pseudo-XML tag
pub type Attributes = BTreeMap<String, String>;

/// Discriminator for every token the dispatcher can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Literal characters no rule matched
    Text,
    Newline,
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Highlight,
    Monospace,
    Literal,
    CodeBlock,
    Header,
    HorizontalRule,
    Notification,
    Quote,
    List,
    ListItem,
    Table,
    TableRow,
    TableCell,
    Hyperlink,
    ObjectReference,
}

impl RuleKind {
    /// Every kind, in declaration order
    pub const ALL: [Self; 21] = [
        Self::Text,
        Self::Newline,
        Self::Bold,
        Self::Italic,
        Self::Underline,
        Self::Strikethrough,
        Self::Highlight,
        Self::Monospace,
        Self::Literal,
        Self::CodeBlock,
        Self::Header,
        Self::HorizontalRule,
        Self::Notification,
        Self::Quote,
        Self::List,
        Self::ListItem,
        Self::Table,
        Self::TableRow,
        Self::TableCell,
        Self::Hyperlink,
        Self::ObjectReference,
    ];

    /// Pseudo-XML tag name, `None` for literal text
    pub const fn tag_name(&self) -> Option<&'static str> {
        match self {
            Self::Text => None,
            Self::Newline => Some("N"),
            Self::Bold => Some("Bold"),
            Self::Italic => Some("Italic"),
            Self::Underline => Some("Underline"),
            Self::Strikethrough => Some("Strikethrough"),
            Self::Highlight => Some("Highlight"),
            Self::Monospace => Some("Monospace"),
            Self::Literal => Some("Literal"),
            Self::CodeBlock => Some("CodeBlock"),
            Self::Header => Some("Header"),
            Self::HorizontalRule => Some("HorizontalRule"),
            Self::Notification => Some("Notification"),
            Self::Quote => Some("Quote"),
            Self::List => Some("List"),
            Self::ListItem => Some("ListItem"),
            Self::Table => Some("Table"),
            Self::TableRow => Some("TableRow"),
            Self::TableCell => Some("TableCell"),
            Self::Hyperlink => Some("Hyperlink"),
            Self::ObjectReference => Some("ObjectReference"),
        }
    }

    /// Reverse of [`RuleKind::tag_name`]
    pub fn from_tag_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.tag_name() == Some(name))
    }

    /// Whether the position after this token counts as the start of a line
    pub const fn starts_new_line(&self) -> bool {
        matches!(
            self,
            Self::Newline | Self::Header | Self::HorizontalRule | Self::List | Self::CodeBlock
        )
    }

    /// Block-level kinds render their own line structure in HTML
    pub const fn is_block(&self) -> bool {
        matches!(
            self,
            Self::CodeBlock
                | Self::Header
                | Self::HorizontalRule
                | Self::Notification
                | Self::Quote
                | Self::List
                | Self::Table
        )
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag_name().unwrap_or("Text"))
    }
}

/// Kind of domain object an object-reference token points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    File,
    Task,
    Macro,
}

impl ObjectKind {
    /// Single-letter prefix used in `{F12}` style references
    pub const fn prefix(&self) -> char {
        match self {
            Self::File => 'F',
            Self::Task => 'T',
            Self::Macro => 'M',
        }
    }

    pub fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            'F' => Some(Self::File),
            'T' => Some(Self::Task),
            'M' => Some(Self::Macro),
            _ => None,
        }
    }
}

/// A domain object referenced from the document (file, task, macro)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkedObject {
    pub kind: ObjectKind,
    pub id: u64,
}

impl LinkedObject {
    pub fn new(kind: ObjectKind, id: u64) -> Self {
        Self { kind, id }
    }

    /// Identifier such as `F42`, used for deduplication
    pub fn identifier(&self) -> String {
        format!("{}{}", self.kind.prefix(), self.id)
    }
}

/// One matched grammar-rule application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: RuleKind,
    /// Byte offset into the top-level input
    pub start: usize,
    /// Exact substring consumed
    pub text: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Token>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_objects: Vec<LinkedObject>,
}

impl Token {
    /// Create a leaf token without attributes
    pub fn new(kind: RuleKind, start: usize, text: impl Into<String>) -> Self {
        Self {
            kind,
            start,
            text: text.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
            linked_objects: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<Token>) -> Self {
        self.children = children;
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Byte offset one past the consumed text
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Token>) {
        if self.children.is_empty() {
            out.push(self);
        } else {
            for child in &self.children {
                child.collect_leaves(out);
            }
        }
    }
}

/// Ordered sequence of tokens
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenList {
    tokens: Vec<Token>,
}

impl TokenList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn into_vec(self) -> Vec<Token> {
        self.tokens
    }

    /// Leaf tokens in document order; a token with children is replaced by
    /// its children, recursively
    pub fn flatten(&self) -> Vec<&Token> {
        let mut leaves = Vec::new();
        for token in &self.tokens {
            token.collect_leaves(&mut leaves);
        }
        leaves
    }
}

impl From<Vec<Token>> for TokenList {
    fn from(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }
}

impl<'a> IntoIterator for &'a TokenList {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

/// Result of one dispatcher run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseOutput {
    pub html: String,
    pub tokens: TokenList,
    pub linked_objects: Vec<LinkedObject>,
}

impl ParseOutput {
    /// Count words in literal text
    pub fn word_count(&self) -> usize {
        self.text_leaves()
            .map(|token| token.text.unicode_words().count())
            .sum()
    }

    /// Count characters in literal text
    pub fn char_count(&self) -> usize {
        self.text_leaves()
            .map(|token| token.text.chars().count())
            .sum()
    }

    fn text_leaves(&self) -> impl Iterator<Item = &Token> {
        self.tokens
            .flatten()
            .into_iter()
            .filter(|token| token.kind == RuleKind::Text)
    }
}
