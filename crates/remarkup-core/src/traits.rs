// SPDX-License-Identifier: AGPL-3.0-or-later
//! Rule trait and shared parse types
//!
//! A rule is a stateless descriptor: it inspects the remaining input and
//! either declines or returns an explicit [`RuleMatch`]. The dispatcher turns
//! the match into an immutable [`Token`], so nothing leaks between matches and
//! one grammar can serve any number of documents concurrently.

use crate::parser::MatchContext;
use crate::token::{Attributes, LinkedObject, ParseOutput, RuleKind, Token};
use crate::xml::XmlWriter;
use serde::{Deserialize, Serialize};

/// Error type for markup conversion
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// An opening tag in the pseudo-XML has no matching closing tag
    #[error("Unclosed <{tag}> tag at offset {offset}")]
    UnclosedTag { tag: String, offset: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConversionError>;

/// Priority given to rules that do not declare one
pub const DEFAULT_PRIORITY: i32 = 500;

/// Configuration for parsing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Prefix for wiki links such as `[[ getting started ]]`
    pub base_url: String,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            base_url: "/w/".to_string(),
        }
    }
}

/// Outcome of a successful [`Rule::try_match`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleMatch {
    /// Bytes consumed from the remaining input
    pub length: usize,
    pub html: String,
    pub attributes: Attributes,
    pub children: Vec<Token>,
    pub linked_objects: Vec<LinkedObject>,
}

impl RuleMatch {
    pub fn new(length: usize, html: impl Into<String>) -> Self {
        Self {
            length,
            html: html.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Adopt the tokens and linked objects of a nested parse
    pub fn with_inner(mut self, inner: ParseOutput) -> Self {
        self.children.extend(inner.tokens.into_vec());
        self.linked_objects.extend(inner.linked_objects);
        self
    }

    pub fn with_children(mut self, children: Vec<Token>) -> Self {
        self.children = children;
        self
    }

    pub fn with_linked_object(mut self, object: LinkedObject) -> Self {
        self.linked_objects.push(object);
        self
    }
}

/// A pluggable grammar rule
pub trait Rule: Send + Sync {
    /// Kind of the tokens this rule produces
    fn kind(&self) -> RuleKind;

    /// Extra kinds whose pseudo-XML this rule owns (list items, table cells)
    fn component_kinds(&self) -> &'static [RuleKind] {
        &[]
    }

    /// Lower values are tried first
    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    /// Caller kinds inside which this rule must not match
    fn disallowed_parents(&self) -> &'static [RuleKind] {
        &[]
    }

    /// Try to consume a non-empty prefix of `remaining`
    fn try_match(&self, ctx: &MatchContext<'_>, remaining: &str) -> Option<RuleMatch>;

    /// Write a token produced by this rule as pseudo-XML
    fn to_xml(&self, token: &Token, writer: &mut XmlWriter<'_>) {
        writer.element(token);
    }

    /// Turn imported inner markup and tag attributes back into Remarkup
    fn from_xml(&self, kind: RuleKind, inner: &str, attributes: &Attributes) -> String;
}
