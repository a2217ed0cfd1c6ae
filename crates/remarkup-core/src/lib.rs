// SPDX-License-Identifier: AGPL-3.0-or-later
//! Remarkup Core - Token model, rule dispatcher and pseudo-XML converters
//!
//! This crate provides:
//! - A pluggable grammar of stateless rules, tried in priority order
//! - A dispatcher producing HTML and a token tree with exact source offsets
//! - An exporter turning the token tree into pseudo-XML for external tools
//! - A tolerant importer turning (possibly damaged) pseudo-XML back into Remarkup

pub mod engine;
pub mod grammar;
pub mod html;
pub mod parser;
pub mod rules;
pub mod token;
pub mod traits;
pub mod xml;

pub use engine::RemarkupEngine;
pub use grammar::Grammar;
pub use parser::{Dispatcher, MatchContext, ParserContext};
pub use token::{Attributes, LinkedObject, ObjectKind, ParseOutput, RuleKind, Token, TokenList};
pub use traits::{ConversionError, ParseConfig, Result, Rule, RuleMatch, DEFAULT_PRIORITY};
