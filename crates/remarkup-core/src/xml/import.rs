// SPDX-License-Identifier: AGPL-3.0-or-later
//! Pseudo-XML → Remarkup

use super::repair_newline_markers;
use super::tokenizer::{find_closing_tag, tokenize, BrokenXmlToken};
use crate::grammar::Grammar;
use crate::html::decode_entities;
use crate::token::RuleKind;
use crate::traits::{ConversionError, Result};
use tracing::{debug, warn};

/// Rebuild Remarkup from pseudo-XML
///
/// A tag no rule owns aborts the import and hands back the input untouched.
/// An opening tag without a closing tag is an error: the intermediate text
/// was corrupted and guessing would silently drop content.
pub fn from_xml(grammar: &Grammar, xml: &str, top_level: bool) -> Result<String> {
    if !top_level {
        return Ok(import_fragment(grammar, xml)?.unwrap_or_else(|| xml.to_string()));
    }

    let repaired = repair_newline_markers(xml);
    match import_fragment(grammar, &repaired)? {
        Some(markup) => {
            let markup = decode_entities(&markup).trim().to_string();
            debug!(bytes = markup.len(), "imported pseudo-XML");
            Ok(markup)
        }
        None => Ok(xml.to_string()),
    }
}

/// `Ok(None)` when a tag without an owning rule was found
fn import_fragment(grammar: &Grammar, xml: &str) -> Result<Option<String>> {
    let tokens = tokenize(xml);
    let mut out = String::with_capacity(xml.len());
    let mut index = 0;

    while index < tokens.len() {
        match &tokens[index] {
            BrokenXmlToken::Text { text, .. } => out.push_str(text),
            BrokenXmlToken::ClosingTag { start, length, .. } => {
                out.push_str(&xml[*start..start + length]);
            }
            BrokenXmlToken::AutoCloseTag {
                name, attributes, ..
            } => {
                if name == newline_tag() {
                    out.push('\n');
                } else {
                    let Some((kind, rule)) = grammar.rule_for_tag(name) else {
                        return Ok(unknown_tag(name));
                    };
                    out.push_str(&rule.from_xml(kind, "", attributes));
                }
            }
            BrokenXmlToken::OpeningTag {
                start,
                name,
                attributes,
                ..
            } => {
                let owner = if name == newline_tag() {
                    None
                } else {
                    let Some(owner) = grammar.rule_for_tag(name) else {
                        return Ok(unknown_tag(name));
                    };
                    Some(owner)
                };

                let close = find_closing_tag(&tokens, index, name).ok_or_else(|| {
                    ConversionError::UnclosedTag {
                        tag: name.clone(),
                        offset: *start,
                    }
                })?;

                match owner {
                    None => out.push('\n'),
                    Some((kind, rule)) => {
                        let inner = &xml[tokens[index].end()..tokens[close].start()];
                        let Some(inner_markup) = import_fragment(grammar, inner)? else {
                            return Ok(None);
                        };
                        out.push_str(&rule.from_xml(kind, &inner_markup, attributes));
                    }
                }
                index = close;
            }
        }
        index += 1;
    }

    Ok(Some(out))
}

fn newline_tag() -> &'static str {
    RuleKind::Newline.tag_name().unwrap_or("N")
}

fn unknown_tag(name: &str) -> Option<String> {
    warn!(tag = name, "no rule owns tag, leaving pseudo-XML untouched");
    None
}
