// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shielding of untranslatable subtrees
//!
//! Code and verbatim text must reach the translated document byte for byte.
//! Before the pseudo-XML is handed to a backend each such subtree is swapped
//! for an empty `<UT i="n"></UT>` placeholder and restored afterwards.

use once_cell::sync::Lazy;
use regex::Regex;
use remarkup_core::xml::{find_closing_tag, tokenize, BrokenXmlToken};
use remarkup_core::{ConversionError, RuleKind};
use tracing::{debug, warn};

/// Kinds whose subtrees are never translated
pub const UNTRANSLATABLE: [RuleKind; 3] = [RuleKind::CodeBlock, RuleKind::Monospace, RuleKind::Literal];

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<UT\s+i\s*=\s*["'](\d+)["']\s*(?:/>|>\s*</UT\s*>)"#).unwrap()
});

fn is_untranslatable(name: &str) -> bool {
    RuleKind::from_tag_name(name).is_some_and(|kind| UNTRANSLATABLE.contains(&kind))
}

/// Pseudo-XML with its untranslatable subtrees stashed away
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShieldedDocument {
    pub text: String,
    pub fragments: Vec<String>,
}

impl ShieldedDocument {
    /// Put the stashed fragments back into (translated) text
    pub fn unshield(&self, text: &str) -> String {
        unshield(text, &self.fragments)
    }
}

/// Replace every untranslatable subtree with a placeholder
///
/// Every opening tag must be closed; a document whose structure is already
/// broken cannot be shielded reliably.
pub fn shield(xml: &str) -> Result<ShieldedDocument, ConversionError> {
    let tokens = tokenize(xml);
    let mut text = String::with_capacity(xml.len());
    let mut fragments = Vec::new();
    let mut pos = 0;
    let mut index = 0;

    while index < tokens.len() {
        let token = &tokens[index];
        match token {
            BrokenXmlToken::OpeningTag { start, name, .. } => {
                let close = find_closing_tag(&tokens, index, name).ok_or_else(|| {
                    ConversionError::UnclosedTag {
                        tag: name.clone(),
                        offset: *start,
                    }
                })?;
                if is_untranslatable(name) {
                    let end = tokens[close].end();
                    text.push_str(&xml[pos..*start]);
                    push_placeholder(&mut text, fragments.len());
                    fragments.push(xml[*start..end].to_string());
                    pos = end;
                    index = close;
                }
            }
            BrokenXmlToken::AutoCloseTag { start, name, .. } if is_untranslatable(name) => {
                text.push_str(&xml[pos..*start]);
                push_placeholder(&mut text, fragments.len());
                fragments.push(xml[*start..token.end()].to_string());
                pos = token.end();
            }
            _ => {}
        }
        index += 1;
    }
    text.push_str(&xml[pos..]);

    debug!(fragments = fragments.len(), "shielded untranslatable content");
    Ok(ShieldedDocument { text, fragments })
}

fn push_placeholder(out: &mut String, index: usize) {
    out.push_str(&format!(r#"<UT i="{index}"></UT>"#));
}

/// Replace placeholders with their fragments, last placeholder first
///
/// Placeholders pointing at no fragment are left alone; fragments whose
/// placeholder the backend dropped are lost and logged.
pub fn unshield(text: &str, fragments: &[String]) -> String {
    let mut out = text.to_string();
    let mut restored = vec![false; fragments.len()];

    let placeholders: Vec<_> = PLACEHOLDER
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let index = caps.get(1)?.as_str().parse::<usize>().ok()?;
            Some((whole.range(), index))
        })
        .collect();

    for (range, index) in placeholders.into_iter().rev() {
        let Some(fragment) = fragments.get(index) else {
            warn!(index, "placeholder refers to no shielded fragment");
            continue;
        };
        out.replace_range(range, fragment);
        restored[index] = true;
    }

    for (index, _) in restored.iter().enumerate().filter(|(_, done)| !**done) {
        warn!(index, "shielded fragment lost during translation");
    }
    out
}
