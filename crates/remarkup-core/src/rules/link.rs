// SPDX-License-Identifier: AGPL-3.0-or-later
//! Hyperlinks and object references

use crate::html::escape_html;
use crate::parser::MatchContext;
use crate::token::{Attributes, LinkedObject, ObjectKind, RuleKind, Token};
use crate::traits::{Rule, RuleMatch};
use crate::xml::XmlWriter;
use once_cell::sync::Lazy;
use regex::Regex;

static BARE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^(?:https?://|mailto:)[^\s<>\[\]{}"|]+"#).unwrap());
static OBJECT_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{([FTM])(\d+)((?:,|\s)[^}\n]*)?\}").unwrap());

/// `[[target]]`, `[[target|description]]` or a bare `https://...` URL
///
/// Targets that are not URLs are wiki pages and resolve against
/// [`crate::ParseConfig::base_url`].
pub struct HyperlinkRule;

fn is_url(target: &str) -> bool {
    target.contains("://") || target.starts_with("mailto:") || target.starts_with('/')
}

impl HyperlinkRule {
    fn href(ctx: &MatchContext<'_>, target: &str) -> String {
        if is_url(target) {
            return target.to_string();
        }
        let slug = target.to_lowercase().replace(' ', "_");
        format!("{}{}/", ctx.config().base_url, urlencoding::encode(&slug))
    }

    fn match_bracketed(ctx: &MatchContext<'_>, remaining: &str) -> Option<RuleMatch> {
        let body = remaining.strip_prefix("[[")?;
        let close = body.find("]]")?;
        let inner = &body[..close];
        if inner.contains('\n') {
            return None;
        }

        let (target, description) = match inner.split_once('|') {
            Some((target, description)) => (target.trim(), Some(description)),
            None => (inner.trim(), None),
        };
        if target.is_empty() {
            return None;
        }

        let href = escape_html(&Self::href(ctx, target)).into_owned();
        let length = close + 4;
        let mut matched = match description.filter(|d| !d.trim().is_empty()) {
            Some(description) => {
                let trimmed = description.trim_start();
                let offset = 2 + inner.len() - description.len() + (description.len() - trimmed.len());
                let output = ctx.parse_inner(RuleKind::Hyperlink, trimmed.trim_end(), offset);
                let html = format!(r#"<a href="{href}" class="remarkup-link">{}</a>"#, output.html);
                RuleMatch::new(length, html).with_inner(output)
            }
            None => RuleMatch::new(
                length,
                format!(r#"<a href="{href}" class="remarkup-link">{}</a>"#, escape_html(target)),
            ),
        };
        matched = matched.with_attribute("url", target);
        Some(matched)
    }

    fn match_bare(ctx: &MatchContext<'_>, remaining: &str) -> Option<RuleMatch> {
        if !ctx.starts_after_whitespace() {
            return None;
        }
        let found = BARE_URL.find(remaining)?;
        let url = found
            .as_str()
            .trim_end_matches(['.', ',', ';', ':', '!', '?', ')', '\'']);
        if url.ends_with("://") || url == "mailto" {
            return None;
        }
        let escaped = escape_html(url);
        let html = format!(
            r#"<a href="{escaped}" class="remarkup-link" rel="noreferrer">{escaped}</a>"#
        );
        Some(
            RuleMatch::new(url.len(), html)
                .with_attribute("url", url)
                .with_attribute("bare", "true"),
        )
    }
}

impl Rule for HyperlinkRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Hyperlink
    }

    fn priority(&self) -> i32 {
        410
    }

    fn disallowed_parents(&self) -> &'static [RuleKind] {
        &[RuleKind::Hyperlink]
    }

    fn try_match(&self, ctx: &MatchContext<'_>, remaining: &str) -> Option<RuleMatch> {
        Self::match_bracketed(ctx, remaining).or_else(|| Self::match_bare(ctx, remaining))
    }

    fn to_xml(&self, token: &Token, writer: &mut XmlWriter<'_>) {
        if token.children.is_empty() {
            writer.auto_close("Hyperlink", &token.attributes);
        } else {
            writer.element(token);
        }
    }

    fn from_xml(&self, _kind: RuleKind, inner: &str, attributes: &Attributes) -> String {
        let url = attributes.get("url").map(String::as_str).unwrap_or("");
        if attributes.get("bare").is_some_and(|b| b == "true") {
            url.to_string()
        } else if inner.is_empty() {
            format!("[[{url}]]")
        } else {
            format!("[[{url}|{inner}]]")
        }
    }
}

/// `{F42}`, `{T7}`, `{M3, size=full}`
///
/// Never translated; the referenced object is reported as linked.
pub struct ObjectReferenceRule;

impl Rule for ObjectReferenceRule {
    fn kind(&self) -> RuleKind {
        RuleKind::ObjectReference
    }

    fn priority(&self) -> i32 {
        420
    }

    fn try_match(&self, _ctx: &MatchContext<'_>, remaining: &str) -> Option<RuleMatch> {
        let caps = OBJECT_REFERENCE.captures(remaining)?;
        let whole = caps.get(0)?;
        let prefix = caps.get(1)?.as_str().chars().next()?;
        let kind = ObjectKind::from_prefix(prefix)?;
        let id = caps.get(2)?.as_str().parse::<u64>().ok()?;
        let object = LinkedObject::new(kind, id);

        let identifier = object.identifier();
        let html = format!(r#"<a class="remarkup-object" href="/{identifier}">{identifier}</a>"#);
        Some(
            RuleMatch::new(whole.end(), html)
                .with_attribute("type", prefix.to_string())
                .with_linked_object(object),
        )
    }

    fn to_xml(&self, token: &Token, writer: &mut XmlWriter<'_>) {
        writer.text_element("ObjectReference", &token.attributes, &token.text);
    }

    fn from_xml(&self, _kind: RuleKind, inner: &str, _attributes: &Attributes) -> String {
        inner.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RemarkupEngine;
    use crate::traits::ParseConfig;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_external_link_with_description() {
        let engine = RemarkupEngine::new();
        assert_eq!(
            engine.to_html("[[https://x.org | **the** site ]]"),
            r#"<a href="https://x.org" class="remarkup-link"><strong>the</strong> site</a>"#
        );
    }

    #[test]
    fn test_description_offsets() {
        let engine = RemarkupEngine::new();
        let markup = "[[https://x.org | site ]]";
        let output = engine.parse(markup);
        let link = &output.tokens.as_slice()[0];
        let child = &link.children[0];
        assert_eq!(&markup[child.start..child.end()], "site");
    }

    #[test]
    fn test_wiki_link_uses_base_url() {
        let engine = RemarkupEngine::with_config(ParseConfig {
            base_url: "/wiki/".to_string(),
        });
        assert_eq!(
            engine.to_html("[[Getting Started]]"),
            r#"<a href="/wiki/getting_started/" class="remarkup-link">Getting Started</a>"#
        );
    }

    #[test]
    fn test_bare_url() {
        let engine = RemarkupEngine::new();
        assert_eq!(
            engine.to_html("see https://x.org/a."),
            r#"see <a href="https://x.org/a" class="remarkup-link" rel="noreferrer">https://x.org/a</a>."#
        );
        let xml = engine.to_xml("see https://x.org/a");
        assert_eq!(xml, r#"see <Hyperlink bare="true" url="https://x.org/a" />"#);
        assert_eq!(engine.from_xml(&xml).unwrap(), "see https://x.org/a");
    }

    #[test]
    fn test_bare_url_needs_whitespace_before() {
        let engine = RemarkupEngine::new();
        let output = engine.parse("xhttps://x.org");
        assert!(output.tokens.iter().all(|t| t.kind != RuleKind::Hyperlink));
    }

    #[test]
    fn test_object_reference() {
        let engine = RemarkupEngine::new();
        let output = engine.parse("{T7, layout=link}");
        assert_eq!(
            output.html,
            r#"<a class="remarkup-object" href="/T7">T7</a>"#
        );
        assert_eq!(output.linked_objects, vec![LinkedObject::new(ObjectKind::Task, 7)]);
        assert_eq!(
            engine.from_xml(r#"<ObjectReference type="T">{T7, layout=link}</ObjectReference>"#).unwrap(),
            "{T7, layout=link}"
        );
    }

    #[test]
    fn test_malformed_object_reference_is_text() {
        let engine = RemarkupEngine::new();
        for markup in ["{X1}", "{F}", "{F1x}", "{F99999999999999999999999}"] {
            assert!(engine.parse(markup).linked_objects.is_empty(), "{markup}");
        }
    }
}
