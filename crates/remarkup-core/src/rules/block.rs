// SPDX-License-Identifier: AGPL-3.0-or-later
//! Line-oriented block rules
//!
//! Block rules only match at the start of a line and never consume the line
//! break that ends them; that is left to [`NewlineRule`] so the exporter can
//! emit a marker for it.

use super::{leading_lines, line_len, span_of};
use crate::parser::MatchContext;
use crate::token::{Attributes, RuleKind, Token};
use crate::traits::{Rule, RuleMatch};
use crate::xml::XmlWriter;

/// `\n` or `\r\n`
pub struct NewlineRule;

impl Rule for NewlineRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Newline
    }

    fn priority(&self) -> i32 {
        300
    }

    fn try_match(&self, ctx: &MatchContext<'_>, remaining: &str) -> Option<RuleMatch> {
        let length = if remaining.starts_with("\r\n") {
            2
        } else if remaining.starts_with('\n') {
            1
        } else {
            return None;
        };
        let html = match ctx.previous {
            None => "\n",
            Some(kind) if kind.is_block() => "\n",
            Some(_) => "<br />\n",
        };
        Some(RuleMatch::new(length, html))
    }

    fn from_xml(&self, _kind: RuleKind, _inner: &str, _attributes: &Attributes) -> String {
        "\n".to_string()
    }
}

/// `== Title ==`, closing marks optional
pub struct HeaderRule;

const MAX_HEADER_LEVEL: usize = 6;

impl Rule for HeaderRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Header
    }

    fn priority(&self) -> i32 {
        200
    }

    fn try_match(&self, ctx: &MatchContext<'_>, remaining: &str) -> Option<RuleMatch> {
        if !ctx.starts_on_new_line() {
            return None;
        }
        let line = remaining[..line_len(remaining)].trim_end_matches('\r');
        let level = line.len() - line.trim_start_matches('=').len();
        if level == 0 || level > MAX_HEADER_LEVEL {
            return None;
        }

        let after_marks = &line[level..];
        let content = after_marks.trim_start_matches([' ', '\t']);
        if content.len() == after_marks.len() {
            return None;
        }
        let content_start = line.len() - content.len();

        let trimmed = content.trim_end();
        let without_closing = trimmed.trim_end_matches('=');
        let closing = trimmed.len() - without_closing.len();
        let title = without_closing.trim_end();
        if title.is_empty() {
            return None;
        }

        let output = ctx.parse_inner(RuleKind::Header, title, content_start);
        let html = format!("<h{level}>{}</h{level}>", output.html);
        let mut matched = RuleMatch::new(line.len(), html)
            .with_attribute("level", level.to_string())
            .with_inner(output);
        if closing > 0 {
            matched = matched.with_attribute("closing", closing.to_string());
        }
        Some(matched)
    }

    fn from_xml(&self, _kind: RuleKind, inner: &str, attributes: &Attributes) -> String {
        let level = attributes
            .get("level")
            .and_then(|level| level.parse::<usize>().ok())
            .unwrap_or(1)
            .clamp(1, MAX_HEADER_LEVEL);
        let marks = "=".repeat(level);
        match attributes.get("closing").and_then(|n| n.parse::<usize>().ok()) {
            Some(closing) if closing > 0 => format!("{marks} {inner} {}", "=".repeat(closing)),
            _ => format!("{marks} {inner}"),
        }
    }
}

/// A line holding nothing but three or more `-`, `*` or `_`
pub struct HorizontalRuleRule;

impl Rule for HorizontalRuleRule {
    fn kind(&self) -> RuleKind {
        RuleKind::HorizontalRule
    }

    fn priority(&self) -> i32 {
        210
    }

    fn try_match(&self, ctx: &MatchContext<'_>, remaining: &str) -> Option<RuleMatch> {
        if !ctx.starts_on_new_line() {
            return None;
        }
        let line = remaining[..line_len(remaining)].trim_end_matches('\r');
        let mark = line.chars().next().filter(|c| matches!(c, '-' | '*' | '_'))?;
        if line.len() < 3 || !line.chars().all(|c| c == mark) {
            return None;
        }
        Some(RuleMatch::new(line.len(), "<hr />").with_attribute("text", line))
    }

    fn to_xml(&self, token: &Token, writer: &mut XmlWriter<'_>) {
        writer.auto_close("HorizontalRule", &token.attributes);
    }

    fn from_xml(&self, _kind: RuleKind, _inner: &str, attributes: &Attributes) -> String {
        attributes
            .get("text")
            .cloned()
            .unwrap_or_else(|| "---".to_string())
    }
}

/// `NOTE: ...`, `WARNING: ...`, `IMPORTANT: ...` or the `(NOTE) ...` form,
/// running to the end of the paragraph
pub struct NotificationRule;

const NOTICE_KINDS: [&str; 3] = ["NOTE", "WARNING", "IMPORTANT"];

impl NotificationRule {
    /// Keyword, style and marker length
    fn marker(line: &str) -> Option<(&'static str, &'static str, usize)> {
        NOTICE_KINDS.iter().find_map(|keyword| {
            if line.starts_with(keyword) && line[keyword.len()..].starts_with(':') {
                Some((*keyword, "colon", keyword.len() + 1))
            } else if line.starts_with('(')
                && line[1..].starts_with(keyword)
                && line[1 + keyword.len()..].starts_with(')')
            {
                Some((*keyword, "paren", keyword.len() + 2))
            } else {
                None
            }
        })
    }
}

impl Rule for NotificationRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Notification
    }

    fn priority(&self) -> i32 {
        220
    }

    fn try_match(&self, ctx: &MatchContext<'_>, remaining: &str) -> Option<RuleMatch> {
        if !ctx.starts_on_new_line() {
            return None;
        }
        let (keyword, style, marker_len) = Self::marker(remaining)?;

        let paragraph_end = remaining.find("\n\n").unwrap_or(remaining.len());
        let paragraph = remaining[..paragraph_end].trim_end_matches(['\r', '\n']);
        let after_marker = &paragraph[marker_len..];
        let content = after_marker.trim_start_matches([' ', '\t']);
        if content.len() == after_marker.len() || content.trim().is_empty() {
            return None;
        }
        let content_start = paragraph.len() - content.len();

        let kind = keyword.to_ascii_lowercase();
        let output = ctx.parse_inner(RuleKind::Notification, content, content_start);
        let html = format!(r#"<div class="remarkup-{kind}">{}</div>"#, output.html);
        Some(
            RuleMatch::new(paragraph.len(), html)
                .with_attribute("type", kind)
                .with_attribute("style", style)
                .with_inner(output),
        )
    }

    fn from_xml(&self, _kind: RuleKind, inner: &str, attributes: &Attributes) -> String {
        let keyword = attributes
            .get("type")
            .map(|kind| kind.to_ascii_uppercase())
            .filter(|kind| NOTICE_KINDS.contains(&kind.as_str()))
            .unwrap_or_else(|| "NOTE".to_string());
        match attributes.get("style").map(String::as_str) {
            Some("paren") => format!("({keyword}) {inner}"),
            _ => format!("{keyword}: {inner}"),
        }
    }
}

/// Consecutive `>` lines
pub struct QuoteRule;

impl Rule for QuoteRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Quote
    }

    fn priority(&self) -> i32 {
        240
    }

    fn try_match(&self, ctx: &MatchContext<'_>, remaining: &str) -> Option<RuleMatch> {
        if !ctx.starts_on_new_line() {
            return None;
        }
        let lines = leading_lines(remaining, |line| line.starts_with('>'));
        if lines.is_empty() {
            return None;
        }

        let mut children = Vec::new();
        let mut linked_objects = Vec::new();
        let mut rendered = Vec::with_capacity(lines.len());
        for (index, (offset, line)) in lines.iter().enumerate() {
            if index > 0 {
                let break_at = ctx.offset + offset - 1;
                children.push(Token::new(RuleKind::Newline, break_at, "\n"));
            }
            let marker = if line.starts_with("> ") { 2 } else { 1 };
            let output = ctx.parse_inner(RuleKind::Quote, &line[marker..], offset + marker);
            rendered.push(output.html);
            children.extend(output.tokens.into_vec());
            linked_objects.extend(output.linked_objects);
        }

        let html = format!("<blockquote>{}</blockquote>", rendered.join("<br />\n"));
        let mut matched = RuleMatch::new(span_of(&lines), html).with_children(children);
        matched.linked_objects = linked_objects;
        Some(matched)
    }

    fn from_xml(&self, _kind: RuleKind, inner: &str, _attributes: &Attributes) -> String {
        inner
            .split('\n')
            .map(|line| format!("> {line}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RemarkupEngine;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_newline_html_after_inline_and_block() {
        let engine = RemarkupEngine::new();
        assert_eq!(engine.to_html("a\nb"), "a<br />\nb");
        assert_eq!(engine.to_html("= T =\nb"), "<h1>T</h1>\nb");
    }

    #[test]
    fn test_header_levels_and_closing() {
        let engine = RemarkupEngine::new();
        assert_eq!(engine.to_html("=== Third ==="), "<h3>Third</h3>");
        assert_eq!(engine.to_html("== **Open**"), "<h2><strong>Open</strong></h2>");
        assert_eq!(engine.to_xml("== T =="), r#"<Header closing="2" level="2">T</Header>"#);
        assert_eq!(engine.from_xml(r#"<Header level="2">T</Header>"#).unwrap(), "== T");
    }

    #[test]
    fn test_header_keeps_uneven_closing_marks() {
        let engine = RemarkupEngine::new();
        for markup in ["== T =", "= T ===", "=== Third ===", "== Open"] {
            let xml = engine.to_xml(markup);
            assert_eq!(engine.from_xml(&xml).unwrap(), markup, "via {xml}");
        }
        assert_eq!(engine.to_xml("== T ="), r#"<Header closing="1" level="2">T</Header>"#);
    }

    #[test]
    fn test_header_needs_space_and_title() {
        let engine = RemarkupEngine::new();
        let kinds = |text: &str| -> Vec<RuleKind> {
            engine.parse(text).tokens.iter().map(|t| t.kind).collect()
        };
        assert_eq!(kinds("==x=="), vec![RuleKind::Text]);
        assert_eq!(kinds("= ="), vec![RuleKind::Text]);
        assert_eq!(kinds("======= T"), vec![RuleKind::Text]);
    }

    #[test]
    fn test_horizontal_rule() {
        let engine = RemarkupEngine::new();
        assert_eq!(engine.to_html("a\n***\nb"), "a<br />\n<hr />\nb");
        assert_eq!(engine.to_xml("___"), r#"<HorizontalRule text="___" />"#);
        assert_eq!(engine.from_xml(r#"<HorizontalRule text="___" />"#).unwrap(), "___");
    }

    #[test]
    fn test_notification_styles() {
        let engine = RemarkupEngine::new();
        assert_eq!(
            engine.to_html("WARNING: be //careful//"),
            r#"<div class="remarkup-warning">be <em>careful</em></div>"#
        );
        assert_eq!(
            engine.to_xml("(NOTE) hi"),
            r#"<Notification style="paren" type="note">hi</Notification>"#
        );
        assert_eq!(
            engine.from_xml(r#"<Notification style="colon" type="important">x</Notification>"#).unwrap(),
            "IMPORTANT: x"
        );
    }

    #[test]
    fn test_notification_ends_at_blank_line() {
        let engine = RemarkupEngine::new();
        let tokens = engine.parse("NOTE: a\nb\n\nc").tokens;
        let first = &tokens.as_slice()[0];
        assert_eq!(first.kind, RuleKind::Notification);
        assert_eq!(first.text, "NOTE: a\nb");
    }

    #[test]
    fn test_quote_lines() {
        let engine = RemarkupEngine::new();
        assert_eq!(
            engine.to_html("> a\n> **b**"),
            "<blockquote>a<br />\n<strong>b</strong></blockquote>"
        );
        let output = engine.parse("> a\n> b");
        let quote = &output.tokens.as_slice()[0];
        let spans: Vec<_> = quote.children.iter().map(|c| (c.start, c.text.as_str())).collect();
        assert_eq!(spans, vec![(2, "a"), (3, "\n"), (6, "b")]);
        assert_eq!(engine.to_xml("> a\n> b"), "<Quote>a<N>[1]</N>b</Quote>");
        assert_eq!(engine.from_xml("<Quote>a<N>[1]</N>b</Quote>").unwrap(), "> a\n> b");
    }
}
