// SPDX-License-Identifier: AGPL-3.0-or-later
//! Bulleted and numbered lists

use super::{leading_lines, span_of};
use crate::parser::MatchContext;
use crate::token::{Attributes, RuleKind, Token};
use crate::traits::{Rule, RuleMatch};
use once_cell::sync::Lazy;
use regex::Regex;

/// Indent, marker, separating whitespace
static ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([ \t]*)([-*]+|#+|\d+[.)])([ \t]+)\S").unwrap());

/// Consecutive lines starting with `-`, `*`, `#` or `1.`
///
/// Nesting follows indentation (two columns per level) or a repeated
/// marker (`--`, `##`). Each line becomes a `ListItem` whose `prefix`
/// attribute keeps the exact indent and marker.
pub struct ListRule;

struct ItemLine<'t> {
    offset: usize,
    line: &'t str,
    prefix_len: usize,
    depth: usize,
    ordered: bool,
}

fn item_line(offset: usize, line: &str) -> Option<ItemLine<'_>> {
    let caps = ITEM.captures(line)?;
    let indent = caps.get(1).map_or("", |m| m.as_str());
    let marker = caps.get(2).map_or("", |m| m.as_str());
    let prefix_len = caps.get(3).map_or(0, |m| m.end());

    let indent_width: usize = indent.chars().map(|c| if c == '\t' { 2 } else { 1 }).sum();
    let ordered = !marker.starts_with(['-', '*']);
    let repeats = if marker.starts_with(|c: char| c.is_ascii_digit()) {
        0
    } else {
        marker.len() - 1
    };

    Some(ItemLine {
        offset,
        line,
        prefix_len,
        depth: indent_width / 2 + repeats,
        ordered,
    })
}

/// Nested `<ul>`/`<ol>` markup for rendered items
fn render_items(items: &[(usize, bool, String)]) -> String {
    let mut html = String::new();
    let mut open: Vec<&str> = Vec::new();

    for (depth, ordered, item_html) in items {
        // A list can only open one level deeper than the current one
        let target = (depth + 1).min(open.len() + 1);
        if target > open.len() {
            let tag = if *ordered { "ol" } else { "ul" };
            html.push_str(&format!(r#"<{tag} class="remarkup-list">"#));
            open.push(tag);
        } else {
            while open.len() > target {
                if let Some(tag) = open.pop() {
                    html.push_str(&format!("</li></{tag}>"));
                }
            }
            html.push_str("</li>");
        }
        html.push_str("<li>");
        html.push_str(item_html);
    }
    while let Some(tag) = open.pop() {
        html.push_str(&format!("</li></{tag}>"));
    }
    html
}

impl Rule for ListRule {
    fn kind(&self) -> RuleKind {
        RuleKind::List
    }

    fn component_kinds(&self) -> &'static [RuleKind] {
        &[RuleKind::ListItem]
    }

    fn priority(&self) -> i32 {
        230
    }

    fn try_match(&self, ctx: &MatchContext<'_>, remaining: &str) -> Option<RuleMatch> {
        if !ctx.starts_on_new_line() {
            return None;
        }
        let lines = leading_lines(remaining, |line| ITEM.is_match(line));
        if lines.is_empty() {
            return None;
        }

        let mut children = Vec::with_capacity(lines.len());
        let mut linked_objects = Vec::new();
        let mut rendered = Vec::with_capacity(lines.len());
        for item in lines.iter().filter_map(|(offset, line)| item_line(*offset, line)) {
            let content = &item.line[item.prefix_len..];
            let output = ctx.parse_inner(RuleKind::ListItem, content, item.offset + item.prefix_len);
            rendered.push((item.depth, item.ordered, output.html));
            linked_objects.extend(output.linked_objects);
            children.push(
                Token::new(RuleKind::ListItem, ctx.offset + item.offset, item.line)
                    .with_attribute("prefix", &item.line[..item.prefix_len])
                    .with_children(output.tokens.into_vec()),
            );
        }

        let mut matched =
            RuleMatch::new(span_of(&lines), render_items(&rendered)).with_children(children);
        matched.linked_objects = linked_objects;
        Some(matched)
    }

    fn from_xml(&self, kind: RuleKind, inner: &str, attributes: &Attributes) -> String {
        match kind {
            RuleKind::ListItem => {
                let prefix = attributes.get("prefix").map(String::as_str).unwrap_or("- ");
                format!("{prefix}{inner}\n")
            }
            _ => inner.strip_suffix('\n').unwrap_or(inner).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RemarkupEngine;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flat_list() {
        let engine = RemarkupEngine::new();
        assert_eq!(
            engine.to_html("- a\n- **b**"),
            r#"<ul class="remarkup-list"><li>a</li><li><strong>b</strong></li></ul>"#
        );
    }

    #[test]
    fn test_nested_by_indent_and_repeated_marker() {
        let engine = RemarkupEngine::new();
        let expected = concat!(
            r#"<ul class="remarkup-list"><li>a"#,
            r#"<ul class="remarkup-list"><li>b</li></ul>"#,
            "</li><li>c</li></ul>"
        );
        assert_eq!(engine.to_html("- a\n  - b\n- c"), expected);
        assert_eq!(engine.to_html("- a\n-- b\n- c"), expected);
    }

    #[test]
    fn test_ordered_markers() {
        let engine = RemarkupEngine::new();
        assert_eq!(
            engine.to_html("# one\n# two"),
            r#"<ol class="remarkup-list"><li>one</li><li>two</li></ol>"#
        );
        assert_eq!(
            engine.to_html("1. one\n2) two"),
            r#"<ol class="remarkup-list"><li>one</li><li>two</li></ol>"#
        );
    }

    #[test]
    fn test_item_offsets_and_prefix() {
        let engine = RemarkupEngine::new();
        let output = engine.parse("x\n  * item");
        let list = &output.tokens.as_slice()[2];
        assert_eq!(list.kind, RuleKind::List);
        let item = &list.children[0];
        assert_eq!(item.attribute("prefix"), Some("  * "));
        assert_eq!(item.start, 2);
        assert_eq!(item.children[0].start, 6);
        assert_eq!(item.children[0].text, "item");
    }

    #[test]
    fn test_marker_needs_space() {
        let engine = RemarkupEngine::new();
        let output = engine.parse("-a\n**b**");
        assert!(output.tokens.iter().all(|t| t.kind != RuleKind::List));
    }

    #[test]
    fn test_round_trip_keeps_prefixes() {
        let engine = RemarkupEngine::new();
        let markup = "- a\n  - b\n1. c";
        let xml = engine.to_xml(markup);
        assert_eq!(engine.from_xml(&xml).unwrap(), markup);
    }
}
