// SPDX-License-Identifier: AGPL-3.0-or-later
//! Rules whose content is taken verbatim

use crate::html::escape_html;
use crate::parser::MatchContext;
use crate::token::{Attributes, RuleKind, Token};
use crate::traits::{Rule, RuleMatch};
use crate::xml::XmlWriter;

const FENCE: &str = "```";
const LITERAL_MARK: &str = "%%%";

/// `` `code` ``
pub struct MonospaceRule;

impl Rule for MonospaceRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Monospace
    }

    fn priority(&self) -> i32 {
        400
    }

    fn try_match(&self, _ctx: &MatchContext<'_>, remaining: &str) -> Option<RuleMatch> {
        let body = remaining.strip_prefix('`')?;
        let close = body.find('`')?;
        let inner = &body[..close];
        if inner.is_empty() || inner.contains('\n') {
            return None;
        }
        let html = format!(
            r#"<tt class="remarkup-monospaced">{}</tt>"#,
            escape_html(inner)
        );
        Some(RuleMatch::new(close + 2, html))
    }

    fn to_xml(&self, token: &Token, writer: &mut XmlWriter<'_>) {
        let inner = &token.text[1..token.text.len() - 1];
        writer.text_element("Monospace", &token.attributes, inner);
    }

    fn from_xml(&self, _kind: RuleKind, inner: &str, _attributes: &Attributes) -> String {
        format!("`{inner}`")
    }
}

/// `%%%text that is never formatted%%%`
pub struct LiteralRule;

impl Rule for LiteralRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Literal
    }

    fn priority(&self) -> i32 {
        110
    }

    fn try_match(&self, _ctx: &MatchContext<'_>, remaining: &str) -> Option<RuleMatch> {
        let body = remaining.strip_prefix(LITERAL_MARK)?;
        let first = body.chars().next()?.len_utf8();
        let close = first + body[first..].find(LITERAL_MARK)?;
        let inner = &body[..close];
        let html = format!(
            r#"<p class="remarkup-literal">{}</p>"#,
            escape_html(inner).replace('\n', "<br />\n")
        );
        Some(RuleMatch::new(close + 2 * LITERAL_MARK.len(), html))
    }

    fn to_xml(&self, token: &Token, writer: &mut XmlWriter<'_>) {
        let inner = &token.text[LITERAL_MARK.len()..token.text.len() - LITERAL_MARK.len()];
        writer.text_element("Literal", &token.attributes, inner);
    }

    fn from_xml(&self, _kind: RuleKind, inner: &str, _attributes: &Attributes) -> String {
        format!("{LITERAL_MARK}{inner}{LITERAL_MARK}")
    }
}

/// Fenced code block, optionally tagged with a language
///
/// ```text
/// ```rust
/// fn main() {}
/// ```
/// ```
pub struct CodeBlockRule;

/// Code between the fences of a consumed block
fn code_body(text: &str) -> &str {
    let Some(first_break) = text.find('\n') else {
        return "";
    };
    let body_start = first_break + 1;
    let body_end = text.len() - FENCE.len();
    if body_end > body_start {
        &text[body_start..body_end - 1]
    } else {
        ""
    }
}

impl Rule for CodeBlockRule {
    fn kind(&self) -> RuleKind {
        RuleKind::CodeBlock
    }

    fn priority(&self) -> i32 {
        100
    }

    fn try_match(&self, ctx: &MatchContext<'_>, remaining: &str) -> Option<RuleMatch> {
        if !ctx.starts_on_new_line() {
            return None;
        }
        let header = remaining.strip_prefix(FENCE)?;
        let first_break = header.find('\n')?;
        let lang = header[..first_break].trim();
        if lang.contains(char::is_whitespace) || lang.contains('`') {
            return None;
        }

        let body_start = FENCE.len() + first_break + 1;
        let after = &remaining[body_start..];
        let length = if after.starts_with(FENCE) {
            body_start + FENCE.len()
        } else {
            body_start + after.find("\n```")? + 1 + FENCE.len()
        };

        let body = code_body(&remaining[..length]);
        let mut html = String::from(r#"<pre class="remarkup-code""#);
        if !lang.is_empty() {
            html.push_str(&format!(r#" data-lang="{}""#, escape_html(lang)));
        }
        html.push('>');
        html.push_str(&escape_html(body));
        html.push_str("</pre>");

        let matched = RuleMatch::new(length, html);
        Some(if lang.is_empty() {
            matched
        } else {
            matched.with_attribute("lang", lang)
        })
    }

    fn to_xml(&self, token: &Token, writer: &mut XmlWriter<'_>) {
        writer.text_element("CodeBlock", &token.attributes, code_body(&token.text));
    }

    fn from_xml(&self, _kind: RuleKind, inner: &str, attributes: &Attributes) -> String {
        let lang = attributes.get("lang").map(String::as_str).unwrap_or("");
        if inner.is_empty() {
            format!("{FENCE}{lang}\n{FENCE}")
        } else {
            format!("{FENCE}{lang}\n{inner}\n{FENCE}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RemarkupEngine;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_monospace_is_not_formatted() {
        let engine = RemarkupEngine::new();
        assert_eq!(
            engine.to_html("run `**x** < y`"),
            r#"run <tt class="remarkup-monospaced">**x** &lt; y</tt>"#
        );
        assert_eq!(engine.to_xml("`a<b`"), "<Monospace>a&lt;b</Monospace>");
    }

    #[test]
    fn test_literal_block() {
        let engine = RemarkupEngine::new();
        assert_eq!(
            engine.to_html("%%%//raw//%%%"),
            r#"<p class="remarkup-literal">//raw//</p>"#
        );
        assert_eq!(engine.to_xml("%%%//raw//%%%"), "<Literal>//raw//</Literal>");
    }

    #[test]
    fn test_code_block_with_language() {
        let engine = RemarkupEngine::new();
        let markup = "```rust\nfn main() {}\n```";
        assert_eq!(
            engine.to_html(markup),
            r#"<pre class="remarkup-code" data-lang="rust">fn main() {}</pre>"#
        );
        assert_eq!(
            engine.to_xml(markup),
            r#"<CodeBlock lang="rust">fn main() {}</CodeBlock>"#
        );
    }

    #[test]
    fn test_code_body() {
        assert_eq!(code_body("```\ncode\n```"), "code");
        assert_eq!(code_body("```\n```"), "");
        assert_eq!(code_body("```x\na\nb\n```"), "a\nb");
    }

    #[test]
    fn test_code_block_requires_line_start() {
        let engine = RemarkupEngine::new();
        let tokens = engine.parse("x ```\ncode\n```").tokens;
        assert!(tokens.iter().all(|t| t.kind != RuleKind::CodeBlock));
    }
}
