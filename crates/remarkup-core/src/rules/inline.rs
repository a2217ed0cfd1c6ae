// SPDX-License-Identifier: AGPL-3.0-or-later
//! Inline formatting wrapped in a symmetric delimiter

use crate::parser::MatchContext;
use crate::token::{Attributes, RuleKind};
use crate::traits::{Rule, RuleMatch};

/// `**bold**`, `//italic//`, `__underline__`, `~~deleted~~`, `!!highlight!!`
pub struct DelimitedRule {
    kind: RuleKind,
    delimiter: &'static str,
    open_tag: &'static str,
    close_tag: &'static str,
}

impl DelimitedRule {
    pub const fn new(
        kind: RuleKind,
        delimiter: &'static str,
        open_tag: &'static str,
        close_tag: &'static str,
    ) -> Self {
        Self {
            kind,
            delimiter,
            open_tag,
            close_tag,
        }
    }

    pub const fn bold() -> Self {
        Self::new(RuleKind::Bold, "**", "<strong>", "</strong>")
    }

    pub const fn italic() -> Self {
        Self::new(RuleKind::Italic, "//", "<em>", "</em>")
    }

    pub const fn underline() -> Self {
        Self::new(RuleKind::Underline, "__", "<u>", "</u>")
    }

    pub const fn strikethrough() -> Self {
        Self::new(RuleKind::Strikethrough, "~~", "<del>", "</del>")
    }

    pub const fn highlight() -> Self {
        Self::new(
            RuleKind::Highlight,
            "!!",
            r#"<span class="remarkup-highlight">"#,
            "</span>",
        )
    }
}

impl Rule for DelimitedRule {
    fn kind(&self) -> RuleKind {
        self.kind
    }

    fn disallowed_parents(&self) -> &'static [RuleKind] {
        match self.kind {
            RuleKind::Bold => &[RuleKind::Bold],
            RuleKind::Italic => &[RuleKind::Italic],
            RuleKind::Underline => &[RuleKind::Underline],
            RuleKind::Strikethrough => &[RuleKind::Strikethrough],
            RuleKind::Highlight => &[RuleKind::Highlight],
            _ => &[],
        }
    }

    fn try_match(&self, ctx: &MatchContext<'_>, remaining: &str) -> Option<RuleMatch> {
        let body = remaining.strip_prefix(self.delimiter)?;
        // The closing delimiter needs at least one character in between
        let first = body.chars().next()?.len_utf8();
        let close = first + body[first..].find(self.delimiter)?;
        let inner = &body[..close];
        if inner.trim().is_empty() || inner.contains("\n\n") {
            return None;
        }

        let output = ctx.parse_inner(self.kind, inner, self.delimiter.len());
        let html = format!("{}{}{}", self.open_tag, output.html, self.close_tag);
        Some(RuleMatch::new(close + 2 * self.delimiter.len(), html).with_inner(output))
    }

    fn from_xml(&self, _kind: RuleKind, inner: &str, _attributes: &Attributes) -> String {
        format!("{0}{inner}{0}", self.delimiter)
    }
}
