// SPDX-License-Identifier: AGPL-3.0-or-later
//! Built-in Remarkup rules
//!
//! | Rule | Priority |
//! |------|----------|
//! | CodeBlock | 100 |
//! | Literal | 110 |
//! | Table | 150 |
//! | Header, HorizontalRule, Notification, List, Quote | 200–240 |
//! | Newline | 300 |
//! | Monospace, Hyperlink, ObjectReference | 400–420 |
//! | Bold, Italic, Underline, Strikethrough, Highlight | 500 |

mod block;
mod inline;
mod link;
mod list;
mod literal;
mod table;

pub use block::{HeaderRule, HorizontalRuleRule, NewlineRule, NotificationRule, QuoteRule};
pub use inline::DelimitedRule;
pub use link::{HyperlinkRule, ObjectReferenceRule};
pub use list::ListRule;
pub use literal::{CodeBlockRule, LiteralRule, MonospaceRule};
pub use table::TableRule;

use crate::traits::Rule;

/// The rule set a [`crate::Grammar::with_defaults`] grammar starts with
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(CodeBlockRule),
        Box::new(LiteralRule),
        Box::new(TableRule),
        Box::new(HeaderRule),
        Box::new(HorizontalRuleRule),
        Box::new(NotificationRule),
        Box::new(ListRule),
        Box::new(QuoteRule),
        Box::new(NewlineRule),
        Box::new(MonospaceRule),
        Box::new(HyperlinkRule),
        Box::new(ObjectReferenceRule),
        Box::new(DelimitedRule::bold()),
        Box::new(DelimitedRule::italic()),
        Box::new(DelimitedRule::underline()),
        Box::new(DelimitedRule::strikethrough()),
        Box::new(DelimitedRule::highlight()),
    ]
}

/// Byte length of the first line, line break excluded
pub(crate) fn line_len(text: &str) -> usize {
    text.find('\n').unwrap_or(text.len())
}

/// Consecutive lines at the start of `text` that `accept` takes, as
/// `(offset, line)` pairs with the line break and any `\r` cut off
pub(crate) fn leading_lines<'t>(
    text: &'t str,
    mut accept: impl FnMut(&str) -> bool,
) -> Vec<(usize, &'t str)> {
    let mut lines = Vec::new();
    let mut pos = 0;
    while pos < text.len() {
        let end = pos + line_len(&text[pos..]);
        let line = text[pos..end].trim_end_matches('\r');
        if !accept(line) {
            break;
        }
        lines.push((pos, line));
        pos = end + 1;
    }
    lines
}

/// Bytes covered by the lines returned from [`leading_lines`]
pub(crate) fn span_of(lines: &[(usize, &str)]) -> usize {
    lines
        .last()
        .map_or(0, |(offset, line)| offset + line.len())
}
