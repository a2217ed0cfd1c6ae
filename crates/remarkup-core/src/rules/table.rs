// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tables in pipe syntax (`| a | b |`) or as a `<table>` block

use super::{leading_lines, span_of};
use crate::parser::MatchContext;
use crate::token::{Attributes, LinkedObject, RuleKind, Token};
use crate::traits::{Rule, RuleMatch};
use crate::xml::XmlWriter;
use once_cell::sync::Lazy;
use regex::Regex;

static HTML_ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<tr>(.*?)</tr>").unwrap());
static HTML_CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<(td|th)>(.*?)</(?:td|th)>").unwrap());

const PIPE: &str = "pipe";
const HTML: &str = "html";

/// Owns `TableRow` and `TableCell` as well; cells re-enter the dispatcher
/// but never open another table
pub struct TableRule;

/// Accumulates the row tokens and rendered HTML of one table
struct TableBuilder<'c, 'a> {
    ctx: &'c MatchContext<'a>,
    syntax: &'static str,
    rows: Vec<Token>,
    linked_objects: Vec<LinkedObject>,
    html: String,
}

impl<'c, 'a> TableBuilder<'c, 'a> {
    fn new(ctx: &'c MatchContext<'a>, syntax: &'static str) -> Self {
        Self {
            ctx,
            syntax,
            rows: Vec::new(),
            linked_objects: Vec::new(),
            html: String::from(r#"<table class="remarkup-table">"#),
        }
    }

    /// `cells` holds `(offset, text, content offset, content, header)`
    fn row(&mut self, offset: usize, text: &str, cells: &[(usize, &str, usize, &str, bool)]) -> Token {
        self.html.push_str("<tr>");
        let mut tokens = Vec::with_capacity(cells.len());
        for &(cell_offset, cell_text, content_offset, content, header) in cells {
            let output = self.ctx.parse_inner(RuleKind::Table, content, content_offset);
            let tag = if header { "th" } else { "td" };
            self.html.push_str(&format!("<{tag}>{}</{tag}>", output.html));
            self.linked_objects.extend(output.linked_objects);

            let mut cell = Token::new(RuleKind::TableCell, self.ctx.offset + cell_offset, cell_text)
                .with_attribute("syntax", self.syntax)
                .with_children(output.tokens.into_vec());
            if header && self.syntax == HTML {
                cell = cell.with_attribute("header", "true");
            }
            tokens.push(cell);
        }
        self.html.push_str("</tr>");

        Token::new(RuleKind::TableRow, self.ctx.offset + offset, text)
            .with_attribute("syntax", self.syntax)
            .with_children(tokens)
    }

    fn finish(mut self, length: usize) -> RuleMatch {
        self.html.push_str("</table>");
        let mut matched = RuleMatch::new(length, self.html)
            .with_attribute("syntax", self.syntax)
            .with_children(self.rows);
        matched.linked_objects = self.linked_objects;
        matched
    }
}

fn is_divider(line: &str) -> bool {
    line.contains('-') && line.chars().all(|c| matches!(c, '|' | '-' | ':' | ' ' | '\t'))
}

/// Cells of a pipe row as `(offset, text)`, and whether the row ends with `|`
fn pipe_cells(line: &str) -> (Vec<(usize, &str)>, bool) {
    let body = &line[1..];
    let closed = body.ends_with('|');
    let body = if closed { &body[..body.len() - 1] } else { body };

    let mut cells = Vec::new();
    let mut offset = 1;
    for piece in body.split('|') {
        cells.push((offset, piece));
        offset += piece.len() + 1;
    }
    (cells, closed)
}

impl TableRule {
    fn match_pipe(ctx: &MatchContext<'_>, remaining: &str) -> Option<RuleMatch> {
        let lines = leading_lines(remaining, |line| line.starts_with('|'));
        if lines.is_empty() {
            return None;
        }

        let mut table = TableBuilder::new(ctx, PIPE);
        for (index, &(offset, line)) in lines.iter().enumerate() {
            if is_divider(line) {
                table.rows.push(
                    Token::new(RuleKind::TableRow, ctx.offset + offset, line)
                        .with_attribute("divider", line)
                        .with_attribute("syntax", PIPE),
                );
                continue;
            }

            let header = lines.get(index + 1).is_some_and(|(_, next)| is_divider(next));
            let (pieces, closed) = pipe_cells(line);
            let cells: Vec<_> = pieces
                .iter()
                .map(|&(cell_offset, text)| {
                    (offset + cell_offset, text, offset + cell_offset, text, header)
                })
                .collect();
            let mut row = table.row(offset, line, &cells);
            if !closed {
                row = row.with_attribute("closed", "false");
            }
            table.rows.push(row);
        }
        Some(table.finish(span_of(&lines)))
    }

    fn match_html(ctx: &MatchContext<'_>, remaining: &str) -> Option<RuleMatch> {
        if !remaining.starts_with("<table>") {
            return None;
        }
        let length = remaining.find("</table>")? + "</table>".len();
        let source = &remaining[..length];

        let mut table = TableBuilder::new(ctx, HTML);
        for row in HTML_ROW.captures_iter(source) {
            let (Some(whole), Some(body)) = (row.get(0), row.get(1)) else {
                continue;
            };
            let cells: Vec<_> = HTML_CELL
                .captures_iter(body.as_str())
                .filter_map(|cell| {
                    let whole_cell = cell.get(0)?;
                    let content = cell.get(2)?;
                    let header = cell.get(1).is_some_and(|tag| tag.as_str() == "th");
                    Some((
                        body.start() + whole_cell.start(),
                        whole_cell.as_str(),
                        body.start() + content.start(),
                        content.as_str(),
                        header,
                    ))
                })
                .collect();
            let row = table.row(whole.start(), whole.as_str(), &cells);
            table.rows.push(row);
        }
        if table.rows.is_empty() {
            return None;
        }
        Some(table.finish(length))
    }
}

impl Rule for TableRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Table
    }

    fn component_kinds(&self) -> &'static [RuleKind] {
        &[RuleKind::TableRow, RuleKind::TableCell]
    }

    fn priority(&self) -> i32 {
        150
    }

    fn disallowed_parents(&self) -> &'static [RuleKind] {
        &[RuleKind::Table]
    }

    fn try_match(&self, ctx: &MatchContext<'_>, remaining: &str) -> Option<RuleMatch> {
        if !ctx.starts_on_new_line() {
            return None;
        }
        Self::match_pipe(ctx, remaining).or_else(|| Self::match_html(ctx, remaining))
    }

    fn to_xml(&self, token: &Token, writer: &mut XmlWriter<'_>) {
        if token.kind == RuleKind::TableRow && token.attribute("divider").is_some() {
            writer.auto_close("TableRow", &token.attributes);
        } else {
            writer.element(token);
        }
    }

    fn from_xml(&self, kind: RuleKind, inner: &str, attributes: &Attributes) -> String {
        let html = attributes.get("syntax").is_some_and(|s| s == HTML);
        match (kind, html) {
            (RuleKind::TableCell, true) => {
                if attributes.get("header").is_some_and(|h| h == "true") {
                    format!("<th>{inner}</th>")
                } else {
                    format!("<td>{inner}</td>")
                }
            }
            (RuleKind::TableCell, false) => format!("|{inner}"),
            (RuleKind::TableRow, true) => format!("<tr>{inner}</tr>"),
            (RuleKind::TableRow, false) => match attributes.get("divider") {
                Some(divider) => format!("{divider}\n"),
                None if attributes.get("closed").is_some_and(|c| c == "false") => {
                    format!("{inner}\n")
                }
                None => format!("{inner}|\n"),
            },
            (_, true) => format!("<table>{inner}</table>"),
            (_, false) => inner.strip_suffix('\n').unwrap_or(inner).to_string(),
        }
    }
}
