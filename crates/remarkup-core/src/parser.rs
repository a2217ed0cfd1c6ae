// SPDX-License-Identifier: AGPL-3.0-or-later
//! Rule dispatcher
//!
//! Drives the grammar over the input: at every position the registered rules
//! are tried in priority order and the first match wins. Characters no rule
//! claims are emitted literally, so parsing never fails.

use crate::grammar::Grammar;
use crate::html;
use crate::token::{LinkedObject, ParseOutput, RuleKind, Token, TokenList};
use crate::traits::{ParseConfig, RuleMatch};
use std::collections::HashSet;
use tracing::{trace, warn};

/// Line and whitespace state at the current position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserContext {
    pub starts_on_new_line: bool,
    pub starts_after_whitespace: bool,
}

impl ParserContext {
    /// State at the beginning of a document
    pub const TOP_LEVEL: Self = Self {
        starts_on_new_line: true,
        starts_after_whitespace: true,
    };

    /// State at the beginning of a rule's inner content
    pub const NESTED: Self = Self {
        starts_on_new_line: false,
        starts_after_whitespace: true,
    };
}

/// What a rule sees when it is asked to match
pub struct MatchContext<'a> {
    dispatcher: &'a Dispatcher<'a>,
    /// Rule whose inner content is being parsed, `None` at top level
    pub caller: Option<RuleKind>,
    pub state: ParserContext,
    /// Offset of the remaining input within the top-level input
    pub offset: usize,
    /// Kind of the token produced just before this position
    pub previous: Option<RuleKind>,
}

impl<'a> MatchContext<'a> {
    pub fn starts_on_new_line(&self) -> bool {
        self.state.starts_on_new_line
    }

    pub fn starts_after_whitespace(&self) -> bool {
        self.state.starts_after_whitespace
    }

    pub fn config(&self) -> &ParseConfig {
        self.dispatcher.config
    }

    /// Parse a rule's inner content
    ///
    /// `relative_offset` is where `inner` starts within the remaining input
    /// the rule was handed; child tokens get offsets in the top-level input.
    pub fn parse_inner(&self, kind: RuleKind, inner: &str, relative_offset: usize) -> ParseOutput {
        self.dispatcher
            .run(Some(kind), inner, self.offset + relative_offset, ParserContext::NESTED)
    }
}

/// Runs a [`Grammar`] over input text
pub struct Dispatcher<'a> {
    grammar: &'a Grammar,
    config: &'a ParseConfig,
}

impl<'a> Dispatcher<'a> {
    pub fn new(grammar: &'a Grammar, config: &'a ParseConfig) -> Self {
        Self { grammar, config }
    }

    /// Parse `text`, optionally on behalf of a calling rule
    pub fn parse(&self, caller: Option<RuleKind>, text: &str) -> ParseOutput {
        let state = if caller.is_none() {
            ParserContext::TOP_LEVEL
        } else {
            ParserContext::NESTED
        };
        self.run(caller, text, 0, state)
    }

    fn run(
        &self,
        caller: Option<RuleKind>,
        text: &str,
        base_offset: usize,
        mut state: ParserContext,
    ) -> ParseOutput {
        let mut html = String::new();
        let mut tokens = TokenList::new();
        let mut linked_objects = Vec::new();
        let mut literal: Option<Token> = None;
        let mut previous = None;
        let mut pos = 0;

        while pos < text.len() {
            let remaining = &text[pos..];
            let ctx = MatchContext {
                dispatcher: self,
                caller,
                state,
                offset: base_offset + pos,
                previous,
            };

            if let Some((kind, matched)) = self.first_match(&ctx, remaining) {
                if let Some(run) = literal.take() {
                    tokens.push(run);
                }
                let consumed = &remaining[..matched.length];
                html.push_str(&matched.html);
                linked_objects.extend(matched.linked_objects.iter().cloned());
                tokens.push(Token {
                    kind,
                    start: base_offset + pos,
                    text: consumed.to_string(),
                    attributes: matched.attributes,
                    children: matched.children,
                    linked_objects: matched.linked_objects,
                });

                state.starts_on_new_line = kind.starts_new_line();
                state.starts_after_whitespace = consumed.ends_with(char::is_whitespace);
                previous = Some(kind);
                pos += matched.length;
                continue;
            }

            let Some(ch) = remaining.chars().next() else {
                break;
            };
            html::push_escaped_char(&mut html, ch);
            match literal.as_mut() {
                Some(run) => run.text.push(ch),
                None => literal = Some(Token::new(RuleKind::Text, base_offset + pos, ch)),
            }
            state.starts_on_new_line = false;
            state.starts_after_whitespace = ch.is_whitespace();
            previous = Some(RuleKind::Text);
            pos += ch.len_utf8();
        }

        if let Some(run) = literal {
            tokens.push(run);
        }

        ParseOutput {
            html: html.trim().to_string(),
            tokens,
            linked_objects: dedup_linked_objects(linked_objects),
        }
    }

    fn first_match(&self, ctx: &MatchContext<'_>, remaining: &str) -> Option<(RuleKind, RuleMatch)> {
        for rule in self.grammar.dispatch_order() {
            if let Some(caller) = ctx.caller {
                if rule.disallowed_parents().contains(&caller) {
                    continue;
                }
            }
            let Some(matched) = rule.try_match(ctx, remaining) else {
                continue;
            };
            if matched.length == 0
                || matched.length > remaining.len()
                || !remaining.is_char_boundary(matched.length)
            {
                warn!(rule = %rule.kind(), length = matched.length, "ignoring match with invalid length");
                continue;
            }
            trace!(rule = %rule.kind(), offset = ctx.offset, length = matched.length, "rule matched");
            return Some((rule.kind(), matched));
        }
        None
    }
}

/// First occurrence of every identifier wins
fn dedup_linked_objects(objects: Vec<LinkedObject>) -> Vec<LinkedObject> {
    let mut seen = HashSet::new();
    objects
        .into_iter()
        .filter(|object| seen.insert(object.identifier()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Attributes, ObjectKind};
    use crate::traits::Rule;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> ParseOutput {
        let grammar = Grammar::with_defaults();
        let config = ParseConfig::default();
        Dispatcher::new(&grammar, &config).parse(None, text)
    }

    fn kinds(tokens: &TokenList) -> Vec<RuleKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_literal_fallback_coalesces_and_escapes() {
        let output = parse("a < b");
        assert_eq!(output.html, "a &lt; b");
        assert_eq!(output.tokens.len(), 1);
        assert_eq!(output.tokens.as_slice()[0].text, "a < b");
    }

    #[test]
    fn test_offsets_refer_to_original_input() {
        let output = parse("x **bold** y");
        let tokens = output.tokens.as_slice();
        assert_eq!(kinds(&output.tokens), vec![RuleKind::Text, RuleKind::Bold, RuleKind::Text]);
        assert_eq!(tokens[1].start, 2);
        assert_eq!(tokens[1].text, "**bold**");
        assert_eq!(tokens[1].children[0].start, 4);
        assert_eq!(tokens[1].children[0].text, "bold");
        assert_eq!(tokens[2].start, 10);
    }

    #[test]
    fn test_multibyte_characters_are_never_split() {
        let output = parse("😀 é 漢字");
        assert_eq!(output.html, "😀 é 漢字");
        assert_eq!(output.tokens.as_slice()[0].text, "😀 é 漢字");
    }

    #[test]
    fn test_header_only_at_line_start() {
        let output = parse("= Title =\ntext = not =");
        assert_eq!(
            kinds(&output.tokens),
            vec![RuleKind::Header, RuleKind::Newline, RuleKind::Text]
        );
    }

    #[test]
    fn test_linked_objects_are_deduplicated() {
        let output = parse("{F1} {T2} {F1, size=full}");
        let ids: Vec<_> = output.linked_objects.iter().map(|o| o.identifier()).collect();
        assert_eq!(ids, vec!["F1", "T2"]);
        assert_eq!(output.linked_objects[0].kind, ObjectKind::File);
    }

    #[test]
    fn test_nested_linked_objects_bubble_up() {
        let output = parse("**see {F9}**");
        assert_eq!(output.linked_objects, vec![LinkedObject::new(ObjectKind::File, 9)]);
    }

    #[test]
    fn test_html_is_trimmed() {
        let output = parse("  **x**  ");
        assert_eq!(output.html, "<strong>x</strong>");
    }

    #[test]
    fn test_parse_is_idempotent() {
        let grammar = Grammar::with_defaults();
        let config = ParseConfig::default();
        let dispatcher = Dispatcher::new(&grammar, &config);
        let input = "= Head =\n- a **b**\n- c\n\n| x | y |\n{F1} [[https://x.org|x]]";
        let first = dispatcher.parse(None, input);
        let second = dispatcher.parse(None, input);
        let third = dispatcher.parse(None, input);
        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    struct GreedyRule;

    impl Rule for GreedyRule {
        fn kind(&self) -> RuleKind {
            RuleKind::Highlight
        }
        fn priority(&self) -> i32 {
            0
        }
        fn try_match(&self, _ctx: &MatchContext<'_>, remaining: &str) -> Option<RuleMatch> {
            // Claims half a multibyte character
            remaining
                .starts_with('é')
                .then(|| RuleMatch::new(1, "broken"))
        }
        fn from_xml(&self, _kind: RuleKind, inner: &str, _attributes: &Attributes) -> String {
            inner.to_string()
        }
    }

    #[test]
    fn test_invalid_match_length_is_ignored() {
        let mut grammar = Grammar::with_defaults();
        grammar.register(Box::new(GreedyRule));
        let config = ParseConfig::default();
        let output = Dispatcher::new(&grammar, &config).parse(None, "é");
        assert_eq!(output.html, "é");
        assert_eq!(kinds(&output.tokens), vec![RuleKind::Text]);
    }

    #[test]
    fn test_disallowed_parent_blocks_nesting() {
        let grammar = Grammar::with_defaults();
        let config = ParseConfig::default();
        let dispatcher = Dispatcher::new(&grammar, &config);

        let nested = dispatcher.parse(Some(RuleKind::Bold), "**x** //y//");
        assert_eq!(kinds(&nested.tokens), vec![RuleKind::Text, RuleKind::Italic]);
        assert_eq!(nested.html, "**x** <em>y</em>");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn markup_strategy() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop_oneof![
                Just("**".to_string()),
                Just("//".to_string()),
                Just("__".to_string()),
                Just("`".to_string()),
                Just("\n".to_string()),
                Just("| ".to_string()),
                Just("- ".to_string()),
                Just("= ".to_string()),
                Just("{F1}".to_string()),
                Just("[[".to_string()),
                Just("]]".to_string()),
                Just("<table>".to_string()),
                "[a-z ]{1,6}",
                "\\PC{1,3}",
            ],
            0..24,
        )
        .prop_map(|parts| parts.concat())
    }

    fn collect_spans(tokens: &[Token], text: &str) -> bool {
        tokens.iter().all(|token| {
            text.get(token.start..token.end()) == Some(token.text.as_str())
                && collect_spans(&token.children, text)
        })
    }

    proptest! {
        // Property: parsing never panics and the top-level tokens cover the input exactly
        #[test]
        fn prop_tokens_cover_input(input in markup_strategy()) {
            let grammar = Grammar::with_defaults();
            let config = ParseConfig::default();
            let output = Dispatcher::new(&grammar, &config).parse(None, &input);
            let rebuilt: String = output.tokens.iter().map(|t| t.text.as_str()).collect();
            prop_assert_eq!(rebuilt, input);
        }

        // Property: every token's offset points at its own text
        #[test]
        fn prop_token_offsets_match_text(input in markup_strategy()) {
            let grammar = Grammar::with_defaults();
            let config = ParseConfig::default();
            let output = Dispatcher::new(&grammar, &config).parse(None, &input);
            prop_assert!(collect_spans(output.tokens.as_slice(), &input));
        }

        // Property: a second parse of the same input is identical
        #[test]
        fn prop_parse_idempotent(input in markup_strategy()) {
            let grammar = Grammar::with_defaults();
            let config = ParseConfig::default();
            let dispatcher = Dispatcher::new(&grammar, &config);
            prop_assert_eq!(dispatcher.parse(None, &input), dispatcher.parse(None, &input));
        }
    }
}
