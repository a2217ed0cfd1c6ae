// SPDX-License-Identifier: AGPL-3.0-or-later
//! Markup engine: grammar + configuration behind one handle

use crate::grammar::Grammar;
use crate::parser::Dispatcher;
use crate::token::ParseOutput;
use crate::traits::{ParseConfig, Result};
use crate::xml;
use std::io::{Read, Write};
use tracing::debug;

/// Parses Remarkup and converts it to and from pseudo-XML
///
/// The engine holds no per-document state; share it freely between threads.
pub struct RemarkupEngine {
    grammar: Grammar,
    config: ParseConfig,
}

impl RemarkupEngine {
    /// Engine with the built-in grammar and default configuration
    pub fn new() -> Self {
        Self::with_config(ParseConfig::default())
    }

    pub fn with_config(config: ParseConfig) -> Self {
        Self::with_grammar(Grammar::with_defaults(), config)
    }

    /// Engine over a custom rule set
    pub fn with_grammar(grammar: Grammar, config: ParseConfig) -> Self {
        Self { grammar, config }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    /// Parse a top-level document
    pub fn parse(&self, text: &str) -> ParseOutput {
        let output = Dispatcher::new(&self.grammar, &self.config).parse(None, text);
        debug!(
            bytes = text.len(),
            tokens = output.tokens.len(),
            linked_objects = output.linked_objects.len(),
            "parsed remarkup"
        );
        output
    }

    /// Parse from a reader
    pub fn parse_reader<R: Read>(&self, mut reader: R) -> Result<ParseOutput> {
        let mut input = String::new();
        reader.read_to_string(&mut input)?;
        Ok(self.parse(&input))
    }

    pub fn to_html(&self, text: &str) -> String {
        self.parse(text).html
    }

    /// Render HTML to a writer
    pub fn render_writer<W: Write>(&self, text: &str, writer: &mut W) -> Result<()> {
        writer.write_all(self.to_html(text).as_bytes())?;
        Ok(())
    }

    /// Remarkup → pseudo-XML
    pub fn to_xml(&self, text: &str) -> String {
        let output = self.parse(text);
        xml::to_xml(&self.grammar, &output.tokens)
    }

    /// Pseudo-XML → Remarkup
    pub fn from_xml(&self, text: &str) -> Result<String> {
        xml::from_xml(&self.grammar, text, true)
    }
}

impl Default for RemarkupEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::RuleKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_delimited_round_trip() {
        let engine = RemarkupEngine::new();
        for markup in ["**x**", "//x//", "__x__", "~~x~~", "!!x!!"] {
            let xml = engine.to_xml(markup);
            assert_eq!(engine.from_xml(&xml).unwrap(), markup, "via {xml}");
        }
    }

    #[test]
    fn test_document_round_trip() {
        let engine = RemarkupEngine::new();
        let markup = concat!(
            "= Release notes =\n",
            "\n",
            "NOTE: read //carefully//\n",
            "\n",
            "- fixed {T12}\n",
            "- see [[https://x.org|the site]]\n",
            "\n",
            "> quoted\n",
            "\n",
            "```\n",
            "a < b && c\n",
            "```\n",
            "\n",
            "| a | b |\n",
            "|---|---|\n",
            "| `c` | d |\n",
            "\n",
            "---\n",
            "Text with %%%raw **stuff**%%% & more."
        );
        let xml = engine.to_xml(markup);
        assert_eq!(engine.from_xml(&xml).unwrap(), markup, "via {xml}");
    }

    #[test]
    fn test_blank_line_survives_repaired_marker() {
        let engine = RemarkupEngine::new();
        let xml = engine.to_xml("a\n\nb");
        assert_eq!(xml, "a<N>[1]</N><N>[2]</N>b");
        let mangled = xml.replace("[2]</N>", "[2</N>]");
        assert_eq!(engine.from_xml(&mangled).unwrap(), "a\n\nb");
    }

    #[test]
    fn test_parse_reader() {
        let engine = RemarkupEngine::new();
        let output = engine.parse_reader("**a** b".as_bytes()).unwrap();
        assert_eq!(output.tokens.as_slice()[0].kind, RuleKind::Bold);
        assert_eq!(output.word_count(), 2);

        let mut html = Vec::new();
        engine.render_writer("//i//", &mut html).unwrap();
        assert_eq!(String::from_utf8(html).unwrap(), "<em>i</em>");
    }

    #[test]
    fn test_custom_grammar_without_highlight() {
        let mut grammar = Grammar::with_defaults();
        grammar.unregister(RuleKind::Highlight);
        let engine = RemarkupEngine::with_grammar(grammar, ParseConfig::default());
        assert_eq!(engine.to_html("!!x!!"), "!!x!!");
        assert_eq!(engine.from_xml("<Highlight>x</Highlight>").unwrap(), "<Highlight>x</Highlight>");
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RemarkupEngine>();
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // Property: plain words wrapped in any delimiter survive export and import
        #[test]
        fn prop_delimited_round_trip(
            word in "[a-z]{1,8}( [a-z]{1,8}){0,3}",
            delimiter in prop::sample::select(vec!["**", "//", "__", "~~", "!!"]),
        ) {
            let engine = RemarkupEngine::new();
            let markup = format!("{delimiter}{word}{delimiter}");
            let xml = engine.to_xml(&markup);
            prop_assert_eq!(engine.from_xml(&xml).unwrap(), markup);
        }

        // Property: rendering the same input twice gives identical HTML
        #[test]
        fn prop_html_idempotent(input in "\\PC{0,64}") {
            let engine = RemarkupEngine::new();
            prop_assert_eq!(engine.to_html(&input), engine.to_html(&input));
        }

        // Property: importing arbitrary text never panics
        #[test]
        fn prop_import_total(input in "(<|>|/|N|Bold|\\[|\\]|[a-z ]{1,4}|\"|=){0,30}") {
            let engine = RemarkupEngine::new();
            let _ = engine.from_xml(&input);
        }
    }
}
