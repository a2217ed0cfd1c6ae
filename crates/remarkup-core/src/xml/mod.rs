// SPDX-License-Identifier: AGPL-3.0-or-later
//! Pseudo-XML intermediate representation
//!
//! Remarkup is exported to an XML-like text that survives a trip through a
//! machine translator or a spreadsheet and is imported back afterwards. The
//! format is deliberately loose: there is no root element and no declaration,
//! and the importer tolerates whatever the external tool did to the text.

mod export;
mod import;
mod tokenizer;

pub use export::{to_xml, XmlWriter, TAG_CLOSE, TAG_OPEN};
pub use import::from_xml;
pub use tokenizer::{find_closing_tag, tokenize, BrokenXmlToken};

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static BROKEN_NEWLINE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<N>\[(\d+)</N>\]").unwrap());

/// Undo the marker damage translators typically cause
///
/// `<N>[5</N>]` becomes `<N>[5]</N>` again.
pub fn repair_newline_markers(xml: &str) -> Cow<'_, str> {
    BROKEN_NEWLINE_MARKER.replace_all(xml, "<N>[$1]</N>")
}
