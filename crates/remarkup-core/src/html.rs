// SPDX-License-Identifier: AGPL-3.0-or-later
//! Entity escaping shared by the HTML renderer and the pseudo-XML converters

use once_cell::sync::Lazy;
use quick_xml::escape::{escape, unescape};
use regex::Regex;
use std::borrow::Cow;

static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(?:#[0-9]+|#x[0-9A-Fa-f]+|[A-Za-z][A-Za-z0-9]*);").unwrap());

/// Escape `&`, `<`, `>`, `"` and `'`
pub fn escape_html(text: &str) -> Cow<'_, str> {
    escape(text)
}

pub fn push_escaped(out: &mut String, text: &str) {
    out.push_str(&escape(text));
}

pub fn push_escaped_char(out: &mut String, ch: char) {
    let mut buf = [0u8; 4];
    push_escaped(out, ch.encode_utf8(&mut buf));
}

/// Decode character and predefined entity references
///
/// Entities quick-xml does not know (`&nbsp;` and friends) are left as they
/// are instead of failing the whole string.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    match unescape(text) {
        Ok(decoded) => decoded,
        Err(_) => ENTITY.replace_all(text, |caps: &regex::Captures<'_>| {
            let entity = &caps[0];
            unescape(entity)
                .map(Cow::into_owned)
                .unwrap_or_else(|_| entity.to_string())
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape_html("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
        let mut out = String::new();
        push_escaped_char(&mut out, '>');
        push_escaped_char(&mut out, 'é');
        assert_eq!(out, "&gt;é");
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode_entities("&lt;b&gt; &amp;amp; &#65;"), "<b> &amp; A");
        assert_eq!(decode_entities("plain"), "plain");
    }

    #[test]
    fn test_decode_keeps_unknown_entities() {
        assert_eq!(decode_entities("a&nbsp;b &lt; c"), "a&nbsp;b < c");
        assert_eq!(decode_entities("fish & chips"), "fish & chips");
    }
}
