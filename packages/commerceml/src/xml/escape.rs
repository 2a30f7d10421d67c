//! Escaping and entity decoding for XML text and attribute values.
//!
//! Entity handling is quick-xml's. On top of it, whitespace controls that a
//! re-parse would normalize are written as character references, and decoded
//! values are checked against the XML `Char` production.

use std::borrow::Cow;

use quick_xml::escape::{escape, partial_escape};

/// Escape character data for use between tags.
///
/// `\r` is written as `&#13;` so that line-ending normalization on re-parse
/// keeps it.
///
/// # Examples
/// ```
/// use commerceml_parser::xml::escape_text;
///
/// assert_eq!(escape_text("a < b & c"), "a &lt; b &amp; c");
/// assert_eq!(escape_text("a\r\nb"), "a&#13;\nb");
/// assert_eq!(escape_text("plain"), "plain");
/// ```
pub fn escape_text(text: &str) -> Cow<'_, str> {
    with_char_refs(partial_escape(text), &['\r'])
}

/// Escape an attribute value for use inside double quotes.
///
/// Tabs and line breaks become character references; written raw they would
/// turn into spaces under attribute-value normalization.
///
/// # Examples
/// ```
/// use commerceml_parser::xml::escape_attribute;
///
/// assert_eq!(escape_attribute(r#"say "hi""#), "say &quot;hi&quot;");
/// assert_eq!(escape_attribute("a\nb\tc"), "a&#10;b&#9;c");
/// ```
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    with_char_refs(escape(value), &['\t', '\n', '\r'])
}

fn with_char_refs<'a>(escaped: Cow<'a, str>, controls: &[char]) -> Cow<'a, str> {
    if !escaped.contains(controls) {
        return escaped;
    }

    let mut out = String::with_capacity(escaped.len() + 8);
    for c in escaped.chars() {
        match c {
            '\t' if controls.contains(&c) => out.push_str("&#9;"),
            '\n' if controls.contains(&c) => out.push_str("&#10;"),
            '\r' if controls.contains(&c) => out.push_str("&#13;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Decode predefined entities and character references.
///
/// Returns a description of the problem for unknown or unterminated
/// references, and for characters XML does not allow (such as `&#0;`).
///
/// # Examples
/// ```
/// use commerceml_parser::xml::unescape;
///
/// assert_eq!(unescape("7 &amp; 8 &#x41;").unwrap(), "7 & 8 A");
/// assert!(unescape("&#0;").is_err());
/// ```
pub fn unescape(raw: &str) -> Result<Cow<'_, str>, String> {
    let decoded = quick_xml::escape::unescape(raw).map_err(|err| err.to_string())?;
    check_chars(&decoded)?;
    Ok(decoded)
}

/// Reject characters outside the XML `Char` production.
pub(crate) fn check_chars(text: &str) -> Result<(), String> {
    match text.chars().find(|c| !is_xml_char(*c)) {
        Some(c) => Err(format!(
            "character U+{:04X} is not allowed in XML",
            u32::from(c)
        )),
        None => Ok(()),
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}
