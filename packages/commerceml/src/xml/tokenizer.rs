//! Push tokenizer turning text chunks into open/text/close notifications.
//!
//! Markup is read by quick-xml. Input is buffered until a notification is
//! known to be complete: markup up to its terminator, text up to the next
//! `<`. The notification sequence for a document is therefore the same no
//! matter how it is split into chunks.

use std::borrow::Cow;
use std::sync::LazyLock;

use quick_xml::errors::SyntaxError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use tracing::{trace, warn};

use super::escape::{check_chars, unescape};
use crate::config::ParserConfig;
use crate::error::{ParserError, Result};

/// Whitespace run collapsed by text normalization.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// A primitive tokenizer event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// An element was opened. Attribute values are entity-decoded.
    OpenTag {
        name: String,
        attributes: Vec<(String, String)>,
    },
    /// Character data inside an element, entity-decoded.
    Text(String),
    /// An element was closed. Empty-element tags produce an open and a close.
    CloseTag(String),
}

/// How text nodes are post-processed before being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextOptions {
    pub trim: bool,
    pub normalize: bool,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            trim: true,
            normalize: true,
        }
    }
}

impl From<&ParserConfig> for TextOptions {
    fn from(config: &ParserConfig) -> Self {
        Self {
            trim: config.trim_text,
            normalize: config.normalize_text,
        }
    }
}

impl TextOptions {
    fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        let text = if self.trim { text.trim() } else { text };
        if self.normalize {
            WHITESPACE_RUN.replace_all(text, " ")
        } else {
            Cow::Borrowed(text)
        }
    }
}

/// Incremental XML tokenizer.
#[derive(Debug)]
pub struct Tokenizer {
    options: TextOptions,
    /// Input received but not yet turned into notifications.
    buffer: String,
    /// What the buffered tail needs before it is worth reading again.
    waiting_for: Option<&'static str>,
    /// Names of the currently open elements.
    open: Vec<String>,
    root_closed: bool,
    started: bool,
    /// Line number of the first byte in `buffer`.
    line: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(TextOptions::default())
    }
}

impl Tokenizer {
    #[must_use]
    pub fn new(options: TextOptions) -> Self {
        Self {
            options,
            buffer: String::new(),
            waiting_for: None,
            open: Vec::new(),
            root_closed: false,
            started: false,
            line: 1,
        }
    }

    /// Feed a chunk and append every notification it completes to `out`.
    ///
    /// # Errors
    /// Returns `ParserError::MalformedMarkup` on a syntax violation. The
    /// tokenizer must not be fed again afterwards.
    pub fn feed(&mut self, chunk: &str, out: &mut Vec<Notification>) -> Result<()> {
        let chunk = if !self.started && !chunk.is_empty() {
            self.started = true;
            chunk.strip_prefix('\u{feff}').unwrap_or(chunk)
        } else {
            chunk
        };

        let searched = self.buffer.len();
        self.buffer.push_str(chunk);

        if let Some(terminator) = self.waiting_for {
            // A terminator may straddle the previous chunk's end.
            let from = searched.saturating_sub(terminator.len() - 1);
            if !contains(&self.buffer.as_bytes()[from..], terminator.as_bytes()) {
                return Ok(());
            }
        }

        self.process(out, false)
    }

    /// Signal end of input, flushing whatever remains in the buffer.
    ///
    /// Elements still open are not an error here: the caller decides what
    /// to do with a truncated document.
    ///
    /// # Errors
    /// Returns `ParserError::MalformedMarkup` if the input stops inside markup.
    pub fn end(&mut self, out: &mut Vec<Notification>) -> Result<()> {
        self.process(out, true)?;

        if !self.open.is_empty() {
            warn!(unclosed = ?self.open, "input ended with unclosed elements");
        }

        Ok(())
    }

    /// Number of elements currently open.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    fn process(&mut self, out: &mut Vec<Notification>, at_end: bool) -> Result<()> {
        let mut buffer = std::mem::take(&mut self.buffer);
        self.waiting_for = None;

        let consumed = self.tokenize(&buffer, out, at_end)?;

        let tail = &buffer[consumed..];
        if !tail.is_empty() {
            trace!(held = tail.len(), "waiting for more input");
            self.waiting_for = Some(terminator(tail));
        }

        self.line += count_lines(&buffer.as_bytes()[..consumed]);
        buffer.drain(..consumed);
        self.buffer = buffer;
        Ok(())
    }

    /// Read complete events from `buffer`, returning how many bytes were
    /// consumed. Unless `at_end`, an incomplete trailing piece is left over.
    fn tokenize(
        &mut self,
        buffer: &str,
        out: &mut Vec<Notification>,
        at_end: bool,
    ) -> Result<usize> {
        let mut reader = Reader::from_str(buffer);
        let config = reader.config_mut();
        config.trim_text(false);
        // Tags may be closed in a later call with a fresh reader.
        config.check_end_names = false;
        config.allow_unmatched_ends = true;

        loop {
            let start = offset(reader.buffer_position(), buffer);
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(quick_xml::Error::Syntax(err)) => {
                    let at = offset(reader.error_position(), buffer);
                    // `<!` followed by anything but a comment, CDATA or DOCTYPE
                    let invalid =
                        matches!(err, SyntaxError::InvalidBangMarkup) && buffer.len() - at > 2;
                    if invalid {
                        return Err(self.malformed_at(buffer, at, err.to_string()));
                    }
                    if at_end {
                        return Err(self.malformed_at(
                            buffer,
                            at,
                            format!("unexpected end of input: {err}"),
                        ));
                    }
                    return Ok(at);
                }
                Err(err) => {
                    let at = offset(reader.error_position(), buffer);
                    return Err(self.malformed_at(buffer, at, err.to_string()));
                }
            };

            match event {
                Event::Eof => return Ok(buffer.len()),
                Event::Text(_)
                    if !at_end
                        && offset(reader.buffer_position(), buffer) == buffer.len()
                        && !buffer.ends_with('<') =>
                {
                    return Ok(start);
                }
                event => {
                    if let Err(message) = self.event(event, out) {
                        return Err(self.malformed_at(buffer, start, message));
                    }
                }
            }
        }
    }

    fn event(
        &mut self,
        event: Event<'_>,
        out: &mut Vec<Notification>,
    ) -> std::result::Result<(), String> {
        match event {
            Event::Start(tag) => self.open_tag(&tag, false, out),
            Event::Empty(tag) => self.open_tag(&tag, true, out),
            Event::End(tag) => {
                let name = tag.name();
                self.close_tag(utf8(name.as_ref())?, out)
            }
            Event::Text(text) => self.text(utf8(&text)?, out),
            Event::CData(data) => self.cdata(utf8(&data)?, out),
            // Comments, processing instructions, the XML declaration and DOCTYPE.
            _ => Ok(()),
        }
    }

    fn open_tag(
        &mut self,
        tag: &BytesStart<'_>,
        self_closing: bool,
        out: &mut Vec<Notification>,
    ) -> std::result::Result<(), String> {
        let name = tag.name();
        let name = utf8(name.as_ref())?;
        if !is_valid_name(name) {
            return Err(format!("invalid element name '{name}'"));
        }
        if self.open.is_empty() && self.root_closed {
            return Err(format!("second root element <{name}>"));
        }

        let mut attributes = Vec::new();
        for attribute in tag.attributes() {
            let attribute = attribute.map_err(|err| err.to_string())?;
            let key = utf8(attribute.key.as_ref())?;
            if !is_valid_name(key) {
                return Err(format!("invalid attribute name '{key}'"));
            }
            let raw = utf8(&attribute.value)?;
            if raw.contains('<') {
                return Err(format!("'<' in value of attribute '{key}'"));
            }
            attributes.push((key.to_string(), unescape(raw)?.into_owned()));
        }

        out.push(Notification::OpenTag {
            name: name.to_string(),
            attributes,
        });

        if self_closing {
            out.push(Notification::CloseTag(name.to_string()));
            self.root_closed |= self.open.is_empty();
        } else {
            self.open.push(name.to_string());
        }
        Ok(())
    }

    fn close_tag(
        &mut self,
        name: &str,
        out: &mut Vec<Notification>,
    ) -> std::result::Result<(), String> {
        match self.open.pop() {
            Some(expected) if expected == name => {
                out.push(Notification::CloseTag(expected));
                self.root_closed |= self.open.is_empty();
                Ok(())
            }
            Some(expected) => Err(format!(
                "mismatched close tag </{name}>, expected </{expected}>"
            )),
            None => Err(format!("unexpected close tag </{name}>")),
        }
    }

    fn text(&mut self, raw: &str, out: &mut Vec<Notification>) -> std::result::Result<(), String> {
        if self.open.is_empty() {
            if raw.trim().is_empty() {
                return Ok(());
            }
            return Err("text data outside of root element".to_string());
        }

        let decoded = unescape(raw)?;
        self.push_text(&decoded, out);
        Ok(())
    }

    fn cdata(
        &mut self,
        content: &str,
        out: &mut Vec<Notification>,
    ) -> std::result::Result<(), String> {
        if self.open.is_empty() {
            return Err("CDATA section outside of root element".to_string());
        }
        check_chars(content)?;
        self.push_text(content, out);
        Ok(())
    }

    fn push_text(&self, text: &str, out: &mut Vec<Notification>) {
        let text = self.options.apply(text);
        if !text.is_empty() {
            out.push(Notification::Text(text.into_owned()));
        }
    }

    fn malformed_at(&self, buffer: &str, at: usize, message: String) -> ParserError {
        let line = self.line + count_lines(&buffer.as_bytes()[..at]);
        ParserError::malformed(line, message)
    }
}

/// Delimiter the buffered `tail` has to see before it can complete.
fn terminator(tail: &str) -> &'static str {
    if !tail.starts_with('<') {
        "<"
    } else if tail.starts_with("<!--") {
        "-->"
    } else if tail.starts_with("<![CDATA[") {
        "]]>"
    } else if tail.starts_with("<?") {
        "?>"
    } else {
        ">"
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

fn count_lines(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&byte| byte == b'\n').count()
}

/// Reader position as an index into `buffer`.
fn offset(position: impl TryInto<usize>, buffer: &str) -> usize {
    position
        .try_into()
        .map_or(buffer.len(), |at: usize| at.min(buffer.len()))
}

fn utf8(bytes: &[u8]) -> std::result::Result<&str, String> {
    std::str::from_utf8(bytes).map_err(|err| err.to_string())
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_' || first == ':')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.'))
}
