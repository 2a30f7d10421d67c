//! Subtree collector: the rule-driven extraction state machine.
//!
//! The collector consumes tokenizer notifications one at a time, tracks the
//! current tag path and rebuilds an XML fragment for the active rule. Only
//! one rule collects at any instant; a rule whose start path is entered
//! while another is still collecting preempts it, and the unfinished
//! fragment is closed off and emitted right away.

use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::events::{ChunkEventBatch, ExtractionEvent};
use crate::object::fragment_to_value;
use crate::rules::{PathTracker, RuleTable};
use crate::xml::{escape_attribute, escape_text, Notification};

/// Whether a rule is currently collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectState<'r> {
    Idle,
    Collecting(&'r str),
}

/// Per-parse extraction state over one rule table.
#[derive(Debug)]
pub struct SubtreeCollector<'r> {
    rules: &'r RuleTable,
    path: PathTracker,
    state: CollectState<'r>,
    /// Fragment under construction.
    xml: String,
    /// Tags written to `xml` and not yet closed there.
    open_tags: Vec<String>,
    /// The innermost open element was written to `xml`; reset on every
    /// open and close notification.
    collect_current: bool,
}

impl<'r> SubtreeCollector<'r> {
    #[must_use]
    pub fn new(rules: &'r RuleTable) -> Self {
        Self {
            rules,
            path: PathTracker::new(),
            state: CollectState::Idle,
            xml: String::new(),
            open_tags: Vec::new(),
            collect_current: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> CollectState<'r> {
        self.state
    }

    #[must_use]
    pub fn path(&self) -> &[String] {
        self.path.current()
    }

    /// Advance the state machine by one notification, appending any
    /// completed extraction to `batch`.
    ///
    /// # Errors
    /// Returns `ParserError::Fragment` if a completed fragment cannot be
    /// converted.
    pub fn handle(&mut self, notification: Notification, batch: &mut ChunkEventBatch) -> Result<()> {
        trace!(?notification, depth = self.path.depth(), "notification");
        match notification {
            Notification::OpenTag { name, attributes } => self.open_tag(name, &attributes, batch),
            Notification::Text(content) => {
                self.text(&content);
                Ok(())
            }
            Notification::CloseTag(name) => self.close_tag(&name, batch),
        }
    }

    /// Force-finalize a collection left open by a truncated input.
    ///
    /// # Errors
    /// Returns `ParserError::Fragment` if the fragment cannot be converted.
    pub fn finish(&mut self, batch: &mut ChunkEventBatch) -> Result<()> {
        if let CollectState::Collecting(rule) = self.state {
            warn!(
                rule,
                path = %self.path.current().join("/"),
                "input ended inside a collection, emitting truncated fragment"
            );
            self.emit_collected(batch)?;
        }
        Ok(())
    }

    fn open_tag(
        &mut self,
        name: String,
        attributes: &[(String, String)],
        batch: &mut ChunkEventBatch,
    ) -> Result<()> {
        self.path.push(name.as_str());
        self.collect_current = false;

        let rules = self.rules;
        for (key, rule) in rules.iter() {
            if rule.starts_at(self.path.current()) {
                self.start_collect(key, batch)?;
            }
        }

        if self.state != CollectState::Idle && rules.is_collectible(self.path.current()) {
            self.collect_current = true;
            self.xml.push('<');
            self.xml.push_str(&name);
            for (key, value) in attributes {
                self.xml.push(' ');
                self.xml.push_str(key);
                self.xml.push_str("=\"");
                self.xml.push_str(&escape_attribute(value));
                self.xml.push('"');
            }
            self.xml.push('>');
            self.open_tags.push(name);
        }

        Ok(())
    }

    fn text(&mut self, content: &str) {
        if self.collect_current {
            self.xml.push_str(&escape_text(content));
        }
    }

    fn close_tag(&mut self, name: &str, batch: &mut ChunkEventBatch) -> Result<()> {
        if let CollectState::Collecting(active) = self.state {
            let rules = self.rules;
            let written = self.open_tags.last().is_some_and(|tag| tag == name);
            if written && rules.is_collectible(self.path.current()) {
                self.xml.push_str("</");
                self.xml.push_str(name);
                self.xml.push('>');
                self.open_tags.pop();
            }

            if rules
                .get(active)
                .is_some_and(|rule| rule.starts_at(self.path.current()))
            {
                self.emit_collected(batch)?;
            }
        }

        self.path.pop();
        self.collect_current = false;
        Ok(())
    }

    fn start_collect(&mut self, key: &'r str, batch: &mut ChunkEventBatch) -> Result<()> {
        if let CollectState::Collecting(previous) = self.state {
            debug!(
                preempted = previous,
                by = key,
                "new collection preempts an unfinished one"
            );
            self.emit_collected(batch)?;
        }
        self.state = CollectState::Collecting(key);
        Ok(())
    }

    /// Close every tag still open in the fragment, convert it and queue the
    /// event. Returns to `Idle`.
    fn emit_collected(&mut self, batch: &mut ChunkEventBatch) -> Result<()> {
        let CollectState::Collecting(rule) = std::mem::replace(&mut self.state, CollectState::Idle)
        else {
            return Ok(());
        };

        while let Some(tag) = self.open_tags.pop() {
            self.xml.push_str("</");
            self.xml.push_str(&tag);
            self.xml.push('>');
        }

        let xml = std::mem::take(&mut self.xml);
        if xml.is_empty() {
            warn!(rule, "collection finished without any content, skipping");
            return Ok(());
        }

        let payload = fragment_to_value(&xml)?;
        debug!(rule, bytes = xml.len(), "collected fragment");
        batch.push(ExtractionEvent::new(rule, payload));
        Ok(())
    }
}
