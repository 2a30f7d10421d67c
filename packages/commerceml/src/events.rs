//! Extraction events and the per-chunk event batch.

use serde::Serialize;

use crate::object::Value;

/// One extracted semantic unit: the rule that matched and its object tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionEvent {
    /// Key of the rule whose collection produced this event.
    pub rule: String,
    /// Object tree of the collected fragment's root element.
    pub payload: Value,
}

impl ExtractionEvent {
    #[must_use]
    pub fn new(rule: impl Into<String>, payload: Value) -> Self {
        Self {
            rule: rule.into(),
            payload,
        }
    }
}

/// An entry of a [`ChunkEventBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchItem {
    Event(ExtractionEvent),
    /// Terminal marker, emitted once after the input is exhausted.
    End,
}

/// Events produced while consuming exactly one input chunk.
///
/// Created empty at chunk start, filled while the chunk's notifications are
/// replayed, and drained by the emitter before the next chunk is read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkEventBatch {
    items: Vec<BatchItem>,
}

impl ChunkEventBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: ExtractionEvent) {
        self.items.push(BatchItem::Event(event));
    }

    /// Append the terminal marker. Nothing may follow it.
    pub fn push_end(&mut self) {
        debug_assert!(!self.has_end(), "end marker pushed twice");
        self.items.push(BatchItem::End);
    }

    #[must_use]
    pub fn has_end(&self) -> bool {
        matches!(self.items.last(), Some(BatchItem::End))
    }

    /// Number of extraction events, not counting the end marker.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, BatchItem::Event(_)))
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Take all items out, leaving the batch empty for reuse.
    pub fn drain(&mut self) -> std::vec::Drain<'_, BatchItem> {
        self.items.drain(..)
    }
}
