//! Listener registry and the serial event emitter.
//!
//! Listeners are keyed by rule. Delivery is strictly serial: every listener
//! of one event completes before the next event (or listener) starts, and a
//! whole chunk's batch is delivered before the next chunk is read.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::error::{ListenerError, ParserError, Result};
use crate::events::{BatchItem, ChunkEventBatch, ExtractionEvent};
use crate::object::Value;

/// Handler for extraction events of one rule.
///
/// Any `FnMut(Value) -> impl Future<Output = Result<(), ListenerError>>`
/// closure is a listener.
#[async_trait]
pub trait EventListener: Send {
    async fn handle(&mut self, payload: &Value) -> std::result::Result<(), ListenerError>;
}

#[async_trait]
impl<F, Fut> EventListener for F
where
    F: FnMut(Value) -> Fut + Send,
    Fut: Future<Output = std::result::Result<(), ListenerError>> + Send + 'static,
{
    async fn handle(&mut self, payload: &Value) -> std::result::Result<(), ListenerError> {
        (self)(payload.clone()).await
    }
}

/// Handler for the terminal end event.
#[async_trait]
pub trait EndListener: Send {
    async fn finished(&mut self) -> std::result::Result<(), ListenerError>;
}

#[async_trait]
impl<F, Fut> EndListener for F
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = std::result::Result<(), ListenerError>> + Send + 'static,
{
    async fn finished(&mut self) -> std::result::Result<(), ListenerError> {
        (self)().await
    }
}

/// Registry mapping rule keys to their listeners, in registration order.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: HashMap<String, Vec<Box<dyn EventListener>>>,
    end: Vec<Box<dyn EndListener>>,
}

impl ListenerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for a rule key. Several listeners per key run in
    /// registration order.
    pub fn register(&mut self, rule: impl Into<String>, listener: impl EventListener + 'static) {
        self.listeners
            .entry(rule.into())
            .or_default()
            .push(Box::new(listener));
    }

    /// Register a listener for the end event.
    pub fn register_end(&mut self, listener: impl EndListener + 'static) {
        self.end.push(Box::new(listener));
    }

    #[must_use]
    pub fn has_listeners(&self, rule: &str) -> bool {
        self.listeners.get(rule).is_some_and(|list| !list.is_empty())
    }

    #[must_use]
    pub fn listener_count(&self, rule: &str) -> usize {
        self.listeners.get(rule).map_or(0, Vec::len)
    }

    #[must_use]
    pub fn end_listener_count(&self) -> usize {
        self.end.len()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<&str, usize> = self
            .listeners
            .iter()
            .map(|(rule, list)| (rule.as_str(), list.len()))
            .collect();
        f.debug_struct("ListenerRegistry")
            .field("listeners", &counts)
            .field("end", &self.end.len())
            .finish()
    }
}

/// Delivers batches to a registry one listener at a time.
#[derive(Debug, Default)]
pub struct SerialEmitter {
    registry: ListenerRegistry,
    delivered: usize,
}

impl SerialEmitter {
    #[must_use]
    pub fn new(registry: ListenerRegistry) -> Self {
        Self {
            registry,
            delivered: 0,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &ListenerRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ListenerRegistry {
        &mut self.registry
    }

    /// Events delivered since the last [`SerialEmitter::reset_count`].
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    pub fn reset_count(&mut self) {
        self.delivered = 0;
    }

    /// Drain `batch`, awaiting each listener in turn.
    ///
    /// On the first failure the remaining items are discarded and the error
    /// is returned; no later listener runs.
    ///
    /// # Errors
    /// Returns `ParserError::Listener` wrapping the listener's failure.
    pub async fn emit_batch(&mut self, batch: &mut ChunkEventBatch) -> Result<()> {
        for item in batch.drain() {
            match item {
                BatchItem::Event(event) => self.emit(&event).await?,
                BatchItem::End => self.emit_end().await?,
            }
        }
        Ok(())
    }

    async fn emit(&mut self, event: &ExtractionEvent) -> Result<()> {
        let Some(listeners) = self.registry.listeners.get_mut(&event.rule) else {
            trace!(rule = %event.rule, "no listener registered, dropping event");
            return Ok(());
        };

        debug!(rule = %event.rule, listeners = listeners.len(), "emitting event");
        for listener in listeners.iter_mut() {
            listener
                .handle(&event.payload)
                .await
                .map_err(|source| ParserError::Listener {
                    rule: event.rule.clone(),
                    source,
                })?;
        }
        self.delivered += 1;
        Ok(())
    }

    async fn emit_end(&mut self) -> Result<()> {
        debug!(listeners = self.registry.end.len(), "emitting end");
        for listener in &mut self.registry.end {
            listener
                .finished()
                .await
                .map_err(|source| ParserError::Listener {
                    rule: "end".to_string(),
                    source,
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type Log = Arc<Mutex<Vec<String>>>;

    fn recorder(log: &Log, label: &'static str, delay_ms: u64) -> impl EventListener + 'static {
        let log = Arc::clone(log);
        move |payload: Value| {
            let log = Arc::clone(&log);
            async move {
                let text = payload.as_text().unwrap_or_default().to_string();
                log.lock().unwrap().push(format!("{label}:{text}:start"));
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                log.lock().unwrap().push(format!("{label}:{text}:end"));
                Ok::<(), ListenerError>(())
            }
        }
    }

    #[tokio::test]
    async fn test_listeners_run_one_at_a_time() {
        let log: Log = Arc::default();
        let mut registry = ListenerRegistry::new();
        registry.register("a", recorder(&log, "a", 20));
        registry.register("b", recorder(&log, "b", 1));

        let mut batch = ChunkEventBatch::new();
        batch.push(ExtractionEvent::new("a", "1".into()));
        batch.push(ExtractionEvent::new("b", "2".into()));
        batch.push(ExtractionEvent::new("a", "3".into()));

        let mut emitter = SerialEmitter::new(registry);
        emitter.emit_batch(&mut batch).await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "a:1:start", "a:1:end", "b:2:start", "b:2:end", "a:3:start", "a:3:end",
            ]
        );
        assert_eq!(emitter.delivered(), 3);
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_multiple_listeners_in_registration_order() {
        let log: Log = Arc::default();
        let mut registry = ListenerRegistry::new();
        registry.register("a", recorder(&log, "first", 5));
        registry.register("a", recorder(&log, "second", 0));
        assert_eq!(registry.listener_count("a"), 2);

        let mut batch = ChunkEventBatch::new();
        batch.push(ExtractionEvent::new("a", "x".into()));
        SerialEmitter::new(registry)
            .emit_batch(&mut batch)
            .await
            .unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["first:x:start", "first:x:end", "second:x:start", "second:x:end"]
        );
    }

    #[tokio::test]
    async fn test_failure_stops_delivery() {
        let log: Log = Arc::default();
        let mut registry = ListenerRegistry::new();
        registry.register("bad", |_payload: Value| async {
            Err::<(), ListenerError>("rejected".into())
        });
        registry.register("a", recorder(&log, "a", 0));

        let mut batch = ChunkEventBatch::new();
        batch.push(ExtractionEvent::new("a", "1".into()));
        batch.push(ExtractionEvent::new("bad", "2".into()));
        batch.push(ExtractionEvent::new("a", "3".into()));

        let err = SerialEmitter::new(registry)
            .emit_batch(&mut batch)
            .await
            .unwrap_err();

        assert!(matches!(err, ParserError::Listener { ref rule, .. } if rule == "bad"));
        assert_eq!(*log.lock().unwrap(), vec!["a:1:start", "a:1:end"]);
    }

    #[tokio::test]
    async fn test_unlistened_events_are_dropped_and_end_runs() {
        let ended = Arc::new(Mutex::new(0));
        let mut registry = ListenerRegistry::new();
        let counter = Arc::clone(&ended);
        registry.register_end(move || {
            let counter = Arc::clone(&counter);
            async move {
                *counter.lock().unwrap() += 1;
                Ok::<(), ListenerError>(())
            }
        });

        let mut batch = ChunkEventBatch::new();
        batch.push(ExtractionEvent::new("nobody", "1".into()));
        batch.push_end();

        let mut emitter = SerialEmitter::new(registry);
        emitter.emit_batch(&mut batch).await.unwrap();

        assert_eq!(emitter.delivered(), 0);
        assert_eq!(*ended.lock().unwrap(), 1);
    }
}
