//! Parser facade: rule table, listeners and the chunk driver.

use std::path::Path;

use tokio::io::AsyncRead;
use tracing::{debug, info};

use crate::collector::SubtreeCollector;
use crate::config::ParserConfig;
use crate::emitter::{EndListener, EventListener, ListenerRegistry, SerialEmitter};
use crate::error::{ParserError, Result};
use crate::events::ChunkEventBatch;
use crate::rules::{RuleTable, Variant};
use crate::source::{ChunkSource, ReaderSource, StrSource};
use crate::xml::{Notification, TextOptions, Tokenizer};

/// Totals of one completed parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseSummary {
    /// Chunks read from the source.
    pub chunks: usize,
    /// Bytes of decoded input.
    pub bytes: usize,
    /// Extraction events produced.
    pub events: usize,
    /// Events that reached at least one listener.
    pub delivered: usize,
}

/// Streaming CommerceML parser.
///
/// Register listeners per rule key, then call one of the `parse*` methods.
/// Listeners run one at a time in document order, and the next input chunk
/// is only read once every event of the current chunk has been handled.
///
/// # Examples
/// ```no_run
/// use commerceml_parser::{CommerceMlParser, ListenerError, Value};
///
/// # async fn run() -> commerceml_parser::Result<()> {
/// let mut parser = CommerceMlParser::import();
/// parser.on("product", |product: Value| async move {
///     println!("{:?}", product.get("Наименование"));
///     Ok::<(), ListenerError>(())
/// })?;
/// parser.parse_file("import.xml").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CommerceMlParser {
    rules: RuleTable,
    variant: Option<Variant>,
    config: ParserConfig,
    emitter: SerialEmitter,
}

impl CommerceMlParser {
    /// Parser for a custom rule table.
    #[must_use]
    pub fn new(rules: RuleTable) -> Self {
        Self {
            rules,
            variant: None,
            config: ParserConfig::default(),
            emitter: SerialEmitter::new(ListenerRegistry::new()),
        }
    }

    /// Parser for one of the shipped document types.
    #[must_use]
    pub fn for_variant(variant: Variant) -> Self {
        Self {
            variant: Some(variant),
            ..Self::new(variant.rules())
        }
    }

    /// Parser for catalog import files.
    #[must_use]
    pub fn import() -> Self {
        Self::for_variant(Variant::Import)
    }

    /// Parser for offers files.
    #[must_use]
    pub fn offers() -> Self {
        Self::for_variant(Variant::Offers)
    }

    /// Parser for order exchange files.
    #[must_use]
    pub fn orders() -> Self {
        Self::for_variant(Variant::Orders)
    }

    #[must_use]
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    #[must_use]
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Register a listener for events of `rule`.
    ///
    /// # Errors
    /// Returns `ParserError::UnknownRule` if the rule table has no such key.
    pub fn on(
        &mut self,
        rule: &str,
        listener: impl EventListener + 'static,
    ) -> Result<&mut Self> {
        if !self.rules.contains(rule) {
            return Err(ParserError::UnknownRule {
                rule: rule.to_string(),
                variant: self
                    .variant
                    .map(|v| v.to_string())
                    .or_else(|| self.rules.name().map(str::to_string)),
            });
        }
        self.emitter.registry_mut().register(rule, listener);
        Ok(self)
    }

    /// Register a listener for the end event, fired once after the input is
    /// exhausted and every extraction event has been handled.
    pub fn on_end(&mut self, listener: impl EndListener + 'static) -> &mut Self {
        self.emitter.registry_mut().register_end(listener);
        self
    }

    /// Parse a document from `source`.
    ///
    /// Every call starts from a fresh state; after a failure the parser can
    /// be reused with a new source.
    ///
    /// # Errors
    /// Fails on malformed markup, on the first listener failure, on invalid
    /// configuration and on source errors. Events already delivered stay
    /// delivered; the end event does not fire.
    pub async fn parse<S: ChunkSource>(&mut self, mut source: S) -> Result<ParseSummary> {
        self.rules.validate()?;
        self.config.validate()?;

        let mut tokenizer = Tokenizer::new(TextOptions::from(&self.config));
        let mut collector = SubtreeCollector::new(&self.rules);
        let mut notifications: Vec<Notification> = Vec::new();
        let mut batch = ChunkEventBatch::new();
        let mut summary = ParseSummary::default();
        self.emitter.reset_count();

        while let Some(chunk) = source.next_chunk().await? {
            tokenizer.feed(&chunk, &mut notifications)?;
            let notified = notifications.len();
            for notification in notifications.drain(..) {
                collector.handle(notification, &mut batch)?;
            }

            summary.chunks += 1;
            summary.bytes += chunk.len();
            summary.events += batch.event_count();
            debug!(
                chunk = summary.chunks,
                bytes = chunk.len(),
                notifications = notified,
                events = batch.event_count(),
                "chunk processed"
            );

            self.emitter.emit_batch(&mut batch).await?;
        }

        tokenizer.end(&mut notifications)?;
        for notification in notifications.drain(..) {
            collector.handle(notification, &mut batch)?;
        }
        collector.finish(&mut batch)?;
        summary.events += batch.event_count();
        batch.push_end();
        self.emitter.emit_batch(&mut batch).await?;

        summary.delivered = self.emitter.delivered();
        info!(
            chunks = summary.chunks,
            bytes = summary.bytes,
            events = summary.events,
            delivered = summary.delivered,
            "parse finished"
        );
        Ok(summary)
    }

    /// Parse from an async reader, `config.chunk_size` bytes at a time.
    ///
    /// # Errors
    /// See [`CommerceMlParser::parse`].
    pub async fn parse_reader<R>(&mut self, reader: R) -> Result<ParseSummary>
    where
        R: AsyncRead + Unpin + Send,
    {
        let source = ReaderSource::with_chunk_size(reader, self.config.chunk_size);
        self.parse(source).await
    }

    /// Parse a file.
    ///
    /// # Errors
    /// Returns `ParserError::Io` if the file cannot be opened, otherwise see
    /// [`CommerceMlParser::parse`].
    pub async fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<ParseSummary> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening input file");
        let file = tokio::fs::File::open(path).await?;
        self.parse_reader(file).await
    }

    /// Parse an in-memory document, split into `config.chunk_size` chunks.
    ///
    /// # Errors
    /// See [`CommerceMlParser::parse`].
    pub async fn parse_str(&mut self, xml: &str) -> Result<ParseSummary> {
        let source = StrSource::with_chunk_size(xml, self.config.chunk_size);
        self.parse(source).await
    }
}
