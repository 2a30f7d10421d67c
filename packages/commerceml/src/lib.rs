//! CommerceML Parser - Streaming extraction from 1C exchange files.
//!
//! CommerceML exchange files (`import.xml`, `offers.xml`, `orders.xml`) can
//! be far too large to load as a document tree. This crate reads them as a
//! stream of chunks, cuts out the subtrees named by a rule table, converts
//! each one to a generic [`Value`] tree and hands it to the listeners
//! registered for that rule, one at a time and in document order.
//!
//! # Example
//!
//! ```
//! use commerceml_parser::{CollectRule, CommerceMlParser, ListenerError, RuleTable, Value};
//! use std::sync::{Arc, Mutex};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let rules = RuleTable::new("items")
//!     .with_rule("item", CollectRule::new(["Root", "Item"]).include_all());
//! let mut parser = CommerceMlParser::new(rules);
//!
//! let names = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&names);
//! parser
//!     .on("item", move |item: Value| {
//!         let sink = Arc::clone(&sink);
//!         async move {
//!             sink.lock().unwrap().push(item.get("Name").cloned());
//!             Ok::<(), ListenerError>(())
//!         }
//!     })
//!     .unwrap();
//!
//! parser
//!     .parse_str("<Root><Item><Name>a</Name></Item><Item><Name>b</Name></Item></Root>")
//!     .await
//!     .unwrap();
//! assert_eq!(names.lock().unwrap().len(), 2);
//! # });
//! ```
//!
//! # Architecture
//!
//! - [`xml`]: Push tokenizer and escaping helpers
//! - [`rules`]: Collect rules, path predicates and the shipped rule tables
//! - [`collector`]: The `Idle`/`Collecting` extraction state machine
//! - [`object`]: Generic object tree and fragment conversion
//! - [`events`]: Extraction events and per-chunk batches
//! - [`emitter`]: Listener registry and serial delivery
//! - [`source`]: Chunk sources (readers, strings, iterators)
//! - [`parser`]: The parser facade and chunk driver
//! - [`config`]: Configuration constants and validation
//! - [`error`]: Error types and Result alias
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod collector;
pub mod config;
pub mod emitter;
pub mod error;
pub mod events;
pub mod object;
pub mod parser;
pub mod rules;
pub mod source;
pub mod xml;

// Re-export commonly used items
pub use config::ParserConfig;
pub use emitter::{EndListener, EventListener};
pub use error::{ListenerError, ParserError, Result};
pub use events::ExtractionEvent;
pub use object::Value;
pub use parser::{CommerceMlParser, ParseSummary};
pub use rules::{CollectRule, RuleTable, Variant};
pub use source::{ChunkSource, IterSource, ReaderSource, StrSource};
