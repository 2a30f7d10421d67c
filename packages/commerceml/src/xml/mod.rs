//! XML-level building blocks: escaping and the push tokenizer.

mod escape;
pub mod tokenizer;

pub use escape::{escape_attribute, escape_text, unescape};
pub use tokenizer::{Notification, TextOptions, Tokenizer};
