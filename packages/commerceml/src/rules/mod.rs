//! Collect rules: which subtrees to extract and which descendants to keep.
//!
//! A rule names an absolute start path and a set of include prefixes. The
//! rule table is the only per-document-type customization point; tables
//! for the CommerceML exchange files live in [`config`].

pub mod config;
mod path;
mod types;

pub use config::{import_rules, offers_rules, orders_rules, Variant};
pub use path::{path_equals, path_starts_with, PathTracker};
pub use types::{CollectRule, RuleTable};
