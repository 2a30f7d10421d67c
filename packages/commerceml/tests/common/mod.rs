#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use commerceml_parser::{CommerceMlParser, ListenerError, Value};

/// Events seen by [`record_all`], as `(rule, payload)` in delivery order.
pub type Recorded = Arc<Mutex<Vec<(String, Value)>>>;

pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn load_fixture(name: &str) -> String {
    let path = fixture_path(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

/// Register a recording listener for every rule of the parser's table.
pub fn record_all(parser: &mut CommerceMlParser) -> Recorded {
    let recorded: Recorded = Arc::default();
    let keys: Vec<String> = parser.rules().keys().map(str::to_string).collect();

    for key in keys {
        let sink = Arc::clone(&recorded);
        let rule = key.clone();
        parser
            .on(&key, move |payload: Value| {
                let sink = Arc::clone(&sink);
                let rule = rule.clone();
                async move {
                    sink.lock().unwrap().push((rule, payload));
                    Ok::<(), ListenerError>(())
                }
            })
            .unwrap();
    }

    recorded
}

pub fn rules_of(recorded: &Recorded) -> Vec<String> {
    recorded
        .lock()
        .unwrap()
        .iter()
        .map(|(rule, _)| rule.clone())
        .collect()
}

pub fn payloads_of(recorded: &Recorded, rule: &str) -> Vec<Value> {
    recorded
        .lock()
        .unwrap()
        .iter()
        .filter(|(key, _)| key == rule)
        .map(|(_, payload)| payload.clone())
        .collect()
}

pub fn text<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    value.pointer(keys).and_then(Value::text)
}
