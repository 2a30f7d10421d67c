//! Generic object tree produced from extracted fragments.
//!
//! Every element becomes a [`Value`]: a leaf with only text becomes
//! [`Value::Text`], anything with attributes or child elements becomes a
//! [`Value::Map`], and repeated child tags fold into a [`Value::List`].
//! Typed business records are projected from these trees by the caller.

mod convert;

use std::collections::BTreeMap;

use serde::Serialize;

pub use convert::fragment_to_value;

/// Prefix marking attribute keys in a [`Value::Map`].
pub const ATTRIBUTE_PREFIX: &str = "_";

/// Key holding the text of an element that also has attributes or children.
pub const TEXT_KEY: &str = "__text";

/// A generic object tree node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Default for Value {
    fn default() -> Self {
        Value::Text(String::new())
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl Value {
    /// Build a map value from key/value pairs.
    ///
    /// # Examples
    /// ```
    /// use commerceml_parser::Value;
    ///
    /// let item = Value::map([("Id", "1".into()), ("Name", "First".into())]);
    /// assert_eq!(item.get("Id").and_then(Value::as_text), Some("1"));
    /// ```
    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Child value under `key`, if this is a map.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Follow a sequence of keys through nested maps.
    #[must_use]
    pub fn pointer(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter().try_fold(self, |value, key| value.get(key))
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Value of attribute `name` on this element.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.get(&format!("{ATTRIBUTE_PREFIX}{name}"))
            .and_then(Value::as_text)
    }

    /// Text content of this element, whether it is a plain leaf or carries
    /// attributes as well.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            Value::Map(map) => map.get(TEXT_KEY).and_then(Value::as_text),
            Value::List(_) => None,
        }
    }

    /// Children under `key` as a sequence.
    ///
    /// A single child is returned as a one-element sequence and a missing key
    /// as an empty one, so callers need not care whether a tag occurred once
    /// or many times.
    ///
    /// # Examples
    /// ```
    /// use commerceml_parser::Value;
    ///
    /// let one = Value::map([("Price", "10".into())]);
    /// assert_eq!(one.items("Price").len(), 1);
    /// assert!(one.items("Missing").is_empty());
    /// ```
    #[must_use]
    pub fn items(&self, key: &str) -> Vec<&Value> {
        match self.get(key) {
            None => Vec::new(),
            Some(Value::List(items)) => items.iter().collect(),
            Some(value) => vec![value],
        }
    }

    /// Owned counterpart of [`Value::items`] for a value already in hand.
    #[must_use]
    pub fn into_list(self) -> Vec<Value> {
        match self {
            Value::List(items) => items,
            value => vec![value],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn product() -> Value {
        Value::map([
            ("Ид", "p1".into()),
            (
                "БазоваяЕдиница",
                Value::map([("_Код", "796".into()), (TEXT_KEY, "шт".into())]),
            ),
            (
                "ЗначенияСвойств",
                Value::map([(
                    "ЗначенияСвойства",
                    Value::List(vec![
                        Value::map([("Ид", "a".into())]),
                        Value::map([("Ид", "b".into())]),
                    ]),
                )]),
            ),
        ])
    }

    #[test]
    fn test_attribute_and_text() {
        let unit = product().get("БазоваяЕдиница").cloned().unwrap();
        assert_eq!(unit.attribute("Код"), Some("796"));
        assert_eq!(unit.text(), Some("шт"));
        assert_eq!(Value::from("x").text(), Some("x"));
    }

    #[test]
    fn test_pointer() {
        let product = product();
        let values = product.pointer(&["ЗначенияСвойств", "ЗначенияСвойства"]);
        assert_eq!(values.and_then(Value::as_list).map(<[Value]>::len), Some(2));
        assert!(product.pointer(&["Ид", "deeper"]).is_none());
    }

    #[test]
    fn test_items_normalizes_cardinality() {
        let product = product();
        let values = product.get("ЗначенияСвойств").unwrap();
        assert_eq!(values.items("ЗначенияСвойства").len(), 2);
        assert_eq!(product.items("Ид"), vec![&Value::from("p1")]);
        assert!(product.items("Штрихкод").is_empty());
    }

    #[test]
    fn test_into_list() {
        assert_eq!(Value::from("x").into_list(), vec![Value::from("x")]);
        assert_eq!(Value::List(vec![]).into_list(), Vec::<Value>::new());
    }

    #[test]
    fn test_serialize_json() {
        let value = Value::map([("Id", "1".into()), ("Tags", Value::List(vec!["a".into(), "b".into()]))]);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"Id":"1","Tags":["a","b"]}"#);
    }
}
