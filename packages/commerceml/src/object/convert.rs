//! Fragment to object tree conversion.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use roxmltree::{Document, Node};

use super::{Value, ATTRIBUTE_PREFIX, TEXT_KEY};
use crate::error::Result;

/// Convert a well-formed XML fragment into the object tree of its root
/// element.
///
/// # Errors
/// Returns `ParserError::Fragment` if `xml` is not well-formed.
///
/// # Examples
/// ```
/// use commerceml_parser::object::fragment_to_value;
/// use commerceml_parser::Value;
///
/// let value = fragment_to_value("<Item><Id>1</Id><Name>First</Name></Item>").unwrap();
/// assert_eq!(value, Value::map([("Id", "1".into()), ("Name", "First".into())]));
/// ```
pub fn fragment_to_value(xml: &str) -> Result<Value> {
    let doc = Document::parse(xml)?;
    Ok(element_to_value(doc.root_element()))
}

fn element_to_value(node: Node<'_, '_>) -> Value {
    let mut map: BTreeMap<String, Value> = node
        .attributes()
        .map(|attr| {
            (
                format!("{ATTRIBUTE_PREFIX}{}", attr.name()),
                Value::Text(attr.value().to_string()),
            )
        })
        .collect();
    let mut text = String::new();
    let mut has_children = false;

    for child in node.children() {
        if child.is_element() {
            has_children = true;
            insert_child(&mut map, child.tag_name().name(), element_to_value(child));
        } else if let Some(content) = child.text().filter(|_| child.is_text()) {
            text.push_str(content);
        }
    }

    if map.is_empty() && !has_children {
        return Value::Text(text);
    }

    if !text.trim().is_empty() {
        map.insert(TEXT_KEY.to_string(), Value::Text(text));
    }
    Value::Map(map)
}

/// Insert a child element, folding repeated tags into a list.
fn insert_child(map: &mut BTreeMap<String, Value>, name: &str, value: Value) {
    match map.entry(name.to_string()) {
        Entry::Vacant(slot) => {
            slot.insert(value);
        }
        Entry::Occupied(mut slot) => match slot.get_mut() {
            Value::List(items) => items.push(value),
            existing => {
                let first = std::mem::take(existing);
                *existing = Value::List(vec![first, value]);
            }
        },
    }
}
