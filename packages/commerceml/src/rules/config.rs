//! Rule tables for the CommerceML document types.
//!
//! Each exchange file type (catalog import, offers, orders) gets one static
//! table. Nested lists that belong to another rule (groups inside a
//! classifier, products inside a catalog) are left out of the parent's
//! include set so they are not duplicated into its fragment.

use std::fmt;
use std::str::FromStr;

use super::types::{CollectRule, RuleTable};
use crate::error::ParserError;

/// Root element of every CommerceML document.
pub const ROOT: &str = "КоммерческаяИнформация";

/// Build a path under the document root.
fn at(path: &[&str]) -> Vec<String> {
    std::iter::once(ROOT)
        .chain(path.iter().copied())
        .map(String::from)
        .collect()
}

fn classifier_rule() -> CollectRule {
    CollectRule::new(at(&["Классификатор"])).include_children(&["Ид", "Наименование", "Владелец"])
}

fn classifier_property_rule() -> CollectRule {
    CollectRule::new(at(&["Классификатор", "Свойства", "Свойство"])).include_all()
}

/// Rules for catalog import files (`import.xml`).
#[must_use]
pub fn import_rules() -> RuleTable {
    RuleTable::new("import")
        .with_rule("commercialInformation", CollectRule::new(at(&[])))
        .with_rule("classifier", classifier_rule())
        .with_rule(
            "classifierGroup",
            CollectRule::new(at(&["Классификатор", "Группы", "Группа"])).include_all(),
        )
        .with_rule("classifierProperty", classifier_property_rule())
        .with_rule(
            "catalog",
            CollectRule::new(at(&["Каталог"])).include_children(&[
                "Ид",
                "ИдКлассификатора",
                "Наименование",
                "Владелец",
            ]),
        )
        .with_rule(
            "product",
            CollectRule::new(at(&["Каталог", "Товары", "Товар"])).include_all(),
        )
}

/// Rules for offers files (`offers.xml`).
#[must_use]
pub fn offers_rules() -> RuleTable {
    RuleTable::new("offers")
        .with_rule("commercialInformation", CollectRule::new(at(&[])))
        .with_rule("classifier", classifier_rule())
        .with_rule("classifierProperty", classifier_property_rule())
        .with_rule(
            "offersPackage",
            CollectRule::new(at(&["ПакетПредложений"])).include_children(&[
                "Ид",
                "Наименование",
                "ИдКаталога",
                "ИдКлассификатора",
                "Владелец",
                "ТипыЦен",
            ]),
        )
        .with_rule(
            "warehouse",
            CollectRule::new(at(&["ПакетПредложений", "Склады", "Склад"])).include_all(),
        )
        .with_rule(
            "offer",
            CollectRule::new(at(&["ПакетПредложений", "Предложения", "Предложение"]))
                .include_all(),
        )
}

/// Rules for order exchange files (`orders.xml`).
#[must_use]
pub fn orders_rules() -> RuleTable {
    RuleTable::new("orders")
        .with_rule("commercialInfo", CollectRule::new(at(&[])))
        .with_rule("document", CollectRule::new(at(&["Документ"])).include_all())
}

/// The shipped document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    #[default]
    Import,
    Offers,
    Orders,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Import, Variant::Offers, Variant::Orders];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Import => "import",
            Variant::Offers => "offers",
            Variant::Orders => "orders",
        }
    }

    /// The rule table for this document type.
    #[must_use]
    pub fn rules(self) -> RuleTable {
        match self {
            Variant::Import => import_rules(),
            Variant::Offers => offers_rules(),
            Variant::Orders => orders_rules(),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = ParserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                ParserError::Config(format!(
                    "unknown document type '{s}' (expected import, offers or orders)"
                ))
            })
    }
}
