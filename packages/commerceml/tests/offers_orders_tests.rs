//! Offers and order exchange files parsed with the shipped rules.

mod common;

use std::io::Write;

use commerceml_parser::{CommerceMlParser, ParserError, Value, Variant};
use pretty_assertions::assert_eq;

use common::{fixture_path, load_fixture, payloads_of, record_all, rules_of, text};

#[tokio::test]
async fn test_offers_event_sequence() {
    let mut parser = CommerceMlParser::offers();
    let recorded = record_all(&mut parser);
    parser.parse_file(fixture_path("offers.xml")).await.unwrap();

    assert_eq!(
        rules_of(&recorded),
        vec![
            "commercialInformation",
            "offersPackage",
            "warehouse",
            "warehouse",
            "offer",
            "offer",
        ]
    );
}

#[tokio::test]
async fn test_offers_package_keeps_price_types_only() {
    let mut parser = CommerceMlParser::offers();
    let recorded = record_all(&mut parser);
    parser.parse_file(fixture_path("offers.xml")).await.unwrap();

    let package = &payloads_of(&recorded, "offersPackage")[0];
    assert_eq!(text(package, &["ИдКаталога"]), Some("cat-1"));
    let price_types = package
        .get("ТипыЦен")
        .map(|types| types.items("ТипЦены"))
        .unwrap_or_default();
    assert_eq!(price_types.len(), 2);
    assert_eq!(text(price_types[1], &["Наименование"]), Some("Оптовая"));
    assert!(package.get("Склады").is_none());
    assert!(package.get("Предложения").is_none());

    let warehouses = payloads_of(&recorded, "warehouse");
    assert_eq!(
        warehouses[1],
        Value::map([("Ид", "wh-2".into()), ("Наименование", "Склад на Ленина".into())])
    );
}

#[tokio::test]
async fn test_offer_prices_and_stock() {
    let mut parser = CommerceMlParser::offers();
    let recorded = record_all(&mut parser);
    parser.parse_file(fixture_path("offers.xml")).await.unwrap();

    let offers = payloads_of(&recorded, "offer");
    let prices = offers[0]
        .get("Цены")
        .map(|prices| prices.items("Цена"))
        .unwrap_or_default();
    let amounts: Vec<_> = prices
        .iter()
        .filter_map(|price| text(price, &["ЦенаЗаЕдиницу"]))
        .collect();
    assert_eq!(amounts, vec!["450.00", "390.00"]);

    let stock: Vec<_> = offers[0]
        .items("Склад")
        .into_iter()
        .filter_map(|warehouse| warehouse.attribute("КоличествоНаСкладе"))
        .collect();
    assert_eq!(stock, vec!["10", "2"]);

    // A single price still reads as a sequence.
    let single = offers[1]
        .get("Цены")
        .map(|prices| prices.items("Цена").len());
    assert_eq!(single, Some(1));
}

#[tokio::test]
async fn test_orders_documents() {
    let mut parser = CommerceMlParser::orders();
    let recorded = record_all(&mut parser);
    parser.parse_file(fixture_path("orders.xml")).await.unwrap();

    assert_eq!(
        rules_of(&recorded),
        vec!["commercialInfo", "document", "document"]
    );

    let documents = payloads_of(&recorded, "document");
    assert_eq!(text(&documents[0], &["Номер"]), Some("1001"));
    assert_eq!(
        text(&documents[0], &["Контрагенты", "Контрагент", "Наименование"]),
        Some("Иванов Иван")
    );
    let lines = documents[0]
        .get("Товары")
        .map(|lines| lines.items("Товар").len());
    assert_eq!(lines, Some(2));
    assert!(documents[1].get("Контрагенты").is_none());
}

#[tokio::test]
async fn test_parse_file_from_temp_dir() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(load_fixture("orders.xml").as_bytes()).unwrap();
    file.flush().unwrap();

    let mut parser = CommerceMlParser::for_variant(Variant::Orders);
    let recorded = record_all(&mut parser);
    let summary = parser.parse_file(file.path()).await.unwrap();

    assert_eq!(summary.events, 3);
    assert_eq!(payloads_of(&recorded, "document").len(), 2);
}

#[tokio::test]
async fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut parser = CommerceMlParser::orders();
    let err = parser
        .parse_file(dir.path().join("missing.xml"))
        .await
        .unwrap_err();
    assert!(matches!(err, ParserError::Io(_)));
}

#[test]
fn test_rules_are_variant_specific() {
    let mut orders = CommerceMlParser::orders();
    let err = orders
        .on("offer", |_: Value| async {
            Ok::<(), commerceml_parser::ListenerError>(())
        })
        .unwrap_err();
    assert!(matches!(err, ParserError::UnknownRule { ref rule, .. } if rule == "offer"));
}
