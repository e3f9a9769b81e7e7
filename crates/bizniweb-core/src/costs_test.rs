use std::io::Write;

use super::*;

const SAMPLE: &str = r#"
reporting_currency: EUR
currency_rates:
  CZK: 0.0398
  huf: 0.0025
packaging_cost_per_order: 0.45
fixed_daily_cost: 12
excluded_statuses: [Storno, "Vrátená"]
products:
  - name: "Vevo Shampoo 250ml"
    ean: "8588000000001"
    cost: 3.10
  - name: "Vevo Conditioner"
    cost: 2.5
"#;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

#[test]
fn parses_sample_table() {
    let table = CostTable::from_yaml_str(SAMPLE).unwrap();
    assert_eq!(table.reporting_currency(), "EUR");
    assert_eq!(table.packaging_cost_per_order(), dec("0.45"));
    assert_eq!(table.fixed_daily_cost(), dec("12"));
    assert_eq!(table.products().len(), 2);
}

#[test]
fn product_cost_prefers_ean_over_label() {
    let table = CostTable::from_yaml_str(SAMPLE).unwrap();
    assert_eq!(
        table.product_cost(Some("Renamed in shop"), Some("8588000000001")),
        Some(dec("3.10"))
    );
}

#[test]
fn product_cost_falls_back_to_case_insensitive_label() {
    let table = CostTable::from_yaml_str(SAMPLE).unwrap();
    assert_eq!(
        table.product_cost(Some("  vevo CONDITIONER "), Some("0000")),
        Some(dec("2.5"))
    );
    assert_eq!(table.product_cost(Some("Unknown"), None), None);
    assert_eq!(table.product_cost(None, None), None);
}

#[test]
fn rate_is_one_for_reporting_currency_and_case_insensitive_otherwise() {
    let table = CostTable::from_yaml_str(SAMPLE).unwrap();
    assert_eq!(table.rate("eur"), Some(Decimal::ONE));
    assert_eq!(table.rate("CZK"), Some(dec("0.0398")));
    assert_eq!(table.rate("HUF"), Some(dec("0.0025")));
    assert_eq!(table.rate("USD"), None);
}

#[test]
fn excluded_statuses_match_case_insensitively() {
    let table = CostTable::from_yaml_str(SAMPLE).unwrap();
    assert!(table.is_excluded_status("storno"));
    assert!(table.is_excluded_status("VRÁTENÁ"));
    assert!(!table.is_excluded_status("Odoslaná"));
}

#[test]
fn defaults_exclude_storno_and_report_in_eur() {
    let table = CostTable::from_yaml_str("products: []").unwrap();
    assert_eq!(table.reporting_currency(), "EUR");
    assert!(table.is_excluded_status("Storno"));
    assert_eq!(table.fixed_daily_cost(), Decimal::ZERO);
}

#[test]
fn rejects_duplicate_product_names() {
    let yaml = r"
products:
  - { name: A, cost: 1 }
  - { name: a, cost: 2 }
";
    let err = CostTable::from_yaml_str(yaml).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("duplicate product name")));
}

#[test]
fn rejects_duplicate_eans() {
    let yaml = r#"
products:
  - { name: A, ean: "1", cost: 1 }
  - { name: B, ean: "1", cost: 2 }
"#;
    let err = CostTable::from_yaml_str(yaml).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("duplicate product EAN")));
}

#[test]
fn rejects_negative_cost() {
    let yaml = "products:\n  - { name: A, cost: -1 }\n";
    assert!(matches!(
        CostTable::from_yaml_str(yaml),
        Err(ConfigError::Validation(_))
    ));
}

#[test]
fn rejects_non_positive_rate() {
    let yaml = "currency_rates: { CZK: 0 }\n";
    assert!(matches!(
        CostTable::from_yaml_str(yaml),
        Err(ConfigError::Validation(_))
    ));
}

#[test]
fn malformed_yaml_is_a_parse_error() {
    let result = CostTable::from_yaml_str("products: [ {name: ");
    assert!(matches!(result, Err(ConfigError::CostsFileParse(_))));
}

#[test]
fn load_costs_reads_file_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SAMPLE.as_bytes()).unwrap();
    let table = load_costs(file.path()).unwrap();
    assert_eq!(table.products().len(), 2);
}

#[test]
fn load_costs_missing_file_is_io_error() {
    let result = load_costs(Path::new("/definitely/not/here/costs.yaml"));
    assert!(matches!(result, Err(ConfigError::CostsFileIo { .. })));
}
