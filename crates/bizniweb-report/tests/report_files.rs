//! End-to-end: orders -> rows -> report -> files on disk.

use std::collections::HashSet;

use bizniweb_ads::DailySpend;
use bizniweb_core::{CostTable, DateRange};
use bizniweb_orders::Order;
use bizniweb_report::{build_report, flatten_orders, write_csv_reports, write_html_report};
use chrono::NaiveDate;
use serde_json::json;

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn orders() -> Vec<Order> {
    [
        json!({
            "id": 1, "order_num": "2024001", "pur_date": "2024-05-01 09:00:00",
            "status": {"id": 1, "name": "Nová"},
            "customer": {"name": "Ján", "surname": "Malý", "email": "jan@example.sk"},
            "items": [{"item_label": "<script>alert(1)</script> Šampón", "quantity": 1, "tax_rate": 20,
                       "price": {"value": 12, "currency": {"code": "EUR"}}}],
            "sum": {"value": 12, "currency": {"code": "EUR"}}
        }),
        json!({
            "id": 2, "order_num": "2024002", "pur_date": "2024-05-02 18:30:00",
            "customer": {"company_name": "Salón, s.r.o.", "email": "salon@example.sk"},
            "items": [],
            "sum": {"value": 0, "currency": {"code": "EUR"}}
        }),
    ]
    .into_iter()
    .map(|v| serde_json::from_value(v).unwrap())
    .collect()
}

#[test]
fn writes_all_csv_files_and_html() {
    let costs = CostTable::from_yaml_str("reporting_currency: EUR\nfixed_daily_cost: 5\n").unwrap();
    let range = DateRange::new(d("2024-05-01"), d("2024-05-03")).unwrap();
    let flat = flatten_orders(&orders(), &costs).unwrap();
    let report = build_report(
        &flat.rows,
        &DailySpend::new(),
        &DailySpend::new(),
        &costs,
        range,
        &HashSet::new(),
    );

    let dir = tempfile::tempdir().unwrap();
    let files = write_csv_reports(dir.path(), &flat.rows, &report).unwrap();
    for path in files.all() {
        assert!(path.exists(), "{} missing", path.display());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("_20240501-20240503.csv"));
    }

    let export = std::fs::read_to_string(&files.export).unwrap();
    let export = export.strip_prefix('\u{feff}').expect("BOM");
    let mut lines = export.lines();
    assert!(lines
        .next()
        .unwrap()
        .starts_with("order_num,order_id,external_ref,purchase_date,status_name,total_items_in_order,item_number"));
    assert_eq!(export.lines().count(), 3);
    assert!(export.contains("\"Salón, s.r.o.\""));

    let by_date = std::fs::read_to_string(&files.by_date).unwrap();
    assert_eq!(by_date.lines().count(), 4);

    let html_path = write_html_report(
        dir.path(),
        &report,
        d("2024-05-04").and_hms_opt(8, 0, 0).unwrap(),
    )
    .unwrap();
    assert!(html_path.ends_with("report_20240501-20240503.html"));
    let html = std::fs::read_to_string(html_path).unwrap();
    assert!(!html.contains("<script"));
    assert!(html.contains("&lt;script&gt;alert(1)"));
    assert!(html.contains("Šampón"));
    assert!(html.contains("TOTAL"));
    assert!(html.contains("2024-W18"));
    assert!(html.contains("Generated 2024-05-04 08:00:00"));
}
