//! Standalone HTML report rendered from `templates/report.html`: summary
//! cards and tables, inline CSS, no scripts or external assets.

use std::fs;
use std::path::{Path, PathBuf};

use askama::Template;
use chrono::NaiveDateTime;

use crate::aggregate::{DailySummary, PeriodSummary, ProductSummary, Report, ReportTotals};
use crate::error::ReportError;

struct PeriodTable<'a> {
    title: &'static str,
    label: &'static str,
    rows: &'a [PeriodSummary],
}

#[derive(Template)]
#[template(path = "report.html")]
struct ReportPage<'a> {
    range: String,
    generated_at: String,
    cur: &'a str,
    t: &'a ReportTotals,
    daily: &'a [DailySummary],
    period_tables: Vec<PeriodTable<'a>>,
    products: &'a [ProductSummary],
}

/// Renders the report page. `generated_at` is printed in the footer.
///
/// # Errors
///
/// Returns [`ReportError::Render`] if the template fails to render.
pub fn render_html(report: &Report, generated_at: NaiveDateTime) -> Result<String, ReportError> {
    let page = ReportPage {
        range: report.range.to_string(),
        generated_at: generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        cur: &report.currency,
        t: &report.totals,
        daily: &report.daily,
        period_tables: vec![
            PeriodTable {
                title: "Weekly summary",
                label: "Week",
                rows: &report.weekly,
            },
            PeriodTable {
                title: "Monthly summary",
                label: "Month",
                rows: &report.monthly,
            },
        ],
        products: &report.products,
    };
    Ok(page.render()?)
}

/// Writes `report_<range>.html` into `dir`.
///
/// # Errors
///
/// Returns [`ReportError::Io`] if the directory or file cannot be written,
/// or [`ReportError::Render`] if the template fails.
pub fn write_html_report(
    dir: &Path,
    report: &Report,
    generated_at: NaiveDateTime,
) -> Result<PathBuf, ReportError> {
    let io_err = |path: &Path, source| ReportError::Io {
        path: path.display().to_string(),
        source,
    };
    let html = render_html(report, generated_at)?;
    fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    let path = dir.join(format!("report_{}.html", report.range.file_suffix()));
    fs::write(&path, html).map_err(|e| io_err(&path, e))?;
    Ok(path)
}

/// Template filters. Output is escaped by the template like any other value.
#[allow(
    clippy::unnecessary_wraps,
    clippy::ref_option,
    clippy::trivially_copy_pass_by_ref
)]
mod filters {
    use bizniweb_core::round_money;
    use rust_decimal::Decimal;

    const DASH: &str = "\u{2013}";

    /// `1,234.50 EUR`
    pub fn money(value: &Decimal, currency: &str) -> askama::Result<String> {
        let rounded = round_money(*value);
        let fixed = format!("{:.2}", rounded.abs());
        let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (i, ch) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        Ok(format!("{sign}{grouped}.{frac} {currency}"))
    }

    pub fn opt_money(value: &Option<Decimal>, currency: &str) -> askama::Result<String> {
        match value {
            Some(v) => money(v, currency),
            None => Ok(DASH.to_string()),
        }
    }

    pub fn pct(value: &Option<Decimal>) -> askama::Result<String> {
        Ok(value.map_or_else(|| DASH.to_string(), |v| format!("{:.1}%", v.round_dp(1))))
    }

    pub fn opt_ratio(value: &Option<Decimal>) -> askama::Result<String> {
        Ok(value.map_or_else(|| DASH.to_string(), |v| format!("{:.2}", v.round_dp(2))))
    }

    pub fn qty(value: &Decimal) -> askama::Result<String> {
        Ok(value.normalize().to_string())
    }

    pub fn profit_class(value: &Decimal) -> askama::Result<&'static str> {
        Ok(if *value > Decimal::ZERO {
            "positive"
        } else {
            "negative"
        })
    }

    /// Cuts `s` to `max_chars` characters and appends `...`.
    pub fn shorten(s: &str, max_chars: usize) -> askama::Result<String> {
        Ok(if s.chars().count() > max_chars {
            format!("{}...", s.chars().take(max_chars).collect::<String>())
        } else {
            s.to_string()
        })
    }
}
