//! CSV report files. Each file starts with a UTF-8 byte order mark so that
//! spreadsheet tools pick the right encoding for diacritics.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::aggregate::Report;
use crate::error::ReportError;
use crate::flatten::FlatRow;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Paths of the files written by [`write_csv_reports`].
#[derive(Debug, Clone)]
pub struct CsvFiles {
    pub export: PathBuf,
    pub by_date: PathBuf,
    pub by_date_product: PathBuf,
    pub by_product: PathBuf,
    pub by_week: PathBuf,
    pub by_month: PathBuf,
    pub customers: PathBuf,
}

impl CsvFiles {
    #[must_use]
    pub fn all(&self) -> [&Path; 7] {
        [
            &self.export,
            &self.by_date,
            &self.by_date_product,
            &self.by_product,
            &self.by_week,
            &self.by_month,
            &self.customers,
        ]
    }
}

/// Writes the flat export and every rollup into `dir`, creating it if
/// needed. File names end in the range's `YYYYMMDD-YYYYMMDD` suffix.
///
/// # Errors
///
/// Returns [`ReportError::Io`] or [`ReportError::Csv`] on the first file
/// that cannot be written.
pub fn write_csv_reports(
    dir: &Path,
    rows: &[FlatRow],
    report: &Report,
) -> Result<CsvFiles, ReportError> {
    fs::create_dir_all(dir).map_err(|source| ReportError::Io {
        path: dir.display().to_string(),
        source,
    })?;
    let suffix = report.range.file_suffix();
    let path = |stem: &str| dir.join(format!("{stem}_{suffix}.csv"));

    let files = CsvFiles {
        export: path("export"),
        by_date: path("aggregate_by_date"),
        by_date_product: path("aggregate_by_date_product"),
        by_product: path("aggregate_by_product"),
        by_week: path("aggregate_by_week"),
        by_month: path("aggregate_by_month"),
        customers: path("customers"),
    };

    write_records(&files.export, rows)?;
    write_records(&files.by_date, &report.daily)?;
    write_records(&files.by_date_product, &report.date_product)?;
    write_records(&files.by_product, &report.products)?;
    write_records(&files.by_week, &report.weekly)?;
    write_records(&files.by_month, &report.monthly)?;
    write_records(&files.customers, &report.customers)?;

    tracing::debug!(dir = %dir.display(), rows = rows.len(), "wrote CSV reports");
    Ok(files)
}

/// Serializes `records` with a header row taken from the field names.
fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), ReportError> {
    let io_err = |source| ReportError::Io {
        path: path.display().to_string(),
        source,
    };
    let csv_err = |source| ReportError::Csv {
        path: path.display().to_string(),
        source,
    };

    let mut file = BufWriter::new(File::create(path).map_err(io_err)?);
    file.write_all(UTF8_BOM).map_err(io_err)?;

    let mut writer = csv::Writer::from_writer(file);
    for record in records {
        writer.serialize(record).map_err(csv_err)?;
    }
    writer.flush().map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Line {
        name: String,
        amount: Option<u32>,
    }

    #[test]
    fn writes_bom_and_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        let lines = [
            Line {
                name: "Šampón, 250ml".to_owned(),
                amount: Some(3),
            },
            Line {
                name: "x".to_owned(),
                amount: None,
            },
        ];
        write_records(&path, &lines).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text, "name,amount\n\"Šampón, 250ml\",3\nx,\n");
    }
}
