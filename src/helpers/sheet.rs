use anyhow::{Context, Result};
use calamine::{Data, Reader, open_workbook_auto};
use std::path::Path;
use tracing::info;

use crate::models::sales::SheetRow;

/// Reads a workbook's first worksheet into raw rows. Row 0 is the header;
/// every later row becomes a `SheetRow` keyed by the header names.
pub trait SheetReader: Send + Sync {
    fn read_rows(&self, path: &Path) -> Result<Vec<SheetRow>>;
}

pub struct XlsxReader;

impl SheetReader for XlsxReader {
    fn read_rows(&self, path: &Path) -> Result<Vec<SheetRow>> {
        // The workbook handle lives only inside this call.
        let mut workbook = open_workbook_auto(path)
            .with_context(|| format!("Failed to open workbook {}", path.display()))?;
        let range = workbook
            .worksheet_range_at(0)
            .with_context(|| format!("Workbook {} has no worksheets", path.display()))?
            .with_context(|| format!("Failed to read the first worksheet of {}", path.display()))?;

        let mut rows = range.rows();
        let header: Vec<String> = rows
            .next()
            .context("Worksheet is empty")?
            .iter()
            .map(cell_to_text)
            .collect();

        let records: Vec<SheetRow> = rows
            .map(|cells| {
                SheetRow::new(
                    header
                        .iter()
                        .zip(cells)
                        .map(|(name, cell)| (name.clone(), cell_to_text(cell)))
                        .collect(),
                )
            })
            .filter(|row| !row.is_blank())
            .collect();

        info!(
            "Read {} data row(s) from {}",
            records.len(),
            path.display()
        );
        Ok(records)
    }
}

/// Cell text the way spreadsheet apps show it: whole floats lose the
/// trailing `.0` so `200.0` submits as `"200"`.
fn cell_to_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_floats_drop_the_decimal_point() {
        assert_eq!(cell_to_text(&Data::Float(200.0)), "200");
        assert_eq!(cell_to_text(&Data::Float(250.5)), "250.5");
        assert_eq!(cell_to_text(&Data::Int(42)), "42");
        assert_eq!(cell_to_text(&Data::String("  Jane ".to_string())), "Jane");
        assert_eq!(cell_to_text(&Data::Empty), "");
    }

    #[test]
    fn missing_workbook_is_an_error() {
        let err = XlsxReader
            .read_rows(Path::new("no-such-file.xlsx"))
            .unwrap_err();
        assert!(err.to_string().contains("no-such-file.xlsx"));
    }
}
