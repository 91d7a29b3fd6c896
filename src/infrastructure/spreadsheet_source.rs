// Spreadsheet table source (.xlsx / .xls uploads, base64-encoded)
use crate::application::table_source::{SourceUpload, TableSource};
use crate::domain::table::Table;
use crate::infrastructure::delimited_source::build_table;
use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadsheetTableSource;

impl SpreadsheetTableSource {
    pub fn new() -> Self {
        Self
    }

    /// Read the first worksheet of a workbook. Cells go through the same
    /// inference as delimited text, so a whole-number cell reads as an integer.
    pub fn parse(bytes: Vec<u8>, has_header: bool) -> Result<Table> {
        let mut workbook =
            open_workbook_auto_from_rs(Cursor::new(bytes)).context("Failed to open workbook")?;
        let range = workbook
            .worksheet_range_at(0)
            .context("Workbook has no worksheets")?
            .context("Failed to read first worksheet")?;

        let records: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();

        build_table(records, has_header)
    }
}

#[async_trait]
impl TableSource for SpreadsheetTableSource {
    async fn load(&self, upload: &SourceUpload) -> Result<Table> {
        let encoded = upload
            .content
            .split_once("base64,")
            .map(|(_, data)| data)
            .unwrap_or(&upload.content)
            .trim();
        let bytes = STANDARD
            .decode(encoded)
            .with_context(|| format!("`{}` is not valid base64", upload.name))?;

        let table = Self::parse(bytes, upload.has_header)
            .with_context(|| format!("Error reading `{}`", upload.name))?;

        tracing::debug!(
            "Parsed workbook {}: {} rows, {} columns",
            upload.name,
            table.len(),
            table.columns.len()
        );
        Ok(table)
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::Int(v) => v.to_string(),
        Data::Float(v) if v.fract() == 0.0 && v.abs() < 9.0e15 => (*v as i64).to_string(),
        Data::Float(v) => v.to_string(),
        Data::String(s) => s.clone(),
        Data::Bool(true) => "True".to_string(),
        Data::Bool(false) => "False".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::CellValue;

    const WORKBOOK: &[u8] = include_bytes!("../../tests/fixtures/arrivals.xlsx");

    fn upload(content: String) -> SourceUpload {
        SourceUpload::new("arrivals.xlsx", content)
    }

    #[tokio::test]
    async fn test_load_workbook_with_header() {
        let table = SpreadsheetTableSource::new()
            .load(&upload(STANDARD.encode(WORKBOOK)))
            .await
            .unwrap();

        assert_eq!(table.columns, vec!["time", "stop", "riders"]);
        assert_eq!(table.len(), 4);
        assert_eq!(table.cell(0, 0), &CellValue::Int(0));
        assert_eq!(table.cell(3, 0), &CellValue::Int(50));
        assert_eq!(table.cell(3, 1), &CellValue::Text("B".into()));
        // 3, 4, 1, 2.5 share a column, so the whole column reads as floats
        assert_eq!(table.cell(0, 2), &CellValue::Float(3.0));
        assert_eq!(table.cell(3, 2), &CellValue::Float(2.5));
    }

    #[tokio::test]
    async fn test_load_workbook_without_header() {
        let mut request = upload(format!(
            "data:application/vnd.openxmlformats-officedocument.spreadsheetml.sheet;base64,{}",
            STANDARD.encode(WORKBOOK)
        ));
        request.has_header = false;

        let table = SpreadsheetTableSource::new().load(&request).await.unwrap();
        assert_eq!(table.columns, vec!["0", "1", "2"]);
        assert_eq!(table.len(), 5);
        assert_eq!(table.cell(0, 0), &CellValue::Text("time".into()));
    }

    #[tokio::test]
    async fn test_invalid_content_is_rejected() {
        let source = SpreadsheetTableSource::new();
        assert!(source.load(&upload("not base64!".to_string())).await.is_err());
        assert!(source.load(&upload(STANDARD.encode(b"t\n1\n"))).await.is_err());
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Float(5.0)), "5");
        assert_eq!(cell_text(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::Bool(true)), "True");
    }
}
