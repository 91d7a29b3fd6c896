// Upload table source - Picks a parser by file extension
use crate::application::table_source::{SourceUpload, TableSource};
use crate::domain::table::Table;
use crate::infrastructure::delimited_source::DelimitedTableSource;
use crate::infrastructure::spreadsheet_source::SpreadsheetTableSource;
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct UploadTableSource {
    delimited: DelimitedTableSource,
    spreadsheet: SpreadsheetTableSource,
}

impl UploadTableSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TableSource for UploadTableSource {
    async fn load(&self, upload: &SourceUpload) -> Result<Table> {
        let extension = Path::new(&upload.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("csv") | Some("txt") => self.delimited.load(upload).await,
            Some("xlsx") | Some("xls") => self.spreadsheet.load(upload).await,
            _ => bail!(
                "Unsupported file format for `{}`, expected .csv, .xlsx or .txt",
                upload.name
            ),
        }
    }
}
