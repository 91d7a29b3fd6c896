// Delimited-text table source (.csv / .txt uploads)
use crate::application::table_source::{SourceUpload, TableSource};
use crate::domain::table::{CellValue, Table};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

const NA_VALUES: &[&str] = &["", "NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "#N/A", "None"];

#[derive(Debug, Clone, Copy, Default)]
pub struct DelimitedTableSource;

impl DelimitedTableSource {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(content: &str, has_header: bool) -> Result<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut records: Vec<Vec<String>> = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("Failed to parse record {}", line + 1))?;
            records.push(record.iter().map(str::to_string).collect());
        }

        build_table(records, has_header)
    }
}

/// Turn raw string records into a typed table. With `has_header` the first
/// record names the columns; otherwise columns are named by position.
pub(crate) fn build_table(records: Vec<Vec<String>>, has_header: bool) -> Result<Table> {
    let mut records = records.into_iter();
    let header: Vec<String> = if has_header {
        match records.next() {
            Some(record) => record,
            None => bail!("File is empty, expected a header row"),
        }
    } else {
        Vec::new()
    };

    let mut rows: Vec<Vec<CellValue>> = records
        .map(|record| record.iter().map(|raw| infer_cell(raw)).collect())
        .collect();

    let width = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0);
    if width == 0 {
        bail!("File contains no columns");
    }

    let names = (0..width)
        .map(|i| match header.get(i) {
            Some(name) if !name.is_empty() => name.clone(),
            Some(_) | None if has_header => format!("Unnamed: {}", i),
            _ => i.to_string(),
        })
        .collect();

    promote_mixed_numeric_columns(&mut rows, width);
    Ok(Table::new(dedupe_column_names(names), rows))
}

/// Repeated names get `.1`, `.2`, ... suffixes so every column stays addressable.
fn dedupe_column_names(names: Vec<String>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut columns = Vec::with_capacity(names.len());

    for name in names {
        let mut candidate = name.clone();
        let count = seen.entry(name.clone()).or_insert(0);
        while used.contains(&candidate) {
            *count += 1;
            candidate = format!("{}.{}", name, count);
        }
        used.insert(candidate.clone());
        columns.push(candidate);
    }
    columns
}

#[async_trait]
impl TableSource for DelimitedTableSource {
    async fn load(&self, upload: &SourceUpload) -> Result<Table> {
        let table = Self::parse(&upload.content, upload.has_header)
            .with_context(|| format!("Error reading `{}`", upload.name))?;

        tracing::debug!(
            "Parsed {}: {} rows, {} columns",
            upload.name,
            table.len(),
            table.columns.len()
        );
        Ok(table)
    }
}

pub(crate) fn infer_cell(raw: &str) -> CellValue {
    if NA_VALUES.contains(&raw) {
        return CellValue::Null;
    }
    if let Ok(v) = raw.parse::<i64>() {
        return CellValue::Int(v);
    }
    if let Ok(v) = raw.parse::<f64>() {
        return CellValue::Float(v);
    }
    match raw {
        "true" | "True" | "TRUE" => CellValue::Bool(true),
        "false" | "False" | "FALSE" => CellValue::Bool(false),
        _ => CellValue::Text(raw.to_string()),
    }
}

/// A column holding both integers and floats is read as floats throughout,
/// so `1` and `1.0` in the same column land in the same group.
pub(crate) fn promote_mixed_numeric_columns(rows: &mut [Vec<CellValue>], width: usize) {
    for column in 0..width {
        let cells = || rows.iter().filter_map(move |r| r.get(column));
        let has_float = cells().any(|c| matches!(c, CellValue::Float(_)));
        let only_numeric = cells().all(|c| {
            matches!(c, CellValue::Int(_) | CellValue::Float(_) | CellValue::Null)
        });
        if !(has_float && only_numeric) {
            continue;
        }

        for row in rows.iter_mut() {
            if let Some(cell) = row.get_mut(column) {
                if let CellValue::Int(v) = *cell {
                    *cell = CellValue::Float(v as f64);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_header() {
        let table = DelimitedTableSource::parse("time,stop,riders\n5,A,3\n12, B ,\n", true).unwrap();
        assert_eq!(table.columns, vec!["time", "stop", "riders"]);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.rows[0],
            vec![CellValue::Int(5), CellValue::Text("A".into()), CellValue::Int(3)]
        );
        assert_eq!(table.cell(1, 1), &CellValue::Text("B".into()));
        assert_eq!(table.cell(1, 2), &CellValue::Null);
    }

    #[test]
    fn test_parse_without_header_names_columns_by_position() {
        let table = DelimitedTableSource::parse("5,A\n6,B,extra\n", false).unwrap();
        assert_eq!(table.columns, vec!["0", "1", "2"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 2), &CellValue::Null);
    }

    #[test]
    fn test_blank_header_names() {
        let table = DelimitedTableSource::parse("time,\n1,2\n", true).unwrap();
        assert_eq!(table.columns, vec!["time", "Unnamed: 1"]);
    }

    #[test]
    fn test_mixed_numeric_column_is_promoted() {
        let table = DelimitedTableSource::parse("t\n1\n2.5\nNA\n", true).unwrap();
        assert_eq!(table.cell(0, 0), &CellValue::Float(1.0));
        assert_eq!(table.cell(1, 0), &CellValue::Float(2.5));
        assert_eq!(table.cell(2, 0), &CellValue::Null);
    }

    #[test]
    fn test_empty_file_is_rejected() {
        assert!(DelimitedTableSource::parse("", true).is_err());
        assert!(DelimitedTableSource::parse("", false).is_err());
    }

    #[test]
    fn test_duplicate_header_names_are_suffixed() {
        let table = DelimitedTableSource::parse("t,a,a,a.1,a\n1,2,3,4,5\n", true).unwrap();
        assert_eq!(table.columns, vec!["t", "a", "a.1", "a.1.1", "a.2"]);
        assert_eq!(table.column_index("a.1"), Some(2));
        assert_eq!(table.cell(0, 4), &CellValue::Int(5));
    }

    #[test]
    fn test_infinite_values_stay_floats() {
        let table = DelimitedTableSource::parse("t\ninf\n", true).unwrap();
        assert_eq!(table.cell(0, 0), &CellValue::Float(f64::INFINITY));
    }

    #[tokio::test]
    async fn test_load_reports_file_name() {
        let err = DelimitedTableSource::new()
            .load(&SourceUpload::new("stops.csv", ""))
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Error reading `stops.csv`"));
    }
}
