//! Decodes the first sheet of a spreadsheet into header-keyed rows.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto_from_rs};

use crate::domain::{RawRow, Value};
use crate::error::{PosSearchError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    /// xlsx, xlsm, xlsb, xls or ods; the exact kind is sniffed from content.
    Workbook,
}

impl SheetFormat {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("csv") => Self::Csv,
            _ => Self::Workbook,
        }
    }
}

type Table = Vec<Vec<Option<Value>>>;

pub fn read_rows_from_bytes(bytes: &[u8], format: SheetFormat) -> Result<Vec<RawRow>> {
    let table = match format {
        SheetFormat::Csv => csv_table(bytes)?,
        SheetFormat::Workbook => workbook_table(bytes)?,
    };
    Ok(rows_from_table(table))
}

fn csv_table(bytes: &[u8]) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    reader
        .records()
        .map(|record| {
            let record = record.map_err(|e| PosSearchError::MalformedFile(e.to_string()))?;
            Ok(record.iter().map(csv_cell).collect())
        })
        .collect()
}

/// Numeric text becomes a number, as a workbook cell would be.
fn csv_cell(cell: &str) -> Option<Value> {
    if cell.is_empty() {
        return None;
    }
    match cell.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Some(Value::Number(n)),
        _ => Some(Value::Text(cell.to_string())),
    }
}

fn workbook_table(bytes: &[u8]) -> Result<Table> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| PosSearchError::MalformedFile(e.to_string()))?;

    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| PosSearchError::MalformedFile("workbook has no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| PosSearchError::MalformedFile(format!("sheet '{first}': {e}")))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_value).collect())
        .collect())
}

/// Date cells keep their serial number so the reconciler can format them.
#[allow(clippy::cast_precision_loss)]
fn cell_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
            Some(Value::Text(s.clone()))
        }
        Data::Float(f) => Some(Value::Number(*f)),
        Data::Int(i) => Some(Value::Number(*i as f64)),
        Data::Bool(b) => Some(Value::Bool(*b)),
        Data::DateTime(dt) => Some(Value::Number(dt.as_f64())),
    }
}

/// The first non-blank row names the columns. Blank header cells drop their
/// column, repeated headers become `name_1`, `name_2`, and data rows without
/// any cell are skipped.
fn rows_from_table(table: Table) -> Vec<RawRow> {
    let mut rows = table
        .into_iter()
        .skip_while(|row| row.iter().all(Option::is_none));

    let Some(header_row) = rows.next() else {
        return Vec::new();
    };
    let headers = unique_headers(&header_row);

    rows.filter_map(|row| {
        let raw: RawRow = row
            .into_iter()
            .zip(&headers)
            .filter_map(|(cell, header)| Some((header.clone()?, cell?)))
            .collect();
        (!raw.is_empty()).then_some(raw)
    })
    .collect()
}

fn unique_headers(header_row: &[Option<Value>]) -> Vec<Option<String>> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header_row
        .iter()
        .map(|cell| {
            let name = cell.as_ref()?.to_string();
            let count = seen.entry(name.clone()).or_insert(0);
            let unique = if *count == 0 {
                name
            } else {
                format!("{name}_{count}")
            };
            *count += 1;
            Some(unique)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::CellErrorType;

    fn csv_rows(text: &str) -> Vec<RawRow> {
        read_rows_from_bytes(text.as_bytes(), SheetFormat::Csv).unwrap()
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(SheetFormat::from_path(Path::new("stock.CSV")), SheetFormat::Csv);
        assert_eq!(SheetFormat::from_path(Path::new("stock.xlsx")), SheetFormat::Workbook);
        assert_eq!(SheetFormat::from_path(Path::new("stock")), SheetFormat::Workbook);
    }

    #[test]
    fn test_csv_rows_keyed_by_header() {
        let rows = csv_rows("Item Name,Qty,Rate\nCrocin,10,25.50\nDolo 650,5,30\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Item Name"), Some(&Value::from("Crocin")));
        assert_eq!(rows[0].get("Qty"), Some(&Value::Number(10.0)));
        assert_eq!(rows[1].get("Rate"), Some(&Value::Number(30.0)));
    }

    #[test]
    fn test_csv_numeric_cells_become_numbers() {
        assert_eq!(csv_cell(" 25.50 "), Some(Value::Number(25.5)));
        assert_eq!(csv_cell("45000"), Some(Value::Number(45000.0)));
        assert_eq!(csv_cell("PX-100"), Some(Value::from("PX-100")));
        assert_eq!(csv_cell("₹30"), Some(Value::from("₹30")));
        // non-finite spellings stay text
        assert_eq!(csv_cell("inf"), Some(Value::from("inf")));
        assert_eq!(csv_cell("NaN"), Some(Value::from("NaN")));
        assert_eq!(csv_cell(""), None);
    }

    #[test]
    fn test_leading_blank_rows_and_empty_cells() {
        let rows = csv_rows(",,\nName,Batch,\nCrocin,,extra\n,,\nDolo,D1\n");
        assert_eq!(rows.len(), 2);
        // empty cell omitted, unnamed column dropped
        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[1].get("Batch"), Some(&Value::from("D1")));
    }

    #[test]
    fn test_repeated_headers_are_suffixed() {
        let rows = csv_rows("Rate,Rate,Rate\n1,2,3\n");
        let headers: Vec<&str> = rows[0].headers().collect();
        assert_eq!(headers, vec!["Rate", "Rate_1", "Rate_2"]);
    }

    #[test]
    fn test_header_only_sheet_has_no_rows() {
        assert!(csv_rows("Name,Qty\n").is_empty());
        assert!(csv_rows("").is_empty());
    }

    #[test]
    fn test_workbook_first_sheet_keeps_cell_types() {
        let bytes = include_bytes!("../../tests/fixtures/stock.xlsx");
        let rows = read_rows_from_bytes(bytes, SheetFormat::Workbook).unwrap();

        // the second sheet is never read
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Item Name"), Some(&Value::from("Crocin")));
        assert_eq!(rows[0].get("Batch No"), Some(&Value::from("CR-1")));
        assert_eq!(rows[0].get("Qty"), Some(&Value::Number(10.0)));
        assert_eq!(rows[0].get("M.R.P."), Some(&Value::Number(30.5)));
        // date-formatted cells arrive as their serial number
        assert_eq!(rows[0].get("Expiry Date"), Some(&Value::Number(45000.0)));
        assert_eq!(rows[1].get("Expiry Date"), Some(&Value::Number(45291.0)));
    }

    #[test]
    fn test_garbage_workbook_is_malformed() {
        let err = read_rows_from_bytes(b"definitely not a workbook", SheetFormat::Workbook)
            .unwrap_err();
        assert!(matches!(err, PosSearchError::MalformedFile(_)));
    }

    #[test]
    fn test_invalid_utf8_csv_is_malformed() {
        let err = read_rows_from_bytes(b"Name\n\xff\xfe\n", SheetFormat::Csv).unwrap_err();
        assert!(matches!(err, PosSearchError::MalformedFile(_)));
    }

    #[test]
    fn test_cell_conversion() {
        assert_eq!(cell_value(&Data::Empty), None);
        assert_eq!(cell_value(&Data::String(String::new())), None);
        assert_eq!(cell_value(&Data::Error(CellErrorType::Div0)), None);
        assert_eq!(cell_value(&Data::Int(45000)), Some(Value::Number(45000.0)));
        assert_eq!(cell_value(&Data::Float(25.5)), Some(Value::Number(25.5)));
        assert_eq!(cell_value(&Data::Bool(true)), Some(Value::Bool(true)));
        assert_eq!(
            cell_value(&Data::String("Crocin".into())),
            Some(Value::from("Crocin"))
        );
    }
}
