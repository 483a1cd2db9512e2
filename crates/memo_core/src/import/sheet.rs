//! Header-keyed spreadsheet rows.
//!
//! # Invariants
//! - Header keys are trimmed and inner whitespace collapsed to one space.
//! - Cell values are trimmed; blank cells read as absent.

use crate::import::ImportError;
use calamine::{open_workbook_auto, open_workbook_from_rs, Data, Reader, Xlsx};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

fn normalize_header(header: &str) -> String {
    WHITESPACE_RE.replace_all(header.trim(), " ").into_owned()
}

/// One data row addressed by column header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetRow {
    /// 1-based data row number (header excluded).
    pub row_number: usize,
    cells: HashMap<String, String>,
}

impl SheetRow {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            cells: HashMap::new(),
        }
    }

    pub fn from_pairs<K, V>(row_number: usize, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut row = Self::new(row_number);
        for (header, value) in pairs {
            row.insert(header.as_ref(), value.as_ref());
        }
        row
    }

    pub fn insert(&mut self, header: &str, value: &str) {
        self.cells
            .insert(normalize_header(header), value.trim().to_string());
    }

    /// Non-blank cell under `header`.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .get(&normalize_header(header))
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// First non-blank value across `aliases`, in alias order.
    pub fn first_of(&self, aliases: &[&str]) -> Option<String> {
        aliases
            .iter()
            .find_map(|alias| self.get(alias))
            .map(str::to_string)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|value| value.is_empty())
    }
}

/// Reads a headed CSV into rows, skipping fully blank lines.
pub fn read_csv_rows<R: Read>(reader: R) -> Result<Vec<SheetRow>, ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut rows = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        let row = SheetRow::from_pairs(index + 1, headers.iter().zip(record.iter()));
        if !row.is_blank() {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Reads the first worksheet of a workbook file (xlsx, xls, ods).
pub fn read_workbook_rows(path: impl AsRef<Path>) -> Result<Vec<SheetRow>, ImportError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|err| ImportError::Workbook(err.to_string()))?;
    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(ImportError::Empty)?;
    let range = workbook
        .worksheet_range(&first)
        .map_err(|err| ImportError::Workbook(err.to_string()))?;
    Ok(rows_from_range(range.rows()))
}

/// Reads the first worksheet of an in-memory xlsx file.
pub fn read_workbook_bytes(bytes: &[u8]) -> Result<Vec<SheetRow>, ImportError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|err: calamine::XlsxError| ImportError::Workbook(err.to_string()))?;
    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(ImportError::Empty)?;
    let range = workbook
        .worksheet_range(&first)
        .map_err(|err| ImportError::Workbook(err.to_string()))?;
    Ok(rows_from_range(range.rows()))
}

fn rows_from_range<'a>(mut rows: impl Iterator<Item = &'a [Data]>) -> Vec<SheetRow> {
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(cell_text).collect(),
        None => return Vec::new(),
    };

    let mut parsed = Vec::new();
    for (index, cells) in rows.enumerate() {
        let row = SheetRow::from_pairs(
            index + 1,
            headers
                .iter()
                .zip(cells.iter().map(cell_text))
                .filter(|(header, _)| !header.trim().is_empty()),
        );
        if !row.is_blank() {
            parsed.push(row);
        }
    }
    parsed
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(value) => value.clone(),
        Data::Int(value) => value.to_string(),
        // Account numbers and phones arrive as floats; drop the `.0`.
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{read_csv_rows, SheetRow};

    #[test]
    fn first_of_skips_blank_aliases() {
        let row = SheetRow::from_pairs(1, [("Razão Social", "  "), ("razao_social", "ACME LTDA")]);
        assert_eq!(
            row.first_of(&["Razão Social", "razao_social"]),
            Some("ACME LTDA".to_string())
        );
        assert_eq!(row.first_of(&["nome"]), None);
    }

    #[test]
    fn headers_are_whitespace_normalized() {
        let row = SheetRow::from_pairs(1, [(" Número  da Conta ", "C1")]);
        assert_eq!(row.get("Número da Conta"), Some("C1"));
    }

    #[test]
    fn csv_rows_skip_blank_lines() {
        let input = "codigo,nome\nP1,Bomba\n,\nP2,Filtro\n";
        let rows = read_csv_rows(input.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("codigo"), Some("P2"));
        assert_eq!(rows[1].row_number, 3);
    }
}
