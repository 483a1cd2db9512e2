//! Bulk data intake and ERP exchange.
//!
//! # Responsibility
//! - Turn spreadsheet rows and ERP CSV files into catalog records.
//! - Report a structured outcome for every source row.
//! - Export service orders in the ERP's CSV layout.
//!
//! # Invariants
//! - Rows missing their key field are excluded before any write.
//! - One failing row or batch never stops later batches.
//! - `inserted + skipped_duplicates <= candidates`.

use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod batch;
pub mod erp;
pub mod mapping;
pub mod sheet;

pub use batch::{import_customer_rows, import_product_rows, BatchImporter, DEFAULT_BATCH_SIZE};
pub use erp::{export_orders_csv, import_customers_csv, import_products_csv};
pub use sheet::{read_csv_rows, read_workbook_bytes, read_workbook_rows, SheetRow};

#[derive(Debug)]
pub enum ImportError {
    /// Source has no data rows.
    Empty,
    /// Every row lacked its key field.
    NoValidRows { excluded: usize },
    /// Only admins import or export.
    Forbidden,
    /// Required header absent from a CSV file.
    MissingColumn(&'static str),
    Csv(csv::Error),
    Io(std::io::Error),
    Workbook(String),
    Repo(RepoError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "file has no data rows"),
            Self::NoValidRows { excluded } => {
                write!(f, "no importable rows; {excluded} row(s) lacked the key field")
            }
            Self::Forbidden => write!(f, "import/export is restricted to administrators"),
            Self::MissingColumn(column) => write!(f, "missing required column `{column}`"),
            Self::Csv(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Workbook(message) => write!(f, "cannot read workbook: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Csv(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<csv::Error> for ImportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<std::io::Error> for ImportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<RepoError> for ImportError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// What happened to one source row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Inserted,
    /// Key already present in storage.
    SkippedDuplicate,
    /// Write failed for another reason.
    Failed(String),
    /// Key field blank; never attempted.
    ExcludedMissingKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowResult {
    /// 1-based data row number (header excluded).
    pub row_number: usize,
    pub key: Option<String>,
    pub outcome: RowOutcome,
}

/// Per-row results plus totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub rows: Vec<RowResult>,
    pub inserted: usize,
    pub skipped_duplicates: usize,
    pub failed: usize,
    pub excluded_missing_key: usize,
}

impl ImportReport {
    pub(crate) fn record(&mut self, row_number: usize, key: Option<String>, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Inserted => self.inserted += 1,
            RowOutcome::SkippedDuplicate => self.skipped_duplicates += 1,
            RowOutcome::Failed(_) => self.failed += 1,
            RowOutcome::ExcludedMissingKey => self.excluded_missing_key += 1,
        }
        self.rows.push(RowResult {
            row_number,
            key,
            outcome,
        });
    }

    /// Orders rows by source position once all batches ran.
    pub(crate) fn finish(mut self) -> Self {
        self.rows.sort_by_key(|row| row.row_number);
        self
    }

    /// Rows that reached the write stage.
    pub fn candidates(&self) -> usize {
        self.rows.len() - self.excluded_missing_key
    }

    /// One-line summary for notices.
    pub fn summary(&self) -> String {
        format!(
            "{} importado(s), {} duplicado(s), {} com erro, {} sem chave",
            self.inserted, self.skipped_duplicates, self.failed, self.excluded_missing_key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{ImportReport, RowOutcome};

    #[test]
    fn report_totals_follow_outcomes() {
        let mut report = ImportReport::default();
        report.record(2, Some("B".into()), RowOutcome::SkippedDuplicate);
        report.record(1, Some("A".into()), RowOutcome::Inserted);
        report.record(3, None, RowOutcome::ExcludedMissingKey);
        report.record(4, Some("D".into()), RowOutcome::Failed("boom".into()));
        let report = report.finish();

        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped_duplicates, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.excluded_missing_key, 1);
        assert_eq!(report.candidates(), 3);
        assert_eq!(report.rows[0].row_number, 1);
    }
}
