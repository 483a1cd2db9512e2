//! Chunked, row-by-row insertion with per-row outcomes.
//!
//! # Invariants
//! - Candidates are written in source order, `batch_size` at a time.
//! - A duplicate key is a skip, never a failure.
//! - Progress is reported once per finished chunk, ending at 100.

use crate::import::mapping::{customer_from_row, product_from_row};
use crate::import::sheet::SheetRow;
use crate::import::{ImportError, ImportReport, RowOutcome};
use crate::model::session::Session;
use crate::repo::customer_repo::CustomerRepository;
use crate::repo::product_repo::ProductRepository;
use crate::repo::RepoResult;
use log::{info, warn};

pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Record ready to be written, tagged with its source row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate<T> {
    pub row_number: usize,
    pub key: String,
    pub record: T,
}

/// Splits rows into candidates and the row numbers lacking a key.
pub fn prepare<T>(
    rows: &[SheetRow],
    convert: impl Fn(&SheetRow) -> Option<(String, T)>,
) -> (Vec<Candidate<T>>, Vec<usize>) {
    let mut candidates = Vec::new();
    let mut excluded = Vec::new();
    for row in rows {
        match convert(row) {
            Some((key, record)) => candidates.push(Candidate {
                row_number: row.row_number,
                key,
                record,
            }),
            None => excluded.push(row.row_number),
        }
    }
    (candidates, excluded)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchImporter {
    batch_size: usize,
}

impl Default for BatchImporter {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl BatchImporter {
    /// Chunk size is clamped to at least 1.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Inserts every candidate and records excluded rows.
    pub fn run<T>(
        &self,
        candidates: Vec<Candidate<T>>,
        excluded: Vec<usize>,
        mut insert: impl FnMut(&T) -> RepoResult<()>,
        mut progress: impl FnMut(u8),
    ) -> ImportReport {
        let mut report = ImportReport::default();
        for row_number in excluded {
            report.record(row_number, None, RowOutcome::ExcludedMissingKey);
        }

        let total = candidates.len();
        let mut processed = 0usize;
        for (batch_index, chunk) in candidates.chunks(self.batch_size).enumerate() {
            let mut batch_failures = 0usize;
            for candidate in chunk {
                let outcome = match insert(&candidate.record) {
                    Ok(()) => RowOutcome::Inserted,
                    Err(err) if err.is_duplicate() => RowOutcome::SkippedDuplicate,
                    Err(err) => {
                        batch_failures += 1;
                        RowOutcome::Failed(err.to_string())
                    }
                };
                report.record(candidate.row_number, Some(candidate.key.clone()), outcome);
            }
            if batch_failures > 0 {
                warn!(
                    "event=import_batch module=import status=error batch={} failed_rows={}",
                    batch_index, batch_failures
                );
            }

            processed += chunk.len();
            progress(percent(processed, total));
        }
        if total == 0 {
            progress(100);
        }

        report.finish()
    }
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    u8::try_from(done * 100 / total).unwrap_or(100)
}

/// Imports customer spreadsheet rows. Rows without a name are excluded.
pub fn import_customer_rows<R: CustomerRepository>(
    session: &Session,
    repo: &R,
    rows: &[SheetRow],
    importer: &BatchImporter,
    progress: impl FnMut(u8),
) -> Result<ImportReport, ImportError> {
    ensure_admin(session)?;
    if rows.is_empty() {
        return Err(ImportError::Empty);
    }

    let (candidates, excluded) = prepare(rows, |row| {
        customer_from_row(row).map(|customer| (customer.nome.clone(), customer))
    });
    if candidates.is_empty() {
        return Err(ImportError::NoValidRows {
            excluded: excluded.len(),
        });
    }

    let report = importer.run(
        candidates,
        excluded,
        |customer| repo.create_customer(customer).map(|_| ()),
        progress,
    );
    log_report("import_customers", &report);
    Ok(report)
}

/// Imports product spreadsheet rows keyed by `codigo`.
pub fn import_product_rows<R: ProductRepository>(
    session: &Session,
    repo: &R,
    rows: &[SheetRow],
    importer: &BatchImporter,
    progress: impl FnMut(u8),
) -> Result<ImportReport, ImportError> {
    ensure_admin(session)?;
    if rows.is_empty() {
        return Err(ImportError::Empty);
    }

    let (candidates, excluded) = prepare(rows, |row| {
        product_from_row(row).map(|product| (product.codigo.clone(), product))
    });
    if candidates.is_empty() {
        return Err(ImportError::NoValidRows {
            excluded: excluded.len(),
        });
    }

    let report = importer.run(
        candidates,
        excluded,
        |product| repo.create_product(product).map(|_| ()),
        progress,
    );
    log_report("import_products", &report);
    Ok(report)
}

pub(crate) fn ensure_admin(session: &Session) -> Result<(), ImportError> {
    if session.is_admin() {
        return Ok(());
    }
    warn!(
        "event=import_access module=import status=rejected user_id={}",
        session.user_id
    );
    Err(ImportError::Forbidden)
}

pub(crate) fn log_report(event: &str, report: &ImportReport) {
    info!(
        "event={} module=import status=ok inserted={} skipped_duplicates={} failed={} excluded={}",
        event,
        report.inserted,
        report.skipped_duplicates,
        report.failed,
        report.excluded_missing_key
    );
}

#[cfg(test)]
mod tests {
    use super::{BatchImporter, Candidate};
    use crate::import::RowOutcome;
    use crate::repo::RepoError;

    fn candidates(keys: &[&str]) -> Vec<Candidate<String>> {
        keys.iter()
            .enumerate()
            .map(|(index, key)| Candidate {
                row_number: index + 1,
                key: key.to_string(),
                record: key.to_string(),
            })
            .collect()
    }

    #[test]
    fn failures_do_not_stop_later_batches() {
        let importer = BatchImporter::new(2);
        let mut seen = Vec::new();
        let mut progress = Vec::new();
        let report = importer.run(
            candidates(&["a", "dup", "bad", "d", "e"]),
            vec![6],
            |record| {
                seen.push(record.clone());
                match record.as_str() {
                    "dup" => Err(RepoError::Duplicate {
                        entity: "product",
                        key: record.clone(),
                    }),
                    "bad" => Err(RepoError::InvalidData("broken".to_string())),
                    _ => Ok(()),
                }
            },
            |pct| progress.push(pct),
        );

        assert_eq!(seen.len(), 5);
        assert_eq!(report.inserted, 3);
        assert_eq!(report.skipped_duplicates, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.excluded_missing_key, 1);
        assert_eq!(report.rows[1].outcome, RowOutcome::SkippedDuplicate);
        assert_eq!(progress, vec![40, 80, 100]);
    }

    #[test]
    fn batch_size_is_at_least_one() {
        assert_eq!(BatchImporter::new(0).batch_size(), 1);
        assert_eq!(BatchImporter::default().batch_size(), 50);
    }
}
