//! Bulk question import
//!
//! Streams a pipe-delimited questions file line by line, skips the header,
//! parses and validates each row and upserts it keyed by its question string.
//! A bad row is logged and counted; it never aborts the rest of the import.
//! Re-running an import over the same file leaves the same set of records.

pub mod lines;

use crate::question::parser::parse_line;
use crate::question::validator::Validator;
use crate::store::QuestionStore;
use crate::Result;
use futures::StreamExt;
use serde::Serialize;
use std::path::Path;
use tokio::io::AsyncRead;
use tracing::{debug, info, warn};

use lines::{read_lines, DEFAULT_DELIMITER};

/// Outcome counts for one import run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Data lines read (header and blank lines excluded)
    pub lines_read: usize,
    /// Rows upserted into the store
    pub imported: usize,
    /// Rows that could not be parsed
    pub malformed: usize,
    /// Rows that parsed but failed validation
    pub rejected: usize,
    /// Rows whose upsert failed in the store
    pub store_errors: usize,
}

/// Drives line reassembly, parsing and upserts for one store
pub struct Importer<S> {
    store: S,
    validator: Validator,
    delimiter: u8,
}

impl<S: QuestionStore> Importer<S> {
    pub fn new(store: S, validator: Validator) -> Self {
        Self {
            store,
            validator,
            delimiter: DEFAULT_DELIMITER,
        }
    }

    /// Use a line delimiter other than `\n`
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Import every question in the file at `path`
    pub async fn import_file(&self, path: &Path) -> Result<ImportReport> {
        info!("Importing questions from {}", path.display());
        let file = tokio::fs::File::open(path).await?;
        self.import_reader(file).await
    }

    /// Import every question read from `reader`
    ///
    /// Returns once the source is exhausted and every row's upsert has
    /// completed. A read error aborts the import.
    pub async fn import_reader<R>(&self, reader: R) -> Result<ImportReport>
    where
        R: AsyncRead + Unpin,
    {
        let lines = read_lines(reader, self.delimiter);
        futures::pin_mut!(lines);

        let mut report = ImportReport::default();
        let mut line_number = 0usize;

        while let Some(line) = lines.next().await {
            let line = line?;
            line_number += 1;

            if line_number == 1 {
                debug!("Skipping header line: {:?}", line);
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }

            report.lines_read += 1;
            self.import_line(line_number, &line, &mut report).await;
        }

        info!(
            "Import complete: {} lines, {} imported, {} malformed, {} rejected, {} store errors",
            report.lines_read,
            report.imported,
            report.malformed,
            report.rejected,
            report.store_errors
        );

        Ok(report)
    }

    async fn import_line(&self, line_number: usize, line: &str, report: &mut ImportReport) {
        let record = match parse_line(line) {
            Ok(record) => record,
            Err(e) => {
                warn!("Line {}: {}", line_number, e);
                report.malformed += 1;
                return;
            }
        };

        if let Err(failure) = self.validator.validate(&record) {
            warn!("Line {}: {:?} rejected, {}", line_number, record.question, failure);
            report.rejected += 1;
            return;
        }

        match self.store.upsert(&record.question, &record).await {
            Ok(()) => report.imported += 1,
            Err(e) => {
                warn!("Line {}: error while updating database: {}", line_number, e);
                report.store_errors += 1;
            }
        }
    }
}
