//! Chunked inserts, one transaction per chunk.

use rusqlite::Statement;
use tracing::debug;

use super::error::Result;
use super::Catalog;

/// Rows per transaction.
pub const BATCH_SIZE: usize = 100;

/// Outcome of a batched insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Rows written.
    pub rows: usize,
    /// Transactions committed.
    pub batches: usize,
    /// Rows committed by each transaction, in order.
    pub batch_sizes: Vec<usize>,
}

impl Catalog {
    /// Insert `rows` with `sql`, `BATCH_SIZE` rows per transaction.
    ///
    /// If a row fails, its whole chunk is rolled back and the error is
    /// returned. Chunks committed before the failure stay committed. An empty
    /// slice opens no transaction at all.
    pub(crate) fn insert_batched<R, F>(&self, sql: &str, rows: &[R], bind: F) -> Result<BatchReport>
    where
        F: Fn(&mut Statement<'_>, &R) -> rusqlite::Result<usize>,
    {
        let mut report = BatchReport::default();

        for chunk in rows.chunks(BATCH_SIZE) {
            let tx = self.conn.unchecked_transaction()?;
            {
                let mut stmt = tx.prepare_cached(sql)?;
                for row in chunk {
                    bind(&mut stmt, row)?;
                }
            }
            tx.commit()?;

            report.rows += chunk.len();
            report.batches += 1;
            report.batch_sizes.push(chunk.len());
            debug!(
                "committed batch {} ({} rows, {} total)",
                report.batches,
                chunk.len(),
                report.rows
            );
        }

        Ok(report)
    }
}
