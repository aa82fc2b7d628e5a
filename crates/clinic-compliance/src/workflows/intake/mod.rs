mod mapping;
mod normalizer;
mod parser;
mod records;

pub use mapping::{ColumnMapping, MappingError, ResolvedMapping, SemanticField};
pub use parser::{read_table, MalformedRow, RawRow, RawTable};
pub use records::{
    NormalizedBatch, RowError, RowErrorReason, SkippedRows, SKIPPED_SAMPLE_LIMIT,
};

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("failed to read visit data: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid CSV visit data: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Mapping(#[from] MappingError),
}

/// Turns raw visit rows into [`NormalizedBatch`]es using a caller-declared
/// column mapping. Mapping problems abort before any row is touched; row
/// problems are counted and the remaining rows still flow through.
pub struct VisitImporter;

impl VisitImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        mapping: &ColumnMapping,
    ) -> Result<NormalizedBatch, IntakeError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, mapping)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        mapping: &ColumnMapping,
    ) -> Result<NormalizedBatch, IntakeError> {
        let table = parser::read_table(reader)?;
        Ok(Self::normalize_table(&table, mapping)?)
    }

    pub fn from_rows(
        rows: &[BTreeMap<String, String>],
        mapping: &ColumnMapping,
    ) -> Result<NormalizedBatch, MappingError> {
        Self::normalize_table(&RawTable::from_maps(rows), mapping)
    }

    pub fn normalize_table(
        table: &RawTable,
        mapping: &ColumnMapping,
    ) -> Result<NormalizedBatch, MappingError> {
        let resolved = mapping.resolve(table.headers())?;
        let mut batch = NormalizedBatch::default();

        for row in table.rows() {
            let outcome = match row {
                Ok(raw) => records::normalize_row(raw, &resolved),
                Err(malformed) => Err(records::malformed(malformed.row, &malformed.detail)),
            };

            match outcome {
                Ok(record) => batch.records.push(record),
                Err(error) => batch.skipped.record(error),
            }
        }

        if !batch.skipped.is_empty() {
            warn!(
                skipped = batch.skipped.count,
                kept = batch.records.len(),
                first = ?batch.skipped.sample.first().map(ToString::to_string),
                "skipped visit rows during normalization"
            );
        }
        if batch.is_empty() {
            warn!(rows = table.len(), "no usable visit rows after normalization");
        }

        Ok(batch)
    }
}
