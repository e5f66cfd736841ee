//! Per-kind record accumulators.
//!
//! One growing table per record kind, registered up front with a fixed
//! column order: the six base columns of the import format first, then the
//! kind-specific extension columns. Missing source attributes arrive here
//! as empty strings so every row of a kind has the same arity.

use crate::error::{ExportError, Result};

/// Base columns shared by every record kind, in export order.
pub const BASE_COLUMNS: [&str; 6] = [
    "core.externalId",
    "core.name",
    "core.description",
    "core.businessDescription",
    "core.businessName",
    "core.reference",
];

/// The import format types every column as a string, so the reference
/// flag is the literal token rather than a native boolean.
pub const REFERENCE_FLAG: &str = "FALSE";

/// Declared schema for one record kind. The class name doubles as the
/// table's file name inside the archive.
#[derive(Debug, Clone)]
pub struct TableSpec {
    pub class: String,
    pub extra_columns: Vec<String>,
}

impl TableSpec {
    pub fn new(class: &str, extra_columns: &[&str]) -> Self {
        Self {
            class: class.to_string(),
            extra_columns: extra_columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.class)
    }

    pub fn header(&self) -> Vec<String> {
        BASE_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.extra_columns.iter().cloned())
            .collect()
    }
}

/// One record as produced by a schema strategy, before it is widened into
/// a full table row.
#[derive(Debug, Clone)]
pub struct RecordRow {
    pub external_id: String,
    pub name: String,
    pub description: String,
    pub extras: Vec<String>,
}

#[derive(Debug)]
pub struct RecordTable {
    spec: TableSpec,
    rows: Vec<Vec<String>>,
}

impl RecordTable {
    pub fn spec(&self) -> &TableSpec {
        &self.spec
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug)]
pub struct RecordCollector {
    tables: Vec<RecordTable>,
}

impl RecordCollector {
    pub fn new(specs: Vec<TableSpec>) -> Self {
        let tables = specs
            .into_iter()
            .map(|spec| RecordTable {
                spec,
                rows: Vec::new(),
            })
            .collect();
        Self { tables }
    }

    /// Append one record to the bucket for `class`. The extension values
    /// must match the registered schema exactly; the schema is constant
    /// across all rows of a kind.
    pub fn add(&mut self, class: &str, record: RecordRow) -> Result<()> {
        let table = self
            .tables
            .iter_mut()
            .find(|t| t.spec.class == class)
            .ok_or_else(|| ExportError::UnknownKind(class.to_string()))?;

        if record.extras.len() != table.spec.extra_columns.len() {
            return Err(ExportError::ColumnMismatch {
                class: class.to_string(),
                expected: table.spec.extra_columns.len(),
                got: record.extras.len(),
            });
        }

        let mut row = Vec::with_capacity(BASE_COLUMNS.len() + record.extras.len());
        row.push(record.external_id);
        row.push(record.name);
        row.push(record.description);
        row.push(String::new());
        row.push(String::new());
        row.push(REFERENCE_FLAG.to_string());
        row.extend(record.extras);
        table.rows.push(row);
        Ok(())
    }

    pub fn tables(&self) -> &[RecordTable] {
        &self.tables
    }

    pub fn count(&self, class: &str) -> usize {
        self.tables
            .iter()
            .find(|t| t.spec.class == class)
            .map(|t| t.len())
            .unwrap_or(0)
    }

    /// Per-kind row counts in registration order, for end-of-run reporting.
    pub fn counts(&self) -> Vec<(String, usize)> {
        self.tables
            .iter()
            .map(|t| (t.spec.class.clone(), t.len()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_specs() -> Vec<TableSpec> {
        vec![
            TableSpec::new("demo.Server", &[]),
            TableSpec::new("demo.Field", &["demo.Type", "core.Position"]),
        ]
    }

    fn row(id: &str, extras: &[&str]) -> RecordRow {
        RecordRow {
            external_id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            extras: extras.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[test]
    fn test_add_widens_base_columns() {
        let mut records = RecordCollector::new(sample_specs());
        records.add("demo.Server", row("host", &[])).unwrap();

        let table = &records.tables()[0];
        assert_eq!(table.rows()[0].len(), 6);
        assert_eq!(table.rows()[0][5], REFERENCE_FLAG);
        assert_eq!(table.rows()[0][3], "");
        assert_eq!(table.rows()[0][4], "");
    }

    #[test]
    fn test_extension_columns_follow_base() {
        let mut records = RecordCollector::new(sample_specs());
        records
            .add("demo.Field", row("host/f1", &["esriFieldTypeOID", "1"]))
            .unwrap();

        let table = &records.tables()[1];
        assert_eq!(table.spec().header().len(), 8);
        assert_eq!(table.rows()[0][6], "esriFieldTypeOID");
        assert_eq!(table.rows()[0][7], "1");
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let mut records = RecordCollector::new(sample_specs());
        let err = records.add("demo.Layer", row("x", &[])).unwrap_err();
        assert!(matches!(err, ExportError::UnknownKind(_)));
    }

    #[test]
    fn test_arity_mismatch_is_rejected() {
        let mut records = RecordCollector::new(sample_specs());
        let err = records.add("demo.Field", row("x", &["only-one"])).unwrap_err();
        assert!(matches!(err, ExportError::ColumnMismatch { .. }));
    }

    #[test]
    fn test_counts_track_per_kind() {
        let mut records = RecordCollector::new(sample_specs());
        records.add("demo.Server", row("a", &[])).unwrap();
        records.add("demo.Field", row("a/f", &["t", "1"])).unwrap();
        records.add("demo.Field", row("a/g", &["t", "2"])).unwrap();

        assert_eq!(records.count("demo.Server"), 1);
        assert_eq!(records.count("demo.Field"), 2);
        assert_eq!(
            records.counts(),
            vec![("demo.Server".to_string(), 1), ("demo.Field".to_string(), 2)]
        );
    }
}
