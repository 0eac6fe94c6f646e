//! CSV source catalog reader
//!
//! Columns are located by header name, so extra columns and any column order
//! are accepted. Row order of the file is preserved and becomes the order of
//! montage pages.

use crate::types::{sanitize_id, SourceRecord};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

pub const REQUIRED_COLUMNS: [&str; 6] = ["ID", "RA", "DEC", "Major", "Minor", "PA"];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Catalog is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Row {row}: invalid value '{value}' in column {column}")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("Row {row}: source ID is empty")]
    EmptyId { row: usize },

    #[error("Row {row}: duplicate source ID '{id}' (first seen on row {first})")]
    DuplicateId { row: usize, id: String, first: usize },
}

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<SourceRecord>,
}

impl Catalog {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;
        Self::from_csv(rdr)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        Self::from_csv(rdr)
    }

    pub fn from_records(records: Vec<SourceRecord>) -> Self {
        Self { records }
    }

    fn from_csv<R: Read>(mut rdr: csv::Reader<R>) -> Result<Self> {
        let headers = rdr.headers()?.clone();
        let mut columns = [0usize; 6];
        for (slot, name) in columns.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h == name)
                .ok_or(CatalogError::MissingColumn(name))?;
        }

        let mut records = Vec::new();
        // sanitized ID -> 1-based data row
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (i, result) in rdr.records().enumerate() {
            let row = i + 1;
            let record = result?;
            let field = |idx: usize| record.get(columns[idx]).unwrap_or("");
            let number = |idx: usize| -> Result<f64> {
                let raw = field(idx);
                raw.parse::<f64>().map_err(|_| CatalogError::InvalidValue {
                    row,
                    column: REQUIRED_COLUMNS[idx],
                    value: raw.to_string(),
                })
            };

            let id = field(0).to_string();
            if id.is_empty() {
                return Err(CatalogError::EmptyId { row });
            }
            let stem = sanitize_id(&id);
            if let Some(&first) = seen.get(&stem) {
                return Err(CatalogError::DuplicateId { row, id, first });
            }
            seen.insert(stem, row);

            records.push(SourceRecord {
                id,
                ra: number(1)?,
                dec: number(2)?,
                major_deg: number(3)?,
                minor_deg: number(4)?,
                pa_deg: number(5)?,
            });
        }

        log::debug!("catalog: {} sources", records.len());
        Ok(Self { records })
    }

    pub fn records(&self) -> &[SourceRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Name,ID,RA,DEC,Major,Minor,PA,Flux
a,SRC-1,150.10,2.20,0.001,0.0005,45.0,1.2
b,SRC-2,150.20,2.30,0.002,0.001,-10.0,3.4
";

    #[test]
    fn test_reads_columns_by_name_in_order() {
        let catalog = Catalog::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 2);
        let ids: Vec<&str> = catalog.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["SRC-1", "SRC-2"]);
        assert_eq!(catalog.records()[1].pa_deg, -10.0);
        assert_eq!(catalog.records()[0].major_deg, 0.001);
    }

    #[test]
    fn test_missing_column() {
        let csv = "ID,RA,DEC,Major,Minor\nx,1,2,3,4\n";
        let err = Catalog::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, CatalogError::MissingColumn("PA")));
    }

    #[test]
    fn test_invalid_number_reports_row_and_column() {
        let csv = "ID,RA,DEC,Major,Minor,PA\nx,1,abc,3,4,5\n";
        match Catalog::from_reader(csv.as_bytes()).unwrap_err() {
            CatalogError::InvalidValue { row, column, value } => {
                assert_eq!(row, 1);
                assert_eq!(column, "DEC");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let csv = "ID,RA,DEC,Major,Minor,PA\na b,1,2,3,4,5\na_b,1,2,3,4,5\n";
        let err = Catalog::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId { row: 2, first: 1, .. }));
    }

    #[test]
    fn test_empty_catalog() {
        let csv = "ID,RA,DEC,Major,Minor,PA\n";
        let catalog = Catalog::from_reader(csv.as_bytes()).unwrap();
        assert!(catalog.is_empty());
    }
}
