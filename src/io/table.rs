// src/io/table.rs
//
// Thin CSV boundary around the matching core. Every input column is carried
// through untouched; matching only reads the mapped name/coordinate columns.
use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use log::{debug, warn};
use std::io::{Read, Write};
use std::path::Path;

use crate::matching::geospatial::parse_coordinate;
use crate::models::core::{EntityRecord, MatchedRecord};
use crate::utils::matching_config::ColumnMapping;

pub const MATCH_COLUMNS: [&str; 8] = [
    "Clean_Name",
    "Matched_Key",
    "Matched_Bank_Name",
    "Match_Score",
    "Matched_Latitude",
    "Matched_Longitude",
    "Distance_km",
    "Distance_miles",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn read_csv(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;
        let table = Self::from_reader(file)
            .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;
        debug!(
            "Read {} rows x {} columns from {}",
            table.rows.len(),
            table.headers.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = reader
            .headers()
            .context("Failed to read CSV header row")?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("Failed to read CSV row {}", i + 1))?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self { headers, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name).ok_or_else(|| {
            anyhow!(
                "Required column '{}' not found (available: {:?})",
                name,
                self.headers
            )
        })
    }

    /// Non-blank cell value; short rows and blank cells are missing.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Drops rows whose `column` value fails `keep`; returns how many were removed.
    pub fn retain_rows<F>(&mut self, column: &str, mut keep: F) -> Result<usize>
    where
        F: FnMut(Option<&str>) -> bool,
    {
        let idx = self.require_column(column)?;
        let before = self.rows.len();
        self.rows.retain(|row| {
            let value = row.get(idx).map(|v| v.trim()).filter(|v| !v.is_empty());
            keep(value)
        });
        Ok(before - self.rows.len())
    }

    /// Name and coordinates per row. The name column must exist; a missing
    /// coordinate column leaves every coordinate of this table missing.
    pub fn to_records(&self, columns: &ColumnMapping) -> Result<Vec<EntityRecord>> {
        let name_idx = self.require_column(&columns.name)?;
        let lat_idx = self.optional_column(&columns.latitude);
        let lon_idx = self.optional_column(&columns.longitude);

        let records = (0..self.rows.len())
            .map(|row| EntityRecord {
                row_index: row,
                name: self.cell(row, name_idx).map(str::to_string),
                latitude: lat_idx
                    .and_then(|c| self.cell(row, c))
                    .and_then(parse_coordinate),
                longitude: lon_idx
                    .and_then(|c| self.cell(row, c))
                    .and_then(parse_coordinate),
            })
            .collect();
        Ok(records)
    }

    fn optional_column(&self, name: &str) -> Option<usize> {
        let idx = self.column_index(name);
        if idx.is_none() {
            warn!(
                "Coordinate column '{}' not found; distances will be missing",
                name
            );
        }
        idx
    }

    /// Copy of this table with the match columns appended. `matched` is
    /// looked up by `row_index`; rows without a result get empty cells.
    /// Short rows are padded to the header width. Cells beyond the header
    /// width are kept after the match columns so those stay under their headers.
    pub fn with_match_columns(&self, matched: &[MatchedRecord]) -> Self {
        let mut headers = self.headers.clone();
        headers.extend(MATCH_COLUMNS.iter().map(|c| c.to_string()));

        let width = self.headers.len();
        let mut by_row: Vec<Option<&MatchedRecord>> = vec![None; self.rows.len()];
        for record in matched {
            if let Some(slot) = by_row.get_mut(record.row_index) {
                *slot = Some(record);
            }
        }

        let rows = self
            .rows
            .iter()
            .zip(by_row)
            .enumerate()
            .map(|(i, (row, record))| {
                let mut out: Vec<String> = row.iter().take(width).cloned().collect();
                out.resize(width, String::new());
                match record {
                    Some(r) => out.extend(match_cells(r)),
                    None => out.extend(MATCH_COLUMNS.iter().map(|_| String::new())),
                }
                if row.len() > width {
                    warn!(
                        "Row {} has {} cells but the header has {}; extra cells moved after the match columns",
                        i + 1,
                        row.len(),
                        width
                    );
                    out.extend(row[width..].iter().cloned());
                }
                out
            })
            .collect();

        Self { headers, rows }
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {}", path.display()))?;
        self.to_writer(file)
            .with_context(|| format!("Failed to write CSV: {}", path.display()))
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn match_cells(record: &MatchedRecord) -> [String; 8] {
    fn opt_f64(v: Option<f64>) -> String {
        v.map(|v| v.to_string()).unwrap_or_default()
    }
    [
        record.clean_name.clone(),
        record.matched_key.clone().unwrap_or_default(),
        record.matched_bank_name.clone().unwrap_or_default(),
        record.match_score.to_string(),
        opt_f64(record.matched_latitude),
        opt_f64(record.matched_longitude),
        opt_f64(record.distance_km),
        opt_f64(record.distance_miles),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const WITHDRAWALS: &str = "\
Name,Impact LocationLatitude,Impact LocationLongitude,Credit Classification or Subdivision
Wetland A,34.05,-118.24,Palustrine Emergent
Wetland B, not a number ,-115.15,Stream
,40.71,-74.00,
";

    fn columns() -> ColumnMapping {
        ColumnMapping::new("Name", "Impact LocationLatitude", "Impact LocationLongitude")
    }

    #[test]
    fn test_records_from_csv() {
        let table = Table::from_reader(WITHDRAWALS.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);

        let records = table.to_records(&columns()).unwrap();
        assert_eq!(records[0].name.as_deref(), Some("Wetland A"));
        assert_eq!(records[0].latitude, Some(34.05));
        assert_eq!(records[1].latitude, None);
        assert_eq!(records[1].longitude, Some(-115.15));
        assert_eq!(records[2].name, None);
        assert_eq!(records[2].row_index, 2);
    }

    #[test]
    fn test_missing_name_column_is_an_error() {
        let table = Table::from_reader(WITHDRAWALS.as_bytes()).unwrap();
        let err = table
            .to_records(&ColumnMapping::new("Bank Name", "Latitude", "Longitude"))
            .unwrap_err();
        assert!(err.to_string().contains("Bank Name"));
    }

    #[test]
    fn test_missing_coordinate_columns_yield_missing_values() {
        let table = Table::from_reader("Name\nTar River Bank\n".as_bytes()).unwrap();
        let records = table
            .to_records(&ColumnMapping::new("Name", "Latitude", "Longitude"))
            .unwrap();
        assert_eq!(records[0].latitude, None);
        assert_eq!(records[0].longitude, None);
    }

    #[test]
    fn test_retain_rows() {
        let mut table = Table::from_reader(WITHDRAWALS.as_bytes()).unwrap();
        let removed = table
            .retain_rows("Credit Classification or Subdivision", |v| {
                v.map_or(false, |v| v.contains("Palustrine"))
            })
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(table.rows[0][0], "Wetland A");
    }

    #[test]
    fn test_match_columns_written_in_row_order() {
        let table = Table::from_reader("Name,Extra\nWetland A,x\nUnknown,y\n".as_bytes()).unwrap();
        let matched = vec![MatchedRecord {
            row_index: 0,
            clean_name: "wetland a".to_string(),
            matched_key: Some("wetland a".to_string()),
            matched_bank_name: Some("Wetland A Mitigation Bank".to_string()),
            match_score: 100,
            matched_latitude: Some(34.05),
            matched_longitude: Some(-118.24),
            distance_km: Some(0.0),
            distance_miles: Some(0.0),
        }];

        let enriched = table.with_match_columns(&matched);
        assert_eq!(enriched.headers.len(), 2 + MATCH_COLUMNS.len());
        assert_eq!(enriched.rows[0][4], "Wetland A Mitigation Bank");
        assert_eq!(enriched.rows[0][5], "100");
        assert!(enriched.rows[1][2..].iter().all(|c| c.is_empty()));

        let mut buf = Vec::new();
        enriched.to_writer(&mut buf).unwrap();
        let written = String::from_utf8(buf).unwrap();
        assert!(written.starts_with("Name,Extra,Clean_Name,Matched_Key,Matched_Bank_Name"));
        assert!(written.contains("Wetland A,x,wetland a,wetland a,Wetland A Mitigation Bank,100,34.05,-118.24,0,0"));
    }

    #[test]
    fn test_ragged_rows_keep_extra_cells() {
        let table =
            Table::from_reader("Name,Extra\nWetland A,x,overflow,more\nShort\n".as_bytes()).unwrap();
        let enriched = table.with_match_columns(&[]);
        let width = 2 + MATCH_COLUMNS.len();

        let long = &enriched.rows[0];
        assert_eq!(long.len(), width + 2);
        assert_eq!(long[..2], ["Wetland A", "x"]);
        assert!(long[2..width].iter().all(|c| c.is_empty()));
        assert_eq!(long[width..], ["overflow", "more"]);

        let short = &enriched.rows[1];
        assert_eq!(short.len(), width);
        assert_eq!(short[0], "Short");
        assert!(short[1..].iter().all(|c| c.is_empty()));
    }
}
