use crate::config::FieldLabels;
use crate::error::Result;
use crate::types::{RawCampaignRow, RawDailyRow, RawRecord};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub blank_rows: usize,
    pub parse_errors: usize,
}

/// Read a CSV stream into header-keyed records, in file order.
///
/// Rows the CSV reader cannot decode are counted and skipped; blank rows
/// are dropped. Cells beyond the header width are ignored.
pub fn read_records<R: Read>(reader: R) -> Result<(Vec<RawRecord>, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut report = LoadReport::default();
    let mut records = Vec::new();
    for result in rdr.records() {
        report.total_rows += 1;
        let row: StringRecord = match result {
            Ok(r) => r,
            Err(e) => {
                debug!("Skipping row {}: {}", report.total_rows, e);
                report.parse_errors += 1;
                continue;
            }
        };
        if row.iter().all(|f| f.trim().is_empty()) {
            report.blank_rows += 1;
            continue;
        }
        let record: RawRecord = headers
            .iter()
            .zip(row.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        records.push(record);
    }
    report.loaded_rows = records.len();
    Ok((records, report))
}

pub fn read_daily<R: Read>(reader: R, labels: &FieldLabels) -> Result<(Vec<RawDailyRow>, LoadReport)> {
    let (records, report) = read_records(reader)?;
    let rows = records.iter().map(|r| RawDailyRow::from_record(r, labels)).collect();
    Ok((rows, report))
}

pub fn read_campaigns<R: Read>(reader: R, labels: &FieldLabels) -> Result<(Vec<RawCampaignRow>, LoadReport)> {
    let (records, report) = read_records(reader)?;
    let rows = records.iter().map(|r| RawCampaignRow::from_record(r, labels)).collect();
    Ok((rows, report))
}

pub fn load_daily(path: &Path, labels: &FieldLabels) -> Result<(Vec<RawDailyRow>, LoadReport)> {
    let out = read_daily(File::open(path)?, labels)?;
    info!("Loaded {} daily rows from {}", out.1.loaded_rows, path.display());
    Ok(out)
}

pub fn load_campaigns(path: &Path, labels: &FieldLabels) -> Result<(Vec<RawCampaignRow>, LoadReport)> {
    let out = read_campaigns(File::open(path)?, labels)?;
    info!("Loaded {} campaign rows from {}", out.1.loaded_rows, path.display());
    Ok(out)
}
