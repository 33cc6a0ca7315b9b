use crate::error::{DashboardError, Result};
use crate::types::{Dataset, RawTable, Record};
use crate::util::{is_missing, parse_f64_safe, parse_timestamp};
use chrono::{Datelike, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const COL_MACHINE_ID: &str = "Machine_ID";
pub const COL_TIMESTAMP: &str = "Timestamp";
pub const COL_EFFICIENCY: &str = "Efficiency_Status";
pub const COL_MODE: &str = "Operation_Mode";
pub const COL_PRODUCTION: &str = "Production_Speed_units_per_hr";
pub const COL_ERROR_RATE: &str = "Error_Rate_%";
pub const COL_TEMPERATURE: &str = "Temperature_C";
pub const COL_QC_DEFECT: &str = "Quality_Control_Defect_Rate_%";
pub const COL_POWER: &str = "Power_Consumption_kW";
pub const COL_VIBRATION: &str = "Vibration_Hz";
pub const COL_MAINTENANCE: &str = "Predictive_Maintenance_Score";

static REQUIRED_COLUMNS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        COL_TIMESTAMP,
        COL_EFFICIENCY,
        COL_MODE,
        COL_MACHINE_ID,
        COL_PRODUCTION,
        COL_ERROR_RATE,
        COL_TEMPERATURE,
        COL_QC_DEFECT,
        COL_POWER,
        COL_VIBRATION,
        COL_MAINTENANCE,
    ]
});

// Only the first quarter is labelled; other months stay unlabelled and can
// only be selected through the missing-label filter value.
static MONTH_LABELS: Lazy<HashMap<u32, &'static str>> =
    Lazy::new(|| HashMap::from([(1, "Jan"), (2, "Feb"), (3, "Mar")]));

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub total_rows: usize,
    pub first_timestamp: Option<NaiveDateTime>,
    pub last_timestamp: Option<NaiveDateTime>,
}

pub fn month_label(month: u32) -> Option<String> {
    MONTH_LABELS.get(&month).map(|s| s.to_string())
}

/// Column positions of every required field, resolved once from the header.
struct Schema {
    index: HashMap<&'static str, usize>,
}

impl Schema {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let mut index = HashMap::new();
        let mut missing = Vec::new();
        for col in REQUIRED_COLUMNS.iter() {
            match headers.iter().position(|h| h.trim() == *col) {
                Some(i) => {
                    index.insert(*col, i);
                }
                None => missing.push(col.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(DashboardError::MissingColumns(missing));
        }
        Ok(Schema { index })
    }

    fn cell<'a>(&self, record: &'a StringRecord, col: &'static str) -> &'a str {
        self.index
            .get(col)
            .and_then(|i| record.get(*i))
            .unwrap_or("")
    }

    /// Trimmed text cell; blank and NA-style cells are missing.
    fn text(&self, record: &StringRecord, col: &'static str) -> Option<String> {
        let raw = self.cell(record, col).trim();
        if is_missing(raw) {
            None
        } else {
            Some(raw.to_string())
        }
    }

    fn number(&self, record: &StringRecord, col: &'static str, row: usize) -> Result<Option<f64>> {
        let raw = self.cell(record, col);
        if is_missing(raw) {
            return Ok(None);
        }
        match parse_f64_safe(Some(raw)) {
            Some(v) => Ok(Some(v)),
            None => Err(DashboardError::InvalidNumber {
                row,
                column: col.to_string(),
                value: raw.to_string(),
            }),
        }
    }
}

pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<(Dataset, LoadReport)> {
    let path = path.as_ref();
    debug!("opening dataset {}", path.display());
    let file = File::open(path)?;
    load_from_reader(file)
}

/// Parse a CSV stream, validate its header against the required schema and
/// derive the calendar fields for every row. The first bad row aborts the load.
pub fn load_from_reader<R: Read>(reader: R) -> Result<(Dataset, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let schema = Schema::from_headers(&headers)?;

    let mut raw = RawTable {
        headers: headers.iter().map(|h| h.trim().to_string()).collect(),
        rows: Vec::new(),
    };
    let mut records = Vec::new();

    let width = raw.headers.len();
    for (i, result) in rdr.records().enumerate() {
        let rec = result?;
        let row = i + 1;
        // Short rows are padded with missing cells; long rows are malformed.
        if rec.len() > width {
            return Err(DashboardError::TooManyFields {
                row,
                expected: width,
                found: rec.len(),
            });
        }

        let ts_raw = schema.cell(&rec, COL_TIMESTAMP);
        let timestamp = parse_timestamp(ts_raw).ok_or_else(|| DashboardError::InvalidTimestamp {
            row,
            value: ts_raw.to_string(),
        })?;

        records.push(Record {
            machine_id: schema.text(&rec, COL_MACHINE_ID),
            timestamp,
            efficiency_status: schema.text(&rec, COL_EFFICIENCY),
            operation_mode: schema.text(&rec, COL_MODE),
            production_speed: schema.number(&rec, COL_PRODUCTION, row)?,
            error_rate: schema.number(&rec, COL_ERROR_RATE, row)?,
            temperature: schema.number(&rec, COL_TEMPERATURE, row)?,
            qc_defect_rate: schema.number(&rec, COL_QC_DEFECT, row)?,
            power_consumption: schema.number(&rec, COL_POWER, row)?,
            vibration: schema.number(&rec, COL_VIBRATION, row)?,
            maintenance_score: schema.number(&rec, COL_MAINTENANCE, row)?,
            year: timestamp.year(),
            month: month_label(timestamp.month()),
            day: timestamp.day(),
            time: timestamp.time(),
        });
        let mut cells: Vec<String> = rec.iter().map(|c| c.to_string()).collect();
        cells.resize(width, String::new());
        raw.rows.push(cells);
    }

    let report = LoadReport {
        total_rows: records.len(),
        first_timestamp: records.iter().map(|r| r.timestamp).min(),
        last_timestamp: records.iter().map(|r| r.timestamp).max(),
    };
    info!(
        "loaded {} rows ({} columns)",
        report.total_rows,
        raw.headers.len()
    );
    Ok((Dataset { raw, records }, report))
}
