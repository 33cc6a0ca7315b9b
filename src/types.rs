use chrono::{NaiveDateTime, NaiveTime};
use serde::Serialize;

/// Header and every cell of the uploaded file, untouched.
///
/// Used for the data preview and the descriptive-statistics table, which
/// both describe the unfiltered load.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// One typed sensor reading plus the calendar fields derived at load time.
#[derive(Debug, Clone)]
pub struct Record {
    /// Identifier and category cells are `None` when blank.
    pub machine_id: Option<String>,
    pub timestamp: NaiveDateTime,
    pub efficiency_status: Option<String>,
    pub operation_mode: Option<String>,
    pub production_speed: Option<f64>,
    pub error_rate: Option<f64>,
    pub temperature: Option<f64>,
    pub qc_defect_rate: Option<f64>,
    pub power_consumption: Option<f64>,
    pub vibration: Option<f64>,
    pub maintenance_score: Option<f64>,
    pub year: i32,
    /// `None` for every month the label table does not cover.
    pub month: Option<String>,
    pub day: u32,
    pub time: NaiveTime,
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub raw: RawTable,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub total_machines: usize,
    pub avg_production: Option<f64>,
    pub avg_error: Option<f64>,
    pub avg_temp: Option<f64>,
    pub avg_qc_defect: Option<f64>,
    pub avg_consumption: Option<f64>,
    pub avg_vibration: Option<f64>,
    pub high_risk_machines: usize,
    /// Fraction of rows in `Active` mode; `None` when nothing is selected.
    pub efficiency: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayProductionRow {
    #[serde(rename = "Day")]
    pub day: u32,
    #[serde(rename = "Production_Speed_units_per_hr")]
    pub production_speed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineVibrationRow {
    #[serde(rename = "Machine_ID")]
    pub machine_id: String,
    #[serde(rename = "Vibration_Hz")]
    pub vibration: Option<f64>,
}

/// Mean of one measurement for an (efficiency status, machine) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusMachineRow {
    #[serde(rename = "Efficiency_Status")]
    pub efficiency_status: String,
    #[serde(rename = "Machine_ID")]
    pub machine_id: String,
    #[serde(rename = "Mean")]
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCountRow {
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Machines")]
    pub machines: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartTables {
    pub production_by_day: Vec<DayProductionRow>,
    pub top_vibration: Vec<MachineVibrationRow>,
    pub top_error_rate: Vec<StatusMachineRow>,
    pub machines_by_efficiency: Vec<CategoryCountRow>,
    pub machines_by_mode: Vec<CategoryCountRow>,
    pub top_temperature: Vec<StatusMachineRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisoryLevel {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Advisory {
    pub level: AdvisoryLevel,
    pub message: String,
}

/// Result of one aggregation pass, shared by the terminal view and the PDF.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    pub kpis: Kpis,
    pub charts: ChartTables,
    pub advisories: Vec<Advisory>,
}
