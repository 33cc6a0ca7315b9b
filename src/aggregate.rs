// Aggregation engine: KPIs, chart tables and advisories for one filtered
// table. `aggregate` is the only entry point and has no side effects, so the
// terminal view and the PDF exporter render the same numbers.
use crate::types::{
    Advisory, AdvisoryLevel, CategoryCountRow, ChartTables, Dashboard, DayProductionRow, Kpis,
    MachineVibrationRow, Record, StatusMachineRow,
};
use crate::util::{cmp_desc, format_opt, mean, round2};
use log::debug;
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub const TOP_N: usize = 10;
pub const HIGH_RISK_SCORE: f64 = 0.4;
pub const ACTIVE_MODE: &str = "Active";

/// Sort key for machine identifiers: numeric ids in numeric order first,
/// then any non-numeric ids lexicographically.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MachineKey(String);

impl MachineKey {
    fn numeric(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl Ord for MachineKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for MachineKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn column_mean(rows: &[&Record], value: fn(&Record) -> Option<f64>) -> Option<f64> {
    let vals: Vec<f64> = rows.iter().filter_map(|r| value(r)).collect();
    mean(&vals)
}

/// Group-by-mean in ascending key order. Rows without a key form no group;
/// missing values are skipped and a group with none left has an undefined mean.
fn group_mean<K: Ord>(
    rows: &[&Record],
    key: impl Fn(&Record) -> Option<K>,
    value: fn(&Record) -> Option<f64>,
) -> Vec<(K, Option<f64>)> {
    let mut groups: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for r in rows {
        let Some(k) = key(r) else {
            continue;
        };
        let e = groups.entry(k).or_default();
        if let Some(v) = value(r) {
            e.push(v);
        }
    }
    groups.into_iter().map(|(k, v)| (k, mean(&v))).collect()
}

fn group_count(rows: &[&Record], key: impl Fn(&Record) -> Option<&str>) -> Vec<CategoryCountRow> {
    let mut groups: BTreeMap<&str, usize> = BTreeMap::new();
    for k in rows.iter().filter_map(|r| key(r)) {
        *groups.entry(k).or_default() += 1;
    }
    groups
        .into_iter()
        .map(|(k, n)| CategoryCountRow {
            category: k.to_string(),
            machines: n,
        })
        .collect()
}

pub fn compute_kpis(rows: &[&Record]) -> Kpis {
    let total = rows.len();
    let active = rows
        .iter()
        .filter(|r| r.operation_mode.as_deref() == Some(ACTIVE_MODE))
        .count();
    Kpis {
        total_machines: total,
        avg_production: column_mean(rows, |r| r.production_speed),
        avg_error: column_mean(rows, |r| r.error_rate),
        avg_temp: column_mean(rows, |r| r.temperature),
        avg_qc_defect: column_mean(rows, |r| r.qc_defect_rate),
        avg_consumption: column_mean(rows, |r| r.power_consumption),
        avg_vibration: column_mean(rows, |r| r.vibration),
        high_risk_machines: rows
            .iter()
            .filter(|r| matches!(r.maintenance_score, Some(s) if s < HIGH_RISK_SCORE))
            .count(),
        efficiency: if total == 0 {
            None
        } else {
            Some(active as f64 / total as f64)
        },
    }
}

/// Mean of `value` per (efficiency status, machine), rounded, then the ten
/// highest. Ties keep ascending key order.
fn top_status_machine(rows: &[&Record], value: fn(&Record) -> Option<f64>) -> Vec<StatusMachineRow> {
    let mut table: Vec<StatusMachineRow> = group_mean(
        rows,
        |r| Some((r.efficiency_status.clone()?, MachineKey(r.machine_id.clone()?))),
        value,
    )
    .into_iter()
    .map(|((status, machine), m)| StatusMachineRow {
        efficiency_status: status,
        machine_id: machine.0,
        mean: m.map(round2),
    })
    .collect();
    table.sort_by(|a, b| cmp_desc(a.mean, b.mean));
    table.truncate(TOP_N);
    table
}

pub fn compute_charts(rows: &[&Record]) -> ChartTables {
    let production_by_day = group_mean(rows, |r| Some(r.day), |r| r.production_speed)
        .into_iter()
        .map(|(day, m)| DayProductionRow {
            day,
            production_speed: m.map(round2),
        })
        .collect();

    // Vibration is ranked on the unrounded mean and rounded afterwards.
    let mut by_machine = group_mean(
        rows,
        |r| r.machine_id.clone().map(MachineKey),
        |r| r.vibration,
    );
    by_machine.sort_by(|a, b| cmp_desc(a.1, b.1));
    let top_vibration = by_machine
        .into_iter()
        .take(TOP_N)
        .map(|(k, m)| MachineVibrationRow {
            machine_id: k.0,
            vibration: m.map(round2),
        })
        .collect();

    ChartTables {
        production_by_day,
        top_vibration,
        top_error_rate: top_status_machine(rows, |r| r.error_rate),
        machines_by_efficiency: group_count(rows, |r| r.efficiency_status.as_deref()),
        machines_by_mode: group_count(rows, |r| r.operation_mode.as_deref()),
        top_temperature: top_status_machine(rows, |r| r.temperature),
    }
}

/// Advisories always read the first row of the ranked tables.
pub fn compute_advisories(charts: &ChartTables) -> Vec<Advisory> {
    let mut out = Vec::new();
    if let Some(top) = charts.top_vibration.first() {
        out.push(Advisory {
            level: AdvisoryLevel::Warning,
            message: format!(
                "Machine {} shows the highest average vibration ({} Hz), indicating potential maintenance risk.",
                top.machine_id,
                format_opt(top.vibration, 2)
            ),
        });
    }
    if let Some(worst) = charts.top_error_rate.first() {
        out.push(Advisory {
            level: AdvisoryLevel::Error,
            message: format!(
                "Machine {} under {} efficiency shows the highest average error rate ({}%).",
                worst.machine_id,
                worst.efficiency_status,
                format_opt(worst.mean, 2)
            ),
        });
    }
    if let Some(hot) = charts.top_temperature.first() {
        out.push(Advisory {
            level: AdvisoryLevel::Warning,
            message: format!(
                "Machine {} under {} efficiency shows the highest temperature rate ({}°C).",
                hot.machine_id,
                hot.efficiency_status,
                format_opt(hot.mean, 2)
            ),
        });
    }
    out
}

pub fn aggregate(rows: &[&Record]) -> Dashboard {
    let kpis = compute_kpis(rows);
    let charts = compute_charts(rows);
    let advisories = compute_advisories(&charts);
    debug!(
        "aggregated {} rows into {} day buckets, {} advisories",
        rows.len(),
        charts.production_by_day.len(),
        advisories.len()
    );
    Dashboard {
        kpis,
        charts,
        advisories,
    }
}
