// Terminal presentation of one aggregation pass.
//
// Every function returns the rendered text so the interactive loop decides
// where it goes.
use crate::chart::{chart_specs, ChartSpec};
use crate::filter::{display_value, Dimension, FilterSelection};
use crate::summary::ColumnSummary;
use crate::types::{AdvisoryLevel, Dashboard, Dataset, Kpis};
use crate::util::{format_int, format_opt};
use tabled::{builder::Builder, settings::Style, Table, Tabled};

const BAR_WIDTH: usize = 40;

fn with_unit(v: Option<f64>, unit: &str) -> String {
    match v {
        Some(_) => format!("{}{}", format_opt(v, 2), unit),
        None => "n/a".to_string(),
    }
}

/// The nine KPI tiles in display order, label and formatted value.
pub fn kpi_tiles(k: &Kpis) -> Vec<(&'static str, String)> {
    vec![
        ("TOTAL MACHINES", format_int(k.total_machines as u64)),
        ("AVG. PRODUCTION SPEED PER HOUR", with_unit(k.avg_production, "")),
        ("AVG. ERROR RATE (%)", with_unit(k.avg_error, " %")),
        ("AVG. TEMPERATURE (°C)", with_unit(k.avg_temp, "°C")),
        ("QUALITY CONTROL DEFECT RATE (%)", with_unit(k.avg_qc_defect, " %")),
        ("AVG. POWER CONSUMPTION (kW)", with_unit(k.avg_consumption, " kW")),
        ("AVG. VIBRATION (Hz)", with_unit(k.avg_vibration, " Hz")),
        ("MACHINES AT HIGH RISK", format_int(k.high_risk_machines as u64)),
        ("EFFICIENCY (%)", with_unit(k.efficiency.map(|e| e * 100.0), " %")),
    ]
}

pub fn render_kpis(k: &Kpis) -> String {
    let tiles = kpi_tiles(k);
    let mut builder = Builder::default();
    for row in tiles.chunks(3) {
        builder.push_record(row.iter().map(|(label, value)| format!("{}\n{}", label, value)));
    }
    builder.build().with(Style::modern()).to_string()
}

/// First rows of the unfiltered load, with the derived calendar columns
/// appended after the source columns.
pub fn render_preview(dataset: &Dataset, max_rows: usize) -> String {
    let raw = &dataset.raw;
    if raw.rows.is_empty() {
        return "(no rows)".to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(
        raw.headers
            .iter()
            .cloned()
            .chain(["Year", "Month", "Day", "Time"].map(String::from)),
    );
    for (row, rec) in raw.rows.iter().zip(&dataset.records).take(max_rows) {
        builder.push_record(row.iter().cloned().chain([
            rec.year.to_string(),
            display_value(&rec.month).to_string(),
            rec.day.to_string(),
            rec.time.to_string(),
        ]));
    }
    let mut out = builder.build().with(Style::markdown()).to_string();
    if raw.rows.len() > max_rows {
        out.push_str(&format!(
            "\n({} of {} rows shown)",
            format_int(max_rows as u64),
            format_int(raw.rows.len() as u64)
        ));
    }
    out
}

#[derive(Tabled)]
struct SummaryLine {
    #[tabled(rename = "Column")]
    column: String,
    #[tabled(rename = "count")]
    count: String,
    #[tabled(rename = "mean")]
    mean: String,
    #[tabled(rename = "std")]
    std: String,
    #[tabled(rename = "min")]
    min: String,
    #[tabled(rename = "25%")]
    q25: String,
    #[tabled(rename = "50%")]
    median: String,
    #[tabled(rename = "75%")]
    q75: String,
    #[tabled(rename = "max")]
    max: String,
}

pub fn render_summary(stats: &[ColumnSummary]) -> String {
    if stats.is_empty() {
        return "(no numeric columns)".to_string();
    }
    let lines: Vec<SummaryLine> = stats
        .iter()
        .map(|s| SummaryLine {
            column: s.column.clone(),
            count: format_int(s.count as u64),
            mean: format_opt(s.mean, 4),
            std: format_opt(s.std, 4),
            min: format_opt(s.min, 4),
            q25: format_opt(s.q25, 4),
            median: format_opt(s.median, 4),
            q75: format_opt(s.q75, 4),
            max: format_opt(s.max, 4),
        })
        .collect();
    Table::new(lines).with(Style::markdown()).to_string()
}

/// One chart as a table with a text bar scaled to the largest value.
pub fn render_chart(spec: &ChartSpec) -> String {
    if spec.bars.is_empty() {
        return "(no rows)".to_string();
    }
    let max = spec.max_value().unwrap_or(0.0);
    let mut builder = Builder::default();
    builder.push_record(["", spec.y_label, ""].map(String::from));
    for b in &spec.bars {
        let len = match b.value {
            Some(v) if max > 0.0 && v > 0.0 => ((v / max) * BAR_WIDTH as f64).round() as usize,
            _ => 0,
        };
        builder.push_record([b.label.clone(), format_opt(b.value, 2), "█".repeat(len)]);
    }
    builder.build().with(Style::markdown()).to_string()
}

pub fn render_filters(sel: &FilterSelection) -> String {
    Dimension::ALL
        .iter()
        .map(|dim| {
            let values: Vec<&str> = sel.selected(*dim).iter().map(display_value).collect();
            format!("{}: {}", dim, if values.is_empty() { "(none)".to_string() } else { values.join(", ") })
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The analysis section: filters, KPI grid, the six charts and advisories.
pub fn render_dashboard(sel: &FilterSelection, dash: &Dashboard) -> String {
    let mut out = String::new();
    out.push_str("ANALYSIS DASHBOARD\n\n");
    out.push_str(&render_filters(sel));
    out.push_str("\n\n");
    out.push_str(&render_kpis(&dash.kpis));
    out.push_str("\n\n");

    if dash.kpis.total_machines == 0 {
        out.push_str("No data matches the current filters.\n");
        return out;
    }

    let specs = chart_specs(&dash.charts);
    for (i, spec) in specs.iter().enumerate() {
        out.push_str(&format!("{}. {}\n\n", i + 1, spec.heading));
        out.push_str(&render_chart(spec));
        out.push_str("\n\n");
    }
    for a in &dash.advisories {
        let tag = match a.level {
            AdvisoryLevel::Warning => "WARNING",
            AdvisoryLevel::Error => "ERROR",
        };
        out.push_str(&format!("[{}] {}\n", tag, a.message));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::loader::load_from_reader;
    use crate::loader::tests::fixture;
    use crate::summary::describe;

    fn kpis() -> Kpis {
        Kpis {
            total_machines: 1200,
            avg_production: Some(251.456),
            avg_error: Some(7.5),
            avg_temp: Some(60.0),
            avg_qc_defect: Some(2.25),
            avg_consumption: Some(5.0),
            avg_vibration: Some(2.5),
            high_risk_machines: 3,
            efficiency: Some(0.25),
        }
    }

    #[test]
    fn tiles_carry_units() {
        let tiles = kpi_tiles(&kpis());
        assert_eq!(tiles.len(), 9);
        assert_eq!(tiles[0].1, "1,200");
        assert_eq!(tiles[1].1, "251.46");
        assert_eq!(tiles[2].1, "7.50 %");
        assert_eq!(tiles[3].1, "60.00°C");
        assert_eq!(tiles[5].1, "5.00 kW");
        assert_eq!(tiles[6].1, "2.50 Hz");
        assert_eq!(tiles[8].1, "25.00 %");
    }

    #[test]
    fn empty_kpis_render_as_not_available() {
        let tiles = kpi_tiles(&Kpis::default());
        assert_eq!(tiles[0].1, "0");
        assert_eq!(tiles[2].1, "n/a");
        assert_eq!(tiles[8].1, "n/a");
        let grid = render_kpis(&Kpis::default());
        assert!(grid.contains("EFFICIENCY (%)"));
    }

    #[test]
    fn dashboard_lists_charts_and_advisories() {
        let csv = fixture(&[
            ("A", "2025-01-01 08:00:00", "Active", "High", 5.0),
            ("B", "2025-01-02 09:00:00", "Idle", "Low", 9.0),
        ]);
        let ds = load_from_reader(csv.as_bytes()).unwrap().0;
        let sel = FilterSelection::all_observed(&ds);
        let text = render_dashboard(&sel, &aggregate(&sel.apply(&ds)));
        assert!(text.contains("1. DAYWISE AVG. PRODUCTION SPEED PER HOUR"));
        assert!(text.contains("6. AVG. TEMP. (°C) BY EFFICIENCY STATUS AND MACHINE ID"));
        assert!(text.contains("[WARNING] Machine B shows the highest average vibration (9.00 Hz)"));
        assert!(text.contains("[ERROR] Machine "));

        let preview = render_preview(&ds, 1);
        assert!(preview.contains("Machine_ID"));
        assert!(preview.contains("| Jan "));
        assert!(preview.contains("08:00:00"));
        assert!(preview.contains("(1 of 2 rows shown)"));
        assert!(render_summary(&describe(&ds.raw)).contains("Vibration_Hz"));
    }

    #[test]
    fn empty_selection_shows_no_data_notice() {
        let csv = fixture(&[("A", "2025-01-01 08:00:00", "Active", "High", 5.0)]);
        let ds = load_from_reader(csv.as_bytes()).unwrap().0;
        let sel = FilterSelection::all_observed(&ds).with(Dimension::Mode, vec![]);
        let text = render_dashboard(&sel, &aggregate(&sel.apply(&ds)));
        assert!(text.contains("No data matches the current filters."));
        assert!(text.contains("Operation Mode: (none)"));
        assert!(!text.contains("[WARNING]"));
    }
}
