use crate::error::Result;
use crate::types::Dashboard;
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Write the six chart tables as CSV and the KPI set as JSON into `dir`.
/// Returns the files written, in chart order with the JSON last.
pub fn export_tables(dir: &Path, dash: &Dashboard) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let c = &dash.charts;
    let files = [
        "chart1_production_by_day.csv",
        "chart2_top_vibration.csv",
        "chart3_top_error_rate.csv",
        "chart4_machines_by_efficiency.csv",
        "chart5_machines_by_mode.csv",
        "chart6_top_temperature.csv",
        "kpis.json",
    ];
    let paths: Vec<PathBuf> = files.iter().map(|f| dir.join(f)).collect();
    write_csv(&paths[0], &c.production_by_day)?;
    write_csv(&paths[1], &c.top_vibration)?;
    write_csv(&paths[2], &c.top_error_rate)?;
    write_csv(&paths[3], &c.machines_by_efficiency)?;
    write_csv(&paths[4], &c.machines_by_mode)?;
    write_csv(&paths[5], &c.top_temperature)?;
    write_json(&paths[6], &dash.kpis)?;
    info!("exported chart tables to {}", dir.display());
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CategoryCountRow, Kpis};

    #[test]
    fn exports_tables_and_kpis() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("tables");
        let mut dash = Dashboard {
            kpis: Kpis {
                total_machines: 2,
                efficiency: Some(0.5),
                ..Default::default()
            },
            ..Default::default()
        };
        dash.charts.machines_by_mode = vec![
            CategoryCountRow { category: "Active".into(), machines: 1 },
            CategoryCountRow { category: "Idle".into(), machines: 1 },
        ];
        let paths = export_tables(&dir, &dash).unwrap();
        assert_eq!(paths.len(), 7);

        let modes = std::fs::read_to_string(&paths[4]).unwrap();
        assert_eq!(modes, "Category,Machines\nActive,1\nIdle,1\n");
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&paths[6]).unwrap()).unwrap();
        assert_eq!(json["total_machines"], 2);
        assert_eq!(json["efficiency"], 0.5);
        assert!(json["avg_temp"].is_null());
    }
}
