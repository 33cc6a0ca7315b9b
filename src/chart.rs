// Chart descriptions shared by the terminal view and the PDF, and the
// plotters rasterizer that turns one of them into an RGB bitmap.
use crate::error::{DashboardError, Result};
use crate::types::{CategoryCountRow, ChartTables, StatusMachineRow};
use plotters::prelude::*;

const BAR_COLOR: RGBColor = RGBColor(31, 119, 180);
const GRID_COLOR: RGBColor = RGBColor(220, 220, 220);
const GRID_LINES: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    /// Section heading on screen.
    pub heading: &'static str,
    /// Caption above the image in the report.
    pub title: &'static str,
    pub y_label: &'static str,
    pub bars: Vec<Bar>,
}

impl ChartSpec {
    pub fn max_value(&self) -> Option<f64> {
        self.bars
            .iter()
            .filter_map(|b| b.value)
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
    }

    pub fn min_value(&self) -> Option<f64> {
        self.bars
            .iter()
            .filter_map(|b| b.value)
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.min(v))))
    }
}

fn status_bars(rows: &[StatusMachineRow]) -> Vec<Bar> {
    rows.iter()
        .map(|r| Bar {
            label: format!("{} ({})", r.machine_id, r.efficiency_status),
            value: r.mean,
        })
        .collect()
}

fn count_bars(rows: &[CategoryCountRow]) -> Vec<Bar> {
    rows.iter()
        .map(|r| Bar {
            label: r.category.clone(),
            value: Some(r.machines as f64),
        })
        .collect()
}

/// The six charts, always in this order.
pub fn chart_specs(charts: &ChartTables) -> Vec<ChartSpec> {
    vec![
        ChartSpec {
            heading: "DAYWISE AVG. PRODUCTION SPEED PER HOUR",
            title: "Daywise Avg Production Speed",
            y_label: "Units / Hour",
            bars: charts
                .production_by_day
                .iter()
                .map(|r| Bar {
                    label: r.day.to_string(),
                    value: r.production_speed,
                })
                .collect(),
        },
        ChartSpec {
            heading: "AVG. VIBRATION (Hz) BY MACHINE ID",
            title: "Top 10 Machines by Avg Vibration",
            y_label: "Vibration (Hz)",
            bars: charts
                .top_vibration
                .iter()
                .map(|r| Bar {
                    label: r.machine_id.clone(),
                    value: r.vibration,
                })
                .collect(),
        },
        ChartSpec {
            heading: "AVG. ERROR (%) BY EFFICIENCY STATUS AND MACHINE ID",
            title: "Top 10 Machines by Error Rate",
            y_label: "Error Rate (%)",
            bars: status_bars(&charts.top_error_rate),
        },
        ChartSpec {
            heading: "TOTAL MACHINES BY EFFICIENCY STATUS",
            title: "Total Machines by Efficiency Status",
            y_label: "Machine Count",
            bars: count_bars(&charts.machines_by_efficiency),
        },
        ChartSpec {
            heading: "TOTAL MACHINES BY OPERATION MODE",
            title: "Total Machines by Operation Mode",
            y_label: "Machine Count",
            bars: count_bars(&charts.machines_by_mode),
        },
        ChartSpec {
            heading: "AVG. TEMP. (°C) BY EFFICIENCY STATUS AND MACHINE ID",
            title: "Top 10 Machines by Temperature",
            y_label: "Temperature (C)",
            bars: status_bars(&charts.top_temperature),
        },
    ]
}

/// Packed 8-bit RGB pixels, row major.
#[derive(Debug, Clone)]
pub struct RgbImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

fn chart_err<E: std::fmt::Display>(e: E) -> DashboardError {
    DashboardError::Chart(e.to_string())
}

/// Draw `spec` as a bar chart with a zero baseline and light grid lines.
///
/// Only shapes are drawn; titles and category labels are set as text by the
/// caller, so the bitmap needs no font support.
pub fn rasterize(spec: &ChartSpec, width: u32, height: u32) -> Result<RgbImage> {
    let mut pixels = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let n = spec.bars.len().max(1);
        let lo = spec.min_value().unwrap_or(0.0).min(0.0);
        let hi = spec.max_value().unwrap_or(0.0).max(0.0);
        let hi = if hi - lo > 0.0 { hi + (hi - lo) * 0.1 } else { 1.0 };

        let mut chart = ChartBuilder::on(&root)
            .margin(16)
            .build_cartesian_2d((0..n).into_segmented(), lo..hi)
            .map_err(chart_err)?;

        let step = (hi - lo) / GRID_LINES as f64;
        chart
            .draw_series((1..=GRID_LINES).map(|k| {
                let y = lo + step * k as f64;
                PathElement::new(
                    vec![(SegmentValue::Exact(0), y), (SegmentValue::Exact(n), y)],
                    GRID_COLOR,
                )
            }))
            .map_err(chart_err)?;

        chart
            .draw_series(spec.bars.iter().enumerate().filter_map(|(i, b)| {
                let v = b.value?;
                let mut bar = Rectangle::new(
                    [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), v)],
                    BAR_COLOR.filled(),
                );
                bar.set_margin(0, 0, 6, 6);
                Some(bar)
            }))
            .map_err(chart_err)?;

        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(SegmentValue::Exact(0), 0.0), (SegmentValue::Exact(n), 0.0)],
                BLACK,
            )))
            .map_err(chart_err)?;

        root.present().map_err(chart_err)?;
    }
    Ok(RgbImage {
        width,
        height,
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DayProductionRow, MachineVibrationRow};

    fn tables() -> ChartTables {
        ChartTables {
            production_by_day: vec![
                DayProductionRow { day: 1, production_speed: Some(120.5) },
                DayProductionRow { day: 2, production_speed: None },
            ],
            top_vibration: vec![MachineVibrationRow {
                machine_id: "M1".into(),
                vibration: Some(3.5),
            }],
            machines_by_mode: vec![CategoryCountRow {
                category: "Active".into(),
                machines: 4,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn specs_keep_fixed_order_and_values() {
        let specs = chart_specs(&tables());
        assert_eq!(specs.len(), 6);
        assert_eq!(specs[0].title, "Daywise Avg Production Speed");
        assert_eq!(specs[0].bars[1].value, None);
        assert_eq!(specs[0].max_value(), Some(120.5));
        assert_eq!(specs[1].bars[0].label, "M1");
        assert!(specs[2].bars.is_empty());
        assert_eq!(specs[4].bars[0].value, Some(4.0));
        assert_eq!(specs[5].title, "Top 10 Machines by Temperature");
    }

    #[test]
    fn rasterizes_bars_into_the_buffer() {
        let specs = chart_specs(&tables());
        let img = rasterize(&specs[1], 320, 200).unwrap();
        assert_eq!(img.pixels.len(), 320 * 200 * 3);
        let bar_pixels = img
            .pixels
            .chunks(3)
            .filter(|p| *p == [31u8, 119, 180])
            .count();
        assert!(bar_pixels > 0);
    }

    #[test]
    fn empty_chart_still_renders() {
        let specs = chart_specs(&ChartTables::default());
        let img = rasterize(&specs[2], 200, 120).unwrap();
        assert!(img.pixels.chunks(3).all(|p| p != [31, 119, 180]));
    }
}
