use crate::types::RawTable;
use crate::util::{is_missing, mean, parse_f64_safe, quantile_sorted, std_dev};

/// Descriptive statistics for one numeric column of the unfiltered load.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

fn numeric_column(raw: &RawTable, idx: usize) -> Option<Vec<f64>> {
    let mut vals = Vec::new();
    for row in &raw.rows {
        let cell = row.get(idx).map(String::as_str).unwrap_or("");
        if is_missing(cell) {
            continue;
        }
        vals.push(parse_f64_safe(Some(cell))?);
    }
    Some(vals)
}

/// Summarize every column whose present cells are all numbers. Text and
/// timestamp columns are left out, as are columns with no values at all.
pub fn describe(raw: &RawTable) -> Vec<ColumnSummary> {
    let mut out = Vec::new();
    for (idx, name) in raw.headers.iter().enumerate() {
        let Some(mut vals) = numeric_column(raw, idx) else {
            continue;
        };
        if vals.is_empty() {
            continue;
        }
        vals.sort_by(|a, b| a.total_cmp(b));
        out.push(ColumnSummary {
            column: name.clone(),
            count: vals.len(),
            mean: mean(&vals),
            std: std_dev(&vals),
            min: vals.first().copied(),
            q25: quantile_sorted(&vals, 0.25),
            median: quantile_sorted(&vals, 0.5),
            q75: quantile_sorted(&vals, 0.75),
            max: vals.last().copied(),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RawTable {
        RawTable {
            headers: vec!["Machine".into(), "Temp".into(), "Mode".into()],
            rows: vec![
                vec!["1".into(), "10".into(), "Active".into()],
                vec!["2".into(), "".into(), "Idle".into()],
                vec!["3".into(), "30".into(), "Active".into()],
                vec!["4".into(), "20".into(), "Idle".into()],
                vec!["5".into(), "40".into(), "Idle".into()],
            ],
        }
    }

    #[test]
    fn describes_only_numeric_columns() {
        let stats = describe(&table());
        let names: Vec<&str> = stats.iter().map(|s| s.column.as_str()).collect();
        assert_eq!(names, vec!["Machine", "Temp"]);

        let temp = &stats[1];
        assert_eq!(temp.count, 4);
        assert_eq!(temp.mean, Some(25.0));
        assert_eq!(temp.min, Some(10.0));
        assert_eq!(temp.q25, Some(17.5));
        assert_eq!(temp.median, Some(25.0));
        assert_eq!(temp.q75, Some(32.5));
        assert_eq!(temp.max, Some(40.0));
        assert!((temp.std.unwrap() - 12.909944).abs() < 1e-5);
    }

    #[test]
    fn empty_table_has_no_summary() {
        let raw = RawTable {
            headers: vec!["Temp".into()],
            rows: vec![],
        };
        assert!(describe(&raw).is_empty());
    }
}
