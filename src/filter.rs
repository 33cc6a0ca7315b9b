// Filter state: an immutable snapshot of the three category selections.
//
// Every change produces a new `FilterSelection`; the aggregation pass only
// ever reads one.
use crate::types::{Dataset, Record};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Efficiency,
    Month,
    Mode,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Efficiency, Dimension::Month, Dimension::Mode];

    /// Value of this dimension for one record; `None` when the cell is
    /// blank or the month has no label.
    pub fn value_of(self, r: &Record) -> Option<&str> {
        match self {
            Dimension::Efficiency => r.efficiency_status.as_deref(),
            Dimension::Month => r.month.as_deref(),
            Dimension::Mode => r.operation_mode.as_deref(),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Dimension::Efficiency => "Efficiency",
            Dimension::Month => "Month",
            Dimension::Mode => "Operation Mode",
        };
        f.write_str(s)
    }
}

/// Label shown for a missing value.
pub const MISSING_LABEL: &str = "(missing)";

pub fn display_value(v: &Option<String>) -> &str {
    v.as_deref().unwrap_or(MISSING_LABEL)
}

/// Distinct values of a dimension in first-seen order.
pub fn observed_values(dataset: &Dataset, dim: Dimension) -> Vec<Option<String>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for r in &dataset.records {
        let v = dim.value_of(r).map(str::to_string);
        if seen.insert(v.clone()) {
            out.push(v);
        }
    }
    out
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    efficiency: Vec<Option<String>>,
    month: Vec<Option<String>>,
    mode: Vec<Option<String>>,
}

impl FilterSelection {
    /// Default selection: everything observed in the full load.
    pub fn all_observed(dataset: &Dataset) -> Self {
        FilterSelection {
            efficiency: observed_values(dataset, Dimension::Efficiency),
            month: observed_values(dataset, Dimension::Month),
            mode: observed_values(dataset, Dimension::Mode),
        }
    }

    pub fn selected(&self, dim: Dimension) -> &[Option<String>] {
        match dim {
            Dimension::Efficiency => &self.efficiency,
            Dimension::Month => &self.month,
            Dimension::Mode => &self.mode,
        }
    }

    /// Copy of this selection with one dimension replaced.
    pub fn with(&self, dim: Dimension, values: Vec<Option<String>>) -> Self {
        let mut next = self.clone();
        match dim {
            Dimension::Efficiency => next.efficiency = values,
            Dimension::Month => next.month = values,
            Dimension::Mode => next.mode = values,
        }
        next
    }

    pub fn matches(&self, r: &Record) -> bool {
        Dimension::ALL.iter().all(|dim| {
            let v = dim.value_of(r);
            self.selected(*dim).iter().any(|s| s.as_deref() == v)
        })
    }

    /// The filtered table, in load order.
    pub fn apply<'a>(&self, dataset: &'a Dataset) -> Vec<&'a Record> {
        dataset.records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Parse a menu answer against the offered options: `all`, an empty line
/// (keep everything), or comma-separated 1-based option numbers.
pub fn parse_choice(input: &str, options: &[Option<String>]) -> Result<Vec<Option<String>>, String> {
    let input = input.trim();
    if input.is_empty() || input.eq_ignore_ascii_case("all") {
        return Ok(options.to_vec());
    }
    let mut picked = Vec::new();
    for part in input.split(',') {
        let part = part.trim();
        let n: usize = part
            .parse()
            .map_err(|_| format!("'{}' is not an option number", part))?;
        let opt = n
            .checked_sub(1)
            .and_then(|i| options.get(i))
            .ok_or_else(|| format!("option {} does not exist", n))?;
        if !picked.contains(opt) {
            picked.push(opt.clone());
        }
    }
    Ok(picked)
}

/// Turn command-line filter values into a selection list. The missing month
/// label is spelled `(missing)` or `missing`.
pub fn from_cli_values(values: &[String]) -> Vec<Option<String>> {
    values
        .iter()
        .map(|v| {
            let v = v.trim();
            if v == MISSING_LABEL || v.eq_ignore_ascii_case("missing") {
                None
            } else {
                Some(v.to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_from_reader;
    use crate::loader::tests::fixture;

    fn dataset() -> Dataset {
        let csv = fixture(&[
            ("1", "2025-01-03 10:00:00", "Active", "High", 1.0),
            ("2", "2025-02-03 10:00:00", "Idle", "Low", 2.0),
            ("3", "2025-07-03 10:00:00", "Active", "Medium", 3.0),
            ("4", "2025-01-09 10:00:00", "Maintenance", "High", 4.0),
        ]);
        load_from_reader(csv.as_bytes()).unwrap().0
    }

    #[test]
    fn default_selection_keeps_every_row() {
        let ds = dataset();
        let sel = FilterSelection::all_observed(&ds);
        assert_eq!(sel.apply(&ds).len(), ds.records.len());
        assert_eq!(
            sel.selected(Dimension::Month),
            &[Some("Jan".to_string()), Some("Feb".to_string()), None]
        );
    }

    #[test]
    fn filtered_rows_satisfy_all_predicates() {
        let ds = dataset();
        let sel = FilterSelection::all_observed(&ds)
            .with(Dimension::Efficiency, vec![Some("High".into())])
            .with(Dimension::Mode, vec![Some("Active".into()), Some("Idle".into())]);
        let rows = sel.apply(&ds);
        assert_eq!(rows.len(), 1);
        for r in &rows {
            assert_eq!(r.efficiency_status.as_deref(), Some("High"));
            assert!(matches!(r.operation_mode.as_deref(), Some("Active") | Some("Idle")));
            assert!(ds.records.iter().any(|x| std::ptr::eq(x, *r)));
        }
    }

    #[test]
    fn unlabelled_month_needs_the_missing_value() {
        let ds = dataset();
        let quarter = FilterSelection::all_observed(&ds).with(
            Dimension::Month,
            vec![Some("Jan".into()), Some("Feb".into()), Some("Mar".into())],
        );
        let rows = quarter.apply(&ds);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.machine_id.as_deref() != Some("3")));

        let with_missing = quarter.with(Dimension::Month, vec![None]);
        let rows = with_missing.apply(&ds);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].machine_id.as_deref(), Some("3"));
    }

    #[test]
    fn selection_snapshots_are_independent() {
        let ds = dataset();
        let base = FilterSelection::all_observed(&ds);
        let narrowed = base.with(Dimension::Mode, vec![]);
        assert!(narrowed.apply(&ds).is_empty());
        assert_eq!(base.apply(&ds).len(), 4);
    }

    #[test]
    fn parses_menu_choices() {
        let opts = vec![Some("High".to_string()), Some("Low".to_string()), None];
        assert_eq!(parse_choice("all", &opts).unwrap(), opts);
        assert_eq!(parse_choice("", &opts).unwrap(), opts);
        assert_eq!(
            parse_choice("3, 1,1", &opts).unwrap(),
            vec![None, Some("High".to_string())]
        );
        assert!(parse_choice("0", &opts).is_err());
        assert!(parse_choice("x", &opts).is_err());
        assert_eq!(
            from_cli_values(&["Jan".to_string(), "missing".to_string()]),
            vec![Some("Jan".to_string()), None]
        );
    }
}
