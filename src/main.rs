// Entry point and high-level CLI flow.
//
// The interactive session mirrors the dashboard workflow:
// - [1] loads a CSV dataset and resets the filters to everything observed,
// - [2] narrows the efficiency / month / operation mode selection,
// - [3] resets the selection,
// - [4] renders preview, statistics, KPIs, charts and advisories,
// - [5] exports the PDF report.
// Every render or export re-runs the aggregation from the current selection.
// `--batch` does load, render and export once without prompting.
mod aggregate;
mod chart;
mod dashboard;
mod error;
mod filter;
mod loader;
mod output;
mod report;
mod summary;
mod types;
mod util;

use anyhow::{bail, Context};
use clap::{ArgAction, Parser};
use filter::{Dimension, FilterSelection};
use log::{error, warn, LevelFilter};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use types::Dataset;

#[derive(Parser, Debug)]
#[command(
    name = "mfg-dashboard",
    version,
    about = "Intelligent Manufacturing Dataset analysis dashboard and PDF report"
)]
struct Cli {
    /// CSV dataset to load at startup.
    #[arg(long, short = 'd', env = "MFG_DATASET")]
    dataset: Option<PathBuf>,

    /// Where the PDF report is written.
    #[arg(long, short = 'o', env = "MFG_REPORT_PATH", default_value = report::REPORT_FILE_NAME)]
    output: PathBuf,

    /// Initial efficiency status selection (comma separated).
    #[arg(long, value_delimiter = ',')]
    efficiency: Vec<String>,

    /// Initial month selection; `missing` selects rows without a month label.
    #[arg(long, value_delimiter = ',')]
    month: Vec<String>,

    /// Initial operation mode selection (comma separated).
    #[arg(long, value_delimiter = ',')]
    mode: Vec<String>,

    /// Load, render and export once, then exit.
    #[arg(long, requires = "dataset")]
    batch: bool,

    /// Also write the chart tables (CSV) and KPIs (JSON) into this directory.
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Rows shown in the data preview.
    #[arg(long, default_value_t = 10)]
    preview_rows: usize,

    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// What one terminal session has loaded and selected so far.
struct Session {
    dataset: Option<Dataset>,
    selection: FilterSelection,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Print `prompt` and read one trimmed line; `None` on end of input.
fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn read_choice() -> Option<String> {
    read_line("Enter choice: ")
}

/// Default selection narrowed by whichever filter flags were given.
fn initial_selection(cli: &Cli, dataset: &Dataset) -> FilterSelection {
    let mut sel = FilterSelection::all_observed(dataset);
    for (dim, values) in [
        (Dimension::Efficiency, &cli.efficiency),
        (Dimension::Month, &cli.month),
        (Dimension::Mode, &cli.mode),
    ] {
        if !values.is_empty() {
            sel = sel.with(dim, filter::from_cli_values(values));
        }
    }
    sel
}

fn load(path: &Path) -> anyhow::Result<Dataset> {
    let (dataset, report) = loader::load_from_path(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    println!(
        "Processing dataset... ({} rows loaded)",
        util::format_int(report.total_rows as u64)
    );
    if let (Some(first), Some(last)) = (report.first_timestamp, report.last_timestamp) {
        println!("Readings from {} to {}", first, last);
    }
    let unlabelled = dataset.records.iter().filter(|r| r.month.is_none()).count();
    if unlabelled > 0 {
        warn!(
            "{} rows fall outside Jan-Mar and have no month label",
            unlabelled
        );
    }
    println!();
    Ok(dataset)
}

fn handle_load(cli: &Cli, session: &mut Session) {
    let default = cli
        .dataset
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let Some(answer) = read_line(&format!("Dataset path [{}]: ", default)) else {
        return;
    };
    let path = if answer.is_empty() { default } else { answer };
    if path.is_empty() {
        println!("Error: no dataset path given.\n");
        return;
    }
    match load(Path::new(&path)) {
        Ok(dataset) => {
            session.selection = initial_selection(cli, &dataset);
            session.dataset = Some(dataset);
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Failed to load file: {:#}\n", e);
        }
    }
}

fn handle_filters(session: &mut Session) {
    let Some(dataset) = session.dataset.as_ref() else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    };
    let mut next = session.selection.clone();
    for dim in Dimension::ALL {
        let options = filter::observed_values(dataset, dim);
        println!("Select {} (comma separated numbers, Enter for all):", dim);
        for (i, opt) in options.iter().enumerate() {
            let mark = if next.selected(dim).contains(opt) { "x" } else { " " };
            println!("  [{}] {}. {}", mark, i + 1, filter::display_value(opt));
        }
        loop {
            let Some(answer) = read_choice() else {
                return;
            };
            match filter::parse_choice(&answer, &options) {
                Ok(values) => {
                    next = next.with(dim, values);
                    break;
                }
                Err(msg) => println!("Invalid choice: {}.", msg),
            }
        }
    }
    session.selection = next;
    println!("\n{}\n", dashboard::render_filters(&session.selection));
}

fn handle_reset(session: &mut Session) {
    if let Some(dataset) = session.dataset.as_ref() {
        session.selection = FilterSelection::all_observed(dataset);
        println!("Filters reset to all observed values.\n");
    } else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
    }
}

fn show(dataset: &Dataset, selection: &FilterSelection, preview_rows: usize) {
    println!("Data Preview\n");
    println!("{}\n", dashboard::render_preview(dataset, preview_rows));
    println!("Data Summary\n");
    println!("{}\n", dashboard::render_summary(&summary::describe(&dataset.raw)));
    let dash = aggregate::aggregate(&selection.apply(dataset));
    println!("{}", dashboard::render_dashboard(selection, &dash));
}

fn export(
    dataset: &Dataset,
    selection: &FilterSelection,
    output: &Path,
    export_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let dash = aggregate::aggregate(&selection.apply(dataset));
    let bytes = report::export_pdf(&dash, output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "Report saved to {} ({} bytes, {})",
        output.display(),
        util::format_int(bytes as u64),
        report::REPORT_MIME
    );
    if let Some(dir) = export_dir {
        let files = output::export_tables(dir, &dash)
            .with_context(|| format!("failed to export tables to {}", dir.display()))?;
        println!("Chart tables exported to {} ({} files)", dir.display(), files.len());
    }
    Ok(())
}

fn run_batch(cli: &Cli) -> anyhow::Result<()> {
    let Some(path) = cli.dataset.as_ref() else {
        bail!("--batch needs --dataset");
    };
    let dataset = load(path)?;
    let selection = initial_selection(cli, &dataset);
    show(&dataset, &selection, cli.preview_rows);
    export(&dataset, &selection, &cli.output, cli.export_dir.as_deref())
}

fn run_interactive(cli: &Cli) {
    let mut session = Session {
        dataset: None,
        selection: FilterSelection::default(),
    };
    if let Some(path) = cli.dataset.as_ref() {
        match load(path) {
            Ok(dataset) => {
                session.selection = initial_selection(cli, &dataset);
                session.dataset = Some(dataset);
            }
            Err(e) => eprintln!("Failed to load file: {:#}\n", e),
        }
    }

    loop {
        println!("Intelligent Manufacturing Dataset Analysis");
        println!("[1] Load dataset");
        println!("[2] Set filters");
        println!("[3] Reset filters");
        println!("[4] Show dashboard");
        println!("[5] Export PDF report");
        println!("[0] Exit\n");
        let Some(choice) = read_choice() else {
            break;
        };
        match choice.as_str() {
            "1" => handle_load(cli, &mut session),
            "2" => handle_filters(&mut session),
            "3" => handle_reset(&mut session),
            "4" | "5" => {
                let Some(dataset) = session.dataset.as_ref() else {
                    println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
                    continue;
                };
                if choice == "4" {
                    show(dataset, &session.selection, cli.preview_rows);
                } else if let Err(e) = export(
                    dataset,
                    &session.selection,
                    &cli.output,
                    cli.export_dir.as_deref(),
                ) {
                    error!("{:#}", e);
                    eprintln!("Export failed: {:#}\n", e);
                }
            }
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter a number from 0 to 5.\n"),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if cli.batch {
        run_batch(&cli)
    } else {
        run_interactive(&cli);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_from_reader;
    use crate::loader::tests::fixture;

    #[test]
    fn cli_flags_narrow_the_initial_selection() {
        let cli = Cli::parse_from([
            "mfg-dashboard",
            "--efficiency",
            "High,Low",
            "--month",
            "missing",
        ]);
        assert_eq!(cli.output, PathBuf::from(report::REPORT_FILE_NAME));
        let csv = fixture(&[
            ("1", "2025-01-01 08:00:00", "Active", "High", 1.0),
            ("2", "2025-06-01 08:00:00", "Active", "High", 2.0),
            ("3", "2025-06-01 08:00:00", "Idle", "Medium", 3.0),
        ]);
        let ds = load_from_reader(csv.as_bytes()).unwrap().0;
        let sel = initial_selection(&cli, &ds);
        let rows = sel.apply(&ds);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].machine_id.as_deref(), Some("2"));
        assert_eq!(sel.selected(Dimension::Mode).len(), 2);
    }

    #[test]
    fn batch_requires_a_dataset() {
        assert!(Cli::try_parse_from(["mfg-dashboard", "--batch"]).is_err());
    }
}
