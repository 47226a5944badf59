// Entry point and high-level CLI flow.
//
// - Option [1] (re)loads the export and prints what was found.
// - Option [2] prints summary cards and grouped tables for the current
//   selection and writes the exports.
// - Option [3] changes the region / city / manager selection.
// With `--once` the binary loads, reports and exits without a menu.
use anyhow::{bail, Result};
use clap::Parser;
use compliance_dashboard::filters::{get_cities, get_managers, FilterState, ALL};
use compliance_dashboard::regions::{RegionMap, DEFAULT_REGIONS};
use compliance_dashboard::segment::DEFAULT_HEADER_MARKER;
use compliance_dashboard::types::Dataset;
use compliance_dashboard::util::format_int;
use compliance_dashboard::{loader, output, reports};
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug, Clone)]
#[command(name = "compliance_dashboard", about = "Day-over-day compliance dashboard")]
struct Args {
    /// Multi-table CSV export to read.
    #[arg(long, default_value = "SW Report for AI.csv")]
    file: PathBuf,

    /// JSON region config: `[{"name": "...", "cities": ["..."]}]`.
    #[arg(long)]
    regions: Option<PathBuf>,

    #[arg(long, default_value = ALL)]
    region: String,

    #[arg(long, default_value = ALL)]
    city: String,

    #[arg(long, default_value = ALL)]
    manager: String,

    /// Substring that marks a table header row.
    #[arg(long, default_value = DEFAULT_HEADER_MARKER)]
    header_marker: String,

    /// Directory for JSON/CSV exports.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Load, report and exit without the interactive menu.
    #[arg(long)]
    once: bool,
}

// The latest dataset replaces the previous one wholesale on every load.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        data: None,
        filters: FilterState::default(),
    })
});

struct AppState {
    data: Option<Dataset>,
    filters: FilterState,
}

fn with_state<T>(f: impl FnOnce(&mut AppState) -> T) -> T {
    let mut guard = APP_STATE.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&mut guard)
}

fn prompt(label: &str) -> String {
    print!("{}", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask whether to go back to the menu after a report.
fn prompt_back_to_menu() -> bool {
    loop {
        match prompt("Back to Report Selection (Y/N): ").to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Pick one of `options` by number, or `all` with 0 / empty input.
fn pick(title: &str, options: &[String]) -> String {
    println!("{}:", title);
    println!("  [0] All");
    for (idx, opt) in options.iter().enumerate() {
        println!("  [{}] {}", idx + 1, opt);
    }
    let choice = prompt("Enter choice: ");
    match choice.parse::<usize>() {
        Ok(n) if n >= 1 && n <= options.len() => options[n - 1].clone(),
        _ => ALL.to_string(),
    }
}

fn handle_load(args: &Args) -> bool {
    match loader::load_dataset(&args.file, &args.header_marker) {
        Ok((data, report)) => {
            println!(
                "Loaded {} ({} header rows): {} previous-day, {} today, {} day-over-day rows ({:?})",
                args.file.display(),
                report.header_markers,
                format_int(report.previous_day_rows),
                format_int(report.today_rows),
                format_int(report.day_over_day_rows),
                report.delta_origin
            );
            if report.unmatched_today_rows > 0 {
                println!(
                    "Note: {} today rows had no previous-day match and have no DoD.",
                    format_int(report.unmatched_today_rows)
                );
            }
            println!();
            with_state(|s| s.data = Some(data));
            true
        }
        Err(e) => {
            error!("load failed: {}", e);
            eprintln!("Failed to load file: {}\n", e);
            false
        }
    }
}

fn handle_filters(regions: &RegionMap) {
    let Some(data) = with_state(|s| s.data.clone()) else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    };
    let mut filters = with_state(|s| s.filters.clone());

    let region_names: Vec<String> = regions.all_regions().iter().map(|r| r.to_string()).collect();
    filters.set_region(&pick("Region", &region_names));

    let in_region = FilterState {
        region: filters.region.clone(),
        ..FilterState::default()
    }
    .apply(&data.today, regions);
    filters.set_city(&pick("City", &get_cities(&in_region)));
    filters.set_manager(&pick("Manager", &get_managers(&in_region, filters.city_scope())));

    println!(
        "Selection: region={}, city={}, manager={}\n",
        filters.region, filters.city, filters.manager
    );
    with_state(|s| s.filters = filters);
}

fn handle_generate_reports(args: &Args, regions: &RegionMap) -> Result<()> {
    let (data, filters) = with_state(|s| (s.data.clone(), s.filters.clone()));
    let Some(data) = data else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return Ok(());
    };

    let previous = filters.apply(&data.previous_day, regions);
    let today = filters.apply(&data.today, regions);
    let dod = filters.apply(&data.day_over_day, regions);

    println!(
        "Compliance Dashboard (region={}, city={}, manager={})",
        filters.region, filters.city, filters.manager
    );
    println!("Last updated: {}\n", data.last_updated.to_rfc3339());

    println!("Summary\n");
    let cards = reports::build_category_cards(&previous, &today, &dod);
    output::preview_table_rows(&output::card_rows(&cards), usize::MAX);

    println!("Today by Region\n");
    let region_rows = reports::summarize_groups(&reports::group_by_region(&today, regions));
    output::preview_table_rows(&region_rows, usize::MAX);

    println!("Today by City\n");
    let city_rows = reports::summarize_groups(&reports::group_by_city(&today));
    output::preview_table_rows(&city_rows, usize::MAX);

    println!("Day over Day by City (mean change)\n");
    let dod_rows = reports::summarize_groups(&reports::group_by_city(&dod));
    output::preview_table_rows(&dod_rows, usize::MAX);

    println!("City Overview - Problem Analysis\n");
    let overview = reports::city_overview(&today);
    output::preview_table_rows(&reports::overview_rows(&overview), usize::MAX);

    std::fs::create_dir_all(&args.out_dir)?;
    output::write_json(&args.out_dir.join("dataset.json"), &data)?;
    output::write_csv(&args.out_dir.join("region_summary.csv"), &region_rows)?;
    output::write_csv(&args.out_dir.join("city_summary.csv"), &city_rows)?;
    output::write_csv(
        &args.out_dir.join("city_overview.csv"),
        &reports::overview_rows(&overview),
    )?;
    println!("(Exports written to {})\n", args.out_dir.display());
    Ok(())
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = Args::parse();
    let regions = match &args.regions {
        Some(path) => RegionMap::from_json_file(path)?,
        None => DEFAULT_REGIONS.clone(),
    };
    info!("regions: {}", regions.all_regions().join(", "));

    with_state(|s| {
        s.filters.set_region(&args.region);
        s.filters.set_city(&args.city);
        s.filters.set_manager(&args.manager);
    });

    if args.once {
        if !handle_load(&args) {
            bail!("could not load {}", args.file.display());
        }
        return handle_generate_reports(&args, &regions);
    }

    loop {
        println!("Compliance Dashboard:");
        println!("[1] Load the file");
        println!("[2] Generate Reports");
        println!("[3] Change Filters\n");
        match prompt("Enter choice: ").as_str() {
            "1" => {
                handle_load(&args);
            }
            "2" => {
                println!();
                if let Err(e) = handle_generate_reports(&args, &regions) {
                    eprintln!("Report error: {}\n", e);
                }
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "3" => handle_filters(&regions),
            _ => println!("Invalid choice. Please enter 1, 2 or 3.\n"),
        }
    }
    Ok(())
}
