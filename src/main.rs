// Entry point and high-level flow.
//
// The binary loads the transaction file once, runs a single render pass
// over it and writes:
// - CSV exports of the product, region and pivot tables,
// - a JSON summary of the headline totals,
// - the full chart description and, unless disabled, an HTML page.
//
// Load failures abort before anything is written.
mod aggregate;
mod charts;
mod cli;
mod config;
mod error;
mod loader;
mod output;
mod reports;
mod types;
mod util;

use anyhow::{Context, Result};
use cli::Args;
use config::Config;
use reports::Dashboard;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() {
    let args = Args::parse_args();

    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    init_logging(&args);
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(&args) {
        error!("Dashboard failed: {:#}", e);
        eprintln!("\nError: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(args: &Args) {
    // RUST_LOG, when set, takes precedence over -v/-q.
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(args.log_level()).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: a tracing subscriber was already installed");
    }
}

/// Write a default dashboard.toml, refusing to clobber an existing one.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::DEFAULT_CONFIG_FILE);
    if path.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first or edit it manually.",
            path.display()
        );
    }
    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Created {} with default settings.", path.display());
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let mut config = Config::load(args.config.as_deref())?;
    config.merge_with_args(args);
    info!("Retail dashboard v{}", env!("CARGO_PKG_VERSION"));

    let dataset = loader::load(&config.data.path, &config.data.encoding)
        .context("Cannot start without a valid dataset")?;
    if dataset.is_empty() {
        warn!(
            "{} has no transactions; totals and charts will be empty",
            dataset.source().display()
        );
    }
    println!(
        "Processing dataset... ({} transactions loaded from {})\n",
        util::format_int(dataset.len()),
        dataset.source().display()
    );

    let dashboard = Dashboard::new(&dataset, config.report.top_n);
    let view = dashboard.render(&config.report.title)?;
    info!(
        "Rendered {} KPIs and {} chart panels",
        view.kpis.len(),
        view.panel_count()
    );

    let out_dir = &config.report.output_dir;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    println!("{}\n", view.title);
    println!("{}", view.kpi_header);
    for kpi in &view.kpis {
        println!("  {:<14} {}", kpi.label, kpi.value);
    }
    println!();

    let preview = config.report.preview_rows;

    let products_file = out_dir.join("product_performance.csv");
    output::write_csv(&products_file, &dashboard.product_rows())?;
    println!("Product Performance");
    println!("(Top {} by Sales)\n", config.report.top_n);
    output::preview_table_rows(&dashboard.top_sales_rows()?, preview);
    println!("(Full table exported to {})\n", products_file.display());

    let regions_file = out_dir.join("region_performance.csv");
    output::write_csv(&regions_file, &dashboard.region_rows())?;
    println!("Regional Performance\n");
    output::preview_table_rows(&dashboard.region_rows(), preview);
    println!("(Full table exported to {})\n", regions_file.display());

    let monthly_file = out_dir.join("monthly_region_sales.csv");
    output::write_pivot_csv(&monthly_file, "Month", dashboard.monthly_region_sales())?;
    let category_file = out_dir.join("category_sales.csv");
    output::write_pivot_csv(&category_file, "Category", dashboard.category_sales())?;
    println!(
        "Pivot tables exported to {} and {}\n",
        monthly_file.display(),
        category_file.display()
    );

    output::write_json(&out_dir.join("summary.json"), &dashboard.summary())?;
    let json_file = out_dir.join("dashboard.json");
    output::write_json(&json_file, &view)?;
    println!("Chart descriptions saved to {}", json_file.display());

    if config.report.html {
        let html_file = out_dir.join("dashboard.html");
        output::write_html(&html_file, &view)?;
        println!("Dashboard page saved to {}", html_file.display());
    }

    info!("Outputs written to {}", out_dir.display());
    Ok(())
}
