//! report-runner: batch pipeline for the synthetic insurance
//! portfolio dashboard.
//!
//! Usage:
//!   report-runner --seed 42 --policies 1000 --db data/insurance_portfolio.db --out data
//!   report-runner --config portfolio.json --top 10

use anyhow::Result;
use portfolio_core::{
    analytics::AnalyticsBundle, config::GeneratorConfig, generator, report,
    report::ReportOutcome, store::PortfolioStore,
};
use std::env;
use std::path::Path;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut config = match str_arg(&args, "--config") {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };
    if let Some(seed) = parse_arg(&args, "--seed") {
        config.seed = seed;
    }
    if let Some(n) = parse_arg(&args, "--policies") {
        config.population_size = n;
    }
    let top_n: usize = parse_arg(&args, "--top").unwrap_or(10);
    let db = str_arg(&args, "--db").unwrap_or("data/insurance_portfolio.db");
    let out_dir = str_arg(&args, "--out").unwrap_or("data");

    // CLI overrides can invalidate a previously valid config.
    config.validate()?;

    println!("insurance portfolio — report-runner");
    println!("  started:  {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("  seed:     {}", config.seed);
    println!("  policies: {}", config.population_size);
    println!("  db:       {db}");
    println!("  out dir:  {out_dir}");
    println!();

    // Regenerate from scratch; a stale database would mix datasets.
    if Path::new(db).exists() {
        std::fs::remove_file(db)?;
        log::info!("removed existing database at {db}");
    }
    if let Some(parent) = Path::new(db).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let portfolio = generator::generate(&config)?;

    let mut store = PortfolioStore::open(db)?;
    store.migrate()?;
    store.load(&portfolio.policies, &portfolio.claims)?;

    let bundle = AnalyticsBundle::collect(&store, &config.band_labels(), top_n)?;
    let outcome = report::write_reports(&bundle, Path::new(out_dir))?;

    print_summary(&bundle, &outcome, out_dir);
    Ok(())
}

fn print_summary(bundle: &AnalyticsBundle, outcome: &ReportOutcome, out_dir: &str) {
    let s = &bundle.summary;
    println!("=== RUN SUMMARY ===");
    println!("  policies:           {}", s.total_policies);
    println!("  claim records:      {}", s.total_claim_records);
    println!("  total claims:       ${:.2}", s.total_claim_amount);
    println!("  total premiums:     ${:.2}", s.total_premium);
    match s.overall_loss_ratio {
        Some(ratio) => println!("  overall loss ratio: {ratio:.4}"),
        None => println!("  overall loss ratio: n/a (zero premium)"),
    }
    println!();
    println!("=== REPORTS ({out_dir}) ===");
    for name in &outcome.written {
        println!("  ok     {name}");
    }
    for name in &outcome.failed {
        println!("  FAILED {name}");
    }
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
