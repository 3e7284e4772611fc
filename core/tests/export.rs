//! Export tests: CSV shape, idempotence, and isolated report failures.

use portfolio_core::analytics::AnalyticsBundle;
use portfolio_core::generator::{ClaimRecord, PolicyRecord};
use portfolio_core::report;
use portfolio_core::store::PortfolioStore;
use std::fs;
use std::path::PathBuf;

const CSV_FILES: [&str; 6] = [
    "loss_by_car_type.csv",
    "age_group_stats.csv",
    "top_policies.csv",
    "portfolio_mix.csv",
    "per_policy.csv",
    "portfolio_summary_metrics.csv",
];

const SVG_FILES: [&str; 6] = [
    "loss_ratio_by_car_type.svg",
    "claims_by_age_group.svg",
    "top_policies.svg",
    "portfolio_mix.svg",
    "claims_distribution.svg",
    "premium_vs_claims.svg",
];

fn policy(id: &str, car: &str, age_group: &str, premium: f64) -> PolicyRecord {
    PolicyRecord {
        policy_id: id.into(),
        car_type: car.into(),
        age_group: age_group.into(),
        premium,
    }
}

fn claim(id: &str, policy_id: &str, amount: f64) -> ClaimRecord {
    ClaimRecord {
        claim_id: id.into(),
        policy_id: policy_id.into(),
        claim_amount: amount,
    }
}

fn reference_bundle() -> AnalyticsBundle {
    let mut store = PortfolioStore::in_memory().unwrap();
    store.migrate().unwrap();
    store
        .load(
            &[
                policy("P1", "Sedan", "30-39", 1000.0),
                policy("P2", "Sedan", "30-39", 500.0),
                policy("P3", "SUV", "40-49", 2000.0),
            ],
            &[
                claim("C1", "P1", 200.0),
                claim("C2", "P1", 300.0),
                claim("C3", "P3", 2500.0),
            ],
        )
        .unwrap();
    let bands = vec!["30-39".to_string(), "40-49".to_string()];
    AnalyticsBundle::collect(&store, &bands, 10).unwrap()
}

fn fresh_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("portfolio-export-{name}"));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn all_reports_are_written_for_the_reference_portfolio() {
    let bundle = reference_bundle();
    let dir = fresh_dir("all");

    let outcome = report::write_reports(&bundle, &dir).unwrap();
    assert!(
        outcome.failed.is_empty(),
        "no report should fail: {:?}",
        outcome.failed
    );

    for name in CSV_FILES.iter().chain(SVG_FILES.iter()) {
        let path = dir.join(name);
        let metadata = fs::metadata(&path)
            .unwrap_or_else(|_| panic!("missing output file {}", path.display()));
        assert!(metadata.len() > 0, "{name} is empty");
    }
}

#[test]
fn export_is_idempotent() {
    let bundle = reference_bundle();
    let dir_a = fresh_dir("idempotent-a");
    let dir_b = fresh_dir("idempotent-b");

    report::write_reports(&bundle, &dir_a).unwrap();
    report::write_reports(&bundle, &dir_b).unwrap();

    for name in &CSV_FILES {
        let a = fs::read(dir_a.join(name)).unwrap();
        let b = fs::read(dir_b.join(name)).unwrap();
        assert_eq!(a, b, "{name} differs between identical exports");
    }
}

#[test]
fn csv_headers_name_the_columns() {
    let bundle = reference_bundle();
    let dir = fresh_dir("headers");
    report::write_reports(&bundle, &dir).unwrap();

    let loss = fs::read_to_string(dir.join("loss_by_car_type.csv")).unwrap();
    assert_eq!(
        loss.lines().next().unwrap(),
        "car_type,num_policies,claims_count,total_claims,total_premium,loss_ratio"
    );
    // One row per car type plus the header.
    assert_eq!(loss.lines().count(), 3);

    let mix = fs::read_to_string(dir.join("portfolio_mix.csv")).unwrap();
    assert_eq!(
        mix.lines().next().unwrap(),
        "car_type,num_policies,count_share,total_premium,premium_share"
    );
}

#[test]
fn undefined_loss_ratio_exports_an_empty_cell() {
    let mut store = PortfolioStore::in_memory().unwrap();
    store.migrate().unwrap();
    store
        .load(
            &[policy("P1", "Vintage", "70+", 0.0)],
            &[claim("C1", "P1", 100.0)],
        )
        .unwrap();
    let bundle = AnalyticsBundle::collect(&store, &["70+".to_string()], 10).unwrap();

    let dir = fresh_dir("sentinel");
    report::write_reports(&bundle, &dir).unwrap();

    let loss = fs::read_to_string(dir.join("loss_by_car_type.csv")).unwrap();
    let row = loss.lines().nth(1).unwrap();
    assert!(
        row.ends_with(','),
        "undefined ratio should serialize as an empty trailing cell: {row}"
    );
}

#[test]
fn one_failed_report_does_not_abort_the_others() {
    let bundle = reference_bundle();
    let dir = fresh_dir("isolated");

    // Occupy one chart path with a directory so that render fails.
    fs::create_dir_all(dir.join("loss_ratio_by_car_type.svg")).unwrap();

    let outcome = report::write_reports(&bundle, &dir).unwrap();
    assert_eq!(outcome.failed, vec!["loss_by_car_type"]);
    assert_eq!(outcome.written.len(), 6, "remaining reports must still run");

    for name in &["claims_by_age_group.svg", "portfolio_mix.svg", "top_policies.svg"] {
        assert!(
            dir.join(name).exists(),
            "{name} should be written despite the earlier failure"
        );
    }
}
