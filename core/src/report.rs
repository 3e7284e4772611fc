//! Report materialization: one CSV per query result plus one chart
//! per report.
//!
//! Reports are written independently — a failure in one (typically a
//! chart render) is logged and recorded, and the remaining reports are
//! still produced. CSV content is a pure function of the query
//! results, so re-exporting identical results yields identical bytes.

use crate::analytics::AnalyticsBundle;
use crate::chart;
use crate::error::PortfolioResult;
use std::fs;
use std::path::Path;

/// Which reports were written and which failed, in attempt order.
#[derive(Debug, Default)]
pub struct ReportOutcome {
    pub written: Vec<&'static str>,
    pub failed: Vec<&'static str>,
}

impl ReportOutcome {
    fn record(&mut self, name: &'static str, result: PortfolioResult<()>) {
        match result {
            Ok(()) => self.written.push(name),
            Err(e) => {
                log::error!("report '{name}' failed: {e}");
                self.failed.push(name);
            }
        }
    }
}

/// Write every report into `out_dir`. Only a missing/uncreatable
/// output directory is fatal; individual report failures are isolated.
pub fn write_reports(bundle: &AnalyticsBundle, out_dir: &Path) -> PortfolioResult<ReportOutcome> {
    fs::create_dir_all(out_dir)?;

    let mut outcome = ReportOutcome::default();
    outcome.record("loss_by_car_type", loss_by_car_type(bundle, out_dir));
    outcome.record("age_group_stats", age_group_stats(bundle, out_dir));
    outcome.record("top_policies", top_policies(bundle, out_dir));
    outcome.record("portfolio_mix", portfolio_mix(bundle, out_dir));
    outcome.record("per_policy", per_policy(bundle, out_dir));
    outcome.record("premium_vs_claims", premium_vs_claims(bundle, out_dir));
    outcome.record("summary_metrics", summary_metrics(bundle, out_dir));

    log::info!(
        "wrote {} report(s), {} failed",
        outcome.written.len(),
        outcome.failed.len()
    );
    Ok(outcome)
}

fn loss_by_car_type(bundle: &AnalyticsBundle, dir: &Path) -> PortfolioResult<()> {
    let mut wtr = csv::Writer::from_path(dir.join("loss_by_car_type.csv"))?;
    wtr.write_record([
        "car_type",
        "num_policies",
        "claims_count",
        "total_claims",
        "total_premium",
        "loss_ratio",
    ])?;
    for row in &bundle.loss_by_car_type {
        wtr.write_record(&[
            row.car_type.clone(),
            row.num_policies.to_string(),
            row.claims_count.to_string(),
            row.total_claims.to_string(),
            row.total_premium.to_string(),
            fmt_ratio(row.loss_ratio),
        ])?;
    }
    wtr.flush()?;

    chart::loss_ratio_bar(
        &bundle.loss_by_car_type,
        &dir.join("loss_ratio_by_car_type.svg"),
    )
}

fn age_group_stats(bundle: &AnalyticsBundle, dir: &Path) -> PortfolioResult<()> {
    let mut wtr = csv::Writer::from_path(dir.join("age_group_stats.csv"))?;
    wtr.write_record([
        "age_group",
        "num_policies",
        "claims_count",
        "avg_claims_per_policy",
        "total_claims",
        "total_premium",
        "loss_ratio",
    ])?;
    for row in &bundle.age_groups {
        wtr.write_record(&[
            row.age_group.clone(),
            row.num_policies.to_string(),
            row.claims_count.to_string(),
            row.avg_claims_per_policy.to_string(),
            row.total_claims.to_string(),
            row.total_premium.to_string(),
            fmt_ratio(row.loss_ratio),
        ])?;
    }
    wtr.flush()?;

    chart::age_frequency_line(&bundle.age_groups, &dir.join("claims_by_age_group.svg"))
}

fn top_policies(bundle: &AnalyticsBundle, dir: &Path) -> PortfolioResult<()> {
    write_policy_totals_csv(&bundle.top_policies, &dir.join("top_policies.csv"))?;
    chart::top_policies_bar(&bundle.top_policies, &dir.join("top_policies.svg"))
}

fn portfolio_mix(bundle: &AnalyticsBundle, dir: &Path) -> PortfolioResult<()> {
    let mut wtr = csv::Writer::from_path(dir.join("portfolio_mix.csv"))?;
    wtr.write_record([
        "car_type",
        "num_policies",
        "count_share",
        "total_premium",
        "premium_share",
    ])?;
    for row in &bundle.portfolio_mix {
        wtr.write_record(&[
            row.car_type.clone(),
            row.num_policies.to_string(),
            row.count_share.to_string(),
            row.total_premium.to_string(),
            row.premium_share.to_string(),
        ])?;
    }
    wtr.flush()?;

    chart::portfolio_mix_pie(&bundle.portfolio_mix, &dir.join("portfolio_mix.svg"))
}

fn per_policy(bundle: &AnalyticsBundle, dir: &Path) -> PortfolioResult<()> {
    write_policy_totals_csv(&bundle.per_policy, &dir.join("per_policy.csv"))?;
    chart::claims_histogram(&bundle.per_policy, &dir.join("claims_distribution.svg"))
}

// Chart-only report; the tabular side lives in per_policy.csv.
fn premium_vs_claims(bundle: &AnalyticsBundle, dir: &Path) -> PortfolioResult<()> {
    chart::premium_vs_claims_scatter(&bundle.per_policy, &dir.join("premium_vs_claims.svg"))
}

fn summary_metrics(bundle: &AnalyticsBundle, dir: &Path) -> PortfolioResult<()> {
    let mut wtr = csv::Writer::from_path(dir.join("portfolio_summary_metrics.csv"))?;
    wtr.write_record([
        "total_policies",
        "total_claim_records",
        "total_claim_amount",
        "total_premium",
        "overall_loss_ratio",
    ])?;
    let s = &bundle.summary;
    wtr.write_record(&[
        s.total_policies.to_string(),
        s.total_claim_records.to_string(),
        s.total_claim_amount.to_string(),
        s.total_premium.to_string(),
        fmt_ratio(s.overall_loss_ratio),
    ])?;
    wtr.flush()?;
    Ok(())
}

fn write_policy_totals_csv(
    rows: &[crate::analytics::PolicyTotalsRow],
    path: &Path,
) -> PortfolioResult<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record([
        "policy_id",
        "car_type",
        "age_group",
        "premium",
        "total_claims",
        "claims_count",
    ])?;
    for row in rows {
        wtr.write_record(&[
            row.policy_id.clone(),
            row.car_type.clone(),
            row.age_group.clone(),
            row.premium.to_string(),
            row.total_claims.to_string(),
            row.claims_count.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Undefined ratios serialize as an empty cell.
fn fmt_ratio(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
