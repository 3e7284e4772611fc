//! Chart rendering for the fixed reports.
//!
//! One SVG per report, drawn with plotters. The SVG backend keeps
//! output vector-based and byte-deterministic. Callers treat a render
//! failure as isolated to that report.

use crate::analytics::{AgeGroupRow, CarTypeLossRow, MixRow, PolicyTotalsRow};
use crate::error::{PortfolioError, PortfolioResult};
use plotters::coord::ranged1d::SegmentValue;
use plotters::element::Pie;
use plotters::prelude::*;
use std::path::Path;

const SIZE: (u32, u32) = (800, 600);
const BAR_FILL: RGBColor = RGBColor(70, 130, 180);
const PIE_PALETTE: [RGBColor; 6] = [
    RGBColor(70, 130, 180),
    RGBColor(205, 92, 92),
    RGBColor(60, 179, 113),
    RGBColor(218, 165, 32),
    RGBColor(147, 112, 219),
    RGBColor(100, 149, 237),
];

/// Loss ratio by car type, one bar per defined group. Groups with an
/// undefined ratio are skipped rather than plotted as zero.
pub fn loss_ratio_bar(rows: &[CarTypeLossRow], path: &Path) -> PortfolioResult<()> {
    let (labels, values): (Vec<String>, Vec<f64>) = rows
        .iter()
        .filter_map(|row| row.loss_ratio.map(|v| (row.car_type.clone(), v)))
        .unzip();
    bar_chart(
        path,
        "Loss Ratio by Car Type",
        "Car Type",
        "Loss Ratio (Claims / Premiums)",
        &labels,
        &values,
    )
}

/// Top policies ranked by claim total.
pub fn top_policies_bar(rows: &[PolicyTotalsRow], path: &Path) -> PortfolioResult<()> {
    let labels: Vec<String> = rows.iter().map(|row| row.policy_id.clone()).collect();
    let values: Vec<f64> = rows.iter().map(|row| row.total_claims).collect();
    bar_chart(
        path,
        "Top Policies by Total Claims",
        "Policy",
        "Total Claims Amount",
        &labels,
        &values,
    )
}

/// Claim frequency per age band, plotted in band order with markers.
pub fn age_frequency_line(rows: &[AgeGroupRow], path: &Path) -> PortfolioResult<()> {
    if rows.is_empty() {
        return Err(empty("age group line"));
    }
    let labels: Vec<String> = rows.iter().map(|row| row.age_group.clone()).collect();
    let values: Vec<f64> = rows.iter().map(|row| row.avg_claims_per_policy).collect();

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let y_top = axis_top(values.iter().cloned().fold(0.0_f64, f64::max));
    let x_max = (rows.len() - 1).max(1) as f64;
    let mut chart = ChartBuilder::on(&root)
        .caption("Average Claims per Policy by Age Group", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(48)
        .y_label_area_size(64)
        .build_cartesian_2d(-0.5..x_max + 0.5, 0.0..y_top)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&|x: &f64| {
            let idx = x.round();
            if (x - idx).abs() < 1e-6 && idx >= 0.0 {
                labels.get(idx as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .x_desc("Age Group")
        .y_desc("Average Claims per Policy")
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(LineSeries::new(
            values.iter().enumerate().map(|(i, v)| (i as f64, *v)),
            &BAR_FILL,
        ))
        .map_err(render_err)?;
    chart
        .draw_series(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| Circle::new((i as f64, *v), 4, BAR_FILL.filled())),
        )
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

/// Portfolio mix as a pie with percentage labels.
pub fn portfolio_mix_pie(rows: &[MixRow], path: &Path) -> PortfolioResult<()> {
    if rows.is_empty() {
        return Err(empty("portfolio mix pie"));
    }
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;
    let root = root
        .titled("Portfolio Mix by Car Type", ("sans-serif", 24))
        .map_err(render_err)?;

    let sizes: Vec<f64> = rows.iter().map(|row| row.num_policies as f64).collect();
    let labels: Vec<String> = rows.iter().map(|row| row.car_type.clone()).collect();
    let colors: Vec<RGBColor> = (0..rows.len())
        .map(|i| PIE_PALETTE[i % PIE_PALETTE.len()])
        .collect();

    let center = (400, 310);
    let radius = 220.0;
    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.label_style(("sans-serif", 18).into_font().color(&BLACK));
    pie.percentages(("sans-serif", 14).into_font().color(&BLACK));
    root.draw(&pie).map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

/// Distribution of per-policy claim totals.
pub fn claims_histogram(rows: &[PolicyTotalsRow], path: &Path) -> PortfolioResult<()> {
    if rows.is_empty() {
        return Err(empty("claims histogram"));
    }
    let totals: Vec<f64> = rows.iter().map(|row| row.total_claims).collect();
    let max = totals.iter().cloned().fold(0.0_f64, f64::max);
    let bin_count = 50usize;
    let bin_width = if max > 0.0 { max / bin_count as f64 } else { 1.0 };
    let mut counts = vec![0usize; bin_count];
    for total in &totals {
        let idx = ((total / bin_width) as usize).min(bin_count - 1);
        counts[idx] += 1;
    }
    let y_top = counts.iter().copied().max().unwrap_or(1).max(1) + 1;
    let x_top = if max > 0.0 { max } else { 1.0 };

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Distribution of Total Claims per Policy", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(48)
        .y_label_area_size(64)
        .build_cartesian_2d(0.0..x_top, 0usize..y_top)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Total Claims Amount")
        .y_desc("Count of Policies")
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(
            counts
                .iter()
                .enumerate()
                .filter(|(_, count)| **count > 0)
                .map(|(i, count)| {
                    Rectangle::new(
                        [
                            (i as f64 * bin_width, 0),
                            ((i + 1) as f64 * bin_width, *count),
                        ],
                        BAR_FILL.filled(),
                    )
                }),
        )
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

/// Premium against total claims, one point per policy.
pub fn premium_vs_claims_scatter(rows: &[PolicyTotalsRow], path: &Path) -> PortfolioResult<()> {
    if rows.is_empty() {
        return Err(empty("premium vs claims scatter"));
    }
    let x_top = axis_top(rows.iter().map(|row| row.premium).fold(0.0_f64, f64::max));
    let y_top = axis_top(
        rows.iter()
            .map(|row| row.total_claims)
            .fold(0.0_f64, f64::max),
    );

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Policy Premium vs Total Claims Amount", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(48)
        .y_label_area_size(64)
        .build_cartesian_2d(0.0..x_top, 0.0..y_top)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc("Premium")
        .y_desc("Total Claims Amount")
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(
            rows.iter()
                .map(|row| Circle::new((row.premium, row.total_claims), 3, BAR_FILL.mix(0.5).filled())),
        )
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

/// Shared vertical bar chart over categorical labels.
fn bar_chart(
    path: &Path,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    labels: &[String],
    values: &[f64],
) -> PortfolioResult<()> {
    if labels.is_empty() {
        return Err(empty(title));
    }
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let y_top = axis_top(values.iter().cloned().fold(0.0_f64, f64::max));
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(48)
        .y_label_area_size(64)
        .build_cartesian_2d((0..labels.len()).into_segmented(), 0.0..y_top)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&|pos| match pos {
            SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .x_desc(x_desc)
        .y_desc(y_desc)
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(values.iter().enumerate().map(|(i, v)| {
            Rectangle::new(
                [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *v)],
                BAR_FILL.filled(),
            )
        }))
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

fn axis_top(max: f64) -> f64 {
    if max <= 0.0 {
        1.0
    } else {
        max * 1.1
    }
}

fn empty(what: &str) -> PortfolioError {
    PortfolioError::Render(format!("{what}: nothing to plot"))
}

fn render_err<E: std::fmt::Display>(e: E) -> PortfolioError {
    PortfolioError::Render(e.to_string())
}
