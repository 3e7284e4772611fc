//! Typed results for the fixed analytic queries.
//!
//! Every query produces an explicit tagged row struct (group key plus
//! metric values) so the export layer consumes all reports uniformly —
//! there are no dynamic result shapes. Undefined ratios are carried as
//! `None`, never as an error or a NaN.

use crate::error::PortfolioResult;
use crate::store::PortfolioStore;
use crate::types::PolicyId;

#[derive(Debug, Clone, PartialEq)]
pub struct CarTypeLossRow {
    pub car_type: String,
    pub num_policies: i64,
    pub claims_count: i64,
    pub total_claims: f64,
    pub total_premium: f64,
    /// None when the group's premium sums to zero.
    pub loss_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgeGroupRow {
    pub age_group: String,
    /// Exposure: count of policies in the band.
    pub num_policies: i64,
    pub claims_count: i64,
    /// Claim frequency: claims per policy in the band.
    pub avg_claims_per_policy: f64,
    pub total_claims: f64,
    pub total_premium: f64,
    pub loss_ratio: Option<f64>,
}

/// Per-policy claim totals; used both ranked (top-N) and unranked
/// (distribution and scatter reports).
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyTotalsRow {
    pub policy_id: PolicyId,
    pub car_type: String,
    pub age_group: String,
    pub premium: f64,
    pub total_claims: f64,
    pub claims_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MixRow {
    pub car_type: String,
    pub num_policies: i64,
    pub total_premium: f64,
    /// Share of the policy count; shares sum to 1 over all rows.
    pub count_share: f64,
    /// Share of the premium volume.
    pub premium_share: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSummary {
    pub total_policies: i64,
    pub total_claim_records: i64,
    pub total_claim_amount: f64,
    pub total_premium: f64,
    pub overall_loss_ratio: Option<f64>,
}

/// All query results for one loaded portfolio, collected in a single
/// pass and handed to the export layer.
#[derive(Debug, Clone)]
pub struct AnalyticsBundle {
    pub loss_by_car_type: Vec<CarTypeLossRow>,
    pub age_groups: Vec<AgeGroupRow>,
    pub top_policies: Vec<PolicyTotalsRow>,
    pub portfolio_mix: Vec<MixRow>,
    pub per_policy: Vec<PolicyTotalsRow>,
    pub summary: PortfolioSummary,
}

impl AnalyticsBundle {
    /// Run every fixed query against a loaded store.
    ///
    /// Undefined loss ratios arrive as `None` and are logged; age rows
    /// are re-ordered to the configured band order so exports and
    /// charts present bands chronologically.
    pub fn collect(
        store: &PortfolioStore,
        band_order: &[String],
        top_n: usize,
    ) -> PortfolioResult<Self> {
        let loss_by_car_type = store.loss_ratio_by_car_type()?;
        for row in &loss_by_car_type {
            if row.loss_ratio.is_none() {
                log::warn!(
                    "car type '{}' has zero total premium; loss ratio undefined",
                    row.car_type
                );
            }
        }

        let mut age_groups = store.age_group_stats()?;
        sort_by_band_order(&mut age_groups, band_order);

        Ok(Self {
            loss_by_car_type,
            age_groups,
            top_policies: store.top_policies(top_n)?,
            portfolio_mix: store.portfolio_mix()?,
            per_policy: store.per_policy_totals()?,
            summary: store.summary()?,
        })
    }
}

/// Stable re-order to the configured band sequence; labels missing
/// from the configuration sort after all known bands.
fn sort_by_band_order(rows: &mut [AgeGroupRow], band_order: &[String]) {
    rows.sort_by_key(|row| {
        band_order
            .iter()
            .position(|label| *label == row.age_group)
            .unwrap_or(band_order.len())
    });
}
