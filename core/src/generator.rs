//! Synthetic portfolio generation.
//!
//! A pure function of the configuration (which carries the master
//! seed): the same inputs always produce the same policy and claim
//! sets. Claim counts per policy follow a Poisson frequency scaled by
//! car type and driver age; severities follow a lognormal with the
//! configured mean.

use crate::config::{CarTypeConfig, GeneratorConfig};
use crate::error::{PortfolioError, PortfolioResult};
use crate::rng::{RngBank, StageRng, StageSlot};
use crate::types::{ClaimId, PolicyId};
use rand_distr::{LogNormal, Normal, Poisson};

#[derive(Debug, Clone, PartialEq)]
pub struct PolicyRecord {
    pub policy_id: PolicyId,
    pub car_type: String,
    pub age_group: String,
    pub premium: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClaimRecord {
    pub claim_id: ClaimId,
    pub policy_id: PolicyId,
    pub claim_amount: f64,
}

/// The two record sets a generation run produces. Every claim's
/// policy_id resolves to a policy in the same portfolio.
#[derive(Debug, Clone)]
pub struct Portfolio {
    pub policies: Vec<PolicyRecord>,
    pub claims: Vec<ClaimRecord>,
}

pub fn generate(config: &GeneratorConfig) -> PortfolioResult<Portfolio> {
    config.validate()?;

    let bank = RngBank::new(config.seed);
    let mut policy_rng = bank.for_stage(StageSlot::Policies);
    let mut claim_rng = bank.for_stage(StageSlot::Claims);

    let premium_dist = Normal::new(config.premium.mean, config.premium.std_dev)
        .map_err(|e| PortfolioError::InvalidConfig(format!("premium distribution: {e}")))?;

    // Parameterize the lognormal so its mean is the configured amount:
    // E[X] = exp(mu + sigma^2 / 2).
    let sigma = config.severity.sigma;
    let mu = config.severity.mean_amount.ln() - 0.5 * sigma * sigma;
    let severity_dist = LogNormal::new(mu, sigma)
        .map_err(|e| PortfolioError::InvalidConfig(format!("severity distribution: {e}")))?;

    let mut policies = Vec::with_capacity(config.population_size);
    let mut claims = Vec::new();

    for i in 0..config.population_size {
        let age = policy_rng.uniform_u32(config.min_age, config.max_age);
        let car = pick_car_type(config, &mut policy_rng);
        let premium = round_cents(
            policy_rng
                .sample(&premium_dist)
                .clamp(config.premium.floor, config.premium.ceiling),
        );
        let policy_id = format!("p-{i:06}");

        let lambda = claim_lambda(config, car, age);
        let claim_count = draw_claim_count(&mut claim_rng, lambda);
        for _ in 0..claim_count {
            let claim_id = format!("k-{:06}", claims.len());
            let amount = round_cents(claim_rng.sample(&severity_dist));
            claims.push(ClaimRecord {
                claim_id,
                policy_id: policy_id.clone(),
                claim_amount: amount,
            });
        }

        policies.push(PolicyRecord {
            policy_id,
            car_type: car.name.clone(),
            age_group: config.age_band_for(age).label.clone(),
            premium,
        });
    }

    log::info!(
        "generated {} policies and {} claims (seed {})",
        policies.len(),
        claims.len(),
        config.seed
    );
    Ok(Portfolio { policies, claims })
}

fn pick_car_type<'a>(config: &'a GeneratorConfig, rng: &mut StageRng) -> &'a CarTypeConfig {
    let total: f64 = config.car_types.iter().map(|car| car.weight).sum();
    let roll = rng.next_f64() * total;
    let mut cumulative = 0.0;
    for car in &config.car_types {
        cumulative += car.weight;
        if roll < cumulative {
            return car;
        }
    }
    config.car_types.last().unwrap()
}

fn claim_lambda(config: &GeneratorConfig, car: &CarTypeConfig, age: u32) -> f64 {
    let mut lambda = config.base_claim_rate * car.claim_rate_multiplier;
    if age < config.young_driver_age_cutoff {
        lambda *= config.young_driver_multiplier;
    }
    lambda
}

fn draw_claim_count(rng: &mut StageRng, lambda: f64) -> usize {
    // Poisson::new rejects lambda <= 0; a zero rate simply means no claims.
    match Poisson::new(lambda) {
        Ok(dist) => {
            let count: f64 = rng.sample(&dist);
            count as usize
        }
        Err(_) => 0,
    }
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
