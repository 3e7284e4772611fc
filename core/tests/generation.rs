//! Generator determinism, integrity, and distribution-shape tests.

use portfolio_core::config::GeneratorConfig;
use portfolio_core::error::PortfolioError;
use portfolio_core::generator;
use std::collections::{HashMap, HashSet};

fn config_with(seed: u64, population: usize) -> GeneratorConfig {
    let mut config = GeneratorConfig::default();
    config.seed = seed;
    config.population_size = population;
    config
}

#[test]
fn every_claim_references_a_generated_policy() {
    let portfolio = generator::generate(&config_with(42, 500)).unwrap();

    let ids: HashSet<&str> = portfolio
        .policies
        .iter()
        .map(|p| p.policy_id.as_str())
        .collect();
    for claim in &portfolio.claims {
        assert!(
            ids.contains(claim.policy_id.as_str()),
            "claim {} references unknown policy {}",
            claim.claim_id,
            claim.policy_id
        );
    }
}

#[test]
fn same_seed_produces_identical_portfolios() {
    let a = generator::generate(&config_with(7, 300)).unwrap();
    let b = generator::generate(&config_with(7, 300)).unwrap();

    assert_eq!(a.policies, b.policies, "policy sets diverged for same seed");
    assert_eq!(a.claims, b.claims, "claim sets diverged for same seed");
}

#[test]
fn different_seeds_diverge() {
    let a = generator::generate(&config_with(1, 300)).unwrap();
    let b = generator::generate(&config_with(2, 300)).unwrap();

    assert_ne!(
        a.policies, b.policies,
        "different seeds produced identical policy sets"
    );
}

#[test]
fn premiums_stay_inside_the_configured_range() {
    let config = config_with(42, 1000);
    let portfolio = generator::generate(&config).unwrap();

    for policy in &portfolio.policies {
        assert!(
            policy.premium >= config.premium.floor && policy.premium <= config.premium.ceiling,
            "premium {} for {} escapes [{}, {}]",
            policy.premium,
            policy.policy_id,
            config.premium.floor,
            config.premium.ceiling
        );
        assert!(policy.premium > 0.0, "premium must be positive");
    }
}

#[test]
fn claim_amounts_are_positive() {
    let portfolio = generator::generate(&config_with(42, 1000)).unwrap();

    assert!(
        !portfolio.claims.is_empty(),
        "1000 policies at the default rate should produce claims"
    );
    for claim in &portfolio.claims {
        assert!(
            claim.claim_amount > 0.0,
            "claim {} has non-positive amount {}",
            claim.claim_id,
            claim.claim_amount
        );
    }
}

#[test]
fn age_groups_use_configured_labels() {
    let config = config_with(42, 500);
    let labels: HashSet<String> = config.band_labels().into_iter().collect();
    let portfolio = generator::generate(&config).unwrap();

    for policy in &portfolio.policies {
        assert!(
            labels.contains(&policy.age_group),
            "policy {} carries unconfigured age group '{}'",
            policy.policy_id,
            policy.age_group
        );
    }
}

#[test]
fn car_types_follow_the_configured_weights() {
    // 4000 draws: Sedan (0.4) must clearly outnumber Sports (0.1).
    let portfolio = generator::generate(&config_with(11, 4000)).unwrap();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for policy in &portfolio.policies {
        *counts.entry(policy.car_type.as_str()).or_default() += 1;
    }
    let sedans = counts.get("Sedan").copied().unwrap_or(0);
    let sports = counts.get("Sports").copied().unwrap_or(0);
    assert!(
        sedans > sports * 2,
        "expected Sedans ({sedans}) to clearly outnumber Sports ({sports})"
    );
}

#[test]
fn sports_cars_claim_more_often_than_sedans() {
    // The Sports rate multiplier is 2.0; with 4000 policies the
    // per-policy claim frequencies must separate cleanly.
    let portfolio = generator::generate(&config_with(11, 4000)).unwrap();

    let mut car_by_policy: HashMap<&str, &str> = HashMap::new();
    for policy in &portfolio.policies {
        car_by_policy.insert(&policy.policy_id, &policy.car_type);
    }

    let mut policies: HashMap<&str, usize> = HashMap::new();
    for policy in &portfolio.policies {
        *policies.entry(policy.car_type.as_str()).or_default() += 1;
    }
    let mut claims: HashMap<&str, usize> = HashMap::new();
    for claim in &portfolio.claims {
        let car = car_by_policy[claim.policy_id.as_str()];
        *claims.entry(car).or_default() += 1;
    }

    let freq = |car: &str| {
        claims.get(car).copied().unwrap_or(0) as f64 / policies.get(car).copied().unwrap_or(1) as f64
    };
    assert!(
        freq("Sports") > freq("Sedan"),
        "Sports frequency {:.3} should exceed Sedan frequency {:.3}",
        freq("Sports"),
        freq("Sedan")
    );
}

#[test]
fn zero_claim_rate_produces_no_claims() {
    let mut config = config_with(5, 200);
    config.base_claim_rate = 0.0;
    let portfolio = generator::generate(&config).unwrap();

    assert!(portfolio.claims.is_empty(), "zero rate must yield no claims");
    assert_eq!(portfolio.policies.len(), 200);
}

#[test]
fn invalid_configurations_fail_fast() {
    let mut zero_pop = GeneratorConfig::default();
    zero_pop.population_size = 0;
    assert_invalid(zero_pop, "zero population");

    let mut no_cars = GeneratorConfig::default();
    no_cars.car_types.clear();
    assert_invalid(no_cars, "empty car types");

    let mut bad_weight = GeneratorConfig::default();
    bad_weight.car_types[0].weight = -1.0;
    assert_invalid(bad_weight, "negative weight");

    let mut bad_premium = GeneratorConfig::default();
    bad_premium.premium.floor = 5000.0; // above the ceiling
    assert_invalid(bad_premium, "floor above ceiling");

    let mut bad_rate = GeneratorConfig::default();
    bad_rate.base_claim_rate = -0.1;
    assert_invalid(bad_rate, "negative claim rate");

    let mut bad_sigma = GeneratorConfig::default();
    bad_sigma.severity.sigma = 0.0;
    assert_invalid(bad_sigma, "zero severity sigma");

    let mut uncovered_age = GeneratorConfig::default();
    uncovered_age.age_bands.retain(|band| band.label != "30-39");
    assert_invalid(uncovered_age, "age range with a hole");
}

fn assert_invalid(config: GeneratorConfig, what: &str) {
    match generator::generate(&config) {
        Err(PortfolioError::InvalidConfig(_)) => {}
        Err(other) => panic!("{what}: expected InvalidConfig, got {other}"),
        Ok(_) => panic!("{what}: expected InvalidConfig, generation succeeded"),
    }
}
