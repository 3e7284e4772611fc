//! Generation parameters for the synthetic portfolio.
//!
//! All distribution knobs live here so the generator stays a pure
//! function of (config, seed). Defaults mirror the demo portfolio:
//! 1000 policies, four car types, Poisson claim counts, lognormal
//! severities.

use crate::error::{PortfolioError, PortfolioResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarTypeConfig {
    pub name: String,
    /// Relative population weight (normalized at draw time).
    pub weight: f64,
    /// Multiplier applied to the base claim rate for this car type.
    #[serde(default = "default_multiplier")]
    pub claim_rate_multiplier: f64,
}

fn default_multiplier() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgeBand {
    pub label: String,
    pub min_age: u32,
    /// None marks the open-ended top band.
    #[serde(default)]
    pub max_age: Option<u32>,
}

impl AgeBand {
    pub fn contains(&self, age: u32) -> bool {
        age >= self.min_age && self.max_age.map_or(true, |max| age <= max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PremiumConfig {
    pub mean: f64,
    pub std_dev: f64,
    /// Draws are clamped into [floor, ceiling].
    pub floor: f64,
    pub ceiling: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityConfig {
    /// Mean claim amount of the lognormal severity distribution.
    pub mean_amount: f64,
    /// Lognormal shape parameter; higher = heavier tail.
    pub sigma: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub population_size: usize,
    pub seed: u64,
    pub car_types: Vec<CarTypeConfig>,
    pub age_bands: Vec<AgeBand>,
    /// Ages are drawn uniformly from [min_age, max_age].
    pub min_age: u32,
    pub max_age: u32,
    pub premium: PremiumConfig,
    /// Expected claims per policy per year before multipliers.
    pub base_claim_rate: f64,
    /// Policies below this age draw claims at a boosted rate.
    pub young_driver_age_cutoff: u32,
    pub young_driver_multiplier: f64,
    pub severity: SeverityConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            population_size: 1000,
            seed: 42,
            car_types: vec![
                CarTypeConfig {
                    name: "Sedan".into(),
                    weight: 0.4,
                    claim_rate_multiplier: 1.0,
                },
                CarTypeConfig {
                    name: "SUV".into(),
                    weight: 0.3,
                    claim_rate_multiplier: 1.0,
                },
                CarTypeConfig {
                    name: "Truck".into(),
                    weight: 0.2,
                    claim_rate_multiplier: 1.4,
                },
                CarTypeConfig {
                    name: "Sports".into(),
                    weight: 0.1,
                    claim_rate_multiplier: 2.0,
                },
            ],
            age_bands: vec![
                AgeBand {
                    label: "18-29".into(),
                    min_age: 18,
                    max_age: Some(29),
                },
                AgeBand {
                    label: "30-39".into(),
                    min_age: 30,
                    max_age: Some(39),
                },
                AgeBand {
                    label: "40-49".into(),
                    min_age: 40,
                    max_age: Some(49),
                },
                AgeBand {
                    label: "50-59".into(),
                    min_age: 50,
                    max_age: Some(59),
                },
                AgeBand {
                    label: "60-69".into(),
                    min_age: 60,
                    max_age: Some(69),
                },
                AgeBand {
                    label: "70+".into(),
                    min_age: 70,
                    max_age: None,
                },
            ],
            min_age: 18,
            max_age: 79,
            premium: PremiumConfig {
                mean: 1200.0,
                std_dev: 250.0,
                floor: 400.0,
                ceiling: 4000.0,
            },
            base_claim_rate: 0.12,
            young_driver_age_cutoff: 25,
            young_driver_multiplier: 1.6,
            severity: SeverityConfig {
                mean_amount: 7000.0,
                sigma: 0.9,
            },
        }
    }
}

impl GeneratorConfig {
    /// Load and validate a config file. Missing keys fall back to the
    /// defaults above.
    pub fn load(path: &str) -> PortfolioResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PortfolioError::InvalidConfig(format!("cannot read {path}: {e}")))?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Fail fast on parameters no generation run could honor.
    pub fn validate(&self) -> PortfolioResult<()> {
        if self.population_size == 0 {
            return Err(invalid("population_size must be at least 1"));
        }
        if self.car_types.is_empty() {
            return Err(invalid("at least one car type is required"));
        }
        for car in &self.car_types {
            if !(car.weight > 0.0) {
                return Err(invalid(&format!(
                    "car type '{}' must have a positive weight",
                    car.name
                )));
            }
            if !(car.claim_rate_multiplier > 0.0) {
                return Err(invalid(&format!(
                    "car type '{}' must have a positive claim rate multiplier",
                    car.name
                )));
            }
        }
        if self.age_bands.is_empty() {
            return Err(invalid("at least one age band is required"));
        }
        if self.min_age > self.max_age {
            return Err(invalid("min_age must not exceed max_age"));
        }
        for age in self.min_age..=self.max_age {
            if !self.age_bands.iter().any(|band| band.contains(age)) {
                return Err(invalid(&format!("age {age} is not covered by any age band")));
            }
        }
        if !(self.premium.floor > 0.0) {
            return Err(invalid("premium floor must be positive"));
        }
        if self.premium.floor > self.premium.ceiling {
            return Err(invalid("premium floor must not exceed the ceiling"));
        }
        if !(self.premium.std_dev >= 0.0) {
            return Err(invalid("premium std_dev must be non-negative"));
        }
        if !(self.base_claim_rate >= 0.0) {
            return Err(invalid("base_claim_rate must be non-negative"));
        }
        if !(self.young_driver_multiplier > 0.0) {
            return Err(invalid("young_driver_multiplier must be positive"));
        }
        if !(self.severity.mean_amount > 0.0) {
            return Err(invalid("severity mean_amount must be positive"));
        }
        if !(self.severity.sigma > 0.0) {
            return Err(invalid("severity sigma must be positive"));
        }
        Ok(())
    }

    /// The band an age falls into. Ages past every band land in the
    /// last one (validation guarantees coverage of the drawable range).
    pub fn age_band_for(&self, age: u32) -> &AgeBand {
        self.age_bands
            .iter()
            .find(|band| band.contains(age))
            .unwrap_or_else(|| self.age_bands.last().unwrap())
    }

    /// Band labels in configured order; reports present age groups in
    /// this order.
    pub fn band_labels(&self) -> Vec<String> {
        self.age_bands.iter().map(|band| band.label.clone()).collect()
    }
}

fn invalid(msg: &str) -> PortfolioError {
    PortfolioError::InvalidConfig(msg.to_string())
}
