//! Tunable constants behind the three scoring functions.
//!
//! Every lookup table carries an explicit default entry. Unknown conditions and
//! cities degrade to those defaults instead of failing, so an estimate is
//! always produced for a request that passed validation.
//!
//! The policy can be loaded from YAML. Fields left out of the file keep their
//! reference values; a table that is present replaces the reference table
//! wholesale.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::error::{EstimateError, Result};
use crate::types::{HospitalType, RoomType};

/// Which cost computation the estimator runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostStrategyKind {
    /// Base cost times city, hospital, room and age multipliers
    #[default]
    LookupMultiplier,
    /// Mean of the city-scaled base cost and a risk-score insurance charge
    RiskBlend,
}

/// Factors applied to the average cost to derive the band edges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBand {
    pub min_factor: f64,
    pub max_factor: f64,
}

/// Applies `factor` to patients strictly older than `above`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgeBand {
    pub above: u8,
    pub factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskCoefficients {
    pub age: f64,
    pub bmi: f64,
    pub children: f64,
    pub sex_male: f64,
    pub smoker_yes: f64,
    pub region_northwest: f64,
    pub region_southeast: f64,
    pub region_southwest: f64,
    /// Linear map from risk score to an insurance charge
    pub charge_coefficient: f64,
    pub charge_intercept: f64,
}

impl Default for RiskCoefficients {
    fn default() -> Self {
        Self {
            age: 2.569757,
            bmi: 3.370926,
            children: 4.252788,
            sex_male: -0.185917,
            smoker_yes: 236.511289,
            region_northwest: -3.706773,
            region_southeast: -6.578643,
            region_southwest: -8.097994,
            charge_coefficient: 100.5865091,
            charge_intercept: -12123.200203717966,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostPolicy {
    pub strategy: CostStrategyKind,
    pub base_costs: HashMap<String, f64>,
    pub default_base_cost: f64,
    pub city_multipliers: HashMap<String, f64>,
    pub default_city_multiplier: f64,
    pub hospital_multipliers: HashMap<HospitalType, f64>,
    pub default_hospital_multiplier: f64,
    pub room_multipliers: HashMap<RoomType, f64>,
    pub default_room_multiplier: f64,
    /// Checked in order, first match wins
    pub age_bands: Vec<AgeBand>,
    pub lookup_band: CostBand,
    pub blend_band: CostBand,
    pub risk: RiskCoefficients,
}

impl Default for CostPolicy {
    fn default() -> Self {
        let base_costs = [
            ("cardiac_surgery", 850_000.0),
            ("typhoid", 45_000.0),
            ("cataract_surgery", 65_000.0),
            ("dialysis", 25_000.0),
            ("knee_replacement", 350_000.0),
        ];
        let city_multipliers = [
            ("Chennai", 1.2),
            ("Delhi", 1.5),
            ("Pune", 1.1),
            ("Hyderabad", 1.3),
            ("Jaipur", 1.0),
        ];

        Self {
            strategy: CostStrategyKind::default(),
            base_costs: base_costs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            default_base_cost: 100_000.0,
            city_multipliers: city_multipliers
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            default_city_multiplier: 1.0,
            hospital_multipliers: HashMap::from([
                (HospitalType::Government, 0.6),
                (HospitalType::Private, 1.0),
                (HospitalType::Corporate, 1.4),
            ]),
            default_hospital_multiplier: 1.0,
            room_multipliers: HashMap::from([
                (RoomType::GeneralWard, 0.8),
                (RoomType::SemiPrivate, 1.0),
                (RoomType::PrivateSuite, 1.35),
            ]),
            default_room_multiplier: 1.0,
            age_bands: vec![
                AgeBand {
                    above: 60,
                    factor: 1.2,
                },
                AgeBand {
                    above: 40,
                    factor: 1.1,
                },
            ],
            lookup_band: CostBand {
                min_factor: 0.85,
                max_factor: 1.25,
            },
            blend_band: CostBand {
                min_factor: 0.8,
                max_factor: 1.3,
            },
            risk: RiskCoefficients::default(),
        }
    }
}

/// Lower-cases, trims and joins whitespace runs with `_`, so
/// "Knee Replacement" and "knee_replacement" hit the same entry.
pub fn normalize_condition(condition: &str) -> String {
    condition
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

impl CostPolicy {
    pub fn base_cost(&self, condition: &str) -> f64 {
        self.base_costs
            .get(&normalize_condition(condition))
            .copied()
            .unwrap_or(self.default_base_cost)
    }

    pub fn city_multiplier(&self, city: &str) -> f64 {
        self.city_multipliers
            .get(city.trim())
            .copied()
            .unwrap_or(self.default_city_multiplier)
    }

    pub fn hospital_multiplier(&self, hospital_type: HospitalType) -> f64 {
        self.hospital_multipliers
            .get(&hospital_type)
            .copied()
            .unwrap_or(self.default_hospital_multiplier)
    }

    pub fn room_multiplier(&self, room_type: RoomType) -> f64 {
        self.room_multipliers
            .get(&room_type)
            .copied()
            .unwrap_or(self.default_room_multiplier)
    }

    pub fn age_factor(&self, age: u8) -> f64 {
        self.age_bands
            .iter()
            .find(|band| age > band.above)
            .map(|band| band.factor)
            .unwrap_or(1.0)
    }

    /// Smallest average the lookup strategy can produce, counting every
    /// default entry as reachable
    pub fn lowest_lookup_average(&self) -> f64 {
        let age = self
            .age_bands
            .iter()
            .map(|band| band.factor)
            .fold(1.0, f64::min);
        self.lowest_local_cost()
            * lowest(self.hospital_multipliers.values(), self.default_hospital_multiplier)
            * lowest(self.room_multipliers.values(), self.default_room_multiplier)
            * age
    }

    /// The insurance charge is floored at zero, so half the local cost
    pub fn lowest_blend_average(&self) -> f64 {
        self.lowest_local_cost() / 2.0
    }

    fn lowest_local_cost(&self) -> f64 {
        lowest(self.base_costs.values(), self.default_base_cost)
            * lowest(self.city_multipliers.values(), self.default_city_multiplier)
    }

    fn validate(&self) -> Result<()> {
        ensure_positive("cost.default_base_cost", self.default_base_cost)?;
        ensure_positive("cost.default_city_multiplier", self.default_city_multiplier)?;
        ensure_positive(
            "cost.default_hospital_multiplier",
            self.default_hospital_multiplier,
        )?;
        ensure_positive("cost.default_room_multiplier", self.default_room_multiplier)?;

        for (condition, cost) in &self.base_costs {
            ensure_positive(&format!("cost.base_costs.{condition}"), *cost)?;
        }
        for (city, multiplier) in &self.city_multipliers {
            ensure_positive(&format!("cost.city_multipliers.{city}"), *multiplier)?;
        }
        for (hospital, multiplier) in &self.hospital_multipliers {
            ensure_positive(&format!("cost.hospital_multipliers.{hospital:?}"), *multiplier)?;
        }
        for (room, multiplier) in &self.room_multipliers {
            ensure_positive(&format!("cost.room_multipliers.{room:?}"), *multiplier)?;
        }
        for band in &self.age_bands {
            ensure_positive(&format!("cost.age_bands.{}", band.above), band.factor)?;
        }

        ensure_band("cost.lookup_band", &self.lookup_band)?;
        ensure_band("cost.blend_band", &self.blend_band)?;
        ensure_band_separates(
            "cost.lookup_band",
            &self.lookup_band,
            self.lowest_lookup_average(),
        )?;
        ensure_band_separates(
            "cost.blend_band",
            &self.blend_band,
            self.lowest_blend_average(),
        )?;

        let risk = &self.risk;
        let coefficients = [
            ("age", risk.age),
            ("bmi", risk.bmi),
            ("children", risk.children),
            ("sex_male", risk.sex_male),
            ("smoker_yes", risk.smoker_yes),
            ("region_northwest", risk.region_northwest),
            ("region_southeast", risk.region_southeast),
            ("region_southwest", risk.region_southwest),
            ("charge_coefficient", risk.charge_coefficient),
            ("charge_intercept", risk.charge_intercept),
        ];
        for (name, value) in coefficients {
            if !value.is_finite() {
                return Err(EstimateError::Config(format!(
                    "cost.risk.{name} must be a finite number"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancePolicy {
    /// A coverage gap at or above `income_multiplier * monthly_income` is high risk
    pub income_multiplier: f64,
}

impl Default for FinancePolicy {
    fn default() -> Self {
        Self {
            income_multiplier: 1.5,
        }
    }
}

/// Complete set of constants used by the estimator, coverage explainer and advisor
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorPolicy {
    pub cost: CostPolicy,
    pub finance: FinancePolicy,
}

impl EstimatorPolicy {
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let policy: EstimatorPolicy = serde_yaml::from_str(source)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            EstimateError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let policy = Self::from_yaml_str(&source)?;
        info!(
            path = %path.display(),
            strategy = ?policy.cost.strategy,
            income_multiplier = policy.finance.income_multiplier,
            "Loaded estimator policy"
        );
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        self.cost.validate()?;
        ensure_positive("finance.income_multiplier", self.finance.income_multiplier)
    }
}

fn ensure_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EstimateError::Config(format!(
            "{name} must be a positive number, got {value}"
        )))
    }
}

fn ensure_band(name: &str, band: &CostBand) -> Result<()> {
    let valid = band.min_factor.is_finite()
        && band.max_factor.is_finite()
        && band.min_factor > 0.0
        && band.min_factor < 1.0
        && band.max_factor > 1.0;
    if valid {
        Ok(())
    } else {
        Err(EstimateError::Config(format!(
            "{name} needs 0 < min_factor < 1 < max_factor, got {} and {}",
            band.min_factor, band.max_factor
        )))
    }
}

fn lowest<'a>(values: impl Iterator<Item = &'a f64>, default: f64) -> f64 {
    values.copied().fold(default, f64::min)
}

/// Both band edges must land on a different whole rupee than the rounded
/// average, for the smallest average the policy can produce
fn ensure_band_separates(name: &str, band: &CostBand, lowest_average: f64) -> Result<()> {
    let average = lowest_average.round();
    if average * (1.0 - band.min_factor) > 0.5 && average * (band.max_factor - 1.0) >= 0.5 {
        Ok(())
    } else {
        Err(EstimateError::Config(format!(
            "{name} collapses onto the average for costs as low as {average}, \
             raise the smallest base cost or multiplier"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        EstimatorPolicy::default().validate().unwrap();
    }

    #[test]
    fn test_unknown_keys_fall_back_to_defaults() {
        let policy = CostPolicy::default();
        assert_eq!(policy.base_cost("appendectomy"), 100_000.0);
        assert_eq!(policy.city_multiplier("Mumbai"), 1.0);
    }

    #[test]
    fn test_condition_lookup_is_normalized() {
        let policy = CostPolicy::default();
        assert_eq!(normalize_condition("  Knee   Replacement "), "knee_replacement");
        assert_eq!(policy.base_cost("Knee Replacement"), 350_000.0);
        assert_eq!(policy.base_cost("CARDIAC_SURGERY"), 850_000.0);
    }

    #[test]
    fn test_age_bands_first_match_wins() {
        let policy = CostPolicy::default();
        assert_eq!(policy.age_factor(75), 1.2);
        assert_eq!(policy.age_factor(61), 1.2);
        assert_eq!(policy.age_factor(60), 1.1);
        assert_eq!(policy.age_factor(41), 1.1);
        assert_eq!(policy.age_factor(40), 1.0);
        assert_eq!(policy.age_factor(0), 1.0);
    }

    #[test]
    fn test_partial_yaml_keeps_reference_values() {
        let policy = EstimatorPolicy::from_yaml_str(
            r#"
cost:
  strategy: risk_blend
finance:
  income_multiplier: 0.5
"#,
        )
        .unwrap();

        assert_eq!(policy.cost.strategy, CostStrategyKind::RiskBlend);
        assert_eq!(policy.finance.income_multiplier, 0.5);
        assert_eq!(policy.cost.base_cost("dialysis"), 25_000.0);
        assert_eq!(policy.cost.hospital_multiplier(HospitalType::Corporate), 1.4);
    }

    #[test]
    fn test_yaml_tables_use_wire_labels() {
        let policy = EstimatorPolicy::from_yaml_str(
            r#"
cost:
  room_multipliers:
    "General Ward": 0.7
  city_multipliers:
    Mumbai: 1.6
"#,
        )
        .unwrap();

        assert_eq!(policy.cost.room_multiplier(RoomType::GeneralWard), 0.7);
        // replaced table, missing entries use the default multiplier
        assert_eq!(policy.cost.room_multiplier(RoomType::PrivateSuite), 1.0);
        assert_eq!(policy.cost.city_multiplier("Mumbai"), 1.6);
        assert_eq!(policy.cost.city_multiplier("Delhi"), 1.0);
    }

    #[test]
    fn test_rejects_non_positive_multiplier() {
        let err = EstimatorPolicy::from_yaml_str(
            r#"
cost:
  city_multipliers:
    Delhi: 0
"#,
        )
        .unwrap_err();
        assert!(matches!(err, EstimateError::Config(msg) if msg.contains("Delhi")));
    }

    #[test]
    fn test_rejects_inverted_band() {
        let err = EstimatorPolicy::from_yaml_str(
            r#"
cost:
  lookup_band:
    min_factor: 1.2
    max_factor: 0.9
"#,
        )
        .unwrap_err();
        assert!(matches!(err, EstimateError::Config(msg) if msg.contains("lookup_band")));
    }

    #[test]
    fn test_rejects_costs_too_small_to_band() {
        let err = EstimatorPolicy::from_yaml_str(
            r#"
cost:
  base_costs:
    x: 1
"#,
        )
        .unwrap_err();
        assert!(matches!(err, EstimateError::Config(msg) if msg.contains("lookup_band")));

        let err = EstimatorPolicy::from_yaml_str(
            r#"
cost:
  default_base_cost: 2
"#,
        )
        .unwrap_err();
        assert!(matches!(err, EstimateError::Config(msg) if msg.contains("lookup_band")));
    }

    #[test]
    fn test_lowest_averages_cover_every_default() {
        let policy = CostPolicy::default();
        // dialysis in a default-priced city, Government hospital, General Ward
        assert_eq!(policy.lowest_lookup_average(), 25_000.0 * 1.0 * 0.6 * 0.8);
        assert_eq!(policy.lowest_blend_average(), 12_500.0);
    }

    #[test]
    fn test_rejects_malformed_yaml() {
        let err = EstimatorPolicy::from_yaml_str("cost: [not, a, map]").unwrap_err();
        assert!(matches!(err, EstimateError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_a_config_error() {
        let err = EstimatorPolicy::from_file("/nonexistent/policy.yaml").unwrap_err();
        assert!(matches!(err, EstimateError::Config(msg) if msg.contains("cannot read")));
    }
}
