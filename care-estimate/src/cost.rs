use std::sync::Arc;
use tracing::debug;

use crate::policy::{CostBand, CostPolicy, CostStrategyKind, RiskCoefficients};
use crate::types::{CostEstimate, CostRequest, Region, Sex, Smoker};

/// A way of turning a validated cost request into a cost band.
///
/// Implementations must be total: any request that passed validation yields
/// an estimate, with unknown lookup keys degrading to the policy defaults.
pub trait CostStrategy: Send + Sync {
    fn name(&self) -> &str;

    fn estimate(&self, request: &CostRequest, policy: &CostPolicy) -> CostEstimate;
}

/// `avg = base × city × hospital × room × age`, band 0.85 .. 1.25 by default
pub struct LookupMultiplierStrategy;

impl CostStrategy for LookupMultiplierStrategy {
    fn name(&self) -> &str {
        "lookup_multiplier"
    }

    fn estimate(&self, request: &CostRequest, policy: &CostPolicy) -> CostEstimate {
        let base = policy.base_cost(&request.condition);
        let city = policy.city_multiplier(&request.city);
        let hospital = policy.hospital_multiplier(request.hospital_type);
        let room = policy.room_multiplier(request.room_type);
        let age = policy.age_factor(request.age);

        debug!(
            base,
            city_multiplier = city,
            hospital_multiplier = hospital,
            room_multiplier = room,
            age_factor = age,
            "Lookup multipliers resolved"
        );

        band(base * city * hospital * room * age, &policy.lookup_band, None)
    }
}

/// Mean of the city-scaled base cost and the risk-score insurance charge,
/// band 0.8 .. 1.3 by default
pub struct RiskBlendStrategy;

impl CostStrategy for RiskBlendStrategy {
    fn name(&self) -> &str {
        "risk_blend"
    }

    fn estimate(&self, request: &CostRequest, policy: &CostPolicy) -> CostEstimate {
        let local_cost =
            policy.base_cost(&request.condition) * policy.city_multiplier(&request.city);
        let score = risk_score(request, &policy.risk);
        let charge = insurance_charge(score, &policy.risk);

        debug!(
            local_cost,
            risk_score = score,
            insurance_charge = charge,
            "Risk blend inputs resolved"
        );

        band(
            (local_cost + charge) / 2.0,
            &policy.blend_band,
            Some(score.round() as i64),
        )
    }
}

/// Linear risk score over the patient attributes. Missing optional
/// attributes contribute nothing.
pub fn risk_score(request: &CostRequest, coefficients: &RiskCoefficients) -> f64 {
    let mut score = f64::from(request.age) * coefficients.age;

    if let Some(bmi) = request.bmi {
        score += bmi * coefficients.bmi;
    }
    if let Some(children) = request.children {
        score += f64::from(children) * coefficients.children;
    }
    if request.sex == Some(Sex::Male) {
        score += coefficients.sex_male;
    }
    if request.smoker == Some(Smoker::Yes) {
        score += coefficients.smoker_yes;
    }
    score += match request.region {
        Some(Region::Northwest) => coefficients.region_northwest,
        Some(Region::Southeast) => coefficients.region_southeast,
        Some(Region::Southwest) => coefficients.region_southwest,
        Some(Region::Northeast) | None => 0.0,
    };

    score
}

/// Predicted insurance charge for a risk score, floored at zero
pub fn insurance_charge(score: f64, coefficients: &RiskCoefficients) -> f64 {
    (score * coefficients.charge_coefficient + coefficients.charge_intercept).max(0.0)
}

fn band(average: f64, band: &CostBand, risk_score: Option<i64>) -> CostEstimate {
    let avg_cost = average.max(0.0).round();
    CostEstimate {
        min_cost: (avg_cost * band.min_factor).round() as u64,
        avg_cost: avg_cost as u64,
        max_cost: (avg_cost * band.max_factor).round() as u64,
        risk_score,
    }
}

/// Runs the configured [`CostStrategy`] against a [`CostPolicy`].
#[derive(Clone)]
pub struct CostEstimator {
    policy: Arc<CostPolicy>,
    strategy: Arc<dyn CostStrategy>,
}

impl CostEstimator {
    pub fn new(policy: CostPolicy) -> Self {
        let strategy: Arc<dyn CostStrategy> = match policy.strategy {
            CostStrategyKind::LookupMultiplier => Arc::new(LookupMultiplierStrategy),
            CostStrategyKind::RiskBlend => Arc::new(RiskBlendStrategy),
        };
        Self {
            policy: Arc::new(policy),
            strategy,
        }
    }

    /// Replace the strategy picked from the policy
    pub fn with_strategy(mut self, strategy: Arc<dyn CostStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn estimate(&self, request: &CostRequest) -> CostEstimate {
        let estimate = self.strategy.estimate(request, &self.policy);
        debug!(
            strategy = %self.strategy.name(),
            condition = %request.condition,
            city = %request.city,
            hospital_type = ?request.hospital_type,
            room_type = ?request.room_type,
            age = request.age,
            min_cost = estimate.min_cost,
            avg_cost = estimate.avg_cost,
            max_cost = estimate.max_cost,
            "Cost estimated"
        );
        estimate
    }
}

impl Default for CostEstimator {
    fn default() -> Self {
        Self::new(CostPolicy::default())
    }
}
