use crate::cost::CostEstimator;
use crate::coverage::CoverageExplainer;
use crate::finance::FinanceAdvisor;
use crate::policy::EstimatorPolicy;
use crate::types::{
    CostEstimate, CostRequest, FinanceRecommendation, FinanceRequest, InsuranceExplanation,
    InsuranceRequest,
};

/// The three scoring functions configured from one policy.
///
/// They never call each other; feeding one result into the next is left to
/// the caller (see [`crate::wizard::WizardSession`]).
#[derive(Clone)]
pub struct Scoring {
    pub cost: CostEstimator,
    pub coverage: CoverageExplainer,
    pub finance: FinanceAdvisor,
}

impl Scoring {
    pub fn new(policy: EstimatorPolicy) -> Self {
        Self {
            cost: CostEstimator::new(policy.cost),
            coverage: CoverageExplainer::new(),
            finance: FinanceAdvisor::new(policy.finance),
        }
    }

    pub fn estimate(&self, request: &CostRequest) -> CostEstimate {
        self.cost.estimate(request)
    }

    pub fn explain(&self, request: &InsuranceRequest) -> InsuranceExplanation {
        self.coverage.explain(request)
    }

    pub fn recommend(&self, request: &FinanceRequest) -> FinanceRecommendation {
        self.finance.recommend(request)
    }
}

impl Default for Scoring {
    fn default() -> Self {
        Self::new(EstimatorPolicy::default())
    }
}
