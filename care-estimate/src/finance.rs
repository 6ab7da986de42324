use tracing::debug;

use crate::policy::FinancePolicy;
use crate::types::{FinanceRecommendation, FinanceRequest, FinanceTier};

const FULLY_COVERED_PLAN: [&str; 3] = [
    "Confirm network hospital status in your city.",
    "Keep TPA contact details ready.",
    "Ask for cashless pre-authorization.",
];

const MANAGEABLE_GAP_PLAN: [&str; 3] = [
    "Check for employer-provided top-up insurance.",
    "Negotiate room rates (General Ward vs Private).",
    "Inquire about interest-free EMI options.",
];

const HIGH_RISK_PLAN: [&str; 4] = [
    "Mandatory: Check 'Cashless' status immediately.",
    "Apply for medical finance/loans early.",
    "Consider opting for a government-empanelled hospital.",
    "Review generic medication options to reduce pharmacy bills.",
];

/// Portion of the estimated cost not offset by insurance
pub fn coverage_gap(predicted_avg_cost: f64, insurance_coverage: f64) -> f64 {
    (predicted_avg_cost - insurance_coverage).max(0.0)
}

/// Places a coverage gap in exactly one tier for the given income
pub fn classify(gap: f64, monthly_income: f64, policy: &FinancePolicy) -> FinanceTier {
    if gap <= 0.0 {
        FinanceTier::FullyCovered
    } else if gap < monthly_income * policy.income_multiplier {
        FinanceTier::ManageableGap
    } else {
        FinanceTier::HighRisk
    }
}

/// Turns a cost estimate, the insurance ceiling and income into a tiered plan.
#[derive(Debug, Clone, Default)]
pub struct FinanceAdvisor {
    policy: FinancePolicy,
}

impl FinanceAdvisor {
    pub fn new(policy: FinancePolicy) -> Self {
        Self { policy }
    }

    pub fn recommend(&self, request: &FinanceRequest) -> FinanceRecommendation {
        let gap = coverage_gap(request.predicted_avg_cost, request.insurance_coverage);
        let tier = classify(gap, request.monthly_income, &self.policy);

        let (recommendation, plan): (String, &[&str]) = match tier {
            FinanceTier::FullyCovered => (
                "You are well covered! Your insurance should handle the estimated costs."
                    .to_string(),
                &FULLY_COVERED_PLAN[..],
            ),
            FinanceTier::ManageableGap => (
                "There is a manageable gap based on your monthly income profile.".to_string(),
                &MANAGEABLE_GAP_PLAN[..],
            ),
            FinanceTier::HighRisk => (
                format!(
                    "High financial stress detected. The cost exceeds {} months of income.",
                    self.policy.income_multiplier
                ),
                &HIGH_RISK_PLAN[..],
            ),
        };

        debug!(
            predicted_avg_cost = request.predicted_avg_cost,
            insurance_coverage = request.insurance_coverage,
            monthly_income = request.monthly_income,
            coverage_gap = gap,
            tier = ?tier,
            "Finance tier selected"
        );

        FinanceRecommendation {
            recommendation,
            action_plan: plan.iter().map(|step| step.to_string()).collect(),
            coverage_gap: gap,
            tier,
        }
    }
}
