use tracing::debug;

use crate::types::{InsuranceExplanation, InsuranceRequest};

/// Explains what an insurance policy covers.
///
/// The explainer is not given the bill by default, so `out_of_pocket_estimate`
/// is the sentinel `0`. Callers that hold a cost estimate can pass it as
/// `estimated_cost` to get a priced figure instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageExplainer;

impl CoverageExplainer {
    pub fn new() -> Self {
        Self
    }

    pub fn explain(&self, request: &InsuranceRequest) -> InsuranceExplanation {
        let mut explanation = format!(
            "Your insurance covers up to ₹{}. ",
            request.coverage_amount
        );

        if request.copay_percent > 0.0 {
            explanation.push_str(&format!(
                "You have a {copay}% copay, which is common in Indian policies. \
                 You will pay {copay}% of the total bill.",
                copay = request.copay_percent
            ));
        } else {
            explanation
                .push_str("You have no copay, providing full coverage for allowable expenses.");
        }

        let out_of_pocket_estimate = request
            .estimated_cost
            .map(|bill| out_of_pocket(bill, request.coverage_amount, request.copay_percent))
            .unwrap_or(0);

        debug!(
            coverage_amount = request.coverage_amount,
            copay_percent = request.copay_percent,
            estimated_cost = ?request.estimated_cost,
            out_of_pocket_estimate,
            "Coverage explained"
        );

        InsuranceExplanation {
            explanation,
            out_of_pocket_estimate,
        }
    }
}

/// Uncovered remainder plus the copay share of the covered part
fn out_of_pocket(bill: f64, coverage: f64, copay_percent: f64) -> u64 {
    let covered = bill.min(coverage);
    let uncovered = bill - covered;
    (uncovered + covered * copay_percent / 100.0).max(0.0).round() as u64
}
