//! Caller-side sequencing of the three scoring calls.
//!
//! A [`WizardSession`] walks Medical -> Insurance -> Finance -> Results and
//! holds every accepted input and result. The scoring functions stay pure; the
//! session is what forwards `avg_cost` and the coverage amount into the later
//! steps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EstimateError, Result};
use crate::scoring::Scoring;
use crate::types::{
    CostEstimate, CostRequest, FinanceRecommendation, FinanceRequest, InsuranceExplanation,
    InsuranceRequest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Medical,
    Insurance,
    Finance,
    Results,
}

/// One submission to a wizard session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum WizardInput {
    Medical(CostRequest),
    Insurance(InsuranceRequest),
    Finance { monthly_income: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardSession {
    pub id: String,
    /// Next step expecting input
    pub step: WizardStep,
    pub created_at: DateTime<Utc>,
    pub medical: Option<CostRequest>,
    pub prediction: Option<CostEstimate>,
    pub insurance: Option<InsuranceRequest>,
    pub coverage: Option<InsuranceExplanation>,
    pub monthly_income: Option<f64>,
    pub recommendation: Option<FinanceRecommendation>,
}

impl WizardSession {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            step: WizardStep::Medical,
            created_at: Utc::now(),
            medical: None,
            prediction: None,
            insurance: None,
            coverage: None,
            monthly_income: None,
            recommendation: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.step == WizardStep::Results
    }

    pub fn apply(&mut self, input: WizardInput, scoring: &Scoring) -> Result<()> {
        match input {
            WizardInput::Medical(request) => {
                self.submit_medical(request, scoring);
            }
            WizardInput::Insurance(request) => {
                self.submit_insurance(request, scoring)?;
            }
            WizardInput::Finance { monthly_income } => {
                self.submit_finance(monthly_income, scoring)?;
            }
        }
        Ok(())
    }

    /// Step 1. Re-submitting discards everything computed after it.
    pub fn submit_medical(&mut self, request: CostRequest, scoring: &Scoring) -> CostEstimate {
        let estimate = scoring.estimate(&request);
        self.medical = Some(request);
        self.prediction = Some(estimate);
        self.insurance = None;
        self.coverage = None;
        self.clear_finance();
        self.step = WizardStep::Insurance;
        estimate
    }

    /// Step 2. The held average cost is forwarded so the explanation carries
    /// a priced out-of-pocket figure.
    pub fn submit_insurance(
        &mut self,
        mut request: InsuranceRequest,
        scoring: &Scoring,
    ) -> Result<InsuranceExplanation> {
        let prediction = self.prediction.ok_or_else(|| {
            EstimateError::Wizard("submit medical details before insurance".to_string())
        })?;

        request.estimated_cost = Some(prediction.avg_cost as f64);
        let explanation = scoring.explain(&request);
        self.insurance = Some(request);
        self.coverage = Some(explanation.clone());
        self.clear_finance();
        self.step = WizardStep::Finance;
        Ok(explanation)
    }

    /// Step 3
    pub fn submit_finance(
        &mut self,
        monthly_income: f64,
        scoring: &Scoring,
    ) -> Result<FinanceRecommendation> {
        let request = self.finance_request(monthly_income)?;
        let recommendation = scoring.recommend(&request);
        self.monthly_income = Some(monthly_income);
        self.recommendation = Some(recommendation.clone());
        self.step = WizardStep::Results;
        Ok(recommendation)
    }

    /// Assembles the finance request from the held results and new income
    pub fn finance_request(&self, monthly_income: f64) -> Result<FinanceRequest> {
        let prediction = self.prediction.ok_or_else(|| {
            EstimateError::Wizard("submit medical details before finances".to_string())
        })?;
        let insurance = self.insurance.ok_or_else(|| {
            EstimateError::Wizard("submit insurance details before finances".to_string())
        })?;

        Ok(FinanceRequest {
            predicted_avg_cost: prediction.avg_cost as f64,
            insurance_coverage: insurance.coverage_amount,
            monthly_income,
        })
    }

    fn clear_finance(&mut self) {
        self.monthly_income = None;
        self.recommendation = None;
    }
}

impl Default for WizardSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FinanceTier, HospitalType, RoomType};

    fn medical() -> CostRequest {
        CostRequest::new(
            "knee_replacement",
            "Jaipur",
            HospitalType::Private,
            RoomType::SemiPrivate,
            45,
        )
    }

    fn insurance(coverage_amount: f64) -> InsuranceRequest {
        InsuranceRequest {
            coverage_amount,
            copay_percent: 10.0,
            estimated_cost: None,
        }
    }

    #[test]
    fn test_walks_all_steps_forwarding_results() {
        let scoring = Scoring::default();
        let mut session = WizardSession::new();
        assert_eq!(session.step, WizardStep::Medical);

        let estimate = session.submit_medical(medical(), &scoring);
        assert_eq!(estimate.avg_cost, 385_000);
        assert_eq!(session.step, WizardStep::Insurance);

        let explanation = session.submit_insurance(insurance(300_000.0), &scoring).unwrap();
        // 85000 uncovered + 10% of 300000
        assert_eq!(explanation.out_of_pocket_estimate, 115_000);
        assert_eq!(session.insurance.unwrap().estimated_cost, Some(385_000.0));

        let advice = session.submit_finance(40_000.0, &scoring).unwrap();
        assert_eq!(advice.coverage_gap, 85_000.0);
        assert_eq!(advice.tier, FinanceTier::HighRisk);
        assert!(session.is_complete());
    }

    #[test]
    fn test_steps_must_follow_order() {
        let scoring = Scoring::default();
        let mut session = WizardSession::new();

        let err = session.submit_insurance(insurance(1.0), &scoring).unwrap_err();
        assert!(matches!(err, EstimateError::Wizard(_)));

        session.submit_medical(medical(), &scoring);
        let err = session.submit_finance(40_000.0, &scoring).unwrap_err();
        assert!(matches!(err, EstimateError::Wizard(msg) if msg.contains("insurance")));
        assert_eq!(session.step, WizardStep::Insurance);
    }

    #[test]
    fn test_resubmitting_medical_rewinds() {
        let scoring = Scoring::default();
        let mut session = WizardSession::new();
        session.submit_medical(medical(), &scoring);
        session.submit_insurance(insurance(500_000.0), &scoring).unwrap();
        session.submit_finance(40_000.0, &scoring).unwrap();

        session.apply(WizardInput::Medical(medical()), &scoring).unwrap();
        assert_eq!(session.step, WizardStep::Insurance);
        assert!(session.insurance.is_none());
        assert!(session.coverage.is_none());
        assert!(session.recommendation.is_none());
    }

    #[test]
    fn test_covered_patient_ends_fully_covered() {
        let scoring = Scoring::default();
        let mut session = WizardSession::with_id("fixed");
        session.apply(WizardInput::Medical(medical()), &scoring).unwrap();
        session
            .apply(WizardInput::Insurance(insurance(1_000_000.0)), &scoring)
            .unwrap();
        session
            .apply(WizardInput::Finance { monthly_income: 0.0 }, &scoring)
            .unwrap();

        let advice = session.recommendation.unwrap();
        assert_eq!(advice.tier, FinanceTier::FullyCovered);
        assert_eq!(advice.action_plan.len(), 3);
        assert_eq!(session.id, "fixed");
    }

    #[test]
    fn test_input_is_tagged_by_step() {
        let input: WizardInput =
            serde_json::from_str(r#"{ "step": "finance", "monthly_income": 25000 }"#).unwrap();
        assert_eq!(
            input,
            WizardInput::Finance {
                monthly_income: 25_000.0
            }
        );
    }
}
