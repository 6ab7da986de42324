pub mod cost;
pub mod coverage;
pub mod error;
pub mod finance;
pub mod input;
pub mod policy;
pub mod runner;
pub mod scoring;
pub mod storage;
pub mod types;
pub mod wizard;

// Re-export commonly used types
pub use cost::{CostEstimator, CostStrategy, LookupMultiplierStrategy, RiskBlendStrategy};
pub use coverage::CoverageExplainer;
pub use error::{EstimateError, Result, ValidationError};
pub use finance::FinanceAdvisor;
pub use input::{RawCostRequest, RawFinanceRequest, RawIncome, RawInsuranceRequest, Scalar};
pub use policy::{CostPolicy, CostStrategyKind, EstimatorPolicy, FinancePolicy};
pub use runner::{DEFAULT_SESSION_TTL_SECS, WizardRunner};
pub use scoring::Scoring;
pub use storage::{InMemoryWizardStorage, WizardStorage};
pub use types::{
    CostEstimate, CostRequest, FinanceRecommendation, FinanceRequest, FinanceTier, HospitalType,
    InsuranceExplanation, InsuranceRequest, Region, RoomType, Sex, Smoker,
};
pub use wizard::{WizardInput, WizardSession, WizardStep};
