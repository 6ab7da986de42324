use serde::{Deserialize, Serialize};

/// Facility tier the patient intends to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HospitalType {
    Government,
    Private,
    Corporate,
}

impl HospitalType {
    pub const CHOICES: &'static [(&'static str, Self)] = &[
        ("Government", Self::Government),
        ("Private", Self::Private),
        ("Corporate", Self::Corporate),
    ];
}

/// Room category booked for the admission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomType {
    #[serde(rename = "General Ward")]
    GeneralWard,
    #[serde(rename = "Semi-Private")]
    SemiPrivate,
    #[serde(rename = "Private Suite")]
    PrivateSuite,
}

impl RoomType {
    pub const CHOICES: &'static [(&'static str, Self)] = &[
        ("General Ward", Self::GeneralWard),
        ("Semi-Private", Self::SemiPrivate),
        ("Private Suite", Self::PrivateSuite),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub const CHOICES: &'static [(&'static str, Self)] =
        &[("male", Self::Male), ("female", Self::Female)];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Smoker {
    Yes,
    No,
}

impl Smoker {
    pub const CHOICES: &'static [(&'static str, Self)] = &[("yes", Self::Yes), ("no", Self::No)];
}

/// Region used by the risk-score coefficients. Northeast is the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Northeast,
    Northwest,
    Southeast,
    Southwest,
}

impl Region {
    pub const CHOICES: &'static [(&'static str, Self)] = &[
        ("northeast", Self::Northeast),
        ("northwest", Self::Northwest),
        ("southeast", Self::Southeast),
        ("southwest", Self::Southwest),
    ];
}

/// Validated input for a cost estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRequest {
    pub condition: String,
    pub city: String,
    pub hospital_type: HospitalType,
    pub room_type: RoomType,
    pub age: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoker: Option<Smoker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
}

impl CostRequest {
    /// Request with only the required fields set
    pub fn new(
        condition: impl Into<String>,
        city: impl Into<String>,
        hospital_type: HospitalType,
        room_type: RoomType,
        age: u8,
    ) -> Self {
        Self {
            condition: condition.into(),
            city: city.into(),
            hospital_type,
            room_type,
            age,
            sex: None,
            bmi: None,
            children: None,
            smoker: None,
            region: None,
        }
    }
}

/// Cost band in whole currency units, `min_cost <= avg_cost <= max_cost`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub min_cost: u64,
    pub avg_cost: u64,
    pub max_cost: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InsuranceRequest {
    pub coverage_amount: f64,
    pub copay_percent: f64,
    /// Bill amount to price the copay against. Without it the
    /// out-of-pocket estimate stays at the 0 sentinel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceExplanation {
    pub explanation: String,
    pub out_of_pocket_estimate: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinanceRequest {
    pub predicted_avg_cost: f64,
    pub insurance_coverage: f64,
    pub monthly_income: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinanceTier {
    FullyCovered,
    ManageableGap,
    HighRisk,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceRecommendation {
    pub recommendation: String,
    /// Most urgent step first
    pub action_plan: Vec<String>,
    pub coverage_gap: f64,
    pub tier: FinanceTier,
}
