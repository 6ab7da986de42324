//! Wire-level request bodies and their validation.
//!
//! Form inputs arrive loosely typed: a numeric field may be a JSON number or
//! a string holding one. Each raw body is coerced and range-checked into its
//! typed request, reporting only the first invalid field in declaration order.
//! Any other JSON type still deserializes, so it is rejected here by field name.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::types::{
    CostRequest, FinanceRequest, HospitalType, InsuranceRequest, Region, RoomType, Sex, Smoker,
};

/// A JSON field that is either a number or text, or anything else the
/// client sent in its place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
    Other(Value),
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

type FieldResult<T> = std::result::Result<T, ValidationError>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCostRequest {
    pub condition: Option<Scalar>,
    pub city: Option<Scalar>,
    pub hospital_type: Option<Scalar>,
    pub room_type: Option<Scalar>,
    pub age: Option<Scalar>,
    pub sex: Option<Scalar>,
    pub bmi: Option<Scalar>,
    pub children: Option<Scalar>,
    pub smoker: Option<Scalar>,
    pub region: Option<Scalar>,
}

impl RawCostRequest {
    pub fn validate(&self) -> FieldResult<CostRequest> {
        let condition = required_text("condition", &self.condition)?;
        let city = required_text("city", &self.city)?;
        let hospital_type =
            required_choice("hospital_type", &self.hospital_type, HospitalType::CHOICES)?;
        let room_type = required_choice("room_type", &self.room_type, RoomType::CHOICES)?;

        let age = required_number("age", &self.age)?;
        let age = whole_in_range("age", age, 0.0, 120.0)? as u8;

        let sex = optional_choice("sex", &self.sex, Sex::CHOICES)?;

        let bmi = optional_number("bmi", &self.bmi)?;
        if let Some(bmi) = bmi {
            if bmi <= 0.0 || bmi > 100.0 {
                return Err(ValidationError::new(
                    "bmi",
                    "bmi must be greater than 0 and at most 100",
                ));
            }
        }

        let children = optional_number("children", &self.children)?
            .map(|children| whole_in_range("children", children, 0.0, 20.0))
            .transpose()?
            .map(|children| children as u8);

        let smoker = optional_choice("smoker", &self.smoker, Smoker::CHOICES)?;
        let region = optional_choice("region", &self.region, Region::CHOICES)?;

        Ok(CostRequest {
            condition,
            city,
            hospital_type,
            room_type,
            age,
            sex,
            bmi,
            children,
            smoker,
            region,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawInsuranceRequest {
    pub coverage_amount: Option<Scalar>,
    pub copay_percent: Option<Scalar>,
    pub estimated_cost: Option<Scalar>,
}

impl RawInsuranceRequest {
    pub fn validate(&self) -> FieldResult<InsuranceRequest> {
        let coverage_amount = non_negative("coverage_amount", &self.coverage_amount)?;

        let copay_percent = required_number("copay_percent", &self.copay_percent)?;
        if !(0.0..=100.0).contains(&copay_percent) {
            return Err(ValidationError::new(
                "copay_percent",
                "copay_percent must be between 0 and 100",
            ));
        }

        let estimated_cost = optional_number("estimated_cost", &self.estimated_cost)?;
        if estimated_cost.is_some_and(|cost| cost < 0.0) {
            return Err(ValidationError::new(
                "estimated_cost",
                "estimated_cost must be at least 0",
            ));
        }

        Ok(InsuranceRequest {
            coverage_amount,
            copay_percent,
            estimated_cost,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFinanceRequest {
    pub predicted_avg_cost: Option<Scalar>,
    pub insurance_coverage: Option<Scalar>,
    pub monthly_income: Option<Scalar>,
}

impl RawFinanceRequest {
    pub fn validate(&self) -> FieldResult<FinanceRequest> {
        Ok(FinanceRequest {
            predicted_avg_cost: non_negative("predicted_avg_cost", &self.predicted_avg_cost)?,
            insurance_coverage: non_negative("insurance_coverage", &self.insurance_coverage)?,
            monthly_income: non_negative("monthly_income", &self.monthly_income)?,
        })
    }
}

/// Final wizard step, the only new input is income
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawIncome {
    pub monthly_income: Option<Scalar>,
}

impl RawIncome {
    pub fn validate(&self) -> FieldResult<f64> {
        non_negative("monthly_income", &self.monthly_income)
    }
}

fn missing(field: &str) -> ValidationError {
    ValidationError::new(field, format!("{field} is required"))
}

fn not_a_string(field: &str) -> ValidationError {
    ValidationError::new(field, format!("{field} must be a string"))
}

fn not_a_number(field: &str) -> ValidationError {
    ValidationError::new(field, format!("{field} must be a number"))
}

fn required_text(field: &str, raw: &Option<Scalar>) -> FieldResult<String> {
    match raw {
        Some(Scalar::Text(text)) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        Some(Scalar::Number(_) | Scalar::Other(_)) => Err(not_a_string(field)),
        _ => Err(missing(field)),
    }
}

fn parse_number(field: &str, raw: &Scalar) -> FieldResult<f64> {
    let value = match raw {
        Scalar::Number(value) => *value,
        Scalar::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| not_a_number(field))?,
        Scalar::Other(_) => return Err(not_a_number(field)),
    };
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::new(
            field,
            format!("{field} must be a finite number"),
        ))
    }
}

fn required_number(field: &str, raw: &Option<Scalar>) -> FieldResult<f64> {
    match raw {
        Some(raw) => parse_number(field, raw),
        None => Err(missing(field)),
    }
}

/// Absent, null and blank are all "not provided"
fn optional_number(field: &str, raw: &Option<Scalar>) -> FieldResult<Option<f64>> {
    match raw {
        None => Ok(None),
        Some(Scalar::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(raw) => parse_number(field, raw).map(Some),
    }
}

fn non_negative(field: &str, raw: &Option<Scalar>) -> FieldResult<f64> {
    let value = required_number(field, raw)?;
    if value < 0.0 {
        return Err(ValidationError::new(
            field,
            format!("{field} must be at least 0"),
        ));
    }
    Ok(value)
}

fn whole_in_range(field: &str, value: f64, min: f64, max: f64) -> FieldResult<f64> {
    if value.fract() != 0.0 {
        return Err(ValidationError::new(
            field,
            format!("{field} must be a whole number"),
        ));
    }
    if value < min || value > max {
        return Err(ValidationError::new(
            field,
            format!("{field} must be between {min} and {max}"),
        ));
    }
    Ok(value)
}

fn match_choice<T: Copy>(field: &str, text: &str, choices: &[(&str, T)]) -> FieldResult<T> {
    let text = text.trim();
    choices
        .iter()
        .find(|(label, _)| label.eq_ignore_ascii_case(text))
        .map(|(_, value)| *value)
        .ok_or_else(|| {
            let labels: Vec<&str> = choices.iter().map(|(label, _)| *label).collect();
            ValidationError::new(
                field,
                format!("{field} must be one of: {}", labels.join(", ")),
            )
        })
}

fn required_choice<T: Copy>(
    field: &str,
    raw: &Option<Scalar>,
    choices: &[(&str, T)],
) -> FieldResult<T> {
    let text = required_text(field, raw)?;
    match_choice(field, &text, choices)
}

fn optional_choice<T: Copy>(
    field: &str,
    raw: &Option<Scalar>,
    choices: &[(&str, T)],
) -> FieldResult<Option<T>> {
    match raw {
        None => Ok(None),
        Some(Scalar::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Scalar::Text(text)) => match_choice(field, text, choices).map(Some),
        Some(Scalar::Number(_) | Scalar::Other(_)) => Err(not_a_string(field)),
    }
}
