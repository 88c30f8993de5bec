//! Profile collector: raw form fields → validated [`UserProfile`].
//!
//! Pure validation, no I/O. Every field is checked even after the first
//! failure so the caller can show all problems at once.

use crate::error::{FieldError, ProfileField, ValidationError};
use crate::output::{Category, Gender, IndianState, UserProfile};
use serde::{Deserialize, Serialize};

/// Oldest accepted age.
pub const MAX_AGE: u32 = 120;

/// Unvalidated form input, exactly as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProfile {
    pub age: String,
    pub annual_income: String,
    pub category: String,
    pub state: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
}

impl RawProfile {
    /// The four required fields; the optional ones start empty.
    pub fn new(
        age: impl Into<String>,
        annual_income: impl Into<String>,
        category: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            age: age.into(),
            annual_income: annual_income.into(),
            category: category.into(),
            state: state.into(),
            ..Default::default()
        }
    }
}

/// Validate `raw` into a [`UserProfile`].
///
/// # Errors
/// A [`ValidationError`] with one entry per invalid field, in form order.
pub fn collect_profile(raw: &RawProfile) -> Result<UserProfile, ValidationError> {
    let mut errors = Vec::new();
    let mut fail = |field: ProfileField, message: String| {
        errors.push(FieldError { field, message });
    };

    let age = parse_age(&raw.age).map_err(|m| fail(ProfileField::Age, m)).ok();
    let annual_income = parse_income(&raw.annual_income)
        .map_err(|m| fail(ProfileField::AnnualIncome, m))
        .ok();
    let category = raw
        .category
        .parse::<Category>()
        .map_err(|m| fail(ProfileField::Category, m))
        .ok();
    let state = raw
        .state
        .parse::<IndianState>()
        .map_err(|m| fail(ProfileField::State, m))
        .ok();
    let gender = match optional(&raw.gender) {
        Some(g) => g
            .parse::<Gender>()
            .map(Some)
            .map_err(|m| fail(ProfileField::Gender, m))
            .unwrap_or(None),
        None => None,
    };

    match (age, annual_income, category, state) {
        (Some(age), Some(annual_income), Some(category), Some(state)) if errors.is_empty() => {
            Ok(UserProfile {
                age,
                annual_income,
                category,
                state,
                gender,
                occupation: optional(&raw.occupation),
                education: optional(&raw.education),
            })
        }
        _ => Err(ValidationError { errors }),
    }
}

fn parse_age(raw: &str) -> Result<u32, String> {
    let s = raw.trim();
    if s.is_empty() {
        return Err("is required".to_string());
    }
    if s.starts_with('-') {
        return Err(format!("must not be negative (got {s})"));
    }
    let age: u32 = s
        .parse()
        .map_err(|_| format!("must be a whole number of years (got '{s}')"))?;
    if age > MAX_AGE {
        return Err(format!("must be at most {MAX_AGE} (got {age})"));
    }
    Ok(age)
}

/// Accepts `80000`, `80,000`, `₹80,000`, `Rs. 80000`, `INR 80_000`.
fn parse_income(raw: &str) -> Result<u64, String> {
    let mut s = raw.trim();
    for prefix in ["₹", "Rs.", "Rs", "INR", "rs.", "rs", "inr"] {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest.trim_start();
            break;
        }
    }
    if s.is_empty() {
        return Err("is required".to_string());
    }
    if s.starts_with('-') {
        return Err(format!("must not be negative (got {})", raw.trim()));
    }
    let digits: String = s.chars().filter(|c| *c != ',' && *c != '_').collect();
    digits
        .parse()
        .map_err(|_| format!("must be a whole number of rupees (got '{}')", raw.trim()))
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
