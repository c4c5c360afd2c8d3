use serde::{Deserialize, Serialize};

use super::super::validation::{require_positive, ValidationError};
use super::classify::BmiCategory;

/// Body mass index rounded to two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bmi(f64);

impl Bmi {
    /// Computes `weight / (height_m)^2`. Heights and weights must be positive.
    pub fn calculate(height_cm: f64, weight_kg: f64) -> Result<Self, ValidationError> {
        let height_cm = require_positive("height_cm", height_cm)?;
        let weight_kg = require_positive("weight_kg", weight_kg)?;

        let height_m = height_cm / 100.0;
        let raw = weight_kg / (height_m * height_m);
        if !raw.is_finite() {
            return Err(ValidationError::NonPositive {
                field: "height_cm",
                found: height_cm,
            });
        }

        Ok(Self((raw * 100.0).round() / 100.0))
    }

    /// Wraps a previously computed value, e.g. one read back from storage.
    pub fn from_stored(value: f64) -> Result<Self, ValidationError> {
        require_positive("bmi", value).map(Self)
    }

    pub const fn value(self) -> f64 {
        self.0
    }

    pub fn category(self) -> BmiCategory {
        BmiCategory::from_bmi(self.0)
    }
}
