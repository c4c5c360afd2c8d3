/// Boundary validation failures raised before any scorer runs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("please answer every question in: {}", .sections.join(", "))]
    Incomplete { sections: Vec<&'static str> },
    #[error("{field} must be a positive number (found {found})")]
    NonPositive { field: &'static str, found: f64 },
    #[error("{field} must be between {min} and {max} (found {found})")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        found: f64,
    },
    #[error("stress ratings must be between 0 and 3 (found {found})")]
    RatingOutOfRange { found: u8 },
    #[error("consent is required before starting the assessment")]
    ConsentRequired,
}

impl ValidationError {
    /// Section names the caller still has to finish, in questionnaire order.
    pub fn unfinished_sections(&self) -> &[&'static str] {
        match self {
            ValidationError::Incomplete { sections } => sections,
            _ => &[],
        }
    }
}

pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    // NaN fails the comparison and lands here as well.
    if !(value > 0.0) {
        return Err(ValidationError::NonPositive {
            field,
            found: value,
        });
    }
    Ok(value)
}

pub(crate) fn require_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<f64, ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            found: value,
        });
    }
    Ok(value)
}

/// Collects the names of unanswered sections while drafts are being completed.
#[derive(Debug, Default)]
pub(crate) struct Completeness {
    missing: Vec<&'static str>,
}

impl Completeness {
    pub(crate) fn check<T>(&mut self, section: &'static str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.missing.push(section);
        }
        value
    }

    pub(crate) fn finish<T>(self, value: Option<T>) -> Result<T, ValidationError> {
        match value {
            Some(value) if self.missing.is_empty() => Ok(value),
            _ => Err(ValidationError::Incomplete {
                sections: self.missing,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_message_lists_sections_in_order() {
        let error = ValidationError::Incomplete {
            sections: vec!["3.1 sweet consumption habits", "3.3 sodium consumption habits"],
        };
        assert_eq!(
            error.to_string(),
            "please answer every question in: 3.1 sweet consumption habits, 3.3 sodium consumption habits"
        );
        assert_eq!(error.unfinished_sections().len(), 2);
    }

    #[test]
    fn positive_check_rejects_zero_and_nan() {
        assert!(require_positive("height_cm", 0.0).is_err());
        assert!(require_positive("height_cm", f64::NAN).is_err());
        assert_eq!(require_positive("height_cm", 170.0), Ok(170.0));
    }

    #[test]
    fn completeness_reports_every_missing_section() {
        let mut completeness = Completeness::default();
        let first = completeness.check("first", Some(1));
        let second: Option<u8> = completeness.check("second", None);
        let third: Option<u8> = completeness.check("third", None);
        let combined = first.zip(second).zip(third);

        match completeness.finish(combined) {
            Err(ValidationError::Incomplete { sections }) => {
                assert_eq!(sections, vec!["second", "third"]);
            }
            other => panic!("expected incomplete error, got {other:?}"),
        }
    }
}
