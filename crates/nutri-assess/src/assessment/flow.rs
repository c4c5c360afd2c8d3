use serde::{Deserialize, Serialize};
use std::fmt;

use super::domain::AssessmentId;
use super::repository::{AssessmentRecord, AssessmentStatus};

/// Questionnaire pages in the order a respondent walks through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStep {
    Consent,
    PersonalInfo,
    Consumption,
    NutritionKnowledge,
    Stress,
    Results,
}

impl AssessmentStep {
    pub const ALL: [AssessmentStep; 6] = [
        AssessmentStep::Consent,
        AssessmentStep::PersonalInfo,
        AssessmentStep::Consumption,
        AssessmentStep::NutritionKnowledge,
        AssessmentStep::Stress,
        AssessmentStep::Results,
    ];

    fn position(self) -> usize {
        self as usize
    }

    /// `None` once the results page is reached.
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.position() + 1).copied()
    }

    pub fn previous(self) -> Option<Self> {
        self.position()
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index).copied())
    }

    pub const fn label(self) -> &'static str {
        match self {
            AssessmentStep::Consent => "consent",
            AssessmentStep::PersonalInfo => "personal information",
            AssessmentStep::Consumption => "consumption habits",
            AssessmentStep::NutritionKnowledge => "nutrition knowledge",
            AssessmentStep::Stress => "stress",
            AssessmentStep::Results => "results",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == AssessmentStep::Results
    }
}

impl fmt::Display for AssessmentStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raised when a page is submitted before the pages preceding it were saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{requested} is not available yet; please complete {required} first")]
pub struct OutOfOrder {
    pub requested: AssessmentStep,
    pub required: AssessmentStep,
}

/// First page whose data has not been saved yet. A record only exists once consent
/// was given, so this is never [`AssessmentStep::Consent`].
pub fn current_step(record: &AssessmentRecord) -> AssessmentStep {
    if record.status == AssessmentStatus::Completed {
        AssessmentStep::Results
    } else if record.personal_info.is_none() {
        AssessmentStep::PersonalInfo
    } else if record.consumption.is_none() {
        AssessmentStep::Consumption
    } else if record.nutrition.is_none() {
        AssessmentStep::NutritionKnowledge
    } else {
        AssessmentStep::Stress
    }
}

/// Earlier pages may always be revisited; later pages only once everything before
/// them is saved.
pub fn ensure_reachable(
    record: &AssessmentRecord,
    requested: AssessmentStep,
) -> Result<(), OutOfOrder> {
    let current = current_step(record);
    if requested <= current {
        Ok(())
    } else {
        Err(OutOfOrder {
            requested,
            required: current,
        })
    }
}

/// Snapshot of where a respondent is in the questionnaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssessmentProgress {
    pub assessment_id: AssessmentId,
    pub status: AssessmentStatus,
    pub current_step: AssessmentStep,
    pub completed_steps: Vec<AssessmentStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_step: Option<AssessmentStep>,
}

impl AssessmentProgress {
    pub fn of(record: &AssessmentRecord) -> Self {
        let current_step = current_step(record);
        let completed_steps = AssessmentStep::ALL
            .into_iter()
            .take_while(|step| *step < current_step)
            .collect();

        Self {
            assessment_id: record.id.clone(),
            status: record.status,
            current_step,
            completed_steps,
            previous_step: current_step.previous(),
        }
    }
}
