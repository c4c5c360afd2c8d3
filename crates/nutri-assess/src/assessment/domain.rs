use serde::{Deserialize, Serialize};

use super::validation::{require_positive, require_range, Completeness, ValidationError};

/// Identifier wrapper for assessment records.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssessmentId(pub String);

pub const HEIGHT_SECTION: &str = "2.4 height";
pub const WEIGHT_SECTION: &str = "2.5 weight";
pub const SWEET_SECTION: &str = "3.1 sweet consumption habits";
pub const FAT_SECTION: &str = "3.2 fat consumption habits";
pub const SODIUM_SECTION: &str = "3.3 sodium consumption habits";
pub const KNOWLEDGE_SECTION: &str = "4.1 healthy weight practices";
pub const WEIGHT_PERCEPTION_SECTION: &str = "4.2 weight perception";
pub const DAILY_ENERGY_SECTION: &str = "4.3 daily energy";
pub const STRESS_SECTION: &str = "5 stress symptoms";

/// Declares a questionnaire section as a complete record plus a draft whose
/// answers may still be missing. Scorers only ever see the complete record.
macro_rules! answer_section {
    (@count $field:ident) => { 1usize };
    (
        $(#[$meta:meta])*
        $name:ident, $draft:ident: $option:ty {
            $($field:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            $(pub $field: $option,)+
        }

        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $draft {
            $(pub $field: Option<$option>,)+
        }

        impl $name {
            pub const QUESTION_COUNT: usize = 0 $(+ answer_section!(@count $field))+;

            pub fn answers(&self) -> [$option; 0 $(+ answer_section!(@count $field))+] {
                [$(self.$field),+]
            }
        }

        impl $draft {
            pub fn complete(self) -> Option<$name> {
                Some($name {
                    $($field: self.$field?,)+
                })
            }
        }

        impl From<$name> for $draft {
            fn from(value: $name) -> Self {
                Self {
                    $($field: Some(value.$field),)+
                }
            }
        }
    };
}

/// How often a consumption habit occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Every day or almost every day.
    Daily,
    ThreeToFourPerWeek,
    RarelyOrNever,
}

impl Frequency {
    pub const fn weight(self) -> u32 {
        match self {
            Frequency::Daily => 3,
            Frequency::ThreeToFourPerWeek => 2,
            Frequency::RarelyOrNever => 1,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Frequency::Daily => "most/almost daily",
            Frequency::ThreeToFourPerWeek => "3-4 times/week",
            Frequency::RarelyOrNever => "rarely/never",
        }
    }
}

answer_section! {
    /// 3.1 sugar intake habits.
    SweetHabits, SweetHabitsDraft: Frequency {
        water,
        soft_drinks,
        fruit_juice,
        desserts,
        sugar_addition,
    }
}

answer_section! {
    /// 3.2 fat intake habits.
    FatHabits, FatHabitsDraft: Frequency {
        lean_meat,
        fried_food,
        high_fat_dishes,
        sweet_drinks,
        soup_gravy,
    }
}

answer_section! {
    /// 3.3 sodium intake habits.
    SodiumHabits, SodiumHabitsDraft: Frequency {
        taste_before_season,
        herbs_spices,
        processed_meat,
        instant_food,
        pickled_food,
    }
}

/// Consumption habits questionnaire (part 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionAnswers {
    #[serde(rename = "section_3_1")]
    pub sweet: SweetHabits,
    #[serde(rename = "section_3_2")]
    pub fat: FatHabits,
    #[serde(rename = "section_3_3")]
    pub sodium: SodiumHabits,
}

impl ConsumptionAnswers {
    pub fn frequencies(&self) -> impl Iterator<Item = Frequency> {
        self.sweet
            .answers()
            .into_iter()
            .chain(self.fat.answers())
            .chain(self.sodium.answers())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumptionDraft {
    #[serde(rename = "section_3_1")]
    pub sweet: SweetHabitsDraft,
    #[serde(rename = "section_3_2")]
    pub fat: FatHabitsDraft,
    #[serde(rename = "section_3_3")]
    pub sodium: SodiumHabitsDraft,
}

impl TryFrom<ConsumptionDraft> for ConsumptionAnswers {
    type Error = ValidationError;

    fn try_from(draft: ConsumptionDraft) -> Result<Self, Self::Error> {
        let mut completeness = Completeness::default();
        let sweet = completeness.check(SWEET_SECTION, draft.sweet.complete());
        let fat = completeness.check(FAT_SECTION, draft.fat.complete());
        let sodium = completeness.check(SODIUM_SECTION, draft.sodium.complete());

        let (sweet, fat, sodium) =
            completeness.finish(sweet.zip(fat).zip(sodium).map(|((a, b), c)| (a, b, c)))?;
        Ok(Self { sweet, fat, sodium })
    }
}

impl From<ConsumptionAnswers> for ConsumptionDraft {
    fn from(answers: ConsumptionAnswers) -> Self {
        Self {
            sweet: answers.sweet.into(),
            fat: answers.fat.into(),
            sodium: answers.sodium.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeAnswer {
    Yes,
    No,
    Unsure,
}

answer_section! {
    /// 4.1 practices for keeping a healthy weight: avoiding meals in front of the TV,
    /// reading food labels, taking supplements, tracking intake, weighing regularly,
    /// and grazing throughout the day.
    KnowledgeAnswers, KnowledgeDraft: KnowledgeAnswer {
        knowledge_1,
        knowledge_2,
        knowledge_3,
        knowledge_4,
        knowledge_5,
        knowledge_6,
    }
}

/// How respondents judge their own weight (4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightPerception {
    Much,
    Normal,
    Less,
}

/// How respondents describe their day-to-day energy (4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyLevel {
    Tired,
    Normal,
    Energetic,
    Unsure,
}

/// Nutrition knowledge, skills, and perception questionnaire (part 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionAnswers {
    #[serde(rename = "section_4_1")]
    pub knowledge: KnowledgeAnswers,
    pub water_intake: WeightPerception,
    pub food_selection: EnergyLevel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionDraft {
    #[serde(rename = "section_4_1")]
    pub knowledge: KnowledgeDraft,
    pub water_intake: Option<WeightPerception>,
    pub food_selection: Option<EnergyLevel>,
}

impl TryFrom<NutritionDraft> for NutritionAnswers {
    type Error = ValidationError;

    fn try_from(draft: NutritionDraft) -> Result<Self, Self::Error> {
        let mut completeness = Completeness::default();
        let knowledge = completeness.check(KNOWLEDGE_SECTION, draft.knowledge.complete());
        let water_intake = completeness.check(WEIGHT_PERCEPTION_SECTION, draft.water_intake);
        let food_selection = completeness.check(DAILY_ENERGY_SECTION, draft.food_selection);

        let ((knowledge, water_intake), food_selection) =
            completeness.finish(knowledge.zip(water_intake).zip(food_selection))?;
        Ok(Self {
            knowledge,
            water_intake,
            food_selection,
        })
    }
}

impl From<NutritionAnswers> for NutritionDraft {
    fn from(answers: NutritionAnswers) -> Self {
        Self {
            knowledge: answers.knowledge.into(),
            water_intake: Some(answers.water_intake),
            food_selection: Some(answers.food_selection),
        }
    }
}

/// Self-rated symptom intensity, 0 (never) through 3 (most of the time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct StressRating(u8);

impl StressRating {
    pub const MAX: u8 = 3;

    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if value > Self::MAX {
            return Err(ValidationError::RatingOutOfRange { found: value });
        }
        Ok(Self(value))
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for StressRating {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StressRating> for u8 {
    fn from(rating: StressRating) -> Self {
        rating.0
    }
}

answer_section! {
    /// Symptoms over the last two to four weeks: sleep problems, poor concentration,
    /// irritability or anxiety, boredom, and social withdrawal.
    StressAnswers, StressDraft: StressRating {
        stress_1,
        stress_2,
        stress_3,
        stress_4,
        stress_5,
    }
}

impl TryFrom<StressDraft> for StressAnswers {
    type Error = ValidationError;

    fn try_from(draft: StressDraft) -> Result<Self, Self::Error> {
        let mut completeness = Completeness::default();
        let answers = completeness.check(STRESS_SECTION, draft.complete());
        completeness.finish(answers)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MedicalCondition {
    Diabetes,
    Hypertension,
    HeartDisease,
    Cancer,
    SexuallyTransmittedInfection,
    Respiratory,
    Digestive,
    Depression,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Medication {
    Insulin,
    LipidLowering,
    Antihypertensive,
    Antihistamine,
    Antidepressant,
    Other(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurgeryHistory {
    pub had_surgery: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Personal information (part 2). Empty condition/medication lists mean "none".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub age: u8,
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender_other: Option<String>,
    pub year_of_study: u8,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub faculty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,
    #[serde(default)]
    pub medical_conditions: Vec<MedicalCondition>,
    #[serde(default)]
    pub current_medications: Vec<Medication>,
    #[serde(default)]
    pub surgery_history: SurgeryHistory,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfoDraft {
    pub age: Option<u8>,
    pub gender: Option<Gender>,
    pub gender_other: Option<String>,
    pub year_of_study: Option<u8>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub faculty: Option<String>,
    pub major: Option<String>,
    pub medical_conditions: Vec<MedicalCondition>,
    pub current_medications: Vec<Medication>,
    pub surgery_history: SurgeryHistory,
}

impl TryFrom<PersonalInfoDraft> for PersonalInfo {
    type Error = ValidationError;

    fn try_from(draft: PersonalInfoDraft) -> Result<Self, Self::Error> {
        let mut completeness = Completeness::default();
        let age = completeness.check("2.1 age", draft.age);
        let gender = completeness.check("2.2 gender", draft.gender);
        let year_of_study = completeness.check("2.3 year of study", draft.year_of_study);
        let height_cm = completeness.check(HEIGHT_SECTION, draft.height_cm);
        let weight_kg = completeness.check(WEIGHT_SECTION, draft.weight_kg);
        let faculty = completeness.check(
            "2.6 faculty",
            draft.faculty.filter(|faculty| !faculty.trim().is_empty()),
        );

        let (((((age, gender), year_of_study), height_cm), weight_kg), faculty) = completeness
            .finish(
                age.zip(gender)
                    .zip(year_of_study)
                    .zip(height_cm)
                    .zip(weight_kg)
                    .zip(faculty),
            )?;

        require_range("age", f64::from(age), 1.0, 100.0)?;
        require_range("year_of_study", f64::from(year_of_study), 1.0, 6.0)?;
        let height_cm = require_positive("height_cm", height_cm)
            .and_then(|height| require_range("height_cm", height, 100.0, 250.0))?;
        let weight_kg = require_positive("weight_kg", weight_kg)
            .and_then(|weight| require_range("weight_kg", weight, 30.0, 200.0))?;

        let gender_other = match gender {
            Gender::Other => draft.gender_other.filter(|value| !value.trim().is_empty()),
            Gender::Male | Gender::Female => None,
        };

        Ok(Self {
            age,
            gender,
            gender_other,
            year_of_study,
            height_cm,
            weight_kg,
            faculty,
            major: draft.major.filter(|major| !major.trim().is_empty()),
            medical_conditions: draft.medical_conditions,
            current_medications: draft.current_medications,
            surgery_history: draft.surgery_history,
        })
    }
}
