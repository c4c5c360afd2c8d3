use crate::infra::{InMemoryAssessmentRepository, InMemoryOtpOutbox, InMemoryUserRepository};
use clap::Args;
use nutri_assess::assessment::domain::{FatHabits, KnowledgeAnswers, SodiumHabits, SweetHabits};
use nutri_assess::assessment::{
    score_respondents, write_scores, AssessmentService, AssessmentServiceError, AssessmentSummary,
    ConsumptionAnswers, ConsumptionDraft, EnergyLevel, Frequency, Gender, KnowledgeAnswer,
    NutritionAnswers, NutritionDraft, PersonalInfoDraft, StressDraft, StressRating,
    WeightPerception,
};
use nutri_assess::auth::{AuthService, Credentials, PasswordReset, Registration, Role};
use nutri_assess::config::AuthConfig;
use nutri_assess::error::AppError;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;

const DEMO_EMAIL: &str = "demo.student@example.com";

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// CSV export with one respondent per row
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Where to write the scored report (defaults to stdout)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Height in centimetres
    #[arg(long, default_value_t = 168.0)]
    pub(crate) height_cm: f64,
    /// Weight in kilograms
    #[arg(long, default_value_t = 72.0)]
    pub(crate) weight_kg: f64,
    /// Five symptom ratings between 0 and 3, comma separated
    #[arg(long, value_delimiter = ',', default_values_t = [2u8, 1, 2, 1, 1])]
    pub(crate) stress: Vec<u8>,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs { input, output } = args;

    let reader = BufReader::new(File::open(&input)?);
    let scores = score_respondents(reader)?;

    match output {
        Some(path) => write_scores(BufWriter::new(File::create(&path)?), &scores)?,
        None => write_scores(io::stdout().lock(), &scores)?,
    }

    let complete = scores.iter().filter(|score| score.is_complete()).count();
    eprintln!(
        "Scored {} respondents from {} ({} complete, {} with unfinished sections)",
        scores.len(),
        input.display(),
        complete,
        scores.len() - complete
    );
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        height_cm,
        weight_kg,
        stress,
    } = args;

    println!("Self-assessment demo");

    let outbox = InMemoryOtpOutbox::default();
    let auth = AuthService::new(
        Arc::new(InMemoryUserRepository::default()),
        Arc::new(outbox.clone()),
        AuthConfig::default(),
    );

    let account = auth.register(Registration {
        email: DEMO_EMAIL.to_string(),
        password: "first-secret".to_string(),
        confirm_password: Some("first-secret".to_string()),
        role: Role::User,
    })?;
    println!("- Registered {} as {}", account.email, account.id.0);

    let expires_at = auth.request_password_reset(DEMO_EMAIL)?;
    let code = outbox
        .latest_for(DEMO_EMAIL)
        .map(|message| message.code.as_str().to_string())
        .unwrap_or_default();
    auth.reset_password(PasswordReset {
        email: DEMO_EMAIL.to_string(),
        code,
        new_password: "second-secret".to_string(),
        confirm_password: Some("second-secret".to_string()),
    })?;
    println!("- Password reset with a code valid until {expires_at}");

    let account = auth.sign_in(Credentials {
        email: DEMO_EMAIL.to_string(),
        password: "second-secret".to_string(),
    })?;
    println!("- Signed in as {}", account.email);

    let service = AssessmentService::new(Arc::new(InMemoryAssessmentRepository::default()));
    let owner = account.id;

    let record = service.start(&owner, true)?;
    println!("\nAssessment {} started", record.id.0);

    service.submit_personal_info(
        &owner,
        PersonalInfoDraft {
            age: Some(20),
            gender: Some(Gender::Female),
            year_of_study: Some(2),
            height_cm: Some(height_cm),
            weight_kg: Some(weight_kg),
            faculty: Some("Nursing".to_string()),
            ..PersonalInfoDraft::default()
        },
    )?;
    service.submit_consumption(&owner, demo_consumption())?;
    service.submit_nutrition(&owner, demo_nutrition())?;
    service.submit_stress(&owner, stress_draft(&stress)?)?;

    let summary = service.results(&owner)?;
    render_summary(&summary);
    Ok(())
}

fn demo_consumption() -> ConsumptionDraft {
    use Frequency::{Daily, RarelyOrNever, ThreeToFourPerWeek};

    ConsumptionAnswers {
        sweet: SweetHabits {
            water: Daily,
            soft_drinks: ThreeToFourPerWeek,
            fruit_juice: RarelyOrNever,
            desserts: ThreeToFourPerWeek,
            sugar_addition: RarelyOrNever,
        },
        fat: FatHabits {
            lean_meat: Daily,
            fried_food: ThreeToFourPerWeek,
            high_fat_dishes: RarelyOrNever,
            sweet_drinks: ThreeToFourPerWeek,
            soup_gravy: RarelyOrNever,
        },
        sodium: SodiumHabits {
            taste_before_season: Daily,
            herbs_spices: ThreeToFourPerWeek,
            processed_meat: RarelyOrNever,
            instant_food: ThreeToFourPerWeek,
            pickled_food: RarelyOrNever,
        },
    }
    .into()
}

fn demo_nutrition() -> NutritionDraft {
    use KnowledgeAnswer::{No, Unsure, Yes};

    NutritionAnswers {
        knowledge: KnowledgeAnswers {
            knowledge_1: Yes,
            knowledge_2: Yes,
            knowledge_3: No,
            knowledge_4: Unsure,
            knowledge_5: Yes,
            knowledge_6: No,
        },
        water_intake: WeightPerception::Normal,
        food_selection: EnergyLevel::Normal,
    }
    .into()
}

/// Missing ratings stay unanswered so the service reports the unfinished section.
fn stress_draft(ratings: &[u8]) -> Result<StressDraft, AssessmentServiceError> {
    let rating = |index: usize| -> Result<Option<StressRating>, AssessmentServiceError> {
        ratings
            .get(index)
            .map(|value| StressRating::new(*value))
            .transpose()
            .map_err(AssessmentServiceError::from)
    };

    Ok(StressDraft {
        stress_1: rating(0)?,
        stress_2: rating(1)?,
        stress_3: rating(2)?,
        stress_4: rating(3)?,
        stress_5: rating(4)?,
    })
}

fn render_summary(summary: &AssessmentSummary) {
    println!("\nResults");
    if let (Some(bmi), Some(category)) = (summary.bmi, summary.bmi_category) {
        println!("- BMI {bmi:.2} ({category})");
    }
    if let Some(score) = summary.consumption_score {
        println!("- Consumption habits score: {score}%");
    }
    if let Some(score) = summary.nutrition_knowledge_score {
        println!("- Nutrition knowledge score: {score}%");
    }
    if let (Some(score), Some(level)) = (summary.stress_score, summary.stress_level) {
        println!("- Stress score {score} ({level})");
    }

    if summary.recommendations.is_empty() {
        println!("\nRecommendations: none");
    } else {
        println!("\nRecommendations");
        for line in &summary.recommendations {
            println!("- {line}");
        }
    }

    match serde_json::to_string_pretty(summary) {
        Ok(json) => println!("\nResults payload:\n{json}"),
        Err(err) => println!("\nResults payload unavailable: {err}"),
    }
}
