use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::calendar::plan_dates;
use crate::error::ApiError;
use crate::llm::Advisor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanDuration {
    #[serde(rename = "1 Week")]
    OneWeek,
    #[serde(rename = "2 Weeks")]
    TwoWeeks,
    #[serde(rename = "3 Weeks")]
    ThreeWeeks,
    #[serde(rename = "1 Month")]
    OneMonth,
}

impl PlanDuration {
    pub fn days(&self) -> u32 {
        match self {
            PlanDuration::OneWeek => 7,
            PlanDuration::TwoWeeks => 14,
            PlanDuration::ThreeWeeks => 21,
            PlanDuration::OneMonth => 30,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlanDuration::OneWeek => "1 Week",
            PlanDuration::TwoWeeks => "2 Weeks",
            PlanDuration::ThreeWeeks => "3 Weeks",
            PlanDuration::OneMonth => "1 Month",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Experience {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachRequest {
    pub name: String,
    pub age: u32,
    pub experience: Experience,
    #[serde(default)]
    pub target_body_parts: Vec<String>,
    #[serde(default)]
    pub equipment: Vec<String>,
    pub duration: PlanDuration,
    pub start_date: NaiveDate,
}

impl CoachRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.age > 100 {
            return Err(ApiError::BadRequest("age must be between 0 and 100".to_string()));
        }
        if self.last_date().is_none() {
            return Err(ApiError::BadRequest("start date is out of range".to_string()));
        }
        Ok(())
    }

    fn last_date(&self) -> Option<NaiveDate> {
        let span = self.duration.days().saturating_sub(1);
        self.start_date.checked_add_days(Days::new(u64::from(span)))
    }

    pub fn prompt(&self) -> String {
        let preferences = serde_json::json!({
            "name": self.name,
            "age": self.age,
            "experience_level": self.experience,
            "target_body_part": self.target_body_parts,
            "equipment_available": self.equipment,
        });

        format!(
            "Create a {} workout plan starting from {} for a user with the following \
             preferences: {preferences}. The plan should include different exercises from the \
             dataset provided and be well-balanced.",
            self.duration.label(),
            self.start_date.format("%Y-%m-%d"),
        )
    }

    /// Name of the downloadable plan file.
    pub fn file_name(&self) -> String {
        format!("{}_workout_plan.txt", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoachPlan {
    pub duration: PlanDuration,
    pub start_date: String,
    pub dates: Vec<String>,
    pub plan: String,
}

pub async fn generate(advisor: &dyn Advisor, request: &CoachRequest) -> Result<CoachPlan, ApiError> {
    request.validate()?;
    let dates = plan_dates(request.start_date, request.duration.days())
        .ok_or_else(|| ApiError::BadRequest("start date is out of range".to_string()))?;

    let plan = advisor.coach_plan(request).await?;
    info!(duration = request.duration.label(), "coach plan generated");

    Ok(CoachPlan {
        duration: request.duration,
        start_date: request.start_date.format("%Y-%m-%d").to_string(),
        dates,
        plan,
    })
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;

    use crate::error::ApiError;
    use crate::ingest::test::FakeAdvisor;

    use super::{generate, CoachRequest, Experience, PlanDuration};

    fn request(age: u32) -> CoachRequest {
        CoachRequest {
            name: "kim".to_string(),
            age,
            experience: Experience::Beginner,
            target_body_parts: vec!["Quadriceps".to_string()],
            equipment: vec!["Dumbbell".to_string()],
            duration: PlanDuration::TwoWeeks,
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        }
    }

    #[test]
    pub fn test_duration_serde() {
        let duration: PlanDuration = serde_json::from_str(r#""1 Month""#).unwrap();
        assert_eq!(duration, PlanDuration::OneMonth);
        assert_eq!(duration.days(), 30);
        assert_eq!(serde_json::to_string(&PlanDuration::OneWeek).unwrap(), r#""1 Week""#);
    }

    #[test]
    pub fn test_prompt() {
        let prompt = request(30).prompt();
        assert!(prompt.starts_with("Create a 2 Weeks workout plan starting from 2024-03-01"));
        assert!(prompt.contains(r#""target_body_part":["Quadriceps"]"#));
        assert_eq!(request(30).file_name(), "kim_workout_plan.txt");
    }

    #[tokio::test]
    pub async fn test_generate() {
        let advisor = FakeAdvisor::default();

        let plan = generate(&advisor, &request(30)).await.unwrap();
        assert_eq!(plan.plan, "Plan for kim");
        assert_eq!(plan.dates.len(), 14);
        assert_eq!(plan.dates[13], "2024-03-14");

        assert!(matches!(
            generate(&advisor, &request(101)).await,
            Err(ApiError::BadRequest(_))
        ));
    }

    #[tokio::test]
    pub async fn test_start_date_out_of_range() {
        let advisor = FakeAdvisor::default();

        let mut late = request(30);
        late.start_date = NaiveDate::MAX;
        assert!(matches!(late.validate(), Err(ApiError::BadRequest(_))));
        assert!(matches!(
            generate(&advisor, &late).await,
            Err(ApiError::BadRequest(_))
        ));
        assert!(advisor.coached.lock().unwrap().is_empty());

        // The last day of a two week plan may land exactly on the final date.
        late.start_date = NaiveDate::MAX - chrono::Days::new(13);
        let plan = generate(&advisor, &late).await.unwrap();
        assert_eq!(plan.dates.len(), 14);
    }
}
