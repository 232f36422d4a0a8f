use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::allocate::{allocate, render_plan_text, DayPlan};
use crate::error::{AllocationError, ApiError};
use crate::llm::Advisor;
use crate::video::{format_time, Video};

/// Longest plan accepted in one request.
pub const MAX_NUM_DAYS: u32 = 366;

/// A day has no more minutes than this.
pub const MAX_DAILY_MINUTES: u32 = 1440;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub categories: Vec<String>,
    #[serde(default = "default_daily_minutes")]
    pub daily_minutes: i64,
    #[serde(default = "default_num_days")]
    pub num_days: i64,
}

fn default_daily_minutes() -> i64 {
    30
}

fn default_num_days() -> i64 {
    7
}

impl PlanRequest {
    /// `(daily target in seconds, number of days)`.
    fn parameters(&self) -> Result<(u32, u32), ApiError> {
        if self.categories.is_empty() {
            return Err(ApiError::BadRequest(
                "select at least one category".to_string(),
            ));
        }

        let target = u32::try_from(self.daily_minutes)
            .ok()
            .filter(|m| (1..=MAX_DAILY_MINUTES).contains(m))
            .map(|m| m * 60)
            .ok_or(AllocationError::InvalidParameter(
                "daily minutes must be between 1 and 1440",
            ))?;
        let days = u32::try_from(self.num_days)
            .ok()
            .filter(|d| (1..=MAX_NUM_DAYS).contains(d))
            .ok_or(AllocationError::InvalidParameter(
                "number of days must be between 1 and 366",
            ))?;

        Ok((target, days))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedVideo {
    pub id: String,
    pub title: String,
    pub url: String,
    pub thumbnail_url: String,
    pub length: String,
    pub category: String,
}

impl From<&Video> for PlannedVideo {
    fn from(video: &Video) -> Self {
        Self {
            id: video.id.clone(),
            title: video.title.clone(),
            url: video.url.clone(),
            thumbnail_url: video.thumbnail_url(),
            length: format_time(video.duration_seconds),
            category: video.category(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedDay {
    pub day: u32,
    pub accumulated_seconds: u64,
    pub videos: Vec<PlannedVideo>,
}

impl From<&DayPlan> for PlannedDay {
    fn from(plan: &DayPlan) -> Self {
        Self {
            day: plan.day,
            accumulated_seconds: plan.accumulated_seconds,
            videos: plan.videos.iter().map(PlannedVideo::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanResponse {
    pub total_minutes: u64,
    pub days: Vec<PlannedDay>,
    /// Absent when the advisor failed; the plan itself is still returned.
    pub summary: Option<String>,
}

/// Filter the owner's videos by category, allocate them into days and ask for advice.
pub async fn build_plan(
    videos: &[Video],
    request: &PlanRequest,
    advisor: &dyn Advisor,
) -> Result<PlanResponse, ApiError> {
    let (target, num_days) = request.parameters()?;

    let catalog: Vec<Video> = videos
        .iter()
        .filter(|v| v.has_any_category(&request.categories))
        .cloned()
        .collect();

    let days = allocate(&catalog, target, num_days)?;
    info!(
        catalog = catalog.len(),
        days = days.len(),
        target_seconds = target,
        "plan allocated"
    );

    let summary = match advisor.summarize(&render_plan_text(&days)).await {
        Ok(summary) => Some(summary),
        Err(e) => {
            warn!(error = %e, "plan summary unavailable");
            None
        }
    };

    Ok(PlanResponse {
        total_minutes: u64::from(target / 60) * u64::from(num_days),
        days: days.iter().map(PlannedDay::from).collect(),
        summary,
    })
}
