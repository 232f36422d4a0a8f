use serde::{Deserialize, Serialize};

use crate::calendar::{CalendarView, MonthlyCalendar, WeeklyPlanner};
use crate::db::{Gender, Profile};
use crate::plan::PlannedVideo;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct RegisterRequest {
    pub user_id: String,
    pub name: String,
    pub password: String,
    pub gender: Gender,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct LoginRequest {
    pub user_id: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct LoginReply {
    pub token: String,
    pub user_id: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ProfileReply {
    pub user_id: String,
    #[serde(flatten)]
    pub profile: Profile,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct VideoQueryParams {
    /// Comma-separated; all categories when absent.
    pub categories: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct VideoList {
    pub all_categories: Vec<String>,
    pub selected: Vec<String>,
    pub videos: Vec<PlannedVideo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ImportRequest {
    pub playlist_url: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct CalendarQueryParams {
    pub year: Option<i32>,
    pub month: Option<u32>,
    #[serde(default)]
    pub view: CalendarView,
}

#[derive(Debug, Serialize)]
pub(crate) struct MonthRef {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct CalendarPage {
    pub year: i32,
    pub month: u32,
    pub view: CalendarView,
    pub prev: MonthRef,
    pub next: MonthRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly: Option<MonthlyCalendar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly: Option<WeeklyPlanner>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PageLink {
    pub path: &'static str,
    pub title: &'static str,
    pub icon: &'static str,
}

pub(crate) const PAGES: [PageLink; 5] = [
    PageLink {
        path: "/",
        title: "Home",
        icon: "🏠",
    },
    PageLink {
        path: "/register",
        title: "Membership",
        icon: "🔼",
    },
    PageLink {
        path: "/coach/plan",
        title: "PT Plan",
        icon: "📚",
    },
    PageLink {
        path: "/videos",
        title: "Video List & Plan",
        icon: "👏",
    },
    PageLink {
        path: "/calendar",
        title: "Calendar",
        icon: "📅",
    },
];
