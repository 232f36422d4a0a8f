// Videos as stored per user, and the presentation helpers shared by the list and plan pages.

use serde::{Deserialize, Serialize};

/// Label stored when the classifier gave us nothing usable.
pub const UNCATEGORIZED: &str = "uncategorized";

/// A single workout video owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub owner: String,
    pub title: String,
    pub url: String,
    pub duration_seconds: u32,
    pub author: String,
    pub channel_url: String,
    pub views: u64,
    pub categories: Vec<String>,
}

impl Video {
    pub fn from_metadata(owner: &str, metadata: VideoMetadata, categories: Vec<String>) -> Self {
        Self {
            id: metadata.id,
            owner: owner.to_string(),
            title: metadata.title,
            url: metadata.url,
            duration_seconds: metadata.duration_seconds,
            author: metadata.author,
            channel_url: metadata.channel_url,
            views: metadata.views,
            categories,
        }
    }

    /// Comma-joined labels, the way they are stored and shown.
    pub fn category(&self) -> String {
        join_categories(&self.categories)
    }

    pub fn has_any_category(&self, selected: &[String]) -> bool {
        self.categories.iter().any(|c| selected.contains(c))
    }

    pub fn thumbnail_url(&self) -> String {
        format!("https://img.youtube.com/vi/{}/0.jpg", self.id)
    }
}

/// What a video source knows about a video before it is categorized and owned.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VideoMetadata {
    pub id: String,
    pub title: String,
    pub url: String,
    pub duration_seconds: u32,
    pub author: String,
    pub channel_url: String,
    pub views: u64,
}

/// Split a stored or classifier-produced label list.
///
/// Labels are trimmed and stripped of quotes; empty labels are dropped. An empty result becomes
/// [`UNCATEGORIZED`] so every video stays selectable.
pub fn parse_categories(raw: &str) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for label in raw.split(',') {
        let label = label.trim().trim_matches(|c| c == '\'' || c == '"').trim();
        if label.is_empty() || labels.iter().any(|l| l == label) {
            continue;
        }
        labels.push(label.to_string());
    }

    if labels.is_empty() {
        labels.push(UNCATEGORIZED.to_string());
    }
    labels
}

pub fn join_categories(categories: &[String]) -> String {
    categories.join(",")
}

/// Sorted, de-duplicated labels across a list of videos.
pub fn all_categories<'a>(videos: impl IntoIterator<Item = &'a Video>) -> Vec<String> {
    let mut labels: Vec<String> = videos
        .into_iter()
        .flat_map(|v| v.categories.iter().cloned())
        .collect();
    labels.sort();
    labels.dedup();
    labels
}

/// Render a duration as `"{m}분 {s}초"`.
pub fn format_time(seconds: u32) -> String {
    format!("{}분 {}초", seconds / 60, seconds % 60)
}

#[cfg(test)]
pub(crate) fn video(id: &str, duration_seconds: u32, categories: &[&str]) -> Video {
    Video {
        id: id.to_string(),
        owner: "tester".to_string(),
        title: format!("video {id}"),
        url: format!("https://www.youtube.com/watch?v={id}"),
        duration_seconds,
        author: "coach".to_string(),
        channel_url: "https://www.youtube.com/channel/coach".to_string(),
        views: 0,
        categories: categories.iter().map(|c| c.to_string()).collect(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    pub fn test_parse_categories() {
        assert_eq!(parse_categories("'상체', 어깨,상체"), vec!["상체", "어깨"]);
        assert_eq!(parse_categories("  ,  "), vec![UNCATEGORIZED]);
        assert_eq!(parse_categories("\"legs\""), vec!["legs"]);
    }

    #[test]
    pub fn test_format_time() {
        assert_eq!(format_time(0), "0분 0초");
        assert_eq!(format_time(754), "12분 34초");
    }

    #[test]
    pub fn test_all_categories() {
        let videos = vec![video("a", 60, &["legs", "core"]), video("b", 60, &["arms", "core"])];
        assert_eq!(all_categories(&videos), vec!["arms", "core", "legs"]);
        assert!(videos[0].has_any_category(&["legs".to_string()]));
        assert!(!videos[1].has_any_category(&["legs".to_string()]));
        assert_eq!(videos[0].category(), "legs,core");
        assert_eq!(videos[0].thumbnail_url(), "https://img.youtube.com/vi/a/0.jpg");
    }
}
