use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::error::ClientError;
use crate::video::VideoMetadata;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// The API caps both `playlistItems` pages and `videos` id lists at 50.
const PAGE_SIZE: usize = 50;

/// Anything that can list the videos of a playlist.
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn fetch_playlist(&self, playlist_url: &str) -> Result<Vec<VideoMetadata>, ClientError>;
}

/// YouTube Data API v3 client.
pub struct YouTubeClient {
    client: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsPage {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItem {
    content_details: PlaylistItemDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemDetails {
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct VideosPage {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: VideoSnippet,
    content_details: VideoDetails,
    #[serde(default)]
    statistics: VideoStatistics,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    title: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    channel_id: String,
}

#[derive(Debug, Deserialize)]
struct VideoDetails {
    duration: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<String>,
}

impl VideoItem {
    fn into_metadata(self) -> VideoMetadata {
        let duration_seconds = parse_iso8601_duration(&self.content_details.duration)
            .unwrap_or_else(|| {
                warn!(
                    video_id = self.id.as_str(),
                    duration = self.content_details.duration.as_str(),
                    "unparsable duration, storing 0"
                );
                0
            });

        VideoMetadata {
            url: format!("https://www.youtube.com/watch?v={}", self.id),
            channel_url: format!("https://www.youtube.com/channel/{}", self.snippet.channel_id),
            id: self.id,
            title: self.snippet.title,
            duration_seconds,
            author: self.snippet.channel_title,
            views: self
                .statistics
                .view_count
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
        }
    }
}

impl YouTubeClient {
    pub fn new(api_base: impl Into<String>, api_key: Option<String>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("homefit/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.into(),
            api_key,
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ClientError::NotConfigured("YOUTUBE_API_KEY"))?;

        let url = format!("{}/{resource}", self.api_base.trim_end_matches('/'));
        let response = self
            .client
            .get(url)
            .query(query)
            .query(&[("key", api_key)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    async fn playlist_video_ids(&self, playlist_id: &str) -> Result<Vec<String>, ClientError> {
        let max_results = PAGE_SIZE.to_string();
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("part", "contentDetails"),
                ("maxResults", max_results.as_str()),
                ("playlistId", playlist_id),
            ];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let page: PlaylistItemsPage = self.get("playlistItems", &query).await?;
            ids.extend(page.items.into_iter().map(|item| item.content_details.video_id));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(ids)
    }
}

#[async_trait]
impl VideoSource for YouTubeClient {
    #[instrument(skip(self))]
    async fn fetch_playlist(&self, playlist_url: &str) -> Result<Vec<VideoMetadata>, ClientError> {
        let playlist_id = playlist_id(playlist_url)?;
        let ids = self.playlist_video_ids(&playlist_id).await?;
        debug!(count = ids.len(), "playlist items listed");

        let mut details: HashMap<String, VideoMetadata> = HashMap::new();
        for batch in ids.chunks(PAGE_SIZE) {
            let joined = batch.join(",");
            let page: VideosPage = self
                .get(
                    "videos",
                    &[("part", "snippet,contentDetails,statistics"), ("id", joined.as_str())],
                )
                .await?;

            for item in page.items {
                let metadata = item.into_metadata();
                details.insert(metadata.id.clone(), metadata);
            }
        }

        // Keep playlist order; private or deleted entries have no details and are skipped.
        let videos: Vec<VideoMetadata> = ids.iter().filter_map(|id| details.remove(id)).collect();
        info!(
            playlist_id = playlist_id.as_str(),
            videos = videos.len(),
            "playlist fetched"
        );

        Ok(videos)
    }
}

/// Extract the `list` parameter from a playlist or watch URL.
pub fn playlist_id(playlist_url: &str) -> Result<String, ClientError> {
    let invalid = || ClientError::InvalidPlaylistUrl(playlist_url.to_string());

    let url = url::Url::parse(playlist_url.trim()).map_err(|_| invalid())?;
    url.query_pairs()
        .find(|(key, _)| key == "list")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
        .ok_or_else(invalid)
}

/// Parse ISO-8601 durations as YouTube reports them (`PT1H2M3S`, `P1DT2H`, `P0D`).
pub fn parse_iso8601_duration(value: &str) -> Option<u32> {
    let rest = value.strip_prefix('P')?;
    let mut seconds: u32 = 0;
    let mut number = String::new();
    let mut in_time = false;
    let mut any = false;

    for c in rest.chars() {
        match c {
            '0'..='9' => number.push(c),
            'T' if !in_time && number.is_empty() => in_time = true,
            'W' | 'D' | 'H' | 'M' | 'S' => {
                let n: u32 = number.parse().ok()?;
                number.clear();
                let unit = match (c, in_time) {
                    ('W', false) => 7 * 86_400,
                    ('D', false) => 86_400,
                    ('H', true) => 3_600,
                    ('M', true) => 60,
                    ('S', true) => 1,
                    _ => return None,
                };
                seconds = seconds.checked_add(n.checked_mul(unit)?)?;
                any = true;
            }
            _ => return None,
        }
    }

    if !number.is_empty() || !any {
        return None;
    }
    Some(seconds)
}

#[cfg(test)]
mod test {
    use super::{parse_iso8601_duration, playlist_id, VideoItem};
    use crate::error::ClientError;

    #[test]
    pub fn test_parse_duration() {
        assert_eq!(parse_iso8601_duration("PT15M33S"), Some(933));
        assert_eq!(parse_iso8601_duration("PT1H"), Some(3600));
        assert_eq!(parse_iso8601_duration("PT45S"), Some(45));
        assert_eq!(parse_iso8601_duration("P1DT2M"), Some(86_520));
        assert_eq!(parse_iso8601_duration("P0D"), Some(0));
        assert_eq!(parse_iso8601_duration("PT"), None);
        assert_eq!(parse_iso8601_duration("15:33"), None);
        assert_eq!(parse_iso8601_duration("PT5"), None);
        assert_eq!(parse_iso8601_duration("P5M"), None);
    }

    #[test]
    pub fn test_playlist_id() {
        assert_eq!(
            playlist_id("https://www.youtube.com/playlist?list=PLabc123").unwrap(),
            "PLabc123"
        );
        assert_eq!(
            playlist_id("https://www.youtube.com/watch?v=xyz&list=PLdef&index=2").unwrap(),
            "PLdef"
        );
        assert!(matches!(
            playlist_id("https://www.youtube.com/watch?v=xyz"),
            Err(ClientError::InvalidPlaylistUrl(_))
        ));
        assert!(matches!(
            playlist_id("not a url"),
            Err(ClientError::InvalidPlaylistUrl(_))
        ));
    }

    #[test]
    pub fn test_video_item() {
        let item: VideoItem = serde_json::from_str(
            r#"{
                "id": "abc",
                "snippet": {"title": "10분 전신 운동", "channelTitle": "Coach", "channelId": "UC1"},
                "contentDetails": {"duration": "PT10M5S"},
                "statistics": {"viewCount": "1234"}
            }"#,
        )
        .unwrap();

        let metadata = item.into_metadata();
        assert_eq!(metadata.duration_seconds, 605);
        assert_eq!(metadata.views, 1234);
        assert_eq!(metadata.url, "https://www.youtube.com/watch?v=abc");
        assert_eq!(metadata.channel_url, "https://www.youtube.com/channel/UC1");
        assert_eq!(metadata.author, "Coach");
    }
}
