use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::db::Database;
use crate::error::ApiError;
use crate::llm::Advisor;
use crate::video::{Video, UNCATEGORIZED};
use crate::youtube::VideoSource;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub new_videos: usize,
    pub skipped: usize,
}

/// Pulls playlists into the record store, categorizing each new video on the way in.
#[derive(Clone)]
pub struct Ingestor {
    db: Database,
    source: Arc<dyn VideoSource>,
    advisor: Arc<dyn Advisor>,
    candidates: Arc<Vec<String>>,
}

impl Ingestor {
    pub fn new(
        db: &Database,
        source: Arc<dyn VideoSource>,
        advisor: Arc<dyn Advisor>,
        candidates: Vec<String>,
    ) -> Self {
        Self {
            db: db.clone(),
            source,
            advisor,
            candidates: Arc::new(candidates),
        }
    }

    #[instrument(skip(self))]
    pub async fn import_playlist(
        &self,
        owner: &str,
        playlist_url: &str,
    ) -> Result<ImportSummary, ApiError> {
        let playlist = self.source.fetch_playlist(playlist_url).await?;
        let mut summary = ImportSummary::default();

        for metadata in playlist {
            if self.db.get_video(&metadata.id)?.is_some() {
                summary.skipped += 1;
                continue;
            }

            let categories = match self.advisor.classify(&metadata.title, &self.candidates).await {
                Ok(categories) => categories,
                Err(e) => {
                    warn!(error = %e, video_id = metadata.id.as_str(), "categorization failed");
                    vec![UNCATEGORIZED.to_string()]
                }
            };

            let video = Video::from_metadata(owner, metadata, categories);
            if self.db.put_video(&video)? {
                summary.new_videos += 1;
            } else {
                summary.skipped += 1;
            }
        }

        info!(
            new_videos = summary.new_videos,
            skipped = summary.skipped,
            "playlist import finished"
        );

        Ok(summary)
    }
}
