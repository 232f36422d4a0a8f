use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::db::Database;
use crate::error::{ApiError, StoreError};
use crate::video::Video;

/// Per-login context. Created by [`SessionStore::login`], dropped by [`SessionStore::logout`].
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    videos: Option<Vec<Video>>,
}

/// In-memory session table. Sessions do not survive a restart.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn login(&self, user_id: &str) -> Result<Session, ApiError> {
        let session = Session {
            token: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
            videos: None,
        };

        let mut sessions = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        sessions.insert(session.token.clone(), session.clone());
        info!(user_id, "session opened");

        Ok(session)
    }

    pub fn get(&self, token: &str) -> Result<Session, ApiError> {
        let sessions = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        sessions.get(token).cloned().ok_or(ApiError::NoSession)
    }

    pub fn logout(&self, token: &str) -> Result<bool, ApiError> {
        let mut sessions = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        let removed = sessions.remove(token);
        if let Some(session) = &removed {
            info!(user_id = session.user_id.as_str(), "session closed");
        }

        Ok(removed.is_some())
    }

    /// The session owner's video list, loaded from the store on first use.
    pub fn videos(&self, token: &str, db: &Database) -> Result<Vec<Video>, ApiError> {
        let session = self.get(token)?;
        if let Some(videos) = session.videos {
            return Ok(videos);
        }

        let videos = db.videos_by_owner(&session.user_id)?;
        let mut sessions = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        if let Some(entry) = sessions.get_mut(token) {
            entry.videos = Some(videos.clone());
        }

        Ok(videos)
    }

    /// Drop the cached video list of every session `user_id` holds, so the next read goes to
    /// the store.
    pub fn invalidate_videos(&self, user_id: &str) -> Result<(), ApiError> {
        let mut sessions = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        sessions
            .values_mut()
            .filter(|entry| entry.user_id == user_id)
            .for_each(|entry| entry.videos = None);

        Ok(())
    }
}
