use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::video::{join_categories, parse_categories, Video};

/// Record store for users, their videos and the exercise reference table.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Mutex<rusqlite::Connection>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }

    fn parse(value: &str) -> Self {
        match value {
            "Female" => Gender::Female,
            _ => Gender::Male,
        }
    }
}

/// Editable part of a user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub gender: Gender,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: String,
    pub password: String,
    pub profile: Profile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub title: String,
    pub body_part: String,
    pub equipment: String,
    #[serde(default)]
    pub rating: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExerciseOptions {
    pub body_parts: Vec<String>,
    pub equipment: Vec<String>,
}

impl Database {
    pub fn memory() -> Result<Self, StoreError> {
        // Construct a new SQLite database in-memory.
        let db = rusqlite::Connection::open_in_memory()?;
        setup_connection(&db)?;

        Ok(Self {
            inner: Arc::new(Mutex::new(db)),
        })
    }

    pub fn file<P: AsRef<Path>>(file: P) -> Result<Self, StoreError> {
        let db = rusqlite::Connection::open(file)?;
        setup_connection(&db)?;

        Ok(Self {
            inner: Arc::new(Mutex::new(db)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, rusqlite::Connection>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }
}

// Videos
impl Database {
    pub fn get_video(&self, video_id: &str) -> Result<Option<Video>, StoreError> {
        let db = self.lock()?;

        let video = db
            .query_row(
                "SELECT user_id, video_id, title, url, length, author, channel_url, views, category
                 FROM videos WHERE video_id = ?1",
                [video_id],
                video_from_row,
            )
            .optional()?;

        Ok(video)
    }

    /// Insert a video. Returns `false` without touching the table when the id is already stored.
    pub fn put_video(&self, video: &Video) -> Result<bool, StoreError> {
        let db = self.lock()?;

        let inserted = db.execute(
            "INSERT OR IGNORE INTO videos
                 (user_id, video_id, title, url, length, author, channel_url, views, category)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                video.owner,
                video.id,
                video.title,
                video.url,
                video.duration_seconds,
                video.author,
                video.channel_url,
                i64::try_from(video.views).unwrap_or(i64::MAX),
                join_categories(&video.categories),
            ],
        )?;

        Ok(inserted > 0)
    }

    /// All videos of one owner in ingestion order.
    pub fn videos_by_owner(&self, owner: &str) -> Result<Vec<Video>, StoreError> {
        let db = self.lock()?;

        let mut stmt = db.prepare(
            "SELECT user_id, video_id, title, url, length, author, channel_url, views, category
             FROM videos WHERE user_id = ?1 ORDER BY seq",
        )?;

        let rows = stmt
            .query_map([owner], video_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    pub fn set_categories(&self, video_id: &str, categories: &[String]) -> Result<bool, StoreError> {
        let db = self.lock()?;
        let updated = db.execute(
            "UPDATE videos SET category = ?2 WHERE video_id = ?1",
            params![video_id, join_categories(categories)],
        )?;

        Ok(updated > 0)
    }
}

// Users
impl Database {
    pub fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let db = self.lock()?;

        let user = db
            .query_row(
                "SELECT user_id, password, name, age, gender, height, weight
                 FROM users WHERE user_id = ?1",
                [user_id],
                |row| {
                    Ok(User {
                        user_id: row.get(0)?,
                        password: row.get(1)?,
                        profile: Profile {
                            name: row.get(2)?,
                            age: row.get(3)?,
                            gender: Gender::parse(row.get::<_, String>(4)?.as_str()),
                            height: row.get(5)?,
                            weight: row.get(6)?,
                        },
                    })
                },
            )
            .optional()?;

        Ok(user)
    }

    pub fn put_user(&self, user: &User) -> Result<(), StoreError> {
        let db = self.lock()?;

        let inserted = db.execute(
            "INSERT OR IGNORE INTO users (user_id, password, name, age, gender, height, weight)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user.user_id,
                user.password,
                user.profile.name,
                user.profile.age,
                user.profile.gender.as_str(),
                user.profile.height,
                user.profile.weight,
            ],
        )?;

        if inserted == 0 {
            return Err(StoreError::DuplicateUser(user.user_id.clone()));
        }
        Ok(())
    }

    /// Look up a user by id and password. Passwords are compared as stored.
    pub fn authenticate(&self, user_id: &str, password: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .get_user(user_id)?
            .filter(|user| user.password == password))
    }

    pub fn update_profile(&self, user_id: &str, profile: &Profile) -> Result<(), StoreError> {
        let db = self.lock()?;

        let updated = db.execute(
            "UPDATE users SET name = ?2, age = ?3, gender = ?4, height = ?5, weight = ?6
             WHERE user_id = ?1",
            params![
                user_id,
                profile.name,
                profile.age,
                profile.gender.as_str(),
                profile.height,
                profile.weight,
            ],
        )?;

        if updated == 0 {
            return Err(StoreError::UnknownUser(user_id.to_string()));
        }
        Ok(())
    }
}

// Exercise reference data
impl Database {
    pub fn put_exercise(&self, exercise: &Exercise) -> Result<(), StoreError> {
        let db = self.lock()?;
        db.execute(
            "INSERT INTO exercises (title, body_part, equipment, rating) VALUES (?1, ?2, ?3, ?4)",
            params![
                exercise.title,
                exercise.body_part,
                exercise.equipment,
                exercise.rating
            ],
        )?;

        Ok(())
    }

    pub fn exercise_options(&self) -> Result<ExerciseOptions, StoreError> {
        let db = self.lock()?;

        let distinct = |column: &str| -> Result<Vec<String>, StoreError> {
            let mut stmt = db.prepare(&format!(
                "SELECT DISTINCT {column} FROM exercises WHERE {column} != '' ORDER BY {column}"
            ))?;
            let values = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(values)
        };

        Ok(ExerciseOptions {
            body_parts: distinct("body_part")?,
            equipment: distinct("equipment")?,
        })
    }
}

fn video_from_row(row: &Row<'_>) -> rusqlite::Result<Video> {
    Ok(Video {
        owner: row.get(0)?,
        id: row.get(1)?,
        title: row.get(2)?,
        url: row.get(3)?,
        duration_seconds: row.get(4)?,
        author: row.get(5)?,
        channel_url: row.get(6)?,
        views: row.get::<_, i64>(7)?.max(0) as u64,
        categories: parse_categories(row.get::<_, String>(8)?.as_str()),
    })
}

fn setup_connection(db: &rusqlite::Connection) -> Result<(), StoreError> {
    db.execute_batch(
        r#"
            CREATE TABLE IF NOT EXISTS videos (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                video_id TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                url TEXT NOT NULL,
                length INTEGER NOT NULL,
                author TEXT NOT NULL,
                channel_url TEXT NOT NULL,
                views INTEGER NOT NULL,
                category TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS videos_by_user ON videos (user_id, seq);

            CREATE TABLE IF NOT EXISTS users (
                user_id TEXT PRIMARY KEY,
                password TEXT NOT NULL,
                name TEXT NOT NULL,
                age INTEGER,
                gender TEXT NOT NULL,
                height REAL,
                weight REAL
            );

            CREATE TABLE IF NOT EXISTS exercises (
                title TEXT NOT NULL,
                body_part TEXT NOT NULL,
                equipment TEXT NOT NULL,
                rating REAL NOT NULL
            );
            "#,
    )?;

    Ok(())
}
