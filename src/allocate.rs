use serde::Serialize;
use tracing::{debug, warn};

use crate::error::AllocationError;
use crate::video::Video;

/// Half-width of the band around the daily target, in seconds.
pub const TOLERANCE_SECONDS: i64 = 600;

/// The videos assigned to one day of a plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayPlan {
    /// 1-based.
    pub day: u32,
    pub videos: Vec<Video>,
    pub accumulated_seconds: u64,
}

/// Acceptable accumulated duration for a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub low: i64,
    pub high: i64,
}

impl Band {
    pub fn around(target_seconds: u32) -> Self {
        let target = i64::from(target_seconds);
        Self {
            low: target - TOLERANCE_SECONDS,
            high: target + TOLERANCE_SECONDS,
        }
    }

    /// Keep filling while under the band, or while still under the ceiling and the next video
    /// fits below it.
    fn wants_more(&self, accumulated: i64, next_seconds: u32) -> bool {
        accumulated < self.low
            || (accumulated < self.high && accumulated + i64::from(next_seconds) <= self.high)
    }
}

/// Position into the catalog. Carried across day boundaries and wraps around the end.
struct Cursor<'a> {
    catalog: &'a [Video],
    position: usize,
}

impl<'a> Cursor<'a> {
    fn new(catalog: &'a [Video]) -> Self {
        Self {
            catalog,
            position: 0,
        }
    }

    fn peek(&self) -> &'a Video {
        &self.catalog[self.position]
    }

    fn advance(&mut self) -> &'a Video {
        let video = self.peek();
        self.position = (self.position + 1) % self.catalog.len();
        video
    }

    fn fill_day(&mut self, day: u32, band: Band) -> DayPlan {
        let stall_limit = 2 * self.catalog.len();
        let mut videos = Vec::new();
        let mut accumulated: i64 = 0;
        let mut stalled = 0;

        // The first video of a day is always taken, so a day is never empty.
        while videos.is_empty() || band.wants_more(accumulated, self.peek().duration_seconds) {
            let video = self.advance();
            accumulated += i64::from(video.duration_seconds);
            videos.push(video.clone());

            if video.duration_seconds == 0 {
                stalled += 1;
                if stalled >= stall_limit {
                    warn!(day, accumulated, "no progress filling day, stopping early");
                    break;
                }
            } else {
                stalled = 0;
            }
        }

        debug!(day, videos = videos.len(), accumulated, "filled day");

        DayPlan {
            day,
            videos,
            accumulated_seconds: accumulated as u64,
        }
    }
}

/// Partition a catalog into `num_days` day plans of roughly `daily_target_seconds` each.
///
/// The catalog is consumed cyclically with one cursor shared by all days, so day `k + 1` starts
/// with the video after the last one of day `k`. Videos repeat when the catalog is short.
pub fn allocate(
    catalog: &[Video],
    daily_target_seconds: u32,
    num_days: u32,
) -> Result<Vec<DayPlan>, AllocationError> {
    if daily_target_seconds == 0 {
        return Err(AllocationError::InvalidParameter(
            "daily duration must be positive",
        ));
    }
    if num_days == 0 {
        return Err(AllocationError::InvalidParameter(
            "number of days must be positive",
        ));
    }
    if catalog.is_empty() {
        return Err(AllocationError::EmptyCatalog);
    }

    let band = Band::around(daily_target_seconds);
    let mut cursor = Cursor::new(catalog);

    Ok((1..=num_days).map(|day| cursor.fill_day(day, band)).collect())
}

/// Flatten a plan into the text handed to the advisor.
///
/// One block per day, `"Day {n}"` followed by a `"{title} ({minutes}분) - {category}"` line per
/// video; blocks are joined with `,`.
pub fn render_plan_text(days: &[DayPlan]) -> String {
    days.iter()
        .map(|plan| {
            let lines: Vec<String> = plan
                .videos
                .iter()
                .map(|v| {
                    format!(
                        "{} ({}분) - {}",
                        v.title,
                        v.duration_seconds / 60,
                        v.category()
                    )
                })
                .collect();
            format!("Day {}\n{}", plan.day, lines.join("\n"))
        })
        .collect::<Vec<_>>()
        .join(",")
}
