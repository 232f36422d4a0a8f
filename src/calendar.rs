use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

pub const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarView {
    #[default]
    Monthly,
    Weekly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayCell {
    /// 0 for padding cells outside the month.
    pub day: u32,
    pub today: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCalendar {
    pub year: i32,
    pub month: u32,
    pub weekdays: [&'static str; 7],
    pub weeks: Vec<Vec<DayCell>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekDay {
    pub weekday: &'static str,
    /// `"m/d"`, empty for padding.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannerWeek {
    pub week_number: usize,
    pub range: String,
    pub days: Vec<WeekDay>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyPlanner {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<PlannerWeek>,
}

pub fn prev_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (next_year, next) = next_month(year, month);
    let next_first = NaiveDate::from_ymd_opt(next_year, next, 1)?;

    Some((next_first - first).num_days() as u32)
}

/// Sunday-first weeks of a month; cells outside the month are 0. `None` for an invalid month.
pub fn month_grid(year: i32, month: u32) -> Option<Vec<[u32; 7]>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let offset = first.weekday().num_days_from_sunday() as usize;
    let days = days_in_month(year, month)?;

    let mut cells = vec![0; offset];
    cells.extend(1..=days);
    while cells.len() % 7 != 0 {
        cells.push(0);
    }

    Some(
        cells
            .chunks(7)
            .map(|week| {
                let mut row = [0; 7];
                row.copy_from_slice(week);
                row
            })
            .collect(),
    )
}

pub fn monthly(year: i32, month: u32, today: NaiveDate) -> Option<MonthlyCalendar> {
    let grid = month_grid(year, month)?;
    let is_current = today.year() == year && today.month() == month;

    let weeks: Vec<Vec<DayCell>> = grid
        .iter()
        .map(|week| {
            week.iter()
                .map(|&day| DayCell {
                    day,
                    today: is_current && day == today.day(),
                })
                .collect()
        })
        .collect();

    Some(MonthlyCalendar {
        year,
        month,
        weekdays: WEEKDAYS,
        weeks,
    })
}

pub fn weekly(year: i32, month: u32) -> Option<WeeklyPlanner> {
    let grid = month_grid(year, month)?;

    let weeks: Vec<PlannerWeek> = grid
        .iter()
        .enumerate()
        .map(|(index, week)| {
            let labels: Vec<String> = week
                .iter()
                .map(|&day| {
                    if day == 0 {
                        String::new()
                    } else {
                        format!("{month}/{day}")
                    }
                })
                .collect();

            let start = labels.iter().find(|l| !l.is_empty());
            let end = labels.iter().rev().find(|l| !l.is_empty());
            let range = match (start, end) {
                (Some(start), Some(end)) => format!("{start} - {end}"),
                _ => String::new(),
            };

            PlannerWeek {
                week_number: index + 1,
                range,
                days: WEEKDAYS
                    .into_iter()
                    .zip(labels)
                    .map(|(weekday, label)| WeekDay {
                        weekday,
                        label,
                    })
                    .collect(),
            }
        })
        .collect();

    Some(WeeklyPlanner { year, month, weeks })
}

/// `YYYY-MM-DD` for each of `days` consecutive days starting at `start`.
///
/// `None` when the range runs past the last representable date.
pub fn plan_dates(start: NaiveDate, days: u32) -> Option<Vec<String>> {
    (0..days)
        .map(|i| {
            start
                .checked_add_days(Days::new(u64::from(i)))
                .map(|date| date.format("%Y-%m-%d").to_string())
        })
        .collect()
}
