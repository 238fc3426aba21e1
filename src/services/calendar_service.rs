//! Weekly schedules and their iCalendar (RFC 5545) rendering.
//!
//! Schedules are stored as free text such as
//! `"Mondays, Wednesdays, Fridays, 2:00 PM - 3:00 PM"`: a list of weekdays,
//! a comma, then a time range.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use sqlx::SqlitePool;
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

use crate::database::{activities_repo, registrations_repo};
use crate::error::{AppError, AppResult};
use crate::models::RegistrationStatus;

const PRODID: &str = "-//Mergington High School//Activities//EN";
const UID_DOMAIN: &str = "mergington.edu";
const MAX_LINE_OCTETS: usize = 75;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("expected \"<days>, <start> - <end>\"")]
    MissingTimeRange,
    #[error("no days given")]
    NoDays,
    #[error("unknown day {0:?}")]
    UnknownDay(String),
    #[error("invalid time {0:?}")]
    InvalidTime(String),
    #[error("end time must be after start time")]
    EndNotAfterStart,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    /// Sorted Monday first, no duplicates.
    pub days: Vec<Weekday>,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

pub fn parse_schedule(raw: &str) -> Result<Schedule, ScheduleError> {
    let (days_part, range_part) = raw
        .trim()
        .rsplit_once(',')
        .ok_or(ScheduleError::MissingTimeRange)?;
    let (start_raw, end_raw) = range_part
        .split_once(['-', '–'])
        .ok_or(ScheduleError::MissingTimeRange)?;

    let mut days = Vec::new();
    for token in days_part
        .split(',')
        .flat_map(str::split_whitespace)
        .filter(|t| !t.eq_ignore_ascii_case("and") && *t != "&")
    {
        let day = parse_weekday(token).ok_or_else(|| ScheduleError::UnknownDay(token.to_string()))?;
        if !days.contains(&day) {
            days.push(day);
        }
    }
    if days.is_empty() {
        return Err(ScheduleError::NoDays);
    }
    days.sort_by_key(|d| d.num_days_from_monday());

    let start = parse_time(start_raw)?;
    let end = parse_time(end_raw)?;
    if end <= start {
        return Err(ScheduleError::EndNotAfterStart);
    }

    Ok(Schedule { days, start, end })
}

fn parse_weekday(token: &str) -> Option<Weekday> {
    let t = token.trim().to_ascii_lowercase();
    let t = t.strip_suffix('s').unwrap_or(&t);
    let day = match t {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tue" | "tues" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thu" | "thur" | "thurs" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        "sunday" | "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(day)
}

/// Accepts `3:30 PM`, `3 PM`, `3:30pm` and 24-hour `15:30`.
fn parse_time(raw: &str) -> Result<NaiveTime, ScheduleError> {
    let invalid = || ScheduleError::InvalidTime(raw.trim().to_string());
    let upper = raw.trim().to_ascii_uppercase();

    let (clock, meridiem) = if let Some(rest) = upper.strip_suffix("AM") {
        (rest.trim(), Some(false))
    } else if let Some(rest) = upper.strip_suffix("PM") {
        (rest.trim(), Some(true))
    } else {
        (upper.as_str(), None)
    };

    let (hour_raw, minute_raw) = clock.split_once(':').unwrap_or((clock, "0"));
    let hour: u32 = hour_raw.trim().parse().map_err(|_| invalid())?;
    let minute: u32 = minute_raw.trim().parse().map_err(|_| invalid())?;

    let hour = match meridiem {
        Some(pm) => {
            if !(1..=12).contains(&hour) {
                return Err(invalid());
            }
            match (hour, pm) {
                (12, false) => 0,
                (12, true) => 12,
                (h, true) => h + 12,
                (h, false) => h,
            }
        }
        None => hour,
    };

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

/// First date on or after `today` that falls on one of the schedule's days.
pub fn first_occurrence(schedule: &Schedule, today: NaiveDate) -> NaiveDate {
    (0..7)
        .map(|offset| today + Duration::days(offset))
        .find(|date| schedule.days.contains(&date.weekday()))
        .unwrap_or(today)
}

pub struct CalendarEvent<'a> {
    pub activity: &'a str,
    pub description: &'a str,
    pub schedule: &'a Schedule,
}

pub fn render_calendar(events: &[CalendarEvent<'_>], today: NaiveDate, now: DateTime<Utc>) -> String {
    let stamp = now.format("%Y%m%dT%H%M%SZ").to_string();
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{}", PRODID),
        "CALSCALE:GREGORIAN".to_string(),
        "METHOD:PUBLISH".to_string(),
    ];

    for event in events {
        let date = first_occurrence(event.schedule, today);
        let byday = event
            .schedule
            .days
            .iter()
            .map(|d| ical_day(*d))
            .collect::<Vec<_>>()
            .join(",");

        lines.push("BEGIN:VEVENT".to_string());
        lines.push(format!("UID:{}@{}", slug(event.activity), UID_DOMAIN));
        lines.push(format!("DTSTAMP:{}", stamp));
        lines.push(format!(
            "DTSTART:{}T{}",
            date.format("%Y%m%d"),
            event.schedule.start.format("%H%M%S")
        ));
        lines.push(format!(
            "DTEND:{}T{}",
            date.format("%Y%m%d"),
            event.schedule.end.format("%H%M%S")
        ));
        lines.push(format!("RRULE:FREQ=WEEKLY;BYDAY={}", byday));
        lines.push(format!("SUMMARY:{}", escape_text(event.activity)));
        lines.push(format!("DESCRIPTION:{}", escape_text(event.description)));
        lines.push("END:VEVENT".to_string());
    }
    lines.push("END:VCALENDAR".to_string());

    let mut out = String::new();
    for line in lines {
        out.push_str(&fold_line(&line));
        out.push_str("\r\n");
    }
    out
}

pub async fn activity_calendar(
    pool: &SqlitePool,
    activity_name: &str,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> AppResult<String> {
    let Some(row) = activities_repo::load_activity(pool, activity_name).await? else {
        return Err(AppError::ActivityNotFound);
    };
    let schedule = parse_schedule(&row.schedule)?;
    let event = CalendarEvent {
        activity: &row.name,
        description: &row.description,
        schedule: &schedule,
    };
    Ok(render_calendar(&[event], today, now))
}

/// Calendar of every activity the student is enrolled in (waitlisted ones are left out).
pub async fn user_calendar(
    pool: &SqlitePool,
    email: &str,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> AppResult<String> {
    let activities: HashMap<String, _> = activities_repo::list_activities(pool)
        .await?
        .into_iter()
        .map(|row| (row.name.clone(), row))
        .collect();

    let mut parsed = Vec::new();
    for reg in registrations_repo::list_positioned_for_email(pool, email).await? {
        if RegistrationStatus::parse(&reg.status) != Some(RegistrationStatus::Enrolled) {
            continue;
        }
        let Some(row) = activities.get(&reg.activity_name) else {
            continue;
        };
        match parse_schedule(&row.schedule) {
            Ok(schedule) => parsed.push((row, schedule)),
            Err(e) => warn!(activity = %row.name, error = %e, "skipping unparseable schedule"),
        }
    }

    let events: Vec<CalendarEvent<'_>> = parsed
        .iter()
        .map(|(row, schedule)| CalendarEvent {
            activity: &row.name,
            description: &row.description,
            schedule,
        })
        .collect();
    Ok(render_calendar(&events, today, now))
}

pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if out.is_empty() {
        out.push_str("activity");
    }
    out
}

fn ical_day(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Splits a content line into 75-octet pieces without cutting a UTF-8
/// sequence; continuation lines start with a single space.
fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut current = 0;
    for c in line.chars() {
        let width = c.len_utf8();
        if current + width > MAX_LINE_OCTETS {
            out.push_str("\r\n ");
            current = 1;
        }
        out.push(c);
        current += width;
    }
    out
}
