use serde::Serialize;
use sqlx::SqlitePool;
use std::borrow::Cow;

use crate::database::registrations_repo;
use crate::error::{AppError, AppResult};
use crate::i18n::Msg;

const CSV_HEADER: &str = "activity,email,status,waitlist_position,registered_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Missing format means CSV.
    pub fn parse(raw: Option<&str>) -> AppResult<Self> {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("csv") => Ok(ExportFormat::Csv),
            Some("json") => Ok(ExportFormat::Json),
            Some(other) => Err(AppError::Invalid(Msg::InvalidExportFormat {
                format: other.to_string(),
            })),
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExportRecord {
    pub activity: String,
    pub email: String,
    pub status: String,
    pub waitlist_position: Option<i64>,
    pub registered_at: Option<String>,
}

pub async fn load_export_records(pool: &SqlitePool) -> AppResult<Vec<ExportRecord>> {
    let rows = registrations_repo::list_positioned_all(pool).await?;
    Ok(rows
        .into_iter()
        .map(|r| ExportRecord {
            activity: r.activity_name,
            email: r.email,
            status: r.status,
            waitlist_position: r.waitlist_position,
            registered_at: r.created_at,
        })
        .collect())
}

pub fn render(records: &[ExportRecord], format: ExportFormat) -> AppResult<String> {
    match format {
        ExportFormat::Csv => Ok(render_csv(records)),
        ExportFormat::Json => serde_json::to_string_pretty(records)
            .map_err(|e| AppError::Internal(format!("export serialization failed: {}", e))),
    }
}

pub fn render_csv(records: &[ExportRecord]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push_str("\r\n");
    for r in records {
        let position = r.waitlist_position.map(|p| p.to_string()).unwrap_or_default();
        let fields = [
            csv_field(&r.activity),
            csv_field(&r.email),
            csv_field(&r.status),
            Cow::Owned(position),
            csv_field(r.registered_at.as_deref().unwrap_or("")),
        ];
        out.push_str(&fields.join(","));
        out.push_str("\r\n");
    }
    out
}

fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
