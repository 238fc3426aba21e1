use serde::Serialize;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NotificationsRow {
    pub id: String,
    pub recipient_email: String,
    pub kind: String,
    pub activity_name: String,
    pub waitlist_position: Option<i64>,
    pub created_at: String,
    pub read_at: Option<String>,
    pub delivered_at: Option<String>,
    pub delivery_attempts: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Enrolled,
    Waitlisted,
    Promoted,
    Unregistered,
    ActivityCancelled,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Enrolled => "enrolled",
            NotificationKind::Waitlisted => "waitlisted",
            NotificationKind::Promoted => "promoted",
            NotificationKind::Unregistered => "unregistered",
            NotificationKind::ActivityCancelled => "activity_cancelled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "enrolled" => Some(NotificationKind::Enrolled),
            "waitlisted" => Some(NotificationKind::Waitlisted),
            "promoted" => Some(NotificationKind::Promoted),
            "unregistered" => Some(NotificationKind::Unregistered),
            "activity_cancelled" => Some(NotificationKind::ActivityCancelled),
            _ => None,
        }
    }
}
