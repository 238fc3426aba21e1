use serde::Serialize;
use std::fmt;

// One row per (activity, email); `seq` doubles as the waitlist order.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RegistrationsRow {
    pub seq: i64,
    pub activity_name: String,
    pub email: String,
    pub status: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl RegistrationsRow {
    pub fn status(&self) -> RegistrationStatus {
        RegistrationStatus::parse(&self.status).unwrap_or(RegistrationStatus::Waitlisted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Enrolled,
    Waitlisted,
}

impl RegistrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RegistrationStatus::Enrolled => "enrolled",
            RegistrationStatus::Waitlisted => "waitlisted",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "enrolled" => Some(RegistrationStatus::Enrolled),
            "waitlisted" => Some(RegistrationStatus::Waitlisted),
            _ => None,
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
