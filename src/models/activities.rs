#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivitiesRow {
    pub name: String,
    pub description: String,
    pub schedule: String,
    pub max_participants: i64,
    pub waitlist_enabled: i64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}
