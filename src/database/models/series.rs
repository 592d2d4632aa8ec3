use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Closed enums for the catalog; stored as TEXT with CHECK constraints
pub const KINDS: &[&str] = &["anime", "manga"];
pub const STATUSES: &[&str] = &["airing", "finished", "upcoming"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Series {
    pub id: Uuid,
    pub title: String,
    pub kind: String,
    pub status: String,
    pub synopsis: Option<String>,
    pub episodes: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
