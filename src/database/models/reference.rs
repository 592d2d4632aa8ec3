use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Shared row shape for the reference-data tables (genres, tags, studios,
/// streaming platforms). The tables are structurally identical; which one
/// a value came from is carried by the service layer, not the row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefEntity {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
