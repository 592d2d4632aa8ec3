use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Settings {
    pub user_id: Uuid,
    pub notify_on_follow: bool,
    pub notify_on_comment: bool,
    pub public_profile: bool,
    pub updated_at: DateTime<Utc>,
}

impl Settings {
    /// Row-equivalent defaults for accounts that never saved settings
    pub fn defaults(user_id: Uuid) -> Self {
        Self {
            user_id,
            notify_on_follow: true,
            notify_on_comment: true,
            public_profile: true,
            updated_at: Utc::now(),
        }
    }
}
