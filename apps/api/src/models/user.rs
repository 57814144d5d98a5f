use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    /// "free" | "pro" | "enterprise"
    pub subscription_tier: String,
    pub created_at: DateTime<Utc>,
}
