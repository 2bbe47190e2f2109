use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub is_superuser: bool,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Customer name in the "last first" order the payment provider expects.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub hashed_password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
}
