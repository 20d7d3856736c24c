//! Message Model (admin-to-member messaging)

use serde::{Deserialize, Serialize};

/// Message entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    /// Recipient member; `None` is a broadcast to all members
    pub member_id: Option<i64>,
    pub subject: String,
    pub body: String,
    pub is_read: bool,
    pub created_at: i64,
}

/// Send message payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageCreate {
    pub member_id: Option<i64>,
    pub subject: String,
    pub body: String,
}
