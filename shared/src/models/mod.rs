//! Data models
//!
//! Shared between the server and API consumers.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are positive `i64` (SQLite INTEGER PRIMARY KEY).

pub mod auth_log;
pub mod bank;
pub mod group;
pub mod member;
pub mod member_status;
pub mod message;
pub mod password_reset;
pub mod payment;
pub mod slot;
pub mod user;

// Re-exports
pub use auth_log::*;
pub use bank::*;
pub use group::*;
pub use member::*;
pub use member_status::*;
pub use message::*;
pub use password_reset::*;
pub use payment::*;
pub use slot::*;
pub use user::*;
