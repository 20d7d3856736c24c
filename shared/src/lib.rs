//! Shared types for the kasmoni service
//!
//! Entity row types, the unified error system, month arithmetic and
//! small utilities used by the server and its API consumers.

pub mod error;
pub mod models;
pub mod types;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use http;
pub use serde::{Deserialize, Serialize};
pub use types::YearMonth;
