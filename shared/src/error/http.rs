//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::MemberNotFound
            | Self::GroupNotFound
            | Self::SlotNotFound
            | Self::PaymentNotFound
            | Self::BankNotFound
            | Self::UserNotFound
            | Self::MessageNotFound
            | Self::ResetRequestNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::MemberNationalIdExists
            | Self::GroupHasSlots
            | Self::SlotMonthTaken
            | Self::SlotHasPayments
            | Self::PaymentInvalidTransition
            | Self::BankNameExists
            | Self::BankInUse
            | Self::UserEmailExists
            | Self::ResetRequestAlreadyProcessed => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated | Self::TokenExpired | Self::TokenInvalid => {
                StatusCode::UNAUTHORIZED
            }

            // 403 Forbidden
            Self::AccountDisabled
            | Self::PermissionDenied
            | Self::AdminRequired
            | Self::SuperUserRequired
            | Self::CannotModifySelf => StatusCode::FORBIDDEN,

            // 500 Internal Server Error
            Self::InternalError | Self::DatabaseError | Self::ConfigError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request (default for validation/business errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
