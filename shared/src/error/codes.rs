//! Unified error codes for the kasmoni service
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Member errors
//! - 4xxx: Group and slot errors
//! - 5xxx: Payment errors
//! - 6xxx: Bank errors
//! - 7xxx: Administration errors (users, messages, reset requests)
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility with the dashboard frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1007,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Admin role required
    AdminRequired = 2003,
    /// Super user role required
    SuperUserRequired = 2006,
    /// Users cannot demote or deactivate themselves
    CannotModifySelf = 2007,

    // ==================== 3xxx: Member ====================
    /// Member not found
    MemberNotFound = 3001,
    /// National ID already registered
    MemberNationalIdExists = 3002,
    /// Member is inactive
    MemberInactive = 3003,
    /// CSV header missing or incomplete
    ImportHeaderInvalid = 3004,

    // ==================== 4xxx: Group ====================
    /// Group not found
    GroupNotFound = 4001,
    /// Group still has slots
    GroupHasSlots = 4002,
    /// Group end month precedes start month
    GroupInvalidPeriod = 4003,
    /// Slot not found
    SlotNotFound = 4101,
    /// Month already assigned in this group
    SlotMonthTaken = 4102,
    /// Month outside the group period
    SlotOutOfRange = 4103,
    /// Slot is referenced by payments
    SlotHasPayments = 4104,

    // ==================== 5xxx: Payment ====================
    /// Payment not found
    PaymentNotFound = 5001,
    /// Invalid payment amount
    PaymentInvalidAmount = 5002,
    /// Payment status transition not allowed
    PaymentInvalidTransition = 5003,
    /// Member holds no slot in the group
    PaymentNoSlot = 5004,

    // ==================== 6xxx: Bank ====================
    /// Bank not found
    BankNotFound = 6001,
    /// Bank name already exists
    BankNameExists = 6002,
    /// Bank is referenced by members or payments
    BankInUse = 6003,

    // ==================== 7xxx: Administration ====================
    /// User not found
    UserNotFound = 7001,
    /// User email already exists
    UserEmailExists = 7002,
    /// Message not found
    MessageNotFound = 7101,
    /// Password reset request not found
    ResetRequestNotFound = 7201,
    /// Password reset request already resolved or rejected
    ResetRequestAlreadyProcessed = 7202,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountDisabled => "Account is disabled",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::AdminRequired => "Only administrators can perform this action",
            ErrorCode::SuperUserRequired => "Only super users can perform this action",
            ErrorCode::CannotModifySelf => "You cannot change your own role or status",

            // Member
            ErrorCode::MemberNotFound => "Member not found",
            ErrorCode::MemberNationalIdExists => "A member with this national ID already exists",
            ErrorCode::MemberInactive => "Member is inactive",
            ErrorCode::ImportHeaderInvalid => "CSV header is missing or incomplete",

            // Group
            ErrorCode::GroupNotFound => "Group not found",
            ErrorCode::GroupHasSlots => "Group still has assigned slots",
            ErrorCode::GroupInvalidPeriod => "Group end month must not precede start month",
            ErrorCode::SlotNotFound => "Slot not found",
            ErrorCode::SlotMonthTaken => "This month is already assigned in the group",
            ErrorCode::SlotOutOfRange => "Month is outside the group period",
            ErrorCode::SlotHasPayments => "Slot is referenced by payments",

            // Payment
            ErrorCode::PaymentNotFound => "Payment not found",
            ErrorCode::PaymentInvalidAmount => "Payment amount must be positive",
            ErrorCode::PaymentInvalidTransition => "Payment status transition is not allowed",
            ErrorCode::PaymentNoSlot => "Member holds no slot in this group",

            // Bank
            ErrorCode::BankNotFound => "Bank not found",
            ErrorCode::BankNameExists => "Bank name already exists",
            ErrorCode::BankInUse => "Bank is referenced by members or payments",

            // Administration
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::UserEmailExists => "A user with this email already exists",
            ErrorCode::MessageNotFound => "Message not found",
            ErrorCode::ResetRequestNotFound => "Password reset request not found",
            ErrorCode::ResetRequestAlreadyProcessed => {
                "Password reset request has already been processed"
            }

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error, please try again",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1007 => Ok(ErrorCode::AccountDisabled),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2003 => Ok(ErrorCode::AdminRequired),
            2006 => Ok(ErrorCode::SuperUserRequired),
            2007 => Ok(ErrorCode::CannotModifySelf),

            // Member
            3001 => Ok(ErrorCode::MemberNotFound),
            3002 => Ok(ErrorCode::MemberNationalIdExists),
            3003 => Ok(ErrorCode::MemberInactive),
            3004 => Ok(ErrorCode::ImportHeaderInvalid),

            // Group
            4001 => Ok(ErrorCode::GroupNotFound),
            4002 => Ok(ErrorCode::GroupHasSlots),
            4003 => Ok(ErrorCode::GroupInvalidPeriod),
            4101 => Ok(ErrorCode::SlotNotFound),
            4102 => Ok(ErrorCode::SlotMonthTaken),
            4103 => Ok(ErrorCode::SlotOutOfRange),
            4104 => Ok(ErrorCode::SlotHasPayments),

            // Payment
            5001 => Ok(ErrorCode::PaymentNotFound),
            5002 => Ok(ErrorCode::PaymentInvalidAmount),
            5003 => Ok(ErrorCode::PaymentInvalidTransition),
            5004 => Ok(ErrorCode::PaymentNoSlot),

            // Bank
            6001 => Ok(ErrorCode::BankNotFound),
            6002 => Ok(ErrorCode::BankNameExists),
            6003 => Ok(ErrorCode::BankInUse),

            // Administration
            7001 => Ok(ErrorCode::UserNotFound),
            7002 => Ok(ErrorCode::UserEmailExists),
            7101 => Ok(ErrorCode::MessageNotFound),
            7201 => Ok(ErrorCode::ResetRequestNotFound),
            7202 => Ok(ErrorCode::ResetRequestAlreadyProcessed),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::NotFound.code(), 3);
        assert_eq!(ErrorCode::AdminRequired.code(), 2003);
        assert_eq!(ErrorCode::MemberNotFound.code(), 3001);
        assert_eq!(ErrorCode::PaymentInvalidTransition.code(), 5003);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
    }

    #[test]
    fn test_try_from_known_and_unknown() {
        assert_eq!(ErrorCode::try_from(4102), Ok(ErrorCode::SlotMonthTaken));
        assert_eq!(ErrorCode::try_from(6003), Ok(ErrorCode::BankInUse));
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ErrorCode::GroupHasSlots).unwrap();
        assert_eq!(json, "4002");

        let code: ErrorCode = serde_json::from_str("7202").unwrap();
        assert_eq!(code, ErrorCode::ResetRequestAlreadyProcessed);

        assert!(serde_json::from_str::<ErrorCode>("12345").is_err());
    }

    #[test]
    fn test_success_flag() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::ValidationFailed.is_success());
        assert!(ErrorCode::try_from(1u16).is_err());
    }
}
