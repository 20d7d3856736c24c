//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! SQLite TEXT has no built-in length enforcement, so limits live here.
//! Every error carries a `field` detail naming the offending input.

use chrono::NaiveDate;

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Names: member first/last name, group, bank, display name
pub const MAX_NAME_LEN: usize = 200;

/// Notes, descriptions, message subjects
pub const MAX_NOTE_LEN: usize = 500;

/// Message bodies
pub const MAX_MESSAGE_LEN: usize = 5000;

/// Short identifiers: phone, national id, account number
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Addresses
pub const MAX_ADDRESS_LEN: usize = 500;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::field(field, format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::field(
            field,
            format!("{field} is too long ({} chars, max {max_len})", value.len()),
        ));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::field(
            field,
            format!("{field} is too long ({} chars, max {max_len})", v.len()),
        ));
    }
    Ok(())
}

/// Validate an optional e-mail address (length and a single `@` with text on both sides)
pub fn validate_optional_email(value: &Option<String>, field: &str) -> Result<(), AppError> {
    if let Some(v) = value {
        validate_email(v, field)?;
    }
    Ok(())
}

/// Validate a required e-mail address
pub fn validate_email(value: &str, field: &str) -> Result<(), AppError> {
    validate_required_text(value, field, MAX_EMAIL_LEN)?;
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.contains('@')
        }
        None => false,
    };
    if !valid {
        return Err(AppError::field(field, format!("{field} is not a valid e-mail address")));
    }
    Ok(())
}

/// Validate an optional calendar date in `YYYY-MM-DD` form
pub fn validate_optional_date(value: &Option<String>, field: &str) -> Result<(), AppError> {
    if let Some(v) = value
        && NaiveDate::parse_from_str(v, "%Y-%m-%d").is_err()
    {
        return Err(AppError::field(
            field,
            format!("{field} must be a date in YYYY-MM-DD format"),
        ));
    }
    Ok(())
}

/// Validate a money amount: finite and strictly positive
pub fn validate_positive_amount(value: f64, field: &str) -> Result<(), AppError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::field(field, format!("{field} must be greater than zero")));
    }
    Ok(())
}

/// Validate a record id supplied by a caller
pub fn validate_id(value: i64, field: &str) -> Result<(), AppError> {
    if value <= 0 {
        return Err(AppError::field(field, format!("{field} must be a positive id")));
    }
    Ok(())
}

/// Trim, and map empty strings to `None`
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ErrorCode;

    fn field_of(err: &AppError) -> Option<String> {
        err.details
            .as_ref()
            .and_then(|d| d.get("field"))
            .and_then(|v| v.as_str())
            .map(String::from)
    }

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Anna", "first_name", MAX_NAME_LEN).is_ok());

        let err = validate_required_text("  ", "first_name", MAX_NAME_LEN).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(field_of(&err).as_deref(), Some("first_name"));

        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(validate_required_text(&long, "first_name", MAX_NAME_LEN).is_err());
    }

    #[test]
    fn test_optional_text() {
        assert!(validate_optional_text(&None, "notes", 5).is_ok());
        assert!(validate_optional_text(&Some("abc".into()), "notes", 5).is_ok());
        assert!(validate_optional_text(&Some("abcdef".into()), "notes", 5).is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("a@b.sr", "email").is_ok());
        assert!(validate_email("no-at-sign", "email").is_err());
        assert!(validate_email("@b.sr", "email").is_err());
        assert!(validate_email("a@b", "email").is_err());
        assert!(validate_email("a@b@c.sr", "email").is_err());
        assert!(validate_optional_email(&None, "email").is_ok());
    }

    #[test]
    fn test_date_amount_id() {
        assert!(validate_optional_date(&Some("1990-02-28".into()), "birth_date").is_ok());
        assert!(validate_optional_date(&Some("1990-02-30".into()), "birth_date").is_err());
        assert!(validate_optional_date(&Some("28-02-1990".into()), "birth_date").is_err());

        assert!(validate_positive_amount(0.01, "amount").is_ok());
        assert!(validate_positive_amount(0.0, "amount").is_err());
        assert!(validate_positive_amount(f64::NAN, "amount").is_err());

        assert!(validate_id(1, "member_id").is_ok());
        assert!(validate_id(0, "member_id").is_err());
        assert!(validate_id(-5, "member_id").is_err());
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(Some("  x ".into())), Some("x".into()));
        assert_eq!(normalize_optional(Some("   ".into())), None);
        assert_eq!(normalize_optional(None), None);
    }
}
