//! Month helpers for handlers

use shared::YearMonth;

use crate::utils::AppError;

/// Parse an optional `YYYY-MM` query value into a month
pub fn parse_month_param(value: Option<&str>, field: &str) -> Result<Option<YearMonth>, AppError> {
    match value {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<YearMonth>()
            .map(Some)
            .map_err(|e| AppError::field(field, e.to_string())),
    }
}

/// The last `count` months ending at `now`, oldest first
pub fn trailing_months(now: YearMonth, count: u32) -> Vec<YearMonth> {
    let count = count as i32;
    (0..count).map(|i| now.add_months(i - count + 1)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_month_param() {
        assert_eq!(parse_month_param(None, "from").unwrap(), None);
        assert_eq!(parse_month_param(Some(" "), "from").unwrap(), None);
        assert_eq!(
            parse_month_param(Some("2024-03"), "from").unwrap(),
            Some(ym("2024-03"))
        );
        let err = parse_month_param(Some("2024-13"), "to").unwrap_err();
        assert_eq!(err.code, shared::ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_trailing_months_crosses_year() {
        let months = trailing_months(ym("2024-02"), 4);
        assert_eq!(
            months,
            vec![ym("2023-11"), ym("2023-12"), ym("2024-01"), ym("2024-02")]
        );
        assert!(trailing_months(ym("2024-02"), 0).is_empty());
    }
}
