//! Validation Traits and Parsers
//!
//! Common validation patterns extracted from route handlers, plus strict
//! parsers for the wire formats of dates (YYYY-MM-DD) and times of day
//! (HH:MM:SS).

use chrono::{NaiveDate, NaiveTime};

use crate::error::{ApiError, ApiResult};

/// Trait for validating non-empty strings.
///
/// # Example
/// ```ignore
/// use deskline_api::validation::ValidateNonEmpty;
///
/// fn create_shift(name: &str) -> ApiResult<()> {
///     name.validate_non_empty("name")?;
///     // ... rest of logic
/// }
/// ```
pub trait ValidateNonEmpty {
    /// Validate that the value is non-empty.
    ///
    /// # Errors
    /// Returns `ApiError::missing_field` if the value is empty or whitespace-only.
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()>;
}

impl ValidateNonEmpty for str {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        if self.trim().is_empty() {
            return Err(ApiError::missing_field(field_name));
        }
        Ok(())
    }
}

impl ValidateNonEmpty for &str {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        (*self).validate_non_empty(field_name)
    }
}

impl ValidateNonEmpty for String {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        self.as_str().validate_non_empty(field_name)
    }
}

impl<T: ValidateNonEmpty> ValidateNonEmpty for Option<T> {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        match self {
            Some(value) => value.validate_non_empty(field_name),
            None => Err(ApiError::missing_field(field_name)),
        }
    }
}

/// Trait for validating numeric ranges.
pub trait ValidateRange {
    /// Validate that the value lies in [min, max].
    fn validate_range(&self, field_name: &str, min: Self, max: Self) -> ApiResult<()>
    where
        Self: Sized;
}

macro_rules! impl_validate_range {
    ($($t:ty),*) => {
        $(
            impl ValidateRange for $t {
                fn validate_range(&self, field_name: &str, min: Self, max: Self) -> ApiResult<()> {
                    if *self < min || *self > max {
                        return Err(ApiError::invalid_range(field_name, min, max));
                    }
                    Ok(())
                }
            }
        )*
    };
}

impl_validate_range!(i32, i64, u32, usize);

// ============================================================================
// WIRE FORMAT PARSERS
// ============================================================================

/// Parse a `YYYY-MM-DD` date field.
pub fn parse_date(field_name: &str, value: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::invalid_format(field_name, "YYYY-MM-DD"))
}

/// Parse an `HH:MM:SS` time-of-day field.
pub fn parse_time(field_name: &str, value: &str) -> ApiResult<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M:%S")
        .map_err(|_| ApiError::invalid_format(field_name, "HH:MM:SS"))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_non_empty_rejects_whitespace() {
        assert!("  ".validate_non_empty("name").is_err());
        assert!("ok".validate_non_empty("name").is_ok());
        let missing: Option<String> = None;
        assert!(missing.validate_non_empty("name").is_err());
    }

    #[test]
    fn test_range_bounds_inclusive() {
        assert!(1i32.validate_range("min_staff", 1, 50).is_ok());
        assert!(50i32.validate_range("min_staff", 1, 50).is_ok());
        assert!(0i32.validate_range("min_staff", 1, 50).is_err());
        assert!(51i32.validate_range("min_staff", 1, 50).is_err());
    }

    #[test]
    fn test_date_parser() {
        assert_eq!(
            parse_date("date", "2025-03-10").unwrap(),
            "2025-03-10".parse::<NaiveDate>().unwrap()
        );
        let err = parse_date("date", "10/03/2025").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFormat);
    }

    #[test]
    fn test_time_parser() {
        assert!(parse_time("start", "22:00:00").is_ok());
        assert!(parse_time("start", "22:00").is_err());
        assert!(parse_time("start", "25:00:00").is_err());
    }
}
