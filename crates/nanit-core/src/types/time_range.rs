//! Calendar query window.

use chrono::{DateTime, Duration, Utc};

use crate::error::{Error, InvalidInputError};

/// A half-open window of epoch seconds used for calendar queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: i64,
    end: i64,
}

impl TimeRange {
    /// Create a range from epoch seconds. `start` must be positive and before `end`.
    pub fn new(start: i64, end: i64) -> Result<Self, Error> {
        if start <= 0 {
            return Err(InvalidInputError::TimeRange {
                start,
                end,
                reason: "start must be a positive epoch timestamp".to_string(),
            }
            .into());
        }
        if start >= end {
            return Err(InvalidInputError::TimeRange {
                start,
                end,
                reason: "start must be before end".to_string(),
            }
            .into());
        }
        Ok(Self { start, end })
    }

    /// The `hours` leading up to `now`.
    pub fn last_hours(now: DateTime<Utc>, hours: u32) -> Result<Self, Error> {
        let start = now
            .checked_sub_signed(Duration::hours(i64::from(hours)))
            .ok_or_else(|| InvalidInputError::TimeRange {
                start: i64::MIN,
                end: now.timestamp(),
                reason: format!("{} hours reaches before the earliest representable time", hours),
            })?;
        Self::new(start.timestamp(), now.timestamp())
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn rejects_empty_and_inverted() {
        assert!(TimeRange::new(100, 100).is_err());
        assert!(TimeRange::new(200, 100).is_err());
        assert!(TimeRange::new(0, 100).is_err());
    }

    #[test]
    fn last_hours_ends_at_now() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let range = TimeRange::last_hours(now, 24).unwrap();
        assert_eq!(range.end(), now.timestamp());
        assert_eq!(range.end() - range.start(), 24 * 3600);
    }

    #[test]
    fn zero_hours_is_rejected() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert!(TimeRange::last_hours(now, 0).is_err());
    }

    #[test]
    fn huge_window_is_an_error() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let err = TimeRange::last_hours(now, u32::MAX).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidInput(InvalidInputError::TimeRange { .. })
        ));
    }
}
