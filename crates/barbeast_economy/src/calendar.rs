//! # Calendar Day Keys
//!
//! Every daily counter (battle credits cap, scan bonuses, login streaks) is
//! keyed by a `YYYY-MM-DD` string computed under one fixed UTC offset. The
//! key is derived once per action from the action's own timestamp and passed
//! to the pure transitions, so "today" never drifts mid-transition.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EconomyError, EconomyResult};

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Default day cutoff: midnight at UTC+9.
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;

/// A calendar day under the configured offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// Day containing `at` when observed at `offset`.
    #[must_use]
    pub fn from_instant(at: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self(at.with_timezone(&offset).date_naive())
    }

    /// Wraps a calendar date.
    #[must_use]
    pub const fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parses `YYYY-MM-DD`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateKey` for anything else.
    pub fn parse(key: &str) -> EconomyResult<Self> {
        // chrono accepts unpadded fields; keys must be the canonical width
        if key.len() != 10 {
            return Err(EconomyError::InvalidDateKey(key.to_string()));
        }
        NaiveDate::parse_from_str(key, DATE_KEY_FORMAT)
            .map(Self)
            .map_err(|_| EconomyError::InvalidDateKey(key.to_string()))
    }

    /// The previous calendar day.
    #[must_use]
    pub fn previous(self) -> Self {
        Self(self.0.pred_opt().unwrap_or(self.0))
    }

    /// The day `days` calendar days earlier, clamped at the earliest date.
    #[must_use]
    pub fn days_before(self, days: u32) -> Self {
        Self(
            self.0
                .checked_sub_days(Days::new(u64::from(days)))
                .unwrap_or(NaiveDate::MIN),
        )
    }

    /// The underlying date.
    #[must_use]
    pub const fn date(self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_KEY_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = EconomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DateKey {
    type Error = EconomyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DateKey> for String {
    fn from(key: DateKey) -> Self {
        key.to_string()
    }
}

/// Day-cutoff configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalendarConfig {
    /// Whole-hour UTC offset at which the day rolls over.
    pub utc_offset_hours: i32,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
        }
    }
}

impl CalendarConfig {
    /// Checks the offset is a real timezone offset.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` outside `-23..=23`.
    pub fn validate(&self) -> EconomyResult<()> {
        if !(-23..=23).contains(&self.utc_offset_hours) {
            return Err(EconomyError::InvalidConfig(format!(
                "utc_offset_hours {} outside -23..=23",
                self.utc_offset_hours
            )));
        }
        Ok(())
    }

    /// The offset as a chrono timezone. Falls back to UTC if unvalidated.
    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
    }
}

/// Timestamp and day keys for one economy action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionContext {
    /// When the action happened.
    pub at: DateTime<Utc>,
    /// Day key for `at`.
    pub today: DateKey,
    /// The day before `today`.
    pub yesterday: DateKey,
}

impl ActionContext {
    /// Builds the context for an action at `at`.
    #[must_use]
    pub fn new(at: DateTime<Utc>, calendar: &CalendarConfig) -> Self {
        let today = DateKey::from_instant(at, calendar.offset());
        Self {
            at,
            today,
            yesterday: today.previous(),
        }
    }

    /// Context for the current wall-clock time.
    #[must_use]
    pub fn now(calendar: &CalendarConfig) -> Self {
        Self::new(Utc::now(), calendar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_cutoff_is_midnight_at_offset() {
        let cal = CalendarConfig::default();
        // 14:59 UTC is 23:59 at +9
        let before = ActionContext::new(utc(2024, 3, 9, 14) + chrono::Duration::minutes(59), &cal);
        let after = ActionContext::new(utc(2024, 3, 9, 15), &cal);
        assert_eq!(before.today.to_string(), "2024-03-09");
        assert_eq!(after.today.to_string(), "2024-03-10");
        assert_eq!(after.yesterday, before.today);
    }

    #[test]
    fn test_previous_crosses_month_and_year() {
        assert_eq!(DateKey::parse("2024-03-01").unwrap().previous().to_string(), "2024-02-29");
        assert_eq!(DateKey::parse("2025-01-01").unwrap().previous().to_string(), "2024-12-31");
    }

    #[test]
    fn test_days_before() {
        let key = DateKey::parse("2024-03-02").unwrap();
        assert_eq!(key.days_before(0), key);
        assert_eq!(key.days_before(1), key.previous());
        assert_eq!(key.days_before(6).to_string(), "2024-02-25");
    }

    #[test]
    fn test_parse_rejects_malformed_keys() {
        for bad in ["2024-3-1", "2024/03/01", "", "2024-02-30", "20240301xx"] {
            assert!(DateKey::parse(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_serde_as_string() {
        let key = DateKey::parse("2024-07-04").unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"2024-07-04\"");
        let back: DateKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
        assert!(serde_json::from_str::<DateKey>("\"07/04/2024\"").is_err());
    }

    #[test]
    fn test_offset_validation() {
        assert!(CalendarConfig { utc_offset_hours: 24 }.validate().is_err());
        assert!(CalendarConfig { utc_offset_hours: -5 }.validate().is_ok());
    }
}
