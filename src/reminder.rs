use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Local wall-clock instant with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "NaiveDateTime", into = "NaiveDateTime")]
pub struct ReminderDueTime(NaiveDateTime);

impl ReminderDueTime {
    pub fn new(inner: NaiveDateTime) -> Self {
        let normalized = inner
            .with_nanosecond(0)
            .and_then(|dt| dt.with_second(0))
            .expect("Zero seconds and nanoseconds are always valid.");
        Self(normalized)
    }

    /// Builds a due time from calendar fields, `None` if they do not form a valid date/time.
    pub fn from_parts(day: u32, month: u32, year: i32, hour: u32, minute: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, minute, 0))
            .map(Self)
    }

    pub fn datetime(&self) -> &NaiveDateTime {
        &self.0
    }

    pub fn into_datetime(self) -> NaiveDateTime {
        self.0
    }
}

impl From<NaiveDateTime> for ReminderDueTime {
    fn from(value: NaiveDateTime) -> Self {
        Self::new(value)
    }
}

impl From<ReminderDueTime> for NaiveDateTime {
    fn from(value: ReminderDueTime) -> Self {
        value.0
    }
}

impl fmt::Display for ReminderDueTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%d/%m/%Y %H:%M"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub text: String,
    pub due_at: ReminderDueTime,
}

impl Reminder {
    pub fn new(text: impl Into<String>, due_at: ReminderDueTime) -> Self {
        Self {
            text: text.into(),
            due_at,
        }
    }
}

impl fmt::Display for Reminder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.due_at, self.text)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
    use proptest_arbitrary_interop::arb;

    use super::*;

    #[test]
    pub fn from_parts_rejects_impossible_dates() {
        assert!(ReminderDueTime::from_parts(31, 2, 2030, 10, 0).is_none());
        assert!(ReminderDueTime::from_parts(1, 13, 2030, 10, 0).is_none());
        assert!(ReminderDueTime::from_parts(1, 1, 2030, 24, 0).is_none());
        assert!(ReminderDueTime::from_parts(1, 1, 2030, 23, 60).is_none());
        assert!(ReminderDueTime::from_parts(29, 2, 2028, 23, 59).is_some());
    }

    #[test]
    pub fn reminder_is_displayed_with_date_then_text() {
        let due_at = ReminderDueTime::from_parts(5, 3, 2030, 9, 7).unwrap();
        let reminder = Reminder::new("Dentist", due_at);

        assert_eq!(reminder.to_string(), "05/03/2030 09:07 - Dentist");
    }

    #[test]
    pub fn due_time_serializes_as_plain_datetime() {
        let due_at = ReminderDueTime::new(NaiveDateTime::new(
            NaiveDate::from_ymd_opt(2030, 1, 2).unwrap(),
            NaiveTime::from_hms_opt(3, 4, 0).unwrap(),
        ));

        let json = serde_json::to_string(&due_at).unwrap();

        assert_eq!(json, "\"2030-01-02T03:04:00\"");
    }

    proptest::proptest! {
        #[test]
        fn due_time_is_truncated_to_minute(datetime in arb::<NaiveDateTime>()) {
            let due_at = ReminderDueTime::new(datetime);

            assert_eq!(due_at.datetime().second(), 0);
            assert_eq!(due_at.datetime().nanosecond(), 0);
            assert_eq!(due_at.datetime().date(), datetime.date());
            assert_eq!(due_at.datetime().hour(), datetime.hour());
            assert_eq!(due_at.datetime().minute(), datetime.minute());
        }
    }
}
