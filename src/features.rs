use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};

use crate::schema::CleanedRecord;

/// Canonical Monday-first ordering used whenever weekday aggregates are
/// reported, regardless of the order days first appear in the data.
pub const WEEKDAY_ORDER: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFeatures {
    /// Calendar month, 1-12.
    pub month: u32,
    pub weekday: Weekday,
    /// Hour of day, 0-23.
    pub hour_of_day: u32,
}

/// Pure calendar derivation; deterministic given the timestamp.
pub fn calendar_features(timestamp: DateTime<Utc>) -> CalendarFeatures {
    CalendarFeatures {
        month: timestamp.month(),
        weekday: timestamp.weekday(),
        hour_of_day: timestamp.hour(),
    }
}

/// Fills the derived calendar fields from `created_at`. An absent timestamp
/// leaves all three absent rather than zero-filled.
pub(crate) fn with_calendar_features(mut record: CleanedRecord) -> CleanedRecord {
    if let Some(ts) = record.created_at {
        let features = calendar_features(ts);
        record.month = Some(features.month);
        record.weekday = Some(features.weekday);
        record.hour_of_day = Some(features.hour_of_day);
    }
    record
}
