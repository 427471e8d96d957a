//! Target resolution - which calendar day a run goes after.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Weekday abbreviation as rendered by the booking calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayName {
    /// Sunday
    Sun,
    /// Monday
    Mon,
    /// Tuesday
    Tue,
    /// Wednesday
    Wed,
    /// Thursday
    Thu,
    /// Friday
    Fri,
    /// Saturday
    Sat,
}

impl DayName {
    /// Three letter label, as shown on the calendar widget.
    pub fn abbreviation(self) -> &'static str {
        match self {
            DayName::Sun => "Sun",
            DayName::Mon => "Mon",
            DayName::Tue => "Tue",
            DayName::Wed => "Wed",
            DayName::Thu => "Thu",
            DayName::Fri => "Fri",
            DayName::Sat => "Sat",
        }
    }
}

impl From<Weekday> for DayName {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Sun => DayName::Sun,
            Weekday::Mon => DayName::Mon,
            Weekday::Tue => DayName::Tue,
            Weekday::Wed => DayName::Wed,
            Weekday::Thu => DayName::Thu,
            Weekday::Fri => DayName::Fri,
            Weekday::Sat => DayName::Sat,
        }
    }
}

impl fmt::Display for DayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// The calendar day the orchestrator clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDate {
    /// Full date, kept for logs and reports
    pub date: NaiveDate,

    /// Weekday label matched against the calendar
    pub day_name: DayName,

    /// Day of month (1..=31) matched against the calendar
    pub day_number: u32,
}

impl TargetDate {
    /// Build from a calendar date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            date,
            day_name: date.weekday().into(),
            day_number: date.day(),
        }
    }

    /// Accessible name of the calendar button for this day, e.g. `"Mon 21"`.
    pub fn calendar_label(&self) -> String {
        format!("{} {}", self.day_name, self.day_number)
    }
}

impl fmt::Display for TargetDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.calendar_label(), self.date)
    }
}

/// Days to add in live mode to reach the next Monday or Wednesday session.
pub fn live_offset_days(today: Weekday) -> i64 {
    match today {
        Weekday::Sun => 1,
        Weekday::Mon => 2,
        Weekday::Tue => 1,
        Weekday::Wed => 5,
        Weekday::Thu => 4,
        Weekday::Fri => 3,
        Weekday::Sat => 2,
    }
}

/// Compute the day to book.
///
/// Rehearsal runs book the same weekday one week out. Live runs book the
/// next Monday or Wednesday according to [`live_offset_days`].
pub fn compute_target_date(now: NaiveDate, test_mode: bool) -> TargetDate {
    let offset = if test_mode {
        7
    } else {
        live_offset_days(now.weekday())
    };

    TargetDate::from_date(now + Duration::days(offset))
}
