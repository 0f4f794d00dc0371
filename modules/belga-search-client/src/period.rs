//! Relative search periods, computed in the newsroom's default timezone
//! so "today" matches what the desk sees.

use chrono::{Datelike, Duration, Months, NaiveDate, Utc};
use chrono_tz::Tz;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    Yesterday,
    ThisWeek,
    Week,
    Month,
    Year,
}

impl Period {
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "day" => Some(Self::Day),
            "yesterday" => Some(Self::Yesterday),
            "this-week" => Some(Self::ThisWeek),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Yesterday => "yesterday",
            Self::ThisWeek => "this-week",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// `(start, end)` dates for this period, ending today.
    pub fn date_range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = match self {
            Self::Day => today,
            Self::Yesterday => today - Duration::days(1),
            // the Monday of the current week, today included
            Self::ThisWeek => {
                today - Duration::days(today.weekday().num_days_from_monday() as i64)
            }
            Self::Week => today - Duration::days(7),
            Self::Month => today.checked_sub_months(Months::new(1)).unwrap_or(today),
            Self::Year => today.checked_sub_months(Months::new(12)).unwrap_or(today),
        };
        (start, today)
    }
}

/// Today's date on the newsroom wall clock.
pub fn local_today(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn this_week_starts_on_monday() {
        // 2026-08-26 is a Wednesday
        let (start, end) = Period::ThisWeek.date_range(date(2026, 8, 26));
        assert_eq!(start, date(2026, 8, 24));
        assert_eq!(end, date(2026, 8, 26));
        // a Monday keeps its own date
        let (start, _) = Period::ThisWeek.date_range(date(2026, 8, 24));
        assert_eq!(start, date(2026, 8, 24));
    }

    #[test]
    fn fixed_offsets_shift_backward() {
        let today = date(2026, 3, 31);
        assert_eq!(Period::Day.date_range(today).0, today);
        assert_eq!(Period::Yesterday.date_range(today).0, date(2026, 3, 30));
        assert_eq!(Period::Week.date_range(today).0, date(2026, 3, 24));
        // no Feb 31st, chrono clamps
        assert_eq!(Period::Month.date_range(today).0, date(2026, 2, 28));
        assert_eq!(Period::Year.date_range(today).0, date(2025, 3, 31));
    }

    #[test]
    fn loose_parsing_round_trips() {
        for period in [
            Period::Day,
            Period::Yesterday,
            Period::ThisWeek,
            Period::Week,
            Period::Month,
            Period::Year,
        ] {
            assert_eq!(Period::from_str_loose(period.as_str()), Some(period));
        }
        assert_eq!(Period::from_str_loose("fortnight"), None);
    }
}
