//! Drill-down calendar state: year → month → week → day.
//!
//! Weeks run Sunday to Saturday. Every level knows the inclusive date range
//! it covers, which is what the task list is fetched with.

use chrono::{Datelike, Days, NaiveDate};

use crate::models::TaskFilter;
use crate::utils::format_date;

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    pub fn to_filter(&self) -> TaskFilter {
        TaskFilter::between(format_date(self.start), format_date(self.end))
    }
}

/// Sunday on or before `date`, clamped to the earliest representable day.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_sunday())))
        .unwrap_or(NaiveDate::MIN)
}

pub fn week_of(date: NaiveDate) -> DateRange {
    let start = start_of_week(date);
    DateRange {
        start,
        end: start.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX),
    }
}

pub fn month_of(date: NaiveDate) -> DateRange {
    let start = date.with_day(1).unwrap_or(date);
    let end = start
        .checked_add_months(chrono::Months::new(1))
        .and_then(|next| next.pred_opt())
        // Only the last representable month has no successor.
        .unwrap_or(NaiveDate::MAX);
    DateRange { start, end }
}

/// `None` only for years outside chrono's range.
pub fn year_of(year: i32) -> Option<DateRange> {
    Some(DateRange {
        start: NaiveDate::from_ymd_opt(year, 1, 1)?,
        end: NaiveDate::from_ymd_opt(year, 12, 31)?,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Year,
    Month,
    Week,
    Day,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    level: Level,
    year: DateRange,
    month: Option<DateRange>,
    week: Option<DateRange>,
    day: Option<NaiveDate>,
}

impl Navigator {
    pub fn new(year: i32) -> Option<Self> {
        Some(Self {
            level: Level::Year,
            year: year_of(year)?,
            month: None,
            week: None,
            day: None,
        })
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn open_month(&mut self, date: NaiveDate) {
        self.month = Some(month_of(date));
        self.level = Level::Month;
    }

    pub fn open_week(&mut self, date: NaiveDate) {
        self.week = Some(week_of(date));
        self.level = Level::Week;
    }

    pub fn open_day(&mut self, date: NaiveDate) {
        self.day = Some(date);
        self.level = Level::Day;
    }

    /// One level up; a no-op at the year level.
    pub fn back(&mut self) {
        self.level = match self.level {
            Level::Day => Level::Week,
            Level::Week => Level::Month,
            Level::Month | Level::Year => Level::Year,
        };
    }

    pub fn range(&self) -> DateRange {
        match self.level {
            Level::Year => self.year,
            Level::Month => self.month.unwrap_or(self.year),
            Level::Week => self.week.unwrap_or(self.year),
            Level::Day => match self.day {
                Some(day) => DateRange { start: day, end: day },
                None => self.year,
            },
        }
    }

    /// First day of each month in the selected year.
    pub fn months(&self) -> Vec<NaiveDate> {
        let year = self.year.start.year();
        (1..=12)
            .filter_map(|m| NaiveDate::from_ymd_opt(year, m, 1))
            .collect()
    }

    /// Sunday of every week that overlaps the selected month.
    pub fn weeks(&self) -> Vec<NaiveDate> {
        let Some(month) = self.month else {
            return Vec::new();
        };
        let mut weeks = Vec::new();
        let mut cursor = start_of_week(month.start);
        while cursor <= month.end {
            weeks.push(cursor);
            let Some(next) = cursor.checked_add_days(Days::new(7)) else {
                break;
            };
            cursor = next;
        }
        weeks
    }

    pub fn days(&self) -> Vec<NaiveDate> {
        self.week.map(|w| w.days().collect()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weeks_at_the_calendar_edges_are_clamped() {
        let last = NaiveDate::MAX;
        let mut nav = Navigator::new(last.year()).unwrap();
        nav.open_month(last);
        nav.open_week(last);
        let week = nav.range();
        assert_eq!(week.end, NaiveDate::MAX);
        assert!(week.contains(last));
        assert!(!nav.days().is_empty());
        assert_eq!(month_of(last).end, NaiveDate::MAX);

        let first = week_of(NaiveDate::MIN);
        assert_eq!(first.start, NaiveDate::MIN);
        assert!(first.contains(NaiveDate::MIN));
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn weeks_start_on_sunday() {
        // 2026-03-10 is a Tuesday
        let week = week_of(d(2026, 3, 10));
        assert_eq!(week.start, d(2026, 3, 8));
        assert_eq!(week.end, d(2026, 3, 14));
        assert_eq!(week_of(d(2026, 3, 8)).start, d(2026, 3, 8));
    }

    #[test]
    fn month_range_handles_leap_february() {
        assert_eq!(month_of(d(2028, 2, 17)).end, d(2028, 2, 29));
        assert_eq!(month_of(d(2026, 12, 5)).end, d(2026, 12, 31));
    }

    #[test]
    fn range_filter_uses_fixed_width_strings() {
        let filter = month_of(d(2026, 3, 1)).to_filter();
        assert_eq!(filter.start.as_deref(), Some("2026-03-01"));
        assert_eq!(filter.end.as_deref(), Some("2026-03-31"));
    }

    #[test]
    fn drill_down_and_back() {
        let mut nav = Navigator::new(2026).unwrap();
        assert_eq!(nav.months().len(), 12);
        assert_eq!(nav.range(), year_of(2026).unwrap());

        nav.open_month(d(2026, 3, 1));
        assert_eq!(nav.level(), Level::Month);
        let weeks = nav.weeks();
        assert_eq!(weeks.first(), Some(&d(2026, 3, 1)));
        assert_eq!(weeks.last(), Some(&d(2026, 3, 29)));

        nav.open_week(d(2026, 3, 10));
        assert_eq!(nav.days().len(), 7);
        assert!(nav.range().contains(d(2026, 3, 14)));

        nav.open_day(d(2026, 3, 10));
        assert_eq!(nav.range().start, nav.range().end);

        nav.back();
        assert_eq!(nav.level(), Level::Week);
        nav.back();
        nav.back();
        nav.back();
        assert_eq!(nav.level(), Level::Year);
    }
}
