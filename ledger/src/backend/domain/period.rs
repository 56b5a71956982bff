//! Period boundary computations for the accounting ledger.
//!
//! All calendar arithmetic lives here so it can be tested without touching the
//! services. Dates follow chrono's proleptic Gregorian calendar: month lengths
//! vary (28/29/30/31 days), February has 29 days in leap years, and the end of
//! December rolls over into January of the following year.

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use shared::Period;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeriodError {
    #[error("Invalid month {0}, expected 1-12")]
    InvalidMonth(u32),
    #[error("Year {0} is outside the supported calendar range")]
    YearOutOfRange(i32),
}

/// Check if a year is a leap year
pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Get the number of days in a given month and year
pub fn days_in_month(year: i32, month: u32) -> Result<u32, PeriodError> {
    match month {
        2 => Ok(if is_leap_year(year) { 29 } else { 28 }),
        4 | 6 | 9 | 11 => Ok(30),
        1 | 3 | 5 | 7 | 8 | 10 | 12 => Ok(31),
        _ => Err(PeriodError::InvalidMonth(month)),
    }
}

/// First and last day of a month, both inclusive.
///
/// The last day is the one before the 1st of the following month, so December
/// ends on the 31st and February follows the leap-year rule.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), PeriodError> {
    let length = days_in_month(year, month)?;
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or(PeriodError::YearOutOfRange(year))?;
    let last = NaiveDate::from_ymd_opt(year, month, length).ok_or(PeriodError::YearOutOfRange(year))?;
    Ok((first, last))
}

/// January 1st and December 31st of a year, both inclusive
pub fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate), PeriodError> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(PeriodError::YearOutOfRange(year))?;
    let last = NaiveDate::from_ymd_opt(year, 12, 31).ok_or(PeriodError::YearOutOfRange(year))?;
    Ok((first, last))
}

/// Inclusive date bounds of a period, `None` for an unbounded period
pub fn date_bounds(period: Period) -> Result<Option<(NaiveDate, NaiveDate)>, PeriodError> {
    match period {
        Period::Month { year, month } => month_bounds(year, month).map(Some),
        Period::Year(year) => year_bounds(year).map(Some),
        Period::Total => Ok(None),
    }
}

/// The calendar used to decide which day an instant belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CalendarZone {
    /// The system's local time zone, including its daylight saving rules
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl CalendarZone {
    pub fn utc() -> Self {
        CalendarZone::Fixed(Utc.fix())
    }

    /// Build a zone from an offset in minutes east of UTC
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(CalendarZone::Fixed)
    }

    /// Calendar date of an instant in this zone
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            CalendarZone::Local => instant.with_timezone(&Local).date_naive(),
            CalendarZone::Fixed(offset) => instant.with_timezone(offset).date_naive(),
        }
    }

    /// Today's date in this zone
    pub fn today(&self) -> NaiveDate {
        self.local_date(Utc::now())
    }

    /// First instant of a calendar day.
    ///
    /// When midnight does not exist locally (a daylight saving gap), the first
    /// valid instant after the gap is used.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_time(NaiveTime::default());
        match self {
            CalendarZone::Local => resolve_local(&Local, midnight),
            CalendarZone::Fixed(offset) => resolve_local(offset, midnight),
        }
    }

    /// Last instant of a calendar day (one nanosecond before the next day starts)
    pub fn end_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        match date.succ_opt() {
            Some(next) => self.start_of_day(next) - Duration::nanoseconds(1),
            None => DateTime::<Utc>::MAX_UTC,
        }
    }

    /// First and last instant of a period, `None` for an unbounded period
    pub fn instant_bounds(
        &self,
        period: Period,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, PeriodError> {
        Ok(date_bounds(period)?.map(|(first, last)| (self.start_of_day(first), self.end_of_day(last))))
    }
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    let mut candidate = naive;
    // Gaps are at most a few hours long in practice
    for _ in 0..48 {
        if let Some(resolved) = tz.from_local_datetime(&candidate).earliest() {
            return resolved.with_timezone(&Utc);
        }
        candidate += Duration::minutes(30);
    }
    Utc.from_utc_datetime(&naive)
}
