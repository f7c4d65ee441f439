use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::AttendanceError;

/// A calendar month, parsed from `YYYY-MM`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, AttendanceError> {
        if !(1..=12).contains(&month) {
            return Err(AttendanceError::invalid(format!(
                "Month must be between 1 and 12, got {month}"
            )));
        }
        // keeps first_day()/next_first_day() infallible
        if NaiveDate::from_ymd_opt(year, month, 1).is_none()
            || year
                .checked_add(1)
                .and_then(|next| NaiveDate::from_ymd_opt(next, 1, 1))
                .is_none()
        {
            return Err(AttendanceError::invalid(format!("Year {year} is out of range")));
        }
        Ok(Self { year, month })
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// First day of the following month.
    pub fn next_first_day(&self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MAX)
    }
}

impl FromStr for YearMonth {
    type Err = AttendanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || AttendanceError::invalid(format!("Month must be formatted as YYYY-MM, got '{s}'"));

        let (year, month) = s.trim().split_once('-').ok_or_else(malformed)?;
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if year.len() != 4 || month.is_empty() || month.len() > 2 {
            return Err(malformed());
        }
        // i32/u32 parsing alone would let a sign through
        if !all_digits(year) || !all_digits(month) {
            return Err(malformed());
        }
        let year: i32 = year.parse().map_err(|_| malformed())?;
        let month: u32 = month.parse().map_err(|_| malformed())?;

        YearMonth::new(year, month)
    }
}
