use anyhow::{Result, anyhow};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};

use crate::model::year_month::YearMonth;

/// Inclusive `[start, end]` instant range, millisecond resolution.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }
}

/// The fixed zone every day and month boundary is computed in.
/// Never falls back to the host's local zone.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ReferenceZone {
    offset: FixedOffset,
}

impl Default for ReferenceZone {
    /// Asia/Seoul, which has no daylight saving.
    fn default() -> Self {
        Self {
            offset: FixedOffset::east_opt(9 * 3600).unwrap_or_else(|| Utc.fix()),
        }
    }
}

impl ReferenceZone {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Parses `±HH:MM`, `±HHMM` or `Z`.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
            return Ok(Self::new(Utc.fix()));
        }

        value
            .parse::<FixedOffset>()
            .map(Self::new)
            .map_err(|e| anyhow!("invalid UTC offset '{}', expected ±HH:MM: {}", value, e))
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn to_local(&self, ts: DateTime<Utc>) -> DateTime<FixedOffset> {
        ts.with_timezone(&self.offset)
    }

    /// Calendar date of `ts` in this zone.
    pub fn day_of(&self, ts: DateTime<Utc>) -> NaiveDate {
        self.to_local(ts).date_naive()
    }

    /// `00:00:00.000` of `day`, local to this zone.
    fn start_of(&self, day: NaiveDate) -> DateTime<Utc> {
        let local_midnight = day.and_time(NaiveTime::MIN);
        let utc = local_midnight - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        Utc.from_utc_datetime(&utc)
    }

    /// `[00:00:00.000, 23:59:59.999]` of `day`.
    pub fn day_range(&self, day: NaiveDate) -> TimeRange {
        let next = day.succ_opt().unwrap_or(NaiveDate::MAX);
        TimeRange {
            start: self.start_of(day),
            end: self.start_of(next) - Duration::milliseconds(1),
        }
    }

    /// First day `00:00:00.000` through last day `23:59:59.999`.
    pub fn month_range(&self, month: YearMonth) -> TimeRange {
        TimeRange {
            start: self.start_of(month.first_day()),
            end: self.start_of(month.next_first_day()) - Duration::milliseconds(1),
        }
    }
}
