use std::fmt;
use std::str::FromStr;
use time::{Date, OffsetDateTime};

/// Seconds in the 30-day "month" used for the search window cutoff.
pub const WINDOW_MONTH_SECS: i64 = 30 * 86_400;

/// Calendar month bucket key ("YYYY-MM"), ordered by calendar order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: u16,
    pub month: u8, // 1..=12
}

impl YearMonth {
    pub fn new(year: u16, month: u8) -> Self {
        assert!((1..=12).contains(&month), "Month must be 1..=12");
        Self { year, month }
    }

    /// Bucket of a unix timestamp (UTC). Out-of-range timestamps map to 1970-01.
    pub fn from_epoch(ts: i64) -> Self {
        let (ym, _) = ymd_from_epoch(ts);
        ym
    }

    pub fn next(self) -> Option<Self> {
        if self.month < 12 {
            Some(Self { year: self.year, month: self.month + 1 })
        } else if self.year < u16::MAX {
            Some(Self { year: self.year + 1, month: 1 })
        } else {
            None
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (y, m) = s.split_once('-').ok_or("expected YYYY-MM")?;
        let year: u16 = y.parse().map_err(|_| "invalid year")?;
        let month: u8 = m.parse().map_err(|_| "invalid month")?;
        if !(1..=12).contains(&month) {
            return Err("month must be 01..12".into());
        }
        Ok(Self { year, month })
    }
}

/// Inclusive iteration from `start` to `end` (if `start` <= `end`), else empty.
pub fn iter_year_months(start: YearMonth, end: YearMonth) -> impl Iterator<Item = YearMonth> {
    let mut curr = if start <= end { Some(start) } else { None };
    std::iter::from_fn(move || {
        let ret = curr?;
        curr = ret.next().filter(|n| *n <= end);
        Some(ret)
    })
}

/// (bucket, day-of-month) for a unix timestamp, in UTC.
pub fn ymd_from_epoch(ts: i64) -> (YearMonth, u8) {
    let dt = OffsetDateTime::from_unix_timestamp(ts).unwrap_or(OffsetDateTime::UNIX_EPOCH);
    let date: Date = dt.date();
    let year = date.year().clamp(0, u16::MAX as i32) as u16;
    let ym = YearMonth { year, month: date.month() as u8 };
    (ym, date.day())
}

/// Oldest accepted timestamp for a window of `months` 30-day months ending at `now`.
pub fn window_cutoff(now: i64, months: u32) -> i64 {
    now.saturating_sub(WINDOW_MONTH_SECS.saturating_mul(months as i64))
}

/// `YYYY-MM-DD` rendering of a timestamp for log lines.
pub fn format_day(ts: i64) -> String {
    let (ym, day) = ymd_from_epoch(ts);
    format!("{}-{:02}", ym, day)
}
