//! RFC 3339 timestamp rendering for record headers.
//!
//! The fractional precision is selected once on the facade and applies to
//! every record. The UTC offset renders as `Z` when it is zero and `+HH:MM` /
//! `-HH:MM` otherwise; the fractional part is omitted entirely when the
//! subsecond count is zero, so `2021-10-10T13:46:58Z` and
//! `2021-10-10T13:46:58.123456+08:00` are both valid renderings.

use std::fmt::Write as FmtWrite;

use chrono::{DateTime, Datelike, Local, Offset, TimeZone, Timelike};

/// Fractional-second precision of record timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Precision {
    Second = 0,
    Milli = 1,
    Micro = 2,
    Nano = 3,
}

impl Precision {
    pub(crate) const fn from_u8(value: u8) -> Self {
        match value {
            0 => Precision::Second,
            1 => Precision::Milli,
            2 => Precision::Micro,
            _ => Precision::Nano,
        }
    }

    /// Digits of the fractional part, and the divisor scaling nanoseconds
    /// down to it.
    const fn frac(self) -> Option<(usize, u32)> {
        match self {
            Precision::Second => None,
            Precision::Milli => Some((3, 1_000_000)),
            Precision::Micro => Some((6, 1_000)),
            Precision::Nano => Some((9, 1)),
        }
    }
}

/// Render `dt` as RFC 3339 with the given precision.
pub fn format_rfc3339<Tz: TimeZone>(dt: &DateTime<Tz>, precision: Precision) -> String {
    let mut out = String::with_capacity(40);

    let _ = write!(
        out,
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
        dt.year(),
        dt.month(),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second(),
    );

    let nanos = dt.nanosecond();
    if nanos != 0 {
        if let Some((digits, divisor)) = precision.frac() {
            let _ = write!(out, ".{:0width$}", nanos / divisor, width = digits);
        }
    }

    let offset_secs = dt.offset().fix().local_minus_utc();
    if offset_secs == 0 {
        out.push('Z');
    } else {
        let sign = if offset_secs < 0 { '-' } else { '+' };
        let abs = offset_secs.unsigned_abs();
        let _ = write!(out, "{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60);
    }

    out
}

/// Current local time rendered for a record header.
pub fn now(precision: Precision) -> String {
    format_rfc3339(&Local::now(), precision)
}

#[cfg(test)]
#[path = "timestamp_test.rs"]
mod timestamp_test;
