//! Timestamp presentation: exact RFC 3339 instants or "time ago" phrases.

use chrono::{DateTime, SecondsFormat, Utc};
use grpcscope_proto::Timestamp;

/// Rendered for absent and zero timestamps.
pub const NEVER: &str = "never";

const INVALID: &str = "<invalid>";

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 12 * MONTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormat {
    /// Phrases relative to `now`, e.g. `3 minutes ago`.
    Relative { now: DateTime<Utc> },
    /// RFC 3339 in UTC.
    Exact,
}

impl TimeFormat {
    /// Relative to the current wall clock.
    pub fn relative() -> Self {
        TimeFormat::Relative { now: Utc::now() }
    }

    pub fn format(&self, timestamp: Option<&Timestamp>) -> String {
        let Some(timestamp) = timestamp.filter(|t| !t.is_unset()) else {
            return NEVER.to_string();
        };
        let Some(instant) = to_datetime(timestamp) else {
            return INVALID.to_string();
        };
        match self {
            TimeFormat::Relative { now } => time_ago(instant, *now),
            TimeFormat::Exact => instant.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }
}

fn to_datetime(timestamp: &Timestamp) -> Option<DateTime<Utc>> {
    let nanos = u32::try_from(timestamp.nanos).ok()?;
    DateTime::from_timestamp(timestamp.seconds, nanos)
}

/// Coarse human description of how far `then` is from `now`.
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(then).num_seconds();
    let (seconds, suffix) = if delta >= 0 {
        (delta, "ago")
    } else {
        (-delta, "from now")
    };

    if seconds < 1 {
        return "now".to_string();
    }

    // (upper bound, singular phrase, divisor and unit for plural phrases)
    let steps: [(i64, Option<&str>, i64, &str); 13] = [
        (2, Some("1 second"), 1, ""),
        (MINUTE, None, 1, "seconds"),
        (2 * MINUTE, Some("1 minute"), 1, ""),
        (HOUR, None, MINUTE, "minutes"),
        (2 * HOUR, Some("1 hour"), 1, ""),
        (DAY, None, HOUR, "hours"),
        (2 * DAY, Some("1 day"), 1, ""),
        (WEEK, None, DAY, "days"),
        (2 * WEEK, Some("1 week"), 1, ""),
        (MONTH, None, WEEK, "weeks"),
        (2 * MONTH, Some("1 month"), 1, ""),
        (YEAR, None, MONTH, "months"),
        (18 * MONTH, Some("1 year"), 1, ""),
    ];

    for (bound, singular, unit, plural) in steps {
        if seconds < bound {
            return match singular {
                Some(phrase) => format!("{} {}", phrase, suffix),
                None => format!("{} {} {}", seconds / unit, plural, suffix),
            };
        }
    }

    let years = (seconds / YEAR).max(2);
    format!("{} years {}", years, suffix)
}
