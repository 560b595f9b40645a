use chrono::{Duration, Local, NaiveDate, NaiveDateTime, TimeZone};
use regex::Regex;
use std::sync::OnceLock;

/// Sortable local wall-clock format stored on every event
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const DATE_FORMAT: &str = "%Y-%m-%d";

fn shape() -> &'static Regex {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    SHAPE.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$").expect("timestamp pattern is valid")
    })
}

/// Current local wall-clock time
pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Convert unix milliseconds into local wall-clock time
pub fn from_epoch_millis(ms: i64) -> Option<NaiveDateTime> {
    Local
        .timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.naive_local())
}

/// Convert local wall-clock time back into unix milliseconds
pub fn to_epoch_millis(at: NaiveDateTime) -> Option<i64> {
    Local
        .from_local_datetime(&at)
        .earliest()
        .map(|dt| dt.timestamp_millis())
}

/// Parse a stored timestamp. Both the shape and the calendar values must be valid.
pub fn parse_timestamp(ts: &str) -> Option<NaiveDateTime> {
    if !shape().is_match(ts) {
        return None;
    }
    NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).ok()
}

pub fn is_valid_timestamp(ts: &str) -> bool {
    parse_timestamp(ts).is_some()
}

/// Date portion (`YYYY-MM-DD`) of a stored timestamp
pub fn extract_date(ts: &str) -> &str {
    ts.split(' ').next().unwrap_or(ts)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Formatted cutoff `days` before `now`, comparable against stored timestamps.
/// Spans beyond the calendar range clamp to the earliest representable time.
pub fn cutoff(now: NaiveDateTime, days: i64) -> String {
    let at = Duration::try_days(days)
        .and_then(|span| now.checked_sub_signed(span))
        .unwrap_or(NaiveDateTime::MIN);
    format_timestamp(at)
}
