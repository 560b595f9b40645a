//! Read-side queries over the stored events.
//!
//! Every date comparison works on the date portion of the stored local
//! timestamp, so results match what the user saw when the event was recorded.

use crate::store::EventStore;
use crate::timestamp::{extract_date, format_date, now_local};
use crate::types::{DailyCount, Event, Summary, Tool, ToolCount};
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Trailing window used by the dashboard
pub const DASHBOARD_DAYS: i64 = 7;

/// Longest per-day series a report will build
pub const MAX_REPORT_DAYS: i64 = 3660;

/// UTF-8 byte-order marker so spreadsheets pick the right encoding
pub const CSV_BOM: char = '\u{feff}';

pub const CSV_HEADER: &str = "ID,Timestamp,Tool,Source";

/// Events recorded on `today`
pub fn today_count(events: &[Event], today: NaiveDate) -> usize {
    let today = format_date(today);
    events
        .iter()
        .filter(|e| extract_date(&e.timestamp) == today)
        .count()
}

/// Per-day counts for the `days` dates ending at `today`, oldest first
pub fn daily_series(events: &[Event], today: NaiveDate, days: i64) -> Vec<DailyCount> {
    (0..days.clamp(0, MAX_REPORT_DAYS))
        .rev()
        .map(|offset| {
            let date = format_date(today - Duration::days(offset));
            let count = events
                .iter()
                .filter(|e| extract_date(&e.timestamp) == date)
                .count();
            DailyCount { date, count }
        })
        .collect()
}

/// Count per tool in fixed order, including tools with no events
pub fn tool_breakdown(events: &[Event]) -> Vec<ToolCount> {
    Tool::ALL
        .into_iter()
        .map(|tool| ToolCount {
            tool,
            count: events
                .iter()
                .filter(|e| e.tool_kind() == Some(tool))
                .count(),
        })
        .collect()
}

/// Number of events in the last `days` days
pub fn count_for_days(store: &EventStore, days: i64) -> usize {
    store.list_for_days(days).len()
}

pub fn count_for_days_at(store: &EventStore, days: i64, now: NaiveDateTime) -> usize {
    store.list_for_days_at(days, now).len()
}

/// Dashboard numbers over the trailing `days` window
pub fn summarize(store: &EventStore, days: i64) -> Summary {
    summarize_at(store, days, now_local())
}

pub fn summarize_at(store: &EventStore, days: i64, now: NaiveDateTime) -> Summary {
    let days = days.clamp(1, MAX_REPORT_DAYS);
    let all = store.list_all();
    let window = store.list_for_days_at(days, now);
    let today = now.date();

    Summary {
        today: today_count(&all, today),
        window_days: days,
        window_total: window.len(),
        daily: daily_series(&window, today, days),
        by_tool: tool_breakdown(&window),
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Serialize events as BOM-prefixed CSV, one quoted row per event
pub fn to_csv(events: &[Event]) -> String {
    let mut lines = Vec::with_capacity(events.len() + 1);
    lines.push(CSV_HEADER.to_string());

    for e in events {
        let row = [&e.id, &e.timestamp, &e.tool, &e.source]
            .iter()
            .map(|f| quote(f))
            .collect::<Vec<_>>()
            .join(",");
        lines.push(row);
    }

    format!("{}{}", CSV_BOM, lines.join("\n"))
}

/// Default export file name, e.g. `prompt-counter-2024-06-15T12-00-00.csv`
pub fn export_file_name(now: NaiveDateTime) -> String {
    format!("prompt-counter-{}.csv", now.format("%Y-%m-%dT%H-%M-%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteSlots;
    use crate::store::tests::noon;
    use crate::timestamp::format_timestamp;
    use crate::types::Source;

    fn store_with(events: &[(NaiveDateTime, &str)]) -> EventStore {
        let store = EventStore::new(Box::new(SqliteSlots::in_memory().unwrap()));
        for (at, tool) in events {
            store
                .append_at(Event::new(format_timestamp(*at), tool, Source::Webui), noon())
                .unwrap();
        }
        store
    }

    #[test]
    fn test_same_day_breakdown() {
        let morning = noon() - Duration::hours(2);
        let store = store_with(&[
            (morning, "chatgpt"),
            (morning, "chatgpt"),
            (noon(), "chatgpt"),
            (noon(), "claude"),
        ]);

        let window = store.list_for_days_at(1, noon());
        assert_eq!(window.len(), 4);

        let counts: Vec<(Tool, usize)> = tool_breakdown(&window)
            .into_iter()
            .map(|c| (c.tool, c.count))
            .collect();
        assert_eq!(
            counts,
            vec![
                (Tool::Chatgpt, 3),
                (Tool::Claude, 1),
                (Tool::Gemini, 0),
                (Tool::Cursor, 0)
            ]
        );
    }

    #[test]
    fn test_summary_over_week() {
        let store = store_with(&[
            (noon() - Duration::days(30), "gemini"),
            (noon() - Duration::days(6), "gemini"),
            (noon() - Duration::days(1), "cursor"),
            (noon() - Duration::days(1), "claude"),
            (noon() - Duration::minutes(5), "chatgpt"),
        ]);

        let summary = summarize_at(&store, DASHBOARD_DAYS, noon());
        assert_eq!(summary.today, 1);
        assert_eq!(summary.window_total, 4);

        let series: Vec<usize> = summary.daily.iter().map(|d| d.count).collect();
        assert_eq!(series, vec![1, 0, 0, 0, 0, 2, 1]);
        assert_eq!(summary.daily[0].date, "2024-06-09");
        assert_eq!(summary.daily[6].date, "2024-06-15");

        let gemini = summary
            .by_tool
            .iter()
            .find(|c| c.tool == Tool::Gemini)
            .unwrap();
        assert_eq!(gemini.count, 1);
    }

    #[test]
    fn test_huge_window_is_clamped() {
        let store = store_with(&[(noon() - Duration::days(400), "claude"), (noon(), "gemini")]);

        let summary = summarize_at(&store, 200_000_000, noon());
        assert_eq!(summary.window_days, MAX_REPORT_DAYS);
        assert_eq!(summary.daily.len(), MAX_REPORT_DAYS as usize);
        assert_eq!(summary.window_total, 2);

        assert_eq!(count_for_days_at(&store, i64::MAX, noon()), 2);
        assert!(daily_series(&[], noon().date(), i64::MAX).len() <= MAX_REPORT_DAYS as usize);
    }

    #[test]
    fn test_count_for_days() {
        let now = now_local();
        let store = store_with(&[(now - Duration::days(3), "cursor"), (now, "chatgpt")]);

        assert_eq!(count_for_days(&store, 1), 1);
        assert_eq!(count_for_days(&store, DASHBOARD_DAYS), 2);
        assert_eq!(count_for_days_at(&store, 4, now), 2);
    }

    #[test]
    fn test_today_count_ignores_other_days() {
        let events = vec![
            Event::new("2024-06-15 00:00:00".into(), "claude", Source::Webui),
            Event::new("2024-06-15 23:59:59".into(), "claude", Source::Webui),
            Event::new("2024-06-14 23:59:59".into(), "claude", Source::Webui),
        ];
        assert_eq!(today_count(&events, noon().date()), 2);
    }

    #[test]
    fn test_csv_export() {
        let events = vec![
            Event {
                id: "id-1".into(),
                timestamp: "2024-06-15 09:00:00".into(),
                tool: "chatgpt".into(),
                source: "webui".into(),
            },
            Event {
                id: "id-2".into(),
                timestamp: "2024-06-15 10:30:00".into(),
                tool: "cursor".into(),
                source: "manual".into(),
            },
        ];

        let csv = to_csv(&events);
        assert!(csv.starts_with('\u{feff}'));
        assert!(csv.as_bytes().starts_with(&[0xEF, 0xBB, 0xBF]));

        let lines: Vec<&str> = csv.trim_start_matches('\u{feff}').split('\n').collect();
        assert_eq!(
            lines,
            vec![
                "ID,Timestamp,Tool,Source",
                r#""id-1","2024-06-15 09:00:00","chatgpt","webui""#,
                r#""id-2","2024-06-15 10:30:00","cursor","manual""#,
            ]
        );
    }

    #[test]
    fn test_csv_escapes_quotes() {
        let event = Event {
            id: "a\"b".into(),
            timestamp: "2024-06-15 09:00:00".into(),
            tool: "claude".into(),
            source: "webui".into(),
        };
        assert!(to_csv(&[event]).ends_with(r#""a""b","2024-06-15 09:00:00","claude","webui""#));
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(
            export_file_name(noon()),
            "prompt-counter-2024-06-15T12-00-00.csv"
        );
    }
}
