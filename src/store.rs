use crate::error::StorageError;
use crate::storage::SlotStorage;
use crate::timestamp::{cutoff, now_local};
use crate::types::Event;
use chrono::NaiveDateTime;

/// Slot holding the whole event collection
pub const STORAGE_KEY: &str = "prompt_events";

pub const MAX_EVENTS: usize = 10_000;
pub const CLEANUP_DAYS: i64 = 90;
pub const BATCH_DELETE_COUNT: usize = 1000;

/// Capacity bound and eviction policy of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    pub max_events: usize,
    pub cleanup_days: i64,
    pub batch_delete_count: usize,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            max_events: MAX_EVENTS,
            cleanup_days: CLEANUP_DAYS,
            batch_delete_count: BATCH_DELETE_COUNT,
        }
    }
}

/// Append-only, capacity-bounded event collection kept in a single slot.
///
/// Every mutation reads the full collection, changes it and writes it back.
/// There is no locking; a single writer per session is assumed.
pub struct EventStore {
    storage: Box<dyn SlotStorage>,
    limits: StoreLimits,
}

impl EventStore {
    pub fn new(storage: Box<dyn SlotStorage>) -> Self {
        Self::with_limits(storage, StoreLimits::default())
    }

    pub fn with_limits(storage: Box<dyn SlotStorage>, limits: StoreLimits) -> Self {
        Self { storage, limits }
    }

    fn load(&self) -> Result<Vec<Event>, StorageError> {
        match self.storage.read_slot(STORAGE_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, events: &[Event]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(events)?;
        self.storage.write_slot(STORAGE_KEY, &raw)
    }

    /// Append an event, evicting old ones first when the store is full
    #[allow(dead_code)]
    pub fn append(&self, event: Event) -> Result<(), StorageError> {
        self.append_at(event, now_local())
    }

    pub fn append_at(&self, event: Event, now: NaiveDateTime) -> Result<(), StorageError> {
        let mut events = self.load()?;

        if events.len() >= self.limits.max_events {
            self.evict(&mut events, now);
        }

        events.push(event);
        self.save(&events)
    }

    // Age-based pruning first, count-based only when that is not enough.
    fn evict(&self, events: &mut Vec<Event>, now: NaiveDateTime) {
        let before = events.len();
        let cutoff_ts = cutoff(now, self.limits.cleanup_days);
        events.retain(|e| e.timestamp >= cutoff_ts);

        if events.len() >= self.limits.max_events {
            events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
            let drop = self.limits.batch_delete_count.min(events.len());
            events.drain(..drop);
        }

        log::info!(
            "Evicted {} events (cutoff {}, {} remain)",
            before - events.len(),
            cutoff_ts,
            events.len()
        );
    }

    /// All events in stored order. Storage failures yield an empty list.
    pub fn list_all(&self) -> Vec<Event> {
        self.load().unwrap_or_else(|e| {
            log::error!("Failed to load events: {}", e);
            Vec::new()
        })
    }

    /// Events with a timestamp at or after `cutoff_ts`
    pub fn list_since(&self, cutoff_ts: &str) -> Vec<Event> {
        self.list_all()
            .into_iter()
            .filter(|e| e.timestamp.as_str() >= cutoff_ts)
            .collect()
    }

    /// Events from the last `days` days
    pub fn list_for_days(&self, days: i64) -> Vec<Event> {
        self.list_for_days_at(days, now_local())
    }

    pub fn list_for_days_at(&self, days: i64, now: NaiveDateTime) -> Vec<Event> {
        self.list_since(&cutoff(now, days))
    }

    /// Remove the whole collection
    pub fn delete_all(&self) -> Result<(), StorageError> {
        self.storage.remove_slot(STORAGE_KEY).map_err(|e| {
            log::error!("Failed to delete events: {}", e);
            e
        })
    }

    /// Replace the collection wholesale
    #[allow(dead_code)]
    pub fn replace_all(&self, events: &[Event]) -> Result<(), StorageError> {
        self.save(events)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::storage::SqliteSlots;
    use crate::timestamp::format_timestamp;
    use crate::types::Source;
    use chrono::{Duration, NaiveDate};

    /// Storage whose every operation fails
    pub(crate) struct BrokenStorage;

    impl SlotStorage for BrokenStorage {
        fn read_slot(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("offline".into()))
        }
        fn write_slot(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("offline".into()))
        }
        fn remove_slot(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("offline".into()))
        }
    }

    pub(crate) fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn memory_store() -> EventStore {
        EventStore::new(Box::new(SqliteSlots::in_memory().unwrap()))
    }

    fn event_at(at: NaiveDateTime, tool: &str) -> Event {
        Event::new(format_timestamp(at), tool, Source::Webui)
    }

    #[test]
    fn test_append_round_trip() {
        let store = memory_store();
        let first = event_at(noon(), "chatgpt");
        let second = Event::new(format_timestamp(noon()), "cursor", Source::Manual);

        store.append_at(first.clone(), noon()).unwrap();
        store.append_at(second.clone(), noon()).unwrap();

        assert_eq!(store.list_all(), vec![first, second]);
    }

    #[test]
    fn test_append_on_wall_clock() {
        let store = memory_store();
        let now = now_local();
        let sent = event_at(now, "claude");
        let stale = event_at(now - Duration::days(30), "gemini");

        store.append(stale.clone()).unwrap();
        store.append(sent.clone()).unwrap();

        assert_eq!(store.list_all(), vec![stale, sent.clone()]);
        assert_eq!(store.list_for_days(1), vec![sent]);
        assert_eq!(store.list_for_days(90).len(), 2);
    }

    #[test]
    fn test_delete_all_is_idempotent() {
        let store = memory_store();
        store.append_at(event_at(noon(), "claude"), noon()).unwrap();

        store.delete_all().unwrap();
        assert!(store.list_all().is_empty());
        store.delete_all().unwrap();
        assert!(store.list_all().is_empty());
    }

    #[test]
    fn test_list_since() {
        let store = memory_store();
        let old = event_at(noon() - Duration::days(10), "gemini");
        let recent = event_at(noon() - Duration::hours(3), "gemini");
        store.append_at(old, noon()).unwrap();
        store.append_at(recent.clone(), noon()).unwrap();

        assert_eq!(store.list_for_days_at(7, noon()), vec![recent]);
        assert_eq!(store.list_since("2000-01-01 00:00:00").len(), 2);
    }

    #[test]
    fn test_eviction_drops_expired_events() {
        let store = memory_store();
        let stale_at = noon() - Duration::days(120);
        let stale: Vec<Event> = (0..MAX_EVENTS).map(|_| event_at(stale_at, "chatgpt")).collect();
        store.replace_all(&stale).unwrap();

        let fresh = event_at(noon(), "claude");
        store.append_at(fresh.clone(), noon()).unwrap();

        let events = store.list_all();
        assert!(events.len() < MAX_EVENTS);
        assert_eq!(events, vec![fresh]);
    }

    #[test]
    fn test_eviction_falls_back_to_oldest_batch() {
        let store = memory_store();
        // All within the retention period, oldest first after sorting.
        let recent: Vec<Event> = (0..MAX_EVENTS as i64)
            .rev()
            .map(|i| event_at(noon() - Duration::minutes(i), "gemini"))
            .collect();
        let oldest_kept = recent[BATCH_DELETE_COUNT].timestamp.clone();
        store.replace_all(&recent).unwrap();

        let fresh = event_at(noon(), "cursor");
        store.append_at(fresh.clone(), noon()).unwrap();

        let events = store.list_all();
        assert_eq!(events.len(), MAX_EVENTS - BATCH_DELETE_COUNT + 1);
        assert_eq!(events[0].timestamp, oldest_kept);
        assert_eq!(events.last(), Some(&fresh));
    }

    #[test]
    fn test_no_eviction_below_capacity() {
        let limits = StoreLimits {
            max_events: 3,
            cleanup_days: 1,
            batch_delete_count: 1,
        };
        let store = EventStore::with_limits(Box::new(SqliteSlots::in_memory().unwrap()), limits);
        let stale = event_at(noon() - Duration::days(30), "claude");
        store.append_at(stale.clone(), noon()).unwrap();
        store.append_at(event_at(noon(), "claude"), noon()).unwrap();

        assert_eq!(store.list_all()[0], stale);

        store.append_at(event_at(noon(), "claude"), noon()).unwrap();
        store.append_at(event_at(noon(), "claude"), noon()).unwrap();
        let events = store.list_all();
        assert_eq!(events.len(), 3);
        assert!(!events.contains(&stale));
    }

    #[test]
    fn test_broken_storage_reads_empty_and_write_fails() {
        let store = EventStore::new(Box::new(BrokenStorage));
        assert!(store.list_all().is_empty());
        assert!(store.append_at(event_at(noon(), "claude"), noon()).is_err());
        assert!(store.delete_all().is_err());
    }

    #[test]
    fn test_corrupt_slot_is_not_overwritten() {
        let slots = SqliteSlots::in_memory().unwrap();
        slots.write_slot(STORAGE_KEY, "not json").unwrap();
        let store = EventStore::new(Box::new(slots));

        assert!(store.list_all().is_empty());
        let err = store.append_at(event_at(noon(), "claude"), noon()).unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
