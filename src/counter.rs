use crate::config::{data_dir, CounterConfig};
use crate::dedupe::DedupeCache;
use crate::error::{CounterError, StorageError, ValidationError};
use crate::storage::SqliteSlots;
use crate::store::EventStore;
use crate::timestamp::{format_timestamp, from_epoch_millis, now_local, to_epoch_millis};
use crate::types::{Event, EventId, MessageResponse, Notification, Source};
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};

/// Origin used when a notification does not say where it came from
pub const DEFAULT_ORIGIN: i64 = 0;

/// The ingestion service: one per host session.
///
/// Owns the dedupe state and the event store so nothing lives in globals.
pub struct Counter {
    data_path: PathBuf,
    store: EventStore,
    dedupe: DedupeCache,
}

impl Counter {
    /// Open the counter in the configured data directory
    pub fn open() -> Result<Self, String> {
        let data_path = data_dir();
        if !data_path.exists() {
            return Err(format!(
                "No data directory at {}. Run 'prompt-counter init' first.",
                data_path.display()
            ));
        }
        Self::open_at(data_path)
    }

    /// Open the counter at a specific data directory
    pub fn open_at(data_path: PathBuf) -> Result<Self, String> {
        if !data_path.exists() {
            return Err(format!("Path does not exist: {}", data_path.display()));
        }

        let db_path = data_path.join("events.db");
        let slots =
            SqliteSlots::open(&db_path).map_err(|e| format!("Failed to open store: {}", e))?;

        let config = CounterConfig::new(data_path.clone());
        let store = EventStore::with_limits(Box::new(slots), config.limits());
        let (window_ms, cleanup_ms) = config.dedupe_window();

        Ok(Self {
            data_path,
            store,
            dedupe: DedupeCache::with_window(window_ms, cleanup_ms),
        })
    }

    /// Create the data directory and open the counter there
    pub fn init(path: &Path) -> Result<Self, String> {
        fs::create_dir_all(path)
            .map_err(|e| format!("Failed to create data directory: {}", e))?;
        Self::open_at(path.to_path_buf())
    }

    #[allow(dead_code)]
    pub fn from_parts(data_path: PathBuf, store: EventStore, dedupe: DedupeCache) -> Self {
        Self {
            data_path,
            store,
            dedupe,
        }
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    /// Record a notification. `Ok(None)` means it was collapsed as a duplicate.
    pub fn handle_notification(
        &mut self,
        notification: &Notification,
        origin_id: Option<i64>,
    ) -> Result<Option<EventId>, CounterError> {
        self.handle_notification_at(notification, origin_id, now_local())
    }

    pub fn handle_notification_at(
        &mut self,
        notification: &Notification,
        origin_id: Option<i64>,
        now: NaiveDateTime,
    ) -> Result<Option<EventId>, CounterError> {
        let event = match notification {
            Notification::PromptSent { tool, timestamp } => {
                let sent_at = from_epoch_millis(*timestamp).ok_or_else(|| {
                    log::error!("Unrepresentable {} timestamp: {}", tool, timestamp);
                    ValidationError::Timestamp(timestamp.to_string())
                })?;

                let origin = origin_id.unwrap_or(DEFAULT_ORIGIN);
                let now_ms = to_epoch_millis(now).unwrap_or(*timestamp);
                if self.dedupe.should_dedupe_at(tool, origin, *timestamp, now_ms) {
                    log::debug!("Duplicate {} send from origin {} ignored", tool, origin);
                    return Ok(None);
                }
                Event::new(format_timestamp(sent_at), tool, Source::Webui)
            }
            Notification::ManualCount { tool } => {
                Event::new(format_timestamp(now), tool, Source::Manual)
            }
        };

        if let Err(e) = event.validate() {
            log::error!("Invalid event data: {:?} ({})", event, e);
            return Err(e.into());
        }

        let id = event.id.clone();
        self.store.append_at(event, now).map_err(|e| {
            log::error!("Failed to save event: {}", e);
            e
        })?;

        Ok(Some(id))
    }

    /// Handle a raw JSON message and build the reply for the sender.
    /// Never fails; every error becomes an unsuccessful response.
    pub fn respond(&mut self, raw: &str, origin_id: Option<i64>) -> MessageResponse {
        self.respond_at(raw, origin_id, now_local())
    }

    pub fn respond_at(
        &mut self,
        raw: &str,
        origin_id: Option<i64>,
        now: NaiveDateTime,
    ) -> MessageResponse {
        let notification = match parse_notification(raw) {
            Ok(n) => n,
            Err(e) => {
                log::warn!("Rejected message {}: {}", raw.trim(), e);
                return MessageResponse::failed(e.to_string());
            }
        };

        match self.handle_notification_at(&notification, origin_id, now) {
            Ok(event_id) => MessageResponse::ok(event_id),
            Err(e) => MessageResponse::failed(e.to_string()),
        }
    }

    // =========================================================================
    // Store passthroughs
    // =========================================================================

    pub fn events(&self) -> Vec<Event> {
        self.store.list_all()
    }

    pub fn delete_all(&mut self) -> Result<(), StorageError> {
        self.dedupe.clear();
        self.store.delete_all()
    }
}

/// Decode an inbound message; any unrecognised shape is an unknown message
pub fn parse_notification(raw: &str) -> Result<Notification, CounterError> {
    serde_json::from_str(raw).map_err(|_| CounterError::UnknownMessage)
}
