use std::collections::HashMap;

/// Detections of the same send closer than this collapse into one event
pub const DEDUPE_WINDOW_MS: i64 = 2000;

/// Entries older than this are swept on every check
pub const DEDUPE_CLEANUP_MS: i64 = 5000;

/// In-memory, time-bucketed record of recent sends.
///
/// A single submit is often reported several times (button click, Enter key,
/// form submit). Keys are `tool_origin_bucket` where the bucket is the
/// timestamp divided by the window.
pub struct DedupeCache {
    window_ms: i64,
    cleanup_ms: i64,
    recent: HashMap<String, i64>,
}

impl Default for DedupeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DedupeCache {
    pub fn new() -> Self {
        Self::with_window(DEDUPE_WINDOW_MS, DEDUPE_CLEANUP_MS)
    }

    pub fn with_window(window_ms: i64, cleanup_ms: i64) -> Self {
        Self {
            window_ms: window_ms.max(1),
            cleanup_ms,
            recent: HashMap::new(),
        }
    }

    fn key(&self, tool: &str, origin_id: i64, bucket: i64) -> String {
        format!("{}_{}_{}", tool, origin_id, bucket)
    }

    fn bucket(&self, timestamp_ms: i64) -> i64 {
        timestamp_ms.div_euclid(self.window_ms)
    }

    /// Check a detection against the wall clock
    #[allow(dead_code)]
    pub fn should_dedupe(&mut self, tool: &str, origin_id: i64, timestamp_ms: i64) -> bool {
        let now_ms = chrono::Utc::now().timestamp_millis();
        self.should_dedupe_at(tool, origin_id, timestamp_ms, now_ms)
    }

    /// Returns true when the detection duplicates one already seen and must be
    /// discarded. Otherwise records it and returns false.
    pub fn should_dedupe_at(
        &mut self,
        tool: &str,
        origin_id: i64,
        timestamp_ms: i64,
        now_ms: i64,
    ) -> bool {
        let bucket = self.bucket(timestamp_ms);

        // Neighbouring buckets too, so a pair straddling a bucket edge still collapses.
        let neighbours = [bucket.saturating_sub(1), bucket, bucket.saturating_add(1)];
        let duplicate = neighbours.iter().any(|b| {
            self.recent
                .get(&self.key(tool, origin_id, *b))
                .is_some_and(|seen| timestamp_ms.abs_diff(*seen) < self.window_ms.unsigned_abs())
        });

        if !duplicate {
            let key = self.key(tool, origin_id, bucket);
            self.recent.insert(key, timestamp_ms);
        }

        self.sweep(now_ms);
        duplicate
    }

    /// Drop entries older than the cleanup interval
    pub fn sweep(&mut self, now_ms: i64) {
        let cleanup_ms = self.cleanup_ms;
        self.recent
            .retain(|_, seen| now_ms.saturating_sub(*seen) <= cleanup_ms);
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.recent.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }

    pub fn clear(&mut self) {
        self.recent.clear();
    }
}
