use crate::dedupe::{DEDUPE_CLEANUP_MS, DEDUPE_WINDOW_MS};
use crate::store::StoreLimits;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Tunable settings: key, largest accepted value, description
pub static KNOWN_KEYS: &[(&str, u64, &str)] = &[
    ("max_events", 1_000_000, "Maximum stored events before eviction"),
    ("cleanup_days", 36_500, "Events older than this many days are evicted first"),
    ("batch_delete_count", 1_000_000, "Oldest events dropped when age eviction is not enough"),
    ("dedupe_window_ms", 3_600_000, "Detections closer than this collapse into one"),
    ("dedupe_cleanup_ms", 86_400_000, "Dedupe entries older than this are forgotten"),
];

/// Parse a setting as an integer in `1..=max` for its key
fn parse_setting(key: &str, raw: &str) -> Result<u64, String> {
    let max = KNOWN_KEYS
        .iter()
        .find(|(k, _, _)| *k == key)
        .map(|(_, max, _)| *max)
        .ok_or_else(|| format!("Unknown config key: {}", key))?;

    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|n| (1..=max).contains(n))
        .ok_or_else(|| format!("{} must be an integer from 1 to {}, got '{}'", key, max, raw))
}

/// Data directory: `$PROMPT_COUNTER_HOME`, else the platform data dir
pub fn data_dir() -> PathBuf {
    if let Ok(path) = std::env::var("PROMPT_COUNTER_HOME") {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("prompt-counter")
}

/// Configuration manager for a data directory
pub struct CounterConfig {
    data_path: PathBuf,
    config_file: PathBuf,
    config: HashMap<String, serde_yaml::Value>,
}

impl CounterConfig {
    pub fn new(data_path: PathBuf) -> Self {
        let config_file = data_path.join("config.yaml");
        let mut instance = Self {
            data_path,
            config_file,
            config: HashMap::new(),
        };
        instance.load();
        instance
    }

    fn load(&mut self) {
        if !self.config_file.exists() {
            return;
        }
        match fs::read_to_string(&self.config_file) {
            Ok(content) => {
                match serde_yaml::from_str::<HashMap<String, serde_yaml::Value>>(&content) {
                    Ok(config) => self.config = config,
                    Err(e) => log::warn!(
                        "Ignoring malformed {}: {}",
                        self.config_file.display(),
                        e
                    ),
                }
            }
            Err(e) => log::warn!("Failed to read {}: {}", self.config_file.display(), e),
        }
    }

    fn save(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_path)?;
        let content = serde_yaml::to_string(&self.config).unwrap_or_default();
        fs::write(&self.config_file, content)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).and_then(|v| match v {
            serde_yaml::Value::String(s) => Some(s.clone()),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            serde_yaml::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    /// Set a known key to an integer within its bounds
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        let number = parse_setting(key, value)?;

        self.config
            .insert(key.to_string(), serde_yaml::Value::Number(number.into()));
        self.save().map_err(|e| format!("Failed to save: {}", e))
    }

    fn number<T: TryFrom<u64>>(&self, key: &str) -> Option<T> {
        let raw = self.get(key)?;
        match parse_setting(key, &raw).ok().and_then(|n| T::try_from(n).ok()) {
            Some(n) => Some(n),
            None => {
                log::warn!("Ignoring invalid {} = {}", key, raw);
                None
            }
        }
    }

    pub fn limits(&self) -> StoreLimits {
        let defaults = StoreLimits::default();
        StoreLimits {
            max_events: self.number("max_events").unwrap_or(defaults.max_events),
            cleanup_days: self.number("cleanup_days").unwrap_or(defaults.cleanup_days),
            batch_delete_count: self
                .number("batch_delete_count")
                .unwrap_or(defaults.batch_delete_count),
        }
    }

    /// `(window_ms, cleanup_ms)` for the dedupe cache
    pub fn dedupe_window(&self) -> (i64, i64) {
        let window = self.number("dedupe_window_ms").unwrap_or(DEDUPE_WINDOW_MS);
        let cleanup = self
            .number("dedupe_cleanup_ms")
            .unwrap_or(DEDUPE_CLEANUP_MS);
        (window, cleanup)
    }

    /// Effective value of every known key
    pub fn effective(&self) -> Vec<(&'static str, String)> {
        let limits = self.limits();
        let (window, cleanup) = self.dedupe_window();
        vec![
            ("max_events", limits.max_events.to_string()),
            ("cleanup_days", limits.cleanup_days.to_string()),
            ("batch_delete_count", limits.batch_delete_count.to_string()),
            ("dedupe_window_ms", window.to_string()),
            ("dedupe_cleanup_ms", cleanup.to_string()),
        ]
    }
}
