use crate::error::ValidationError;
use crate::timestamp::is_valid_timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type EventId = String;

/// Chat tool a prompt was sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Chatgpt,
    Claude,
    Gemini,
    Cursor,
}

impl Tool {
    pub const ALL: [Tool; 4] = [Tool::Chatgpt, Tool::Claude, Tool::Gemini, Tool::Cursor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Chatgpt => "chatgpt",
            Tool::Claude => "claude",
            Tool::Gemini => "gemini",
            Tool::Cursor => "cursor",
        }
    }

    /// Human readable label for reports
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Chatgpt => "ChatGPT",
            Tool::Claude => "Claude",
            Tool::Gemini => "Gemini",
            Tool::Cursor => "Cursor",
        }
    }
}

impl FromStr for Tool {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tool::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::Tool(s.to_string()))
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an event was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Webui,
    Manual,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Webui => "webui",
            Source::Manual => "manual",
        }
    }
}

impl FromStr for Source {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "webui" => Ok(Source::Webui),
            "manual" => Ok(Source::Manual),
            other => Err(ValidationError::Source(other.to_string())),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One counted prompt, as persisted.
///
/// Fields are kept as strings so that records read back from storage can be
/// checked with [`Event::validate`] instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: String,
    pub tool: String,
    pub source: String,
}

impl Event {
    /// Build an event with a fresh UUID v4 id
    pub fn new(timestamp: String, tool: &str, source: Source) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp,
            tool: tool.to_string(),
            source: source.as_str().to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if !is_valid_timestamp(&self.timestamp) {
            return Err(ValidationError::Timestamp(self.timestamp.clone()));
        }
        self.tool.parse::<Tool>()?;
        self.source.parse::<Source>()?;
        Ok(())
    }

    /// Parsed tool, `None` for records that never passed validation
    pub fn tool_kind(&self) -> Option<Tool> {
        self.tool.parse().ok()
    }
}

/// Message sent by a collaborator to the ingestion service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Notification {
    /// A prompt submit detected on a chat web UI; `timestamp` is unix ms
    PromptSent { tool: String, timestamp: i64 },
    /// Explicit +1 from the user (popup button or keyboard shortcut)
    ManualCount { tool: String },
}

/// Reply returned to the notifying collaborator
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MessageResponse {
    pub fn ok(event_id: Option<EventId>) -> Self {
        Self {
            success: true,
            event_id,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            event_id: None,
            error: Some(error.into()),
        }
    }
}

/// Count for a single day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: String,
    pub count: usize,
}

/// Count for a single tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCount {
    pub tool: Tool,
    pub count: usize,
}

/// Dashboard numbers
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub today: usize,
    pub window_days: i64,
    pub window_total: usize,
    pub daily: Vec<DailyCount>,
    pub by_tool: Vec<ToolCount>,
}
