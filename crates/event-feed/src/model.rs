use std::collections::BTreeMap;

use cfapps_core_types::AppGuid;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Untyped wire record as handed over by the transport.
pub type RawEventRecord = Map<String, JsonValue>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFields {
    pub requested_state: Option<String>,
    pub reason: Option<String>,
    pub exit_description: Option<String>,
    /// Changed attribute name -> rendered value, in key order.
    pub changes: BTreeMap<String, String>,
}

/// Decoded wire record. `timestamp` is known to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub timestamp: String,
    pub type_tag: Option<String>,
    pub guid: Option<String>,
    pub fields: EventFields,
}

impl EventRecord {
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            type_tag: None,
            guid: None,
            fields: EventFields::default(),
        }
    }

    pub fn with_type(mut self, tag: impl Into<String>) -> Self {
        self.type_tag = Some(tag.into());
        self
    }

    pub fn with_requested_state(mut self, state: impl Into<String>) -> Self {
        self.fields.requested_state = Some(state.into());
        self
    }

    pub fn with_change(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.changes.insert(key.into(), value.into());
        self
    }

    /// Non-empty requested state, if any.
    pub fn requested_state(&self) -> Option<&str> {
        self.fields
            .requested_state
            .as_deref()
            .filter(|state| !state.is_empty())
    }

    /// Fallback signal used when the record carries no type tag.
    pub fn is_operational(&self) -> bool {
        self.requested_state().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum ClassifiedEvent {
    Operational {
        timestamp: String,
        requested_state: String,
    },
    Attribute {
        timestamp: String,
        summary: String,
    },
    Crash {
        timestamp: String,
        reason: String,
        exit_description: String,
    },
}

impl ClassifiedEvent {
    pub fn timestamp(&self) -> &str {
        match self {
            ClassifiedEvent::Operational { timestamp, .. }
            | ClassifiedEvent::Attribute { timestamp, .. }
            | ClassifiedEvent::Crash { timestamp, .. } => timestamp,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            ClassifiedEvent::Operational { .. } => "operational",
            ClassifiedEvent::Attribute { .. } => "attribute",
            ClassifiedEvent::Crash { .. } => "crash",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RefreshStatus {
    #[default]
    Idle,
    Fetching,
    FetchFailed {
        reason: String,
    },
}

impl RefreshStatus {
    pub fn is_fetching(&self) -> bool {
        matches!(self, RefreshStatus::Fetching)
    }

    /// Caption for the pull-to-refresh control.
    pub fn title(&self) -> &'static str {
        match self {
            RefreshStatus::Idle => "Refresh Events",
            RefreshStatus::Fetching => "Fetching Events",
            RefreshStatus::FetchFailed { .. } => "Refresh Events (last attempt failed)",
        }
    }
}

/// Consistent read of the whole feed for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedSnapshot {
    pub subject: AppGuid,
    pub status: RefreshStatus,
    pub events: Vec<ClassifiedEvent>,
}

/// Notification delivered to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedUpdate {
    Status {
        subject: AppGuid,
        status: RefreshStatus,
    },
    EventsUpdated {
        subject: AppGuid,
        count: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Results were written to the store.
    Applied { stored: usize, dropped: usize },
    /// Another cycle for this subject is still running; nothing was fetched.
    InFlight,
    /// The store was reset while fetching; results were discarded.
    Superseded,
}
