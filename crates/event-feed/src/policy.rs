use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::timestamp::{DEFAULT_PLACEHOLDER, MEDIUM_DATE_TIME};

/// How a successful cycle is written to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshMode {
    /// Each cycle replaces the visible set.
    #[default]
    Replace,
    /// Each cycle appends to what is already shown; repeated refreshes
    /// duplicate events.
    Accumulate,
}

impl std::str::FromStr for RefreshMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(RefreshMode::Replace),
            "accumulate" | "append" => Ok(RefreshMode::Accumulate),
            other => Err(format!("unknown refresh mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedPolicyView {
    pub refresh_mode: RefreshMode,
    pub fetch_timeout_ms: u64,
    pub max_events: usize,
    pub timestamp_pattern: String,
    pub locale: String,
    /// `None` renders in the local zone.
    pub display_utc_offset_secs: Option<i32>,
    pub placeholder: String,
}

impl Default for FeedPolicyView {
    fn default() -> Self {
        Self {
            refresh_mode: RefreshMode::Replace,
            fetch_timeout_ms: 30_000,
            max_events: 500,
            timestamp_pattern: MEDIUM_DATE_TIME.to_string(),
            locale: "en_US".to_string(),
            display_utc_offset_secs: None,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

static GLOBAL_POLICY: OnceCell<Arc<RwLock<FeedPolicyView>>> = OnceCell::new();

fn policy_cell() -> Arc<RwLock<FeedPolicyView>> {
    GLOBAL_POLICY
        .get_or_init(|| Arc::new(RwLock::new(FeedPolicyView::default())))
        .clone()
}

#[derive(Clone)]
pub struct FeedPolicyHandle {
    inner: Arc<RwLock<FeedPolicyView>>,
}

impl FeedPolicyHandle {
    pub fn new_with(view: FeedPolicyView) -> Self {
        Self {
            inner: Arc::new(RwLock::new(view)),
        }
    }

    pub fn global() -> Self {
        Self {
            inner: policy_cell(),
        }
    }

    pub fn snapshot(&self) -> FeedPolicyView {
        self.inner.read().clone()
    }

    pub fn update(&self, view: FeedPolicyView) {
        *self.inner.write() = view;
    }
}

pub fn set_policy(view: FeedPolicyView) {
    FeedPolicyHandle::global().update(view);
}

pub fn current_policy() -> FeedPolicyView {
    FeedPolicyHandle::global().snapshot()
}

impl crate::ports::PolicyPort for FeedPolicyHandle {
    fn view(&self) -> FeedPolicyView {
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_like_json_keeps_defaults() {
        let view: FeedPolicyView =
            serde_json::from_value(serde_json::json!({"refresh_mode": "accumulate"})).unwrap();
        assert_eq!(view.refresh_mode, RefreshMode::Accumulate);
        assert_eq!(view.fetch_timeout_ms, 30_000);
        assert_eq!(view.locale, "en_US");
    }

    #[test]
    fn handle_updates_are_visible_to_clones() {
        let handle = FeedPolicyHandle::new_with(FeedPolicyView::default());
        let clone = handle.clone();
        let mut view = handle.snapshot();
        view.max_events = 3;
        handle.update(view);
        assert_eq!(clone.snapshot().max_events, 3);
    }

    #[test]
    fn refresh_mode_parses_aliases() {
        assert_eq!("Replace".parse::<RefreshMode>(), Ok(RefreshMode::Replace));
        assert_eq!("append".parse::<RefreshMode>(), Ok(RefreshMode::Accumulate));
        assert!("merge".parse::<RefreshMode>().is_err());
    }
}
