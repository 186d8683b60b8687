use crate::model::EventRecord;
use crate::ports::AttributeSummarizer;

pub const NO_CHANGES_SUMMARY: &str = "Application updated";

/// Renders the changed attributes as `key: value` pairs in key order.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChangeListSummarizer;

impl AttributeSummarizer for ChangeListSummarizer {
    fn summarize(&self, record: &EventRecord) -> String {
        let state = record
            .requested_state()
            .map(|state| format!("state: {state}"));
        let parts: Vec<String> = state
            .into_iter()
            .chain(
                record
                    .fields
                    .changes
                    .iter()
                    .map(|(key, value)| format!("{key}: {value}")),
            )
            .collect();
        if parts.is_empty() {
            NO_CHANGES_SUMMARY.to_string()
        } else {
            parts.join(", ")
        }
    }
}
