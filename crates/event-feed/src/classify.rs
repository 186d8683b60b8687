use tracing::debug;

use crate::decode::decode;
use crate::model::{ClassifiedEvent, EventRecord, RawEventRecord};
use crate::ports::AttributeSummarizer;

pub const OPERATION_TAG: &str = "operation";
pub const UPDATE_TAG: &str = "update";

/// Maps a decoded record to its display category.
///
/// Precedence:
/// 1. `operation` tag: operational when a non-empty requested state exists,
///    otherwise the record is dropped (`None`).
/// 2. `update` tag: attribute change, summary from `summarizer`.
/// 3. any other tag: crash, missing details default to `""`.
/// 4. no tag: operational when [`EventRecord::is_operational`] holds,
///    attribute change otherwise. This path never yields a crash.
pub fn classify(record: &EventRecord, summarizer: &dyn AttributeSummarizer) -> Option<ClassifiedEvent> {
    let timestamp = record.timestamp.clone();
    match record.type_tag.as_deref() {
        Some(OPERATION_TAG) => record
            .requested_state()
            .map(|state| ClassifiedEvent::Operational {
                timestamp,
                requested_state: state.to_string(),
            }),
        Some(UPDATE_TAG) => Some(ClassifiedEvent::Attribute {
            timestamp,
            summary: summarizer.summarize(record),
        }),
        Some(_) => Some(ClassifiedEvent::Crash {
            timestamp,
            reason: record.fields.reason.clone().unwrap_or_default(),
            exit_description: record.fields.exit_description.clone().unwrap_or_default(),
        }),
        None => match record.requested_state() {
            Some(state) => Some(ClassifiedEvent::Operational {
                timestamp,
                requested_state: state.to_string(),
            }),
            None => Some(ClassifiedEvent::Attribute {
                timestamp,
                summary: summarizer.summarize(record),
            }),
        },
    }
}

/// Outcome of decoding and classifying one fetched page.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ClassifiedBatch {
    pub events: Vec<ClassifiedEvent>,
    pub dropped_decode: usize,
    pub dropped_classify: usize,
    pub truncated: usize,
}

impl ClassifiedBatch {
    pub fn dropped(&self) -> usize {
        self.dropped_decode + self.dropped_classify
    }
}

/// Decodes and classifies `raw` in server order. Records that fail either
/// step are skipped; at most `max_events` survivors are kept (`0` = no cap).
pub fn classify_batch(
    raw: &[RawEventRecord],
    summarizer: &dyn AttributeSummarizer,
    max_events: usize,
) -> ClassifiedBatch {
    let mut batch = ClassifiedBatch::default();
    for (index, record) in raw.iter().enumerate() {
        let decoded = match decode(record) {
            Ok(decoded) => decoded,
            Err(err) => {
                debug!(index, %err, "dropping undecodable event record");
                batch.dropped_decode += 1;
                continue;
            }
        };
        match classify(&decoded, summarizer) {
            Some(event) => batch.events.push(event),
            None => {
                debug!(
                    index,
                    guid = decoded.guid.as_deref().unwrap_or("-"),
                    "dropping operation event without requested state"
                );
                batch.dropped_classify += 1;
            }
        }
    }
    if max_events > 0 && batch.events.len() > max_events {
        batch.truncated = batch.events.len() - max_events;
        batch.events.truncate(max_events);
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: &str = "2020-01-02T03:04:05+0000";

    struct Fixed;

    impl AttributeSummarizer for Fixed {
        fn summarize(&self, _record: &EventRecord) -> String {
            "summary".into()
        }
    }

    #[test]
    fn operation_with_state_is_operational() {
        let record = EventRecord::new(TS)
            .with_type(OPERATION_TAG)
            .with_requested_state("STARTED");
        assert_eq!(
            classify(&record, &Fixed),
            Some(ClassifiedEvent::Operational {
                timestamp: TS.into(),
                requested_state: "STARTED".into(),
            })
        );
    }

    #[test]
    fn operation_without_state_is_dropped() {
        let absent = EventRecord::new(TS).with_type(OPERATION_TAG);
        let empty = EventRecord::new(TS)
            .with_type(OPERATION_TAG)
            .with_requested_state("");
        assert_eq!(classify(&absent, &Fixed), None);
        assert_eq!(classify(&empty, &Fixed), None);
    }

    #[test]
    fn update_uses_summarizer() {
        let record = EventRecord::new(TS)
            .with_type(UPDATE_TAG)
            .with_requested_state("STOPPED");
        assert_eq!(
            classify(&record, &Fixed),
            Some(ClassifiedEvent::Attribute {
                timestamp: TS.into(),
                summary: "summary".into(),
            })
        );
    }

    #[test]
    fn tags_are_case_sensitive() {
        let record = EventRecord::new(TS)
            .with_type("Operation")
            .with_requested_state("STARTED");
        assert!(matches!(
            classify(&record, &Fixed),
            Some(ClassifiedEvent::Crash { .. })
        ));
    }

    #[test]
    fn unknown_tag_is_crash_with_defaults() {
        let record = EventRecord::new(TS).with_type("app.crash");
        assert_eq!(
            classify(&record, &Fixed),
            Some(ClassifiedEvent::Crash {
                timestamp: TS.into(),
                reason: String::new(),
                exit_description: String::new(),
            })
        );

        let mut detailed = EventRecord::new(TS).with_type("crash");
        detailed.fields.reason = Some("CRASHED".into());
        detailed.fields.exit_description = Some("exited with status 137".into());
        assert_eq!(
            classify(&detailed, &Fixed),
            Some(ClassifiedEvent::Crash {
                timestamp: TS.into(),
                reason: "CRASHED".into(),
                exit_description: "exited with status 137".into(),
            })
        );
    }

    #[test]
    fn batch_keeps_server_order_and_counts_drops() {
        let raw: Vec<RawEventRecord> = [
            serde_json::json!({"timestamp": TS, "type": "operation", "requestedState": "STARTED"}),
            serde_json::json!({"type": "operation", "requestedState": "STOPPED"}),
            serde_json::json!({"timestamp": TS, "type": "operation"}),
            serde_json::json!({"timestamp": TS, "type": "app.crash", "reason": "CRASHED"}),
            serde_json::json!({"timestamp": TS, "type": "update"}),
        ]
        .into_iter()
        .filter_map(|value| value.as_object().cloned())
        .collect();

        let batch = classify_batch(&raw, &Fixed, 0);
        let categories: Vec<_> = batch.events.iter().map(ClassifiedEvent::category).collect();
        assert_eq!(categories, vec!["operational", "crash", "attribute"]);
        assert_eq!(batch.dropped_decode, 1);
        assert_eq!(batch.dropped_classify, 1);
        assert_eq!(batch.dropped(), 2);
    }

    #[test]
    fn batch_cap_truncates_tail() {
        let raw: Vec<RawEventRecord> = (0..4)
            .filter_map(|_| serde_json::json!({"timestamp": TS, "type": "update"}).as_object().cloned())
            .collect();
        let batch = classify_batch(&raw, &Fixed, 3);
        assert_eq!(batch.events.len(), 3);
        assert_eq!(batch.truncated, 1);
    }

    #[test]
    fn untagged_records_fall_back_and_never_crash() {
        let operational = EventRecord::new(TS).with_requested_state("STOPPED");
        assert!(matches!(
            classify(&operational, &Fixed),
            Some(ClassifiedEvent::Operational { .. })
        ));

        let mut attribute = EventRecord::new(TS);
        attribute.fields.reason = Some("CRASHED".into());
        assert_eq!(
            classify(&attribute, &Fixed),
            Some(ClassifiedEvent::Attribute {
                timestamp: TS.into(),
                summary: "summary".into(),
            })
        );
    }
}
