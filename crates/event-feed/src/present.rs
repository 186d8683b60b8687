use serde::Serialize;

use crate::model::ClassifiedEvent;
use crate::timestamp::TimestampFormatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowKind {
    Operation,
    Attribute,
    Crash,
}

impl RowKind {
    /// Reuse identifier of the cell template that renders this row.
    pub fn cell_identifier(&self) -> &'static str {
        match self {
            RowKind::Operation => "OperationEventCell",
            RowKind::Attribute => "AttributeEventCell",
            RowKind::Crash => "CrashEventCell",
        }
    }
}

/// View-model for one feed row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedRow {
    pub kind: RowKind,
    pub date_label: String,
    pub primary: String,
    pub secondary: Option<String>,
    pub icon: Option<String>,
}

pub fn row(event: &ClassifiedEvent, formatter: &TimestampFormatter) -> FeedRow {
    let date_label = formatter.format_or_placeholder(event.timestamp());
    match event {
        ClassifiedEvent::Operational {
            requested_state, ..
        } => FeedRow {
            kind: RowKind::Operation,
            date_label,
            primary: requested_state.clone(),
            secondary: None,
            icon: Some(requested_state.to_lowercase()),
        },
        ClassifiedEvent::Attribute { summary, .. } => FeedRow {
            kind: RowKind::Attribute,
            date_label,
            primary: summary.clone(),
            secondary: None,
            icon: None,
        },
        ClassifiedEvent::Crash {
            reason,
            exit_description,
            ..
        } => FeedRow {
            kind: RowKind::Crash,
            date_label,
            primary: reason.clone(),
            secondary: Some(exit_description.clone()),
            icon: None,
        },
    }
}

pub fn rows(events: &[ClassifiedEvent], formatter: &TimestampFormatter) -> Vec<FeedRow> {
    events.iter().map(|event| row(event, formatter)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_category_maps_to_its_cell() {
        let formatter = TimestampFormatter::utc();
        let events = vec![
            ClassifiedEvent::Operational {
                timestamp: "2020-01-02T03:04:05Z".into(),
                requested_state: "STARTED".into(),
            },
            ClassifiedEvent::Attribute {
                timestamp: "2020-01-02T03:04:05Z".into(),
                summary: "instances: 2".into(),
            },
            ClassifiedEvent::Crash {
                timestamp: "2020-01-02T03:04:05Z".into(),
                reason: "CRASHED".into(),
                exit_description: String::new(),
            },
        ];
        let rendered = rows(&events, &formatter);
        let cells: Vec<_> = rendered.iter().map(|r| r.kind.cell_identifier()).collect();
        assert_eq!(
            cells,
            vec!["OperationEventCell", "AttributeEventCell", "CrashEventCell"]
        );
        assert_eq!(rendered[0].icon.as_deref(), Some("started"));
        assert_eq!(rendered[0].date_label, "Jan 2, 2020, 3:04:05 AM");
        assert_eq!(rendered[1].primary, "instances: 2");
        assert_eq!(rendered[2].secondary.as_deref(), Some(""));
    }

    #[test]
    fn malformed_timestamp_only_affects_its_row() {
        let formatter = TimestampFormatter::utc();
        let events = vec![
            ClassifiedEvent::Attribute {
                timestamp: "not a time".into(),
                summary: "x".into(),
            },
            ClassifiedEvent::Attribute {
                timestamp: "2020-01-02T03:04:05Z".into(),
                summary: "y".into(),
            },
        ];
        let rendered = rows(&events, &formatter);
        assert_eq!(rendered[0].date_label, formatter.placeholder());
        assert_eq!(rendered[1].date_label, "Jan 2, 2020, 3:04:05 AM");
    }
}
