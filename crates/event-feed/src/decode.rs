//! Wire record -> [`EventRecord`].
//!
//! Accepts the flat record shape as well as the v2 envelope
//! (`{"metadata": {..}, "entity": {..}}`) the platform API returns.
//!
//! Envelope audit types are folded into the classifier's vocabulary:
//!
//! | audit type | tag | requested state |
//! |---|---|---|
//! | `audit.app.start`, `audit.app.restart` | `operation` | `STARTED` unless the request names one |
//! | `audit.app.stop` | `operation` | `STOPPED` unless the request names one |
//! | `audit.app.update` with a requested state | `operation` | from the request |
//! | `audit.app.update` without one, any other `audit.app.*` | `update` | |
//! | anything else (`app.crash`, ...) | unchanged | |

use serde_json::{Map, Value};

use crate::classify::{OPERATION_TAG, UPDATE_TAG};
use crate::errors::DecodeError;
use crate::model::{EventRecord, RawEventRecord};
use crate::timestamp::parse_wire_timestamp;

const TIMESTAMP_KEY: &str = "timestamp";
const TYPE_KEYS: &[&str] = &["type"];
const GUID_KEYS: &[&str] = &["guid"];
const REQUESTED_STATE_KEYS: &[&str] = &["requestedState", "requested_state", "state"];
const REASON_KEYS: &[&str] = &["reason"];
const EXIT_DESCRIPTION_KEYS: &[&str] = &["exitDescription", "exit_description"];

const AUDIT_APP_PREFIX: &str = "audit.app.";

pub fn decode(raw: &RawEventRecord) -> Result<EventRecord, DecodeError> {
    match raw.get("entity").and_then(Value::as_object) {
        Some(entity) => {
            let mut record = decode_envelope(raw, entity)?;
            normalize_audit_type(&mut record);
            Ok(record)
        }
        None => decode_flat(raw, true),
    }
}

fn decode_flat(raw: &Map<String, Value>, collect_changes: bool) -> Result<EventRecord, DecodeError> {
    let timestamp = string_field(raw, &[TIMESTAMP_KEY])
        .filter(|ts| parse_wire_timestamp(ts).is_ok())
        .ok_or(DecodeError::MissingTimestamp)?;

    let mut record = EventRecord::new(timestamp);
    record.type_tag = string_field(raw, TYPE_KEYS);
    record.guid = string_field(raw, GUID_KEYS);
    record.fields.requested_state = string_field(raw, REQUESTED_STATE_KEYS);
    record.fields.reason = string_field(raw, REASON_KEYS);
    record.fields.exit_description = string_field(raw, EXIT_DESCRIPTION_KEYS);

    if collect_changes {
        for (key, value) in raw {
            if is_reserved(key) {
                continue;
            }
            if let Some(rendered) = scalar_to_string(value) {
                record.fields.changes.insert(key.clone(), rendered);
            }
        }
    }
    Ok(record)
}

fn decode_envelope(
    raw: &Map<String, Value>,
    entity: &Map<String, Value>,
) -> Result<EventRecord, DecodeError> {
    let mut record = decode_flat(entity, false)?;

    if record.guid.is_none() {
        record.guid = raw
            .get("metadata")
            .and_then(Value::as_object)
            .and_then(|meta| string_field(meta, GUID_KEYS));
    }

    let Some(meta) = entity.get("metadata").and_then(Value::as_object) else {
        return Ok(record);
    };

    let fields = &mut record.fields;
    if fields.reason.is_none() {
        fields.reason = string_field(meta, REASON_KEYS);
    }
    if fields.exit_description.is_none() {
        fields.exit_description = string_field(meta, EXIT_DESCRIPTION_KEYS);
    }

    if let Some(request) = meta.get("request").and_then(Value::as_object) {
        if fields.requested_state.is_none() {
            fields.requested_state = string_field(request, REQUESTED_STATE_KEYS);
        }
        for (key, value) in request {
            if REQUESTED_STATE_KEYS.contains(&key.as_str()) {
                continue;
            }
            if let Some(rendered) = scalar_to_string(value) {
                fields.changes.entry(key.clone()).or_insert(rendered);
            }
        }
    }
    Ok(record)
}

fn normalize_audit_type(record: &mut EventRecord) {
    let Some(action) = record
        .type_tag
        .as_deref()
        .and_then(|tag| tag.strip_prefix(AUDIT_APP_PREFIX))
    else {
        return;
    };
    let implied_state = match action {
        "start" | "restart" => Some("STARTED"),
        "stop" => Some("STOPPED"),
        _ => None,
    };
    let operational = implied_state.is_some() || (action == "update" && record.is_operational());

    if operational {
        if record.requested_state().is_none() {
            record.fields.requested_state = implied_state.map(str::to_string);
        }
        record.type_tag = Some(OPERATION_TAG.to_string());
    } else {
        record.type_tag = Some(UPDATE_TAG.to_string());
    }
}

/// First key holding a string. Non-string values count as absent.
fn string_field(raw: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| raw.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn is_reserved(key: &str) -> bool {
    key == TIMESTAMP_KEY
        || [
            TYPE_KEYS,
            GUID_KEYS,
            REQUESTED_STATE_KEYS,
            REASON_KEYS,
            EXIT_DESCRIPTION_KEYS,
        ]
        .iter()
        .any(|keys| keys.contains(&key))
}
