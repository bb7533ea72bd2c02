use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

use super::types::{Role, Snapshot, ValuePair};
use crate::error::ProtocolError;

/// Index -> value pairs carried by `values-found` and `computed-result`.
pub type ValueMap = BTreeMap<u64, u64>;

pub const EVENT_SELECT_ROLE: &str = "select-role";
pub const EVENT_ROLE_CONFIRMED: &str = "role-confirmed";
pub const EVENT_FORCE_DISCONNECT: &str = "force-disconnect";
pub const EVENT_REQUEST_VALUES: &str = "request-values";
pub const EVENT_VALUES_FOUND: &str = "values-found";
pub const EVENT_VALUES_NOT_FOUND: &str = "values-not-found";
pub const EVENT_COMPUTED_RESULT: &str = "computed-result";
pub const EVENT_STORAGE_DISCONNECTED: &str = "storage-disconnected";
pub const EVENT_STORAGE_RECONNECTED: &str = "storage-reconnected";
pub const EVENT_STORAGE_DISCONNECT: &str = "storage-disconnect";
pub const EVENT_STORAGE_RECONNECT: &str = "storage-reconnect";
pub const EVENT_REQUEST_RECONNECT: &str = "request-reconnect";
pub const EVENT_RECONNECT_REQUESTED: &str = "reconnect-requested";

/// Raw frame as it travels over the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

/// Every message the system exchanges.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Peer -> relay. The role name stays raw: unrecognized names are ignored by the relay.
    SelectRole(String),
    RoleConfirmed(Role),
    ForceDisconnect(String),
    RequestValues(ValuePair),
    ValuesFound(ValueMap),
    ValuesNotFound(ValuePair),
    ComputedResult(ValueMap),
    StorageDisconnected,
    StorageReconnected(Snapshot),
    StorageDisconnect,
    StorageReconnect(Option<Snapshot>),
    RequestReconnect,
    ReconnectRequested,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::SelectRole(_) => EVENT_SELECT_ROLE,
            Event::RoleConfirmed(_) => EVENT_ROLE_CONFIRMED,
            Event::ForceDisconnect(_) => EVENT_FORCE_DISCONNECT,
            Event::RequestValues(_) => EVENT_REQUEST_VALUES,
            Event::ValuesFound(_) => EVENT_VALUES_FOUND,
            Event::ValuesNotFound(_) => EVENT_VALUES_NOT_FOUND,
            Event::ComputedResult(_) => EVENT_COMPUTED_RESULT,
            Event::StorageDisconnected => EVENT_STORAGE_DISCONNECTED,
            Event::StorageReconnected(_) => EVENT_STORAGE_RECONNECTED,
            Event::StorageDisconnect => EVENT_STORAGE_DISCONNECT,
            Event::StorageReconnect(_) => EVENT_STORAGE_RECONNECT,
            Event::RequestReconnect => EVENT_REQUEST_RECONNECT,
            Event::ReconnectRequested => EVENT_RECONNECT_REQUESTED,
        }
    }

    pub fn to_envelope(&self) -> Envelope {
        let payload = match self {
            Event::SelectRole(name) => Value::String(name.clone()),
            Event::RoleConfirmed(role) => Value::String(role.as_str().to_string()),
            Event::ForceDisconnect(reason) => Value::String(reason.clone()),
            Event::RequestValues(pair) | Event::ValuesNotFound(pair) => {
                json!({ "n1": pair.n1, "n2": pair.n2 })
            }
            Event::ValuesFound(values) => json!({ "values": value_map_to_json(values) }),
            Event::ComputedResult(values) => value_map_to_json(values),
            Event::StorageReconnected(snapshot) => snapshot_to_json(snapshot),
            Event::StorageReconnect(Some(snapshot)) => snapshot_to_json(snapshot),
            Event::StorageReconnect(None)
            | Event::StorageDisconnected
            | Event::StorageDisconnect
            | Event::RequestReconnect
            | Event::ReconnectRequested => Value::Null,
        };

        Envelope {
            event: self.name().to_string(),
            payload,
        }
    }

    /// Serializes the event into a text frame.
    pub fn encode(&self) -> String {
        let envelope = self.to_envelope();
        let mut frame = Map::new();
        frame.insert("event".to_string(), Value::String(envelope.event));
        if !envelope.payload.is_null() {
            frame.insert("payload".to_string(), envelope.payload);
        }
        Value::Object(frame).to_string()
    }

    /// Parses a text frame into a typed event.
    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(frame)
            .map_err(|e| ProtocolError::MalformedFrame(e.to_string()))?;
        Self::from_envelope(envelope)
    }

    pub fn from_envelope(envelope: Envelope) -> Result<Self, ProtocolError> {
        let payload = envelope.payload;

        let event = match envelope.event.as_str() {
            EVENT_SELECT_ROLE => Event::SelectRole(expect_string(EVENT_SELECT_ROLE, &payload)?),
            EVENT_ROLE_CONFIRMED => {
                let name = expect_string(EVENT_ROLE_CONFIRMED, &payload)?;
                let role = name
                    .parse::<Role>()
                    .map_err(|reason| ProtocolError::InvalidPayload {
                        event: EVENT_ROLE_CONFIRMED,
                        reason,
                    })?;
                Event::RoleConfirmed(role)
            }
            EVENT_FORCE_DISCONNECT => {
                Event::ForceDisconnect(payload.as_str().unwrap_or_default().to_string())
            }
            EVENT_REQUEST_VALUES => Event::RequestValues(parse_pair(&payload)?),
            EVENT_VALUES_NOT_FOUND => Event::ValuesNotFound(parse_pair(&payload)?),
            EVENT_VALUES_FOUND => {
                let values = payload.get("values").ok_or(ProtocolError::InvalidPayload {
                    event: EVENT_VALUES_FOUND,
                    reason: "missing 'values'".to_string(),
                })?;
                Event::ValuesFound(parse_value_map(EVENT_VALUES_FOUND, values)?)
            }
            EVENT_COMPUTED_RESULT => {
                Event::ComputedResult(parse_value_map(EVENT_COMPUTED_RESULT, &payload)?)
            }
            EVENT_STORAGE_DISCONNECTED => Event::StorageDisconnected,
            EVENT_STORAGE_RECONNECTED => Event::StorageReconnected(
                parse_snapshot(EVENT_STORAGE_RECONNECTED, payload)?.unwrap_or_default(),
            ),
            EVENT_STORAGE_DISCONNECT => Event::StorageDisconnect,
            EVENT_STORAGE_RECONNECT => {
                Event::StorageReconnect(parse_snapshot(EVENT_STORAGE_RECONNECT, payload)?)
            }
            EVENT_REQUEST_RECONNECT => Event::RequestReconnect,
            EVENT_RECONNECT_REQUESTED => Event::ReconnectRequested,
            other => return Err(ProtocolError::UnknownEvent(other.to_string())),
        };

        Ok(event)
    }
}

/// Reads a non-negative integer from a JSON number or a decimal string.
pub fn parse_index(field: &str, value: &Value) -> Result<u64, ProtocolError> {
    let parsed = match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| ProtocolError::NotAnIndex {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn parse_pair(payload: &Value) -> Result<ValuePair, ProtocolError> {
    let n1 = parse_index("n1", payload.get("n1").unwrap_or(&Value::Null))?;
    let n2 = parse_index("n2", payload.get("n2").unwrap_or(&Value::Null))?;
    Ok(ValuePair { n1, n2 })
}

/// Keeps every syntactically valid entry and drops the rest with a warning.
fn parse_value_map(event: &'static str, payload: &Value) -> Result<ValueMap, ProtocolError> {
    let Value::Object(entries) = payload else {
        return Err(ProtocolError::InvalidPayload {
            event,
            reason: format!("expected an object, got {}", payload),
        });
    };

    let mut values = ValueMap::new();
    for (key, value) in entries {
        match (key.trim().parse::<u64>(), parse_index(key, value)) {
            (Ok(index), Ok(value)) => {
                values.insert(index, value);
            }
            _ => {
                tracing::warn!("Dropping invalid entry {}={} in '{}'", key, value, event);
            }
        }
    }

    Ok(values)
}

fn parse_snapshot(event: &'static str, payload: Value) -> Result<Option<Snapshot>, ProtocolError> {
    if payload.is_null() {
        return Ok(None);
    }

    serde_json::from_value(payload)
        .map(Some)
        .map_err(|e| ProtocolError::InvalidPayload {
            event,
            reason: e.to_string(),
        })
}

fn expect_string(event: &'static str, payload: &Value) -> Result<String, ProtocolError> {
    payload
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ProtocolError::InvalidPayload {
            event,
            reason: format!("expected a string, got {}", payload),
        })
}

fn value_map_to_json(values: &ValueMap) -> Value {
    let entries: Map<String, Value> = values
        .iter()
        .map(|(index, value)| (index.to_string(), Value::from(*value)))
        .collect();
    Value::Object(entries)
}

fn snapshot_to_json(snapshot: &Snapshot) -> Value {
    json!({
        "values": snapshot.values,
        "targetN": snapshot.target_n,
        "originalTargetN": snapshot.original_target_n,
        "messageCount": snapshot.message_count,
    })
}
