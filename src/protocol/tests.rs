//! Protocol Module Tests
//!
//! Validates the envelope codec that sits between the transport and the agents.
//!
//! ## Test Scopes
//! - **Encoding**: event names and payload shapes match the published event table.
//! - **Decoding**: lenient numeric parsing, rejection of malformed payloads, unknown events.
//! - **Snapshot layout**: camelCase keys and `[index, value]` pairs.

#[cfg(test)]
mod tests {
    use crate::error::ProtocolError;
    use crate::protocol::{Event, Role, Snapshot, ValueMap, ValuePair};
    use serde_json::{Value, json};

    fn frame(event: &str, payload: Value) -> String {
        json!({ "event": event, "payload": payload }).to_string()
    }

    // ============================================================
    // ENCODING
    // ============================================================

    #[test]
    fn test_request_values_encodes_pair() {
        let event = Event::RequestValues(ValuePair { n1: 9, n2: 8 });
        let encoded: Value = serde_json::from_str(&event.encode()).unwrap();

        assert_eq!(encoded["event"], "request-values");
        assert_eq!(encoded["payload"], json!({ "n1": 9, "n2": 8 }));
    }

    #[test]
    fn test_computed_result_uses_string_keys() {
        let mut values = ValueMap::new();
        values.insert(7, 13);
        let encoded: Value = serde_json::from_str(&Event::ComputedResult(values).encode()).unwrap();

        assert_eq!(encoded["event"], "computed-result");
        assert_eq!(encoded["payload"], json!({ "7": 13 }));
    }

    #[test]
    fn test_values_found_wraps_map() {
        let mut values = ValueMap::new();
        values.insert(4, 3);
        values.insert(3, 2);
        let encoded: Value = serde_json::from_str(&Event::ValuesFound(values).encode()).unwrap();

        assert_eq!(encoded["payload"], json!({ "values": { "3": 2, "4": 3 } }));
    }

    #[test]
    fn test_unit_events_omit_payload() {
        let encoded: Value =
            serde_json::from_str(&Event::StorageDisconnected.encode()).unwrap();

        assert_eq!(encoded["event"], "storage-disconnected");
        assert!(encoded.get("payload").is_none());
    }

    #[test]
    fn test_snapshot_layout() {
        let snapshot = Snapshot {
            values: vec![(0, 0), (1, 1), (2, 1)],
            target_n: Some(2),
            original_target_n: None,
            message_count: 3,
        };

        let encoded: Value =
            serde_json::from_str(&Event::StorageReconnected(snapshot).encode()).unwrap();

        assert_eq!(
            encoded["payload"],
            json!({
                "values": [[0, 0], [1, 1], [2, 1]],
                "targetN": 2,
                "originalTargetN": null,
                "messageCount": 3,
            })
        );
    }

    // ============================================================
    // DECODING
    // ============================================================

    #[test]
    fn test_decode_every_encoded_event() {
        let mut values = ValueMap::new();
        values.insert(5, 5);

        let events = vec![
            Event::SelectRole("compute".to_string()),
            Event::RoleConfirmed(Role::Storage),
            Event::ForceDisconnect("Another device took your role".to_string()),
            Event::RequestValues(ValuePair { n1: 4, n2: 3 }),
            Event::ValuesFound(values.clone()),
            Event::ValuesNotFound(ValuePair { n1: 4, n2: 3 }),
            Event::ComputedResult(values),
            Event::StorageDisconnected,
            Event::StorageReconnected(Snapshot::default()),
            Event::StorageDisconnect,
            Event::StorageReconnect(None),
            Event::RequestReconnect,
            Event::ReconnectRequested,
        ];

        for event in events {
            let decoded = Event::decode(&event.encode()).expect("decode failed");
            assert_eq!(decoded, event);
        }
    }

    #[test]
    fn test_pair_accepts_numeric_strings() {
        let decoded = Event::decode(&frame("request-values", json!({ "n1": "9", "n2": 8 })));

        assert_eq!(decoded, Ok(Event::RequestValues(ValuePair { n1: 9, n2: 8 })));
    }

    #[test]
    fn test_pair_rejects_non_numeric() {
        let decoded = Event::decode(&frame("values-not-found", json!({ "n1": "nine", "n2": 8 })));

        assert!(matches!(decoded, Err(ProtocolError::NotAnIndex { .. })));
    }

    #[test]
    fn test_pair_rejects_negative_and_fractional() {
        let negative = Event::decode(&frame("request-values", json!({ "n1": -1, "n2": 0 })));
        let fractional = Event::decode(&frame("request-values", json!({ "n1": 2.5, "n2": 1 })));

        assert!(negative.is_err());
        assert!(fractional.is_err());
    }

    #[test]
    fn test_value_map_drops_invalid_entries() {
        let decoded = Event::decode(&frame(
            "computed-result",
            json!({ "5": 5, "six": 8, "7": "13", "8": null }),
        ))
        .unwrap();

        let Event::ComputedResult(values) = decoded else {
            panic!("expected computed-result");
        };
        assert_eq!(values.len(), 2);
        assert_eq!(values.get(&5), Some(&5));
        assert_eq!(values.get(&7), Some(&13));
    }

    #[test]
    fn test_value_map_rejects_non_object() {
        let decoded = Event::decode(&frame("computed-result", json!([1, 2, 3])));

        assert!(matches!(decoded, Err(ProtocolError::InvalidPayload { .. })));
    }

    #[test]
    fn test_values_found_requires_values_key() {
        let decoded = Event::decode(&frame("values-found", json!({ "3": 2 })));

        assert!(decoded.is_err());
    }

    #[test]
    fn test_unknown_event() {
        let decoded = Event::decode(&frame("compute-values", json!({})));

        assert_eq!(
            decoded,
            Err(ProtocolError::UnknownEvent("compute-values".to_string()))
        );
    }

    #[test]
    fn test_malformed_frame() {
        assert!(matches!(
            Event::decode("not json"),
            Err(ProtocolError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_select_role_keeps_unknown_names() {
        let decoded = Event::decode(&frame("select-role", json!("laptop"))).unwrap();

        assert_eq!(decoded, Event::SelectRole("laptop".to_string()));
    }

    #[test]
    fn test_role_confirmed_rejects_unknown_role() {
        assert!(Event::decode(&frame("role-confirmed", json!("phone"))).is_err());
    }

    #[test]
    fn test_storage_reconnect_without_payload() {
        let decoded = Event::decode(r#"{"event":"storage-reconnect"}"#).unwrap();
        assert_eq!(decoded, Event::StorageReconnect(None));

        let decoded = Event::decode(r#"{"event":"storage-reconnected"}"#).unwrap();
        assert_eq!(decoded, Event::StorageReconnected(Snapshot::default()));
    }

    #[test]
    fn test_snapshot_with_missing_fields_uses_defaults() {
        let decoded = Event::decode(&frame(
            "storage-reconnect",
            json!({ "values": [[0, 0], [1, 1]] }),
        ))
        .unwrap();

        let Event::StorageReconnect(Some(snapshot)) = decoded else {
            panic!("expected snapshot");
        };
        assert_eq!(snapshot.values, vec![(0, 0), (1, 1)]);
        assert_eq!(snapshot.target_n, None);
        assert_eq!(snapshot.message_count, 0);
    }

    // ============================================================
    // TYPES
    // ============================================================

    #[test]
    fn test_role_names() {
        assert_eq!("compute".parse::<Role>(), Ok(Role::Compute));
        assert_eq!("storage".parse::<Role>(), Ok(Role::Storage));
        assert!("phone".parse::<Role>().is_err());
        assert_eq!(Role::Storage.to_string(), "storage");
    }

    #[test]
    fn test_dependencies_of() {
        let pair = ValuePair::dependencies_of(10);

        assert_eq!(pair, ValuePair { n1: 9, n2: 8 });
        assert_eq!(pair.members(), [8, 9]);
    }
}
