//! Dispatch payload decoding.
//!
//! The dispatch system publishes a flat JSON object:
//!
//! ```json
//! {"event": "approach", "in_dir": "북", "out_dir": "남", "turn": "직진", "explain": "..."}
//! ```
//!
//! Every field is an optional string except `event`.  Direction and turn
//! codes are localised; they are mapped through the fixed tables in
//! [`rsu_types`] and unknown codes pass through unchanged.  Extra fields are
//! ignored.  Empty strings count as absent.

use rsu_types::{Direction, EmergencyEvent, Notification, RsuError, Turn};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPayload {
    event: Option<String>,
    turn: Option<String>,
    in_dir: Option<String>,
    out_dir: Option<String>,
    explain: Option<String>,
}

fn present(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.trim().is_empty())
}

/// Decode a raw payload into a typed [`Notification`].
///
/// # Errors
///
/// Returns [`RsuError::MalformedEvent`] when the payload is not a JSON object
/// of optional strings, or when `event` is missing.
pub fn decode_payload(payload: &[u8]) -> Result<Notification, RsuError> {
    let raw: RawPayload = serde_json::from_slice(payload)
        .map_err(|e| RsuError::MalformedEvent(format!("invalid payload: {e}")))?;
    let name = present(raw.event)
        .ok_or_else(|| RsuError::MalformedEvent("missing `event` field".to_string()))?;

    let event = match name.as_str() {
        "approach" => EmergencyEvent::Approach {
            in_direction: present(raw.in_dir).map(|c| Direction::from_code(&c)),
            out_direction: present(raw.out_dir).map(|c| Direction::from_code(&c)),
            turn: present(raw.turn).map(|c| Turn::from_code(&c)),
        },
        "arrived" => EmergencyEvent::Arrived,
        "passed" => EmergencyEvent::Passed,
        _ => EmergencyEvent::Unknown(name),
    };
    Ok(Notification {
        event,
        explain: present(raw.explain),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localised_approach_decodes_to_canonical_route() {
        let payload = r#"{"event":"approach","in_dir":"북","out_dir":"남","turn":"직진"}"#;
        let note = decode_payload(payload.as_bytes()).unwrap();
        assert_eq!(
            note.event,
            EmergencyEvent::Approach {
                in_direction: Some(Direction::N),
                out_direction: Some(Direction::S),
                turn: Some(Turn::Straight),
            }
        );
        assert_eq!(note.explain, None);
    }

    #[test]
    fn missing_event_is_malformed() {
        let payload = r#"{"in_dir":"북","out_dir":"남"}"#;
        assert!(matches!(
            decode_payload(payload.as_bytes()),
            Err(RsuError::MalformedEvent(_))
        ));
    }

    #[test]
    fn empty_event_is_malformed() {
        assert!(matches!(
            decode_payload(br#"{"event":""}"#),
            Err(RsuError::MalformedEvent(_))
        ));
    }

    #[test]
    fn unparseable_payloads_are_malformed() {
        for payload in [&b"not json"[..], b"[1,2]", br#"{"event":7}"#, b"\xff\xfe"] {
            assert!(
                matches!(decode_payload(payload), Err(RsuError::MalformedEvent(_))),
                "payload {payload:?} should be malformed"
            );
        }
    }

    #[test]
    fn unknown_vocabulary_passes_through() {
        let payload = r#"{"event":"approach","in_dir":"gate 3","turn":"spiral"}"#;
        let note = decode_payload(payload.as_bytes()).unwrap();
        assert_eq!(
            note.event,
            EmergencyEvent::Approach {
                in_direction: Some(Direction::Other("gate 3".into())),
                out_direction: None,
                turn: Some(Turn::Other("spiral".into())),
            }
        );
    }

    #[test]
    fn lifecycle_events_and_explain() {
        let note = decode_payload(br#"{"event":"passed","explain":"unit 12 cleared"}"#).unwrap();
        assert_eq!(note.event, EmergencyEvent::Passed);
        assert_eq!(note.explain.as_deref(), Some("unit 12 cleared"));

        let note = decode_payload(br#"{"event":"arrived"}"#).unwrap();
        assert_eq!(note.event, EmergencyEvent::Arrived);

        let note = decode_payload(br#"{"event":"cancelled","extra":1}"#).unwrap();
        assert_eq!(note.event, EmergencyEvent::Unknown("cancelled".into()));
    }
}
