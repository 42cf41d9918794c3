//! JSON payload helpers.

use crate::log_record::LogEnvelope;

use super::broker::PublishProperties;

pub const CONTENT_TYPE: &str = "application/json";
pub const CONTENT_ENCODING: &str = "utf-8";

/// Properties attached to every published envelope.
pub fn publish_properties() -> PublishProperties {
    PublishProperties {
        content_type: CONTENT_TYPE.to_owned(),
        content_encoding: CONTENT_ENCODING.to_owned(),
    }
}

/// Encode an envelope as a UTF-8 JSON object with keys `host`, `timestamp`,
/// `name`, `level`, `message` and `meta`.
pub fn serialise_envelope(envelope: &LogEnvelope) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(envelope)
}

/// Decode a payload produced by [`serialise_envelope`].
pub fn deserialise_envelope(payload: &[u8]) -> serde_json::Result<LogEnvelope> {
    serde_json::from_slice(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};

    #[fixture]
    fn envelope() -> LogEnvelope {
        LogEnvelope::at(
            "web-1",
            1_700_000_000_123,
            "amqp-transport",
            Level::Error,
            "disk full",
            Some(json!({"mount": "/var", "free": 0})),
        )
    }

    #[rstest]
    fn payload_has_expected_keys(envelope: LogEnvelope) {
        let payload = serialise_envelope(&envelope).expect("serialise");
        let parsed: Value = serde_json::from_slice(&payload).expect("parse");
        assert_eq!(parsed["host"], "web-1");
        assert_eq!(parsed["timestamp"], 1_700_000_000_123_i64);
        assert_eq!(parsed["name"], "amqp-transport");
        assert_eq!(parsed["level"], "error");
        assert_eq!(parsed["message"], "disk full");
        assert_eq!(parsed["meta"], json!({"mount": "/var", "free": 0}));
        assert_eq!(parsed.as_object().map(|o| o.len()), Some(6));
    }

    #[rstest]
    fn absent_meta_is_null(mut envelope: LogEnvelope) {
        envelope.meta = None;
        let payload = serialise_envelope(&envelope).expect("serialise");
        let parsed: Value = serde_json::from_slice(&payload).expect("parse");
        assert!(parsed["meta"].is_null());
        assert!(parsed.as_object().is_some_and(|o| o.contains_key("meta")));
    }

    #[rstest]
    fn decode_restores_envelope(envelope: LogEnvelope) {
        let payload = serialise_envelope(&envelope).expect("serialise");
        assert_eq!(deserialise_envelope(&payload).expect("decode"), envelope);
    }

    #[rstest]
    fn decode_accepts_missing_meta() {
        let payload = br#"{"host":"h","timestamp":5,"name":"n","level":"info","message":"m"}"#;
        let decoded = deserialise_envelope(payload).expect("decode");
        assert!(decoded.meta.is_none());
        assert_eq!(decoded.level, Level::Info);
    }

    #[rstest]
    fn properties_declare_json_utf8() {
        let props = publish_properties();
        assert_eq!(props.content_type, "application/json");
        assert_eq!(props.content_encoding, "utf-8");
    }
}
