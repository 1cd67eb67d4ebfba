use serde::{Deserialize, Deserializer};

use crate::errors::{AnalyticsError, Result};

/// Deserializes JSON bytes, reporting failures as a malformed payload.
pub fn from_json_bytes<T: serde::de::DeserializeOwned>(input: &[u8]) -> Result<T> {
    serde_json::from_slice(input).map_err(|err| AnalyticsError::MalformedPayload(err.to_string()))
}

/// Reads an optional boolean where an explicit `null` means `false`.
pub fn null_as_false<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<bool>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    struct Notification {
        id: String,
    }

    #[derive(Debug, serde::Deserialize)]
    struct Toggle {
        #[serde(default, deserialize_with = "null_as_false")]
        enabled: bool,
    }

    #[test]
    fn decodes_well_formed_bytes() {
        let notification: Notification = from_json_bytes(br#"{"id": "whevt_1"}"#).expect("decode");
        assert_eq!(notification.id, "whevt_1");
    }

    #[test]
    fn missing_fields_are_malformed() {
        let err = from_json_bytes::<Notification>(br#"{"other": 1}"#).unwrap_err();
        assert!(matches!(err, AnalyticsError::MalformedPayload(_)));
    }

    #[test]
    fn null_flags_read_as_false() {
        let toggle: Toggle = from_json_bytes(br#"{"enabled": null}"#).expect("null");
        assert!(!toggle.enabled);
        let toggle: Toggle = from_json_bytes(br#"{}"#).expect("absent");
        assert!(!toggle.enabled);
        let toggle: Toggle = from_json_bytes(br#"{"enabled": true}"#).expect("set");
        assert!(toggle.enabled);
        assert!(from_json_bytes::<Toggle>(br#"{"enabled": "yes"}"#).is_err());
    }
}
