use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::activity::{ActivityRecord, BatchMetadata};
use crate::contracts::resolve_contract_label;

/// Event type every relayed activity is captured under.
pub const VERIFICATION_EVENT_TYPE: &str = "onchain verification";

/// Canonical analytics event produced for one activity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationEvent {
    pub timestamp: DateTime<Utc>,
    pub contract: &'static str,
    pub network: String,
    pub from_address: String,
    pub to_address: String,
    pub transaction_hash: String,
    pub block: String,
    pub notification_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_id: Option<String>,
}

impl VerificationEvent {
    pub fn event_type(&self) -> &'static str {
        VERIFICATION_EVENT_TYPE
    }

    /// Identity the analytics sink attributes the event to.
    pub fn distinct_id(&self) -> &str {
        &self.from_address
    }
}

/// Maps one activity record; total for every decoded record.
pub fn map_activity(record: &ActivityRecord, batch: &BatchMetadata) -> VerificationEvent {
    VerificationEvent {
        timestamp: batch.created_at,
        contract: resolve_contract_label(&record.to_address),
        network: batch.network.clone(),
        from_address: record.from_address.clone(),
        to_address: record.to_address.clone(),
        transaction_hash: record.transaction_hash.clone(),
        block: record.block_number.clone(),
        notification_id: batch.notification_id.clone(),
        webhook_id: batch.webhook_id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::contracts::{UNKNOWN_CONTRACT, ZERO_ADDRESS};

    fn batch() -> BatchMetadata {
        BatchMetadata {
            notification_id: "whevt_1".into(),
            webhook_id: None,
            created_at: Utc.with_ymd_and_hms(2022, 3, 1, 12, 0, 0).unwrap(),
            network: "ETH_MAINNET".into(),
        }
    }

    fn record(to_address: &str) -> ActivityRecord {
        ActivityRecord {
            from_address: "0xabc".into(),
            to_address: to_address.into(),
            transaction_hash: "0xdead".into(),
            block_number: "0x10".into(),
        }
    }

    #[test]
    fn copies_record_and_batch_fields() {
        let event = map_activity(&record(ZERO_ADDRESS), &batch());
        assert_eq!(event.contract, "burn");
        assert_eq!(event.network, "ETH_MAINNET");
        assert_eq!(event.transaction_hash, "0xdead");
        assert_eq!(event.block, "0x10");
        assert_eq!(event.distinct_id(), "0xabc");
        assert_eq!(event.event_type(), VERIFICATION_EVENT_TYPE);
        assert_eq!(event.timestamp, batch().created_at);
    }

    #[test]
    fn unknown_contracts_are_labelled_unknown() {
        let event = map_activity(&record("0x1234"), &batch());
        assert_eq!(event.contract, UNKNOWN_CONTRACT);
    }

    #[test]
    fn serializes_camel_case_properties() {
        let value = serde_json::to_value(map_activity(&record(ZERO_ADDRESS), &batch())).unwrap();
        assert_eq!(value["fromAddress"], "0xabc");
        assert_eq!(value["transactionHash"], "0xdead");
        assert_eq!(value["timestamp"], "2022-03-01T12:00:00Z");
        assert!(value.get("webhookId").is_none());
    }
}
