//! Typed form of the address-activity notification pushed by the provider.

use analytics_core::errors::Result;
use analytics_core::serde_utils::from_json_bytes;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityNotification {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub webhook_id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    pub event: ActivityBatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActivityBatch {
    pub network: String,
    pub activity: Vec<ActivityRecord>,
}

/// One transfer touching a watched address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActivityRecord {
    #[serde(rename = "fromAddress")]
    pub from_address: String,
    #[serde(rename = "toAddress")]
    pub to_address: String,
    #[serde(rename = "hash")]
    pub transaction_hash: String,
    #[serde(rename = "blockNum")]
    pub block_number: String,
}

/// Batch-level fields copied onto every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchMetadata {
    pub notification_id: String,
    pub webhook_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub network: String,
}

impl ActivityNotification {
    /// Decodes a notification, failing with `MalformedPayload` on any
    /// missing or mistyped field.
    pub fn decode(body: &[u8]) -> Result<Self> {
        from_json_bytes(body)
    }

    pub fn metadata(&self) -> BatchMetadata {
        BatchMetadata {
            notification_id: self.id.clone(),
            webhook_id: self.webhook_id.clone(),
            created_at: self.created_at,
            network: self.event.network.clone(),
        }
    }

    pub fn records(&self) -> &[ActivityRecord] {
        &self.event.activity
    }
}
