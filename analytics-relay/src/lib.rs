//! Webhook relay for on-chain verification activity.
//!
//! The provider pushes signed address-activity notifications. Each one is
//! authenticated against the shared signing key, decoded into typed records
//! and re-emitted as one `onchain verification` event per record, labelled
//! with the contract that received the transfer.

mod activity;
mod api;
mod contracts;
mod event;
mod relay;
mod signature;
mod sink;

pub use activity::{ActivityBatch, ActivityNotification, ActivityRecord, BatchMetadata};
pub use api::{router, RelayState};
pub use contracts::{resolve_contract_label, CONTRACT_LABELS, UNKNOWN_CONTRACT, ZERO_ADDRESS};
pub use event::{map_activity, VerificationEvent, VERIFICATION_EVENT_TYPE};
pub use relay::{Relay, RelayReport};
pub use signature::{SignatureVerifier, SIGNATURE_HEADER};
pub use sink::{CaptureClient, DisabledSink, EventSink, SinkError};
