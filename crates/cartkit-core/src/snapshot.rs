//! # Snapshot Encoding
//!
//! The byte format of a persisted cart. Storage drivers treat it as an
//! opaque blob; only this module reads or writes it.
//!
//! ## Schema (version 1)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  {                                                                      │
//! │    "version": 1,                     ← bumped on incompatible changes   │
//! │    "cartId": "main",                 ← id the snapshot was taken from   │
//! │    "savedAt": "2026-01-01T12:00:00Z",                                   │
//! │    "state": { ... }                  ← ManagedCart::State, as-is        │
//! │  }                                                                      │
//! │                                                                         │
//! │  Encoding: UTF-8 JSON (serde_json)                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Current snapshot schema version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Versioned wrapper around an exported cart state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEnvelope<T> {
    pub version: u32,
    pub cart_id: String,
    pub saved_at: DateTime<Utc>,
    pub state: T,
}

impl<T> SnapshotEnvelope<T> {
    pub fn new(cart_id: impl Into<String>, state: T) -> Self {
        SnapshotEnvelope {
            version: SNAPSHOT_VERSION,
            cart_id: cart_id.into(),
            saved_at: Utc::now(),
            state,
        }
    }
}

impl<T: Serialize> SnapshotEnvelope<T> {
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(CoreError::Snapshot)
    }
}

impl<T: DeserializeOwned> SnapshotEnvelope<T> {
    /// Decodes a blob, rejecting versions other than [`SNAPSHOT_VERSION`].
    ///
    /// The version is read before the state so that a future schema fails
    /// with `SnapshotVersion` rather than a shape error.
    pub fn decode(bytes: &[u8]) -> CoreResult<Self> {
        #[derive(Deserialize)]
        struct VersionHeader {
            version: u32,
        }

        let header: VersionHeader = serde_json::from_slice(bytes).map_err(CoreError::Snapshot)?;
        if header.version != SNAPSHOT_VERSION {
            return Err(CoreError::SnapshotVersion {
                found: header.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        serde_json::from_slice(bytes).map_err(CoreError::Snapshot)
    }
}

/// Encodes `state` for `cart_id` in one step.
pub fn encode_state<T: Serialize>(cart_id: &str, state: T) -> CoreResult<Vec<u8>> {
    SnapshotEnvelope::new(cart_id, state).encode()
}

/// Decodes a blob and returns only the state.
pub fn decode_state<T: DeserializeOwned>(bytes: &[u8]) -> CoreResult<T> {
    SnapshotEnvelope::decode(bytes).map(|envelope| envelope.state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{Cart, CartContents, ManagedCart};
    use crate::config::CartConfig;
    use crate::money::Money;

    #[test]
    fn test_cart_state_survives_encoding() {
        let mut cart = Cart::create("main", &CartConfig::default());
        cart.add_item("COKE-330", "Coca-Cola 330ml", Money::from_cents(199), 2)
            .unwrap();
        let state = cart.export();

        let bytes = encode_state("main", &state).unwrap();
        let decoded: CartContents = decode_state(&bytes).unwrap();
        assert_eq!(decoded, state);
    }

    #[test]
    fn test_envelope_fields() {
        let bytes = encode_state("wishlist", vec![1u8, 2, 3]).unwrap();
        let envelope: SnapshotEnvelope<Vec<u8>> = SnapshotEnvelope::decode(&bytes).unwrap();

        assert_eq!(envelope.version, SNAPSHOT_VERSION);
        assert_eq!(envelope.cart_id, "wishlist");
        assert_eq!(envelope.state, vec![1, 2, 3]);

        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(json.get("savedAt").is_some());
    }

    #[test]
    fn test_rejects_other_versions() {
        let bytes =
            br#"{"version":2,"cartId":"main","savedAt":"2026-01-01T00:00:00Z","state":null}"#;
        let err = decode_state::<CartContents>(bytes).unwrap_err();
        assert!(matches!(
            err,
            CoreError::SnapshotVersion {
                found: 2,
                expected: 1
            }
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        let err = decode_state::<CartContents>(b"not json").unwrap_err();
        assert!(matches!(err, CoreError::Snapshot(_)));
    }
}
