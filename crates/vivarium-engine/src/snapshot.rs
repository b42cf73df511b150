//! Read-only world snapshots with content hashing.
//!
//! A [`WorldSnapshot`] is the externally visible state of the simulation at
//! the end of a frame: world extents, per-entity objects keyed by stable
//! IDs, and a [`RenderHint`] that lets a mode-agnostic renderer dispatch
//! without knowing the mode.
//!
//! [`WorldSnapshot::state_hash`] digests the canonical JSON serialization
//! with BLAKE3. Two engines with the same seed and pack must produce equal
//! hashes frame by frame — the determinism regression tests compare exactly
//! this.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RenderHint
// ---------------------------------------------------------------------------

/// Frontend-agnostic rendering metadata. Always present in snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderHint {
    /// Camera style, e.g. `"side"` or `"topdown"`.
    pub style: String,
    /// Entity sprite family, e.g. `"fish"` or `"microbe"`.
    pub entity_style: String,
    /// Mode-specific extras.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RenderHint {
    pub fn new(style: &str, entity_style: &str) -> Self {
        Self {
            style: style.to_owned(),
            entity_style: entity_style.to_owned(),
            extra: serde_json::Map::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// WorldSnapshot
// ---------------------------------------------------------------------------

/// Serializable world state for rendering and regression testing.
///
/// Per-entity objects always carry `id` (the IdentityProvider stable ID),
/// `type`, `x`, `y`, `width`, `height`; modes merge in their own fields via
/// `Entity::snapshot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub frame: u64,
    pub paused: bool,
    pub width: f64,
    pub height: f64,
    pub world_type: String,
    pub render_hint: RenderHint,
    pub entities: Vec<serde_json::Value>,
    /// Mode metadata from the world pack.
    pub metadata: serde_json::Value,
}

impl WorldSnapshot {
    /// BLAKE3 hex digest of the canonical JSON serialization.
    ///
    /// `serde_json` maps are ordered, so serialization of equal snapshots is
    /// byte-identical and the digest is a faithful state fingerprint.
    pub fn state_hash(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&bytes).to_hex().to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(frame: u64) -> WorldSnapshot {
        WorldSnapshot {
            frame,
            paused: false,
            width: 100.0,
            height: 80.0,
            world_type: "tank".to_owned(),
            render_hint: RenderHint::new("side", "fish"),
            entities: vec![json!({"id": "42", "type": "fish", "x": 1.0, "y": 2.0})],
            metadata: json!({}),
        }
    }

    #[test]
    fn equal_snapshots_hash_equal() {
        assert_eq!(snapshot(7).state_hash(), snapshot(7).state_hash());
    }

    #[test]
    fn different_snapshots_hash_different() {
        assert_ne!(snapshot(7).state_hash(), snapshot(8).state_hash());
    }

    #[test]
    fn hash_is_hex_digest() {
        let hash = snapshot(1).state_hash();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn snapshot_roundtrips_through_json() {
        let snap = snapshot(3);
        let json = serde_json::to_string(&snap).unwrap();
        let back: WorldSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
        assert_eq!(back.state_hash(), snap.state_hash());
    }
}
