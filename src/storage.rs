//! Storage module for saving and loading story progress
//!
//! Serializes the flat [`SavedState`] record; the round trip is exact.

use crate::state::SavedState;

/// Save state to bytes using JSON serialization
pub fn save(state: &SavedState) -> anyhow::Result<Vec<u8>> {
    let json = serde_json::to_string_pretty(state)?;
    Ok(json.into_bytes())
}

/// Load state from bytes using JSON deserialization
pub fn load(bytes: &[u8]) -> anyhow::Result<SavedState> {
    let json = String::from_utf8(bytes.to_vec())?;
    let state = serde_json::from_str(&json)?;
    Ok(state)
}
