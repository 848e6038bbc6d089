//! State checksums
//!
//! SHA-256 over the JSON encoding of a session snapshot. Two replays of the
//! same log with the same commands hash equal regardless of playback speed.

use sha2::{Digest, Sha256};

use crate::session::SessionSnapshot;

/// Hex-encoded SHA-256 of the snapshot.
pub fn snapshot_checksum(snapshot: &SessionSnapshot) -> Result<String, serde_json::Error> {
    let encoded = serde_json::to_vec(snapshot)?;
    let mut hasher = Sha256::new();
    hasher.update(&encoded);
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReplayConfig;
    use crate::session::Session;
    use rust_decimal::Decimal;
    use types::numeric::TickSize;

    fn snapshot() -> SessionSnapshot {
        Session::new(TickSize::new(Decimal::ONE).unwrap(), &ReplayConfig::default())
            .snapshot()
            .unwrap()
    }

    #[test]
    fn test_checksum_is_stable_hex() {
        let first = snapshot_checksum(&snapshot()).unwrap();
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(first, snapshot_checksum(&snapshot()).unwrap());
    }

    #[test]
    fn test_checksum_changes_with_state() {
        let mut changed = snapshot();
        changed.timestamp = 1;
        assert_ne!(
            snapshot_checksum(&snapshot()).unwrap(),
            snapshot_checksum(&changed).unwrap()
        );
    }
}
