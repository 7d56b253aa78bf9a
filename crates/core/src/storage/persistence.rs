//! Disk persistence for store snapshots.
//!
//! A snapshot file is the JSON-encoded [`StoreSnapshot`] followed by an
//! 8-byte footer: the magic `VSC1` and a big-endian CRC32 of the payload.
//! Writes use atomic temp-file + rename. Files without the footer (plain JSON
//! written by another host) are accepted with a warning.

use crate::error::{Result, VectorStoreError};
use crate::storage::snapshot::StoreSnapshot;
use crate::storage::store::VectorStore;
use std::fs;
use std::path::Path;

/// Magic bytes written before the CRC32 footer.
const SNAPSHOT_CRC_MAGIC: &[u8; 4] = b"VSC1";

/// Serialize a snapshot to bytes: `[json payload][magic "VSC1"][u32 CRC32 BE]`.
///
/// The snapshot is validated first, so nothing is produced that
/// [`decode_snapshot`] would refuse.
pub fn encode_snapshot(snapshot: &StoreSnapshot) -> Result<Vec<u8>> {
    snapshot.validate()?;
    let payload = serde_json::to_vec(snapshot)?;
    let crc = crc32fast::hash(&payload);

    let mut output = Vec::with_capacity(payload.len() + 8);
    output.extend_from_slice(&payload);
    output.extend_from_slice(SNAPSHOT_CRC_MAGIC);
    output.extend_from_slice(&crc.to_be_bytes());
    Ok(output)
}

/// Parse snapshot bytes, verifying the CRC32 footer if present.
pub fn decode_snapshot(raw: &[u8]) -> Result<StoreSnapshot> {
    let payload = if raw.len() >= 8 && &raw[raw.len() - 8..raw.len() - 4] == SNAPSHOT_CRC_MAGIC {
        let payload = &raw[..raw.len() - 8];
        let stored_crc = u32::from_be_bytes([
            raw[raw.len() - 4],
            raw[raw.len() - 3],
            raw[raw.len() - 2],
            raw[raw.len() - 1],
        ]);
        let computed_crc = crc32fast::hash(payload);
        if computed_crc != stored_crc {
            return Err(VectorStoreError::InvalidSnapshot(format!(
                "CRC32 mismatch: expected {:#010x}, got {:#010x}",
                stored_crc, computed_crc
            )));
        }
        tracing::debug!("snapshot CRC32 verified: {:#010x}", stored_crc);
        payload
    } else {
        tracing::warn!("snapshot has no CRC32 footer; loading unchecked");
        raw
    };

    let snapshot: StoreSnapshot = serde_json::from_slice(payload)?;
    snapshot.validate()?;
    Ok(snapshot)
}

/// Write a store snapshot to `path` atomically.
pub fn save_store(store: &VectorStore, path: &Path) -> Result<()> {
    let bytes = encode_snapshot(&store.export())?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    fs::write(tmp_path, &bytes)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp_path, fs::Permissions::from_mode(0o600))?;
    }
    fs::rename(tmp_path, path)?;

    tracing::info!(
        "saved store snapshot to {:?} ({} vectors, {} bytes)",
        path,
        store.len(),
        bytes.len()
    );
    Ok(())
}

/// Load a store from a snapshot file written by [`save_store`] (or plain JSON).
pub fn load_store(path: &Path) -> Result<VectorStore> {
    let raw = fs::read(path)?;
    let store = VectorStore::from_snapshot(decode_snapshot(&raw)?)?;
    tracing::info!("loaded store snapshot from {:?} ({} vectors)", path, store.len());
    Ok(store)
}
