// Stored bytes carry a schema version byte in front of the bincode body so the
// on-disk format can evolve without guessing at old layouts.
use crate::error::{LedgerError, Result};

/// Current layout of every stored value.
pub const SCHEMA_VERSION: u8 = 1;

/// Upper bound on the bytes a single decoded record may claim.
pub const MAX_RECORD_BYTES: usize = 1 << 25;

/// Canonical bincode 2.0 encoding, used for content hashes
pub fn encode_canonical<T: bincode::Encode>(data: &T) -> Result<Vec<u8>> {
    let config = bincode::config::standard();
    bincode::encode_to_vec(data, config)
        .map_err(|e| LedgerError::Serialization(format!("Serialization failed: {e}")))
}

/// Versioned encoding used for everything written to disk
pub fn serialize<T: bincode::Encode>(data: &T) -> Result<Vec<u8>> {
    let body = encode_canonical(data)?;
    let mut bytes = Vec::with_capacity(body.len() + 1);
    bytes.push(SCHEMA_VERSION);
    bytes.extend(body);
    Ok(bytes)
}

pub fn deserialize<T>(bytes: &[u8]) -> Result<T>
where
    T: bincode::Decode<()>,
{
    let (version, body) = bytes
        .split_first()
        .ok_or_else(|| LedgerError::Serialization("Empty record".to_string()))?;
    if *version != SCHEMA_VERSION {
        return Err(LedgerError::Serialization(format!(
            "Unsupported schema version {version}"
        )));
    }

    // Container lengths are checked against the limit before allocating
    let config = bincode::config::standard().with_limit::<MAX_RECORD_BYTES>();
    let (data, read) = bincode::decode_from_slice(body, config)
        .map_err(|e| LedgerError::Serialization(format!("Deserialization failed: {e}")))?;
    if read != body.len() {
        return Err(LedgerError::Serialization(format!(
            "Trailing bytes after record: {}",
            body.len() - read
        )));
    }
    Ok(data)
}
