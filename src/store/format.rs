//! Binary codec for the on-disk vector index file.
//!
//! Layout: a fixed header (magic, format version, dimensionality, vector
//! count) followed by `count * dim` little-endian `f32` values in insertion
//! order. The metadata lives in a separate JSON file; this file only ever
//! holds raw vectors.

use super::StoreError;

const MAGIC: [u8; 4] = *b"CRVS";
const VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

/// Serialize the flat vector buffer into index-file bytes.
pub fn encode(dim: usize, vectors: &[f32]) -> Vec<u8> {
    debug_assert!(dim > 0 && vectors.len() % dim == 0);
    let count = (vectors.len() / dim) as u64;

    let mut bytes = Vec::with_capacity(HEADER_LEN + vectors.len() * 4);
    bytes.extend_from_slice(&MAGIC);
    bytes.extend_from_slice(&VERSION.to_le_bytes());
    bytes.extend_from_slice(&(dim as u32).to_le_bytes());
    bytes.extend_from_slice(&count.to_le_bytes());
    for v in vectors {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Parse index-file bytes back into `(dim, flat vector buffer)`.
pub fn decode(bytes: &[u8]) -> Result<(usize, Vec<f32>), StoreError> {
    if bytes.len() < HEADER_LEN {
        return Err(StoreError::InvalidIndexFile(format!(
            "file too short for header: {} bytes",
            bytes.len()
        )));
    }
    if bytes[0..4] != MAGIC {
        return Err(StoreError::InvalidIndexFile("bad magic".to_string()));
    }

    let version = u32::from_le_bytes(bytes[4..8].try_into().expect("slice length checked"));
    if version != VERSION {
        return Err(StoreError::InvalidIndexFile(format!(
            "unsupported format version {version}"
        )));
    }

    let dim = u32::from_le_bytes(bytes[8..12].try_into().expect("slice length checked")) as usize;
    if dim == 0 {
        return Err(StoreError::InvalidIndexFile(
            "zero dimensionality".to_string(),
        ));
    }
    let count = u64::from_le_bytes(bytes[12..20].try_into().expect("slice length checked")) as usize;

    let payload = &bytes[HEADER_LEN..];
    let expected = count
        .checked_mul(dim)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| StoreError::InvalidIndexFile("vector count overflow".to_string()))?;
    if payload.len() != expected {
        return Err(StoreError::InvalidIndexFile(format!(
            "payload length {} does not match header ({count} x {dim} vectors)",
            payload.len()
        )));
    }

    let mut vectors = Vec::with_capacity(count * dim);
    for chunk in payload.chunks_exact(4) {
        vectors.push(f32::from_le_bytes(
            chunk.try_into().expect("chunks_exact yields 4 bytes"),
        ));
    }
    Ok((dim, vectors))
}
