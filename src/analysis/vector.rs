//! Little-endian `f32` blob codec for vectors stored in SQLite.

/// Encode a vector as a little-endian `f32` blob.
pub fn encode_f32_le_blob(values: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len().saturating_mul(4));
    for &v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

/// Decode a little-endian `f32` blob (as stored in SQLite) into a `Vec<f32>`.
pub fn decode_f32_le_blob(blob: &[u8]) -> Result<Vec<f32>, String> {
    if blob.len() % 4 != 0 {
        return Err("Embedding blob length is not a multiple of 4 bytes".to_string());
    }
    Ok(blob
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_is_four_bytes_per_value_little_endian() {
        let blob = encode_f32_le_blob(&[1.0, -0.5]);
        assert_eq!(blob.len(), 8);
        assert_eq!(&blob[..4], &1.0_f32.to_le_bytes());
        assert_eq!(decode_f32_le_blob(&blob).unwrap(), vec![1.0, -0.5]);
    }

    #[test]
    fn decode_rejects_truncated_blob() {
        assert!(decode_f32_le_blob(&[0, 0, 128]).is_err());
        assert!(decode_f32_le_blob(&[]).unwrap().is_empty());
    }
}
