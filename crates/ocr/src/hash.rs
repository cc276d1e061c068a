use sha2::{Digest, Sha256};

/// Compute SHA-256 of an in-memory byte slice.
pub fn sha256_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Encode a raw 32-byte hash as a lowercase hex string (64 chars).
pub fn to_hex(hash: &[u8; 32]) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

/// Hex fingerprint of an uploaded image file, used to spot re-scans.
pub fn image_fingerprint(data: &[u8]) -> String {
    to_hex(&sha256_bytes(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_bytes_known_vector() {
        // SHA-256 of empty bytes is a known constant.
        assert_eq!(
            image_fingerprint(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn fingerprint_is_deterministic() {
        assert_eq!(image_fingerprint(b"card"), image_fingerprint(b"card"));
        assert_ne!(image_fingerprint(b"card"), image_fingerprint(b"other card"));
        assert_eq!(image_fingerprint(b"card").len(), 64);
    }
}
