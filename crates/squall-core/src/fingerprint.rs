//! Message fingerprints — BLAKE3 digest of the raw bytes, used only as a
//! dedup identity. Never decoded, never stored as content.

pub type Fingerprint = [u8; 32];

pub fn fingerprint(raw: &[u8]) -> Fingerprint {
    *blake3::hash(raw).as_bytes()
}
