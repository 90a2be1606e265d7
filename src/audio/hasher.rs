use sha2::{Digest, Sha256};

/// SHA-256 content digests used for library-wide deduplication.
pub struct ContentHasher;

impl ContentHasher {
    /// Lowercase hex digest of `bytes`.
    pub fn hash(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }

    /// Hashes on the blocking pool so large files don't stall the runtime.
    pub async fn hash_owned(bytes: Vec<u8>) -> String {
        match tokio::task::spawn_blocking(move || Self::hash(&bytes)).await {
            Ok(digest) => digest,
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
}
