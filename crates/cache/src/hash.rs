use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of the UTF-8 bytes of `text`.
pub fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Cache key for a drift check: `sha256(context):sha256(current_doc):model_id`.
///
/// Both inputs are hashed separately, so `("ab", "c")` and `("a", "bc")` never share a key.
pub fn cache_key(context: &str, current_doc: &str, model_id: &str) -> String {
    format!(
        "{}:{}:{model_id}",
        sha256_hex(context),
        sha256_hex(current_doc)
    )
}
