//! Blob key generation.

use std::fmt;
use std::path::Path;

use rand::Rng;

/// Longest extension (without the dot) carried over from an uploaded file name.
const MAX_EXTENSION_LEN: usize = 16;

/// Upper bound (exclusive) for the random key suffix.
const RANDOM_SUFFIX_BOUND: u32 = 1_000_000_000;

/// A generated storage key of the form `<unix-millis>-<random><ext>`.
///
/// The extension of the original file name is preserved so that consumers can
/// infer the content type from the key alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobKey(String);

impl BlobKey {
    /// Generate a key for `original_name` using the current time and a random suffix.
    pub fn generate(original_name: &str) -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let suffix = rand::rng().random_range(0..RANDOM_SUFFIX_BOUND);
        Self::from_parts(millis, suffix, original_name)
    }

    pub(crate) fn from_parts(millis: i64, suffix: u32, original_name: &str) -> Self {
        Self(format!("{}-{}{}", millis, suffix, extension(original_name)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The `.ext` part of a file name, or an empty string if it has none or it is unsafe
/// to embed in a key.
fn extension(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_preserves_extension() {
        let key = BlobKey::from_parts(1_700_000_000_000, 42, "Moby Dick.epub");
        assert_eq!(key.as_str(), "1700000000000-42.epub");
    }

    #[test]
    fn test_key_without_extension() {
        let key = BlobKey::from_parts(1, 2, "README");
        assert_eq!(key.as_str(), "1-2");
    }

    #[test]
    fn test_key_drops_unsafe_extension() {
        assert_eq!(BlobKey::from_parts(1, 2, "evil.p df").as_str(), "1-2");
        assert_eq!(
            BlobKey::from_parts(1, 2, "x.aaaaaaaaaaaaaaaaaaaaaaaa").as_str(),
            "1-2"
        );
    }

    #[test]
    fn test_key_ignores_directories_in_name() {
        let key = BlobKey::from_parts(5, 6, "../../etc/cover.PNG");
        assert_eq!(key.as_str(), "5-6.PNG");
    }

    #[test]
    fn test_generated_keys_differ() {
        let a = BlobKey::generate("a.pdf");
        let b = BlobKey::generate("a.pdf");
        assert!(a.as_str().ends_with(".pdf"));
        // same millisecond is likely, the random suffix keeps them apart
        assert_ne!(a, b);
    }
}
