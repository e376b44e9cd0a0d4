//! Storage key helpers
//!
//! Uploaded filenames are normalized before use as storage keys so that
//! repeated uploads of OS-duplicated files ("photo (1).jpg") collapse to a
//! single logical identity. Derived keys (backup, resized) are always
//! computed from the normalized base filename.

use once_cell::sync::Lazy;
use regex::Regex;

/// Extensions accepted by the resize pipeline, matched case-insensitively.
const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// Prefix under which resized outputs are stored in the result bucket.
const RESIZED_PREFIX: &str = "resized/";

static DUPLICATE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\(\d+\)").expect("valid duplicate-marker pattern"));

/// Strip any path prefix from a key, leaving the base filename.
pub fn base_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Normalize an uploaded filename into its canonical storage key.
///
/// Strips the path and removes duplicate markers such as " (1)" that
/// operating systems append to repeated downloads.
pub fn normalize_filename(filename: &str) -> String {
    DUPLICATE_MARKER
        .replace_all(base_name(filename), "")
        .to_string()
}

/// Key of the resized output derived from a source key.
pub fn resized_key(src_key: &str) -> String {
    format!("{}{}", RESIZED_PREFIX, base_name(src_key))
}

/// Whether a key denotes an image object the workers should process.
///
/// Directory markers (trailing separator) and keys with extensions other
/// than jpg/jpeg/png are skipped.
pub fn is_image_key(key: &str) -> bool {
    if key.ends_with('/') {
        return false;
    }
    let lower = key.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}
