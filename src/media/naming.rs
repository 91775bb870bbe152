//! Storage key generation for uploaded images.

use uuid::Uuid;

/// Separator between the uuid prefix and the original file name.
pub const KEY_SEPARATOR: char = '_';

/// Generate a unique object key for an uploaded file.
///
/// The key is `<uuid-v4>_<original_name>`. The original name is embedded
/// as-is: path separators, dots and control characters are not stripped.
pub fn generate_object_key(original_name: &str) -> String {
    format!("{}{}{}", Uuid::new_v4(), KEY_SEPARATOR, original_name)
}
