//! Pure helpers for naming and typing stored images.
//!
//! Neither helper performs I/O:
//!
//! - [`generate_object_key`] turns a client-supplied file name into a unique
//!   storage key of the form `<uuid-v4>_<file-name>`.
//! - [`resolve_content_type`] maps a key's extension to a MIME type.

mod content_type;
mod naming;

pub use content_type::{resolve_content_type, DEFAULT_CONTENT_TYPE};
pub use naming::{generate_object_key, KEY_SEPARATOR};
