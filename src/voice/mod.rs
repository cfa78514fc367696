//! Voice support
//!
//! Speech capture, recognition and synthesis belong to the hosting framework.
//! This module only keeps synthesized audio on disk so repeated phrases are
//! not synthesized twice.

mod cache;

pub use cache::{AudioCache, AudioKey, INDEX_FILE_NAME};
