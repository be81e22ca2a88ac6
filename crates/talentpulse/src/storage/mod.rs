//! Filesystem persistence: uploaded documents and evaluation artifacts.

pub mod results;
pub mod uploads;

pub use results::{ResultEntry, ResultPreview, ResultStore};
pub use uploads::{sha256_hex, UploadStore};
