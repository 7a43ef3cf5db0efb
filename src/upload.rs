//! File uploads for the photo and resume fields.
//!
//! Encoding bytes into a text value (for example a data URL) is delegated to
//! a [`FileEncoder`]; this module fixes the size policy around it.

use crate::error::{Result, SyncError};

/// Largest accepted upload: 2 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

/// A file selected for upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Reject uploads over `max_bytes` before doing any encoding work.
pub fn check_size(upload: &Upload, max_bytes: usize) -> Result<()> {
    if upload.size() > max_bytes {
        return Err(SyncError::SizeExceeded {
            size: upload.size(),
            limit: max_bytes,
        });
    }
    Ok(())
}

/// Turns an uploaded file into the opaque string stored in the profile.
pub trait FileEncoder {
    /// Fails with [`SyncError::SizeExceeded`] when the file is over `max_bytes`.
    fn encode(&self, upload: &Upload, max_bytes: usize) -> Result<String>;
}
