//! Product image attachments.

use std::path::Path;

use inventory_core::form::IMAGE_EXTENSIONS;
use reqwest::multipart::Part;

use crate::error::ClientError;

/// An image file read into memory, ready to attach to a multipart body.
#[derive(Clone)]
pub struct ImageUpload {
    file_name: String,
    mime: &'static str,
    bytes: Vec<u8>,
}

impl ImageUpload {
    /// Read an image from disk.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Parse` for an unsupported extension and
    /// `ClientError::Io` if the file cannot be read.
    pub async fn from_path(path: &Path) -> Result<Self, ClientError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ClientError::Parse(format!("Invalid image path: {}", path.display())))?
            .to_string();
        let mime = mime_for(path).ok_or_else(|| {
            ClientError::Parse(format!(
                "Unsupported image type {file_name}, expected one of: .{}",
                IMAGE_EXTENSIONS.join(", .")
            ))
        })?;
        let bytes = tokio::fs::read(path).await?;

        Ok(Self {
            file_name,
            mime,
            bytes,
        })
    }

    /// Build from bytes already in memory.
    #[must_use]
    pub fn from_bytes(file_name: impl Into<String>, mime: &'static str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime,
            bytes,
        }
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub const fn mime(&self) -> &'static str {
        self.mime
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn into_part(self) -> Result<Part, ClientError> {
        Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(self.mime)
            .map_err(ClientError::Http)
    }
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "img" => Some("application/octet-stream"),
        _ => None,
    }
}
