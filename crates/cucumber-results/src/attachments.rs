//! Hand-off of embedded attachments to external storage.
//!
//! The builder never writes attachment bytes itself. Each embedding is passed
//! to an [`AttachmentStore`], which returns the reference token recorded on
//! the scenario.

use crate::error::AttachmentError;

/// Persists attachment payloads on behalf of the builder.
pub trait AttachmentStore {
    /// Store `data` and return the reference under which it can be found.
    ///
    /// # Errors
    ///
    /// Returns an [`AttachmentError`] when the payload cannot be stored.
    fn store(&mut self, mime_type: &str, data: &[u8]) -> Result<String, AttachmentError>;
}

impl<S: AttachmentStore + ?Sized> AttachmentStore for &mut S {
    fn store(&mut self, mime_type: &str, data: &[u8]) -> Result<String, AttachmentError> {
        (**self).store(mime_type, data)
    }
}

/// A stored payload kept by [`InMemoryAttachments`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredAttachment {
    /// Reference handed back to the builder.
    pub filename: String,
    /// MIME type of the payload.
    pub mime_type: String,
    /// Payload bytes.
    pub data: Vec<u8>,
}

/// Keeps attachments in memory and names them `embed_<n>.<ext>`.
///
/// # Examples
/// ```
/// use cucumber_results::attachments::{AttachmentStore, InMemoryAttachments};
///
/// let mut store = InMemoryAttachments::default();
/// let name = store.store("image/png", &[0x89, 0x50]).unwrap();
/// assert_eq!(name, "embed_1.png");
/// assert_eq!(store.attachments().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryAttachments {
    stored: Vec<StoredAttachment>,
}

impl InMemoryAttachments {
    /// Attachments stored so far, in arrival order.
    #[must_use]
    pub fn attachments(&self) -> &[StoredAttachment] {
        &self.stored
    }

    /// Look up a stored attachment by the reference the store returned.
    #[must_use]
    pub fn get(&self, filename: &str) -> Option<&StoredAttachment> {
        self.stored.iter().find(|item| item.filename == filename)
    }
}

impl AttachmentStore for InMemoryAttachments {
    fn store(&mut self, mime_type: &str, data: &[u8]) -> Result<String, AttachmentError> {
        let filename = format!(
            "embed_{}.{}",
            self.stored.len() + 1,
            extension_for(mime_type)
        );
        self.stored.push(StoredAttachment {
            filename: filename.clone(),
            mime_type: mime_type.to_string(),
            data: data.to_vec(),
        });
        Ok(filename)
    }
}

/// File extension used for a MIME type, `bin` when unknown.
#[must_use]
pub fn extension_for(mime_type: &str) -> &'static str {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/svg+xml" => "svg",
        "text/plain" => "txt",
        "text/html" => "html",
        "text/xml" | "application/xml" => "xml",
        "application/json" => "json",
        "application/pdf" => "pdf",
        "video/mp4" => "mp4",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("image/png", "png")]
    #[case("text/plain; charset=UTF-8", "txt")]
    #[case("IMAGE/JPEG", "jpg")]
    #[case("application/x-unknown", "bin")]
    fn maps_mime_types_to_extensions(#[case] mime: &str, #[case] expected: &str) {
        assert_eq!(extension_for(mime), expected);
    }

    #[test]
    fn numbers_attachments_in_arrival_order() {
        let mut store = InMemoryAttachments::default();
        let first = store.store("text/plain", b"log").ok();
        let second = store.store("image/png", b"png").ok();
        assert_eq!(first.as_deref(), Some("embed_1.txt"));
        assert_eq!(second.as_deref(), Some("embed_2.png"));
        assert_eq!(
            store.get("embed_2.png").map(|item| item.data.as_slice()),
            Some(b"png".as_slice())
        );
    }
}
