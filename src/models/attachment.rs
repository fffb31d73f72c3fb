//! The host side of an attachment: what metadata tracking needs to see, plus
//! an in-memory attachment that implements it.

use super::{metadata::ORIGINAL_STYLE, variant_file::VariantFile};
use std::collections::BTreeMap;

/// Interface an attachment exposes to metadata tracking.
///
/// `read_meta`/`write_meta` access the single scalar field holding the
/// encoded metadata. `None` means the field was never written.
pub trait AttachmentHost {
    type File: VariantFile;

    /// Attachment name on the owning record (e.g. `avatar`).
    fn name(&self) -> &str;

    /// Declared style names, not including `original`.
    fn style_names(&self) -> &[String];

    /// Style used by readers when the caller does not name one.
    fn default_style(&self) -> &str {
        ORIGINAL_STYLE
    }

    fn read_meta(&self) -> Option<&str>;

    fn write_meta(&mut self, encoded: String);

    fn has_queued_deletions(&self) -> bool;

    /// Variants produced by the current processing batch, keyed by style.
    fn queued_for_write(&self) -> &BTreeMap<String, Self::File>;

    /// Size of the attachment as the host itself computes it.
    fn host_size(&self) -> Option<u64>;
}

/// In-memory attachment with write/delete queues.
///
/// Files queued for write are flushed by the owner's save step; this type
/// only tracks what is pending.
#[derive(Clone, Debug)]
pub struct Attachment<F> {
    name: String,
    styles: Vec<String>,
    default_style: String,
    meta: Option<String>,
    file_size: Option<u64>,
    queued_for_write: BTreeMap<String, F>,
    queued_for_delete: Vec<String>,
}

impl<F: VariantFile> Attachment<F> {
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        styles: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            styles: styles.into_iter().map(Into::into).collect(),
            default_style: ORIGINAL_STYLE.to_string(),
            meta: None,
            file_size: None,
            queued_for_write: BTreeMap::new(),
            queued_for_delete: Vec::new(),
        }
    }

    pub fn with_default_style(mut self, style: impl Into<String>) -> Self {
        self.default_style = style.into();
        self
    }

    /// Seed the metadata field, e.g. from a loaded database row.
    pub fn with_meta(mut self, meta: Option<String>) -> Self {
        self.meta = meta;
        self
    }

    pub fn meta(&self) -> Option<&str> {
        self.meta.as_deref()
    }

    pub fn set_file_size(&mut self, size: Option<u64>) {
        self.file_size = size;
    }

    /// Queue a rendered variant for writing.
    pub fn queue_write(&mut self, style: impl Into<String>, file: F) {
        self.queued_for_write.insert(style.into(), file);
    }

    /// Queue a stored file path for deletion.
    pub fn queue_delete(&mut self, path: impl Into<String>) {
        self.queued_for_delete.push(path.into());
    }

    /// Queue every stored variant for deletion and drop pending writes.
    pub fn clear(&mut self) {
        let paths: Vec<String> = std::iter::once(ORIGINAL_STYLE)
            .chain(self.styles.iter().map(String::as_str))
            .map(|style| format!("{}/{}", self.name, style))
            .collect();
        self.queued_for_delete.extend(paths);
        self.queued_for_write.clear();
        self.file_size = None;
    }

    pub fn queued_for_delete(&self) -> &[String] {
        &self.queued_for_delete
    }

    /// Drain both queues once the owner has written and deleted the files.
    pub fn flush_queues(&mut self) -> (BTreeMap<String, F>, Vec<String>) {
        (
            std::mem::take(&mut self.queued_for_write),
            std::mem::take(&mut self.queued_for_delete),
        )
    }
}

impl<F: VariantFile> AttachmentHost for Attachment<F> {
    type File = F;

    fn name(&self) -> &str {
        &self.name
    }

    fn style_names(&self) -> &[String] {
        &self.styles
    }

    fn default_style(&self) -> &str {
        &self.default_style
    }

    fn read_meta(&self) -> Option<&str> {
        self.meta.as_deref()
    }

    fn write_meta(&mut self, encoded: String) {
        self.meta = Some(encoded);
    }

    fn has_queued_deletions(&self) -> bool {
        !self.queued_for_delete.is_empty()
    }

    fn queued_for_write(&self) -> &BTreeMap<String, F> {
        &self.queued_for_write
    }

    fn host_size(&self) -> Option<u64> {
        self.file_size
    }
}
