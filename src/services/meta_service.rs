//! MetaService — per-variant metadata lifecycle for one attachment type.
//!
//! Metadata is derived from the variants of a processing batch, merged with
//! what the record already stores, and written back through the codec as a
//! single column. Reads decode that column on demand.
//!
//! Merging keeps the metadata of styles that were not part of the batch, so
//! reprocessing only the thumbnail does not lose the dimensions of the
//! original. Styles that are no longer declared on the attachment are
//! pruned when the stored set is merged.

use crate::{
    config::MetaConfig,
    errors::{ExtractionError, MetaResult},
    models::{
        attachment::AttachmentHost,
        metadata::{MetaField, MetadataSet, ORIGINAL_STYLE, VariantMetadata},
        variant_file::VariantFile,
    },
    services::{
        codec::{self, DecodeError},
        inspector::{ImageInspector, ImagesizeInspector, InspectError},
    },
};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Lifecycle manager for attachment metadata.
#[derive(Clone, Debug)]
pub struct MetaService<I = ImagesizeInspector> {
    config: MetaConfig,
    inspector: I,
}

impl MetaService<ImagesizeInspector> {
    /// Service reading image headers with the default inspector.
    pub fn new(config: MetaConfig) -> Self {
        Self::with_inspector(config, ImagesizeInspector)
    }
}

impl<I: ImageInspector> MetaService<I> {
    pub fn with_inspector(config: MetaConfig, inspector: I) -> Self {
        Self { config, inspector }
    }

    pub fn config(&self) -> &MetaConfig {
        &self.config
    }

    /// Derive metadata for every variant in a batch.
    ///
    /// A variant the inspector does not recognize as an image gets an empty
    /// record. Any other inspection failure aborts the whole batch.
    pub fn extract<F: VariantFile>(
        &self,
        files: &BTreeMap<String, F>,
    ) -> Result<MetadataSet, ExtractionError> {
        let mut meta = MetadataSet::new();
        for (style, file) in files {
            let record = match self.inspector.inspect(file) {
                Ok(dims) => {
                    let byte_size = file
                        .byte_size()
                        .map_err(|err| ExtractionError::new(style, InspectError::Io(err)))?;
                    debug!(
                        "{}/{}: {}x{} ({} bytes)",
                        self.config.attachment, style, dims.width, dims.height, byte_size
                    );
                    VariantMetadata::new(dims.width, dims.height, byte_size)
                }
                Err(InspectError::NotAnImage) => {
                    debug!(
                        "{}/{} is not an image, storing empty metadata",
                        self.config.attachment, style
                    );
                    VariantMetadata::empty()
                }
                Err(err) => return Err(ExtractionError::new(style, err)),
            };
            meta.insert(style.clone(), record);
        }
        Ok(meta)
    }

    /// Merge a batch with the previously stored column.
    ///
    /// With nothing stored the batch is returned as is. Otherwise every
    /// declared style, plus `original`, that has no non-empty record in the
    /// batch takes its stored record, or the empty record if none is stored.
    pub fn merge(
        previous: Option<&str>,
        mut batch: MetadataSet,
        declared_styles: &[String],
    ) -> Result<MetadataSet, DecodeError> {
        let Some(previous) = previous else {
            return Ok(batch);
        };
        let previous = codec::decode(previous)?;

        let mut retained = 0usize;
        let styles =
            std::iter::once(ORIGINAL_STYLE).chain(declared_styles.iter().map(String::as_str));
        for style in styles {
            if batch.has_data_for(style) {
                continue;
            }
            let record = previous.get(style).copied().unwrap_or_default();
            batch.insert(style, record);
            retained += 1;
        }
        debug!("retained stored metadata for {} styles", retained);

        Ok(batch)
    }

    /// Merge a batch into the host's metadata column and write it back.
    ///
    /// An empty batch leaves the column untouched.
    pub fn merge_and_persist<H: AttachmentHost>(
        &self,
        host: &mut H,
        batch: MetadataSet,
    ) -> MetaResult<()> {
        if batch.is_empty() {
            debug!("{}: no variants processed, metadata unchanged", host.name());
            return Ok(());
        }

        let merged = match Self::merge(host.read_meta(), batch, host.style_names()) {
            Ok(merged) => merged,
            Err(err) => {
                warn!("{}: stored metadata is corrupt: {}", host.name(), err);
                return Err(err.into());
            }
        };
        host.write_meta(codec::encode(&merged));
        Ok(())
    }

    /// Extract metadata for the host's queued variants and persist it.
    ///
    /// Does nothing when tracking is disabled for this attachment type.
    pub fn persist_queued<H: AttachmentHost>(&self, host: &mut H) -> MetaResult<()> {
        if !self.config.enabled {
            return Ok(());
        }
        let batch = self.extract(host.queued_for_write())?;
        self.merge_and_persist(host, batch)
    }

    /// Reset the column to the empty set when content is deleted and nothing
    /// replaces it. Returns whether the column was reset.
    pub fn on_delete_without_replacement<H: AttachmentHost>(&self, host: &mut H) -> bool {
        if !host.has_queued_deletions() || !host.queued_for_write().is_empty() {
            return false;
        }
        info!("{}: content deleted, clearing metadata", host.name());
        host.write_meta(codec::encoded_empty());
        true
    }

    /// Decoded metadata set, or `None` if the column was never written.
    pub fn read_all<H: AttachmentHost>(
        &self,
        host: &H,
    ) -> Result<Option<MetadataSet>, DecodeError> {
        if !self.config.enabled {
            return Ok(None);
        }
        host.read_meta().map(codec::decode).transpose()
    }

    /// Stored value of one field for one style.
    pub fn read_field<H: AttachmentHost>(
        &self,
        host: &H,
        style: &str,
        field: MetaField,
    ) -> Result<Option<u64>, DecodeError> {
        Ok(self
            .read_all(host)?
            .and_then(|meta| meta.get(style).and_then(|record| record.get(field))))
    }

    /// Pixel width of `style`, or of the host's default style.
    pub fn width<H: AttachmentHost>(
        &self,
        host: &H,
        style: Option<&str>,
    ) -> Result<Option<u64>, DecodeError> {
        let style = style.unwrap_or_else(|| host.default_style());
        self.read_field(host, style, MetaField::Width)
    }

    /// Pixel height of `style`, or of the host's default style.
    pub fn height<H: AttachmentHost>(
        &self,
        host: &H,
        style: Option<&str>,
    ) -> Result<Option<u64>, DecodeError> {
        let style = style.unwrap_or_else(|| host.default_style());
        self.read_field(host, style, MetaField::Height)
    }

    /// Dimensions as `"{width}x{height}"`. A missing component renders as
    /// `null`, so an unknown size reads `nullxnull`.
    pub fn image_size<H: AttachmentHost>(
        &self,
        host: &H,
        style: Option<&str>,
    ) -> Result<String, DecodeError> {
        let width = self.width(host, style)?;
        let height = self.height(host, style)?;
        Ok(format!("{}x{}", render(width), render(height)))
    }

    /// Byte size of `style`. Without a style the host computes the size.
    pub fn size<H: AttachmentHost>(
        &self,
        host: &H,
        style: Option<&str>,
    ) -> Result<Option<u64>, DecodeError> {
        match style {
            Some(style) => self.read_field(host, style, MetaField::ByteSize),
            None => Ok(host.host_size()),
        }
    }
}

fn render(value: Option<u64>) -> String {
    value.map_or_else(|| "null".to_string(), |v| v.to_string())
}
