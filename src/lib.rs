//! Per-variant metadata (width, height, byte size) for file attachments.
//!
//! Metadata is computed once when a variant is rendered, merged with what
//! the attachment already stores, and kept in a single encoded column next
//! to the attachment record. See [`services::meta_service::MetaService`].

pub mod config;
pub mod errors;
pub mod models;
pub mod services;

pub use config::MetaConfig;
pub use errors::{ExtractionError, MetaError, MetaResult};
pub use models::{
    attachment::{Attachment, AttachmentHost},
    metadata::{MetaField, MetadataSet, ORIGINAL_STYLE, VariantMetadata},
    variant_file::{DiskFile, MemoryFile, VariantFile},
};
pub use services::{
    codec::{DecodeError, decode, encode},
    inspector::{Dimensions, ImageInspector, ImagesizeInspector, InspectError},
    meta_service::MetaService,
    pipeline::{AttachmentHooks, AttachmentPipeline, SizeAnswer},
};
