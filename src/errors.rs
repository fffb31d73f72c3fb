use crate::services::{codec::DecodeError, inspector::InspectError};
use thiserror::Error;

/// Inspection of one variant failed for a reason other than the file not
/// being an image. Aborts the processing batch.
#[derive(Debug, Error)]
#[error("failed to extract metadata for style `{style}`: {source}")]
pub struct ExtractionError {
    pub style: String,
    #[source]
    pub source: InspectError,
}

impl ExtractionError {
    pub fn new(style: impl Into<String>, source: InspectError) -> Self {
        Self {
            style: style.into(),
            source,
        }
    }
}

/// Errors surfaced to the host's processing and save pipeline.
#[derive(Debug, Error)]
pub enum MetaError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

pub type MetaResult<T> = Result<T, MetaError>;
