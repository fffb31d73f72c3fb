//! Encoding of a `MetadataSet` into the single text column stored with the
//! attachment.
//!
//! The stored form is standard base64 over a versioned JSON envelope:
//!
//! ```text
//! {"version":1,"styles":{"thumb":{"width":50,"height":60,"size":900},"doc":{}}}
//! ```
//!
//! Decoding is strict. Anything that is not the output of [`encode`] is
//! rejected with a [`DecodeError`] instead of being read as an empty set.

use crate::models::metadata::MetadataSet;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Envelope version written by [`encode`].
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("metadata is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("metadata envelope is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("metadata envelope version {0} is not supported")]
    UnsupportedVersion(u32),
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    styles: &'a MetadataSet,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Envelope {
    version: u32,
    styles: MetadataSet,
}

/// Encode a metadata set for storage.
pub fn encode(meta: &MetadataSet) -> String {
    let envelope = EnvelopeRef {
        version: FORMAT_VERSION,
        styles: meta,
    };
    // String keys and integer fields only; serialization cannot fail.
    let json = serde_json::to_vec(&envelope).expect("metadata envelope serializes to JSON");
    STANDARD.encode(json)
}

/// The stored form of a set with no variants.
pub fn encoded_empty() -> String {
    encode(&MetadataSet::new())
}

/// Decode a stored metadata column.
pub fn decode(encoded: &str) -> Result<MetadataSet, DecodeError> {
    let json = STANDARD.decode(encoded)?;
    let envelope: Envelope = serde_json::from_slice(&json)?;
    if envelope.version != FORMAT_VERSION {
        return Err(DecodeError::UnsupportedVersion(envelope.version));
    }
    Ok(envelope.styles)
}
