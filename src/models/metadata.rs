//! Per-variant metadata records and the set keyed by style name.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, btree_map};

/// Style name of the unmodified upload. Always tracked, even when it is not
/// one of the declared styles.
pub const ORIGINAL_STYLE: &str = "original";

/// Dimensions and byte size of one rendered variant.
///
/// Every field is optional: a variant whose dimensions could not be
/// determined (a PDF, an archive) is stored as the empty record, which is a
/// different state from the variant having no record at all.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct VariantMetadata {
    /// Pixel width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u64>,

    /// Pixel height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,

    /// Length of the variant file in bytes.
    #[serde(default, rename = "size", skip_serializing_if = "Option::is_none")]
    pub byte_size: Option<u64>,
}

impl VariantMetadata {
    /// Record for a variant that was inspected successfully.
    pub fn new(width: u64, height: u64, byte_size: u64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            byte_size: Some(byte_size),
        }
    }

    /// Record for a variant that is not an image.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.width.is_none() && self.height.is_none() && self.byte_size.is_none()
    }

    /// Project out a single field.
    pub fn get(&self, field: MetaField) -> Option<u64> {
        match field {
            MetaField::Width => self.width,
            MetaField::Height => self.height,
            MetaField::ByteSize => self.byte_size,
        }
    }
}

/// Field selector for read-side lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetaField {
    Width,
    Height,
    ByteSize,
}

/// Metadata for every known variant of one attachment.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct MetadataSet(BTreeMap<String, VariantMetadata>);

impl MetadataSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for `style`, returning the previous one.
    pub fn insert(
        &mut self,
        style: impl Into<String>,
        meta: VariantMetadata,
    ) -> Option<VariantMetadata> {
        self.0.insert(style.into(), meta)
    }

    pub fn get(&self, style: &str) -> Option<&VariantMetadata> {
        self.0.get(style)
    }

    pub fn contains(&self, style: &str) -> bool {
        self.0.contains_key(style)
    }

    /// True when `style` has a record carrying at least one field.
    pub fn has_data_for(&self, style: &str) -> bool {
        self.0.get(style).is_some_and(|meta| !meta.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<S: Into<String>> FromIterator<(S, VariantMetadata)> for MetadataSet {
    fn from_iter<T: IntoIterator<Item = (S, VariantMetadata)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl IntoIterator for MetadataSet {
    type Item = (String, VariantMetadata);
    type IntoIter = btree_map::IntoIter<String, VariantMetadata>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
