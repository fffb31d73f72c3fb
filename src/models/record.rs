//! Represents the persisted row of an attachment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Identifies one attachment on one owning record.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttachmentKey {
    /// Type of the owning record (e.g. "user").
    pub record_type: String,

    /// ID of the owning record.
    pub record_id: Uuid,

    /// Attachment name on the owning record (e.g. "avatar").
    pub name: String,
}

impl AttachmentKey {
    pub fn new(record_type: impl Into<String>, record_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            record_id,
            name: name.into(),
        }
    }
}

/// A stored attachment row.
///
/// The row holds the encoded metadata column only, never file content.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct AttachmentRecord {
    /// Internal UUID for DB indexing.
    pub id: Uuid,

    pub record_type: String,

    pub record_id: Uuid,

    pub name: String,

    /// Encoded metadata set, or NULL when nothing was ever written.
    pub meta: Option<String>,

    /// Timestamp of the last metadata write.
    pub updated_at: DateTime<Utc>,
}

impl AttachmentRecord {
    pub fn key(&self) -> AttachmentKey {
        AttachmentKey::new(self.record_type.clone(), self.record_id, self.name.clone())
    }
}
