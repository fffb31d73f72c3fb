use serde::Deserialize;

/// Metadata tracking configuration for one attachment type.
///
/// Resolved once when the attachment type is declared. `enabled` is the
/// capability flag: an attachment type whose record has no metadata column
/// is configured with tracking off and every hook becomes a no-op.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MetaConfig {
    /// Attachment name on the owning record (e.g. `avatar`).
    pub attachment: String,

    /// Whether the record stores metadata for this attachment.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl MetaConfig {
    /// Tracking enabled for the named attachment.
    pub fn for_attachment(attachment: impl Into<String>) -> Self {
        Self {
            attachment: attachment.into(),
            enabled: default_enabled(),
        }
    }

    pub fn with_tracking(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Conventional name of the record column holding the encoded metadata.
    pub fn meta_column(&self) -> String {
        format!("{}_meta", self.attachment)
    }
}
