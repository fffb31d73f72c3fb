//! Core data models for attachment metadata tracking.
//!
//! These types describe the per-variant metadata records, the host
//! attachment they belong to, and the file handles of freshly rendered
//! variants.

pub mod attachment;
pub mod metadata;
pub mod record;
pub mod variant_file;
