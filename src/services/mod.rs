//! Metadata codec, image inspection, lifecycle management, hook pipeline
//! and record persistence.

pub mod attachment_store;
pub mod codec;
pub mod inspector;
pub mod meta_service;
pub mod pipeline;
