//! Explicit interception points around an attachment's save, processing and
//! size steps.
//!
//! ## Stages
//! - `before_save` — runs before the host's core save
//! - `after_variant_processing` — runs after the host rendered its variants
//! - `on_size_query` — may answer a size lookup before the host computes it
//!
//! Hooks run in registration order. The first error aborts the step.

use crate::{
    errors::{MetaError, MetaResult},
    models::attachment::AttachmentHost,
    services::{inspector::ImageInspector, meta_service::MetaService},
};

/// Outcome of a size hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeAnswer {
    /// Let the next hook, or finally the host, answer.
    Delegate,
    Resolved(Option<u64>),
}

/// Hooks an extension registers on an attachment pipeline.
pub trait AttachmentHooks<H: AttachmentHost> {
    fn before_save(&self, _host: &mut H) -> MetaResult<()> {
        Ok(())
    }

    fn after_variant_processing(&self, _host: &mut H) -> MetaResult<()> {
        Ok(())
    }

    fn on_size_query(&self, _host: &H, _style: Option<&str>) -> MetaResult<SizeAnswer> {
        Ok(SizeAnswer::Delegate)
    }
}

impl<H: AttachmentHost, I: ImageInspector> AttachmentHooks<H> for MetaService<I> {
    fn before_save(&self, host: &mut H) -> MetaResult<()> {
        if self.config().enabled {
            self.on_delete_without_replacement(host);
        }
        Ok(())
    }

    fn after_variant_processing(&self, host: &mut H) -> MetaResult<()> {
        self.persist_queued(host)
    }

    fn on_size_query(&self, host: &H, style: Option<&str>) -> MetaResult<SizeAnswer> {
        match style {
            Some(style) if self.config().enabled => {
                Ok(SizeAnswer::Resolved(self.size(host, Some(style))?))
            }
            _ => Ok(SizeAnswer::Delegate),
        }
    }
}

/// Ordered set of hooks composed around a host's own steps.
pub struct AttachmentPipeline<H: AttachmentHost> {
    hooks: Vec<Box<dyn AttachmentHooks<H>>>,
}

impl<H: AttachmentHost> Default for AttachmentPipeline<H> {
    fn default() -> Self {
        Self { hooks: Vec::new() }
    }
}

impl<H: AttachmentHost> AttachmentPipeline<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, hooks: impl AttachmentHooks<H> + 'static) -> Self {
        self.hooks.push(Box::new(hooks));
        self
    }

    /// Run `before_save` hooks, then the host's save.
    pub fn save<E, F>(&self, host: &mut H, core_save: F) -> Result<(), E>
    where
        E: From<MetaError>,
        F: FnOnce(&mut H) -> Result<(), E>,
    {
        for hook in &self.hooks {
            hook.before_save(host)?;
        }
        core_save(host)
    }

    /// Run the host's variant processing, then `after_variant_processing`
    /// hooks.
    pub fn post_process<E, F>(&self, host: &mut H, core_process: F) -> Result<(), E>
    where
        E: From<MetaError>,
        F: FnOnce(&mut H) -> Result<(), E>,
    {
        core_process(host)?;
        for hook in &self.hooks {
            hook.after_variant_processing(host)?;
        }
        Ok(())
    }

    /// Size of the attachment, optionally for one style.
    pub fn size(&self, host: &H, style: Option<&str>) -> MetaResult<Option<u64>> {
        for hook in &self.hooks {
            if let SizeAnswer::Resolved(size) = hook.on_size_query(host, style)? {
                return Ok(size);
            }
        }
        Ok(host.host_size())
    }
}
