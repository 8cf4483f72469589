//! `data-anchor`: position the element against a reference element.

use super::{AttributePlugin, Cleanup, KeyRequirement, PluginContext};
use crate::config::AnchorConfig;
use crate::error::PluginError;
use crate::host::LayoutHost;
use crate::positioner::{self, Mode};
use crate::registry::AttachmentRegistry;
use crate::resolve::{parse_spec_with, AnchorAttributes};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Separate placement attribute.
pub const PLACEMENT_ATTR: &str = "data-anchor-placement";
/// Separate offset attribute.
pub const OFFSET_ATTR: &str = "data-anchor-offset";

/// The anchor plugin. Clones share one attachment registry.
pub struct AnchorPlugin<H: LayoutHost> {
    config: AnchorConfig,
    registry: Rc<RefCell<AttachmentRegistry<H>>>,
}

impl<H: LayoutHost> AnchorPlugin<H> {
    /// Plugin using `config`.
    pub fn new(config: AnchorConfig) -> Self {
        Self {
            config,
            registry: Rc::new(RefCell::new(AttachmentRegistry::new())),
        }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &AnchorConfig {
        &self.config
    }

    /// Mode of the attachment for `element`, if it is attached.
    pub fn mode_of(&self, host: &H, element: &H::Element) -> Option<Mode> {
        self.registry.borrow().mode(host.element_key(element))
    }

    /// Number of attached elements.
    pub fn attached(&self) -> usize {
        self.registry.borrow().len()
    }
}

impl<H: LayoutHost> Clone for AnchorPlugin<H> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            registry: Rc::clone(&self.registry),
        }
    }
}

impl<H: LayoutHost> fmt::Debug for AnchorPlugin<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnchorPlugin")
            .field("config", &self.config)
            .field("registry", &self.registry.borrow())
            .finish()
    }
}

impl<H> AttributePlugin<H> for AnchorPlugin<H>
where
    H: LayoutHost + Clone + 'static,
    H::Element: 'static,
{
    fn name(&self) -> &'static str {
        "anchor"
    }

    fn key_requirement(&self) -> KeyRequirement {
        KeyRequirement::Denied
    }

    fn on_load(&self, ctx: PluginContext<H>) -> Result<Option<Cleanup>, PluginError> {
        let PluginContext {
            host, element, value, ..
        } = ctx;
        let attrs = AnchorAttributes {
            placement: host.attribute(&element, PLACEMENT_ATTR),
            offset: host.attribute(&element, OFFSET_ATTR),
        };
        let spec = parse_spec_with(&value, &attrs, &self.config)
            .ok_or(PluginError::MissingTarget { plugin: "anchor" })?;
        let target = host.query(&spec.target).ok_or_else(|| PluginError::TargetNotFound {
            plugin: "anchor",
            selector: spec.target.clone(),
        })?;

        let attachment = positioner::attach(&host, &element, &target, &spec, &self.config);
        log::debug!(
            "anchored to `{}` at {} ({:?})",
            spec.target,
            spec.placement,
            attachment.mode()
        );
        let key = host.element_key(&element);
        let generation = self.registry.borrow_mut().insert(key, attachment);

        let registry = Rc::clone(&self.registry);
        Ok(Some(Box::new(move || {
            registry.borrow_mut().remove(key, generation);
        })))
    }
}
