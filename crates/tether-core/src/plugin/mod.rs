//! Attribute plugin contract of the host framework.
//!
//! The framework calls a plugin once per element carrying `data-<name>`,
//! handing it a [`PluginContext`]. The plugin may return a cleanup that the
//! framework runs when the element goes away.

mod anchor;
mod persist;

pub use anchor::{AnchorPlugin, OFFSET_ATTR, PLACEMENT_ATTR};
pub use persist::PersistPlugin;

use crate::error::PluginError;
use crate::host::LayoutHost;
use crate::persist::SignalStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Cleanup returned from a plugin, run on element removal.
pub type Cleanup = Box<dyn FnOnce()>;

/// Whether `data-<name>:<key>` may, must or must not carry a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyRequirement {
    /// Key optional
    #[default]
    Allowed,
    /// Key required
    Must,
    /// Key forbidden
    Denied,
}

impl KeyRequirement {
    /// Whether `key` satisfies the requirement.
    #[must_use]
    pub const fn accepts(self, key: Option<&str>) -> bool {
        match self {
            Self::Allowed => true,
            Self::Must => key.is_some(),
            Self::Denied => key.is_none(),
        }
    }
}

/// Reactive effect subscription offered by the framework.
pub trait EffectScope {
    /// Run `effect` now and again whenever a signal it read changes.
    fn effect(&self, effect: Rc<dyn Fn()>) -> Cleanup;
}

/// Everything a plugin gets for one element.
pub struct PluginContext<H: LayoutHost> {
    /// Layout access
    pub host: H,
    /// The element carrying the attribute
    pub element: H::Element,
    /// Key suffix (`data-persist:prefs` -> `prefs`)
    pub key: Option<String>,
    /// Raw attribute value
    pub value: String,
    /// Modifiers (`data-persist__session` -> `session`)
    pub modifiers: Vec<String>,
    /// Signal read/write
    pub signals: Rc<dyn SignalStore>,
    /// Effect subscription
    pub effects: Rc<dyn EffectScope>,
}

impl<H: LayoutHost> fmt::Debug for PluginContext<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginContext")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("modifiers", &self.modifiers)
            .finish_non_exhaustive()
    }
}

/// An attribute plugin.
pub trait AttributePlugin<H: LayoutHost> {
    /// Attribute name without the `data-` prefix.
    fn name(&self) -> &'static str;

    /// Key requirement.
    fn key_requirement(&self) -> KeyRequirement {
        KeyRequirement::Allowed
    }

    /// Set the element up. `Ok(None)` means nothing to clean up.
    fn on_load(&self, ctx: PluginContext<H>) -> Result<Option<Cleanup>, PluginError>;
}

/// Run `plugin` for one element, turning every failure into a warning and a
/// no-op.
pub fn run_plugin<H: LayoutHost>(
    plugin: &dyn AttributePlugin<H>,
    ctx: PluginContext<H>,
) -> Option<Cleanup> {
    if !plugin.key_requirement().accepts(ctx.key.as_deref()) {
        log::warn!("{}", PluginError::KeyRequirement { plugin: plugin.name() });
        return None;
    }
    match plugin.on_load(ctx) {
        Ok(cleanup) => cleanup,
        Err(err) => {
            log::warn!("{err}");
            None
        }
    }
}

/// Plugins known by name. Registration is explicit; nothing is discovered.
pub struct PluginRegistry<H: LayoutHost> {
    plugins: BTreeMap<&'static str, Rc<dyn AttributePlugin<H>>>,
}

impl<H: LayoutHost> PluginRegistry<H> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            plugins: BTreeMap::new(),
        }
    }

    /// Register a plugin and get its handle back.
    pub fn register(
        &mut self,
        plugin: Rc<dyn AttributePlugin<H>>,
    ) -> Result<Rc<dyn AttributePlugin<H>>, PluginError> {
        let name = plugin.name();
        if self.plugins.contains_key(name) {
            return Err(PluginError::Duplicate(name.to_string()));
        }
        self.plugins.insert(name, Rc::clone(&plugin));
        Ok(plugin)
    }

    /// Look a plugin up by attribute name.
    pub fn get(&self, name: &str) -> Option<Rc<dyn AttributePlugin<H>>> {
        self.plugins.get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.plugins.keys().copied().collect()
    }

    /// Run the plugin registered as `name`; unknown names are a no-op.
    pub fn apply(&self, name: &str, ctx: PluginContext<H>) -> Option<Cleanup> {
        let plugin = self.get(name)?;
        run_plugin(plugin.as_ref(), ctx)
    }
}

impl<H: LayoutHost> Default for PluginRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: LayoutHost> fmt::Debug for PluginRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ManualEffects, MemorySignals, ScriptedHost};
    use std::cell::Cell;

    struct CountingPlugin {
        name: &'static str,
        requirement: KeyRequirement,
        loads: Rc<Cell<u32>>,
    }

    impl AttributePlugin<ScriptedHost> for CountingPlugin {
        fn name(&self) -> &'static str {
            self.name
        }

        fn key_requirement(&self) -> KeyRequirement {
            self.requirement
        }

        fn on_load(
            &self,
            ctx: PluginContext<ScriptedHost>,
        ) -> Result<Option<Cleanup>, PluginError> {
            self.loads.set(self.loads.get() + 1);
            if ctx.value == "fail" {
                return Err(PluginError::MissingTarget { plugin: self.name });
            }
            Ok(Some(Box::new(|| {})))
        }
    }

    fn counting_plugin(
        name: &'static str,
        requirement: KeyRequirement,
    ) -> (Rc<Cell<u32>>, Rc<dyn AttributePlugin<ScriptedHost>>) {
        let loads = Rc::new(Cell::new(0));
        let plugin = Rc::new(CountingPlugin {
            name,
            requirement,
            loads: Rc::clone(&loads),
        });
        (loads, plugin)
    }

    fn ctx(host: &ScriptedHost, key: Option<&str>, value: &str) -> PluginContext<ScriptedHost> {
        PluginContext {
            host: host.clone(),
            element: 0,
            key: key.map(String::from),
            value: value.to_string(),
            modifiers: Vec::new(),
            signals: Rc::new(MemorySignals::default()),
            effects: Rc::new(ManualEffects::new()),
        }
    }

    #[test]
    fn test_key_requirement() {
        assert!(KeyRequirement::Allowed.accepts(None));
        assert!(KeyRequirement::Allowed.accepts(Some("k")));
        assert!(KeyRequirement::Must.accepts(Some("k")));
        assert!(!KeyRequirement::Must.accepts(None));
        assert!(KeyRequirement::Denied.accepts(None));
        assert!(!KeyRequirement::Denied.accepts(Some("k")));
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut registry = PluginRegistry::new();
        let (_, a) = counting_plugin("anchor", KeyRequirement::Denied);
        let (_, b) = counting_plugin("anchor", KeyRequirement::Denied);
        let handle = registry.register(a).unwrap();
        assert_eq!(handle.name(), "anchor");
        assert_eq!(registry.register(b).err(), Some(PluginError::Duplicate("anchor".to_string())));
        assert_eq!(registry.names(), vec!["anchor"]);
    }

    #[test]
    fn test_apply_runs_plugin() {
        let host = ScriptedHost::new();
        let mut registry = PluginRegistry::new();
        let (loads, plugin) = counting_plugin("persist", KeyRequirement::Allowed);
        registry.register(plugin).unwrap();

        assert!(registry.apply("persist", ctx(&host, Some("k"), "x")).is_some());
        assert!(registry.apply("unknown", ctx(&host, None, "x")).is_none());
        assert_eq!(loads.get(), 1);
    }

    #[test]
    fn test_errors_become_noops() {
        let host = ScriptedHost::new();
        let (loads, plugin) = counting_plugin("anchor", KeyRequirement::Denied);
        assert!(run_plugin(plugin.as_ref(), ctx(&host, None, "fail")).is_none());
        assert_eq!(loads.get(), 1);

        // Key requirement is checked before the plugin runs
        assert!(run_plugin(plugin.as_ref(), ctx(&host, Some("k"), "ok")).is_none());
        assert_eq!(loads.get(), 1);
    }
}
