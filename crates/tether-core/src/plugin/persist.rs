//! `data-persist`: save signals to web storage and restore them on load.

use super::{AttributePlugin, Cleanup, PluginContext};
use crate::config::PersistConfig;
use crate::error::PluginError;
use crate::host::LayoutHost;
use crate::persist::{encode, restore, KeyValueStore, PersistSpec, SignalStore, StorageType};
use crate::timing::{Debounce, Scheduler};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// The persist plugin.
#[derive(Clone)]
pub struct PersistPlugin {
    config: PersistConfig,
    local: Rc<dyn KeyValueStore>,
    session: Rc<dyn KeyValueStore>,
    scheduler: Rc<dyn Scheduler>,
}

impl PersistPlugin {
    /// Plugin writing through `local` and `session`, debounced on `scheduler`.
    pub fn new(
        config: PersistConfig,
        local: Rc<dyn KeyValueStore>,
        session: Rc<dyn KeyValueStore>,
        scheduler: Rc<dyn Scheduler>,
    ) -> Self {
        Self {
            config,
            local,
            session,
            scheduler,
        }
    }

    fn store(&self, storage: StorageType) -> Rc<dyn KeyValueStore> {
        match storage {
            StorageType::Local => Rc::clone(&self.local),
            StorageType::Session => Rc::clone(&self.session),
        }
    }
}

impl fmt::Debug for PersistPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistPlugin")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn writer(
    spec: PersistSpec,
    store: Rc<dyn KeyValueStore>,
    signals: Rc<dyn SignalStore>,
) -> Rc<dyn Fn()> {
    let last = RefCell::new(store.get(&spec.key));
    Rc::new(move || {
        let json = match encode(&spec, signals.as_ref()) {
            Ok(json) => json,
            Err(err) => {
                log::warn!("not persisting `{}`: {err}", spec.key);
                return;
            }
        };
        if last.borrow().as_deref() == Some(json.as_str()) {
            return;
        }
        match store.set(&spec.key, &json) {
            Ok(()) => *last.borrow_mut() = Some(json),
            Err(err) => log::warn!("not persisting `{}`: {err}", spec.key),
        }
    })
}

impl<H: LayoutHost> AttributePlugin<H> for PersistPlugin {
    fn name(&self) -> &'static str {
        "persist"
    }

    fn on_load(&self, ctx: PluginContext<H>) -> Result<Option<Cleanup>, PluginError> {
        let spec = PersistSpec::parse(ctx.key.as_deref(), &ctx.value, &ctx.modifiers, &self.config);
        let store = self.store(spec.storage);
        if restore(store.as_ref(), &spec, ctx.signals.as_ref()) {
            log::debug!("restored signals from `{}`", spec.key);
        }

        let write = writer(spec, store, Rc::clone(&ctx.signals));
        let debounce = Rc::new(Debounce::new(
            Rc::clone(&self.scheduler),
            self.config.debounce_ms,
            write,
        ));
        let signals = ctx.signals;
        let pending = Rc::clone(&debounce);
        // The snapshot is what subscribes the effect to every signal
        let stop = ctx.effects.effect(Rc::new(move || {
            let _ = signals.snapshot();
            pending.call();
        }));

        Ok(Some(Box::new(move || {
            stop();
            debounce.flush();
        })))
    }
}
