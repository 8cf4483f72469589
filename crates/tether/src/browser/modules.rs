//! Named modules registered by dynamically loaded scripts.
//!
//! A loaded script announces itself with `registerModule(name, module)`.
//! Whoever is waiting on that name gets the module; nothing is looked up on
//! the global object.

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Why a module did not arrive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoaderError {
    /// There is no document to add a script to
    #[error("no document available")]
    NoDocument,
    /// The script failed to load
    #[error("failed to load script `{0}`")]
    ScriptFailed(String),
    /// The script loaded but never registered the module
    #[error("script `{url}` did not register module `{name}`")]
    NotRegistered {
        /// Script URL
        url: String,
        /// Expected module name
        name: String,
    },
}

/// Callback receiving a module or the reason it did not arrive.
pub type Waiter<M> = Box<dyn FnOnce(Result<M, LoaderError>)>;

/// Registered modules plus callers waiting for ones not registered yet.
pub struct ModuleTable<M: Clone> {
    modules: HashMap<String, M>,
    waiters: HashMap<String, Vec<Waiter<M>>>,
}

impl<M: Clone + 'static> ModuleTable<M> {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
            waiters: HashMap::new(),
        }
    }

    /// Store `module` under `name`, replacing any earlier one.
    ///
    /// Returns the waiters to notify. They are handed back rather than
    /// called so the caller can release its borrow of the table first.
    #[must_use]
    pub fn register(&mut self, name: &str, module: M) -> Vec<Box<dyn FnOnce()>> {
        if self.modules.insert(name.to_string(), module.clone()).is_some() {
            log::debug!("module `{name}` registered again, replacing");
        }
        self.waiters
            .remove(name)
            .unwrap_or_default()
            .into_iter()
            .map(|waiter| {
                let module = module.clone();
                Box::new(move || waiter(Ok(module))) as Box<dyn FnOnce()>
            })
            .collect()
    }

    /// Registered module, if any.
    pub fn get(&self, name: &str) -> Option<M> {
        self.modules.get(name).cloned()
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Queue `waiter` until `name` is registered. Returns `false` when it is
    /// already registered and the waiter was not queued.
    pub fn wait(&mut self, name: &str, waiter: Waiter<M>) -> bool {
        if self.modules.contains_key(name) {
            return false;
        }
        self.waiters.entry(name.to_string()).or_default().push(waiter);
        true
    }

    /// Fail everyone waiting on `name`. Returns the notifications to run.
    #[must_use]
    pub fn fail(&mut self, name: &str, error: &LoaderError) -> Vec<Box<dyn FnOnce()>> {
        self.waiters
            .remove(name)
            .unwrap_or_default()
            .into_iter()
            .map(|waiter| {
                let error = error.clone();
                Box::new(move || waiter(Err(error))) as Box<dyn FnOnce()>
            })
            .collect()
    }

    /// Number of callers waiting on `name`.
    pub fn waiting(&self, name: &str) -> usize {
        self.waiters.get(name).map_or(0, Vec::len)
    }
}

impl<M: Clone + 'static> Default for ModuleTable<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Clone + 'static> fmt::Debug for ModuleTable<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.modules.keys().collect();
        names.sort();
        f.debug_struct("ModuleTable")
            .field("modules", &names)
            .field("waiting", &self.waiters.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<Result<u32, LoaderError>>>>, impl Fn() -> Waiter<u32>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        (seen, move || {
            let s = Rc::clone(&s);
            Box::new(move |r: Result<u32, LoaderError>| s.borrow_mut().push(r)) as Waiter<u32>
        })
    }

    #[test]
    fn test_waiters_resolve_on_register() {
        let mut table = ModuleTable::new();
        let (seen, waiter) = recorder();
        assert!(table.wait("charts", waiter()));
        assert!(table.wait("charts", waiter()));
        assert_eq!(table.waiting("charts"), 2);

        for notify in table.register("charts", 7) {
            notify();
        }
        assert_eq!(*seen.borrow(), vec![Ok(7), Ok(7)]);
        assert_eq!(table.waiting("charts"), 0);
        assert_eq!(table.get("charts"), Some(7));
    }

    #[test]
    fn test_wait_on_registered_module_is_not_queued() {
        let mut table = ModuleTable::new();
        let _ = table.register("charts", 1);
        let (seen, waiter) = recorder();
        assert!(!table.wait("charts", waiter()));
        assert!(seen.borrow().is_empty());
        assert!(table.contains("charts"));
    }

    #[test]
    fn test_fail_rejects_waiters() {
        let mut table = ModuleTable::new();
        let (seen, waiter) = recorder();
        table.wait("maps", waiter());
        let err = LoaderError::ScriptFailed("/maps.js".to_string());
        for notify in table.fail("maps", &err) {
            notify();
        }
        assert_eq!(*seen.borrow(), vec![Err(err)]);
        assert_eq!(table.get("maps"), None);
    }

    #[test]
    fn test_reregister_replaces() {
        let mut table = ModuleTable::new();
        let _ = table.register("a", 1);
        let _ = table.register("a", 2);
        assert_eq!(table.get("a"), Some(2));
    }

    #[test]
    fn test_error_display() {
        let err = LoaderError::NotRegistered {
            url: "/x.js".to_string(),
            name: "x".to_string(),
        };
        assert_eq!(err.to_string(), "script `/x.js` did not register module `x`");
    }

    #[cfg(not(target_arch = "wasm32"))]
    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn every_waiter_settles_once(waiters in 0usize..8, fail in any::<bool>()) {
                let mut table = ModuleTable::new();
                let (seen, waiter) = recorder();
                for _ in 0..waiters {
                    prop_assert!(table.wait("m", waiter()));
                }
                let notifications = if fail {
                    table.fail("m", &LoaderError::NoDocument)
                } else {
                    table.register("m", 3)
                };
                for notify in notifications {
                    notify();
                }
                prop_assert_eq!(seen.borrow().len(), waiters);
                prop_assert_eq!(table.waiting("m"), 0);
                prop_assert!(seen.borrow().iter().all(|r| r.is_ok() != fail));
            }
        }
    }
}
