//! In-memory stand-ins for the browser, used by unit tests, integration
//! tests and benches.
//!
//! [`ScriptedHost`] does no layout of its own: rects are whatever the test
//! says they are, and triggers fire only when the test calls
//! [`ScriptedHost::fire`].

use crate::geometry::{Point, Rect, Size};
use crate::host::{ElementKey, Handler, LayoutHost, ListenerId, Trigger};
use crate::persist::{merge_json, KeyValueStore, SignalStore, StorageError};
use crate::plugin::{Cleanup, EffectScope};
use crate::timing::{Scheduler, TimerId};
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone)]
struct ScriptedElement {
    selector: String,
    id: Option<String>,
    rect: Rect,
    font_size: f64,
    styles: BTreeMap<String, String>,
    attributes: BTreeMap<String, String>,
}

#[derive(Default)]
struct HostState {
    elements: BTreeMap<u64, ScriptedElement>,
    next_element: u64,
    viewport: Size,
    scroll: Point,
    native: bool,
    listeners: BTreeMap<u64, (Trigger<u64>, Handler)>,
    next_listener: u64,
    rect_reads: usize,
}

/// A fake document. Clones share state.
#[derive(Clone, Default)]
pub struct ScriptedHost {
    state: Rc<RefCell<HostState>>,
}

impl ScriptedHost {
    /// Empty document with a zero viewport and no native anchor support.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element. A `#id` selector also sets the element's id.
    pub fn add_element(&self, selector: &str, rect: Rect) -> u64 {
        let mut state = self.state.borrow_mut();
        let key = state.next_element;
        state.next_element += 1;
        state.elements.insert(
            key,
            ScriptedElement {
                selector: selector.to_string(),
                id: selector.strip_prefix('#').map(String::from),
                rect,
                font_size: 16.0,
                styles: BTreeMap::new(),
                attributes: BTreeMap::new(),
            },
        );
        key
    }

    fn with_element<R>(
        &self,
        element: u64,
        f: impl FnOnce(&mut ScriptedElement) -> R,
    ) -> Option<R> {
        self.state.borrow_mut().elements.get_mut(&element).map(f)
    }

    /// Move or resize an element.
    pub fn set_rect(&self, element: u64, rect: Rect) {
        self.with_element(element, |e| e.rect = rect);
    }

    /// Set an element's computed font size.
    pub fn set_font_size(&self, element: u64, px: f64) {
        self.with_element(element, |e| e.font_size = px);
    }

    /// Drop an element's id.
    pub fn clear_id(&self, element: u64) {
        self.with_element(element, |e| e.id = None);
    }

    /// Set the viewport size.
    pub fn set_viewport(&self, viewport: Size) {
        self.state.borrow_mut().viewport = viewport;
    }

    /// Set the document scroll offset.
    pub fn set_scroll(&self, scroll: Point) {
        self.state.borrow_mut().scroll = scroll;
    }

    /// Whether `supports` answers yes for anchor declarations.
    pub fn set_native_support(&self, native: bool) {
        self.state.borrow_mut().native = native;
    }

    /// Inline style value.
    pub fn style(&self, element: u64, property: &str) -> Option<String> {
        self.state
            .borrow()
            .elements
            .get(&element)
            .and_then(|e| e.styles.get(property).cloned())
    }

    /// Attribute value.
    pub fn attr(&self, element: u64, name: &str) -> Option<String> {
        self.state
            .borrow()
            .elements
            .get(&element)
            .and_then(|e| e.attributes.get(name).cloned())
    }

    /// Number of live listeners.
    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    /// How many times a bounding rect was read.
    pub fn rect_reads(&self) -> usize {
        self.state.borrow().rect_reads
    }

    /// Run every listener subscribed to `trigger`.
    pub fn fire(&self, trigger: &Trigger<u64>) {
        let handlers: Vec<Handler> = self
            .state
            .borrow()
            .listeners
            .values()
            .filter(|(t, _)| t == trigger)
            .map(|(_, h)| Rc::clone(h))
            .collect();
        for handler in handlers {
            handler();
        }
    }
}

impl fmt::Debug for ScriptedHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ScriptedHost")
            .field("elements", &state.elements)
            .field("viewport", &state.viewport)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

impl LayoutHost for ScriptedHost {
    type Element = u64;

    fn query(&self, selector: &str) -> Option<u64> {
        let state = self.state.borrow();
        let by_id = selector.strip_prefix('#');
        state
            .elements
            .iter()
            .find(|(_, e)| e.selector == selector || (by_id.is_some() && e.id.as_deref() == by_id))
            .map(|(key, _)| *key)
    }

    fn element_key(&self, element: &u64) -> ElementKey {
        ElementKey(*element)
    }

    fn bounding_rect(&self, element: &u64) -> Rect {
        let mut state = self.state.borrow_mut();
        state.rect_reads += 1;
        state.elements.get(element).map_or(Rect::default(), |e| e.rect)
    }

    fn font_size(&self, element: &u64) -> f64 {
        self.state
            .borrow()
            .elements
            .get(element)
            .map_or(16.0, |e| e.font_size)
    }

    fn root_font_size(&self) -> f64 {
        16.0
    }

    fn viewport(&self) -> Size {
        self.state.borrow().viewport
    }

    fn scroll_offset(&self) -> Point {
        self.state.borrow().scroll
    }

    fn supports(&self, declaration: &str) -> bool {
        !declaration.contains("anchor") || self.state.borrow().native
    }

    fn element_id(&self, element: &u64) -> Option<String> {
        self.state
            .borrow()
            .elements
            .get(element)
            .and_then(|e| e.id.clone())
            .filter(|id| !id.is_empty())
    }

    fn set_element_id(&self, element: &u64, id: &str) {
        self.with_element(*element, |e| e.id = Some(id.to_string()));
    }

    fn attribute(&self, element: &u64, name: &str) -> Option<String> {
        self.attr(*element, name)
    }

    fn set_attribute(&self, element: &u64, name: &str, value: &str) {
        self.with_element(*element, |e| {
            e.attributes.insert(name.to_string(), value.to_string());
        });
    }

    fn set_style(&self, element: &u64, property: &str, value: &str) {
        self.with_element(*element, |e| {
            e.styles.insert(property.to_string(), value.to_string());
        });
    }

    fn remove_style(&self, element: &u64, property: &str) {
        self.with_element(*element, |e| {
            e.styles.remove(property);
        });
    }

    fn listen(&self, trigger: Trigger<u64>, handler: Handler) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = state.next_listener;
        state.next_listener += 1;
        state.listeners.insert(id, (trigger, handler));
        ListenerId(id)
    }

    fn unlisten(&self, id: ListenerId) {
        self.state.borrow_mut().listeners.remove(&id.0);
    }
}

struct ManualTask {
    id: TimerId,
    due: f64,
    task: Box<dyn FnOnce()>,
}

/// A clock that only moves when told to.
#[derive(Default)]
pub struct ManualScheduler {
    now: Cell<f64>,
    next_id: Cell<u64>,
    tasks: RefCell<Vec<ManualTask>>,
}

impl ManualScheduler {
    /// Clock at zero with nothing scheduled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward, running due tasks in due order. Tasks
    /// scheduled while advancing run too if they fall inside the window.
    pub fn advance(&self, ms: f64) {
        let until = self.now.get() + ms;
        loop {
            let next = {
                let mut tasks = self.tasks.borrow_mut();
                let earliest = tasks
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= until)
                    .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.id.0.cmp(&b.id.0)))
                    .map(|(i, _)| i);
                earliest.map(|i| tasks.remove(i))
            };
            let Some(task) = next else { break };
            self.now.set(task.due);
            (task.task)();
        }
        self.now.set(until);
    }

    /// Number of scheduled tasks.
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("now", &self.now.get())
            .field("pending", &self.pending())
            .finish()
    }
}

impl Scheduler for ManualScheduler {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }

    fn set_timeout(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> TimerId {
        let id = TimerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.tasks.borrow_mut().push(ManualTask {
            id,
            due: self.now.get() + f64::from(delay_ms),
            task,
        });
        id
    }

    fn clear_timeout(&self, id: TimerId) {
        self.tasks.borrow_mut().retain(|t| t.id != id);
    }
}

/// `localStorage` in a map. Writes can be made to fail.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RefCell<HashMap<String, String>>,
    writes: Cell<usize>,
    full: Cell<bool>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    /// Make every following write fail with [`StorageError::QuotaExceeded`].
    pub fn set_full(&self, full: bool) {
        self.full.set(full);
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.full.get() {
            return Err(StorageError::QuotaExceeded);
        }
        self.data.borrow_mut().insert(key.to_string(), value.to_string());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

/// A signal tree held as JSON.
#[derive(Debug)]
pub struct MemorySignals {
    value: RefCell<Value>,
}

impl MemorySignals {
    /// Signals starting at `value`.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self {
            value: RefCell::new(value),
        }
    }

    /// Replace one top-level signal.
    pub fn set(&self, name: &str, value: Value) {
        let mut patch = Map::new();
        patch.insert(name.to_string(), value);
        self.merge(Value::Object(patch));
    }
}

impl Default for MemorySignals {
    fn default() -> Self {
        Self::new(Value::Object(Map::new()))
    }
}

impl SignalStore for MemorySignals {
    fn snapshot(&self) -> Value {
        self.value.borrow().clone()
    }

    fn merge(&self, patch: Value) {
        merge_json(&mut self.value.borrow_mut(), patch);
    }
}

/// Effects that rerun only when [`ManualEffects::trigger`] is called.
#[derive(Default)]
pub struct ManualEffects {
    effects: Rc<RefCell<BTreeMap<u64, Rc<dyn Fn()>>>>,
    next: Cell<u64>,
}

impl ManualEffects {
    /// No effects registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rerun every live effect.
    pub fn trigger(&self) {
        let effects: Vec<_> = self.effects.borrow().values().cloned().collect();
        for effect in effects {
            effect();
        }
    }

    /// Number of live effects.
    pub fn len(&self) -> usize {
        self.effects.borrow().len()
    }

    /// Whether no effect is live.
    pub fn is_empty(&self) -> bool {
        self.effects.borrow().is_empty()
    }
}

impl fmt::Debug for ManualEffects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualEffects")
            .field("live", &self.len())
            .finish()
    }
}

impl EffectScope for ManualEffects {
    fn effect(&self, effect: Rc<dyn Fn()>) -> Cleanup {
        let id = self.next.get();
        self.next.set(id + 1);
        self.effects.borrow_mut().insert(id, Rc::clone(&effect));
        effect();
        let effects = Rc::clone(&self.effects);
        Box::new(move || {
            effects.borrow_mut().remove(&id);
        })
    }
}
