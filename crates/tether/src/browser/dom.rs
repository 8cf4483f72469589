//! [`LayoutHost`] over the live DOM.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use tether_core::host::Handler;
use tether_core::{ElementKey, LayoutHost, ListenerId, Point, Rect, Size, Trigger};
use thiserror::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    AddEventListenerOptions, Document, Element, EventTarget, HtmlElement, MutationObserver,
    MutationObserverInit, Window,
};

/// Attribute holding an element's [`ElementKey`].
pub const KEY_ATTRIBUTE: &str = "data-tether-key";

// Shared by every host so keys stay unique per page
static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

/// Why a [`DomHost`] could not be created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// Not running in a window
    #[error("no window")]
    NoWindow,
    /// The window has no document
    #[error("no document")]
    NoDocument,
}

enum Subscription {
    Event {
        target: EventTarget,
        kind: &'static str,
        capture: bool,
        callback: Closure<dyn FnMut()>,
    },
    Observer {
        observer: MutationObserver,
        _callback: Closure<dyn FnMut()>,
    },
}

impl Subscription {
    fn remove(self) {
        match self {
            Self::Event {
                target,
                kind,
                capture,
                callback,
            } => {
                let _ = target.remove_event_listener_with_callback_and_bool(
                    kind,
                    callback.as_ref().unchecked_ref(),
                    capture,
                );
            }
            Self::Observer { observer, .. } => observer.disconnect(),
        }
    }
}

#[derive(Default)]
struct Subscriptions {
    next: Cell<u64>,
    live: RefCell<HashMap<u64, Subscription>>,
}

/// The browser document. Clones share listener bookkeeping.
#[derive(Clone)]
pub struct DomHost {
    window: Window,
    document: Document,
    subscriptions: Rc<Subscriptions>,
}

impl DomHost {
    /// Host for the current window.
    pub fn new() -> Result<Self, DomError> {
        let window = web_sys::window().ok_or(DomError::NoWindow)?;
        let document = window.document().ok_or(DomError::NoDocument)?;
        Ok(Self {
            window,
            document,
            subscriptions: Rc::new(Subscriptions::default()),
        })
    }

    /// The window.
    pub const fn window(&self) -> &Window {
        &self.window
    }

    /// Number of live subscriptions.
    pub fn listener_count(&self) -> usize {
        self.subscriptions.live.borrow().len()
    }

    fn computed_font_size(&self, element: &Element) -> Option<f64> {
        let style = self.window.get_computed_style(element).ok()??;
        let value = style.get_property_value("font-size").ok()?;
        value.trim().trim_end_matches("px").parse().ok()
    }

    fn add(&self, subscription: Subscription) -> ListenerId {
        let id = self.subscriptions.next.get();
        self.subscriptions.next.set(id + 1);
        self.subscriptions.live.borrow_mut().insert(id, subscription);
        ListenerId(id)
    }

    fn listen_event(
        &self,
        target: EventTarget,
        kind: &'static str,
        capture: bool,
        handler: Handler,
    ) -> ListenerId {
        let callback = Closure::<dyn FnMut()>::new(move || handler());
        let options = AddEventListenerOptions::new();
        options.set_capture(capture);
        options.set_passive(true);
        if let Err(err) = target.add_event_listener_with_callback_and_add_event_listener_options(
            kind,
            callback.as_ref().unchecked_ref(),
            &options,
        ) {
            log::warn!("could not listen for {kind}: {err:?}");
        }
        self.add(Subscription::Event {
            target,
            kind,
            capture,
            callback,
        })
    }

    fn observe(&self, element: &HtmlElement, handler: Handler) -> ListenerId {
        let callback = Closure::<dyn FnMut()>::new(move || handler());
        let observer = match MutationObserver::new(callback.as_ref().unchecked_ref()) {
            Ok(observer) => observer,
            Err(err) => {
                log::warn!("could not create mutation observer: {err:?}");
                return ListenerId(u64::MAX);
            }
        };
        // Attributes are left out: the positioner writes inline styles on
        // this very element and would re-trigger itself.
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        init.set_character_data(true);
        if let Err(err) = observer.observe_with_options(element, &init) {
            log::warn!("could not observe element: {err:?}");
        }
        self.add(Subscription::Observer {
            observer,
            _callback: callback,
        })
    }
}

impl fmt::Debug for DomHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomHost")
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}

impl LayoutHost for DomHost {
    type Element = HtmlElement;

    fn query(&self, selector: &str) -> Option<HtmlElement> {
        match self.document.query_selector(selector) {
            Ok(found) => found?.dyn_into::<HtmlElement>().ok(),
            Err(_) => {
                log::warn!("invalid selector `{selector}`");
                None
            }
        }
    }

    fn element_key(&self, element: &HtmlElement) -> ElementKey {
        if let Some(key) = element
            .get_attribute(KEY_ATTRIBUTE)
            .and_then(|raw| raw.parse().ok())
        {
            return ElementKey(key);
        }
        let key = NEXT_KEY.fetch_add(1, Ordering::Relaxed);
        if let Err(err) = element.set_attribute(KEY_ATTRIBUTE, &key.to_string()) {
            // The next call mints a fresh key, so anything stored under this one is orphaned
            log::warn!("could not record element key {key}: {err:?}");
        }
        ElementKey(key)
    }

    fn bounding_rect(&self, element: &HtmlElement) -> Rect {
        let r = element.get_bounding_client_rect();
        Rect::new(r.left(), r.top(), r.width(), r.height())
    }

    fn font_size(&self, element: &HtmlElement) -> f64 {
        self.computed_font_size(element)
            .unwrap_or_else(|| self.root_font_size())
    }

    fn root_font_size(&self) -> f64 {
        self.document
            .document_element()
            .and_then(|root| self.computed_font_size(&root))
            .unwrap_or(16.0)
    }

    fn viewport(&self) -> Size {
        match self.document.document_element() {
            Some(root) => Size::new(
                f64::from(root.client_width()),
                f64::from(root.client_height()),
            ),
            None => Size::new(
                self.window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0),
                self.window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0),
            ),
        }
    }

    fn scroll_offset(&self) -> Point {
        Point::new(
            self.window.scroll_x().unwrap_or(0.0),
            self.window.scroll_y().unwrap_or(0.0),
        )
    }

    fn supports(&self, declaration: &str) -> bool {
        web_sys::css::supports_with_condition_text(declaration).unwrap_or(false)
    }

    fn element_id(&self, element: &HtmlElement) -> Option<String> {
        Some(element.id()).filter(|id| !id.is_empty())
    }

    fn set_element_id(&self, element: &HtmlElement, id: &str) {
        element.set_id(id);
    }

    fn attribute(&self, element: &HtmlElement, name: &str) -> Option<String> {
        element.get_attribute(name)
    }

    fn set_attribute(&self, element: &HtmlElement, name: &str, value: &str) {
        if let Err(err) = element.set_attribute(name, value) {
            log::debug!("could not set {name}: {err:?}");
        }
    }

    fn set_style(&self, element: &HtmlElement, property: &str, value: &str) {
        if let Err(err) = element.style().set_property(property, value) {
            log::debug!("could not set style {property}: {err:?}");
        }
    }

    fn remove_style(&self, element: &HtmlElement, property: &str) {
        let _ = element.style().remove_property(property);
    }

    fn listen(&self, trigger: Trigger<HtmlElement>, handler: Handler) -> ListenerId {
        match trigger {
            // Capturing, so scrolls of nested containers arrive too
            Trigger::Scroll => {
                self.listen_event(self.document.clone().into(), "scroll", true, handler)
            }
            Trigger::Resize => {
                self.listen_event(self.window.clone().into(), "resize", false, handler)
            }
            Trigger::Mutation(element) => self.observe(&element, handler),
        }
    }

    fn unlisten(&self, id: ListenerId) {
        let removed = self.subscriptions.live.borrow_mut().remove(&id.0);
        if let Some(subscription) = removed {
            subscription.remove();
        }
    }
}
