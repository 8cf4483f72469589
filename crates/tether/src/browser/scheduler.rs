//! [`Scheduler`] over `setTimeout` and `performance.now`.

use tether_core::{Scheduler, TimerId};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Window;

/// The window's timer queue.
#[derive(Debug, Clone)]
pub struct BrowserScheduler {
    window: Window,
}

impl BrowserScheduler {
    /// Scheduler on `window`.
    pub const fn new(window: Window) -> Self {
        Self { window }
    }
}

impl Scheduler for BrowserScheduler {
    fn now_ms(&self) -> f64 {
        self.window
            .performance()
            .map_or_else(js_sys::Date::now, |p| p.now())
    }

    fn set_timeout(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> TimerId {
        let callback = Closure::once_into_js(move || task());
        let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay)
        {
            Ok(handle) => TimerId(u64::from(handle.unsigned_abs())),
            Err(err) => {
                log::warn!("setTimeout failed: {err:?}");
                TimerId(0)
            }
        }
    }

    fn clear_timeout(&self, id: TimerId) {
        if let Ok(handle) = i32::try_from(id.0) {
            self.window.clear_timeout_with_handle(handle);
        }
    }
}
