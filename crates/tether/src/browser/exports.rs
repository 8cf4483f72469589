//! `wasm-bindgen` entry points.
//!
//! ```javascript
//! import init, { configure, anchorPlugin, persistPlugin } from './tether.js';
//!
//! await init();
//! configure('{"anchor": {"probe_native": true}}');
//! load(anchorPlugin(), persistPlugin());
//! ```

use super::dom::DomHost;
use super::logger;
use super::modules::{LoaderError, ModuleTable};
use super::plugin::plugin_object;
use super::scheduler::BrowserScheduler;
use super::storage::BrowserStorage;
use js_sys::{Function, Promise};
use log::LevelFilter;
use std::cell::RefCell;
use std::rc::Rc;
use tether_core::{AnchorPlugin, Config, Debounce, PersistPlugin, Throttle};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlScriptElement;

thread_local! {
    static CONFIG: RefCell<Config> = RefCell::new(Config::default());
    static MODULES: RefCell<ModuleTable<JsValue>> = RefCell::new(ModuleTable::new());
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Panic hook and console logging.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    logger::init(LevelFilter::Warn);
}

/// Console log level: `off`, `error`, `warn`, `info`, `debug` or `trace`.
#[wasm_bindgen(js_name = setLogLevel)]
pub fn set_log_level(level: &str) -> Result<(), JsValue> {
    let level: LevelFilter = level.parse().map_err(js_error)?;
    logger::init(level);
    Ok(())
}

/// Replace the configuration used by plugins created afterwards.
#[wasm_bindgen]
pub fn configure(json: &str) -> Result<(), JsValue> {
    let config = Config::from_json(json).map_err(js_error)?;
    log::debug!("configured: {config:?}");
    CONFIG.with(|c| *c.borrow_mut() = config);
    Ok(())
}

/// The `data-anchor` plugin object.
#[wasm_bindgen(js_name = anchorPlugin)]
pub fn anchor_plugin() -> Result<JsValue, JsValue> {
    let host = DomHost::new().map_err(js_error)?;
    let config = CONFIG.with(|c| c.borrow().anchor.clone());
    plugin_object(host, AnchorPlugin::new(config))
}

/// The `data-persist` plugin object.
#[wasm_bindgen(js_name = persistPlugin)]
pub fn persist_plugin() -> Result<JsValue, JsValue> {
    let host = DomHost::new().map_err(js_error)?;
    let config = CONFIG.with(|c| c.borrow().persist.clone());
    let plugin = PersistPlugin::new(
        config,
        Rc::new(BrowserStorage::local()),
        Rc::new(BrowserStorage::session()),
        Rc::new(BrowserScheduler::new(host.window().clone())),
    );
    plugin_object(host, plugin)
}

fn scheduler() -> Result<Rc<BrowserScheduler>, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    Ok(Rc::new(BrowserScheduler::new(window)))
}

fn js_callback(callback: Function) -> Rc<dyn Fn()> {
    Rc::new(move || {
        if let Err(err) = callback.call0(&JsValue::UNDEFINED) {
            log::warn!("callback threw: {err:?}");
        }
    })
}

/// Wrap `callback` so bursts of calls collapse into one, `ms` after the last.
#[wasm_bindgen]
pub fn debounce(callback: Function, ms: u32) -> Result<JsValue, JsValue> {
    let debounce = Debounce::new(scheduler()?, ms, js_callback(callback));
    Ok(Closure::<dyn Fn()>::new(move || debounce.call()).into_js_value())
}

/// Wrap `callback` so it runs at most once per `ms`, leading and trailing.
#[wasm_bindgen]
pub fn throttle(callback: Function, ms: u32) -> Result<JsValue, JsValue> {
    let throttle = Throttle::new(scheduler()?, ms, js_callback(callback));
    Ok(Closure::<dyn Fn()>::new(move || throttle.call()).into_js_value())
}

fn settle(notifications: Vec<Box<dyn FnOnce()>>) {
    for notify in notifications {
        notify();
    }
}

fn fail(name: &str, error: &LoaderError) {
    log::warn!("{error}");
    settle(MODULES.with(|m| m.borrow_mut().fail(name, error)));
}

/// Called by a loaded script to hand over its module.
#[wasm_bindgen(js_name = registerModule)]
pub fn register_module(name: &str, module: JsValue) {
    settle(MODULES.with(|m| m.borrow_mut().register(name, module)));
}

fn inject_script(url: &str, name: &str) -> Result<(), LoaderError> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or(LoaderError::NoDocument)?;
    let script = document
        .create_element("script")
        .ok()
        .and_then(|el| el.dyn_into::<HtmlScriptElement>().ok())
        .ok_or(LoaderError::NoDocument)?;
    script.set_src(url);
    script.set_async(true);

    let (loaded_url, loaded_name) = (url.to_string(), name.to_string());
    let onload = Closure::once_into_js(move || {
        if !MODULES.with(|m| m.borrow().contains(&loaded_name)) {
            let error = LoaderError::NotRegistered {
                url: loaded_url,
                name: loaded_name.clone(),
            };
            fail(&loaded_name, &error);
        }
    });
    let (failed_url, failed_name) = (url.to_string(), name.to_string());
    let onerror = Closure::once_into_js(move || {
        fail(&failed_name, &LoaderError::ScriptFailed(failed_url));
    });
    script.set_onload(Some(onload.unchecked_ref()));
    script.set_onerror(Some(onerror.unchecked_ref()));

    let parent = document
        .body()
        .map(web_sys::Element::from)
        .or_else(|| document.document_element())
        .ok_or(LoaderError::NoDocument)?;
    parent
        .append_child(&script)
        .map(|_| ())
        .map_err(|_| LoaderError::ScriptFailed(url.to_string()))
}

/// Load the script at `url` and resolve with the module it registers as
/// `name`. Resolves at once when `name` is already registered.
#[wasm_bindgen(js_name = loadModule)]
pub fn load_module(url: &str, name: &str) -> Promise {
    Promise::new(&mut |resolve: Function, reject: Function| {
        if let Some(module) = MODULES.with(|m| m.borrow().get(name)) {
            let _ = resolve.call1(&JsValue::UNDEFINED, &module);
            return;
        }
        let waiter = Box::new(move |result: Result<JsValue, LoaderError>| {
            let _ = match result {
                Ok(module) => resolve.call1(&JsValue::UNDEFINED, &module),
                Err(err) => reject.call1(&JsValue::UNDEFINED, &js_error(err)),
            };
        });
        let first = MODULES.with(|m| {
            let mut modules = m.borrow_mut();
            let already_loading = modules.waiting(name) > 0;
            modules.wait(name, waiter);
            !already_loading
        });
        if first {
            if let Err(err) = inject_script(url, name) {
                fail(name, &err);
            }
        }
    })
}
