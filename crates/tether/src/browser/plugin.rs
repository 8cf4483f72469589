//! Framework plugin objects backed by the Rust plugins.
//!
//! The framework calls `onLoad(ctx)` per element. The context object is
//! expected to carry:
//!
//! - `el`: the element
//! - `key`: key suffix of the attribute, if any
//! - `value`: raw attribute value
//! - `mods`: modifiers as a `Map`, `Set` or array
//! - `effect(fn)`: reactive effect, returns a cleanup function
//! - `getSignals()`: plain-object snapshot of the signals
//! - `mergePatch(object)`: merge values into the signals

use super::dom::DomHost;
use js_sys::{Array, Function, Object, Reflect, JSON};
use serde_json::Value;
use std::rc::Rc;
use tether_core::{
    run_plugin, AttributePlugin, Cleanup, EffectScope, KeyRequirement, PluginContext, SignalStore,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

fn get(target: &JsValue, name: &str) -> Result<JsValue, JsValue> {
    Reflect::get(target, &JsValue::from_str(name))
}

fn method(target: &JsValue, name: &str) -> Result<Function, JsValue> {
    get(target, name)?
        .dyn_into::<Function>()
        .map_err(|_| JsValue::from_str(&format!("ctx.{name} is not a function")))
}

fn to_json(value: &JsValue) -> Option<Value> {
    let text: String = JSON::stringify(value).ok()?.into();
    serde_json::from_str(&text).ok()
}

fn from_json(value: &Value) -> Option<JsValue> {
    JSON::parse(&value.to_string()).ok()
}

/// Signals reached through the framework context.
#[derive(Debug)]
pub struct JsSignals {
    ctx: JsValue,
}

impl JsSignals {
    /// Signals of `ctx`.
    pub const fn new(ctx: JsValue) -> Self {
        Self { ctx }
    }
}

impl SignalStore for JsSignals {
    fn snapshot(&self) -> Value {
        method(&self.ctx, "getSignals")
            .and_then(|f| f.call0(&self.ctx))
            .ok()
            .and_then(|signals| to_json(&signals))
            .unwrap_or(Value::Null)
    }

    fn merge(&self, patch: Value) {
        let Some(patch) = from_json(&patch) else {
            return;
        };
        if let Err(err) = method(&self.ctx, "mergePatch").and_then(|f| f.call1(&self.ctx, &patch)) {
            log::warn!("mergePatch failed: {err:?}");
        }
    }
}

/// Effects through the framework context.
#[derive(Debug)]
pub struct JsEffects {
    ctx: JsValue,
}

impl JsEffects {
    /// Effects of `ctx`.
    pub const fn new(ctx: JsValue) -> Self {
        Self { ctx }
    }
}

impl EffectScope for JsEffects {
    fn effect(&self, effect: Rc<dyn Fn()>) -> Cleanup {
        let callback = Closure::<dyn Fn()>::new(move || effect());
        let stop = method(&self.ctx, "effect").and_then(|f| f.call1(&self.ctx, callback.as_ref()));
        let stop = match stop {
            Ok(stop) => stop.dyn_into::<Function>().ok(),
            Err(err) => {
                log::warn!("effect failed: {err:?}");
                None
            }
        };
        Box::new(move || {
            if let Some(stop) = stop {
                let _ = stop.call0(&JsValue::UNDEFINED);
            }
            drop(callback);
        })
    }
}

fn modifiers(mods: &JsValue) -> Vec<String> {
    let Ok(Some(iter)) = js_sys::try_iter(mods) else {
        return Vec::new();
    };
    iter.filter_map(Result::ok)
        .filter_map(|item| {
            // Map entries arrive as [name, args]
            if Array::is_array(&item) {
                Array::from(&item).get(0).as_string()
            } else {
                item.as_string()
            }
        })
        .collect()
}

/// Build a [`PluginContext`] from the framework's context object.
pub fn context_from_js(host: &DomHost, ctx: &JsValue) -> Result<PluginContext<DomHost>, JsValue> {
    let element = get(ctx, "el")?
        .dyn_into::<web_sys::HtmlElement>()
        .map_err(|_| JsValue::from_str("ctx.el is not an HTML element"))?;
    Ok(PluginContext {
        host: host.clone(),
        element,
        key: get(ctx, "key")?.as_string().filter(|k| !k.is_empty()),
        value: get(ctx, "value")?.as_string().unwrap_or_default(),
        modifiers: modifiers(&get(ctx, "mods")?),
        signals: Rc::new(JsSignals::new(ctx.clone())),
        effects: Rc::new(JsEffects::new(ctx.clone())),
    })
}

/// Name the framework uses for a key requirement.
#[must_use]
pub const fn key_requirement_name(requirement: KeyRequirement) -> &'static str {
    match requirement {
        KeyRequirement::Allowed => "allowed",
        KeyRequirement::Must => "must",
        KeyRequirement::Denied => "denied",
    }
}

/// `{ type: "attribute", name, keyReq, onLoad }` for `plugin`.
pub fn plugin_object<P>(host: DomHost, plugin: P) -> Result<JsValue, JsValue>
where
    P: AttributePlugin<DomHost> + 'static,
{
    let object = Object::new();
    Reflect::set(&object, &"type".into(), &"attribute".into())?;
    Reflect::set(&object, &"name".into(), &plugin.name().into())?;
    Reflect::set(
        &object,
        &"keyReq".into(),
        &key_requirement_name(plugin.key_requirement()).into(),
    )?;

    let plugin = Rc::new(plugin);
    let on_load = Closure::<dyn Fn(JsValue) -> JsValue>::new(move |ctx: JsValue| {
        match context_from_js(&host, &ctx) {
            Ok(ctx) => run_plugin(plugin.as_ref(), ctx)
                .map_or(JsValue::UNDEFINED, |cleanup| Closure::once_into_js(move || cleanup())),
            Err(err) => {
                log::warn!("`data-{}` skipped: {err:?}", plugin.name());
                JsValue::UNDEFINED
            }
        }
    });
    Reflect::set(&object, &"onLoad".into(), &on_load.into_js_value())?;
    Ok(object.into())
}
