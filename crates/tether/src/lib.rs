//! Tether: anchor positioning and signal persistence for hypermedia
//! front-ends, compiled to WASM.
//!
//! # Browser Usage (WASM)
//!
//! ```javascript
//! import init, { anchorPlugin, persistPlugin, configure } from './tether.js';
//!
//! await init();
//! configure('{"anchor": {"default_placement": "top"}}');
//! load(anchorPlugin(), persistPlugin());
//! ```
//!
//! ```html
//! <button id="save">Save</button>
//! <div data-anchor="#save, top-start, 0.5rem">Saves the draft</div>
//! <div data-persist:prefs__session="theme sidebar.open"></div>
//! ```

pub use tether_core::*;

pub mod browser;

#[cfg(target_arch = "wasm32")]
pub use browser::{BrowserScheduler, DomHost};

pub use browser::{BrowserStorage, LoaderError, ModuleTable};
