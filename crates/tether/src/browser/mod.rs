//! Browser runtime: `web-sys` implementations of the core host traits and
//! the `wasm-bindgen` exports.

// WASM-only modules
#[cfg(target_arch = "wasm32")]
pub mod dom;
#[cfg(target_arch = "wasm32")]
pub mod exports;
#[cfg(target_arch = "wasm32")]
pub mod logger;
#[cfg(target_arch = "wasm32")]
pub mod plugin;
#[cfg(target_arch = "wasm32")]
pub mod scheduler;

// Cross-platform modules
pub mod modules;
pub mod storage;

#[cfg(target_arch = "wasm32")]
pub use dom::{DomError, DomHost};
#[cfg(target_arch = "wasm32")]
pub use logger::ConsoleLogger;
pub use modules::{LoaderError, ModuleTable};
#[cfg(target_arch = "wasm32")]
pub use scheduler::BrowserScheduler;
pub use storage::BrowserStorage;
