//! Platform layer
//!
//! The engine itself is host-agnostic: it is driven through [`crate::BlockField`]
//! with timestamps, pointer positions and widths. This module holds the browser
//! host that feeds it from the DOM.

#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(target_arch = "wasm32")]
pub use web::{BlockFieldHandle, init_logging};
