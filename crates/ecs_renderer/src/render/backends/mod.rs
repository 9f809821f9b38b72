//! Backend implementations for the render module
//!
//! Only the headless reference backend ships with the engine; API-specific
//! backends implement [`Renderer`](super::backend::Renderer) outside this crate.

pub mod headless;

pub use headless::{HeadlessRenderer, RenderCommand};
