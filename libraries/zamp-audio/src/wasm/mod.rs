//! WASM bindings for zamp-audio
//!
//! Web Audio implementations of the host graph traits, and a
//! JavaScript-facing wrapper around a root with its pipeline component.

pub mod node;
pub mod pipeline;

pub use node::{WebAudioContext, WebAudioNode};
pub use pipeline::WasmAudioPipeline;
