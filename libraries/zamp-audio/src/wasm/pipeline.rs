//! WASM-compatible pipeline wrapper

use super::node::{WebAudioContext, WebAudioNode};
use crate::events::AmpEvent;
use crate::graph::ContextHandle;
use crate::manager::AudioPipeline;
use crate::segment::Weighting;
use js_sys::Function;
use std::fmt::Display;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use zamp_core::{Amp, BusConfig, Channel, ComponentHandle};

/// WASM-compatible audio pipeline
///
/// Owns a root and its pipeline component for one channel. Other components
/// talk to it through the same events a native host would raise.
#[wasm_bindgen]
pub struct WasmAudioPipeline {
    amp: Amp<AmpEvent>,
    pipeline: ComponentHandle<AudioPipeline>,
    on_error: Option<Function>,
}

#[wasm_bindgen]
impl WasmAudioPipeline {
    /// Create a pipeline on `channel` (default: "Default")
    #[wasm_bindgen(constructor)]
    pub fn new(channel: Option<String>) -> Result<WasmAudioPipeline, JsValue> {
        // Enable panic hooks for better error messages in console
        console_error_panic_hook::set_once();

        let config = BusConfig {
            channel: channel.unwrap_or_else(|| Channel::DEFAULT.to_string()),
            ..BusConfig::default()
        };
        config.validate().map_err(to_js)?;

        let amp = Amp::with_config(&config);
        let pipeline = amp
            .add_component(AudioPipeline::with_channel(config.channel.as_str()))
            .map_err(to_js)?;

        Ok(Self {
            amp,
            pipeline,
            on_error: None,
        })
    }

    /// Route `element` through the pipeline into `context`'s output
    #[wasm_bindgen(js_name = attachMedia)]
    pub fn attach_media(
        &self,
        context: web_sys::AudioContext,
        element: &web_sys::HtmlMediaElement,
    ) -> Result<(), JsValue> {
        let context = WebAudioContext::new(context);
        let source = context
            .media_element_source(element)
            .map_err(|e| self.handle_error(e))?;
        let context: ContextHandle = Rc::new(context);

        self.amp
            .raise_event(AmpEvent::AudioContextActivated { context })
            .map_err(|e| self.handle_error(e))?;
        self.amp
            .raise_event(AmpEvent::MediaElementLoaded { source })
            .map_err(|e| self.handle_error(e))
    }

    /// Contribute a segment running from `first` to `last` (or just `first`)
    #[wasm_bindgen(js_name = insertSegment)]
    pub fn insert_segment(
        &self,
        first: web_sys::AudioNode,
        last: Option<web_sys::AudioNode>,
        weighting: Option<u8>,
    ) -> Result<(), JsValue> {
        let weighting = match weighting {
            Some(value) => Weighting::new(value).map_err(|e| self.handle_error(e))?,
            None => Weighting::DEFAULT,
        };
        let first = WebAudioNode::handle(first);
        let last = last.map_or_else(|| Rc::clone(&first), WebAudioNode::handle);

        self.amp
            .raise_event(AmpEvent::segment_created(first, last, weighting))
            .map_err(|e| self.handle_error(e))
    }

    /// Weightings in pipeline order
    pub fn weightings(&self) -> Vec<u8> {
        self.pipeline.weightings()
    }

    /// Check if the pipeline has been constructed
    #[wasm_bindgen(getter, js_name = isInitialised)]
    pub fn is_initialised(&self) -> bool {
        self.pipeline.is_initialised()
    }

    /// Resume a context suspended by auto-play rules (call from a user gesture)
    pub fn resume(&self) -> Result<(), JsValue> {
        self.amp
            .raise_event(AmpEvent::UserGesture)
            .map_err(|e| self.handle_error(e))
    }

    // ===== Event Callbacks =====

    /// Register a callback invoked with the message of every failed call
    #[wasm_bindgen(js_name = onError)]
    pub fn on_error(&mut self, callback: Function) {
        self.on_error = Some(callback);
    }

    // ===== Internal Helpers =====

    fn handle_error(&self, error: impl Display) -> JsValue {
        let err_msg = error.to_string();

        if let Some(ref cb) = self.on_error {
            cb.call1(&JsValue::NULL, &JsValue::from_str(&err_msg)).ok();
        }

        JsValue::from_str(&err_msg)
    }
}

fn to_js(err: impl Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}
