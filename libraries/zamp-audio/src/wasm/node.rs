//! Web Audio host graph

use crate::error::{PipelineError, Result};
use crate::graph::{AudioNode, NodeHandle, ProcessingContext};
use std::any::Any;
use std::rc::Rc;
use wasm_bindgen::JsValue;
use web_sys::AudioContextState;

/// Web Audio node
#[derive(Debug, Clone)]
pub struct WebAudioNode {
    node: web_sys::AudioNode,
}

impl WebAudioNode {
    pub fn new(node: web_sys::AudioNode) -> Self {
        Self { node }
    }

    /// Underlying Web Audio node
    pub fn inner(&self) -> &web_sys::AudioNode {
        &self.node
    }

    /// Wrap a Web Audio node as a shared handle
    pub fn handle(node: web_sys::AudioNode) -> NodeHandle {
        Rc::new(Self::new(node))
    }
}

fn web_node(node: &dyn AudioNode) -> Result<&web_sys::AudioNode> {
    node.as_any()
        .downcast_ref::<WebAudioNode>()
        .map(WebAudioNode::inner)
        .ok_or_else(|| PipelineError::graph("node is not a Web Audio node"))
}

fn js_error(err: JsValue) -> PipelineError {
    PipelineError::Graph(err.as_string().unwrap_or_else(|| format!("{:?}", err)))
}

impl AudioNode for WebAudioNode {
    fn connect(&self, destination: &dyn AudioNode) -> Result<()> {
        self.node
            .connect_with_audio_node(web_node(destination)?)
            .map(|_| ())
            .map_err(js_error)
    }

    fn disconnect(&self, destination: &dyn AudioNode) -> Result<()> {
        self.node
            .disconnect_with_audio_node(web_node(destination)?)
            .map_err(js_error)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Web Audio context
#[derive(Debug, Clone)]
pub struct WebAudioContext {
    context: web_sys::AudioContext,
}

impl WebAudioContext {
    pub fn new(context: web_sys::AudioContext) -> Self {
        Self { context }
    }

    /// Underlying Web Audio context
    pub fn inner(&self) -> &web_sys::AudioContext {
        &self.context
    }

    /// Create the source node for a media element
    pub fn media_element_source(&self, element: &web_sys::HtmlMediaElement) -> Result<NodeHandle> {
        let source = self
            .context
            .create_media_element_source(element)
            .map_err(js_error)?;
        Ok(WebAudioNode::handle(source.into()))
    }
}

impl ProcessingContext for WebAudioContext {
    fn destination(&self) -> NodeHandle {
        WebAudioNode::handle(self.context.destination().into())
    }

    fn is_running(&self) -> bool {
        self.context.state() == AudioContextState::Running
    }

    fn resume(&self) -> Result<()> {
        // The returned promise settles on its own; nothing waits for it
        self.context.resume().map(|_| ()).map_err(js_error)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
