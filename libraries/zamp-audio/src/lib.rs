//! ZAmp Audio - Pipeline Management
//!
//! Weighted audio pipeline for ZAmp players, built on the `zamp-core` bus.
//!
//! This crate provides:
//! - `AmpEvent`: the closed event contract shared by player components
//! - `AudioPipeline`: the component that owns the processing pipeline
//! - `Pipeline`: ordered, weighted segment list with graph rewiring
//! - `AudioNode` / `ProcessingContext`: the host graph the pipeline rewires
//! - `RecordingGraph`: an in-memory host graph for native builds and tests
//!
//! # Architecture
//!
//! The pipeline never touches samples. Audio flows through the host graph
//! (Web Audio in the browser, enabled with the `wasm` feature); this crate
//! only decides the order of nodes and keeps the graph wired to match.
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use zamp_audio::{AmpEvent, AudioPipeline, RecordingContext, RecordingGraph, Weighting};
//! use zamp_core::Amp;
//!
//! let graph = RecordingGraph::new();
//! let context = Rc::new(RecordingContext::new(&graph));
//! let source = graph.create_node("media");
//! let analyser = graph.create_node("analyser");
//!
//! let amp = Amp::<AmpEvent>::new();
//! let pipeline = amp.add_component(AudioPipeline::new()).unwrap();
//!
//! amp.raise_event(AmpEvent::AudioContextActivated { context }).unwrap();
//! amp.raise_event(AmpEvent::MediaElementLoaded { source: source.clone() }).unwrap();
//! amp.raise_event(AmpEvent::segment_created(
//!     analyser.clone(),
//!     analyser.clone(),
//!     Weighting::VISUALISER,
//! ))
//! .unwrap();
//!
//! assert_eq!(pipeline.weightings(), vec![0, 99, 100]);
//! assert_eq!(graph.walk_labels(source.id()), vec!["media", "analyser", "destination"]);
//! ```

#![forbid(unsafe_code)]

mod error;
pub mod events;
pub mod graph;
mod manager;
mod pipeline;
pub mod recording;
mod segment;
pub mod types;

#[cfg(feature = "wasm")]
pub mod wasm;

// Public exports
pub use error::{PipelineError, Result};
pub use events::{AmpEvent, EventKind};
pub use graph::{AudioNode, ContextHandle, NodeHandle, ProcessingContext};
pub use manager::AudioPipeline;
pub use pipeline::Pipeline;
pub use recording::{GraphOp, NodeId, RecordingContext, RecordingGraph, RecordingNode};
pub use segment::{PipelineSegment, Weighting};
pub use types::AudioTrack;
