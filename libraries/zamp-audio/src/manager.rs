//! Audio pipeline component
//!
//! Owns the pipeline for one player instance. It waits until both a media
//! source and a processing context are known, wires source to output,
//! announces `audioPipelineCreated`, and from then on splices every
//! contributed segment into place by weighting.

use crate::error::Result;
use crate::events::{AmpEvent, EventKind};
use crate::graph::{ContextHandle, NodeHandle};
use crate::pipeline::Pipeline;
use crate::segment::PipelineSegment;
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, info};
use zamp_core::{BusError, Channel, Component, EventEmitter};

#[derive(Default)]
struct PipelineState {
    media_source: Option<NodeHandle>,
    context: Option<ContextHandle>,
    pipeline: Pipeline,
}

/// Pipeline manager component
pub struct AudioPipeline {
    emitter: EventEmitter<AmpEvent>,
    state: RefCell<PipelineState>,
}

impl AudioPipeline {
    /// Default component name
    pub const NAME: &'static str = "AudioPipeline";

    /// Create a pipeline component on the default channel
    pub fn new() -> Rc<Self> {
        Self::named(Self::NAME, Channel::DEFAULT)
    }

    /// Create a pipeline component on `channel`
    pub fn with_channel(channel: impl Into<Channel>) -> Rc<Self> {
        Self::named(Self::NAME, channel)
    }

    /// Create a pipeline component with a custom name
    pub fn named(name: impl Into<String>, channel: impl Into<Channel>) -> Rc<Self> {
        Rc::new_cyclic(|weak: &Weak<Self>| {
            let emitter = EventEmitter::with_channel(name, channel);

            listen(&emitter, EventKind::MediaElementLoaded, weak, |pipeline, event| {
                match event {
                    AmpEvent::MediaElementLoaded { source } => {
                        pipeline.set_media_source(Rc::clone(source))
                    }
                    _ => Ok(()),
                }
            });

            listen(&emitter, EventKind::AudioContextActivated, weak, |pipeline, event| {
                match event {
                    AmpEvent::AudioContextActivated { context } => {
                        pipeline.set_context(Rc::clone(context))
                    }
                    _ => Ok(()),
                }
            });

            listen(
                &emitter,
                EventKind::AudioPipelineSegmentCreated,
                weak,
                |pipeline, event| match event {
                    AmpEvent::AudioPipelineSegmentCreated {
                        first_node,
                        last_node,
                        weighting,
                    } => pipeline
                        .on_segment_created(PipelineSegment::new(
                            Rc::clone(first_node),
                            Rc::clone(last_node),
                            *weighting,
                        ))
                        .map(|_| ()),
                    _ => Ok(()),
                },
            );

            listen(&emitter, EventKind::UserGesture, weak, |pipeline, _| {
                pipeline.resume_if_suspended().map(|_| ())
            });

            Self {
                emitter,
                state: RefCell::new(PipelineState::default()),
            }
        })
    }

    /// Provide the node audio enters the pipeline through
    ///
    /// Ignored once the pipeline is constructed.
    pub fn set_media_source(&self, source: NodeHandle) -> Result<()> {
        {
            let mut state = self.state.borrow_mut();
            if state.pipeline.is_constructed() {
                debug!(component = %self.emitter.name(), "Pipeline already constructed, ignoring media source");
                return Ok(());
            }
            state.media_source = Some(source);
        }
        self.try_construct()
    }

    /// Provide the processing context whose destination ends the pipeline
    ///
    /// Ignored once the pipeline is constructed.
    pub fn set_context(&self, context: ContextHandle) -> Result<()> {
        {
            let mut state = self.state.borrow_mut();
            if state.pipeline.is_constructed() {
                debug!(component = %self.emitter.name(), "Pipeline already constructed, ignoring context");
                return Ok(());
            }
            state.context = Some(context);
        }
        self.try_construct()
    }

    /// Build the pipeline once both inputs are known
    ///
    /// State is committed before `audioPipelineCreated` is raised, so
    /// listeners that contribute segments straight away see a built pipeline.
    fn try_construct(&self) -> Result<()> {
        let context = {
            let mut state = self.state.borrow_mut();
            if state.pipeline.is_constructed() {
                return Ok(());
            }
            let (Some(source), Some(context)) = (state.media_source.clone(), state.context.clone())
            else {
                return Ok(());
            };

            state.pipeline.construct(source, context.destination())?;
            context
        };

        info!(
            component = %self.emitter.name(),
            channel = %self.emitter.channel(),
            "Audio pipeline created"
        );
        self.emitter
            .raise_event(AmpEvent::AudioPipelineCreated { context })?;
        Ok(())
    }

    /// Insert a contributed segment by weighting
    ///
    /// Returns the segment's index in the pipeline.
    ///
    /// # Errors
    /// `PipelineCorrupted` if the pipeline has not been constructed yet.
    pub fn on_segment_created(&self, segment: PipelineSegment) -> Result<usize> {
        let weighting = segment.weighting();
        let index = self.state.borrow_mut().pipeline.insert(segment)?;

        info!(
            component = %self.emitter.name(),
            weighting = %weighting,
            index,
            "Added pipeline segment"
        );
        Ok(index)
    }

    /// Resume the context if it is suspended
    ///
    /// Returns whether a resume was requested.
    pub fn resume_if_suspended(&self) -> Result<bool> {
        let Some(context) = self.context() else {
            return Ok(false);
        };
        if context.is_running() {
            return Ok(false);
        }

        debug!(component = %self.emitter.name(), "Resuming suspended context");
        context.resume()?;
        Ok(true)
    }

    /// Check if the pipeline has been constructed
    pub fn is_initialised(&self) -> bool {
        self.state.borrow().pipeline.is_constructed()
    }

    /// Segments in pipeline order
    pub fn segments(&self) -> Vec<PipelineSegment> {
        self.state.borrow().pipeline.segments().to_vec()
    }

    /// Weightings in pipeline order
    pub fn weightings(&self) -> Vec<u8> {
        self.state.borrow().pipeline.weightings()
    }

    /// Processing context, once activated
    pub fn context(&self) -> Option<ContextHandle> {
        self.state.borrow().context.clone()
    }

    /// Node audio enters the pipeline through, once loaded
    pub fn media_source(&self) -> Option<NodeHandle> {
        self.state.borrow().media_source.clone()
    }
}

/// Register `handler` for `kind` without keeping the component alive
fn listen<F>(emitter: &EventEmitter<AmpEvent>, kind: EventKind, weak: &Weak<AudioPipeline>, handler: F)
where
    F: Fn(&AudioPipeline, &AmpEvent) -> Result<()> + 'static,
{
    let weak = weak.clone();
    emitter.add_event_listener(kind, move |event| match weak.upgrade() {
        Some(pipeline) => handler(&pipeline, event).map_err(BusError::from),
        None => Ok(()),
    });
}

impl Component<AmpEvent> for AudioPipeline {
    fn emitter(&self) -> &EventEmitter<AmpEvent> {
        &self.emitter
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for AudioPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioPipeline")
            .field("name", &self.emitter.name())
            .field("channel", self.emitter.channel())
            .field("weightings", &self.weightings())
            .finish()
    }
}
