//! Ordered segment list
//!
//! A constructed pipeline always starts with the media source (weighting 0)
//! and ends with the output (weighting 100), and the host graph mirrors the
//! list: each segment's last node feeds the next segment's first node.
//!
//! # Insertion
//!
//! ```text
//! before:  source(0) -> eq(10) ---------------> dest(100)
//! insert:                        vis(99)
//! after:   source(0) -> eq(10) -> vis(99) ----> dest(100)
//! ```
//!
//! The new segment goes between the first adjacent pair whose weightings
//! bracket it, so among equal weightings the earliest slot wins.
//!
//! If a splice fails and the original link cannot be put back either, the
//! list no longer mirrors the graph. The pipeline is then marked broken and
//! refuses further segments with `PipelineCorrupted`.

use crate::error::{PipelineError, Result};
use crate::graph::NodeHandle;
use crate::segment::{PipelineSegment, Weighting};
use tracing::{debug, warn};

/// Weighted chain of segments between a source and an output
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    segments: Vec<PipelineSegment>,
    broken: bool,
}

impl Pipeline {
    /// Create an empty (unconstructed) pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Wire `source` straight into `destination` and install both sentinels
    ///
    /// Does nothing if the pipeline is already constructed.
    pub fn construct(&mut self, source: NodeHandle, destination: NodeHandle) -> Result<()> {
        if self.is_constructed() {
            debug!("Pipeline already constructed");
            return Ok(());
        }

        source.connect(destination.as_ref())?;
        self.segments = vec![
            PipelineSegment::single(source, Weighting::SOURCE),
            PipelineSegment::single(destination, Weighting::DESTINATION),
        ];
        Ok(())
    }

    /// Index of the segment the new one would follow
    ///
    /// # Errors
    /// `PipelineCorrupted` if no adjacent pair brackets `weighting`.
    pub fn position_for(&self, weighting: Weighting) -> Result<usize> {
        self.segments
            .windows(2)
            .position(|pair| pair[0].weighting() <= weighting && weighting <= pair[1].weighting())
            .ok_or(PipelineError::PipelineCorrupted {
                weighting: weighting.value(),
                segments: self.segments.len(),
            })
    }

    /// Splice `segment` into the pipeline and the host graph
    ///
    /// Returns the index the segment now occupies. On a graph failure the
    /// original link is restored and the list is left unchanged.
    pub fn insert(&mut self, segment: PipelineSegment) -> Result<usize> {
        if self.broken {
            return Err(PipelineError::PipelineCorrupted {
                weighting: segment.weighting().value(),
                segments: self.segments.len(),
            });
        }

        let index = self.position_for(segment.weighting())?;
        let previous = &self.segments[index];
        let next = &self.segments[index + 1];

        if let Err(failure) = splice(previous.last_node(), &segment, next.first_node()) {
            if !failure.link_restored {
                warn!(
                    after = %previous.weighting(),
                    before = %next.weighting(),
                    "Pipeline link lost, refusing further segments"
                );
                self.broken = true;
            }
            return Err(failure.cause);
        }

        debug!(
            weighting = %segment.weighting(),
            index = index + 1,
            after = %previous.weighting(),
            before = %next.weighting(),
            "Inserted pipeline segment"
        );
        self.segments.insert(index + 1, segment);
        Ok(index + 1)
    }

    /// Segments in pipeline order
    pub fn segments(&self) -> &[PipelineSegment] {
        &self.segments
    }

    /// Weightings in pipeline order
    pub fn weightings(&self) -> Vec<u8> {
        self.segments
            .iter()
            .map(|segment| segment.weighting().value())
            .collect()
    }

    /// Number of segments, sentinels included
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if the pipeline has no segments
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Check if the source and output sentinels are installed
    pub fn is_constructed(&self) -> bool {
        self.segments.len() >= 2
    }

    /// Check if a failed splice left the graph out of step with the list
    pub fn is_broken(&self) -> bool {
        self.broken
    }
}

struct SpliceFailure {
    cause: PipelineError,
    link_restored: bool,
}

impl SpliceFailure {
    fn new(cause: PipelineError, link_restored: bool) -> Self {
        Self {
            cause,
            link_restored,
        }
    }
}

/// Rewire `previous -> next` into `previous -> segment -> next`
fn splice(
    previous: &NodeHandle,
    segment: &PipelineSegment,
    next: &NodeHandle,
) -> std::result::Result<(), SpliceFailure> {
    previous
        .disconnect(next.as_ref())
        .map_err(|err| SpliceFailure::new(err, true))?;

    if let Err(err) = previous.connect(segment.first_node().as_ref()) {
        return Err(SpliceFailure::new(err, restore(previous, next, None)));
    }

    if let Err(err) = segment.last_node().connect(next.as_ref()) {
        let restored = restore(previous, next, Some(segment.first_node()));
        return Err(SpliceFailure::new(err, restored));
    }

    Ok(())
}

/// Put back the `previous -> next` link after a failed splice
///
/// Returns whether the link is back in place.
fn restore(previous: &NodeHandle, next: &NodeHandle, dangling: Option<&NodeHandle>) -> bool {
    if let Some(first) = dangling {
        if let Err(err) = previous.disconnect(first.as_ref()) {
            warn!(error = %err, "Failed to detach partially inserted segment");
        }
    }
    match previous.connect(next.as_ref()) {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "Failed to restore pipeline link");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AudioNode;
    use crate::recording::{GraphOp, RecordingGraph, RecordingNode};
    use std::rc::Rc;

    fn handle(node: &Rc<RecordingNode>) -> NodeHandle {
        node.clone()
    }

    fn weighting(value: u8) -> Weighting {
        Weighting::new(value).unwrap()
    }

    fn constructed(graph: &RecordingGraph) -> (Pipeline, Rc<RecordingNode>, Rc<RecordingNode>) {
        let source = graph.create_node("source");
        let destination = graph.create_node("destination");
        let mut pipeline = Pipeline::new();
        pipeline
            .construct(handle(&source), handle(&destination))
            .unwrap();
        (pipeline, source, destination)
    }

    #[test]
    fn construct_installs_sentinels() {
        let graph = RecordingGraph::new();
        let (pipeline, source, destination) = constructed(&graph);

        assert!(pipeline.is_constructed());
        assert_eq!(pipeline.weightings(), vec![0, 100]);
        assert!(graph.is_connected(source.id(), destination.id()));
    }

    #[test]
    fn construct_twice_is_a_no_op() {
        let graph = RecordingGraph::new();
        let (mut pipeline, _source, _destination) = constructed(&graph);
        let other = graph.create_node("other-source");
        let other_destination = graph.create_node("other-destination");

        pipeline
            .construct(handle(&other), handle(&other_destination))
            .unwrap();

        assert_eq!(pipeline.len(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn insert_rewires_in_order() {
        let graph = RecordingGraph::new();
        let (mut pipeline, source, destination) = constructed(&graph);
        let eq = graph.create_node("eq");
        graph.clear_operations();

        let index = pipeline
            .insert(PipelineSegment::single(handle(&eq), Weighting::EQUALIZER))
            .unwrap();

        assert_eq!(index, 1);
        assert_eq!(
            graph.operations(),
            vec![
                GraphOp::Disconnect {
                    from: source.id(),
                    to: destination.id()
                },
                GraphOp::Connect {
                    from: source.id(),
                    to: eq.id()
                },
                GraphOp::Connect {
                    from: eq.id(),
                    to: destination.id()
                },
            ]
        );
    }

    #[test]
    fn equal_weighting_takes_earliest_slot() {
        let graph = RecordingGraph::new();
        let (mut pipeline, source, _destination) = constructed(&graph);
        let first = graph.create_node("first");
        let second = graph.create_node("second");

        pipeline
            .insert(PipelineSegment::single(handle(&first), weighting(50)))
            .unwrap();
        let index = pipeline
            .insert(PipelineSegment::single(handle(&second), weighting(50)))
            .unwrap();

        // Second lands between source(0) and first(50)
        assert_eq!(index, 1);
        assert_eq!(
            graph.walk_labels(source.id()),
            vec!["source", "second", "first", "destination"]
        );
    }

    #[test]
    fn sentinel_weightings_are_accepted() {
        let graph = RecordingGraph::new();
        let (mut pipeline, _source, _destination) = constructed(&graph);
        let early = graph.create_node("early");
        let late = graph.create_node("late");

        assert_eq!(
            pipeline
                .insert(PipelineSegment::single(handle(&early), Weighting::SOURCE))
                .unwrap(),
            1
        );
        assert_eq!(
            pipeline
                .insert(PipelineSegment::single(handle(&late), Weighting::DESTINATION))
                .unwrap(),
            2
        );
        assert_eq!(pipeline.weightings(), vec![0, 0, 100, 100]);
    }

    #[test]
    fn insert_into_empty_pipeline_fails() {
        let graph = RecordingGraph::new();
        let node = graph.create_node("orphan");
        let mut pipeline = Pipeline::new();

        let err = pipeline
            .insert(PipelineSegment::single(handle(&node), Weighting::DEFAULT))
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::PipelineCorrupted {
                weighting: 50,
                segments: 0
            }
        ));
        assert!(graph.operations().is_empty());
    }

    #[test]
    fn failed_connection_restores_link() {
        let graph = RecordingGraph::new();
        let (mut pipeline, source, destination) = constructed(&graph);
        let eq = graph.create_node("eq");
        graph.refuse_connections_to(eq.id());

        let err = pipeline
            .insert(PipelineSegment::single(handle(&eq), Weighting::EQUALIZER))
            .unwrap_err();

        assert!(matches!(err, PipelineError::Graph(_)));
        assert_eq!(pipeline.weightings(), vec![0, 100]);
        assert!(graph.is_connected(source.id(), destination.id()));
        assert!(graph.outgoing(eq.id()).is_empty());
    }

    #[test]
    fn failed_tail_connection_detaches_segment() {
        let graph = RecordingGraph::new();
        let (mut pipeline, source, destination) = constructed(&graph);
        let low = graph.create_node("low");
        let high = graph.create_node("high");
        low.connect(&*high).unwrap();
        graph.refuse_connections_to(destination.id());

        let err = pipeline
            .insert(PipelineSegment::new(
                handle(&low),
                handle(&high),
                Weighting::EQUALIZER,
            ))
            .unwrap_err();
        graph.allow_connections_to(destination.id());

        assert!(matches!(err, PipelineError::Graph(_)));
        assert_eq!(pipeline.len(), 2);
        assert!(!graph.is_connected(source.id(), low.id()));
        // Restoring the link into the refused destination failed as well
        assert!(!graph.is_connected(source.id(), destination.id()));
        assert!(pipeline.is_broken());
    }

    #[test]
    fn lost_link_refuses_further_segments() {
        let graph = RecordingGraph::new();
        let (mut pipeline, _source, destination) = constructed(&graph);
        let eq = graph.create_node("eq");
        graph.refuse_connections_to(destination.id());
        pipeline
            .insert(PipelineSegment::single(handle(&eq), Weighting::EQUALIZER))
            .unwrap_err();
        graph.allow_connections_to(destination.id());
        graph.clear_operations();

        let vis = graph.create_node("vis");
        let err = pipeline
            .insert(PipelineSegment::single(handle(&vis), Weighting::VISUALISER))
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::PipelineCorrupted {
                weighting: 99,
                segments: 2
            }
        ));
        assert!(graph.operations().is_empty());
    }

    #[test]
    fn restored_link_keeps_pipeline_usable() {
        let graph = RecordingGraph::new();
        let (mut pipeline, source, _destination) = constructed(&graph);
        let broken = graph.create_node("broken");
        graph.refuse_connections_to(broken.id());
        pipeline
            .insert(PipelineSegment::single(handle(&broken), Weighting::EQUALIZER))
            .unwrap_err();
        assert!(!pipeline.is_broken());

        let vis = graph.create_node("vis");
        pipeline
            .insert(PipelineSegment::single(handle(&vis), Weighting::VISUALISER))
            .unwrap();
        assert_eq!(
            graph.walk_labels(source.id()),
            vec!["source", "vis", "destination"]
        );
    }
}
