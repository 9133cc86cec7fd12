//! Bus Events
//!
//! A bus carries one closed set of events, expressed as a tagged union that
//! implements [`BusEvent`]. Listeners are keyed by the event's kind.
//!
//! Every raised event is re-emitted once as a [`Bubbled`] meta-event (wire
//! name `eventRaised`) so that aggregators can observe everything their
//! children raise. `Bubbled` is its own type, so a meta-event can never be
//! bubbled a second time.

use crate::channel::Channel;
use std::fmt;
use std::hash::Hash;

/// Tagged union of events exchanged on a bus
pub trait BusEvent: fmt::Debug + 'static {
    /// Payload-free discriminant used to register listeners
    type Kind: Clone + Eq + Hash + fmt::Debug + fmt::Display;

    /// Kind of this event
    fn kind(&self) -> Self::Kind;
}

/// The `eventRaised` meta-event: an event together with the channel it was raised on
#[derive(Debug, Clone, PartialEq)]
pub struct Bubbled<E> {
    /// The original event, payload untouched
    pub event: E,
    /// Channel of the component that raised it
    pub channel: Channel,
}

impl<E> Bubbled<E> {
    /// Wire name of the meta-event
    pub const NAME: &'static str = "eventRaised";

    /// Wrap an event raised on `channel`
    pub fn new(event: E, channel: Channel) -> Self {
        Self { event, channel }
    }
}
