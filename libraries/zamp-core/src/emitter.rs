//! Event Emitter
//!
//! The base capability every component has: a per-instance listener registry,
//! a channel, and raise/handle/bubble semantics.
//!
//! Dispatch is fully synchronous. `raise_event` returns only after every
//! listener it reaches (including listeners on sibling components reached
//! through the root) has run. An event raised from inside a listener is
//! processed to completion on the same call stack, so deep chains consume
//! stack frames; the configurable nesting limit is a soft limit that only
//! emits a warning.

use crate::channel::Channel;
use crate::component::RootId;
use crate::error::{BusError, Result};
use crate::event::{BusEvent, Bubbled};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Default soft limit on nested `raise_event` frames
pub const DEFAULT_MAX_EVENT_DEPTH: usize = 64;

/// Listener callback for a regular event
pub type Listener<E> = Rc<dyn Fn(&E) -> Result<()>>;

/// Listener callback for the `eventRaised` meta-event
pub type BubbledListener<E> = Rc<dyn Fn(&Bubbled<E>) -> Result<()>>;

thread_local! {
    static DISPATCH_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Number of `raise_event` frames currently live on this thread
pub fn dispatch_depth() -> usize {
    DISPATCH_DEPTH.with(Cell::get)
}

struct DepthGuard;

impl DepthGuard {
    fn enter() -> (Self, usize) {
        let depth = DISPATCH_DEPTH.with(|d| {
            let depth = d.get() + 1;
            d.set(depth);
            depth
        });
        (Self, depth)
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DISPATCH_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

/// Per-component event registry and dispatcher
pub struct EventEmitter<E: BusEvent> {
    name: String,
    channel: Channel,
    listeners: RefCell<HashMap<E::Kind, Vec<Listener<E>>>>,
    bubbled_listeners: RefCell<Vec<BubbledListener<E>>>,
    root: Cell<Option<RootId>>,
    max_depth: Cell<usize>,
}

impl<E: BusEvent> EventEmitter<E> {
    /// Create an emitter on the default channel
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_channel(name, Channel::default())
    }

    /// Create an emitter on the given channel
    ///
    /// The channel is fixed for the lifetime of the emitter.
    pub fn with_channel(name: impl Into<String>, channel: impl Into<Channel>) -> Self {
        Self {
            name: name.into(),
            channel: channel.into(),
            listeners: RefCell::new(HashMap::new()),
            bubbled_listeners: RefCell::new(Vec::new()),
            root: Cell::new(None),
            max_depth: Cell::new(DEFAULT_MAX_EVENT_DEPTH),
        }
    }

    /// Set the soft nesting limit above which dispatch logs a warning
    ///
    /// Attaching to a root replaces it with the root's limit.
    #[must_use]
    pub fn with_max_depth(self, max_depth: usize) -> Self {
        self.max_depth.set(max_depth);
        self
    }

    /// Component name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Channel this emitter belongs to
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Soft nesting limit
    pub fn max_depth(&self) -> usize {
        self.max_depth.get()
    }

    /// Root this emitter has been attached to, if any
    pub fn root(&self) -> Option<RootId> {
        self.root.get()
    }

    /// Record attachment to a root and adopt its nesting limit
    ///
    /// A component can be attached at most once.
    pub(crate) fn attach(&self, root: RootId, max_depth: usize) -> Result<()> {
        if let Some(existing) = self.root.get() {
            return Err(BusError::AlreadyAttached {
                component: self.name.clone(),
                root: existing,
            });
        }
        self.root.set(Some(root));
        self.max_depth.set(max_depth);
        debug!(component = %self.name, channel = %self.channel, root = %root, "Attached to root");
        Ok(())
    }

    /// Register a listener for an event kind
    ///
    /// Listeners run in registration order. Registering the same callback
    /// twice means it runs twice.
    pub fn add_event_listener<F>(&self, kind: E::Kind, listener: F)
    where
        F: Fn(&E) -> Result<()> + 'static,
    {
        self.listeners
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push(Rc::new(listener));
    }

    /// Register a listener for the `eventRaised` meta-event
    pub fn on_bubbled<F>(&self, listener: F)
    where
        F: Fn(&Bubbled<E>) -> Result<()> + 'static,
    {
        self.bubbled_listeners.borrow_mut().push(Rc::new(listener));
    }

    /// Number of listeners registered for a kind
    pub fn listener_count(&self, kind: &E::Kind) -> usize {
        self.listeners.borrow().get(kind).map_or(0, Vec::len)
    }

    /// Whether any listener is registered for a kind
    pub fn has_listeners(&self, kind: &E::Kind) -> bool {
        self.listener_count(kind) > 0
    }

    /// Deliver an event to this emitter's listeners
    ///
    /// Does nothing unless `channel` is this emitter's channel. The first
    /// listener error stops delivery and is returned as-is.
    pub fn handle_event(&self, event: &E, channel: &Channel) -> Result<()> {
        if *channel != self.channel {
            trace!(
                component = %self.name,
                event = %event.kind(),
                channel = %channel,
                own_channel = %self.channel,
                "Dropping event from another channel"
            );
            return Ok(());
        }

        // Snapshot so listeners may register listeners or raise re-entrantly
        let listeners = match self.listeners.borrow().get(&event.kind()) {
            Some(listeners) => listeners.clone(),
            None => return Ok(()),
        };

        for listener in listeners {
            listener(event)?;
        }
        Ok(())
    }

    /// Deliver an `eventRaised` meta-event to this emitter's bubbled listeners
    pub fn handle_bubbled(&self, bubbled: &Bubbled<E>, channel: &Channel) -> Result<()> {
        if *channel != self.channel {
            return Ok(());
        }

        let listeners = self.bubbled_listeners.borrow().clone();
        for listener in listeners {
            listener(bubbled)?;
        }
        Ok(())
    }

    /// Raise an event
    ///
    /// Handles the event locally on this emitter's channel, then raises it
    /// once more wrapped as the `eventRaised` meta-event.
    pub fn raise_event(&self, event: E) -> Result<()> {
        let (_guard, depth) = DepthGuard::enter();
        let max_depth = self.max_depth.get();
        if depth > max_depth {
            warn!(
                component = %self.name,
                event = %event.kind(),
                depth,
                max_depth,
                "Event nesting exceeds soft limit"
            );
        }

        trace!(component = %self.name, channel = %self.channel, event = %event.kind(), depth, "Raising event");

        self.handle_event(&event, &self.channel)?;
        self.raise_bubbled(Bubbled::new(event, self.channel.clone()))
    }

    /// Raise an `eventRaised` meta-event directly
    ///
    /// Dispatches to this emitter's bubbled listeners only. A meta-event is
    /// never bubbled again.
    pub fn raise_bubbled(&self, bubbled: Bubbled<E>) -> Result<()> {
        self.handle_bubbled(&bubbled, &self.channel)
    }
}

impl<E: BusEvent> fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("name", &self.name)
            .field("channel", &self.channel)
            .field("listener_kinds", &self.listeners.borrow().len())
            .field("bubbled_listeners", &self.bubbled_listeners.borrow().len())
            .field("root", &self.root.get())
            .field("max_depth", &self.max_depth.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum TestEvent {
        Play,
        Volume(u8),
    }

    impl BusEvent for TestEvent {
        type Kind = &'static str;

        fn kind(&self) -> Self::Kind {
            match self {
                TestEvent::Play => "play",
                TestEvent::Volume(_) => "volumeChanged",
            }
        }
    }

    fn recorder() -> Rc<RefCell<Vec<String>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let emitter = EventEmitter::<TestEvent>::new("Player");
        let log = recorder();

        for tag in ["first", "second", "third"] {
            let log = Rc::clone(&log);
            emitter.add_event_listener("play", move |_| {
                log.borrow_mut().push(tag.to_string());
                Ok(())
            });
        }

        emitter.raise_event(TestEvent::Play).unwrap();
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn duplicate_listeners_all_run() {
        let emitter = EventEmitter::<TestEvent>::new("Player");
        let count = Rc::new(Cell::new(0));

        let listener = {
            let count = Rc::clone(&count);
            move |_: &TestEvent| -> Result<()> {
                count.set(count.get() + 1);
                Ok(())
            }
        };
        emitter.add_event_listener("play", listener.clone());
        emitter.add_event_listener("play", listener);

        emitter.raise_event(TestEvent::Play).unwrap();
        assert_eq!(count.get(), 2);
        assert_eq!(emitter.listener_count(&"play"), 2);
    }

    #[test]
    fn handle_event_ignores_other_channels() {
        let emitter = EventEmitter::<TestEvent>::with_channel("Player", "left");
        let count = Rc::new(Cell::new(0));
        {
            let count = Rc::clone(&count);
            emitter.add_event_listener("play", move |_| {
                count.set(count.get() + 1);
                Ok(())
            });
        }

        emitter
            .handle_event(&TestEvent::Play, &Channel::from("right"))
            .unwrap();
        assert_eq!(count.get(), 0);

        emitter
            .handle_event(&TestEvent::Play, &Channel::from("left"))
            .unwrap();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn unhandled_event_succeeds() {
        let emitter = EventEmitter::<TestEvent>::new("Player");
        assert!(emitter.raise_event(TestEvent::Volume(3)).is_ok());
        assert!(!emitter.has_listeners(&"volumeChanged"));
    }

    #[test]
    fn raise_bubbles_exactly_once() {
        let emitter = EventEmitter::<TestEvent>::with_channel("Player", "left");
        let bubbled = Rc::new(RefCell::new(Vec::new()));
        {
            let bubbled = Rc::clone(&bubbled);
            emitter.on_bubbled(move |b| {
                bubbled.borrow_mut().push(b.clone());
                Ok(())
            });
        }

        emitter.raise_event(TestEvent::Volume(7)).unwrap();

        let bubbled = bubbled.borrow();
        assert_eq!(bubbled.len(), 1);
        assert_eq!(bubbled[0].event, TestEvent::Volume(7));
        assert_eq!(bubbled[0].channel.as_str(), "left");
    }

    #[test]
    fn raising_meta_event_does_not_recurse() {
        let emitter = EventEmitter::<TestEvent>::new("Player");
        let bubbled_count = Rc::new(Cell::new(0));
        let play_count = Rc::new(Cell::new(0));
        {
            let bubbled_count = Rc::clone(&bubbled_count);
            emitter.on_bubbled(move |_| {
                bubbled_count.set(bubbled_count.get() + 1);
                Ok(())
            });
            let play_count = Rc::clone(&play_count);
            emitter.add_event_listener("play", move |_| {
                play_count.set(play_count.get() + 1);
                Ok(())
            });
        }

        emitter
            .raise_bubbled(Bubbled::new(TestEvent::Play, Channel::default()))
            .unwrap();

        assert_eq!(bubbled_count.get(), 1);
        // The wrapped event is payload, not a delivery
        assert_eq!(play_count.get(), 0);
    }

    #[test]
    fn listener_error_stops_delivery() {
        let emitter = EventEmitter::<TestEvent>::new("Player");
        let reached = Rc::new(Cell::new(false));
        let bubbled = Rc::new(Cell::new(false));

        emitter.add_event_listener("play", |_| Err(BusError::listener("decoder exploded")));
        {
            let reached = Rc::clone(&reached);
            emitter.add_event_listener("play", move |_| {
                reached.set(true);
                Ok(())
            });
            let bubbled = Rc::clone(&bubbled);
            emitter.on_bubbled(move |_| {
                bubbled.set(true);
                Ok(())
            });
        }

        let err = emitter.raise_event(TestEvent::Play).unwrap_err();
        assert_eq!(err.to_string(), "decoder exploded");
        assert!(!reached.get());
        assert!(!bubbled.get());
        assert_eq!(dispatch_depth(), 0);
    }

    #[test]
    fn reentrant_raise_completes_before_outer_returns() {
        let emitter = Rc::new(EventEmitter::<TestEvent>::new("Player"));
        let log = recorder();
        {
            let weak = Rc::downgrade(&emitter);
            let play_log = Rc::clone(&log);
            emitter.add_event_listener("play", move |_| {
                play_log.borrow_mut().push("play".into());
                if let Some(emitter) = weak.upgrade() {
                    emitter.raise_event(TestEvent::Volume(50))?;
                }
                play_log.borrow_mut().push("play done".into());
                Ok(())
            });
            let volume_log = Rc::clone(&log);
            emitter.add_event_listener("volumeChanged", move |_| {
                volume_log
                    .borrow_mut()
                    .push(format!("volume at depth {}", dispatch_depth()));
                Ok(())
            });
        }

        emitter.raise_event(TestEvent::Play).unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["play", "volume at depth 2", "play done"]
        );
        assert_eq!(dispatch_depth(), 0);
    }

    #[test]
    fn listener_added_during_dispatch_misses_current_event() {
        let emitter = Rc::new(EventEmitter::<TestEvent>::new("Player"));
        let late_calls = Rc::new(Cell::new(0));
        {
            let weak = Rc::downgrade(&emitter);
            let late_calls = Rc::clone(&late_calls);
            emitter.add_event_listener("play", move |_| {
                if let Some(emitter) = weak.upgrade() {
                    let late_calls = Rc::clone(&late_calls);
                    emitter.add_event_listener("play", move |_| {
                        late_calls.set(late_calls.get() + 1);
                        Ok(())
                    });
                }
                Ok(())
            });
        }

        emitter.raise_event(TestEvent::Play).unwrap();
        assert_eq!(late_calls.get(), 0);

        emitter.raise_event(TestEvent::Play).unwrap();
        assert_eq!(late_calls.get(), 1);
    }

    #[test]
    fn nesting_past_soft_limit_still_completes() {
        let emitter = Rc::new(EventEmitter::<TestEvent>::new("Player").with_max_depth(1));
        let volumes = recorder();
        {
            let weak = Rc::downgrade(&emitter);
            emitter.add_event_listener("play", move |_| match weak.upgrade() {
                Some(emitter) => emitter.raise_event(TestEvent::Volume(3)),
                None => Ok(()),
            });
            let weak = Rc::downgrade(&emitter);
            let volumes = Rc::clone(&volumes);
            emitter.add_event_listener("volumeChanged", move |event| {
                let TestEvent::Volume(level) = event else {
                    return Ok(());
                };
                volumes.borrow_mut().push(format!("{level}@{}", dispatch_depth()));
                match weak.upgrade() {
                    Some(emitter) if *level > 0 => emitter.raise_event(TestEvent::Volume(level - 1)),
                    _ => Ok(()),
                }
            });
        }

        emitter.raise_event(TestEvent::Play).unwrap();
        assert_eq!(*volumes.borrow(), vec!["3@2", "2@3", "1@4", "0@5"]);
        assert_eq!(dispatch_depth(), 0);
    }

    #[test]
    fn attaching_adopts_root_limit() {
        let emitter = EventEmitter::<TestEvent>::new("Player");
        assert_eq!(emitter.max_depth(), DEFAULT_MAX_EVENT_DEPTH);

        emitter.attach(RootId::new(), 2).unwrap();
        assert_eq!(emitter.max_depth(), 2);
    }

    #[test]
    fn attach_only_once() {
        let emitter = EventEmitter::<TestEvent>::new("Player");
        let first = RootId::new();
        emitter.attach(first, DEFAULT_MAX_EVENT_DEPTH).unwrap();
        assert_eq!(emitter.root(), Some(first));

        let err = emitter.attach(RootId::new(), DEFAULT_MAX_EVENT_DEPTH).unwrap_err();
        assert!(matches!(err, BusError::AlreadyAttached { root, .. } if root == first));
    }
}
