//! Root aggregator
//!
//! An [`Amp`] is one player instance. It owns the ordered list of attached
//! components and re-broadcasts every event a component raises to all of its
//! siblings, so components coordinate without holding references to each
//! other.
//!
//! # Delivery
//!
//! ```text
//! component.raise_event(e)
//!   -> component listeners (own channel)
//!   -> eventRaised(e, channel)
//!        -> root listeners (if the root is on `channel`)
//!        -> every other attached component on `channel`, in attach order
//! ```
//!
//! Every component on the matching channel, the root included, observes each
//! raise exactly once. The raiser handles its own event first, so it is heard
//! ahead of siblings attached before it; the rest follow in attach order.
//!
//! The component list is snapshotted when fan-out starts,
//! so a component attached while an event is in flight does not receive it.

use crate::channel::Channel;
use crate::component::{Component, ComponentHandle, ComponentId, RootId};
use crate::config::BusConfig;
use crate::emitter::EventEmitter;
use crate::error::{BusError, Result};
use crate::event::{BusEvent, Bubbled};
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, info};

struct Entry<E: BusEvent> {
    id: ComponentId,
    component: Rc<dyn Component<E>>,
}

struct AmpInner<E: BusEvent> {
    id: RootId,
    emitter: EventEmitter<E>,
    components: RefCell<Vec<Entry<E>>>,
}

impl<E: BusEvent> AmpInner<E> {
    fn fan_out(&self, bubbled: &Bubbled<E>, origin: Option<ComponentId>) -> Result<()> {
        let targets: Vec<(ComponentId, Rc<dyn Component<E>>)> = self
            .components
            .borrow()
            .iter()
            .map(|entry| (entry.id, Rc::clone(&entry.component)))
            .collect();

        for (id, component) in targets {
            if Some(id) == origin {
                continue;
            }
            component
                .emitter()
                .handle_event(&bubbled.event, &bubbled.channel)?;
        }
        Ok(())
    }

    fn on_component_bubbled(&self, bubbled: &Bubbled<E>, origin: ComponentId) -> Result<()> {
        self.emitter.handle_event(&bubbled.event, &bubbled.channel)?;
        self.fan_out(bubbled, Some(origin))
    }
}

/// Root of a player instance
pub struct Amp<E: BusEvent> {
    inner: Rc<AmpInner<E>>,
}

impl<E: BusEvent> Amp<E> {
    /// Name of the root's own emitter
    pub const NAME: &'static str = "Amp";

    /// Create a root on the default channel
    pub fn new() -> Self {
        Self::with_config(&BusConfig::default())
    }

    /// Create a root from configuration
    pub fn with_config(config: &BusConfig) -> Self {
        let inner = Rc::new_cyclic(|weak: &Weak<AmpInner<E>>| {
            let emitter = EventEmitter::<E>::with_channel(Self::NAME, config.channel.as_str())
                .with_max_depth(config.max_event_depth);

            // Events raised on the root itself reach every component
            let weak = weak.clone();
            emitter.on_bubbled(move |bubbled| match weak.upgrade() {
                Some(inner) => inner.fan_out(bubbled, None),
                None => Ok(()),
            });

            AmpInner {
                id: RootId::new(),
                emitter,
                components: RefCell::new(Vec::new()),
            }
        });

        info!(root = %inner.id, channel = %inner.emitter.channel(), "Created amp");
        Self { inner }
    }

    /// Root identifier
    pub fn id(&self) -> RootId {
        self.inner.id
    }

    /// The root's own emitter
    pub fn emitter(&self) -> &EventEmitter<E> {
        &self.inner.emitter
    }

    /// Channel of the root's own emitter
    pub fn channel(&self) -> &Channel {
        self.inner.emitter.channel()
    }

    /// Raise an event from the root
    pub fn raise_event(&self, event: E) -> Result<()> {
        self.inner.emitter.raise_event(event)
    }

    /// Register a listener on the root
    pub fn add_event_listener<F>(&self, kind: E::Kind, listener: F)
    where
        F: Fn(&E) -> Result<()> + 'static,
    {
        self.inner.emitter.add_event_listener(kind, listener);
    }

    /// Attach a component and return a typed handle to it
    ///
    /// See [`Amp::add_dyn_component`].
    pub fn add_component<C: Component<E>>(&self, component: Rc<C>) -> Result<ComponentHandle<C>> {
        let erased: Rc<dyn Component<E>> = component.clone();
        let id = self.add_dyn_component(erased)?;
        Ok(ComponentHandle::new(id, component))
    }

    /// Attach a component
    ///
    /// 1. Marks the component as attached (`AlreadyAttached` if it already is)
    ///    and hands it the root's nesting limit
    /// 2. Appends it to the component list
    /// 3. Subscribes to its bubbled events for fan-out
    /// 4. Runs its `initialise()` hook
    ///
    /// If initialisation fails the component stays attached and the error is
    /// returned.
    pub fn add_dyn_component(&self, component: Rc<dyn Component<E>>) -> Result<ComponentId> {
        component
            .emitter()
            .attach(self.inner.id, self.inner.emitter.max_depth())?;

        let id = {
            let mut components = self.inner.components.borrow_mut();
            let id = ComponentId::new(components.len());
            components.push(Entry {
                id,
                component: Rc::clone(&component),
            });
            id
        };

        let weak = Rc::downgrade(&self.inner);
        component.emitter().on_bubbled(move |bubbled| match weak.upgrade() {
            Some(inner) => inner.on_component_bubbled(bubbled, id),
            None => Ok(()),
        });

        debug!(
            root = %self.inner.id,
            component = %component.name(),
            channel = %component.channel(),
            id = %id,
            "Added component"
        );

        component.initialise()?;
        Ok(id)
    }

    /// Component registered under `id`
    pub fn component(&self, id: ComponentId) -> Option<Rc<dyn Component<E>>> {
        self.inner
            .components
            .borrow()
            .get(id.index())
            .map(|entry| Rc::clone(&entry.component))
    }

    /// First component with the given name
    pub fn find_component(&self, name: &str) -> Result<Rc<dyn Component<E>>> {
        self.inner
            .components
            .borrow()
            .iter()
            .find(|entry| entry.component.name() == name)
            .map(|entry| Rc::clone(&entry.component))
            .ok_or_else(|| BusError::not_found(name))
    }

    /// Names of all attached components, in attach order
    pub fn component_names(&self) -> Vec<String> {
        self.inner
            .components
            .borrow()
            .iter()
            .map(|entry| entry.component.name().to_string())
            .collect()
    }

    /// Number of attached components
    pub fn len(&self) -> usize {
        self.inner.components.borrow().len()
    }

    /// Check if no components are attached
    pub fn is_empty(&self) -> bool {
        self.inner.components.borrow().is_empty()
    }
}

impl<E: BusEvent> Default for Amp<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: BusEvent> Component<E> for Amp<E> {
    fn emitter(&self) -> &EventEmitter<E> {
        &self.inner.emitter
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<E: BusEvent> fmt::Debug for Amp<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Amp")
            .field("id", &self.inner.id)
            .field("channel", self.inner.emitter.channel())
            .field("components", &self.component_names())
            .finish()
    }
}
