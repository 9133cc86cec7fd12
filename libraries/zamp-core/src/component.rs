//! Component Trait
//!
//! Base interface every player component implements. A component owns an
//! [`EventEmitter`] and exposes a lifecycle hook that the root calls once
//! the component has been attached.

use crate::channel::Channel;
use crate::emitter::EventEmitter;
use crate::error::Result;
use crate::event::BusEvent;
use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;
use uuid::Uuid;

/// Unique identifier of a root aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootId(Uuid);

impl RootId {
    /// Generate a fresh root identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RootId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RootId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Position of a component within its root, assigned at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(usize);

impl ComponentId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Registration index
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Base trait for all player components
///
/// # Implementation Requirements
/// All components must:
/// 1. Own an `EventEmitter` and return it from `emitter()`
/// 2. Implement `as_any()` so the root's name lookup can be downcast
/// 3. Optionally override `initialise()` for work that must happen once attached
pub trait Component<E: BusEvent>: Any {
    /// The component's event emitter
    fn emitter(&self) -> &EventEmitter<E>;

    /// Component name, used for lookup within one root
    fn name(&self) -> &str {
        self.emitter().name()
    }

    /// Channel the component belongs to
    fn channel(&self) -> &Channel {
        self.emitter().channel()
    }

    /// Lifecycle hook invoked by the root after attachment
    fn initialise(&self) -> Result<()> {
        Ok(())
    }

    /// Get a reference to self as Any for downcasting
    fn as_any(&self) -> &dyn Any;
}

impl<E: BusEvent> Component<E> for EventEmitter<E> {
    fn emitter(&self) -> &EventEmitter<E> {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Typed handle to a component, returned when it is added to a root
pub struct ComponentHandle<C> {
    id: ComponentId,
    component: Rc<C>,
}

impl<C> ComponentHandle<C> {
    pub(crate) fn new(id: ComponentId, component: Rc<C>) -> Self {
        Self { id, component }
    }

    /// Registration id within the root
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Shared reference to the component
    pub fn rc(&self) -> &Rc<C> {
        &self.component
    }

    /// Unwrap into the shared component
    pub fn into_rc(self) -> Rc<C> {
        self.component
    }
}

impl<C> Clone for ComponentHandle<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            component: Rc::clone(&self.component),
        }
    }
}

impl<C> Deref for ComponentHandle<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.component
    }
}

impl<C: fmt::Debug> fmt::Debug for ComponentHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentHandle")
            .field("id", &self.id)
            .field("component", &self.component)
            .finish()
    }
}
