//! ZAmp Core - Component Event Bus
//!
//! Channel-scoped, bubbling publish/subscribe for loosely-coupled player
//! components.
//!
//! This crate provides:
//! - `EventEmitter`: per-component listener registry with raise/handle/bubble
//! - `Channel`: isolation between player instances sharing one page
//! - `Component`: the trait every player component implements
//! - `Amp`: the root aggregator that fans bubbled events out to siblings
//!
//! # Architecture
//!
//! Everything is single-threaded and synchronous. `raise_event` returns only
//! after every reachable listener has run; there is no queue.
//!
//! # Example
//!
//! ```rust
//! use zamp_core::{Amp, BusEvent, EventEmitter};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! #[derive(Debug)]
//! enum PlayerEvent {
//!     VolumeChanged(u8),
//! }
//!
//! impl BusEvent for PlayerEvent {
//!     type Kind = &'static str;
//!
//!     fn kind(&self) -> Self::Kind {
//!         "volumeChanged"
//!     }
//! }
//!
//! let amp = Amp::<PlayerEvent>::new();
//! let player = amp.add_component(Rc::new(EventEmitter::<PlayerEvent>::new("AudioPlayer"))).unwrap();
//! let visualiser = amp.add_component(Rc::new(EventEmitter::<PlayerEvent>::new("Visualiser"))).unwrap();
//!
//! let heard = Rc::new(Cell::new(0));
//! let seen = Rc::clone(&heard);
//! visualiser.add_event_listener("volumeChanged", move |event| {
//!     let PlayerEvent::VolumeChanged(level) = event;
//!     seen.set(*level);
//!     Ok(())
//! });
//!
//! player.raise_event(PlayerEvent::VolumeChanged(80)).unwrap();
//! assert_eq!(heard.get(), 80);
//! ```

#![forbid(unsafe_code)]

mod amp;
mod channel;
mod component;
mod config;
mod emitter;
mod error;
mod event;

// Public exports
pub use amp::Amp;
pub use channel::Channel;
pub use component::{Component, ComponentHandle, ComponentId, RootId};
pub use crate::config::BusConfig;
pub use emitter::{dispatch_depth, BubbledListener, EventEmitter, Listener, DEFAULT_MAX_EVENT_DEPTH};
pub use error::{BusError, ListenerError, Result};
pub use event::{Bubbled, BusEvent};
