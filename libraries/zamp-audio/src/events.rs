//! Player Events
//!
//! The closed set of events carried by a ZAmp bus. Components agree on
//! these names and payloads instead of referencing each other:
//! - Pipeline lifecycle (media loaded, context activated, pipeline created)
//! - Segment contributions from processing components
//! - Player, playlist, equalizer and storage notifications
//!
//! Anything outside the contract travels as [`AmpEvent::Custom`].

use crate::graph::{ContextHandle, NodeHandle};
use crate::segment::Weighting;
use crate::types::AudioTrack;
use std::fmt;
use zamp_core::BusEvent;

/// Events carried by the player bus
#[derive(Debug, Clone)]
pub enum AmpEvent {
    /// The player's media element is available as a graph source node
    MediaElementLoaded { source: NodeHandle },

    /// A processing context is ready for use
    AudioContextActivated { context: ContextHandle },

    /// The pipeline has been built; segments can now be contributed
    AudioPipelineCreated { context: ContextHandle },

    /// A component offers a segment for insertion
    AudioPipelineSegmentCreated {
        first_node: NodeHandle,
        last_node: NodeHandle,
        weighting: Weighting,
    },

    /// The user interacted with the page (used to resume a suspended context)
    UserGesture,

    /// A new track was selected
    TrackChanged { track: AudioTrack },

    /// The current track played to its end
    TrackEnded { track: Option<AudioTrack> },

    /// Playback started
    AudioPlaying {
        /// Position in seconds
        position: f64,
    },

    /// Playback paused
    AudioPaused {
        /// Position in seconds
        position: f64,
    },

    /// Play was requested without a track
    NoTrackSelected,

    /// The host refused to start playback without a user gesture
    AutoPlayBlocked,

    /// Volume changed
    VolumeChanged {
        /// New level (0.0 to 1.0)
        level: f64,
    },

    VolumeMuted,

    VolumeUnmuted {
        /// Level restored after unmuting (0.0 to 1.0)
        level: f64,
    },

    /// Playback position moved
    PositionChanged {
        /// Position in seconds
        position: f64,
    },

    PlaylistLoaded { tracks: Vec<AudioTrack> },

    PlaylistUpdated { tracks: Vec<AudioTrack> },

    /// The last track of a non-looping playlist finished
    PlaylistFinished,

    ShuffleChanged { enabled: bool },

    LoopChanged { enabled: bool },

    /// An equalizer band was adjusted
    FrequencyChanged { frequency: f32, gain: f32 },

    /// An equalizer preset was applied
    PresetApplied { preset: String },

    /// Preference storage switched to another provider
    StorageProviderChanged { provider: String },

    /// Event outside the built-in contract
    Custom {
        name: String,
        payload: serde_json::Value,
    },
}

impl AmpEvent {
    /// Offer a segment spanning `first_node` to `last_node`
    pub fn segment_created(first_node: NodeHandle, last_node: NodeHandle, weighting: Weighting) -> Self {
        Self::AudioPipelineSegmentCreated {
            first_node,
            last_node,
            weighting,
        }
    }

    /// Create an event outside the built-in contract
    pub fn custom(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::Custom {
            name: name.into(),
            payload,
        }
    }
}

/// Payload-free discriminant of [`AmpEvent`], used as the listener key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    MediaElementLoaded,
    AudioContextActivated,
    AudioPipelineCreated,
    AudioPipelineSegmentCreated,
    UserGesture,
    TrackChanged,
    TrackEnded,
    AudioPlaying,
    AudioPaused,
    NoTrackSelected,
    AutoPlayBlocked,
    VolumeChanged,
    VolumeMuted,
    VolumeUnmuted,
    PositionChanged,
    PlaylistLoaded,
    PlaylistUpdated,
    PlaylistFinished,
    ShuffleChanged,
    LoopChanged,
    FrequencyChanged,
    PresetApplied,
    StorageProviderChanged,
    Custom(String),
}

impl EventKind {
    /// Every built-in kind
    pub const BUILT_IN: [EventKind; 23] = [
        Self::MediaElementLoaded,
        Self::AudioContextActivated,
        Self::AudioPipelineCreated,
        Self::AudioPipelineSegmentCreated,
        Self::UserGesture,
        Self::TrackChanged,
        Self::TrackEnded,
        Self::AudioPlaying,
        Self::AudioPaused,
        Self::NoTrackSelected,
        Self::AutoPlayBlocked,
        Self::VolumeChanged,
        Self::VolumeMuted,
        Self::VolumeUnmuted,
        Self::PositionChanged,
        Self::PlaylistLoaded,
        Self::PlaylistUpdated,
        Self::PlaylistFinished,
        Self::ShuffleChanged,
        Self::LoopChanged,
        Self::FrequencyChanged,
        Self::PresetApplied,
        Self::StorageProviderChanged,
    ];

    /// Wire name of the event
    pub fn as_str(&self) -> &str {
        match self {
            Self::MediaElementLoaded => "mediaElementLoaded",
            Self::AudioContextActivated => "audioContextActivated",
            Self::AudioPipelineCreated => "audioPipelineCreated",
            Self::AudioPipelineSegmentCreated => "audioPipelineSegmentCreated",
            Self::UserGesture => "userGesture",
            Self::TrackChanged => "trackChanged",
            Self::TrackEnded => "trackEnded",
            Self::AudioPlaying => "audioPlaying",
            Self::AudioPaused => "audioPaused",
            Self::NoTrackSelected => "noTrackSelected",
            Self::AutoPlayBlocked => "autoPlayBlocked",
            Self::VolumeChanged => "volumeChanged",
            Self::VolumeMuted => "volumeMuted",
            Self::VolumeUnmuted => "volumeUnmuted",
            Self::PositionChanged => "positionChanged",
            Self::PlaylistLoaded => "playlistLoaded",
            Self::PlaylistUpdated => "playlistUpdated",
            Self::PlaylistFinished => "playlistFinished",
            Self::ShuffleChanged => "shuffleChanged",
            Self::LoopChanged => "loopChanged",
            Self::FrequencyChanged => "frequencyChanged",
            Self::PresetApplied => "presetApplied",
            Self::StorageProviderChanged => "storageProviderChanged",
            Self::Custom(name) => name.as_str(),
        }
    }

    /// Kind for a wire name; unknown names become `Custom`
    pub fn from_name(name: &str) -> Self {
        Self::BUILT_IN
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .unwrap_or_else(|| Self::Custom(name.to_string()))
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BusEvent for AmpEvent {
    type Kind = EventKind;

    fn kind(&self) -> EventKind {
        match self {
            Self::MediaElementLoaded { .. } => EventKind::MediaElementLoaded,
            Self::AudioContextActivated { .. } => EventKind::AudioContextActivated,
            Self::AudioPipelineCreated { .. } => EventKind::AudioPipelineCreated,
            Self::AudioPipelineSegmentCreated { .. } => EventKind::AudioPipelineSegmentCreated,
            Self::UserGesture => EventKind::UserGesture,
            Self::TrackChanged { .. } => EventKind::TrackChanged,
            Self::TrackEnded { .. } => EventKind::TrackEnded,
            Self::AudioPlaying { .. } => EventKind::AudioPlaying,
            Self::AudioPaused { .. } => EventKind::AudioPaused,
            Self::NoTrackSelected => EventKind::NoTrackSelected,
            Self::AutoPlayBlocked => EventKind::AutoPlayBlocked,
            Self::VolumeChanged { .. } => EventKind::VolumeChanged,
            Self::VolumeMuted => EventKind::VolumeMuted,
            Self::VolumeUnmuted { .. } => EventKind::VolumeUnmuted,
            Self::PositionChanged { .. } => EventKind::PositionChanged,
            Self::PlaylistLoaded { .. } => EventKind::PlaylistLoaded,
            Self::PlaylistUpdated { .. } => EventKind::PlaylistUpdated,
            Self::PlaylistFinished => EventKind::PlaylistFinished,
            Self::ShuffleChanged { .. } => EventKind::ShuffleChanged,
            Self::LoopChanged { .. } => EventKind::LoopChanged,
            Self::FrequencyChanged { .. } => EventKind::FrequencyChanged,
            Self::PresetApplied { .. } => EventKind::PresetApplied,
            Self::StorageProviderChanged { .. } => EventKind::StorageProviderChanged,
            Self::Custom { name, .. } => EventKind::Custom(name.clone()),
        }
    }
}
