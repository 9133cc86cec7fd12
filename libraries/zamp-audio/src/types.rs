//! Core types for player events

use serde::{Deserialize, Serialize};

/// A playable track
///
/// Two tracks are the same track when url, title and artist all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioTrack {
    /// Location of the audio file
    pub url: String,

    /// Track title
    #[serde(default = "unknown")]
    pub title: String,

    /// Track artist
    #[serde(default = "unknown")]
    pub artist: String,
}

impl AudioTrack {
    /// Placeholder for a missing title or artist
    pub const UNKNOWN: &'static str = "Unknown";

    /// Create a track with unknown title and artist
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: unknown(),
            artist: unknown(),
        }
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the artist
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = artist.into();
        self
    }
}

fn unknown() -> String {
    AudioTrack::UNKNOWN.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_unknown() {
        let track: AudioTrack = serde_json::from_str(r#"{"url": "/music/intro.mp3"}"#).unwrap();
        assert_eq!(track, AudioTrack::new("/music/intro.mp3"));
        assert_eq!(track.title, "Unknown");
        assert_eq!(track.artist, "Unknown");
    }

    #[test]
    fn identity_covers_all_fields() {
        let track = AudioTrack::new("/music/a.mp3")
            .with_title("Opening")
            .with_artist("Band");

        assert_eq!(track.clone(), track);
        assert_ne!(track.clone().with_artist("Other Band"), track);
        assert_ne!(AudioTrack::new("/music/b.mp3").with_title("Opening").with_artist("Band"), track);
    }
}
