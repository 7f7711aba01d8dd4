//! Track and playlist values available to style strings.
//!
//! A [`MetadataContext`] is built fresh by the caller for each evaluation and is
//! only read by the compiler. Values are plain strings; the typed setters apply
//! the rules the player callbacks follow (`0` means "no value" for track number,
//! length and playlist counters) and the formatting the style text guide
//! documents (`M:SS` lengths, plain decimal counters).
//!
//! The callback payloads the player hands us for media and playlist events are
//! modeled by [`MediaEvent`] and [`PlaylistEvent`]; both translate into the
//! engine's line protocol.

use crate::rds::style::FieldKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current values for each field, absent when unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetadataContext {
    values: BTreeMap<FieldKind, String>,
}

impl MetadataContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MetadataContext::set`].
    pub fn with(mut self, kind: FieldKind, value: impl Into<String>) -> Self {
        self.set(kind, value);
        self
    }

    /// Set a value. An empty string clears the field.
    pub fn set(&mut self, kind: FieldKind, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            self.values.remove(&kind);
        } else {
            self.values.insert(kind, value);
        }
    }

    pub fn clear(&mut self, kind: FieldKind) {
        self.values.remove(&kind);
    }

    /// The value for `kind`, `None` when absent or empty.
    pub fn lookup(&self, kind: FieldKind) -> Option<&str> {
        self.values
            .get(&kind)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Track number; `0` means the file has none.
    pub fn set_track_number(&mut self, number: u32) {
        self.set_counter(FieldKind::TrackNumber, number);
    }

    /// Track length in whole seconds, stored as `M:SS`; `0` means unknown.
    pub fn set_track_length(&mut self, seconds: u64) {
        if seconds == 0 {
            self.clear(FieldKind::TrackLength);
        } else {
            self.set(FieldKind::TrackLength, format_track_length(seconds));
        }
    }

    /// 1-based item position in the main playlist section; `0` means none.
    pub fn set_playlist_position(&mut self, position: u32) {
        self.set_counter(FieldKind::PlaylistPosition, position);
    }

    /// Item count in the main playlist section; `0` means none.
    pub fn set_playlist_count(&mut self, count: u32) {
        self.set_counter(FieldKind::PlaylistCount, count);
    }

    /// Forget everything about the current track, keeping playlist counters.
    pub fn clear_track(&mut self) {
        for kind in [
            FieldKind::Title,
            FieldKind::Artist,
            FieldKind::Album,
            FieldKind::Genre,
            FieldKind::TrackNumber,
            FieldKind::TrackLength,
        ] {
            self.clear(kind);
        }
    }

    fn set_counter(&mut self, kind: FieldKind, value: u32) {
        if value == 0 {
            self.clear(kind);
        } else {
            self.set(kind, value.to_string());
        }
    }
}

/// Render a length in seconds as `M:SS`. Minutes are not wrapped into hours.
pub fn format_track_length(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Media callback payload sent by the player when a playlist item starts.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MediaEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    pub track: u32,
    /// Seconds.
    pub length: u64,
}

impl MediaEvent {
    /// Pauses and events carry no usable title or artist.
    pub fn is_blank(&self) -> bool {
        matches!(self.kind.as_str(), "" | "pause" | "event")
    }

    /// Engine commands for this event. Length is always last: it triggers the
    /// re-evaluation once all other values are in.
    pub fn to_commands(&self) -> Vec<String> {
        let (title, artist) = if self.is_blank() {
            ("", "")
        } else {
            (self.title.as_str(), self.artist.as_str())
        };
        vec![
            format!("T{}", single_line(title)),
            format!("A{}", single_line(artist)),
            format!("B{}", single_line(&self.album)),
            format!("G{}", single_line(&self.genre)),
            format!("N{}", self.track),
            format!("L{}", self.length),
        ]
    }
}

/// Playlist callback payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlaylistEvent {
    #[serde(rename = "Action")]
    pub action: String,
    #[serde(rename = "Section")]
    pub section: String,
    #[serde(rename = "name")]
    pub name: String,
    /// Item position within the section, 1-based.
    #[serde(rename = "currentEntry")]
    pub position: u32,
    #[serde(rename = "size")]
    pub count: u32,
}

impl PlaylistEvent {
    pub fn to_commands(&self) -> Vec<String> {
        let mut commands = Vec::new();
        match self.action.as_str() {
            "start" => commands.push("START".to_string()),
            "stop" | "" => commands.push("STOP".to_string()),
            _ => {}
        }
        if self.section == "MainPlaylist" {
            commands.push(format!("MAINLIST{}", single_line(&self.name)));
            commands.push(format!("C{}", self.count));
            commands.push(format!("P{}", self.position));
        }
        commands
    }
}

/// Values travel one per line; embedded line breaks would split a command.
fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_track_length() {
        assert_eq!(format_track_length(0), "0:00");
        assert_eq!(format_track_length(59), "0:59");
        assert_eq!(format_track_length(61), "1:01");
        assert_eq!(format_track_length(3725), "62:05");
    }

    #[test]
    fn test_empty_value_is_absent() {
        let ctx = MetadataContext::new().with(FieldKind::Title, "");
        assert_eq!(ctx.lookup(FieldKind::Title), None);
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_zero_counters_are_absent() {
        let mut ctx = MetadataContext::new();
        ctx.set_track_number(0);
        ctx.set_track_length(0);
        ctx.set_playlist_count(0);
        ctx.set_playlist_position(0);
        assert!(ctx.is_empty());

        ctx.set_track_number(7);
        ctx.set_track_length(185);
        ctx.set_playlist_count(12);
        ctx.set_playlist_position(3);
        assert_eq!(ctx.lookup(FieldKind::TrackNumber), Some("7"));
        assert_eq!(ctx.lookup(FieldKind::TrackLength), Some("3:05"));
        assert_eq!(ctx.lookup(FieldKind::PlaylistCount), Some("12"));
        assert_eq!(ctx.lookup(FieldKind::PlaylistPosition), Some("3"));
    }

    #[test]
    fn test_clear_track_keeps_playlist() {
        let mut ctx = MetadataContext::new()
            .with(FieldKind::Title, "Silent Night")
            .with(FieldKind::Artist, "Choir");
        ctx.set_playlist_count(4);
        ctx.clear_track();
        assert_eq!(ctx.lookup(FieldKind::Title), None);
        assert_eq!(ctx.lookup(FieldKind::PlaylistCount), Some("4"));
    }

    #[test]
    fn test_media_event_commands() {
        let event: MediaEvent = serde_json::from_str(
            r#"{"type":"both","title":"Jingle Bells","artist":"Band","track":2,"length":130}"#,
        )
        .expect("valid media json");
        assert_eq!(
            event.to_commands(),
            vec!["TJingle Bells", "ABand", "B", "G", "N2", "L130"]
        );
    }

    #[test]
    fn test_pause_blanks_title_and_artist() {
        let event: MediaEvent =
            serde_json::from_str(r#"{"type":"pause","title":"x","artist":"y"}"#)
                .expect("valid media json");
        assert_eq!(&event.to_commands()[..2], &["T", "A"]);
    }

    #[test]
    fn test_playlist_event_commands() {
        let event: PlaylistEvent = serde_json::from_str(
            r#"{"Action":"start","Section":"MainPlaylist","name":"Xmas","currentEntry":1,"size":9}"#,
        )
        .expect("valid playlist json");
        assert_eq!(
            event.to_commands(),
            vec!["START", "MAINLISTXmas", "C9", "P1"]
        );
    }
}
