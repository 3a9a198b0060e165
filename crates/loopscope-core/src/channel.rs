//! Per-channel input data: audio samples and/or MIDI notes at an offset.
//!
//! Positions are measured in samples relative to the loop start. A channel's
//! stored data begins at absolute position `-start_offset`.

use crate::error::{LoopscopeError, Result};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Opaque channel identifier, echoed unchanged from request to response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A MIDI note as stored in a channel, in sample positions relative to
/// the channel's own data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Note-on position (samples).
    pub start: i64,
    /// Note-off position (samples).
    pub end: i64,
    /// MIDI note number.
    pub note: u8,
    /// MIDI channel number.
    pub channel: u8,
}

impl NoteEvent {
    pub fn new(start: i64, end: i64, note: u8, channel: u8) -> Self {
        Self {
            start,
            end,
            note,
            channel,
        }
    }
}

/// The payload a channel carries. At least one kind of data is always present.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelData {
    AudioOnly(Vec<f32>),
    MidiOnly(Vec<NoteEvent>),
    Both {
        audio: Vec<f32>,
        midi_notes: Vec<NoteEvent>,
    },
}

impl ChannelData {
    /// Combine optional audio and MIDI parts. Returns `None` when both are absent.
    pub fn from_parts(audio: Option<Vec<f32>>, midi_notes: Option<Vec<NoteEvent>>) -> Option<Self> {
        match (audio, midi_notes) {
            (Some(audio), Some(midi_notes)) => Some(Self::Both { audio, midi_notes }),
            (Some(audio), None) => Some(Self::AudioOnly(audio)),
            (None, Some(notes)) => Some(Self::MidiOnly(notes)),
            (None, None) => None,
        }
    }

    pub fn audio(&self) -> Option<&[f32]> {
        match self {
            Self::AudioOnly(audio) | Self::Both { audio, .. } => Some(audio),
            Self::MidiOnly(_) => None,
        }
    }

    pub fn midi_notes(&self) -> Option<&[NoteEvent]> {
        match self {
            Self::MidiOnly(notes) => Some(notes),
            Self::Both { midi_notes, .. } => Some(midi_notes),
            Self::AudioOnly(_) => None,
        }
    }
}

/// One channel of a display request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawChannelInput")]
pub struct ChannelInput {
    pub data: ChannelData,
    /// Samples between the loop start and this channel's first stored sample,
    /// with the sign flipped: sample 0 sits at absolute position `-start_offset`.
    pub start_offset: i64,
}

impl ChannelInput {
    pub fn audio(samples: Vec<f32>, start_offset: i64) -> Self {
        Self {
            data: ChannelData::AudioOnly(samples),
            start_offset,
        }
    }

    pub fn midi(notes: Vec<NoteEvent>, start_offset: i64) -> Self {
        Self {
            data: ChannelData::MidiOnly(notes),
            start_offset,
        }
    }

    pub fn audio_and_midi(samples: Vec<f32>, notes: Vec<NoteEvent>, start_offset: i64) -> Self {
        Self {
            data: ChannelData::Both {
                audio: samples,
                midi_notes: notes,
            },
            start_offset,
        }
    }

    /// Absolute position of the channel's first stored sample.
    ///
    /// Fails when `start_offset` has no negation in `i64`.
    #[inline]
    pub fn data_start(&self) -> Result<i64> {
        self.start_offset.checked_neg().ok_or_else(|| {
            LoopscopeError::InvalidInput(format!(
                "start_offset {} is outside the display axis",
                self.start_offset
            ))
        })
    }

    /// Absolute position one past the channel's last stored data.
    ///
    /// Audio length wins when audio is present; otherwise the last note's end.
    pub fn data_end(&self) -> Result<i64> {
        let start = self.data_start()?;
        let length = match (self.data.audio(), self.data.midi_notes().and_then(|n| n.last())) {
            (Some(audio), _) => i64::try_from(audio.len()).map_err(|_| {
                LoopscopeError::InvalidInput(format!("{} audio samples is too many", audio.len()))
            })?,
            (None, Some(last)) => last.end,
            (None, None) => 0,
        };
        start.checked_add(length).ok_or_else(|| {
            LoopscopeError::InvalidInput(format!(
                "channel data of {} samples at {} overflows the display axis",
                length, start
            ))
        })
    }

    /// Check that the note list is sorted by start and every note has `end >= start`.
    pub fn validate_notes(&self, id: &ChannelId) -> Result<()> {
        let Some(notes) = self.data.midi_notes() else {
            return Ok(());
        };
        let malformed = |reason: String| LoopscopeError::MalformedNoteList {
            channel: id.to_string(),
            reason,
        };
        for (idx, note) in notes.iter().enumerate() {
            if note.end < note.start {
                return Err(malformed(format!(
                    "note {} ends at {} before it starts at {}",
                    idx, note.end, note.start
                )));
            }
        }
        for (idx, pair) in notes.windows(2).enumerate() {
            if pair[1].start < pair[0].start {
                return Err(malformed(format!(
                    "note {} starts at {} before preceding note at {}",
                    idx + 1,
                    pair[1].start,
                    pair[0].start
                )));
            }
        }
        Ok(())
    }
}

/// Wire shape of a channel: both payloads optional.
#[derive(Debug, Deserialize)]
pub(crate) struct RawChannelInput {
    #[serde(default)]
    audio: Option<Vec<f32>>,
    #[serde(default)]
    midi_notes: Option<Vec<NoteEvent>>,
    start_offset: i64,
}

impl RawChannelInput {
    /// Convert into a [`ChannelInput`], naming `id` if neither payload is present.
    pub(crate) fn into_input(self, id: &ChannelId) -> Result<ChannelInput> {
        let data = ChannelData::from_parts(self.audio, self.midi_notes).ok_or_else(|| {
            LoopscopeError::InvalidInput(format!("channel {} has neither audio nor midi_notes", id))
        })?;
        Ok(ChannelInput {
            data,
            start_offset: self.start_offset,
        })
    }
}

impl TryFrom<RawChannelInput> for ChannelInput {
    type Error = LoopscopeError;

    fn try_from(raw: RawChannelInput) -> Result<Self> {
        let data = ChannelData::from_parts(raw.audio, raw.midi_notes).ok_or_else(|| {
            LoopscopeError::InvalidInput("channel has neither audio nor midi_notes".into())
        })?;
        Ok(Self {
            data,
            start_offset: raw.start_offset,
        })
    }
}

impl Serialize for ChannelInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let audio = self.data.audio();
        let notes = self.data.midi_notes();
        let fields = 1 + usize::from(audio.is_some()) + usize::from(notes.is_some());
        let mut state = serializer.serialize_struct("ChannelInput", fields)?;
        if let Some(audio) = audio {
            state.serialize_field("audio", audio)?;
        }
        if let Some(notes) = notes {
            state.serialize_field("midi_notes", notes)?;
        }
        state.serialize_field("start_offset", &self.start_offset)?;
        state.end()
    }
}
