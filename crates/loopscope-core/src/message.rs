//! Request and response messages exchanged with the display worker.
//!
//! Both serialize to JSON with channels as `[id, data]` pairs, in the order
//! the caller supplied them.

use crate::channel::{ChannelId, ChannelInput, RawChannelInput};
use crate::error::{LoopscopeError, Result};
use serde::{Deserialize, Serialize};

/// Correlation token echoed from request to response.
pub type RequestId = u64;

/// A request to prepare display data for a set of channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDisplayRequest")]
pub struct DisplayRequest {
    pub request_id: RequestId,
    /// Width of one bin in samples. Must be positive.
    pub samples_per_bin: i64,
    pub channels_data: Vec<(ChannelId, ChannelInput)>,
}

impl DisplayRequest {
    pub fn new(request_id: RequestId, samples_per_bin: i64) -> Self {
        Self {
            request_id,
            samples_per_bin,
            channels_data: Vec::new(),
        }
    }

    /// Append a channel, keeping insertion order.
    pub fn with_channel(mut self, id: impl Into<ChannelId>, input: ChannelInput) -> Self {
        self.channels_data.push((id.into(), input));
        self
    }

    /// Reject requests the engine cannot summarize faithfully.
    pub fn validate(&self) -> Result<()> {
        if self.samples_per_bin <= 0 {
            return Err(LoopscopeError::InvalidInput(format!(
                "samples_per_bin must be positive, got {}",
                self.samples_per_bin
            )));
        }
        for (id, input) in &self.channels_data {
            input.validate_notes(id)?;
        }
        Ok(())
    }

    /// Decode a request from JSON.
    ///
    /// Syntax and shape errors are `Serialization`; a channel carrying
    /// neither payload is `InvalidInput`.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let raw: RawDisplayRequest = serde_json::from_slice(data)
            .map_err(|e| LoopscopeError::Serialization(format!("Invalid display request: {}", e)))?;
        Self::try_from(raw)
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| LoopscopeError::Serialization(format!("Failed to encode request: {}", e)))
    }
}

/// Wire shape of a request, before channel payloads are checked.
#[derive(Debug, Deserialize)]
struct RawDisplayRequest {
    request_id: RequestId,
    samples_per_bin: i64,
    channels_data: Vec<(ChannelId, RawChannelInput)>,
}

impl TryFrom<RawDisplayRequest> for DisplayRequest {
    type Error = LoopscopeError;

    fn try_from(raw: RawDisplayRequest) -> Result<Self> {
        let channels_data = raw
            .channels_data
            .into_iter()
            .map(|(id, input)| {
                let input = input.into_input(&id)?;
                Ok((id, input))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            request_id: raw.request_id,
            samples_per_bin: raw.samples_per_bin,
            channels_data,
        })
    }
}

/// Per-bin audio summary for one channel. All three vectors share one length.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AudioSummary {
    /// Largest positive sample per bin, or 0.
    pub transient_positive: Vec<f64>,
    /// Most negative sample per bin, or 0.
    pub transient_negative: Vec<f64>,
    /// Magnitude per bin (mean absolute value unless configured otherwise).
    pub rms: Vec<f64>,
}

impl AudioSummary {
    /// A silent summary of `n_bins` bins.
    pub fn silent(n_bins: usize) -> Self {
        Self {
            transient_positive: vec![0.0; n_bins],
            transient_negative: vec![0.0; n_bins],
            rms: vec![0.0; n_bins],
        }
    }

    pub fn with_capacity(n_bins: usize) -> Self {
        Self {
            transient_positive: Vec::with_capacity(n_bins),
            transient_negative: Vec::with_capacity(n_bins),
            rms: Vec::with_capacity(n_bins),
        }
    }

    /// Number of bins.
    pub fn len(&self) -> usize {
        self.rms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rms.is_empty()
    }

    /// True when every statistic of every bin is zero.
    pub fn is_silent(&self) -> bool {
        self.transient_positive
            .iter()
            .chain(&self.transient_negative)
            .chain(&self.rms)
            .all(|v| *v == 0.0)
    }
}

/// A MIDI note placed on the shared display axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayNote {
    /// Start, in bins (or samples) from the render start.
    pub start: f64,
    /// End, in the same unit as `start`.
    pub end: f64,
    pub note: u8,
    pub channel: u8,
}

/// Display data for one channel.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChannelOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midi_notes: Option<Vec<DisplayNote>>,
    /// Samples of silence virtually prepended to align this channel.
    pub included_pre_padding: u64,
}

/// Prepared display data for every requested channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayResponse {
    pub request_id: RequestId,
    pub samples_per_bin: i64,
    /// Absolute sample position of bin 0. Never positive.
    pub render_start_pos: i64,
    pub channels_data: Vec<(ChannelId, ChannelOutput)>,
}

impl DisplayResponse {
    /// Look up a channel's output by id.
    pub fn channel(&self, id: &str) -> Option<&ChannelOutput> {
        self.channels_data
            .iter()
            .find(|(chan_id, _)| chan_id.as_str() == id)
            .map(|(_, output)| output)
    }

    /// Bin count shared by all audio summaries, if any channel carries audio.
    pub fn n_bins(&self) -> Option<usize> {
        self.channels_data
            .iter()
            .find_map(|(_, output)| output.audio.as_ref().map(AudioSummary::len))
    }

    pub fn from_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data)
            .map_err(|e| LoopscopeError::Serialization(format!("Invalid display response: {}", e)))
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| LoopscopeError::Serialization(format!("Failed to encode response: {}", e)))
    }
}
