//! Display preparation settings.

use crate::defaults;
use crate::error::{LoopscopeError, Result};
use serde::{Deserialize, Serialize};

/// Unit used for rescaled MIDI note positions in a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MidiUnits {
    /// Fractional bins relative to the render start.
    #[default]
    Bins,
    /// Samples relative to the render start.
    Samples,
}

/// Statistic written to the `rms` field of an audio summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MagnitudeStat {
    /// `Σ|x| / samples_per_bin`. The historical display scale.
    #[default]
    MeanAbsolute,
    /// `sqrt(Σx² / samples_per_bin)`.
    RootMeanSquare,
}

/// Configuration for the display engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Extra bins of silence placed before the earliest channel so a loop's
    /// start can be dragged left in the editor.
    pub lead_in_bins: u32,
    pub midi_units: MidiUnits,
    pub magnitude: MagnitudeStat,
    /// Reduce channels on the rayon pool.
    pub parallel: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            lead_in_bins: defaults::LEAD_IN_BINS,
            midi_units: MidiUnits::default(),
            magnitude: MagnitudeStat::default(),
            parallel: true,
        }
    }
}

impl DisplayConfig {
    /// Load a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data)
            .map_err(|e| LoopscopeError::Serialization(format!("Invalid display config: {}", e)))
    }

    /// Config with no lead-in margin. Handy for exact position checks.
    pub fn without_lead_in() -> Self {
        Self {
            lead_in_bins: 0,
            ..Self::default()
        }
    }

    /// Lead-in margin in samples for the given bin width.
    pub fn lead_in_samples(&self, samples_per_bin: i64) -> Result<i64> {
        i64::from(self.lead_in_bins)
            .checked_mul(samples_per_bin)
            .ok_or_else(|| {
                LoopscopeError::InvalidInput(format!(
                    "lead-in of {} bins overflows at {} samples per bin",
                    self.lead_in_bins, samples_per_bin
                ))
            })
    }
}
