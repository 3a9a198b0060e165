//! Subsampled level pyramid for zoomable waveform redraws.
//!
//! Samples are converted once to a 0..1 display level on a dB scale, then
//! halved repeatedly. A redraw at any zoom picks the coarsest level that is
//! still at least as fine as the requested bin width.

use loopscope_core::defaults::{LEVEL_FLOOR_DB, MAX_PYRAMID_FACTOR};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Widest view a single render pass produces.
pub const MAX_RENDER_COLUMNS: usize = 8192;

/// Map a sample to a display level: 0 at the dB floor, 1 at full scale.
#[inline]
pub fn display_level(sample: f32) -> f32 {
    let magnitude = sample.abs();
    if magnitude <= 0.0 {
        return 0.0;
    }
    let db = 20.0 * magnitude.log10();
    (1.0 + db / LEVEL_FLOOR_DB).max(0.0)
}

/// Display levels of one channel at power-of-two subsampling factors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelPyramid {
    /// Subsampling factor → levels at that resolution.
    levels: BTreeMap<u32, Vec<f32>>,
}

impl LevelPyramid {
    /// Build the pyramid for `samples`, from factor 1 up to the maximum factor.
    pub fn build(samples: &[f32]) -> Self {
        let mut levels = BTreeMap::new();
        let mut current: Vec<f32> = samples.iter().map(|&s| display_level(s)).collect();
        let mut factor = 1u32;
        while factor <= MAX_PYRAMID_FACTOR {
            let next = halve(&current);
            levels.insert(factor, current);
            current = next;
            factor *= 2;
        }
        Self { levels }
    }

    /// Number of source samples the pyramid was built from.
    pub fn source_len(&self) -> usize {
        self.levels.get(&1).map_or(0, Vec::len)
    }

    /// Coarsest level whose factor does not exceed `samples_per_bin`.
    pub fn level_for(&self, samples_per_bin: f32) -> Option<(u32, &[f32])> {
        self.levels
            .range(..=samples_per_bin.floor().max(0.0) as u32)
            .next_back()
            .map(|(factor, levels)| (*factor, levels.as_slice()))
    }

    /// Level for display column `column`, using the nearest stored value.
    ///
    /// `samples_offset` is the source position of column 0. Returns `None`
    /// when the column falls outside the data or no level fits the zoom.
    /// The position just past the last value is in range and draws as silence.
    pub fn render_column(&self, column: usize, samples_per_bin: f32, samples_offset: f32) -> Option<f32> {
        let (factor, levels) = self.level_for(samples_per_bin)?;
        let position = (column as f32 + samples_offset / samples_per_bin) * samples_per_bin / factor as f32;
        if position < 0.0 || position > levels.len() as f32 {
            return None;
        }
        let nearest = (position.round() as usize).min(levels.len());
        Some(levels.get(nearest).copied().unwrap_or(0.0))
    }

    /// Levels for `width` consecutive columns, capped at [`MAX_RENDER_COLUMNS`].
    pub fn render(&self, width: usize, samples_per_bin: f32, samples_offset: f32) -> Vec<Option<f32>> {
        (0..width.min(MAX_RENDER_COLUMNS))
            .map(|col| self.render_column(col, samples_per_bin, samples_offset))
            .collect()
    }
}

/// Average adjacent pairs; an odd trailing value is dropped.
fn halve(levels: &[f32]) -> Vec<f32> {
    levels
        .chunks_exact(2)
        .map(|pair| (pair[0] + pair[1]) / 2.0)
        .collect()
}
