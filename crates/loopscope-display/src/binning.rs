//! Per-bin audio reduction for waveform display.
//!
//! Generates positive/negative transients and a magnitude per bin over the
//! shared grid. Positions outside a channel's data read as silence.

use crate::alignment::BinGrid;
use loopscope_core::{AudioSummary, MagnitudeStat};

/// Running statistics for one bin.
#[derive(Debug, Clone, Copy, Default)]
struct BinAccumulator {
    positive: f64,
    negative: f64,
    abs_sum: f64,
    square_sum: f64,
}

impl BinAccumulator {
    #[inline]
    fn push(&mut self, sample: f32) {
        let s = sample as f64;
        if s > 0.0 {
            self.positive = self.positive.max(s);
        } else if s < 0.0 {
            self.negative = self.negative.min(s);
        }
        self.abs_sum += s.abs();
        self.square_sum += s * s;
    }

    #[inline]
    fn magnitude(&self, samples_per_bin: i64, stat: MagnitudeStat) -> f64 {
        let width = samples_per_bin as f64;
        match stat {
            MagnitudeStat::MeanAbsolute => self.abs_sum / width,
            MagnitudeStat::RootMeanSquare => (self.square_sum / width).sqrt(),
        }
    }
}

/// Reduce one channel's samples onto `grid`.
///
/// `data_start` is the absolute position of `samples[0]`. Padding samples
/// are zero and leave every accumulator unchanged, so only the overlap of
/// each bin with the data is scanned; the magnitude still divides by the
/// full bin width.
pub fn reduce_channel(
    samples: &[f32],
    data_start: i64,
    grid: BinGrid,
    stat: MagnitudeStat,
) -> AudioSummary {
    let mut summary = AudioSummary::with_capacity(grid.n_bins);
    let data_end = data_start.saturating_add(i64::try_from(samples.len()).unwrap_or(i64::MAX));

    for bin in 0..grid.n_bins {
        let (bin_start, bin_end) = grid.bin_bounds(bin);
        let lo = bin_start.max(data_start);
        let hi = bin_end.min(data_end);

        let mut acc = BinAccumulator::default();
        if lo < hi {
            let chunk = &samples[(lo - data_start) as usize..(hi - data_start) as usize];
            for &s in chunk {
                acc.push(s);
            }
        }

        summary.transient_positive.push(acc.positive);
        summary.transient_negative.push(acc.negative);
        summary.rms.push(acc.magnitude(grid.samples_per_bin, stat));
    }

    summary
}
