//! Shared time axis for all channels of a request.
//!
//! Every channel is placed on one absolute axis (samples relative to the
//! loop start). The axis starts at or before zero and before every channel,
//! and is cut into bins of equal width.

use loopscope_core::{ChannelId, ChannelInput, LoopscopeError, Result};

/// Absolute extent of one channel's stored data, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSpan {
    pub start: i64,
    pub end: i64,
}

impl ChannelSpan {
    /// Extent of `input`. Fails when it does not fit on an `i64` axis.
    pub fn of(input: &ChannelInput) -> Result<Self> {
        Ok(Self {
            start: input.data_start()?,
            end: input.data_end()?,
        })
    }
}

/// Bin layout of the shared axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinGrid {
    /// Absolute position of the first sample of bin 0.
    pub origin: i64,
    pub n_bins: usize,
    pub samples_per_bin: i64,
}

impl BinGrid {
    /// Absolute `[start, end)` positions covered by `bin`.
    #[inline]
    pub fn bin_bounds(&self, bin: usize) -> (i64, i64) {
        let start = self.origin + bin as i64 * self.samples_per_bin;
        (start, start + self.samples_per_bin)
    }

    /// Samples of padding between the axis origin and `position`.
    #[inline]
    pub fn pre_padding(&self, position: i64) -> u64 {
        debug_assert!(position >= self.origin, "position {} left of origin {}", position, self.origin);
        position.abs_diff(self.origin)
    }
}

/// Result of aligning all channels of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    pub shared_start: i64,
    pub shared_end: i64,
    pub grid: BinGrid,
    /// One span per channel, in request order.
    pub spans: Vec<ChannelSpan>,
}

impl Alignment {
    /// Align `channels` on one axis, extended `lead_in` samples to the left.
    ///
    /// `samples_per_bin` must already be validated as positive.
    pub fn compute(
        channels: &[(ChannelId, ChannelInput)],
        samples_per_bin: i64,
        lead_in: i64,
    ) -> Result<Self> {
        let spans = channels
            .iter()
            .map(|(_, input)| ChannelSpan::of(input))
            .collect::<Result<Vec<_>>>()?;

        let earliest = spans.iter().map(|s| s.start).min().unwrap_or(0).min(0);
        let shared_start = earliest.checked_sub(lead_in).ok_or_else(|| {
            LoopscopeError::InvalidInput(format!(
                "lead-in of {} samples underflows the axis start {}",
                lead_in, earliest
            ))
        })?;
        let shared_end = spans.iter().map(|s| s.end).max().unwrap_or(0).max(0);

        let n_bins = if shared_end <= shared_start {
            0
        } else {
            let span = shared_end.checked_sub(shared_start).ok_or_else(|| {
                LoopscopeError::InvalidInput("channel extents overflow the display axis".into())
            })?;
            let n_bins = (span as u64).div_ceil(samples_per_bin as u64);
            // Every bin boundary must stay addressable
            let last_end = i64::try_from(n_bins)
                .ok()
                .and_then(|n| n.checked_mul(samples_per_bin))
                .and_then(|width| shared_start.checked_add(width));
            if last_end.is_none() {
                return Err(LoopscopeError::InvalidInput(format!(
                    "{} bins of {} samples overflow the display axis",
                    n_bins, samples_per_bin
                )));
            }
            usize::try_from(n_bins).map_err(|_| {
                LoopscopeError::InvalidInput(format!("{} samples is too many bins", span))
            })?
        };

        Ok(Self {
            shared_start,
            shared_end,
            grid: BinGrid {
                origin: shared_start,
                n_bins,
                samples_per_bin,
            },
            spans,
        })
    }

    #[inline]
    pub fn n_bins(&self) -> usize {
        self.grid.n_bins
    }
}
