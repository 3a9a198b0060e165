//! Loopscope Display - Display preparation engine
//!
//! Turns per-channel loop audio and MIDI snapshots into a time-aligned,
//! binned summary for a multi-track timeline view.
//!
//! Architecture:
//! - `Alignment`: Shared origin, extent and bin grid for all channels
//! - `binning`: Per-bin transients and magnitude for one audio channel
//! - `midi`: Note rebasing and rescaling into display units
//! - `assemble`: Per-channel outputs merged into a response
//! - `LevelPyramid`: dB-scaled subsampled levels for fast zoomed redraws
//! - `DisplayWorker`: Background threads answering requests by id
//! - `DisplayEngine`: Top-level orchestrator

pub mod alignment;
pub mod assemble;
pub mod binning;
pub mod levels;
pub mod midi;
pub mod worker;

pub use alignment::{Alignment, BinGrid, ChannelSpan};
pub use levels::LevelPyramid;
pub use worker::{prepare_async, DisplayWorker, RequestTracker, WorkerConfig, WorkerReply};

use assemble::{assemble_response, prepare_channel};
use loopscope_core::{
    ChannelId, ChannelOutput, DisplayConfig, DisplayRequest, DisplayResponse, Result,
};
use rayon::prelude::*;
use tracing::{debug, warn};

/// Display preparation engine.
///
/// Holds only configuration; every call to [`DisplayEngine::prepare`] is
/// independent, so one engine can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct DisplayEngine {
    config: DisplayConfig,
}

impl DisplayEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: DisplayConfig) -> Self {
        Self { config }
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    /// Prepare display data for every channel of `request`.
    ///
    /// Fails without partial output when the request is malformed.
    pub fn prepare(&self, request: &DisplayRequest) -> Result<DisplayResponse> {
        let alignment = match self.align(request) {
            Ok(alignment) => alignment,
            Err(e) => {
                warn!(request_id = request.request_id, error = %e, "Rejected display request");
                return Err(e);
            }
        };

        let grid = alignment.grid;
        let prepare = |((id, input), span): (&(ChannelId, _), &ChannelSpan)| {
            (id.clone(), prepare_channel(input, *span, grid, &self.config))
        };
        let outputs: Vec<(ChannelId, ChannelOutput)> = if self.config.parallel {
            request
                .channels_data
                .par_iter()
                .zip(alignment.spans.par_iter())
                .map(prepare)
                .collect()
        } else {
            request
                .channels_data
                .iter()
                .zip(alignment.spans.iter())
                .map(prepare)
                .collect()
        };

        debug!(
            request_id = request.request_id,
            channels = outputs.len(),
            n_bins = grid.n_bins,
            render_start_pos = alignment.shared_start,
            "Prepared display data"
        );

        Ok(assemble_response(request.request_id, &alignment, outputs))
    }

    /// Validate `request` and compute its shared axis.
    pub fn align(&self, request: &DisplayRequest) -> Result<Alignment> {
        request.validate()?;
        let lead_in = self.config.lead_in_samples(request.samples_per_bin)?;
        Alignment::compute(&request.channels_data, request.samples_per_bin, lead_in)
    }
}
