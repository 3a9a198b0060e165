//! Per-channel output and response assembly.

use crate::alignment::{Alignment, BinGrid, ChannelSpan};
use crate::binning::reduce_channel;
use crate::midi::rescale_notes;
use loopscope_core::{
    ChannelId, ChannelInput, ChannelOutput, DisplayConfig, DisplayResponse, RequestId,
};

/// Build the display output for one channel.
///
/// Only reads the shared grid, so channels can be prepared in any order
/// or in parallel.
pub fn prepare_channel(
    input: &ChannelInput,
    span: ChannelSpan,
    grid: BinGrid,
    config: &DisplayConfig,
) -> ChannelOutput {
    let pre_padding = grid.pre_padding(span.start);

    let audio = input
        .data
        .audio()
        .map(|samples| reduce_channel(samples, span.start, grid, config.magnitude));

    let midi_notes = input
        .data
        .midi_notes()
        .filter(|notes| !notes.is_empty())
        .map(|notes| rescale_notes(notes, pre_padding, grid.samples_per_bin, config.midi_units));

    ChannelOutput {
        audio,
        midi_notes,
        included_pre_padding: pre_padding,
    }
}

/// Merge channel outputs into a response. `outputs` must be in request order.
pub fn assemble_response(
    request_id: RequestId,
    alignment: &Alignment,
    outputs: Vec<(ChannelId, ChannelOutput)>,
) -> DisplayResponse {
    DisplayResponse {
        request_id,
        samples_per_bin: alignment.grid.samples_per_bin,
        render_start_pos: alignment.shared_start,
        channels_data: outputs,
    }
}
