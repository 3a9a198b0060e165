//! MIDI note placement on the shared display axis.

use loopscope_core::{DisplayNote, MidiUnits, NoteEvent};

/// Shift notes by the channel's pre-padding and convert to display units.
///
/// Note positions are relative to the channel's own data, so adding the
/// pre-padding rebases them onto the render start. Bin units are left
/// fractional; the renderer interpolates within a bin.
pub fn rescale_notes(
    notes: &[NoteEvent],
    pre_padding: u64,
    samples_per_bin: i64,
    units: MidiUnits,
) -> Vec<DisplayNote> {
    let shift = pre_padding as f64;
    let scale = match units {
        MidiUnits::Bins => samples_per_bin as f64,
        MidiUnits::Samples => 1.0,
    };

    notes
        .iter()
        .map(|n| DisplayNote {
            start: (n.start as f64 + shift) / scale,
            end: (n.end as f64 + shift) / scale,
            note: n.note,
            channel: n.channel,
        })
        .collect()
}
