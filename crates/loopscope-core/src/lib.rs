//! Loopscope Core - Data model for loop display preparation
//!
//! This crate provides the types shared between the display engine and
//! its callers:
//! - Channel input (audio samples and/or MIDI notes at an offset)
//! - Request/response messages and their JSON wire form
//! - Display configuration
//! - The error type

pub mod channel;
pub mod config;
pub mod error;
pub mod message;

pub use channel::{ChannelData, ChannelId, ChannelInput, NoteEvent};
pub use config::{DisplayConfig, MagnitudeStat, MidiUnits};
pub use error::{LoopscopeError, Result};
pub use message::{
    AudioSummary, ChannelOutput, DisplayNote, DisplayRequest, DisplayResponse, RequestId,
};

/// Default tuning values.
pub mod defaults {
    /// Bins of lead-in margin before the earliest channel.
    pub const LEAD_IN_BINS: u32 = 50;

    /// Coarsest subsampling factor kept in a level pyramid.
    pub const MAX_PYRAMID_FACTOR: u32 = 2048;

    /// Levels below this many dB are drawn as silence.
    pub const LEVEL_FLOOR_DB: f32 = 45.0;

    /// Upper bound on display worker threads when none is configured.
    pub const MAX_WORKER_THREADS: usize = 4;
}
