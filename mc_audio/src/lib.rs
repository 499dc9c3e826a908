//! Sample-accurate mixing of narration and incidental music for
//! Marketcast episodes.
//!
//! The mixer lays a music bed and a narration clip on a shared stereo
//! timeline: music starts first at a reduced level, ducks further while
//! the narration plays, swells back over the last seconds of narration,
//! and runs out at its base level. Everything is summed as f32 and
//! clamped on the way out to 16-bit PCM WAV.

mod mixer;
mod wav;

pub use mixer::{mix_episode, MixSettings};
pub use wav::{decode, duration_of, Clip, WavError};
