//! Audio I/O utilities.
//!
//! Mono WAV loading and silence trimming for 16kHz training utterances.

mod wav;

pub use wav::{read_wav_mono, trim_silence, write_wav};
