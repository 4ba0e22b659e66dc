//! Model components for FasterSpeech.
//!
//! ## Components
//!
//! - [`encoder`] — convolutional residual sequence encoder over embedded text
//! - [`duration`] — per-token duration predictor (embedding → encoder → head)

pub mod duration;
pub mod encoder;

pub use duration::FasterSpeech;
pub use encoder::{DurationEncoder, DurationEncoderConfig, EncoderBlockConfig};
