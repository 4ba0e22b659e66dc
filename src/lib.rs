//! FasterSpeech duration model training core in pure Rust.
//!
//! A candle-based implementation of the FasterSpeech duration predictor:
//! the data layer that pads and masks transcript/duration batches, the
//! embedding + convolutional-encoder model, and the masked log-duration
//! regression loss.
//!
//! ## Pipeline
//!
//! ```text
//! manifest + duration cache
//!         ↓
//! FasterSpeechDataLayer ──→ Batch { audio, audio_len, text, text_mask, dur }
//!         ↓
//! FasterSpeech ──→ (pred [B, T, 1], pred_len [B])
//!         ↓
//! FasterSpeechDurLoss ──→ scalar loss
//! ```
//!
//! Data flows strictly forward; every component is a stateless (or
//! construction-time-configured) transformation, so data-loading workers
//! can collate disjoint batches concurrently.
//!
//! ## Modules
//!
//! - [`audio`] — WAV loading, mono downmix, silence trimming
//! - [`data`] — manifest, dataset, batch assembly, epoch iteration
//! - [`model`] — duration predictor and its convolutional encoder
//! - [`loss`] — masked, length-normalized log-duration MSE

pub mod audio;
pub mod config;
pub mod data;
pub mod loss;
pub mod model;

mod error;

pub use config::{DataLayerConfig, FasterSpeechConfig};
pub use data::{Batch, Collator, FasterSpeechDataLayer};
pub use error::{Error, Result};
pub use loss::FasterSpeechDurLoss;
pub use model::FasterSpeech;
