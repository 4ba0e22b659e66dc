//! Data layer for FasterSpeech training.
//!
//! ## Components
//!
//! - [`manifest`] — JSON-lines manifest parsing and duration filtering
//! - [`dataset`] — label vocabulary, tokenization, duration cache, examples
//! - [`collate`] — batch assembly: padding, boundary tokens, validity masks
//! - [`loader`] — epoch iteration: shuffle / batch / drop-last

pub mod collate;
pub mod dataset;
pub mod loader;
pub mod manifest;

pub use collate::{Batch, Collator};
pub use dataset::{Example, FasterSpeechDataset, Labels};
pub use loader::FasterSpeechDataLayer;
pub use manifest::ManifestEntry;
