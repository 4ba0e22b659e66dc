//! Configuration for the FasterSpeech duration model and its data layer.
//!
//! Defaults follow the original FasterSpeech training recipe: a 28-character
//! Jasper-style label set, 16kHz audio, and a scalar duration head.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::encoder::DurationEncoderConfig;

/// Default character set: space, a-z, apostrophe.
pub fn default_labels() -> Vec<char> {
    let mut labels = vec![' '];
    labels.extend('a'..='z');
    labels.push('\'');
    labels
}

/// Duration predictor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FasterSpeechConfig {
    /// Vocabulary size of the text embedding table.
    pub n_vocab: usize,
    /// Text embedding dimension (encoder input features).
    pub d_emb: usize,
    /// Token id whose embedding is pinned to the zero vector.
    pub pad_id: u32,
    /// Output dimensionality of the prediction head (1 for scalar durations).
    pub d_out: usize,
    /// Convolutional sequence encoder stack.
    pub encoder: DurationEncoderConfig,
}

impl Default for FasterSpeechConfig {
    fn default() -> Self {
        Self {
            n_vocab: default_labels().len(),
            d_emb: 256,
            pad_id: 0,
            d_out: 1,
            encoder: DurationEncoderConfig::default(),
        }
    }
}

/// Data layer configuration.
///
/// Mirrors the recognized options of the original data layer: dataset
/// location, duration cache, tokenization, duration filters, and epoch
/// iteration flags. Fixed at construction, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataLayerConfig {
    /// Path to the JSON-lines manifest describing the dataset.
    pub manifest_filepath: PathBuf,
    /// Directory holding one `.npy` duration array per utterance.
    pub durs_dir: PathBuf,
    /// Ordered character vocabulary. Must contain `' '`.
    pub labels: Vec<char>,
    /// Number of examples per batch.
    pub batch_size: usize,
    /// Expected audio sample rate; files at any other rate are rejected.
    pub sample_rate: u32,
    /// Optional beginning-of-sequence token id appended during tokenization.
    pub bos_id: Option<u32>,
    /// Optional end-of-sequence token id appended during tokenization.
    pub eos_id: Option<u32>,
    /// Padding token id used when batching text.
    pub pad_id: u32,
    /// Drop manifest entries shorter than this many seconds.
    pub min_duration: f64,
    /// Drop manifest entries longer than this many seconds, if set.
    pub max_duration: Option<f64>,
    /// Lowercase transcripts before tokenization.
    pub normalize_transcripts: bool,
    /// Trim leading/trailing silence from waveforms.
    pub trim_silence: bool,
    /// Load waveforms at all; `false` yields empty audio tensors.
    pub load_audio: bool,
    /// Reshuffle example order every epoch.
    pub shuffle: bool,
    /// Drop the final short batch of an epoch.
    pub drop_last: bool,
    /// Seed for the epoch shuffle.
    pub shuffle_seed: u64,
}

impl Default for DataLayerConfig {
    fn default() -> Self {
        Self {
            manifest_filepath: PathBuf::new(),
            durs_dir: PathBuf::new(),
            labels: default_labels(),
            batch_size: 32,
            sample_rate: 16_000,
            bos_id: None,
            eos_id: None,
            pad_id: 0,
            min_duration: 0.1,
            max_duration: None,
            normalize_transcripts: true,
            trim_silence: false,
            load_audio: true,
            shuffle: true,
            drop_last: false,
            shuffle_seed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_labels() {
        let labels = default_labels();
        assert_eq!(labels.len(), 28);
        assert_eq!(labels[0], ' ');
        assert_eq!(labels[1], 'a');
        assert_eq!(labels[26], 'z');
        assert_eq!(labels[27], '\'');
    }

    #[test]
    fn test_default_model_config() {
        let cfg = FasterSpeechConfig::default();
        assert_eq!(cfg.n_vocab, 28);
        assert_eq!(cfg.d_out, 1);
        assert_eq!(cfg.pad_id, 0);
    }

    #[test]
    fn test_default_data_config() {
        let cfg = DataLayerConfig::default();
        assert_eq!(cfg.sample_rate, 16_000);
        assert!((cfg.min_duration - 0.1).abs() < f64::EPSILON);
        assert!(cfg.max_duration.is_none());
        assert!(cfg.shuffle);
        assert!(!cfg.drop_last);
    }
}
