//! Dataset: tokenized transcripts zipped with waveforms and cached durations.
//!
//! The duration cache is produced by an external alignment pass and holds one
//! integer `.npy` array per utterance, keyed by the audio file stem. Each
//! array gives per-token frame counts aligned 1:1 with the tokenized
//! transcript.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ndarray::Array1;
use ndarray_npy::read_npy;

use crate::config::DataLayerConfig;
use crate::data::manifest::{filter_by_duration, read_manifest};
use crate::{audio, Error, Result};

/// Amplitude floor for silence trimming, roughly -60dB.
const TRIM_THRESHOLD: f32 = 1e-3;

/// Ordered character vocabulary with id lookup.
#[derive(Debug, Clone)]
pub struct Labels {
    chars: Vec<char>,
    ids: HashMap<char, u32>,
    space_id: u32,
}

impl Labels {
    /// Build a vocabulary from an ordered character set.
    ///
    /// The set must contain `' '`: the space id doubles as the boundary
    /// token when batches are assembled.
    pub fn new(chars: Vec<char>) -> Result<Self> {
        let mut ids = HashMap::with_capacity(chars.len());
        for (i, &c) in chars.iter().enumerate() {
            if ids.insert(c, i as u32).is_some() {
                return Err(Error::Config(format!("duplicate label {c:?}")));
            }
        }
        let space_id = *ids
            .get(&' ')
            .ok_or_else(|| Error::Config("labels must contain ' '".into()))?;
        Ok(Self {
            chars,
            ids,
            space_id,
        })
    }

    /// Id of the space character.
    pub fn space_id(&self) -> u32 {
        self.space_id
    }

    /// Vocabulary size.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Tokenize a transcript per character.
    ///
    /// With `normalize`, the text is lowercased first. Characters outside
    /// the vocabulary are dropped. `bos_id`/`eos_id` wrap the result if set.
    pub fn tokenize(
        &self,
        text: &str,
        normalize: bool,
        bos_id: Option<u32>,
        eos_id: Option<u32>,
    ) -> Vec<u32> {
        let mut tokens = Vec::with_capacity(text.len() + 2);
        if let Some(bos) = bos_id {
            tokens.push(bos);
        }
        if normalize {
            tokens.extend(
                text.chars()
                    .flat_map(|c| c.to_lowercase())
                    .filter_map(|c| self.ids.get(&c).copied()),
            );
        } else {
            tokens.extend(text.chars().filter_map(|c| self.ids.get(&c).copied()));
        }
        if let Some(eos) = eos_id {
            tokens.push(eos);
        }
        tokens
    }
}

/// One training item: waveform, token ids, per-token frame counts.
#[derive(Debug, Clone)]
pub struct Example {
    /// Mono waveform samples; empty when audio loading is disabled.
    pub audio: Vec<f32>,
    /// Tokenized transcript.
    pub text: Vec<u32>,
    /// Ground-truth duration (frames) per token, same length as `text`.
    pub dur: Vec<u32>,
}

struct Entry {
    audio_path: PathBuf,
    durs_path: PathBuf,
    tokens: Vec<u32>,
}

/// Manifest-backed dataset. Transcripts are tokenized up front; waveforms
/// and duration arrays are read lazily per example.
pub struct FasterSpeechDataset {
    entries: Vec<Entry>,
    labels: Labels,
    sample_rate: u32,
    trim_silence: bool,
    load_audio: bool,
}

impl FasterSpeechDataset {
    /// Load manifest, apply duration filters, tokenize transcripts.
    pub fn load(cfg: &DataLayerConfig) -> Result<Self> {
        let labels = Labels::new(cfg.labels.clone())?;
        let manifest_dir = cfg
            .manifest_filepath
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let entries = read_manifest(&cfg.manifest_filepath)?;
        let entries = filter_by_duration(entries, cfg.min_duration, cfg.max_duration);

        let mut out = Vec::with_capacity(entries.len());
        for entry in &entries {
            let audio_path = if entry.audio_filepath.is_absolute() {
                entry.audio_filepath.clone()
            } else {
                manifest_dir.join(&entry.audio_filepath)
            };
            let durs_path = cfg.durs_dir.join(format!("{}.npy", entry.utt_id()?));
            let tokens = labels.tokenize(
                &entry.text,
                cfg.normalize_transcripts,
                cfg.bos_id,
                cfg.eos_id,
            );
            out.push(Entry {
                audio_path,
                durs_path,
                tokens,
            });
        }

        tracing::info!("dataset: {} examples ready", out.len());
        Ok(Self {
            entries: out,
            labels,
            sample_rate: cfg.sample_rate,
            trim_silence: cfg.trim_silence,
            load_audio: cfg.load_audio,
        })
    }

    /// Number of examples.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Vocabulary in use.
    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Materialize one example: waveform + tokens + cached durations.
    pub fn get(&self, index: usize) -> Result<Example> {
        let entry = self
            .entries
            .get(index)
            .ok_or_else(|| Error::Manifest(format!("example index {index} out of range")))?;

        let audio = if self.load_audio {
            let (samples, sr) = audio::read_wav_mono(&entry.audio_path)?;
            if sr != self.sample_rate {
                return Err(Error::Audio(format!(
                    "{}: sample rate {sr} != expected {}",
                    entry.audio_path.display(),
                    self.sample_rate
                )));
            }
            if self.trim_silence {
                audio::trim_silence(&samples, TRIM_THRESHOLD).to_vec()
            } else {
                samples
            }
        } else {
            Vec::new()
        };

        let durs: Array1<i64> = read_npy(&entry.durs_path).map_err(|e| {
            Error::Manifest(format!("{}: {e}", entry.durs_path.display()))
        })?;
        let dur = durs.iter().map(|&d| d.max(0) as u32).collect();

        Ok(Example {
            audio,
            text: entry.tokens.clone(),
            dur,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_labels;
    use ndarray_npy::write_npy;
    use std::fs::File;
    use std::io::Write;

    #[test]
    fn test_labels_space_id() {
        let labels = Labels::new(default_labels()).unwrap();
        assert_eq!(labels.space_id(), 0);
        assert_eq!(labels.len(), 28);
    }

    #[test]
    fn test_labels_require_space() {
        let err = Labels::new(vec!['a', 'b']).unwrap_err();
        assert!(err.to_string().contains("must contain"));
    }

    #[test]
    fn test_labels_reject_duplicates() {
        assert!(Labels::new(vec![' ', 'a', 'a']).is_err());
    }

    #[test]
    fn test_tokenize_normalized() {
        let labels = Labels::new(default_labels()).unwrap();
        // "Ab!" → lowercase → 'a', 'b'; '!' dropped
        let tokens = labels.tokenize("Ab!", true, None, None);
        assert_eq!(tokens, vec![1, 2]);
    }

    #[test]
    fn test_tokenize_bos_eos() {
        let labels = Labels::new(default_labels()).unwrap();
        let tokens = labels.tokenize("a", false, Some(90), Some(91));
        assert_eq!(tokens, vec![90, 1, 91]);
    }

    #[test]
    fn test_dataset_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let wav_path = dir.path().join("utt1.wav");
        crate::audio::write_wav(&wav_path, &[0.1f32; 160], 16_000).unwrap();

        let durs_dir = dir.path().join("durs");
        std::fs::create_dir(&durs_dir).unwrap();
        let durs = Array1::from(vec![2i64, 5, 1]);
        write_npy(durs_dir.join("utt1.npy"), &durs).unwrap();

        let manifest = dir.path().join("manifest.json");
        let mut f = File::create(&manifest).unwrap();
        writeln!(
            f,
            r#"{{"audio_filepath": "utt1.wav", "duration": 1.0, "text": "cat"}}"#
        )
        .unwrap();

        let cfg = DataLayerConfig {
            manifest_filepath: manifest,
            durs_dir,
            ..DataLayerConfig::default()
        };
        let dataset = FasterSpeechDataset::load(&cfg).unwrap();
        assert_eq!(dataset.len(), 1);

        let example = dataset.get(0).unwrap();
        assert_eq!(example.audio.len(), 160);
        assert_eq!(example.text.len(), 3); // c, a, t
        assert_eq!(example.dur, vec![2, 5, 1]);
    }

    #[test]
    fn test_dataset_skip_audio() {
        let dir = tempfile::tempdir().unwrap();
        let durs_dir = dir.path().join("durs");
        std::fs::create_dir(&durs_dir).unwrap();
        write_npy(durs_dir.join("utt1.npy"), &Array1::from(vec![1i64])).unwrap();

        let manifest = dir.path().join("manifest.json");
        let mut f = File::create(&manifest).unwrap();
        writeln!(
            f,
            r#"{{"audio_filepath": "utt1.wav", "duration": 1.0, "text": "a"}}"#
        )
        .unwrap();

        let cfg = DataLayerConfig {
            manifest_filepath: manifest,
            durs_dir,
            load_audio: false,
            ..DataLayerConfig::default()
        };
        // No wav on disk: must still load since audio is skipped.
        let dataset = FasterSpeechDataset::load(&cfg).unwrap();
        let example = dataset.get(0).unwrap();
        assert!(example.audio.is_empty());
        assert_eq!(example.text, vec![1]);
    }
}
