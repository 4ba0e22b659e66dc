//! JSON-lines dataset manifest.
//!
//! One record per line:
//!
//! ```text
//! {"audio_filepath": "wavs/utt_0001.wav", "duration": 3.41, "text": "the cat sat"}
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One manifest record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Path to the utterance waveform, absolute or manifest-relative.
    pub audio_filepath: PathBuf,
    /// Utterance length in seconds, as measured by the manifest author.
    pub duration: f64,
    /// Raw transcript.
    pub text: String,
}

impl ManifestEntry {
    /// Utterance identifier: the audio file stem. Keys the duration cache.
    pub fn utt_id(&self) -> Result<&str> {
        self.audio_filepath
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                Error::Manifest(format!("bad audio_filepath: {:?}", self.audio_filepath))
            })
    }
}

/// Read a JSON-lines manifest. Blank lines are skipped.
pub fn read_manifest(path: impl AsRef<Path>) -> Result<Vec<ManifestEntry>> {
    let file = File::open(path.as_ref())?;
    let mut entries = Vec::new();
    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: ManifestEntry = serde_json::from_str(&line).map_err(|e| {
            Error::Manifest(format!(
                "{}:{}: {e}",
                path.as_ref().display(),
                lineno + 1
            ))
        })?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Drop entries outside `[min_duration, max_duration]` seconds.
pub fn filter_by_duration(
    entries: Vec<ManifestEntry>,
    min_duration: f64,
    max_duration: Option<f64>,
) -> Vec<ManifestEntry> {
    let total = entries.len();
    let kept: Vec<_> = entries
        .into_iter()
        .filter(|e| e.duration >= min_duration && max_duration.map_or(true, |max| e.duration <= max))
        .collect();
    if kept.len() < total {
        tracing::info!(
            "duration filter: kept {}/{} manifest entries",
            kept.len(),
            total
        );
    }
    kept
}
