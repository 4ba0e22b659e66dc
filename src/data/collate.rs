//! Batch assembly: variable-length examples into rectangular tensors.
//!
//! ```text
//! examples            batch tensors
//!   audio [a_i]   →   audio     [B, max_a]      F32, zero-padded
//!                     audio_len [B]             U32
//!   text  [t_i]   →   text      [B, max_t + 2]  U32, boundary space token
//!                                               each side, then pad id
//!                     text_mask [B, max_t + 2]  U8, 1 over t_i + 2 positions
//!   dur   [t_i]   →   dur       [B, max_t + 2]  U32, zero-padded
//! ```
//!
//! `text`, `text_mask` and `dur` always share one shape; the duration head
//! and its loss rely on that alignment.

use candle_core::{DType, Device, Tensor};

use crate::data::dataset::Example;
use crate::{Error, Result};

/// One assembled mini-batch.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Zero-padded waveforms, `[B, max_audio] F32`.
    pub audio: Tensor,
    /// Waveform sample counts, `[B] U32`.
    pub audio_len: Tensor,
    /// Boundary-wrapped, padded token ids, `[B, T] U32`.
    pub text: Tensor,
    /// Validity mask, `[B, T] U8`: 1 over tokens plus both boundaries.
    pub text_mask: Tensor,
    /// Ground-truth durations, `[B, T] U32`, zero-padded to the text width.
    pub dur: Tensor,
}

/// Stateless batch assembler.
///
/// Holds only read-only configuration, so one collator may serve several
/// data-loading workers concurrently on disjoint batches.
#[derive(Debug, Clone)]
pub struct Collator {
    pad_id: u32,
    space_id: u32,
    device: Device,
}

impl Collator {
    /// `space_id` wraps every transcript as the boundary token; `pad_id`
    /// fills text rows to the batch width. The device is explicit — batches
    /// are allocated where the caller will consume them.
    pub fn new(pad_id: u32, space_id: u32, device: Device) -> Self {
        Self {
            pad_id,
            space_id,
            device,
        }
    }

    /// Assemble a non-empty list of examples into a [`Batch`].
    pub fn collate(&self, examples: &[Example]) -> Result<Batch> {
        if examples.is_empty() {
            return Err(Error::Shape("cannot collate an empty batch".into()));
        }
        for (i, ex) in examples.iter().enumerate() {
            if ex.dur.len() != ex.text.len() {
                return Err(Error::Shape(format!(
                    "example {i}: {} durations for {} tokens",
                    ex.dur.len(),
                    ex.text.len()
                )));
            }
        }

        let batch = examples.len();
        let max_audio = examples.iter().map(|e| e.audio.len()).max().unwrap_or(0);
        // Two boundary space tokens per transcript.
        let max_text = examples.iter().map(|e| e.text.len()).max().unwrap_or(0) + 2;

        let mut audio = Vec::with_capacity(batch * max_audio);
        let mut audio_len = Vec::with_capacity(batch);
        let mut text = Vec::with_capacity(batch * max_text);
        let mut text_mask = Vec::with_capacity(batch * max_text);
        let mut dur = Vec::with_capacity(batch * max_text);

        for ex in examples {
            audio.extend_from_slice(&ex.audio);
            audio.extend(std::iter::repeat(0.0f32).take(max_audio - ex.audio.len()));
            audio_len.push(ex.audio.len() as u32);

            let valid = ex.text.len() + 2;
            text.push(self.space_id);
            text.extend_from_slice(&ex.text);
            text.push(self.space_id);
            text.extend(std::iter::repeat(self.pad_id).take(max_text - valid));

            text_mask.extend(std::iter::repeat(1u8).take(valid));
            text_mask.extend(std::iter::repeat(0u8).take(max_text - valid));

            dur.extend_from_slice(&ex.dur);
            dur.extend(std::iter::repeat(0u32).take(max_text - ex.dur.len()));
        }

        let audio = Tensor::from_vec(audio, (batch, max_audio), &self.device)?;
        let audio_len = Tensor::from_vec(audio_len, batch, &self.device)?;
        let text = Tensor::from_vec(text, (batch, max_text), &self.device)?;
        let text_mask = Tensor::from_vec(text_mask, (batch, max_text), &self.device)?;
        let dur = Tensor::from_vec(dur, (batch, max_text), &self.device)?;

        if text.dims() != text_mask.dims() || text.dims() != dur.dims() {
            return Err(Error::Shape(format!(
                "text {:?} vs mask {:?} vs dur {:?}",
                text.dims(),
                text_mask.dims(),
                dur.dims()
            )));
        }

        Ok(Batch {
            audio,
            audio_len,
            text,
            text_mask,
            dur,
        })
    }
}
