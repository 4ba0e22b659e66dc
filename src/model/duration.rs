//! Per-token duration predictor.
//!
//! ```text
//! text [B, T] ──embed──→ [B, T, d_emb] ──transpose──→ [B, d_emb, T]
//!    → DurationEncoder → [B, d_enc, T]
//!    → Conv1d(k=1)     → [B, d_out, T] ──transpose──→ pred [B, T, d_out]
//! pred_len [B] = per-row sum of text_mask
//! ```
//!
//! Predictions live in log-duration space (see [`crate::loss`]).

use candle_core::{DType, Module, Tensor, D};
use candle_nn::VarBuilder;

use crate::config::FasterSpeechConfig;
use crate::model::encoder::DurationEncoder;
use crate::{Error, Result};

/// FasterSpeech duration model.
pub struct FasterSpeech {
    emb: candle_nn::Embedding,
    pad_id: u32,
    encoder: DurationEncoder,
    out: candle_nn::Conv1d,
}

impl FasterSpeech {
    pub fn new(cfg: &FasterSpeechConfig, vb: VarBuilder) -> Result<Self> {
        if cfg.pad_id as usize >= cfg.n_vocab {
            return Err(Error::Config(format!(
                "pad_id {} outside vocabulary of size {}",
                cfg.pad_id, cfg.n_vocab
            )));
        }

        let emb = candle_nn::embedding(cfg.n_vocab, cfg.d_emb, vb.pp("emb"))?;
        let encoder = DurationEncoder::load(vb.pp("encoder"), cfg.d_emb, &cfg.encoder)?;

        let out_cfg = candle_nn::Conv1dConfig {
            padding: 0,
            stride: 1,
            dilation: 1,
            groups: 1,
            ..Default::default()
        };
        let out = candle_nn::conv1d(cfg.encoder.d_out()?, cfg.d_out, 1, out_cfg, vb.pp("out"))?;

        Ok(Self {
            emb,
            pad_id: cfg.pad_id,
            encoder,
            out,
        })
    }

    /// Embed token ids, forcing pad positions to the zero vector.
    ///
    /// Zeroing the looked-up rows keeps the pad embedding out of both the
    /// forward signal and the gradient.
    fn embed_masked(&self, text: &Tensor) -> Result<Tensor> {
        let embedded = self.emb.forward(text)?; // [B, T, d_emb]
        let not_pad = text
            .ne(self.pad_id)?
            .to_dtype(DType::F32)?
            .unsqueeze(D::Minus1)?; // [B, T, 1]
        Ok(embedded.broadcast_mul(&not_pad)?)
    }

    /// Predict per-token log durations.
    ///
    /// - `text`: `[B, T] U32` token ids
    /// - `text_mask`: `[B, T] U8`, 1 over valid positions
    /// - `dur`: must be `None` — duration-based expansion is an explicit
    ///   unsupported operation, not a silent no-op
    ///
    /// Returns `(pred [B, T, d_out] F32, pred_len [B] U32)`.
    pub fn forward(
        &self,
        text: &Tensor,
        text_mask: &Tensor,
        dur: Option<&Tensor>,
    ) -> Result<(Tensor, Tensor)> {
        if dur.is_some() {
            return Err(Error::Unsupported(
                "durations expansion is not implemented yet".into(),
            ));
        }

        let (_batch, t) = text.dims2()?;
        let mask_f = text_mask.to_dtype(DType::F32)?;
        let pred_len = mask_f.sum(D::Minus1)?.to_dtype(DType::U32)?; // [B]

        let xs = self.embed_masked(text)?.transpose(1, 2)?; // [B, d_emb, T]
        let conv_mask = mask_f.unsqueeze(1)?; // [B, 1, T]
        let encoded = self.encoder.forward(&xs, Some(&conv_mask))?;

        let t_out = encoded.dim(2)?;
        if t_out != t {
            return Err(Error::Shape(format!(
                "encoder resized time axis: {t} -> {t_out}"
            )));
        }

        let pred = self.out.forward(&encoded)?.transpose(1, 2)?; // [B, T, d_out]
        Ok((pred, pred_len))
    }
}
