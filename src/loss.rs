//! Masked log-duration regression loss.
//!
//! Targets are `ln(dur_true + 1)` — a variance stabilizer for non-negative,
//! heavy-tailed frame counts. Predictions are taken as already living in
//! that log space. Squared error is zeroed at padded positions, then
//! reduced per the configured mode.

use candle_core::{DType, Tensor, D};

use crate::{Error, Result};

/// The only supported reduction mode.
pub const REDUCTION_TRUE_MEAN: &str = "true_mean";

/// Duration loss for the FasterSpeech model.
///
/// The reduction mode is kept as a string and validated when the loss is
/// computed, so a bad configuration surfaces at the first training step.
#[derive(Debug, Clone)]
pub struct FasterSpeechDurLoss {
    reduction: String,
}

impl Default for FasterSpeechDurLoss {
    fn default() -> Self {
        Self::new(REDUCTION_TRUE_MEAN)
    }
}

impl FasterSpeechDurLoss {
    pub fn new(reduction: impl Into<String>) -> Self {
        Self {
            reduction: reduction.into(),
        }
    }

    /// Compute the scalar loss.
    ///
    /// - `dur_true`: `[B, T] U32` frame counts
    /// - `dur_pred`: `[B, T, 1] F32` log-duration predictions
    /// - `text_mask`: `[B, T] U8`, 1 over valid positions
    ///
    /// `true_mean` normalizes each example by its own valid-position count
    /// before averaging over the batch, so long utterances do not dominate
    /// the way a flat elementwise mean would let them. Callers must supply
    /// at least one valid position per example; the collator's two boundary
    /// tokens guarantee that upstream.
    pub fn forward(
        &self,
        dur_true: &Tensor,
        dur_pred: &Tensor,
        text_mask: &Tensor,
    ) -> Result<Tensor> {
        let (_b, _t, d) = dur_pred.dims3()?;
        if d != 1 {
            return Err(Error::Shape(format!(
                "dur_pred must end in a singleton dim, got {:?}",
                dur_pred.dims()
            )));
        }
        let pred = dur_pred.squeeze(D::Minus1)?; // [B, T]

        let target = (dur_true.to_dtype(DType::F32)? + 1.0)?.log()?;
        let mask = text_mask.to_dtype(DType::F32)?;

        let loss = (pred - target)?.sqr()?;
        let loss = (loss * &mask)?;

        match self.reduction.as_str() {
            REDUCTION_TRUE_MEAN => {
                let per_example = (loss.sum(D::Minus1)? / mask.sum(D::Minus1)?)?;
                Ok(per_example.mean_all()?)
            }
            other => Err(Error::Config(format!("unknown reduction mode {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    fn tensors(
        dur: Vec<u32>,
        pred: Vec<f32>,
        mask: Vec<u8>,
        shape: (usize, usize),
    ) -> (Tensor, Tensor, Tensor) {
        let device = Device::Cpu;
        let dur_true = Tensor::from_vec(dur, shape, &device).unwrap();
        let dur_pred = Tensor::from_vec(pred, (shape.0, shape.1, 1), &device).unwrap();
        let text_mask = Tensor::from_vec(mask, shape, &device).unwrap();
        (dur_true, dur_pred, text_mask)
    }

    #[test]
    fn test_exact_prediction_zero_loss() {
        // dur_true = 0 → target ln(1) = 0; predicting 0 is exact.
        let (dur, pred, mask) = tensors(vec![0, 0], vec![0.0, 0.0], vec![1, 1], (1, 2));
        let loss = FasterSpeechDurLoss::default()
            .forward(&dur, &pred, &mask)
            .unwrap();
        assert_eq!(loss.to_scalar::<f32>().unwrap(), 0.0);
    }

    #[test]
    fn test_masked_positions_ignored() {
        // Garbage prediction at the padded position must not contribute.
        let (dur, pred, mask) = tensors(vec![0, 9], vec![0.0, 123.0], vec![1, 0], (1, 2));
        let loss = FasterSpeechDurLoss::default()
            .forward(&dur, &pred, &mask)
            .unwrap();
        assert_eq!(loss.to_scalar::<f32>().unwrap(), 0.0);
    }

    #[test]
    fn test_true_mean_normalizes_per_example() {
        // Example 0: one valid position, error 2² = 4 → mean 4.
        // Example 1: two valid positions, errors 1 each → mean 1.
        // true_mean = (4 + 1) / 2 = 2.5 (flat mean would give 2).
        let (dur, pred, mask) = tensors(
            vec![0, 0, 0, 0],
            vec![2.0, 0.0, 1.0, 1.0],
            vec![1, 0, 1, 1],
            (2, 2),
        );
        let loss = FasterSpeechDurLoss::default()
            .forward(&dur, &pred, &mask)
            .unwrap();
        assert!((loss.to_scalar::<f32>().unwrap() - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_log_space_target() {
        // dur_true = 2 → target ln(3); predicting ln(3) is exact.
        let target = 3.0f32.ln();
        let (dur, pred, mask) = tensors(vec![2], vec![target], vec![1], (1, 1));
        let loss = FasterSpeechDurLoss::default()
            .forward(&dur, &pred, &mask)
            .unwrap();
        assert!(loss.to_scalar::<f32>().unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_nonzero_residual_positive_loss() {
        let (dur, pred, mask) = tensors(vec![4, 1], vec![0.3, 0.9], vec![1, 1], (1, 2));
        let loss = FasterSpeechDurLoss::default()
            .forward(&dur, &pred, &mask)
            .unwrap();
        assert!(loss.to_scalar::<f32>().unwrap() > 0.0);
    }

    #[test]
    fn test_rejects_unknown_reduction() {
        let (dur, pred, mask) = tensors(vec![0], vec![0.0], vec![1], (1, 1));
        let err = FasterSpeechDurLoss::new("bogus")
            .forward(&dur, &pred, &mask)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_wide_prediction() {
        let device = Device::Cpu;
        let dur = Tensor::zeros((1, 2), DType::U32, &device).unwrap();
        let pred = Tensor::zeros((1, 2, 2), DType::F32, &device).unwrap();
        let mask = Tensor::ones((1, 2), DType::U8, &device).unwrap();
        let err = FasterSpeechDurLoss::default()
            .forward(&dur, &pred, &mask)
            .unwrap_err();
        assert!(matches!(err, Error::Shape(_)));
    }
}
