//! Convolutional residual sequence encoder.
//!
//! A stack of Jasper-style blocks over `[B, C, T]` features:
//!
//! ```text
//! block (× repeat):
//!   re-zero padded positions (mask)
//!   → Conv1d(kernel k, stride 1, padding (k-1)/2)
//!   → LayerNorm (channel dim)
//!   → ReLU
//! + residual (1×1 projection when channel counts differ)
//! ```
//!
//! Stride and dilation are pinned to 1 and kernels must be odd, so the time
//! axis is never resized — the duration head depends on a per-input-token
//! output position.

use candle_core::{Module, Tensor};
use candle_nn::VarBuilder;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One encoder block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderBlockConfig {
    /// Output channels.
    pub filters: usize,
    /// Convolution kernel width; must be odd.
    pub kernel: usize,
    /// Number of conv/norm/activation sub-layers in the block.
    pub repeat: usize,
    /// Add a residual connection around the block.
    pub residual: bool,
    /// Dropout rate (training-time only; inference ignores it).
    pub dropout: f64,
}

/// Encoder stack configuration. The last block's `filters` is the encoder
/// output dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationEncoderConfig {
    pub blocks: Vec<EncoderBlockConfig>,
}

impl Default for DurationEncoderConfig {
    fn default() -> Self {
        let blocks = [5, 7, 9]
            .into_iter()
            .map(|kernel| EncoderBlockConfig {
                filters: 256,
                kernel,
                repeat: 2,
                residual: true,
                dropout: 0.1,
            })
            .collect();
        Self { blocks }
    }
}

impl DurationEncoderConfig {
    /// Output feature size, i.e. the last block's filter count.
    pub fn d_out(&self) -> Result<usize> {
        self.blocks
            .last()
            .map(|b| b.filters)
            .ok_or_else(|| Error::Config("encoder needs at least one block".into()))
    }
}

struct ConvLayer {
    conv: candle_nn::Conv1d,
    norm: candle_nn::LayerNorm,
}

struct EncoderBlock {
    layers: Vec<ConvLayer>,
    residual: bool,
    /// 1×1 channel projection for the residual path; `None` = identity.
    res_proj: Option<candle_nn::Conv1d>,
}

impl EncoderBlock {
    fn load(vb: VarBuilder, d_in: usize, cfg: &EncoderBlockConfig) -> Result<Self> {
        if cfg.kernel % 2 == 0 {
            return Err(Error::Config(format!(
                "encoder kernel {} is even; time axis would shift",
                cfg.kernel
            )));
        }
        if cfg.repeat == 0 {
            return Err(Error::Config("encoder block repeat must be positive".into()));
        }

        let conv_cfg = candle_nn::Conv1dConfig {
            padding: (cfg.kernel - 1) / 2,
            stride: 1,
            dilation: 1,
            groups: 1,
            ..Default::default()
        };

        let mut layers = Vec::with_capacity(cfg.repeat);
        let mut in_ch = d_in;
        for i in 0..cfg.repeat {
            let conv = candle_nn::conv1d(
                in_ch,
                cfg.filters,
                cfg.kernel,
                conv_cfg,
                vb.pp(format!("convs.{i}")),
            )?;
            let norm = candle_nn::layer_norm(cfg.filters, 1e-5, vb.pp(format!("norms.{i}")))?;
            layers.push(ConvLayer { conv, norm });
            in_ch = cfg.filters;
        }

        let res_proj = if cfg.residual && d_in != cfg.filters {
            let proj_cfg = candle_nn::Conv1dConfig {
                padding: 0,
                stride: 1,
                dilation: 1,
                groups: 1,
                ..Default::default()
            };
            Some(candle_nn::conv1d(
                d_in,
                cfg.filters,
                1,
                proj_cfg,
                vb.pp("res"),
            )?)
        } else {
            None
        };

        Ok(Self {
            layers,
            residual: cfg.residual,
            res_proj,
        })
    }

    /// `xs`: `[B, C, T]`, `mask`: `[B, 1, T]` (1=valid, 0=padding).
    fn forward(&self, xs: &Tensor, mask: Option<&Tensor>) -> Result<Tensor> {
        let mut h = xs.clone();
        for layer in &self.layers {
            if let Some(mask) = mask {
                h = h.broadcast_mul(mask)?;
            }
            h = layer.conv.forward(&h)?;
            // LayerNorm runs over the channel dim, which Conv1d keeps at dim 1.
            h = layer.norm.forward(&h.transpose(1, 2)?)?.transpose(1, 2)?;
            h = h.relu()?;
        }
        if self.residual {
            let res = match &self.res_proj {
                Some(proj) => proj.forward(xs)?,
                None => xs.clone(),
            };
            h = (h + res)?;
        }
        Ok(h)
    }
}

/// Jasper-style convolutional encoder used by the duration predictor.
pub struct DurationEncoder {
    blocks: Vec<EncoderBlock>,
}

impl DurationEncoder {
    /// `d_in` is the embedding dimension feeding the first block.
    pub fn load(vb: VarBuilder, d_in: usize, cfg: &DurationEncoderConfig) -> Result<Self> {
        cfg.d_out()?;
        let mut blocks = Vec::with_capacity(cfg.blocks.len());
        let mut in_ch = d_in;
        for (i, block_cfg) in cfg.blocks.iter().enumerate() {
            blocks.push(EncoderBlock::load(
                vb.pp(format!("blocks.{i}")),
                in_ch,
                block_cfg,
            )?);
            in_ch = block_cfg.filters;
        }
        Ok(Self { blocks })
    }

    /// Encode `xs: [B, C, T]` → `[B, d_out, T]`.
    ///
    /// `mask: [B, 1, T]` re-zeroes padded positions before every conv so
    /// padding never leaks into valid positions through the receptive field.
    pub fn forward(&self, xs: &Tensor, mask: Option<&Tensor>) -> Result<Tensor> {
        let mut h = xs.clone();
        for block in &self.blocks {
            h = block.forward(&h, mask)?;
        }
        Ok(h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    fn make_vb(device: &Device) -> (VarMap, VarBuilder<'static>) {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        (varmap, vb)
    }

    fn small_config() -> DurationEncoderConfig {
        DurationEncoderConfig {
            blocks: vec![
                EncoderBlockConfig {
                    filters: 16,
                    kernel: 3,
                    repeat: 2,
                    residual: true,
                    dropout: 0.0,
                },
                EncoderBlockConfig {
                    filters: 24,
                    kernel: 5,
                    repeat: 1,
                    residual: true,
                    dropout: 0.0,
                },
            ],
        }
    }

    #[test]
    fn test_default_config() {
        let cfg = DurationEncoderConfig::default();
        assert_eq!(cfg.blocks.len(), 3);
        assert_eq!(cfg.d_out().unwrap(), 256);
        assert!(cfg.blocks.iter().all(|b| b.kernel % 2 == 1));
    }

    #[test]
    fn test_empty_config_rejected() {
        let cfg = DurationEncoderConfig { blocks: vec![] };
        assert!(cfg.d_out().is_err());
    }

    #[test]
    fn test_even_kernel_rejected() {
        let device = Device::Cpu;
        let (_varmap, vb) = make_vb(&device);
        let cfg = DurationEncoderConfig {
            blocks: vec![EncoderBlockConfig {
                filters: 8,
                kernel: 4,
                repeat: 1,
                residual: false,
                dropout: 0.0,
            }],
        };
        assert!(DurationEncoder::load(vb, 8, &cfg).is_err());
    }

    #[test]
    fn test_time_axis_preserved() {
        let device = Device::Cpu;
        let (_varmap, vb) = make_vb(&device);
        let encoder = DurationEncoder::load(vb, 8, &small_config()).unwrap();

        for t in [1usize, 7, 50] {
            let xs = Tensor::randn(0.0f32, 1.0, (2, 8, t), &device).unwrap();
            let out = encoder.forward(&xs, None).unwrap();
            assert_eq!(out.dims(), &[2, 24, t]);
        }
    }

    #[test]
    fn test_forward_with_padding_mask() {
        let device = Device::Cpu;
        let (_varmap, vb) = make_vb(&device);
        let encoder = DurationEncoder::load(vb, 8, &small_config()).unwrap();

        let xs = Tensor::randn(0.0f32, 1.0, (2, 8, 12), &device).unwrap();
        let mask_data: Vec<f32> = [vec![1.0; 12], [vec![1.0; 8], vec![0.0; 4]].concat()].concat();
        let mask = Tensor::from_vec(mask_data, (2, 1, 12), &device).unwrap();

        let out = encoder.forward(&xs, Some(&mask)).unwrap();
        assert_eq!(out.dims(), &[2, 24, 12]);
    }
}
