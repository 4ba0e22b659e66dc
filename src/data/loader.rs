//! Epoch iteration over the dataset: shuffle, batch, collate.

use candle_core::Device;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::DataLayerConfig;
use crate::data::collate::{Batch, Collator};
use crate::data::dataset::FasterSpeechDataset;
use crate::{Error, Result};

/// Data layer for the FasterSpeech model.
///
/// Owns the dataset and a collator and hands out one epoch of batches at a
/// time. Worker-pool parallelism is the caller's concern; the layer itself
/// is immutable after construction and `Sync`.
pub struct FasterSpeechDataLayer {
    dataset: FasterSpeechDataset,
    collator: Collator,
    batch_size: usize,
    shuffle: bool,
    drop_last: bool,
    shuffle_seed: u64,
}

impl FasterSpeechDataLayer {
    /// Build the layer: load the dataset and set up collation on `device`.
    pub fn new(cfg: &DataLayerConfig, device: Device) -> Result<Self> {
        if cfg.batch_size == 0 {
            return Err(Error::Config("batch_size must be positive".into()));
        }
        let dataset = FasterSpeechDataset::load(cfg)?;
        let collator = Collator::new(cfg.pad_id, dataset.labels().space_id(), device);
        tracing::debug!(
            "data layer: {} examples, batch size {}",
            dataset.len(),
            cfg.batch_size
        );
        Ok(Self {
            dataset,
            collator,
            batch_size: cfg.batch_size,
            shuffle: cfg.shuffle,
            drop_last: cfg.drop_last,
            shuffle_seed: cfg.shuffle_seed,
        })
    }

    /// Number of examples in the dataset.
    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Batches per epoch, honoring `drop_last`.
    pub fn num_batches(&self) -> usize {
        if self.drop_last {
            self.len() / self.batch_size
        } else {
            self.len().div_ceil(self.batch_size)
        }
    }

    /// Iterate one epoch of batches.
    ///
    /// The shuffle is deterministic in `(shuffle_seed, epoch)` so runs can
    /// be reproduced.
    pub fn epoch(&self, epoch: u64) -> Batches<'_> {
        let mut order: Vec<usize> = (0..self.dataset.len()).collect();
        if self.shuffle {
            let mut rng = StdRng::seed_from_u64(self.shuffle_seed.wrapping_add(epoch));
            order.shuffle(&mut rng);
        }
        Batches {
            layer: self,
            order,
            cursor: 0,
        }
    }

    fn load_batch(&self, indices: &[usize]) -> Result<Batch> {
        let examples = indices
            .iter()
            .map(|&i| self.dataset.get(i))
            .collect::<Result<Vec<_>>>()?;
        self.collator.collate(&examples)
    }
}

/// One epoch of batches.
pub struct Batches<'a> {
    layer: &'a FasterSpeechDataLayer,
    order: Vec<usize>,
    cursor: usize,
}

impl Iterator for Batches<'_> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        let remaining = self.order.len() - self.cursor;
        if remaining == 0 || (remaining < self.layer.batch_size && self.layer.drop_last) {
            return None;
        }
        let take = remaining.min(self.layer.batch_size);
        let indices = &self.order[self.cursor..self.cursor + take];
        self.cursor += take;
        Some(self.layer.load_batch(indices))
    }
}
