use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::dataset::batch::Batch;
use crate::dataset::dataset::Dataset;
use crate::error::{Error, Result};

/// A restartable, finite sequence of batches.
///
/// Every call to `epoch` starts a fresh pass over the data.
pub trait BatchSource {
    /// Nominal batch size; the final batch of a pass may be smaller.
    fn batch_size(&self) -> usize;

    /// Number of batches one pass yields.
    fn num_batches(&self) -> usize;

    fn epoch(&mut self) -> Box<dyn Iterator<Item = Result<Batch>> + '_>;
}

/// Batches a `Dataset`, either in natural order or reshuffled every epoch.
pub struct DataLoader<D> {
    dataset: D,
    batch_size: usize,
    shuffle: bool,
    rng: StdRng,
}

impl<D: Dataset> DataLoader<D> {
    pub fn new(dataset: D, batch_size: usize, shuffle: bool) -> Result<DataLoader<D>> {
        DataLoader::with_seed(dataset, batch_size, shuffle, 0)
    }

    pub fn with_seed(dataset: D, batch_size: usize, shuffle: bool, seed: u64) -> Result<DataLoader<D>> {
        if batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be at least 1".to_owned()));
        }
        Ok(DataLoader { dataset, batch_size, shuffle, rng: StdRng::seed_from_u64(seed) })
    }

    pub fn dataset(&self) -> &D {
        &self.dataset
    }

    pub fn shuffles(&self) -> bool {
        self.shuffle
    }
}

impl<D: Dataset> BatchSource for DataLoader<D> {
    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn num_batches(&self) -> usize {
        (self.dataset.len() + self.batch_size - 1) / self.batch_size
    }

    fn epoch(&mut self) -> Box<dyn Iterator<Item = Result<Batch>> + '_> {
        let mut order: Vec<usize> = (0..self.dataset.len()).collect();
        if self.shuffle {
            order.shuffle(&mut self.rng);
        }
        let batches: Vec<Vec<usize>> = order.chunks(self.batch_size).map(<[usize]>::to_vec).collect();
        let dataset = &self.dataset;
        Box::new(batches.into_iter().map(move |indices| {
            let samples = indices
                .into_iter()
                .map(|i| dataset.get(i))
                .collect::<Result<Vec<_>>>()?;
            Batch::from_samples(samples)
        }))
    }
}

impl<B: BatchSource + ?Sized> BatchSource for Box<B> {
    fn batch_size(&self) -> usize {
        (**self).batch_size()
    }

    fn num_batches(&self) -> usize {
        (**self).num_batches()
    }

    fn epoch(&mut self) -> Box<dyn Iterator<Item = Result<Batch>> + '_> {
        (**self).epoch()
    }
}
