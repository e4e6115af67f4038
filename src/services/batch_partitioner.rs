//! Splits a round's pool into fixed-size batches.

use std::num::NonZeroUsize;

use crate::domain::models::{Batch, Candidate};

/// Partition `pool` into `ceil(len / batch_size)` contiguous batches.
///
/// Every batch holds exactly `batch_size` candidates except possibly the
/// last. Order is the pool's order; an empty pool yields no batches.
pub fn partition(pool: &[Candidate], batch_size: NonZeroUsize) -> Vec<Batch> {
    pool.chunks(batch_size.get())
        .enumerate()
        .map(|(index, chunk)| Batch {
            index,
            candidates: chunk.to_vec(),
        })
        .collect()
}

/// Number of batches `partition` would produce.
pub const fn batch_count(pool_len: usize, batch_size: NonZeroUsize) -> usize {
    pool_len.div_ceil(batch_size.get())
}
