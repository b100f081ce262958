//src/chunk.rs

use std::ops::Range;

use crate::error::ConsensusError;

/// Half-open slice bounds of chunk `index` (1-based) out of `size` over a
/// list of `len` items.
///
/// With `k, m = divmod(len, size)`, chunk `i` (0-based) covers
/// `[i*k + min(i, m), (i+1)*k + min(i+1, m))`: every item lands in exactly
/// one chunk, sizes are `k` or `k+1`, and the first `m` chunks get the extra
/// item. Out-of-range `index` or `size < 1` is a caller usage error.
pub fn chunk_bounds(len: usize, size: usize, index: usize) -> Result<Range<usize>, ConsensusError> {
    if size < 1 || index < 1 || index > size {
        return Err(ConsensusError::InvalidChunk { index, size });
    }
    let (k, m) = (len / size, len % size);
    let i = index - 1;
    let start = i * k + i.min(m);
    let end = (i + 1) * k + (i + 1).min(m);
    Ok(start..end)
}

/// The `index`-th of `size` near-equal contiguous chunks of `items`.
pub fn chunk<T>(items: &[T], size: usize, index: usize) -> Result<&[T], ConsensusError> {
    let bounds = chunk_bounds(items.len(), size, index)?;
    Ok(&items[bounds])
}
