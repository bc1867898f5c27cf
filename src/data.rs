//! Input generation: sorted sequences and reproducible key batches.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{HarnessError, Result, try_vec};

/// Seed used by the harness when none is given.
pub const DEFAULT_SEED: u64 = 12345;

/// A strictly ascending, duplicate-free sequence of `i64`.
///
/// Every search variant assumes this ordering, so it is checked once here
/// rather than inside the searches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortedSequence {
    values: Vec<i64>,
}

impl SortedSequence {
    /// Validates that `values` is strictly ascending.
    pub fn new(values: Vec<i64>) -> Result<Self> {
        if let Some(index) = values.windows(2).position(|w| w[0] >= w[1]) {
            return Err(HarnessError::Unsorted {
                index,
                previous: values[index],
                next: values[index + 1],
            });
        }
        Ok(Self { values })
    }

    /// The reference generator: `values[i] = 2 * i`.
    ///
    /// Odd keys are guaranteed absent. Allocation failure is reported, not fatal.
    pub fn evens(len: usize) -> Result<Self> {
        let mut values = try_vec("sorted sequence", len)?;
        values.extend((0..len as i64).map(|i| i * 2));
        Ok(Self { values })
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first(&self) -> Option<i64> {
        self.values.first().copied()
    }

    pub fn last(&self) -> Option<i64> {
        self.values.last().copied()
    }

    /// Size of the backing buffer in MiB.
    pub fn size_mib(&self) -> f64 {
        (self.len() * std::mem::size_of::<i64>()) as f64 / (1024.0 * 1024.0)
    }

    /// Keys that fall in the gaps between neighbours, `values[i] + 1`, in order.
    ///
    /// For [`SortedSequence::evens`] these are the odd numbers `1, 3, 5, ...`.
    pub fn gap_keys(&self) -> impl Iterator<Item = i64> + '_ {
        self.values.iter().enumerate().filter_map(|(i, &value)| {
            let candidate = value.checked_add(1)?;
            match self.values.get(i + 1) {
                Some(&next) if next == candidate => None,
                _ => Some(candidate),
            }
        })
    }
}

/// A fixed batch of search keys drawn from a seeded generator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyBatch {
    keys: Vec<i64>,
}

impl KeyBatch {
    /// Draws `count` keys. Each key is, with equal odds, an element of the
    /// sequence or that element plus one.
    ///
    /// On the reference generator the second kind is always absent. The same
    /// seed always yields the same batch.
    pub fn generate(sequence: &SortedSequence, count: usize, seed: u64) -> Result<Self> {
        let mut keys = try_vec("key batch", count)?;
        if sequence.is_empty() {
            return Ok(Self { keys });
        }

        let values = sequence.as_slice();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for _ in 0..count {
            let present = rng.gen_bool(0.5);
            let value = values[rng.gen_range(0..values.len())];
            keys.push(if present { value } else { value.wrapping_add(1) });
        }

        Ok(Self { keys })
    }

    /// Draws `count` keys that are all present in the sequence.
    pub fn hits(sequence: &SortedSequence, count: usize, seed: u64) -> Result<Self> {
        let mut keys = try_vec("key batch", count)?;
        if sequence.is_empty() {
            return Ok(Self { keys });
        }

        let values = sequence.as_slice();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        keys.extend((0..count).map(|_| values[rng.gen_range(0..values.len())]));
        Ok(Self { keys })
    }

    pub fn from_keys(keys: Vec<i64>) -> Self {
        Self { keys }
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
