//! Seeded random-number streams.
//!
//! Every stochastic decision in a run draws from a stream identified by an [`RngId`] type, the
//! run's base seed, the epoch and the index of the individual making the decision. A stream is
//! created on demand and dropped after use, so no generator state is shared between workers and
//! the outcome of a run does not depend on how the population is partitioned.
mod macros;

pub use macros::define_rng;

use crate::error::DragonflyError;
use crate::hashing::{hash_str, mix_keys};
use crate::rand::distr::weighted::WeightedIndex;
use crate::rand::distr::Distribution;
use crate::rand::{Rng, SeedableRng};

pub trait RngId: Copy + Clone {
    type RngType: SeedableRng + Rng;
    fn get_name() -> &'static str;
}

define_rng!(PlacementRng);
define_rng!(MovementRng);
define_rng!(TransmissionRng);

/// Returns the generator for stream `R`, keyed by `epoch` and `index`. Two calls with the same
/// arguments return generators producing identical sequences.
#[must_use]
pub fn stream_rng<R: RngId>(base_seed: u64, epoch: u64, index: u64) -> R::RngType {
    let stream_seed = base_seed.wrapping_add(hash_str(R::get_name()));
    R::RngType::seed_from_u64(mix_keys(stream_seed, epoch, index))
}

/// Draws an index into `weights` with probability proportional to its weight.
///
/// # Errors
///
/// Returns [`DragonflyError::DegenerateDistribution`] when `weights` is empty, contains a
/// negative or non-finite entry, or sums to zero.
pub fn sample_weighted<R: Rng + ?Sized>(
    rng: &mut R,
    weights: &[f64],
) -> Result<usize, DragonflyError> {
    let index = WeightedIndex::new(weights)
        .map_err(|e| DragonflyError::DegenerateDistribution(format!("{e}: {weights:?}")))?;
    Ok(index.sample(rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rand::RngCore;

    define_rng!(FooRng);
    define_rng!(BarRng);

    #[test]
    fn same_key_same_stream() {
        let mut a = stream_rng::<FooRng>(42, 3, 17);
        let mut b = stream_rng::<FooRng>(42, 3, 17);
        assert_eq!(a.next_u64(), b.next_u64());
        assert_eq!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn streams_are_independent() {
        let first = stream_rng::<FooRng>(42, 0, 0).next_u64();
        assert_ne!(first, stream_rng::<BarRng>(42, 0, 0).next_u64());
        assert_ne!(first, stream_rng::<FooRng>(42, 1, 0).next_u64());
        assert_ne!(first, stream_rng::<FooRng>(42, 0, 1).next_u64());
        assert_ne!(first, stream_rng::<FooRng>(88, 0, 0).next_u64());
    }

    #[test]
    fn sample_weighted_follows_weights() {
        let mut rng = stream_rng::<FooRng>(42, 0, 0);
        let n_samples = 3000;
        let mut zero_counter = 0;
        for _ in 0..n_samples {
            // Zero is selected with probability 1/3, one with a probability of 2/3.
            if sample_weighted(&mut rng, &[1.0, 2.0]).unwrap() == 0 {
                zero_counter += 1;
            }
        }
        // The expected value of `zero_counter` is 1000.
        assert!((zero_counter - 1000_i32).abs() < 100);
    }

    #[test]
    fn sample_weighted_rejects_zero_total() {
        let mut rng = stream_rng::<FooRng>(42, 0, 0);
        let result = sample_weighted(&mut rng, &[0.0, 0.0]);
        assert!(matches!(
            result,
            Err(DragonflyError::DegenerateDistribution(_))
        ));
        assert!(sample_weighted(&mut rng, &[]).is_err());
        assert!(sample_weighted(&mut rng, &[1.0, f64::NAN]).is_err());
    }
}
