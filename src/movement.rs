//! Density-aware weighted movement.
//!
//! An individual at location `l` chooses its next location among `l` itself and the neighbors
//! of `l`. A neighbor `n` is weighted by
//!
//! ```text
//! w(n) = max(0, edge_weight(l, n) + reward(c) + penalty(c))
//! reward(c)  =   exp(-(c - d)^2 / (2 s^2))
//! penalty(c) = -(1 - exp(-(c - d)^2 / (2 d^2)))
//! ```
//!
//! where `c` is the census count at `n`, `d = individual_count / sqrt(location_count)` is the
//! expected density and `s = d / density_spread_divisor`. Staying put carries the fixed
//! `stay_weight`.
use approx::relative_eq;
use rand::Rng;

use crate::census::PopulationCensus;
use crate::error::DragonflyError;
use crate::graph::{Location, NeighborhoodIndex};
use crate::parameters::Parameters;
use crate::random::sample_weighted;

/// The density terms of the movement weight.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DensityShaping {
    expected_density: f64,
    spread: f64,
}

impl DensityShaping {
    /// # Errors
    ///
    /// Returns [`DragonflyError::DegenerateDistribution`] if there are no locations or no
    /// individuals, or if `spread_divisor` is not positive, since the Gaussian terms would divide
    /// by zero.
    pub fn new(
        individual_count: usize,
        location_count: usize,
        spread_divisor: f64,
    ) -> Result<Self, DragonflyError> {
        if location_count == 0 || individual_count == 0 {
            return Err(DragonflyError::DegenerateDistribution(format!(
                "expected density of {individual_count} individuals over {location_count} locations"
            )));
        }
        if !spread_divisor.is_finite() || spread_divisor <= 0.0 {
            return Err(DragonflyError::DegenerateDistribution(format!(
                "density spread divisor {spread_divisor}"
            )));
        }
        let expected_density = individual_count as f64 / (location_count as f64).sqrt();
        Ok(Self {
            expected_density,
            spread: expected_density / spread_divisor,
        })
    }

    #[must_use]
    pub fn expected_density(&self) -> f64 {
        self.expected_density
    }

    /// Sum of the reward and penalty terms for a location holding `count` individuals.
    #[must_use]
    pub fn term(&self, count: usize) -> f64 {
        let deviation = count as f64 - self.expected_density;
        let squared = deviation * deviation;
        let reward = (-squared / (2.0 * self.spread * self.spread)).exp();
        let penalty =
            -(1.0 - (-squared / (2.0 * self.expected_density * self.expected_density)).exp());
        reward + penalty
    }
}

/// Samples next locations for one run. Shared read-only by all workers.
#[derive(Clone, Debug)]
pub struct MovementModel<'a> {
    neighborhood: &'a NeighborhoodIndex,
    shaping: DensityShaping,
    stay_weight: f64,
}

impl<'a> MovementModel<'a> {
    /// # Errors
    ///
    /// Returns [`DragonflyError::DegenerateDistribution`] when the density terms cannot be
    /// formed or `stay_weight` is not finite and positive.
    pub fn new(
        neighborhood: &'a NeighborhoodIndex,
        parameters: &Parameters,
    ) -> Result<Self, DragonflyError> {
        if !parameters.stay_weight.is_finite() || parameters.stay_weight <= 0.0 {
            return Err(DragonflyError::DegenerateDistribution(format!(
                "stay weight {}",
                parameters.stay_weight
            )));
        }
        Ok(Self {
            neighborhood,
            shaping: DensityShaping::new(
                parameters.individual_count,
                neighborhood.location_count(),
                parameters.density_spread_divisor,
            )?,
            stay_weight: parameters.stay_weight,
        })
    }

    #[must_use]
    pub fn shaping(&self) -> &DensityShaping {
        &self.shaping
    }

    /// The candidate locations of an individual at `current` with their unnormalized weights.
    /// Neighbors come first in index order; `current` is last.
    #[must_use]
    pub fn candidate_weights(
        &self,
        current: Location,
        census: &PopulationCensus,
    ) -> (Vec<Location>, Vec<f64>) {
        let neighbors = self.neighborhood.neighbors(current);
        let edge_weights = self.neighborhood.weights(current);

        let mut candidates = Vec::with_capacity(neighbors.len() + 1);
        let mut weights = Vec::with_capacity(neighbors.len() + 1);
        for (&neighbor, &edge_weight) in neighbors.iter().zip(edge_weights) {
            candidates.push(neighbor);
            weights.push((edge_weight + self.shaping.term(census.at(neighbor))).max(0.0));
        }
        candidates.push(current);
        weights.push(self.stay_weight);
        (candidates, weights)
    }

    /// The normalized movement distribution of an individual at `current`.
    ///
    /// # Errors
    ///
    /// Returns [`DragonflyError::DegenerateDistribution`] if the weights do not sum to a finite
    /// positive total.
    pub fn distribution(
        &self,
        current: Location,
        census: &PopulationCensus,
    ) -> Result<Vec<(Location, f64)>, DragonflyError> {
        let (candidates, weights) = self.candidate_weights(current, census);
        let total: f64 = weights.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(DragonflyError::DegenerateDistribution(format!(
                "candidate weights {weights:?} at location {current}"
            )));
        }
        let distribution: Vec<(Location, f64)> = candidates
            .into_iter()
            .zip(weights.into_iter().map(|weight| weight / total))
            .collect();

        let sum: f64 = distribution.iter().map(|(_, p)| p).sum();
        if !relative_eq!(sum, 1.0, epsilon = 1e-9) {
            return Err(DragonflyError::DegenerateDistribution(format!(
                "probabilities at location {current} sum to {sum}"
            )));
        }
        Ok(distribution)
    }

    /// Draws the next location of an individual at `current`.
    ///
    /// # Errors
    ///
    /// Returns [`DragonflyError::DegenerateDistribution`] if [`Self::distribution`] fails or the
    /// probabilities cannot be sampled.
    pub fn next_location<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        current: Location,
        census: &PopulationCensus,
    ) -> Result<Location, DragonflyError> {
        let distribution = self.distribution(current, census)?;
        let probabilities: Vec<f64> = distribution.iter().map(|&(_, p)| p).collect();
        let chosen = sample_weighted(rng, &probabilities)?;
        Ok(distribution[chosen].0)
    }
}
