//! Per-location head counts, rebuilt at the start of every epoch.
//!
//! The serial count is a plain loop. The parallel count lets every worker increment a shared
//! array of atomic counters, one per location, so colliding increments never need a lock; the
//! counters are read back into an owned [`PopulationCensus`] once all workers have joined.
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::Serialize;

use crate::error::DragonflyError;
use crate::graph::Location;
use crate::individual::Individual;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PopulationCensus {
    counts: Vec<usize>,
}

impl PopulationCensus {
    /// Counts individuals per location on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns [`DragonflyError::UnknownLocation`] if an individual stands outside
    /// `0..location_count`.
    pub fn count(individuals: &[Individual], location_count: usize) -> Result<Self, DragonflyError> {
        let mut counts = vec![0; location_count];
        for individual in individuals {
            let location = individual.location();
            let slot = counts
                .get_mut(location.index())
                .ok_or(DragonflyError::UnknownLocation(location))?;
            *slot += 1;
        }
        Ok(Self { counts })
    }

    /// Counts individuals per location with one rayon task per `chunk_size` individuals. Must be
    /// called from inside the pool that should do the work.
    ///
    /// # Errors
    ///
    /// Returns [`DragonflyError::UnknownLocation`] if an individual stands outside
    /// `0..location_count`.
    pub fn count_parallel(
        individuals: &[Individual],
        location_count: usize,
        chunk_size: usize,
    ) -> Result<Self, DragonflyError> {
        let counters: Vec<AtomicUsize> = (0..location_count).map(|_| AtomicUsize::new(0)).collect();

        individuals
            .par_chunks(chunk_size.max(1))
            .try_for_each(|chunk| {
                for individual in chunk {
                    let location = individual.location();
                    counters
                        .get(location.index())
                        .ok_or(DragonflyError::UnknownLocation(location))?
                        .fetch_add(1, Ordering::Relaxed);
                }
                Ok::<(), DragonflyError>(())
            })?;

        Ok(Self {
            counts: counters.into_iter().map(AtomicUsize::into_inner).collect(),
        })
    }

    #[must_use]
    pub fn location_count(&self) -> usize {
        self.counts.len()
    }

    /// Individuals at `location`; zero for a location outside the census.
    #[must_use]
    pub fn at(&self, location: Location) -> usize {
        self.counts.get(location.index()).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn population(locations: &[usize]) -> Vec<Individual> {
        locations
            .iter()
            .map(|&index| Individual::new(Location(index)))
            .collect()
    }

    #[test]
    fn counts_per_location() {
        let individuals = population(&[0, 2, 2, 1, 2]);
        let census = PopulationCensus::count(&individuals, 4).unwrap();

        assert_eq!(census.counts(), &[1, 1, 3, 0]);
        assert_eq!(census.at(Location(2)), 3);
        assert_eq!(census.at(Location(9)), 0);
        assert_eq!(census.total(), individuals.len());
    }

    #[test]
    fn parallel_count_matches_serial() {
        let locations: Vec<usize> = (0..10_000).map(|i| (i * 7919) % 13).collect();
        let individuals = population(&locations);

        let serial = PopulationCensus::count(&individuals, 13).unwrap();
        for chunk_size in [1, 3, 128, 10_000, 20_000] {
            let parallel = PopulationCensus::count_parallel(&individuals, 13, chunk_size).unwrap();
            assert_eq!(parallel, serial);
        }
        assert_eq!(serial.total(), 10_000);
    }

    #[test]
    fn out_of_range_location_is_an_error() {
        let individuals = population(&[0, 5]);
        assert!(matches!(
            PopulationCensus::count(&individuals, 2),
            Err(DragonflyError::UnknownLocation(Location(5)))
        ));
        assert!(matches!(
            PopulationCensus::count_parallel(&individuals, 2, 1),
            Err(DragonflyError::UnknownLocation(Location(5)))
        ));
    }
}
