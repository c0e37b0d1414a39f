//! The four phases of an epoch.
//!
//! ```text
//! Census -> Movement -> Transmission -> Advancement -> (next epoch | done)
//! ```
//!
//! [`EpochPipeline`] holds everything the phases read but never write during a run, and exposes
//! each phase as an operation on a contiguous partition of the population. An execution strategy
//! decides how partitions are scheduled; a phase over the whole population is a single partition
//! starting at offset 0.
//!
//! Random draws for individual `i` in epoch `e` come from streams keyed by `(seed, e, i)`, where
//! `i` is the index in the whole population and not in the partition, so the result of an epoch
//! does not depend on how the population was split.
use std::fmt::{self, Display};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::Serialize;

use crate::census::PopulationCensus;
use crate::error::DragonflyError;
use crate::graph::NeighborhoodIndex;
use crate::individual::{DiseaseParameters, Individual};
use crate::movement::MovementModel;
use crate::parameters::Parameters;
use crate::random::{stream_rng, MovementRng, TransmissionRng};
use crate::transmission::{expose, ContactSnapshot};

/// Hit, infected and recovered counts at the end of an epoch. Partial counts from workers are
/// combined with `+` or [`Sum`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EpochStatistics {
    pub hit_count: usize,
    pub infected_count: usize,
    pub recovered_count: usize,
}

impl EpochStatistics {
    /// Counts the individuals of `individuals`.
    #[must_use]
    pub fn tally(individuals: &[Individual]) -> Self {
        individuals.iter().map(Self::of).sum()
    }

    fn of(individual: &Individual) -> Self {
        Self {
            hit_count: usize::from(individual.ever_infected()),
            infected_count: usize::from(individual.is_infected()),
            recovered_count: usize::from(individual.is_recovered()),
        }
    }
}

impl Add for EpochStatistics {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            hit_count: self.hit_count + other.hit_count,
            infected_count: self.infected_count + other.infected_count,
            recovered_count: self.recovered_count + other.recovered_count,
        }
    }
}

impl AddAssign for EpochStatistics {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sum for EpochStatistics {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Census,
    Movement,
    Transmission,
    Advancement,
}

impl Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Census => "census",
            Phase::Movement => "movement",
            Phase::Transmission => "transmission",
            Phase::Advancement => "advancement",
        };
        f.write_str(name)
    }
}

/// What one epoch hands to the caller: the census taken at its start and the statistics at its
/// end.
#[derive(Clone, Debug, PartialEq)]
pub struct EpochOutcome {
    pub census: PopulationCensus,
    pub statistics: EpochStatistics,
}

/// The read-only state shared by every phase of a run.
#[derive(Clone, Debug)]
pub struct EpochPipeline<'a> {
    movement: MovementModel<'a>,
    disease: DiseaseParameters,
    location_count: usize,
    seed: u64,
}

impl<'a> EpochPipeline<'a> {
    /// # Errors
    ///
    /// Returns [`DragonflyError::DegenerateDistribution`] if the movement model cannot be built
    /// for these parameters.
    pub fn new(
        neighborhood: &'a NeighborhoodIndex,
        parameters: &Parameters,
    ) -> Result<Self, DragonflyError> {
        Ok(Self {
            movement: MovementModel::new(neighborhood, parameters)?,
            disease: parameters.disease(),
            location_count: neighborhood.location_count(),
            seed: parameters.seed,
        })
    }

    #[must_use]
    pub fn location_count(&self) -> usize {
        self.location_count
    }

    #[must_use]
    pub fn disease(&self) -> DiseaseParameters {
        self.disease
    }

    /// Resamples the location of every individual of `partition`. `offset` is the population
    /// index of the first individual of the partition.
    ///
    /// # Errors
    ///
    /// Returns [`DragonflyError::DegenerateDistribution`] if a movement distribution cannot be
    /// sampled.
    pub fn move_partition(
        &self,
        epoch: usize,
        offset: usize,
        partition: &mut [Individual],
        census: &PopulationCensus,
    ) -> Result<(), DragonflyError> {
        for (index, individual) in (offset..).zip(partition.iter_mut()) {
            let mut rng = stream_rng::<MovementRng>(self.seed, epoch as u64, index as u64);
            let next = self
                .movement
                .next_location(&mut rng, individual.location(), census)?;
            individual.move_to(next);
        }
        Ok(())
    }

    /// Exposes every susceptible individual of `partition` to its co-located infected contacts.
    /// Returns the number of new infections.
    #[must_use]
    pub fn transmit_partition(
        &self,
        epoch: usize,
        offset: usize,
        partition: &mut [Individual],
        snapshot: &ContactSnapshot,
    ) -> usize {
        let mut infections = 0;
        for (index, individual) in (offset..).zip(partition.iter_mut()) {
            if !individual.is_susceptible() {
                continue;
            }
            let mut rng = stream_rng::<TransmissionRng>(self.seed, epoch as u64, index as u64);
            if expose(individual, snapshot, &mut rng, self.disease.infectiosity) {
                infections += 1;
            }
        }
        infections
    }

    /// Advances the disease of every individual of `partition` and returns the partition's
    /// partial statistics.
    #[must_use]
    pub fn advance_partition(&self, partition: &mut [Individual]) -> EpochStatistics {
        partition
            .iter_mut()
            .map(|individual| {
                individual.advance(self.disease.duration);
                EpochStatistics::of(individual)
            })
            .sum()
    }
}
