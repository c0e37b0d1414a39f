//! How the phases of an epoch are scheduled.
//!
//! [`SingleThreaded`] runs every phase over the whole population on the calling thread.
//! [`PartitionedParallel`] splits the population into one contiguous partition per worker of a
//! dedicated rayon pool. Each phase is a single parallel call that returns only after every
//! partition is done, which is the barrier between phases: Movement never starts before the
//! census is complete, and so on.
use std::time::Instant;

use humantime::format_duration;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::census::PopulationCensus;
use crate::epoch::{EpochOutcome, EpochPipeline, EpochStatistics, Phase};
use crate::error::DragonflyError;
use crate::individual::Individual;
use crate::log::trace;
use crate::transmission::ContactSnapshot;

/// Runs one epoch of the pipeline over the population.
pub trait ExecutionStrategy {
    /// A short label used in logs and timing reports.
    fn name(&self) -> &'static str;

    /// Number of workers executing each phase.
    fn threads(&self) -> usize;

    /// Runs Census, Movement, Transmission and Advancement in that order.
    ///
    /// # Errors
    ///
    /// Returns [`DragonflyError`] if a phase hits a precondition violation, e.g. an individual
    /// outside the graph or a movement distribution that cannot be sampled.
    fn run_epoch(
        &self,
        pipeline: &EpochPipeline,
        epoch: usize,
        individuals: &mut [Individual],
    ) -> Result<EpochOutcome, DragonflyError>;
}

fn timed<T>(epoch: usize, phase: Phase, work: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let result = work();
    trace!(
        "epoch {epoch} {phase} took {}",
        format_duration(start.elapsed())
    );
    result
}

#[derive(Copy, Clone, Debug, Default)]
pub struct SingleThreaded;

impl ExecutionStrategy for SingleThreaded {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn threads(&self) -> usize {
        1
    }

    fn run_epoch(
        &self,
        pipeline: &EpochPipeline,
        epoch: usize,
        individuals: &mut [Individual],
    ) -> Result<EpochOutcome, DragonflyError> {
        let census = timed(epoch, Phase::Census, || {
            PopulationCensus::count(individuals, pipeline.location_count())
        })?;
        timed(epoch, Phase::Movement, || {
            pipeline.move_partition(epoch, 0, individuals, &census)
        })?;
        let infections = timed(epoch, Phase::Transmission, || {
            let snapshot = ContactSnapshot::capture(individuals);
            pipeline.transmit_partition(epoch, 0, individuals, &snapshot)
        });
        trace!("epoch {epoch}: {infections} new infections");
        let statistics = timed(epoch, Phase::Advancement, || {
            pipeline.advance_partition(individuals)
        });
        Ok(EpochOutcome { census, statistics })
    }
}

/// Contiguous partitions processed by a fixed-size worker pool.
#[derive(Debug)]
pub struct PartitionedParallel {
    pool: ThreadPool,
    thread_count: usize,
}

impl PartitionedParallel {
    /// Builds a dedicated pool of `thread_count` workers.
    ///
    /// # Errors
    ///
    /// Returns [`DragonflyError::InvalidParameter`] for zero threads and
    /// [`DragonflyError::ThreadPool`] if the pool cannot be started.
    pub fn new(thread_count: usize) -> Result<Self, DragonflyError> {
        if thread_count == 0 {
            return Err(DragonflyError::invalid_parameter(
                "thread_count",
                "must be at least one",
            ));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(thread_count)
            .thread_name(|index| format!("dragonfly-worker-{index}"))
            .build()?;
        Ok(Self { pool, thread_count })
    }

    /// The partition size for a population of `population` individuals.
    #[must_use]
    pub fn partition_size(&self, population: usize) -> usize {
        population.div_ceil(self.thread_count).max(1)
    }
}

impl ExecutionStrategy for PartitionedParallel {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn threads(&self) -> usize {
        self.thread_count
    }

    fn run_epoch(
        &self,
        pipeline: &EpochPipeline,
        epoch: usize,
        individuals: &mut [Individual],
    ) -> Result<EpochOutcome, DragonflyError> {
        let size = self.partition_size(individuals.len());

        self.pool.install(|| -> Result<EpochOutcome, DragonflyError> {
            let census = timed(epoch, Phase::Census, || {
                PopulationCensus::count_parallel(individuals, pipeline.location_count(), size)
            })?;

            timed(epoch, Phase::Movement, || {
                individuals
                    .par_chunks_mut(size)
                    .enumerate()
                    .try_for_each(|(partition, chunk)| {
                        pipeline.move_partition(epoch, partition * size, chunk, &census)
                    })
            })?;

            let infections: usize = timed(epoch, Phase::Transmission, || {
                let snapshot = ContactSnapshot::capture(individuals);
                individuals
                    .par_chunks_mut(size)
                    .enumerate()
                    .map(|(partition, chunk)| {
                        pipeline.transmit_partition(epoch, partition * size, chunk, &snapshot)
                    })
                    .sum()
            });
            trace!("epoch {epoch}: {infections} new infections");

            let statistics: EpochStatistics = timed(epoch, Phase::Advancement, || {
                individuals
                    .par_chunks_mut(size)
                    .map(|chunk| pipeline.advance_partition(chunk))
                    .reduce(EpochStatistics::default, |a, b| a + b)
            });

            Ok(EpochOutcome { census, statistics })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{sample_graph, Location, NeighborhoodIndex};
    use crate::parameters::Parameters;

    fn population(parameters: &Parameters) -> Vec<Individual> {
        (0..parameters.individual_count)
            .map(|i| {
                let mut individual = Individual::new(Location(i % 11));
                if i < parameters.initial_infected_count {
                    individual.infect();
                }
                individual
            })
            .collect()
    }

    #[test]
    fn zero_threads_is_rejected() {
        assert!(matches!(
            PartitionedParallel::new(0),
            Err(DragonflyError::InvalidParameter {
                name: "thread_count",
                ..
            })
        ));
    }

    #[test]
    fn partition_size_covers_population() {
        let strategy = PartitionedParallel::new(4).unwrap();
        assert_eq!(strategy.partition_size(1000), 250);
        assert_eq!(strategy.partition_size(1001), 251);
        assert_eq!(strategy.partition_size(3), 1);
        assert_eq!(strategy.partition_size(0), 1);
    }

    #[test]
    fn strategies_agree_epoch_by_epoch() {
        let graph = sample_graph().unwrap();
        let index = NeighborhoodIndex::build(&graph);
        let parameters = Parameters {
            individual_count: 300,
            initial_infected_count: 20,
            infectiosity: 0.3,
            seed: 5,
            ..Parameters::default()
        };
        let pipeline = EpochPipeline::new(&index, &parameters).unwrap();

        let mut serial_population = population(&parameters);
        let mut parallel_population = serial_population.clone();
        let serial = SingleThreaded;
        let parallel = PartitionedParallel::new(3).unwrap();

        for epoch in 0..10 {
            let a = serial
                .run_epoch(&pipeline, epoch, &mut serial_population)
                .unwrap();
            let b = parallel
                .run_epoch(&pipeline, epoch, &mut parallel_population)
                .unwrap();
            assert_eq!(a, b);
            assert_eq!(a.census.total(), 300);
        }
        assert_eq!(serial_population, parallel_population);
    }

    #[test]
    fn names_and_threads() {
        assert_eq!(SingleThreaded.name(), "serial");
        assert_eq!(SingleThreaded.threads(), 1);
        let parallel = PartitionedParallel::new(2).unwrap();
        assert_eq!(parallel.name(), "parallel");
        assert_eq!(parallel.threads(), 2);
    }
}
