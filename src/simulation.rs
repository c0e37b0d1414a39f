//! Sets up a population on a contact graph and runs the epoch pipeline to completion.
//!
//! ```rust
//! use dragonfly::graph::sample_graph;
//! use dragonfly::parameters::Parameters;
//! use dragonfly::simulation::Simulation;
//! use dragonfly::strategy::SingleThreaded;
//!
//! let graph = sample_graph().unwrap();
//! let simulation = Simulation::new(&graph, Parameters::default()).unwrap();
//! let output = simulation.run(&SingleThreaded).unwrap();
//! assert_eq!(output.statistics.len(), 30);
//! ```
use std::time::{Duration, Instant};

use humantime::format_duration;
use rand::Rng;

use crate::census::PopulationCensus;
use crate::epoch::{EpochPipeline, EpochStatistics};
use crate::error::DragonflyError;
use crate::graph::{ContactGraph, Location, NeighborhoodIndex};
use crate::individual::Individual;
use crate::log::{debug, info};
use crate::parameters::Parameters;
use crate::random::{stream_rng, PlacementRng};
use crate::strategy::ExecutionStrategy;

/// Everything a finished run hands to reporting.
#[derive(Clone, Debug)]
pub struct SimulationOutput {
    /// One entry per epoch, in epoch order.
    pub statistics: Vec<EpochStatistics>,
    /// The census taken at the start of every epoch, in epoch order.
    pub census_snapshots: Vec<PopulationCensus>,
    pub final_population: Vec<Individual>,
    pub wall_time: Duration,
}

/// A validated run configuration bound to a graph.
#[derive(Debug)]
pub struct Simulation<'g> {
    graph: &'g ContactGraph,
    neighborhood: NeighborhoodIndex,
    parameters: Parameters,
}

impl<'g> Simulation<'g> {
    /// # Errors
    ///
    /// Returns [`DragonflyError::InvalidParameter`] if `parameters` do not validate against
    /// `graph`; nothing is run in that case.
    pub fn new(graph: &'g ContactGraph, parameters: Parameters) -> Result<Self, DragonflyError> {
        parameters.validate(graph.location_count())?;
        Ok(Self {
            graph,
            neighborhood: NeighborhoodIndex::build(graph),
            parameters,
        })
    }

    #[must_use]
    pub fn graph(&self) -> &ContactGraph {
        self.graph
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    #[must_use]
    pub fn neighborhood(&self) -> &NeighborhoodIndex {
        &self.neighborhood
    }

    /// Places `individual_count` susceptible individuals uniformly over the locations and infects
    /// the first `initial_infected_count` of them. The same seed always yields the same
    /// population.
    #[must_use]
    pub fn initial_population(&self) -> Vec<Individual> {
        let location_count = self.graph.location_count();
        (0..self.parameters.individual_count)
            .map(|index| {
                let mut rng = stream_rng::<PlacementRng>(self.parameters.seed, 0, index as u64);
                let mut individual = Individual::new(Location(rng.random_range(0..location_count)));
                if index < self.parameters.initial_infected_count {
                    individual.infect();
                }
                individual
            })
            .collect()
    }

    /// Runs `total_epochs` epochs from a fresh initial population.
    ///
    /// # Errors
    ///
    /// Returns the first [`DragonflyError`] raised by an epoch.
    pub fn run(&self, strategy: &dyn ExecutionStrategy) -> Result<SimulationOutput, DragonflyError> {
        self.run_from(strategy, self.initial_population())
    }

    /// Runs `total_epochs` epochs starting from `individuals`.
    ///
    /// # Errors
    ///
    /// Returns the first [`DragonflyError`] raised by an epoch.
    pub fn run_from(
        &self,
        strategy: &dyn ExecutionStrategy,
        mut individuals: Vec<Individual>,
    ) -> Result<SimulationOutput, DragonflyError> {
        let pipeline = EpochPipeline::new(&self.neighborhood, &self.parameters)?;
        let total_epochs = self.parameters.total_epochs;
        info!(
            "running {} epochs of {} individuals on {} locations, {} strategy with {} threads",
            total_epochs,
            individuals.len(),
            self.graph.location_count(),
            strategy.name(),
            strategy.threads()
        );

        let start = Instant::now();
        let mut statistics = Vec::with_capacity(total_epochs);
        let mut census_snapshots = Vec::with_capacity(total_epochs);
        for epoch in 0..total_epochs {
            let outcome = strategy.run_epoch(&pipeline, epoch, &mut individuals)?;
            debug!(
                "epoch {epoch}: hit {} infected {} recovered {}",
                outcome.statistics.hit_count,
                outcome.statistics.infected_count,
                outcome.statistics.recovered_count
            );
            statistics.push(outcome.statistics);
            census_snapshots.push(outcome.census);
        }
        let wall_time = start.elapsed();
        info!(
            "{} run finished in {}",
            strategy.name(),
            format_duration(wall_time)
        );

        Ok(SimulationOutput {
            statistics,
            census_snapshots,
            final_population: individuals,
            wall_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::sample_graph;
    use crate::strategy::{PartitionedParallel, SingleThreaded};

    #[test]
    fn invalid_parameters_are_rejected_before_running() {
        let graph = sample_graph().unwrap();
        let parameters = Parameters {
            infectiosity: 2.0,
            ..Parameters::default()
        };
        assert!(matches!(
            Simulation::new(&graph, parameters),
            Err(DragonflyError::InvalidParameter {
                name: "infectiosity",
                ..
            })
        ));
        assert!(Simulation::new(&ContactGraph::new(0), Parameters::default()).is_err());
    }

    #[test]
    fn initial_population_is_placed_in_range_and_seeded() {
        let graph = sample_graph().unwrap();
        let simulation = Simulation::new(&graph, Parameters::default()).unwrap();
        let population = simulation.initial_population();

        assert_eq!(population.len(), 1000);
        assert!(population.iter().all(|i| i.location().index() < 11));
        assert!(population[..15].iter().all(Individual::is_infected));
        assert!(population[15..].iter().all(Individual::is_susceptible));
        // Every location gets someone with 1000 individuals over 11 locations.
        let census = PopulationCensus::count(&population, 11).unwrap();
        assert!(census.counts().iter().all(|&count| count > 0));

        assert_eq!(population, simulation.initial_population());
    }

    #[test]
    fn run_produces_one_entry_per_epoch() {
        let graph = sample_graph().unwrap();
        let parameters = Parameters {
            individual_count: 200,
            total_epochs: 12,
            ..Parameters::default()
        };
        let simulation = Simulation::new(&graph, parameters).unwrap();
        let output = simulation.run(&SingleThreaded).unwrap();

        assert_eq!(output.statistics.len(), 12);
        assert_eq!(output.census_snapshots.len(), 12);
        assert_eq!(output.final_population.len(), 200);
        for census in &output.census_snapshots {
            assert_eq!(census.total(), 200);
        }
    }

    #[test]
    fn empty_run_has_no_epochs() {
        let graph = sample_graph().unwrap();
        let parameters = Parameters {
            total_epochs: 0,
            ..Parameters::default()
        };
        let simulation = Simulation::new(&graph, parameters).unwrap();
        let output = simulation.run(&SingleThreaded).unwrap();
        assert!(output.statistics.is_empty());
        assert_eq!(output.final_population, simulation.initial_population());
    }

    #[test]
    fn serial_and_parallel_runs_match() {
        let graph = sample_graph().unwrap();
        let parameters = Parameters {
            individual_count: 500,
            infectiosity: 0.2,
            seed: 1234,
            ..Parameters::default()
        };
        let simulation = Simulation::new(&graph, parameters).unwrap();
        let serial = simulation.run(&SingleThreaded).unwrap();
        let parallel = simulation
            .run(&PartitionedParallel::new(4).unwrap())
            .unwrap();

        assert_eq!(serial.statistics, parallel.statistics);
        assert_eq!(serial.census_snapshots, parallel.census_snapshots);
    }
}
