//! Wall-clock comparison of the execution strategies on the same run configuration.
use std::fmt::{self, Display};
use std::time::Duration;

use humantime::format_duration;
use serde::Serialize;

use crate::error::DragonflyError;
use crate::graph::ContactGraph;
use crate::log::info;
use crate::parameters::Parameters;
use crate::simulation::Simulation;
use crate::strategy::{ExecutionStrategy, PartitionedParallel, SingleThreaded};

/// Timings of `repeat_count` runs of one strategy configuration.
#[derive(Clone, Debug, Serialize)]
pub struct TimingRecord {
    pub strategy: &'static str,
    pub threads: usize,
    pub mean: Duration,
    pub runs: Vec<Duration>,
}

impl Display for TimingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} with {} threads: mean {} over {} runs",
            self.strategy,
            self.threads,
            format_duration(self.mean),
            self.runs.len()
        )
    }
}

/// Thread counts tried by [`compare_strategies`]: `thread_count`, halved until it reaches one.
#[must_use]
pub fn thread_schedule(thread_count: usize) -> Vec<usize> {
    let mut schedule = Vec::new();
    let mut threads = thread_count;
    while threads > 1 {
        schedule.push(threads);
        threads /= 2;
    }
    schedule.push(1);
    schedule
}

fn time_strategy(
    simulation: &Simulation,
    strategy: &dyn ExecutionStrategy,
    repeat_count: usize,
) -> Result<TimingRecord, DragonflyError> {
    let mut runs = Vec::with_capacity(repeat_count);
    for _ in 0..repeat_count {
        runs.push(simulation.run(strategy)?.wall_time);
    }
    let total: Duration = runs.iter().sum();
    let mean = u32::try_from(runs.len())
        .ok()
        .and_then(|count| total.checked_div(count))
        .unwrap_or_default();

    let record = TimingRecord {
        strategy: strategy.name(),
        threads: strategy.threads(),
        mean,
        runs,
    };
    info!("{record}");
    Ok(record)
}

/// Times the single-threaded strategy, then the partitioned-parallel strategy for every thread
/// count of [`thread_schedule`]. Every run starts from the same freshly placed population.
///
/// # Errors
///
/// Returns [`DragonflyError`] if the parameters are invalid for `graph`, a worker pool cannot be
/// built or a run fails.
pub fn compare_strategies(
    parameters: &Parameters,
    graph: &ContactGraph,
) -> Result<Vec<TimingRecord>, DragonflyError> {
    let simulation = Simulation::new(graph, parameters.clone())?;
    let repeat_count = parameters.repeat_count.max(1);

    let mut records = vec![time_strategy(&simulation, &SingleThreaded, repeat_count)?];
    for threads in thread_schedule(parameters.thread_count) {
        let strategy = PartitionedParallel::new(threads)?;
        records.push(time_strategy(&simulation, &strategy, repeat_count)?);
    }
    Ok(records)
}
