use std::path::{Path, PathBuf};

use clap::{Args, Parser, ValueEnum};

use crate::benchmark::compare_strategies;
use crate::error::DragonflyError;
use crate::graph::{load_edge_list, sample_graph, ContactGraph};
use crate::log::{apply_log_spec, info, warn};
use crate::parameters::Parameters;
use crate::report::{
    validate_statistics, write_census_snapshots, write_graphviz, write_statistics_csv,
    EpidemicSummary,
};
use crate::simulation::{Simulation, SimulationOutput};
use crate::strategy::{ExecutionStrategy, PartitionedParallel, SingleThreaded};

pub const STATISTICS_FILE: &str = "statistics.csv";
pub const CENSUS_FILE: &str = "population.txt";
pub const GRAPH_FILE: &str = "graph.dot";

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum StrategyKind {
    /// Every phase on the main thread
    #[default]
    Serial,
    /// Every phase split over `--thread-count` workers
    Parallel,
    /// Time serial and parallel runs against each other
    Compare,
}

/// Command line overrides for [`Parameters`]. Unset options keep the value from the
/// configuration file, or the default.
#[derive(Args, Debug, Default)]
pub struct ParameterOverrides {
    /// Population size
    #[arg(short = 'n', long)]
    pub individual_count: Option<usize>,

    /// Number of epochs to simulate
    #[arg(short = 'e', long)]
    pub total_epochs: Option<usize>,

    /// Individuals infected before the first epoch
    #[arg(long)]
    pub initial_infected_count: Option<usize>,

    /// Per-contact infection probability
    #[arg(long)]
    pub infectiosity: Option<f64>,

    /// Epochs from infection to recovery
    #[arg(long)]
    pub disease_duration: Option<u32>,

    /// Workers for the parallel strategy
    #[arg(short = 't', long)]
    pub thread_count: Option<usize>,

    /// Runs per configuration with `--strategy compare`
    #[arg(long)]
    pub repeat_count: Option<usize>,

    /// Random seed
    #[arg(short = 'r', long)]
    pub seed: Option<u64>,

    /// Weight of staying at the current location
    #[arg(long)]
    pub stay_weight: Option<f64>,

    /// Divisor of the width of the density reward
    #[arg(long)]
    pub density_spread_divisor: Option<f64>,
}

impl ParameterOverrides {
    pub fn apply(&self, parameters: &mut Parameters) {
        macro_rules! set {
            ($($field:ident),*) => {
                $(if let Some(value) = self.$field {
                    parameters.$field = value;
                })*
            };
        }
        set!(
            individual_count,
            total_epochs,
            initial_infected_count,
            infectiosity,
            disease_duration,
            thread_count,
            repeat_count,
            seed,
            stay_weight,
            density_spread_divisor
        );
    }
}

/// Simulates an epidemic among individuals moving over a weighted location graph
#[derive(Parser, Debug)]
#[command(name = "dragonfly", version)]
pub struct BaseArgs {
    /// Edge list with one `a,b[,weight]` line per edge; the built-in sample graph if omitted
    #[arg(short, long)]
    pub graph: Option<PathBuf>,

    /// Optional path for a JSON parameters file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: ParameterOverrides,

    /// How epochs are executed
    #[arg(short, long, value_enum, default_value_t = StrategyKind::Serial)]
    pub strategy: StrategyKind,

    /// Directory for the statistics, census and graph files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// A level (`info`) or a list of `module=level` filters
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Print the epidemic summary to stdout
    #[arg(long)]
    pub summary: bool,
}

/// Parses the process arguments and runs.
///
/// # Errors
///
/// Returns the first [`DragonflyError`] of the run.
pub fn run() -> Result<(), DragonflyError> {
    run_with_args(BaseArgs::parse())
}

/// Runs with already parsed arguments.
///
/// # Errors
///
/// Returns [`DragonflyError`] if logging, parameters or the graph cannot be set up, or if the
/// run or its reports fail.
pub fn run_with_args(args: BaseArgs) -> Result<(), DragonflyError> {
    if let Some(spec) = &args.log_level {
        apply_log_spec(spec)?;
    }

    let mut parameters = match &args.config {
        Some(path) => {
            info!("Loading parameters from: {}", path.display());
            Parameters::from_json_file(path)?
        }
        None => Parameters::default(),
    };
    args.overrides.apply(&mut parameters);

    let graph = match &args.graph {
        Some(path) => load_edge_list(path)?.graph,
        None => {
            info!("no edge list given, using the sample graph");
            sample_graph()?
        }
    };

    let strategy: Box<dyn ExecutionStrategy> = match args.strategy {
        StrategyKind::Compare => {
            for record in compare_strategies(&parameters, &graph)? {
                println!("{record}");
            }
            return Ok(());
        }
        StrategyKind::Serial => Box::new(SingleThreaded),
        StrategyKind::Parallel => Box::new(PartitionedParallel::new(parameters.thread_count)?),
    };

    let simulation = Simulation::new(&graph, parameters)?;
    let output = simulation.run(strategy.as_ref())?;
    let population = simulation.parameters().individual_count;
    validate_statistics(population, &output.statistics)?;

    if let Some(dir) = &args.output_dir {
        write_outputs(dir, &graph, &output)?;
    }

    if args.summary {
        match EpidemicSummary::from_statistics(population, &output.statistics) {
            Ok(summary) => println!("{summary}"),
            Err(error) => warn!("no summary: {error}"),
        }
    }
    Ok(())
}

fn write_outputs(
    dir: &Path,
    graph: &ContactGraph,
    output: &SimulationOutput,
) -> Result<(), DragonflyError> {
    write_statistics_csv(&dir.join(STATISTICS_FILE), &output.statistics)?;
    write_census_snapshots(&dir.join(CENSUS_FILE), &output.census_snapshots)?;
    write_graphviz(&dir.join(GRAPH_FILE), graph)?;
    info!("wrote reports to {}", dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn parse(arguments: &[&str]) -> BaseArgs {
        BaseArgs::try_parse_from(std::iter::once("dragonfly").chain(arguments.iter().copied()))
            .unwrap()
    }

    #[test]
    fn defaults() {
        let args = parse(&[]);
        assert_eq!(args.strategy, StrategyKind::Serial);
        assert!(args.graph.is_none());
        assert!(!args.summary);

        let mut parameters = Parameters::default();
        args.overrides.apply(&mut parameters);
        assert_eq!(parameters, Parameters::default());
    }

    #[test]
    fn overrides_replace_parameters() {
        let args = parse(&[
            "-n",
            "250",
            "--infectiosity",
            "0.4",
            "--seed",
            "9",
            "--strategy",
            "parallel",
            "-t",
            "3",
        ]);
        let mut parameters = Parameters::default();
        args.overrides.apply(&mut parameters);

        assert_eq!(args.strategy, StrategyKind::Parallel);
        assert_eq!(parameters.individual_count, 250);
        assert_eq!(parameters.thread_count, 3);
        assert_eq!(parameters.seed, 9);
        assert!((parameters.infectiosity - 0.4).abs() < f64::EPSILON);
        assert_eq!(parameters.total_epochs, 30);
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let result = BaseArgs::try_parse_from(["dragonfly", "--strategy", "gpu"]);
        assert!(result.is_err());
    }

    #[test]
    fn writes_outputs() {
        let temp_dir = tempdir().unwrap();
        let args = parse(&[
            "-n",
            "60",
            "-e",
            "4",
            "--output-dir",
            temp_dir.path().to_str().unwrap(),
        ]);
        run_with_args(args).unwrap();

        let statistics = fs::read_to_string(temp_dir.path().join(STATISTICS_FILE)).unwrap();
        assert_eq!(statistics.lines().count(), 5);
        let census = fs::read_to_string(temp_dir.path().join(CENSUS_FILE)).unwrap();
        assert_eq!(census.lines().count(), 4);
        assert!(temp_dir.path().join(GRAPH_FILE).exists());
    }

    #[test]
    fn invalid_parameters_fail() {
        let args = parse(&["--infectiosity", "1.5"]);
        assert!(matches!(
            run_with_args(args),
            Err(DragonflyError::InvalidParameter {
                name: "infectiosity",
                ..
            })
        ));
    }
}
