//! Output files and console summaries of a finished run.
//!
//! * [`write_statistics_csv`]: one row of hit / infected / recovered counts per epoch
//! * [`write_census_snapshots`]: the per-location census of every epoch
//! * [`write_graphviz`]: the contact graph in DOT format
//! * [`EpidemicSummary`]: final fractions and the epidemic peak
//! * [`validate_statistics`]: consistency checks on the statistics of a run
use std::ffi::OsStr;
use std::fmt::{self, Display};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::census::PopulationCensus;
use crate::epoch::EpochStatistics;
use crate::error::DragonflyError;
use crate::graph::ContactGraph;

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsRecord {
    pub epoch: usize,
    pub hitcount: usize,
    pub infectedcount: usize,
    pub recoveredcount: usize,
}

// Creates `path` and its parent directories. Statistics reports must be CSVs.
fn create_csv_file(path: &Path) -> Result<File, DragonflyError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => create_file(path),
        _ => Err(DragonflyError::ReportError(
            "Report output files must be CSVs at this time".to_string(),
        )),
    }
}

fn create_file(path: &Path) -> Result<File, DragonflyError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

/// Writes `epoch,hitcount,infectedcount,recoveredcount` rows.
///
/// # Errors
///
/// Returns [`DragonflyError::ReportError`] if `path` does not end in `.csv`, and an I/O or CSV
/// error if the file cannot be written.
pub fn write_statistics_csv(
    path: &Path,
    statistics: &[EpochStatistics],
) -> Result<(), DragonflyError> {
    let mut writer = csv::Writer::from_writer(create_csv_file(path)?);
    for (epoch, entry) in statistics.iter().enumerate() {
        writer.serialize(StatisticsRecord {
            epoch,
            hitcount: entry.hit_count,
            infectedcount: entry.infected_count,
            recoveredcount: entry.recovered_count,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes one line per epoch, every count followed by a comma.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be written.
pub fn write_census_snapshots(
    path: &Path,
    snapshots: &[PopulationCensus],
) -> Result<(), DragonflyError> {
    let mut writer = BufWriter::new(create_file(path)?);
    for census in snapshots {
        for count in census.counts() {
            write!(writer, "{count},")?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the graph as an undirected DOT graph.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be written.
pub fn write_graphviz(path: &Path, graph: &ContactGraph) -> Result<(), DragonflyError> {
    let mut writer = BufWriter::new(create_file(path)?);
    writeln!(writer, "graph G {{")?;
    for location in graph.locations() {
        writeln!(writer, "{location}[label=\"Location\"];")?;
    }
    for (a, b, weight) in graph.edges() {
        writeln!(writer, "{a}--{b} [weight={weight}];")?;
    }
    writeln!(writer, "}}")?;
    writer.flush()?;
    Ok(())
}

/// Headline numbers of a run, as fractions of the population.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EpidemicSummary {
    pub population: usize,
    pub hit_fraction: f64,
    pub infected_fraction: f64,
    pub recovered_fraction: f64,
    /// Largest infected fraction seen in any epoch.
    pub peak_fraction: f64,
    /// First epoch at which the peak was reached.
    pub peak_epoch: usize,
}

impl EpidemicSummary {
    /// # Errors
    ///
    /// Returns [`DragonflyError::ReportError`] for an empty population or a run with no epochs.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_statistics(
        population: usize,
        statistics: &[EpochStatistics],
    ) -> Result<Self, DragonflyError> {
        let Some(last) = statistics.last() else {
            return Err(DragonflyError::ReportError(
                "cannot summarize a run without epochs".to_string(),
            ));
        };
        if population == 0 {
            return Err(DragonflyError::ReportError(
                "cannot summarize an empty population".to_string(),
            ));
        }

        let mut peak_size = 0;
        let mut peak_epoch = 0;
        for (epoch, entry) in statistics.iter().enumerate() {
            if entry.infected_count > peak_size {
                peak_size = entry.infected_count;
                peak_epoch = epoch;
            }
        }

        let fraction = |count: usize| count as f64 / population as f64;
        Ok(Self {
            population,
            hit_fraction: fraction(last.hit_count),
            infected_fraction: fraction(last.infected_count),
            recovered_fraction: fraction(last.recovered_count),
            peak_fraction: fraction(peak_size),
            peak_epoch,
        })
    }
}

impl Display for EpidemicSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-- Epidemic Results --")?;
        writeln!(f, "Hit: {:.2} %", 100.0 * self.hit_fraction)?;
        writeln!(f, "Infected: {:.2} %", 100.0 * self.infected_fraction)?;
        writeln!(f, "Recovered: {:.2} %", 100.0 * self.recovered_fraction)?;
        writeln!(f, "Epidemic Peak: {:.2} %", 100.0 * self.peak_fraction)?;
        write!(f, "Epidemic Peak Epoch: {}", self.peak_epoch)
    }
}

/// Checks the statistics of a finished run: every count lies in `0..=population`, hit equals
/// infected plus recovered, and the hit and recovered counts never decrease.
///
/// # Errors
///
/// Returns [`DragonflyError::ReportError`] describing the first inconsistent epoch.
pub fn validate_statistics(
    population: usize,
    statistics: &[EpochStatistics],
) -> Result<(), DragonflyError> {
    let mut previous = EpochStatistics::default();
    for (epoch, entry) in statistics.iter().enumerate() {
        let fail = |reason: String| -> Result<(), DragonflyError> {
            Err(DragonflyError::ReportError(format!(
                "epoch {epoch}: {reason} ({entry:?})"
            )))
        };
        if entry.hit_count > population
            || entry.infected_count > population
            || entry.recovered_count > population
        {
            return fail(format!("count exceeds population of {population}"));
        }
        if entry.hit_count != entry.infected_count + entry.recovered_count {
            return fail("hit count is not infected plus recovered".to_string());
        }
        if entry.hit_count < previous.hit_count || entry.recovered_count < previous.recovered_count
        {
            return fail("hit or recovered count decreased".to_string());
        }
        previous = *entry;
    }
    Ok(())
}
