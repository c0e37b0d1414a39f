use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DragonflyError;
use crate::individual::DiseaseParameters;
use crate::log::debug;

/// Configuration of one simulation run.
///
/// Every field has a default, so a JSON configuration file only needs to name the values it
/// changes:
///
/// ```json
/// { "individual_count": 5000, "infectiosity": 0.2, "seed": 42 }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Parameters {
    pub individual_count: usize,
    pub total_epochs: usize,
    /// The first `initial_infected_count` individuals are infected before epoch 0.
    pub initial_infected_count: usize,
    /// Per-contact infection probability.
    pub infectiosity: f64,
    /// Epochs from infection to recovery.
    pub disease_duration: u32,
    /// Workers used by the partitioned-parallel strategy.
    pub thread_count: usize,
    /// Runs per configuration when comparing strategies.
    pub repeat_count: usize,
    pub seed: u64,
    /// Weight of the stay-put candidate in the movement distribution.
    pub stay_weight: f64,
    /// Width of the density reward term is `expected_density / density_spread_divisor`.
    pub density_spread_divisor: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            individual_count: 1000,
            total_epochs: 30,
            initial_infected_count: 15,
            infectiosity: 0.13,
            disease_duration: 7,
            thread_count: 4,
            repeat_count: 4,
            seed: 0,
            stay_weight: 100.0,
            density_spread_divisor: 3.0,
        }
    }
}

impl Parameters {
    /// Reads parameters from a JSON file. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`DragonflyError::IoError`] if the file cannot be opened and
    /// [`DragonflyError::JsonError`] if it is not a valid parameter object.
    pub fn from_json_file(path: &Path) -> Result<Self, DragonflyError> {
        let reader = BufReader::new(File::open(path)?);
        let parameters: Parameters = serde_json::from_reader(reader)?;
        debug!("loaded parameters from {}: {parameters:?}", path.display());
        Ok(parameters)
    }

    #[must_use]
    pub fn disease(&self) -> DiseaseParameters {
        DiseaseParameters {
            infectiosity: self.infectiosity,
            duration: self.disease_duration,
        }
    }

    /// Checks the parameters against a graph of `location_count` locations. A run must not start
    /// unless this succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`DragonflyError::InvalidParameter`] naming the first offending field.
    pub fn validate(&self, location_count: usize) -> Result<(), DragonflyError> {
        if location_count == 0 {
            return Err(DragonflyError::invalid_parameter(
                "location_count",
                "the graph has no locations",
            ));
        }
        if self.individual_count == 0 {
            return Err(DragonflyError::invalid_parameter(
                "individual_count",
                "the population is empty",
            ));
        }
        if self.initial_infected_count > self.individual_count {
            return Err(DragonflyError::invalid_parameter(
                "initial_infected_count",
                format!(
                    "{} exceeds the population of {}",
                    self.initial_infected_count, self.individual_count
                ),
            ));
        }
        if !(0.0..=1.0).contains(&self.infectiosity) {
            return Err(DragonflyError::invalid_parameter(
                "infectiosity",
                format!("{} is not a probability in [0, 1]", self.infectiosity),
            ));
        }
        if self.disease_duration == 0 {
            return Err(DragonflyError::invalid_parameter(
                "disease_duration",
                "must be at least one epoch",
            ));
        }
        if self.thread_count == 0 {
            return Err(DragonflyError::invalid_parameter(
                "thread_count",
                "must be at least one",
            ));
        }
        if !self.stay_weight.is_finite() || self.stay_weight <= 0.0 {
            return Err(DragonflyError::invalid_parameter(
                "stay_weight",
                format!("{} is not finite and positive", self.stay_weight),
            ));
        }
        if !self.density_spread_divisor.is_finite() || self.density_spread_divisor <= 0.0 {
            return Err(DragonflyError::invalid_parameter(
                "density_spread_divisor",
                format!("{} is not finite and positive", self.density_spread_divisor),
            ));
        }
        debug!("parameters valid for {location_count} locations");
        Ok(())
    }
}
