//! The per-agent disease state machine.
//!
//! ```text
//! Susceptible --infect--> Infected --advance (duration reached)--> Recovered
//! ```
//!
//! Recovered is terminal: a recovered individual is immune and never re-enters a transmission
//! trial.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::graph::Location;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiseaseState {
    #[default]
    Susceptible,
    Infected,
    Recovered,
}

/// The disease model shared by every individual of a run.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DiseaseParameters {
    /// Probability that one contact with an infected peer infects a susceptible individual.
    pub infectiosity: f64,
    /// Number of epochs an individual stays infected.
    pub duration: u32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Individual {
    state: DiseaseState,
    ever_infected: bool,
    epochs_infected: u32,
    location: Location,
}

impl Individual {
    /// A susceptible individual at `location`.
    #[must_use]
    pub fn new(location: Location) -> Self {
        Self {
            location,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn state(&self) -> DiseaseState {
        self.state
    }

    #[must_use]
    pub fn location(&self) -> Location {
        self.location
    }

    /// True once the individual has been infected, whatever its current state.
    #[must_use]
    pub fn ever_infected(&self) -> bool {
        self.ever_infected
    }

    #[must_use]
    pub fn epochs_infected(&self) -> u32 {
        self.epochs_infected
    }

    #[must_use]
    pub fn is_susceptible(&self) -> bool {
        self.state == DiseaseState::Susceptible
    }

    #[must_use]
    pub fn is_infected(&self) -> bool {
        self.state == DiseaseState::Infected
    }

    #[must_use]
    pub fn is_recovered(&self) -> bool {
        self.state == DiseaseState::Recovered
    }

    /// Moves a susceptible individual to `Infected`. Calling it in any other state leaves the
    /// individual untouched.
    pub fn infect(&mut self) {
        if self.state != DiseaseState::Susceptible {
            return;
        }
        self.state = DiseaseState::Infected;
        self.ever_infected = true;
        self.epochs_infected = 0;
    }

    /// Counts one more epoch of infection and recovers once `duration` epochs have passed.
    /// Does nothing for susceptible or recovered individuals.
    pub fn advance(&mut self, duration: u32) {
        if self.state != DiseaseState::Infected {
            return;
        }
        self.epochs_infected = self.epochs_infected.saturating_add(1);
        if self.epochs_infected >= duration {
            self.epochs_infected = duration;
            self.state = DiseaseState::Recovered;
        }
    }

    /// One Bernoulli trial against an infected contact. Returns whether the individual became
    /// infected. Only susceptible individuals draw from `rng`.
    pub fn try_infect<R: Rng + ?Sized>(&mut self, rng: &mut R, infectiosity: f64) -> bool {
        if !self.is_susceptible() {
            return false;
        }
        if rng.random::<f64>() < infectiosity {
            self.infect();
            return true;
        }
        false
    }

    pub fn move_to(&mut self, location: Location) {
        self.location = location;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define_rng;
    use crate::random::stream_rng;

    define_rng!(TrialRng);

    #[test]
    fn new_individual_is_susceptible() {
        let individual = Individual::new(Location(3));
        assert!(individual.is_susceptible());
        assert!(!individual.ever_infected());
        assert_eq!(individual.epochs_infected(), 0);
        assert_eq!(individual.location(), Location(3));
    }

    #[test]
    fn infect_sets_hit_flag() {
        let mut individual = Individual::new(Location(0));
        individual.infect();
        assert!(individual.is_infected());
        assert!(individual.ever_infected());
        assert_eq!(individual.epochs_infected(), 0);
    }

    #[test]
    fn infect_while_infected_keeps_counter() {
        let mut individual = Individual::new(Location(0));
        individual.infect();
        individual.advance(5);
        individual.infect();
        assert!(individual.is_infected());
        assert_eq!(individual.epochs_infected(), 1);
    }

    #[test]
    fn advance_recovers_after_duration() {
        let mut individual = Individual::new(Location(0));
        individual.infect();
        for _ in 0..2 {
            individual.advance(3);
            assert!(individual.is_infected());
        }
        individual.advance(3);
        assert!(individual.is_recovered());
        assert!(individual.ever_infected());
        assert_eq!(individual.epochs_infected(), 3);

        // Further calls are no-ops.
        individual.advance(3);
        assert!(individual.is_recovered());
        assert_eq!(individual.epochs_infected(), 3);
    }

    #[test]
    fn duration_one_recovers_on_first_advance() {
        let mut individual = Individual::new(Location(0));
        individual.infect();
        individual.advance(1);
        assert!(individual.is_recovered());
    }

    #[test]
    fn advance_ignores_susceptible() {
        let mut individual = Individual::new(Location(0));
        individual.advance(1);
        assert!(individual.is_susceptible());
        assert_eq!(individual.epochs_infected(), 0);
    }

    #[test]
    fn recovered_is_immune() {
        let mut rng = stream_rng::<TrialRng>(0, 0, 0);
        let mut individual = Individual::new(Location(0));
        individual.infect();
        individual.advance(1);
        assert!(!individual.try_infect(&mut rng, 1.0));
        individual.infect();
        assert!(individual.is_recovered());
    }

    #[test]
    fn try_infect_extremes() {
        let mut rng = stream_rng::<TrialRng>(0, 0, 0);
        let mut individual = Individual::new(Location(0));
        for _ in 0..100 {
            assert!(!individual.try_infect(&mut rng, 0.0));
        }
        assert!(individual.try_infect(&mut rng, 1.0));
        assert!(individual.is_infected());
    }

    #[test]
    fn try_infect_rate() {
        let mut infected = 0;
        for index in 0..4000 {
            let mut rng = stream_rng::<TrialRng>(7, 0, index);
            let mut individual = Individual::new(Location(0));
            if individual.try_infect(&mut rng, 0.25) {
                infected += 1;
            }
        }
        assert!((infected - 1000_i32).abs() < 120);
    }

    #[test]
    fn move_to_changes_only_location() {
        let mut individual = Individual::new(Location(0));
        individual.infect();
        individual.move_to(Location(4));
        assert_eq!(individual.location(), Location(4));
        assert!(individual.is_infected());
    }
}
