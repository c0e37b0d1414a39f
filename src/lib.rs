//! Epidemic spread among individuals moving over a weighted location graph.
//!
//! A run places a population on the locations of a [`ContactGraph`](graph::ContactGraph), seeds
//! a number of infections and then repeats a fixed four-phase epoch:
//! * **Census**: count the individuals at every location.
//! * **Movement**: every individual stays or moves to a neighboring location, favoring strong
//!   edges and locations close to the expected population density.
//! * **Transmission**: every susceptible individual is exposed to the infected individuals at its
//!   location, one Bernoulli trial per contact.
//! * **Advancement**: infected individuals progress towards recovery, and the hit, infected and
//!   recovered counts of the epoch are recorded.
//!
//! The same epoch can be executed on a single thread or split over a pool of workers
//! ([`strategy`]). Every random draw is keyed by the seed, the epoch and the individual, so
//! both strategies produce identical results for the same seed.
//!
//! Edge lists are read by [`graph::loader`], and finished runs are written out by [`report`].
pub mod benchmark;
pub mod census;
pub mod epoch;
pub mod error;
pub mod graph;
pub mod hashing;
pub mod individual;
pub mod log;
pub mod movement;
pub mod parameters;
pub mod random;
pub mod report;
pub mod runner;
pub mod simulation;
pub mod strategy;
pub mod transmission;

pub use error::DragonflyError;

// Re-export for macros
pub use rand;
