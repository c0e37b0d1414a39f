//! Location-local contact transmission.
//!
//! Transmission reads a [`ContactSnapshot`] taken once the Movement phase has finished for the
//! whole population, and writes only to the individual being exposed. An individual infected
//! during this phase is not infectious until the next epoch, whichever worker handles it and in
//! whatever order.
use rand::Rng;

use crate::graph::Location;
use crate::individual::Individual;

/// Where everyone stands and who is infectious, frozen after movement.
#[derive(Clone, Debug, Default)]
pub struct ContactSnapshot {
    locations: Vec<Location>,
    infected: Vec<bool>,
}

impl ContactSnapshot {
    #[must_use]
    pub fn capture(individuals: &[Individual]) -> Self {
        let (locations, infected) = individuals
            .iter()
            .map(|individual| (individual.location(), individual.is_infected()))
            .unzip();
        Self {
            locations,
            infected,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Number of infected individuals in the snapshot.
    #[must_use]
    pub fn infected_count(&self) -> usize {
        self.infected.iter().filter(|&&infected| infected).count()
    }

    /// Indices of infected individuals standing at `location`, in population order.
    pub fn infected_at(&self, location: Location) -> impl Iterator<Item = usize> + '_ {
        self.locations
            .iter()
            .zip(&self.infected)
            .enumerate()
            .filter(move |&(_, (&at, &infected))| infected && at == location)
            .map(|(index, _)| index)
    }
}

/// Exposes one individual to every infected individual sharing its location, one Bernoulli trial
/// per contact, until a trial succeeds. Only susceptible individuals are exposed. Returns whether
/// the individual became infected.
pub fn expose<R: Rng + ?Sized>(
    individual: &mut Individual,
    snapshot: &ContactSnapshot,
    rng: &mut R,
    infectiosity: f64,
) -> bool {
    if !individual.is_susceptible() {
        return false;
    }
    let location = individual.location();
    snapshot
        .infected_at(location)
        .any(|_| individual.try_infect(rng, infectiosity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define_rng;
    use crate::random::stream_rng;

    define_rng!(ContactRng);

    fn infected_at(location: usize) -> Individual {
        let mut individual = Individual::new(Location(location));
        individual.infect();
        individual
    }

    #[test]
    fn snapshot_lists_infected_by_location() {
        let population = vec![
            infected_at(0),
            Individual::new(Location(0)),
            infected_at(1),
            infected_at(0),
        ];
        let snapshot = ContactSnapshot::capture(&population);

        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot.infected_count(), 3);
        assert_eq!(snapshot.infected_at(Location(0)).collect::<Vec<_>>(), vec![0, 3]);
        assert_eq!(snapshot.infected_at(Location(1)).collect::<Vec<_>>(), vec![2]);
        assert_eq!(snapshot.infected_at(Location(2)).count(), 0);
    }

    #[test]
    fn certain_infection_when_co_located() {
        let snapshot = ContactSnapshot::capture(&[infected_at(3)]);
        let mut rng = stream_rng::<ContactRng>(0, 0, 0);

        let mut individual = Individual::new(Location(3));
        assert!(expose(&mut individual, &snapshot, &mut rng, 1.0));
        assert!(individual.is_infected());
    }

    #[test]
    fn no_contact_no_infection() {
        let snapshot = ContactSnapshot::capture(&[infected_at(3)]);
        let mut rng = stream_rng::<ContactRng>(0, 0, 0);

        let mut individual = Individual::new(Location(2));
        assert!(!expose(&mut individual, &snapshot, &mut rng, 1.0));
        assert!(individual.is_susceptible());
    }

    #[test]
    fn recovered_are_not_exposed() {
        let snapshot = ContactSnapshot::capture(&[infected_at(0)]);
        let mut rng = stream_rng::<ContactRng>(0, 0, 0);

        let mut individual = infected_at(0);
        individual.advance(1);
        assert!(!expose(&mut individual, &snapshot, &mut rng, 1.0));
        assert!(individual.is_recovered());
    }

    #[test]
    fn more_contacts_raise_infection_probability() {
        let few = ContactSnapshot::capture(&[infected_at(0)]);
        let many = ContactSnapshot::capture(&[infected_at(0); 5]);

        let mut infected_few = 0;
        let mut infected_many = 0;
        for index in 0..2000 {
            let mut individual = Individual::new(Location(0));
            let mut rng = stream_rng::<ContactRng>(3, 0, index);
            if expose(&mut individual, &few, &mut rng, 0.2) {
                infected_few += 1;
            }
            let mut individual = Individual::new(Location(0));
            let mut rng = stream_rng::<ContactRng>(3, 1, index);
            if expose(&mut individual, &many, &mut rng, 0.2) {
                infected_many += 1;
            }
        }
        // 1 - 0.8 = 0.2 and 1 - 0.8^5 ~= 0.67.
        assert!((infected_few - 400_i32).abs() < 80);
        assert!((infected_many - 1345_i32).abs() < 100);
    }
}
