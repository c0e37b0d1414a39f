//! A module for modeling the contact graph of locations.
//!
//! Locations are the nodes of an undirected graph; an edge carries a positive weight describing
//! how easily individuals move between its two endpoints. The graph is built once, by hand or by
//! the [`loader`], and is read-only while a simulation runs.

pub mod loader;
mod neighborhood;

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

pub use loader::{load_edge_list, read_edge_list, sample_graph, LoadedGraph};
pub use neighborhood::NeighborhoodIndex;

use crate::error::DragonflyError;

/// A dense location identifier in `0..location_count`.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Location(pub usize);

impl Location {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for Location {
    fn from(index: usize) -> Self {
        Location(index)
    }
}

/// One half of an undirected edge, stored in the adjacency list of the other endpoint.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Edge {
    /// The location this edge leads to.
    pub neighbor: Location,
    /// The ease of moving along this edge.
    pub weight: f64,
}

/// The underlying storage type representing the adjacency list
type AdjacencyList = Vec<Edge>;

#[derive(Clone, Debug, Default)]
pub struct ContactGraph {
    /// The backing storage vector for the adjacency lists, indexed by `Location`.
    adjacency_lists: Vec<AdjacencyList>,
    edge_count: usize,
}

impl ContactGraph {
    /// Creates a graph with `location_count` isolated locations.
    #[must_use]
    pub fn new(location_count: usize) -> Self {
        Self {
            adjacency_lists: vec![AdjacencyList::new(); location_count],
            edge_count: 0,
        }
    }

    #[must_use]
    pub fn location_count(&self) -> usize {
        self.adjacency_lists.len()
    }

    /// Number of undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Appends a new isolated location and returns its id.
    pub fn add_location(&mut self) -> Location {
        self.adjacency_lists.push(AdjacencyList::new());
        Location(self.adjacency_lists.len() - 1)
    }

    pub fn locations(&self) -> impl Iterator<Item = Location> {
        (0..self.location_count()).map(Location)
    }

    #[must_use]
    pub fn contains(&self, location: Location) -> bool {
        location.0 < self.adjacency_lists.len()
    }

    /// Adds an undirected edge between `a` and `b`. Adding an edge that already exists keeps a
    /// single edge carrying the larger of the two weights.
    ///
    /// # Errors
    ///
    /// Returns [`DragonflyError`] if:
    ///
    /// * `a` and `b` are the same location
    /// * `weight` is not finite and positive
    /// * either endpoint is not a location of this graph
    pub fn add_edge(&mut self, a: Location, b: Location, weight: f64) -> Result<(), DragonflyError> {
        if a == b {
            return Err(DragonflyError::CannotMakeEdgeToSelf);
        }
        if !weight.is_finite() || weight <= 0.0 {
            return Err(DragonflyError::InvalidWeight);
        }
        for location in [a, b] {
            if !self.contains(location) {
                return Err(DragonflyError::UnknownLocation(location));
            }
        }

        if let Some(existing) = self.adjacency_lists[a.0]
            .iter_mut()
            .find(|edge| edge.neighbor == b)
        {
            existing.weight = existing.weight.max(weight);
            let weight = existing.weight;
            if let Some(reverse) = self.adjacency_lists[b.0]
                .iter_mut()
                .find(|edge| edge.neighbor == a)
            {
                reverse.weight = weight;
            }
            return Ok(());
        }

        self.adjacency_lists[a.0].push(Edge {
            neighbor: b,
            weight,
        });
        self.adjacency_lists[b.0].push(Edge {
            neighbor: a,
            weight,
        });
        self.edge_count += 1;
        Ok(())
    }

    /// Returns the edges incident to `location` in insertion order, or an empty slice for a
    /// location outside the graph.
    #[must_use]
    pub fn neighbors(&self, location: Location) -> &[Edge] {
        self.adjacency_lists
            .get(location.0)
            .map_or(&[], Vec::as_slice)
    }

    /// Returns the weight of the edge between `a` and `b`, or `None` if they are not adjacent.
    #[must_use]
    pub fn edge_weight(&self, a: Location, b: Location) -> Option<f64> {
        self.neighbors(a)
            .iter()
            .find(|edge| edge.neighbor == b)
            .map(|edge| edge.weight)
    }

    #[must_use]
    pub fn degree(&self, location: Location) -> usize {
        self.neighbors(location).len()
    }

    /// Iterates every undirected edge once, as `(lower, higher, weight)`.
    pub fn edges(&self) -> impl Iterator<Item = (Location, Location, f64)> + '_ {
        self.adjacency_lists
            .iter()
            .enumerate()
            .flat_map(|(index, edges)| {
                edges
                    .iter()
                    .filter(move |edge| edge.neighbor.0 > index)
                    .map(move |edge| (Location(index), edge.neighbor, edge.weight))
            })
    }
}
