use crate::graph::{ContactGraph, Location};

/// Precomputed adjacency lookup from a location to the locations it is directly connected to.
///
/// Built once per run and shared read-only by every worker. Neighbors are stored in one flat
/// buffer with per-location offsets, so a lookup is a slice and not a hash probe.
#[derive(Clone, Debug, Default)]
pub struct NeighborhoodIndex {
    offsets: Vec<usize>,
    neighbors: Vec<Location>,
    weights: Vec<f64>,
}

impl NeighborhoodIndex {
    /// Collects the neighbors of every location of `graph` in edge insertion order.
    #[must_use]
    pub fn build(graph: &ContactGraph) -> Self {
        let mut offsets = Vec::with_capacity(graph.location_count() + 1);
        let mut neighbors = Vec::with_capacity(2 * graph.edge_count());
        let mut weights = Vec::with_capacity(2 * graph.edge_count());

        offsets.push(0);
        for location in graph.locations() {
            for edge in graph.neighbors(location) {
                neighbors.push(edge.neighbor);
                weights.push(edge.weight);
            }
            offsets.push(neighbors.len());
        }

        Self {
            offsets,
            neighbors,
            weights,
        }
    }

    #[must_use]
    pub fn location_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// The locations adjacent to `location`; empty for an isolated or unknown location.
    #[must_use]
    pub fn neighbors(&self, location: Location) -> &[Location] {
        self.range(location)
            .map_or(&[], |(start, end)| &self.neighbors[start..end])
    }

    /// Edge weights parallel to [`neighbors`](Self::neighbors).
    #[must_use]
    pub fn weights(&self, location: Location) -> &[f64] {
        self.range(location)
            .map_or(&[], |(start, end)| &self.weights[start..end])
    }

    fn range(&self, location: Location) -> Option<(usize, usize)> {
        let start = *self.offsets.get(location.index())?;
        let end = *self.offsets.get(location.index() + 1)?;
        Some((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::sample_graph;

    #[test]
    fn index_matches_graph() {
        let graph = sample_graph().unwrap();
        let index = NeighborhoodIndex::build(&graph);

        assert_eq!(index.location_count(), graph.location_count());
        for location in graph.locations() {
            let expected: Vec<Location> = graph
                .neighbors(location)
                .iter()
                .map(|edge| edge.neighbor)
                .collect();
            assert_eq!(index.neighbors(location), expected.as_slice());
            assert_eq!(index.weights(location).len(), expected.len());
        }
    }

    #[test]
    fn insertion_order_is_kept() {
        let mut graph = ContactGraph::new(4);
        graph.add_edge(Location(0), Location(3), 1.0).unwrap();
        graph.add_edge(Location(0), Location(1), 2.0).unwrap();
        graph.add_edge(Location(2), Location(0), 3.0).unwrap();

        let index = NeighborhoodIndex::build(&graph);
        assert_eq!(
            index.neighbors(Location(0)),
            &[Location(3), Location(1), Location(2)]
        );
        assert_eq!(index.weights(Location(0)), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn isolated_and_unknown_locations() {
        let graph = ContactGraph::new(1);
        let index = NeighborhoodIndex::build(&graph);
        assert!(index.neighbors(Location(0)).is_empty());
        assert!(index.neighbors(Location(5)).is_empty());
        assert!(NeighborhoodIndex::default().neighbors(Location(0)).is_empty());
    }
}
