//! Builds a [`ContactGraph`] from an edge-list file.
//!
//! Each non-comment line holds two raw location identifiers and an optional weight:
//!
//! ```text
//! # a,b[,weight]
//! 1000017,2000044
//! 1000017,31,2.5
//! ```
//!
//! Raw identifiers are unsigned integers of any width up to `u64`. They are mapped to dense
//! [`Location`]s in the order they are first seen.
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::DragonflyError;
use crate::graph::{ContactGraph, Location};
use crate::hashing::HashMap;
use crate::log::{info, warn};

const DEFAULT_EDGE_WEIGHT: f64 = 1.0;

/// A graph read from an edge list together with the raw identifier of every location.
#[derive(Clone, Debug)]
pub struct LoadedGraph {
    pub graph: ContactGraph,
    /// `raw_ids[location.index()]` is the identifier the location had in the file.
    pub raw_ids: Vec<u64>,
    locations: HashMap<u64, Location>,
}

impl LoadedGraph {
    /// Returns the dense location assigned to a raw identifier.
    #[must_use]
    pub fn location_of(&self, raw_id: u64) -> Option<Location> {
        self.locations.get(&raw_id).copied()
    }
}

/// Reads an edge-list file from disk.
///
/// # Errors
///
/// Returns [`DragonflyError::IoError`] if the file cannot be opened, and the errors of
/// [`read_edge_list`] for its contents.
pub fn load_edge_list(path: &Path) -> Result<LoadedGraph, DragonflyError> {
    let file = File::open(path)?;
    let loaded = read_edge_list(file)?;
    info!(
        "loaded {} locations and {} edges from {}",
        loaded.graph.location_count(),
        loaded.graph.edge_count(),
        path.display()
    );
    Ok(loaded)
}

/// Reads an edge list from any reader.
///
/// # Errors
///
/// Returns [`DragonflyError::MalformedEdgeRecord`] for a line that does not hold two integer
/// identifiers and an optional positive weight. A self-loop line is skipped with a warning, but
/// its identifier still gets a location.
pub fn read_edge_list<R: Read>(reader: R) -> Result<LoadedGraph, DragonflyError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .from_reader(reader);

    let mut graph = ContactGraph::default();
    let mut raw_ids = Vec::new();
    let mut locations: HashMap<u64, Location> = HashMap::default();

    for result in reader.records() {
        let record = result?;
        let line = record.position().map_or(0, |position| {
            usize::try_from(position.line()).unwrap_or(usize::MAX)
        });
        let (a, b, weight) = parse_record(&record, line)?;

        let mut intern = |raw_id: u64| {
            *locations.entry(raw_id).or_insert_with(|| {
                raw_ids.push(raw_id);
                graph.add_location()
            })
        };
        let a = intern(a);
        let b = intern(b);
        if a == b {
            warn!("skipping self-loop at location {a} on line {line}");
            continue;
        }
        graph.add_edge(a, b, weight).map_err(|error| match error {
            DragonflyError::InvalidWeight => DragonflyError::MalformedEdgeRecord {
                line,
                reason: error.to_string(),
            },
            other => other,
        })?;
    }

    Ok(LoadedGraph {
        graph,
        raw_ids,
        locations,
    })
}

fn parse_record(record: &StringRecord, line: usize) -> Result<(u64, u64, f64), DragonflyError> {
    let malformed = |reason: String| DragonflyError::MalformedEdgeRecord { line, reason };

    if !(2..=3).contains(&record.len()) {
        return Err(malformed(format!(
            "expected `a,b[,weight]`, found {} fields",
            record.len()
        )));
    }
    let parse_id = |field: &str| {
        field
            .parse::<u64>()
            .map_err(|e| malformed(format!("bad location id `{field}`: {e}")))
    };
    let a = parse_id(&record[0])?;
    let b = parse_id(&record[1])?;
    let weight = match record.get(2) {
        Some(field) if !field.is_empty() => field
            .parse::<f64>()
            .map_err(|e| malformed(format!("bad weight `{field}`: {e}")))?,
        _ => DEFAULT_EDGE_WEIGHT,
    };
    Ok((a, b, weight))
}

/// Returns the small eleven-location sample graph used when no edge list is given.
///
/// # Errors
///
/// Returns the errors of [`ContactGraph::add_edge`].
pub fn sample_graph() -> Result<ContactGraph, DragonflyError> {
    const NODES: &str = "abcdefghijk";
    const EDGES: [(char, char); 14] = [
        ('a', 'b'),
        ('a', 'c'),
        ('b', 'c'),
        ('b', 'h'),
        ('b', 'e'),
        ('c', 'h'),
        ('c', 'k'),
        ('d', 'e'),
        ('e', 'f'),
        ('e', 'h'),
        ('f', 'g'),
        ('h', 'i'),
        ('i', 'j'),
        ('j', 'k'),
    ];

    let mut graph = ContactGraph::new(NODES.len());
    let location = |node: char| Location(node as usize - 'a' as usize);
    for (a, b) in EDGES {
        graph.add_edge(location(a), location(b), DEFAULT_EDGE_WEIGHT)?;
    }
    Ok(graph)
}
