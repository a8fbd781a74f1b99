/// Level graph: map nodes connected by named directional edges.
///
/// The graph is authored data, defined once per game session and never
/// mutated at runtime. Edges are directed and not required to be
/// symmetric — a one-way passage is valid level design, and entering a
/// node must never expose an exit for an edge that does not exist.
///
/// Entry-side pairing is a fixed convention: traversing direction D lands
/// the player at the spawn point named after `D.opposite()` on the target
/// node. The pairing is a lookup, not per-edge configuration.
///
/// ## TOML format
///   ```toml
///   start = "map_1"
///
///   [nodes.map_1]
///   right = "map_2"
///
///   [nodes.map_2]
///   left = "map_1"
///   above = "map_3"
///   ```

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

/// Edge direction out of a map node. Also names the side of the target
/// map the player arrives from (after `opposite()`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Above,
    Below,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] =
        [Direction::Above, Direction::Below, Direction::Left, Direction::Right];

    /// Opposite-side lookup: exiting right arrives at the target's left.
    #[inline]
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Above => Direction::Below,
            Direction::Below => Direction::Above,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::Above => "above",
            Direction::Below => "below",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    pub fn parse(s: &str) -> Option<Direction> {
        match s {
            "above" => Some(Direction::Above),
            "below" => Some(Direction::Below),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("graph start node {0:?} is not defined")]
    MissingStart(String),
    #[error("node {node:?} has edge {direction} to unknown node {target:?}")]
    UnknownEdgeTarget {
        node: String,
        direction: &'static str,
        target: String,
    },
    #[error("unknown direction {0:?} in node {1:?}")]
    UnknownDirection(String, String),
    #[error("graph toml parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// One map node: id + outgoing edges keyed by direction.
#[derive(Clone, Debug)]
pub struct MapNode {
    pub id: String,
    edges: HashMap<Direction, String>,
}

impl MapNode {
    pub fn new(id: impl Into<String>) -> Self {
        MapNode { id: id.into(), edges: HashMap::new() }
    }

    pub fn with_edge(mut self, direction: Direction, target: impl Into<String>) -> Self {
        self.edges.insert(direction, target.into());
        self
    }

    pub fn edge(&self, direction: Direction) -> Option<&str> {
        self.edges.get(&direction).map(String::as_str)
    }

    pub fn edges(&self) -> impl Iterator<Item = (Direction, &str)> {
        self.edges.iter().map(|(d, t)| (*d, t.as_str()))
    }
}

/// Static adjacency of the whole session. Immutable after validation.
#[derive(Clone, Debug)]
pub struct LevelGraph {
    nodes: HashMap<String, MapNode>,
    start: String,
}

#[derive(Deserialize)]
struct TomlGraph {
    start: String,
    nodes: HashMap<String, HashMap<String, String>>,
}

impl LevelGraph {
    /// Build from nodes + start id. Fails loudly on dangling edges —
    /// the graph is build-time data, not user input.
    pub fn new(nodes: Vec<MapNode>, start: impl Into<String>) -> Result<Self, GraphError> {
        let start = start.into();
        let map: HashMap<String, MapNode> =
            nodes.into_iter().map(|n| (n.id.clone(), n)).collect();
        let graph = LevelGraph { nodes: map, start };
        graph.validate()?;
        Ok(graph)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, GraphError> {
        let raw: TomlGraph = toml::from_str(text)?;
        let mut nodes = Vec::with_capacity(raw.nodes.len());
        for (id, edges) in raw.nodes {
            let mut node = MapNode::new(&id);
            for (dir, target) in edges {
                let direction = Direction::parse(&dir)
                    .ok_or_else(|| GraphError::UnknownDirection(dir.clone(), id.clone()))?;
                node = node.with_edge(direction, target);
            }
            nodes.push(node);
        }
        LevelGraph::new(nodes, raw.start)
    }

    fn validate(&self) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&self.start) {
            return Err(GraphError::MissingStart(self.start.clone()));
        }
        for node in self.nodes.values() {
            for (direction, target) in node.edges() {
                if !self.nodes.contains_key(target) {
                    return Err(GraphError::UnknownEdgeTarget {
                        node: node.id.clone(),
                        direction: direction.name(),
                        target: target.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn node(&self, id: &str) -> Option<&MapNode> {
        self.nodes.get(id)
    }

    /// Target map id for an edge, if it exists.
    pub fn edge(&self, from: &str, direction: Direction) -> Option<&str> {
        self.nodes.get(from).and_then(|n| n.edge(direction))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// All edges in the graph as (from, direction, to).
    pub fn all_edges(&self) -> impl Iterator<Item = (&str, Direction, &str)> {
        self.nodes
            .values()
            .flat_map(|n| n.edges().map(move |(d, t)| (n.id.as_str(), d, t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_maps() -> LevelGraph {
        LevelGraph::new(
            vec![
                MapNode::new("map_1").with_edge(Direction::Right, "map_2"),
                MapNode::new("map_2").with_edge(Direction::Left, "map_1"),
            ],
            "map_1",
        )
        .unwrap()
    }

    #[test]
    fn opposite_is_an_involution() {
        for d in Direction::ALL {
            assert_eq!(d.opposite().opposite(), d);
        }
    }

    #[test]
    fn edge_lookup() {
        let g = two_maps();
        assert_eq!(g.edge("map_1", Direction::Right), Some("map_2"));
        assert_eq!(g.edge("map_1", Direction::Left), None);
        assert_eq!(g.edge("nowhere", Direction::Right), None);
    }

    #[test]
    fn one_way_passage_is_valid() {
        // A→B exists, B→A does not: validation must accept this.
        let g = LevelGraph::new(
            vec![
                MapNode::new("a").with_edge(Direction::Right, "b"),
                MapNode::new("b"),
            ],
            "a",
        )
        .unwrap();
        assert_eq!(g.edge("b", Direction::Left), None);
    }

    #[test]
    fn dangling_edge_rejected() {
        let err = LevelGraph::new(
            vec![MapNode::new("a").with_edge(Direction::Right, "ghost")],
            "a",
        );
        assert!(matches!(err, Err(GraphError::UnknownEdgeTarget { .. })));
    }

    #[test]
    fn missing_start_rejected() {
        let err = LevelGraph::new(vec![MapNode::new("a")], "b");
        assert!(matches!(err, Err(GraphError::MissingStart(_))));
    }

    #[test]
    fn toml_round() {
        let g = LevelGraph::from_toml_str(
            "start = \"map_1\"\n\n[nodes.map_1]\nright = \"map_2\"\n\n[nodes.map_2]\nleft = \"map_1\"\n",
        )
        .unwrap();
        assert_eq!(g.start(), "map_1");
        assert_eq!(g.edge("map_2", Direction::Left), Some("map_1"));
    }

    #[test]
    fn toml_unknown_direction_rejected() {
        let err = LevelGraph::from_toml_str(
            "start = \"a\"\n\n[nodes.a]\nsideways = \"a\"\n",
        );
        assert!(matches!(err, Err(GraphError::UnknownDirection(..))));
    }
}
