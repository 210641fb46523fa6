//! Breadth-first path resolution over an undirected node graph
//!
//! The frame tree is held as a generic adjacency structure: parent links are
//! traversable in both directions and nothing assumes acyclicity, so the
//! resolver stays correct if future frames introduce multiple routes.

use std::collections::{HashMap, HashSet, VecDeque};

/// An undirected graph of named nodes with insertion-ordered adjacency.
///
/// Insertion order makes breadth-first traversal, and therefore every
/// resolved path, fully deterministic.
#[derive(Debug, Default)]
pub struct NodeGraph {
    adjacency: HashMap<String, Vec<String>>,
}

impl NodeGraph {
    pub fn new() -> Self {
        NodeGraph::default()
    }

    /// Add a node with no edges; a no-op if it already exists.
    pub fn add_node(&mut self, name: &str) {
        self.adjacency.entry(name.to_owned()).or_default();
    }

    /// Add an undirected edge, creating the endpoints as needed.
    pub fn add_edge(&mut self, a: &str, b: &str) {
        let list = self.adjacency.entry(a.to_owned()).or_default();
        if !list.iter().any(|n| n == b) {
            list.push(b.to_owned());
        }
        let list = self.adjacency.entry(b.to_owned()).or_default();
        if !list.iter().any(|n| n == a) {
            list.push(a.to_owned());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.adjacency.contains_key(name)
    }

    /// Shortest node sequence from `source` to `dest`, endpoints included.
    ///
    /// Breadth-first search with a visited set: minimal in edge count,
    /// terminates on any finite graph, cycles included. Returns `None` when
    /// either endpoint is missing or the endpoints are disconnected.
    pub fn path(&self, source: &str, dest: &str) -> Option<Vec<String>> {
        if !self.contains(source) || !self.contains(dest) {
            return None;
        }
        if source == dest {
            return Some(vec![source.to_owned()]);
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut predecessor: HashMap<&str, &str> = HashMap::new();
        let mut queue: VecDeque<&str> = VecDeque::new();

        visited.insert(source);
        queue.push_back(source);

        while let Some(current) = queue.pop_front() {
            for neighbor in &self.adjacency[current] {
                if !visited.insert(neighbor.as_str()) {
                    continue;
                }
                predecessor.insert(neighbor, current);
                if neighbor == dest {
                    let mut path = vec![dest.to_owned()];
                    let mut node = dest;
                    while let Some(&prev) = predecessor.get(node) {
                        path.push(prev.to_owned());
                        node = prev;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(neighbor);
            }
        }
        None
    }

    /// The edge list of the shortest path: consecutive node pairs.
    pub fn steps(&self, source: &str, dest: &str) -> Option<Vec<(String, String)>> {
        let path = self.path(source, dest)?;
        Some(
            path.windows(2)
                .map(|pair| (pair[0].clone(), pair[1].clone()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_graph() -> NodeGraph {
        //  F---E---L---M
        //     / \
        //    D---A
        //  / |   |
        // J  C---B
        // |  |   |
        // K  G   I
        // |   \ /
        // `----H
        let mut g = NodeGraph::new();
        g.add_edge("A", "B");
        g.add_edge("B", "C");
        g.add_edge("C", "D");
        g.add_edge("D", "A");
        g.add_edge("D", "E");
        g.add_edge("E", "F");
        g.add_edge("E", "A");
        g.add_edge("C", "G");
        g.add_edge("G", "H");
        g.add_edge("H", "I");
        g.add_edge("I", "B");
        g.add_edge("D", "J");
        g.add_edge("J", "K");
        g.add_edge("K", "H");
        g.add_edge("E", "L");
        g.add_edge("L", "M");
        g
    }

    fn assert_path(g: &NodeGraph, dest: &str, expected: &[&str]) {
        let path = g.path("A", dest).unwrap();
        assert_eq!(path, expected, "path(A, {dest})");
    }

    #[test]
    fn test_reference_paths() {
        let g = reference_graph();
        assert_path(&g, "B", &["A", "B"]);
        assert_path(&g, "C", &["A", "B", "C"]);
        assert_path(&g, "D", &["A", "D"]);
        assert_path(&g, "E", &["A", "E"]);
        assert_path(&g, "F", &["A", "E", "F"]);
        assert_path(&g, "G", &["A", "B", "C", "G"]);
        assert_path(&g, "H", &["A", "B", "I", "H"]);
        assert_path(&g, "I", &["A", "B", "I"]);
        assert_path(&g, "J", &["A", "D", "J"]);
        assert_path(&g, "K", &["A", "D", "J", "K"]);
        assert_path(&g, "L", &["A", "E", "L"]);
        assert_path(&g, "M", &["A", "E", "L", "M"]);
    }

    #[test]
    fn test_reference_steps() {
        let g = reference_graph();
        let pairs = |dest: &str| g.steps("A", dest).unwrap();
        let own = |v: &[(&str, &str)]| -> Vec<(String, String)> {
            v.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect()
        };
        assert_eq!(pairs("B"), own(&[("A", "B")]));
        assert_eq!(pairs("C"), own(&[("A", "B"), ("B", "C")]));
        assert_eq!(pairs("H"), own(&[("A", "B"), ("B", "I"), ("I", "H")]));
        assert_eq!(pairs("K"), own(&[("A", "D"), ("D", "J"), ("J", "K")]));
        assert_eq!(pairs("M"), own(&[("A", "E"), ("E", "L"), ("L", "M")]));
    }

    #[test]
    fn test_path_to_self() {
        let g = reference_graph();
        assert_eq!(g.path("A", "A").unwrap(), vec!["A".to_string()]);
        assert!(g.steps("A", "A").unwrap().is_empty());
    }

    #[test]
    fn test_disconnected_nodes() {
        let mut g = reference_graph();
        g.add_node("Z");
        assert!(g.path("A", "Z").is_none());
        assert!(g.path("Z", "A").is_none());
    }

    #[test]
    fn test_missing_node() {
        let g = reference_graph();
        assert!(g.path("A", "nope").is_none());
    }

    #[test]
    fn test_deterministic_across_calls() {
        let g = reference_graph();
        let first = g.path("A", "H").unwrap();
        for _ in 0..10 {
            assert_eq!(g.path("A", "H").unwrap(), first);
        }
    }

    #[test]
    fn test_terminates_on_cycle() {
        let mut g = NodeGraph::new();
        g.add_edge("X", "Y");
        g.add_edge("Y", "Z");
        g.add_edge("Z", "X");
        g.add_node("W");
        // The cycle never traps the search
        assert!(g.path("X", "W").is_none());
        assert_eq!(g.path("X", "Z").unwrap().len(), 2);
    }
}
