// Copyright 2026 The AMR-TV Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Undirected weighted graphs over sample ids, used to reduce each link
//! group to a spanning forest.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::hash::Hash;

use ordered_float::OrderedFloat;

/// Trait bound for graph node identifiers.
pub trait NodeId: Hash + Eq + Clone + Ord + Display {}
impl<T: Hash + Eq + Clone + Ord + Display> NodeId for T {}

/// A weighted edge connecting two nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge<N> {
    pub from: N,
    pub to: N,
    pub weight: f64,
}

impl<N: NodeId> Edge<N> {
    /// Endpoints in ascending order, independent of orientation.
    fn ordered_ends(&self) -> (&N, &N) {
        if self.from <= self.to {
            (&self.from, &self.to)
        } else {
            (&self.to, &self.from)
        }
    }
}

/// Immutable undirected weighted graph. Use `GraphBuilder` to construct.
pub struct Graph<N: NodeId> {
    nodes: BTreeSet<N>,
    edges: Vec<Edge<N>>,
    adj: BTreeMap<N, BTreeMap<N, f64>>,
}

impl<N: NodeId> Graph<N> {
    pub fn edges(&self) -> &[Edge<N>] {
        &self.edges
    }

    pub fn has_cycle(&self) -> bool {
        let mut visited = BTreeSet::new();

        for node in &self.nodes {
            if !visited.contains(node) && self.dfs_has_cycle(node, None, &mut visited) {
                return true;
            }
        }
        // parallel edges between the same pair also close a loop
        let mut seen = BTreeSet::new();
        self.edges.iter().any(|e| {
            let (a, b) = e.ordered_ends();
            !seen.insert((a.clone(), b.clone()))
        })
    }

    fn dfs_has_cycle(&self, node: &N, parent: Option<&N>, visited: &mut BTreeSet<N>) -> bool {
        visited.insert(node.clone());

        if let Some(neighbors) = self.adj.get(node) {
            for neighbor in neighbors.keys() {
                if neighbor == node {
                    return true;
                }
                if !visited.contains(neighbor) {
                    if self.dfs_has_cycle(neighbor, Some(node), visited) {
                        return true;
                    }
                } else if parent.is_none_or(|p| p != neighbor) {
                    return true;
                }
            }
        }
        false
    }

    /// Kruskal's algorithm: the minimum spanning forest of the graph.
    ///
    /// Equal weights are ordered by the (smaller, larger) endpoint pair so
    /// the result does not depend on edge insertion order.  Returned edges
    /// keep their input orientation and come back in acceptance order.
    pub fn minimum_spanning_forest(&self) -> Vec<Edge<N>> {
        let mut order: Vec<&Edge<N>> = self.edges.iter().collect();
        order.sort_by(|a, b| {
            let (a0, a1) = a.ordered_ends();
            let (b0, b1) = b.ordered_ends();
            (OrderedFloat(a.weight), a0, a1).cmp(&(OrderedFloat(b.weight), b0, b1))
        });

        let index: BTreeMap<&N, usize> = self.nodes.iter().enumerate().map(|(i, n)| (n, i)).collect();
        let mut sets = DisjointSet::new(self.nodes.len());
        let mut forest = Vec::new();
        for edge in order {
            let (Some(&a), Some(&b)) = (index.get(&edge.from), index.get(&edge.to)) else {
                continue;
            };
            if sets.union(a, b) {
                forest.push(edge.clone());
            }
        }
        forest
    }
}

/// Union-find with path halving and union by rank.
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        DisjointSet {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merges the sets holding `a` and `b`; false if they were already one.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }
}

/// Builder for constructing an immutable `Graph`.
pub struct GraphBuilder<N: NodeId> {
    nodes: BTreeSet<N>,
    edges: Vec<Edge<N>>,
    adj: BTreeMap<N, BTreeMap<N, f64>>,
}

impl<N: NodeId> Default for GraphBuilder<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: NodeId> GraphBuilder<N> {
    pub fn new() -> Self {
        Self {
            nodes: BTreeSet::new(),
            edges: Vec::new(),
            adj: BTreeMap::new(),
        }
    }

    pub fn add_edge(&mut self, from: N, to: N, weight: f64) -> &mut Self {
        self.nodes.insert(from.clone());
        self.nodes.insert(to.clone());
        self.adj
            .entry(from.clone())
            .or_default()
            .insert(to.clone(), weight);
        self.adj
            .entry(to.clone())
            .or_default()
            .insert(from.clone(), weight);
        self.edges.push(Edge { from, to, weight });
        self
    }

    pub fn build(self) -> Graph<N> {
        Graph {
            nodes: self.nodes,
            edges: self.edges,
            adj: self.adj,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Graph<String> {
        let mut builder = GraphBuilder::new();
        builder
            .add_edge("A".to_owned(), "B".to_owned(), 1.0)
            .add_edge("B".to_owned(), "C".to_owned(), 2.0)
            .add_edge("A".to_owned(), "C".to_owned(), 3.0);
        builder.build()
    }

    #[test]
    fn test_graph_builder() {
        let graph = triangle();
        let edges = graph.edges();
        assert_eq!(edges.len(), 3);
        assert_eq!(edges[2].from, "A");
        assert_eq!(edges[2].to, "C");
        assert_eq!(edges[2].weight, 3.0);
    }

    #[test]
    fn test_has_cycle_true_false() {
        assert!(triangle().has_cycle());

        let mut builder = GraphBuilder::new();
        builder.add_edge(1, 2, 1.0).add_edge(2, 3, 1.0).add_edge(4, 5, 1.0);
        assert!(!builder.build().has_cycle());

        let mut builder = GraphBuilder::new();
        builder.add_edge(1, 2, 1.0).add_edge(2, 1, 4.0);
        assert!(builder.build().has_cycle());
    }

    #[test]
    fn test_minimum_spanning_forest() {
        let forest = triangle().minimum_spanning_forest();
        let weights: Vec<f64> = forest.iter().map(|e| e.weight).collect();
        assert_eq!(weights, vec![1.0, 2.0]);

        let mut builder = GraphBuilder::new();
        for (from, to) in [(1, 2), (2, 3), (1, 3), (4, 5)] {
            builder.add_edge(from, to, 0.0);
        }
        let graph = builder.build();
        let forest = graph.minimum_spanning_forest();
        assert_eq!(forest.len(), 3);
        // all weights tie, so the lexicographically later pair (2, 3) is cut
        let pairs: Vec<(i32, i32)> = forest.iter().map(|e| (e.from, e.to)).collect();
        assert_eq!(pairs, vec![(1, 2), (1, 3), (4, 5)]);

        let mut reduced = GraphBuilder::new();
        for edge in forest {
            reduced.add_edge(edge.from, edge.to, edge.weight);
        }
        assert!(!reduced.build().has_cycle());
    }
}
