//Cmpe
//Copyright (C) 2024 The cmpe developers
//
//This program is free software: you can redistribute it and/or modify
//it under the terms of the GNU Affero General Public License as published by
//the Free Software Foundation, either version 3 of the License, or
//(at your option) any later version.
//
//This program is distributed in the hope that it will be useful,
//but WITHOUT ANY WARRANTY; without even the implied warranty of
//MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//GNU Affero General Public License for more details.
//
//You should have received a copy of the GNU Affero General Public License
//along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! This module provides the interaction graph of the problem. There is one node per variable,
//! and an edge between two variables if and only if at least one factor (of either network)
//! has both of them in its scope.
//!
//! Nodes can be removed from the graph (when they are moved into the separator). A removed
//! node loses all its edges but stays in the graph as an isolated node, so that indexes stay
//! valid during the whole decomposition.

use rustc_hash::FxHashSet;

use super::problem::VariableIndex;

pub struct InteractionGraph {
    /// For each node, the set of its neighbours
    adjacency: Vec<FxHashSet<usize>>,
    /// For each node, true iff it has been removed from the graph
    removed: Vec<bool>,
}

impl InteractionGraph {

    /// Builds the graph with `number_nodes` nodes from the scopes of the factors
    pub fn new<'a, I>(number_nodes: usize, scopes: I) -> Self
    where
        I: Iterator<Item = &'a [VariableIndex]>
    {
        let mut adjacency = (0..number_nodes).map(|_| FxHashSet::default()).collect::<Vec<FxHashSet<usize>>>();
        for scope in scopes {
            for (i, u) in scope.iter().copied().enumerate() {
                for v in scope.iter().copied().skip(i + 1) {
                    if u != v {
                        adjacency[u.0].insert(v.0);
                        adjacency[v.0].insert(u.0);
                    }
                }
            }
        }
        Self {
            adjacency,
            removed: vec![false; number_nodes],
        }
    }

    pub fn number_nodes(&self) -> usize {
        self.adjacency.len()
    }

    /// Returns the current degree of the node
    pub fn degree(&self, node: VariableIndex) -> usize {
        self.adjacency[node.0].len()
    }

    pub fn is_removed(&self, node: VariableIndex) -> bool {
        self.removed[node.0]
    }

    /// Returns the node of maximum degree among `candidates`, with its degree. Ties are broken
    /// in favour of the first candidate, so iterating candidates by increasing index selects the
    /// lowest index.
    pub fn max_degree_node<I>(&self, candidates: I) -> Option<(VariableIndex, usize)>
    where
        I: Iterator<Item = VariableIndex>
    {
        let mut best: Option<(VariableIndex, usize)> = None;
        for node in candidates {
            let degree = self.degree(node);
            if best.map_or(true, |(_, d)| degree > d) {
                best = Some((node, degree));
            }
        }
        best
    }

    /// Removes the node from the graph, with all its incident edges
    pub fn remove(&mut self, node: VariableIndex) {
        let neighbours = std::mem::take(&mut self.adjacency[node.0]);
        for neighbour in neighbours {
            self.adjacency[neighbour].remove(&node.0);
        }
        self.removed[node.0] = true;
    }

    /// Returns the connected components of the graph. Every node, removed or not, is in exactly
    /// one component. Components are discovered by increasing smallest node and each component
    /// is sorted.
    /// The exploration uses an explicit stack so that large graphs do not overflow the call stack.
    pub fn connected_components(&self) -> Vec<Vec<VariableIndex>> {
        let mut visited = vec![false; self.number_nodes()];
        let mut components: Vec<Vec<VariableIndex>> = vec![];
        let mut stack: Vec<usize> = vec![];
        for start in 0..self.number_nodes() {
            if visited[start] {
                continue;
            }
            let mut component: Vec<VariableIndex> = vec![];
            visited[start] = true;
            stack.push(start);
            while let Some(node) = stack.pop() {
                component.push(VariableIndex(node));
                for neighbour in self.adjacency[node].iter().copied() {
                    if !visited[neighbour] {
                        visited[neighbour] = true;
                        stack.push(neighbour);
                    }
                }
            }
            component.sort();
            components.push(component);
        }
        components
    }
}

#[cfg(test)]
mod test_graph {
    use super::*;

    fn scopes(raw: &[&[usize]]) -> Vec<Vec<VariableIndex>> {
        raw.iter().map(|s| s.iter().copied().map(VariableIndex).collect()).collect()
    }

    #[test]
    pub fn edges_from_scopes() {
        let s = scopes(&[&[0, 1, 2], &[2, 3], &[4]]);
        let g = InteractionGraph::new(5, s.iter().map(|v| v.as_slice()));
        assert_eq!(2, g.degree(VariableIndex(0)));
        assert_eq!(3, g.degree(VariableIndex(2)));
        assert_eq!(0, g.degree(VariableIndex(4)));
        assert!(g.adjacency[3].contains(&2));
        assert!(!g.adjacency[0].contains(&3));
    }

    #[test]
    pub fn remove_updates_neighbours() {
        let s = scopes(&[&[0, 1, 2], &[2, 3]]);
        let mut g = InteractionGraph::new(4, s.iter().map(|v| v.as_slice()));
        g.remove(VariableIndex(2));
        assert!(g.is_removed(VariableIndex(2)));
        assert_eq!(0, g.degree(VariableIndex(2)));
        assert_eq!(1, g.degree(VariableIndex(0)));
        assert_eq!(0, g.degree(VariableIndex(3)));
    }

    #[test]
    pub fn max_degree_prefers_lowest_index() {
        let s = scopes(&[&[0, 1], &[2, 3]]);
        let g = InteractionGraph::new(4, s.iter().map(|v| v.as_slice()));
        let (node, degree) = g.max_degree_node((0..4).map(VariableIndex)).unwrap();
        assert_eq!(VariableIndex(0), node);
        assert_eq!(1, degree);
        assert!(g.max_degree_node(std::iter::empty()).is_none());
    }

    #[test]
    pub fn components_are_sorted_and_ordered() {
        let s = scopes(&[&[4, 1], &[1, 3], &[0, 2]]);
        let g = InteractionGraph::new(6, s.iter().map(|v| v.as_slice()));
        let components = g.connected_components();
        let expected = vec![
            vec![VariableIndex(0), VariableIndex(2)],
            vec![VariableIndex(1), VariableIndex(3), VariableIndex(4)],
            vec![VariableIndex(5)],
        ];
        assert_eq!(expected, components);
    }

    #[test]
    pub fn long_chain_does_not_recurse() {
        let n = 200_000;
        let s = (0..n - 1).map(|i| vec![VariableIndex(i), VariableIndex(i + 1)]).collect::<Vec<Vec<VariableIndex>>>();
        let g = InteractionGraph::new(n, s.iter().map(|v| v.as_slice()));
        let components = g.connected_components();
        assert_eq!(1, components.len());
        assert_eq!(n, components[0].len());
    }
}
