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

//! This module computes a k-separator of the interaction graph: a set of variables (the cut)
//! whose removal splits the remaining variables into connected components of at most k
//! variables each. It is a greedy heuristic and the cut is not guaranteed to be minimal.
//!
//! The decomposition works in two phases:
//!     1. While some node has a degree of at least k, the node of maximum degree is moved into
//!        the cut.
//!     2. While some component has more than k nodes, the node of maximum degree of the largest
//!        component is moved into the cut.
//! In both phases, ties are broken in favour of the smallest variable index, which makes the
//! decomposition deterministic.

use super::graph::InteractionGraph;
use super::problem::{Problem, VariableIndex};

/// Abstraction used as a typesafe way of retrieving a component of a `Decomposition`
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ComponentIndex(pub usize);

#[derive(Debug, Clone)]
pub struct Decomposition {
    /// Maximum size of a component
    width: usize,
    /// Variables of the separator, in the order in which they have been selected
    cut: Vec<VariableIndex>,
    /// The components, each one sorted by increasing variable index
    components: Vec<Vec<VariableIndex>>,
    /// For each variable, the component containing it. None for the variables in the cut
    membership: Vec<Option<ComponentIndex>>,
}

impl Decomposition {

    /// Computes the decomposition of the problem (both networks) for the given width
    pub fn new(problem: &Problem, width: usize) -> Self {
        let mut graph = InteractionGraph::new(problem.number_variables(), problem.scopes_iter());
        let mut cut: Vec<VariableIndex> = vec![];

        // Phase 1: removes high degree nodes
        loop {
            let candidate = graph.max_degree_node(problem.variables_iter().filter(|v| !graph.is_removed(*v)));
            match candidate {
                Some((node, degree)) if degree >= width => {
                    cut.push(node);
                    graph.remove(node);
                },
                _ => break,
            }
        }

        // Phase 2: splits the components that are still too large
        loop {
            let components = graph.connected_components();
            let mut largest: Option<&Vec<VariableIndex>> = None;
            for component in components.iter().filter(|c| !Self::is_cut_artifact(&graph, c)) {
                if largest.map_or(true, |l| component.len() > l.len()) {
                    largest = Some(component);
                }
            }
            match largest {
                Some(component) if component.len() > width => {
                    // A component is never empty, hence there is always a node to select
                    if let Some((node, _)) = graph.max_degree_node(component.iter().copied()) {
                        cut.push(node);
                        graph.remove(node);
                    }
                },
                _ => break,
            }
        }

        let components = graph.connected_components().into_iter().filter(|c| !Self::is_cut_artifact(&graph, c)).collect::<Vec<Vec<VariableIndex>>>();
        let mut membership: Vec<Option<ComponentIndex>> = vec![None; problem.number_variables()];
        for (i, component) in components.iter().enumerate() {
            for variable in component.iter().copied() {
                membership[variable.0] = Some(ComponentIndex(i));
            }
        }
        Self {
            width,
            cut,
            components,
            membership,
        }
    }

    /// A removed node is left as an isolated node in the graph. It then forms a singleton
    /// component that must not be reported.
    fn is_cut_artifact(graph: &InteractionGraph, component: &[VariableIndex]) -> bool {
        component.len() == 1 && graph.is_removed(component[0])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the variables of the separator
    pub fn cut(&self) -> &[VariableIndex] {
        &self.cut
    }

    pub fn number_components(&self) -> usize {
        self.components.len()
    }

    pub fn components(&self) -> &[Vec<VariableIndex>] {
        &self.components
    }

    /// Returns the component containing the variable, None if the variable is in the cut
    pub fn component_of(&self, variable: VariableIndex) -> Option<ComponentIndex> {
        self.membership[variable.0]
    }

    pub fn largest_component_size(&self) -> usize {
        self.components.iter().map(|c| c.len()).max().unwrap_or(0)
    }

    // --- ITERATOR --- //

    pub fn components_iter(&self) -> impl Iterator<Item = ComponentIndex> {
        (0..self.components.len()).map(ComponentIndex)
    }
}

impl std::ops::Index<ComponentIndex> for Decomposition {
    type Output = [VariableIndex];

    fn index(&self, index: ComponentIndex) -> &Self::Output {
        &self.components[index.0]
    }
}
