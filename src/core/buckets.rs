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

//! This module assigns the factors of both networks to the components of a decomposition and
//! merges the factors of each component into a single aggregate factor per network.
//!
//! A factor is assigned to the component containing its non-cut variables. By construction of
//! the separator a factor can not meet two components (the two variables would have been
//! connected in the interaction graph). Factors whose scope is entirely in the cut go into the
//! overflow bucket, whose score only depends on the assignment of the cut.
//! A factor assigned to a component can still mention cut variables. In that case the aggregate
//! of the component is said to be conditioned: its table depends on the values of the cut and
//! must be recomputed when these change.

use crate::core::factor::Factor;
use crate::core::problem::{FactorIndex, Network, NetworkKind, Problem};
use crate::core::separator::{ComponentIndex, Decomposition};

pub struct Buckets {
    /// For each component, the factors of the constraint network assigned to it
    constraint: Vec<Vec<FactorIndex>>,
    /// For each component, the factors of the objective network assigned to it
    objective: Vec<Vec<FactorIndex>>,
    /// Factors of the constraint network over cut variables only
    constraint_overflow: Vec<FactorIndex>,
    /// Factors of the objective network over cut variables only
    objective_overflow: Vec<FactorIndex>,
    /// For each component, true iff one of its factors mentions a cut variable
    conditioned: Vec<bool>,
}

impl Buckets {

    pub fn new(problem: &Problem, decomposition: &Decomposition) -> Self {
        let n = decomposition.number_components();
        let mut buckets = Self {
            constraint: vec![vec![]; n],
            objective: vec![vec![]; n],
            constraint_overflow: vec![],
            objective_overflow: vec![],
            conditioned: vec![false; n],
        };
        Self::fill(problem.constraint(), decomposition, &mut buckets.constraint, &mut buckets.constraint_overflow, &mut buckets.conditioned);
        Self::fill(problem.objective(), decomposition, &mut buckets.objective, &mut buckets.objective_overflow, &mut buckets.conditioned);
        buckets
    }

    fn fill(network: &Network, decomposition: &Decomposition, buckets: &mut [Vec<FactorIndex>], overflow: &mut Vec<FactorIndex>, conditioned: &mut [bool]) {
        for factor in network.factors_iter() {
            let mut component: Option<ComponentIndex> = None;
            let mut touches_cut = false;
            for variable in network[factor].scope().iter().copied() {
                match decomposition.component_of(variable) {
                    Some(c) => {
                        if let Some(previous) = component {
                            assert_eq!(previous, c, "Factor {} spans components {} and {}; the decomposition is not a separator", factor.0, previous.0, c.0);
                        }
                        component = Some(c);
                    },
                    None => touches_cut = true,
                }
            }
            match component {
                Some(c) => {
                    buckets[c.0].push(factor);
                    if touches_cut {
                        conditioned[c.0] = true;
                    }
                },
                None => overflow.push(factor),
            }
        }
    }

    pub fn number_components(&self) -> usize {
        self.conditioned.len()
    }

    /// Returns the factors of one network assigned to the component
    pub fn bucket(&self, kind: NetworkKind, component: ComponentIndex) -> &[FactorIndex] {
        match kind {
            NetworkKind::Constraint => &self.constraint[component.0],
            NetworkKind::Objective => &self.objective[component.0],
        }
    }

    /// Returns the factors of one network that only mention cut variables
    pub fn overflow(&self, kind: NetworkKind) -> &[FactorIndex] {
        match kind {
            NetworkKind::Constraint => &self.constraint_overflow,
            NetworkKind::Objective => &self.objective_overflow,
        }
    }

    pub fn is_conditioned(&self, component: ComponentIndex) -> bool {
        self.conditioned[component.0]
    }

    pub fn number_conditioned(&self) -> usize {
        self.conditioned.iter().filter(|c| **c).count()
    }

    /// Returns the contribution of the overflow buckets to the (constraint, objective) scores for
    /// the current assignment of the cut
    pub fn overflow_scores(&self, problem: &Problem) -> (f64, f64) {
        (
            problem.partial_score(NetworkKind::Constraint, &self.constraint_overflow),
            problem.partial_score(NetworkKind::Objective, &self.objective_overflow),
        )
    }
}

/// The aggregate factors of every component, for both networks. The two aggregates of a
/// component share the same scope (the component) and therefore the same addressing.
pub struct Aggregates {
    constraint: Vec<Factor>,
    objective: Vec<Factor>,
}

impl Aggregates {

    /// Merges the buckets of every component for the current assignment of the cut
    pub fn new(problem: &mut Problem, decomposition: &Decomposition, buckets: &Buckets) -> Self {
        let mut constraint: Vec<Factor> = Vec::with_capacity(decomposition.number_components());
        let mut objective: Vec<Factor> = Vec::with_capacity(decomposition.number_components());
        for component in decomposition.components_iter() {
            let scope = &decomposition[component];
            constraint.push(problem.aggregate(NetworkKind::Constraint, buckets.bucket(NetworkKind::Constraint, component), scope));
            objective.push(problem.aggregate(NetworkKind::Objective, buckets.bucket(NetworkKind::Objective, component), scope));
        }
        Self { constraint, objective }
    }

    /// Recomputes the aggregates of the conditioned components. The other aggregates do not
    /// depend on the cut and are kept as is.
    pub fn refresh(&mut self, problem: &mut Problem, decomposition: &Decomposition, buckets: &Buckets) {
        for component in decomposition.components_iter().filter(|c| buckets.is_conditioned(*c)) {
            let scope = &decomposition[component];
            self.constraint[component.0] = problem.aggregate(NetworkKind::Constraint, buckets.bucket(NetworkKind::Constraint, component), scope);
            self.objective[component.0] = problem.aggregate(NetworkKind::Objective, buckets.bucket(NetworkKind::Objective, component), scope);
        }
    }

    pub fn constraint(&self) -> &[Factor] {
        &self.constraint
    }

    pub fn objective(&self) -> &[Factor] {
        &self.objective
    }
}
