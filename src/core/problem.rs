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

//! Data structure representing the paired problem: one arena of variables and two Markov
//! networks over it. The constraint network gives the score that must stay under the threshold,
//! and the objective network gives the score to maximize.

use super::factor::{self, Factor};
use super::variable::Variable;

/// Abstraction used as a typesafe way of retrieving a `Variable` in the `Problem` structure
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VariableIndex(pub usize);

/// Abstraction used as a typesafe way of retrieving a `Factor` in a `Network`
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FactorIndex(pub usize);

/// Selects one of the two networks of a `Problem`
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum NetworkKind {
    Constraint,
    Objective,
}

/// A Markov network whose factors refer to an external arena of variables
#[derive(Debug, Clone, Default)]
pub struct Network {
    factors: Vec<Factor>,
}

impl Network {

    pub fn new(factors: Vec<Factor>) -> Self {
        Self { factors }
    }

    pub fn number_factors(&self) -> usize {
        self.factors.len()
    }

    /// Returns the log-score of the network for the current assignment of the variables
    pub fn score(&self, variables: &[Variable]) -> f64 {
        self.factors.iter().map(|f| f.value(variables)).sum()
    }

    /// Returns the sum of the given factors for the current assignment
    pub fn partial_score(&self, factors: &[FactorIndex], variables: &[Variable]) -> f64 {
        factors.iter().map(|f| self[*f].value(variables)).sum()
    }

    /// Merges the given factors into a single factor over `scope`. Each entry of the new table is
    /// the sum of the entries of the merged factors when the scope is set to the entry's address;
    /// variables outside of `scope` keep their current value. The values of the scope variables
    /// are restored before returning.
    pub fn aggregate(&self, factors: &[FactorIndex], scope: &[VariableIndex], variables: &mut [Variable]) -> Factor {
        let saved = scope.iter().map(|v| variables[v.0].value()).collect::<Vec<usize>>();
        let mut aggregated = Factor::zeros(scope.to_vec(), variables);
        for address in 0..aggregated.number_entries() {
            factor::set_address(scope, variables, address);
            aggregated.set_value_at(address, self.partial_score(factors, variables));
        }
        for (variable, value) in scope.iter().copied().zip(saved) {
            variables[variable.0].set_value(value);
        }
        aggregated
    }

    // --- ITERATOR --- //

    pub fn factors_iter(&self) -> impl Iterator<Item = FactorIndex> {
        (0..self.factors.len()).map(FactorIndex)
    }

    pub fn scopes_iter(&self) -> impl Iterator<Item = &[VariableIndex]> + '_ {
        self.factors.iter().map(|f| f.scope())
    }
}

impl std::ops::Index<FactorIndex> for Network {
    type Output = Factor;

    fn index(&self, index: FactorIndex) -> &Self::Output {
        &self.factors[index.0]
    }
}

#[derive(Debug, Clone)]
pub struct Problem {
    /// Arena of the variables, shared by both networks
    variables: Vec<Variable>,
    /// Network whose score is bounded by the threshold
    constraint: Network,
    /// Network whose score is maximized
    objective: Network,
}

impl Problem {

    pub fn new(variables: Vec<Variable>, constraint: Network, objective: Network) -> Self {
        Self {
            variables,
            constraint,
            objective,
        }
    }

    pub fn number_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn network(&self, kind: NetworkKind) -> &Network {
        match kind {
            NetworkKind::Constraint => &self.constraint,
            NetworkKind::Objective => &self.objective,
        }
    }

    pub fn constraint(&self) -> &Network {
        &self.constraint
    }

    pub fn objective(&self) -> &Network {
        &self.objective
    }

    pub fn constraint_score(&self) -> f64 {
        self.constraint.score(&self.variables)
    }

    pub fn objective_score(&self) -> f64 {
        self.objective.score(&self.variables)
    }

    /// Returns the sum of the given factors of one network for the current assignment
    pub fn partial_score(&self, kind: NetworkKind, factors: &[FactorIndex]) -> f64 {
        self.network(kind).partial_score(factors, &self.variables)
    }

    /// Merges factors of one network into a single factor over `scope` (see `Network::aggregate`)
    pub fn aggregate(&mut self, kind: NetworkKind, factors: &[FactorIndex], scope: &[VariableIndex]) -> Factor {
        let Problem { variables, constraint, objective } = self;
        match kind {
            NetworkKind::Constraint => constraint.aggregate(factors, scope, variables),
            NetworkKind::Objective => objective.aggregate(factors, scope, variables),
        }
    }

    pub fn set_value(&mut self, variable: VariableIndex, value: usize) {
        self.variables[variable.0].set_value(value);
    }

    /// Assigns the variables of `scope` to the joint value at `address`
    pub fn set_address(&mut self, scope: &[VariableIndex], address: usize) {
        factor::set_address(scope, &mut self.variables, address);
    }

    /// Returns a copy of the current joint assignment, indexed by variable
    pub fn assignment(&self) -> Vec<usize> {
        self.variables.iter().map(|v| v.value()).collect()
    }

    /// Replaces the current joint assignment
    pub fn set_assignment(&mut self, assignment: &[usize]) {
        assert_eq!(assignment.len(), self.variables.len(), "An assignment must give a value to every variable");
        for (variable, value) in self.variables.iter_mut().zip(assignment.iter().copied()) {
            variable.set_value(value);
        }
    }

    // --- ITERATOR --- //

    pub fn variables_iter(&self) -> impl Iterator<Item = VariableIndex> {
        (0..self.variables.len()).map(VariableIndex)
    }

    /// Iterates over the scopes of the factors of both networks
    pub fn scopes_iter(&self) -> impl Iterator<Item = &[VariableIndex]> + '_ {
        self.constraint.scopes_iter().chain(self.objective.scopes_iter())
    }
}

// --- Indexing the problem with the various indexes --- //

impl std::ops::Index<VariableIndex> for Problem {
    type Output = Variable;

    fn index(&self, index: VariableIndex) -> &Self::Output {
        &self.variables[index.0]
    }
}
