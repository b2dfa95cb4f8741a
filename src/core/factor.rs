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

//! This module provides the implementation of a factor (a log-potential). A factor is a pair
//! <X, table> where X is an ordered scope of variables and table holds one log-weight for each
//! joint value of X.
//! Entries are addressed in mixed radix, the first variable of the scope being the least
//! significant digit. For instance, with a scope (A, B) where A has 2 values and B has 3 values,
//! the entry of (A=1, B=2) is at address 1 + 2*2 = 5.

use super::problem::VariableIndex;
use super::variable::Variable;

/// Returns the number of joint values of the given scope
pub fn domain_product(scope: &[VariableIndex], variables: &[Variable]) -> usize {
    scope.iter().map(|v| variables[v.0].domain_size()).product()
}

/// Returns the address of the current values of the scope
pub fn address(scope: &[VariableIndex], variables: &[Variable]) -> usize {
    let mut address = 0;
    let mut multiplier = 1;
    for variable in scope.iter().copied() {
        address += multiplier * variables[variable.0].value();
        multiplier *= variables[variable.0].domain_size();
    }
    address
}

/// Sets the value of every variable in the scope so that the scope is at the given address
pub fn set_address(scope: &[VariableIndex], variables: &mut [Variable], address: usize) {
    let mut remaining = address;
    for variable in scope.iter().copied() {
        let domain_size = variables[variable.0].domain_size();
        variables[variable.0].set_value(remaining % domain_size);
        remaining /= domain_size;
    }
}

#[derive(Debug, Clone)]
pub struct Factor {
    /// Ordered scope of the factor
    scope: Vec<VariableIndex>,
    /// Log-weights, one for each joint value of the scope
    table: Vec<f64>,
}

impl Factor {

    /// Creates a new factor. Panics if the size of the table does not match the number of joint
    /// values of the scope.
    pub fn new(scope: Vec<VariableIndex>, table: Vec<f64>, variables: &[Variable]) -> Self {
        let expected = domain_product(&scope, variables);
        assert_eq!(expected, table.len(), "A factor over {} variables must have {} entries, got {}", scope.len(), expected, table.len());
        Self { scope, table }
    }

    /// Creates a factor whose entries are all 0 (i.e., a weight of 1 in probability space)
    pub fn zeros(scope: Vec<VariableIndex>, variables: &[Variable]) -> Self {
        let size = domain_product(&scope, variables);
        Self { scope, table: vec![0.0; size] }
    }

    pub fn scope(&self) -> &[VariableIndex] {
        &self.scope
    }

    pub fn table(&self) -> &[f64] {
        &self.table
    }

    pub fn number_entries(&self) -> usize {
        self.table.len()
    }

    /// Returns true iff the variable is in the scope of the factor
    pub fn mentions(&self, variable: VariableIndex) -> bool {
        self.scope.contains(&variable)
    }

    /// Returns the address of the entry selected by the current assignment
    pub fn address(&self, variables: &[Variable]) -> usize {
        address(&self.scope, variables)
    }

    /// Assigns the variables of the scope to the joint value at the given address
    pub fn set_address(&self, variables: &mut [Variable], address: usize) {
        set_address(&self.scope, variables, address)
    }

    /// Returns the log-weight selected by the current assignment
    pub fn value(&self, variables: &[Variable]) -> f64 {
        self.table[self.address(variables)]
    }

    pub fn value_at(&self, address: usize) -> f64 {
        self.table[address]
    }

    pub fn set_value_at(&mut self, address: usize, weight: f64) {
        self.table[address] = weight;
    }

    /// Returns the value taken by `variable` in the joint value at `address`, or None if the
    /// variable is not in the scope. The variables are not modified.
    pub fn value_in_entry(&self, variable: VariableIndex, address: usize, variables: &[Variable]) -> Option<usize> {
        let mut stride = 1;
        for v in self.scope.iter().copied() {
            let domain_size = variables[v.0].domain_size();
            if v == variable {
                return Some((address / stride) % domain_size);
            }
            stride *= domain_size;
        }
        None
    }
}
