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

//! A variable of the paired Markov networks. Variables are stored once, in the arena of the
//! `Problem`, and the factors refer to them through `VariableIndex`. The value held by each
//! variable is the current joint assignment: changing it changes the score of every factor
//! (in both networks) that mentions the variable.

/// Data structure that actually holds the data of a variable of the input problem
#[derive(Debug, Clone)]
pub struct Variable {
    /// The id of the variable in the input files
    id: usize,
    /// Number of values the variable can take
    domain_size: usize,
    /// The value currently assigned to the variable, in [0, domain_size)
    value: usize,
}

impl Variable {

    pub fn new(id: usize, domain_size: usize) -> Self {
        debug_assert!(domain_size >= 1);
        Self {
            id,
            domain_size,
            value: 0,
        }
    }

    /// Returns the id of the variable
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the domain size of the variable
    pub fn domain_size(&self) -> usize {
        self.domain_size
    }

    /// Returns the value currently assigned to the variable
    pub fn value(&self) -> usize {
        self.value
    }

    /// Sets the value of the variable. The value must be in the domain of the variable.
    pub fn set_value(&mut self, value: usize) {
        debug_assert!(value < self.domain_size, "value {} out of the domain of {}", value, self);
        self.value = value;
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "X{}", self.id)
    }
}

#[cfg(test)]
mod test_variable {
    use super::Variable;

    #[test]
    pub fn new_variable_takes_first_value() {
        let v = Variable::new(3, 4);
        assert_eq!(3, v.id());
        assert_eq!(4, v.domain_size());
        assert_eq!(0, v.value());
    }

    #[test]
    pub fn set_value() {
        let mut v = Variable::new(0, 3);
        v.set_value(2);
        assert_eq!(2, v.value());
        assert_eq!("X0", format!("{}", v));
    }
}
