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

//! Loaders of the networks. Both networks of a problem are read from Markov networks in the UAI
//! format and must share the same variables.

use std::path::Path;

use thiserror::Error;

use crate::core::problem::Problem;

pub mod uai;

pub use uai::UaiReader;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("expected the MARKOV header, found {0:?}")]
    Header(String),
    #[error("unexpected end of file while reading {0}")]
    Truncated(&'static str),
    #[error("invalid token {token:?} while reading {context}")]
    Token {
        token: String,
        context: &'static str,
    },
    #[error("variable {0} has an empty domain")]
    EmptyDomain(usize),
    #[error("factor {factor} mentions variable {variable} but the network has {number_variables} variables")]
    UnknownVariable {
        factor: usize,
        variable: usize,
        number_variables: usize,
    },
    #[error("factor {factor} mentions variable {variable} twice")]
    DuplicateVariable {
        factor: usize,
        variable: usize,
    },
    #[error("factor {factor} declares {declared} entries but its scope has {expected} joint values")]
    EntryCount {
        factor: usize,
        declared: usize,
        expected: usize,
    },
    #[error("factor {factor} has the non-positive weight {weight} at entry {entry}")]
    NonPositiveWeight {
        factor: usize,
        entry: usize,
        weight: f64,
    },
    #[error("the constraint network has {constraint} variables but the objective network has {objective}")]
    VariableCount {
        constraint: usize,
        objective: usize,
    },
    #[error("variable {variable} has {constraint} values in the constraint network but {objective} in the objective network")]
    DomainMismatch {
        variable: usize,
        constraint: usize,
        objective: usize,
    },
}

/// Loads the constraint and objective networks of a problem. The objective network must have
/// the same variables, with the same domains, as the constraint network.
pub fn problem_from_files(constraint: &Path, objective: &Path) -> Result<Problem, ParseError> {
    let (variables, constraint) = UaiReader::new(constraint).read()?;
    let (objective_variables, objective) = UaiReader::new(objective).read()?;
    if variables.len() != objective_variables.len() {
        return Err(ParseError::VariableCount {
            constraint: variables.len(),
            objective: objective_variables.len(),
        });
    }
    for (c, o) in variables.iter().zip(objective_variables.iter()) {
        if c.domain_size() != o.domain_size() {
            return Err(ParseError::DomainMismatch {
                variable: c.id(),
                constraint: c.domain_size(),
                objective: o.domain_size(),
            });
        }
    }
    Ok(Problem::new(variables, constraint, objective))
}
