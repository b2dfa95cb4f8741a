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

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::parsers::ParseError;

/// Value returned when no feasible assignment is known (or when a knapsack has no feasible
/// selection of items)
pub const INFEASIBLE: f64 = f64::NEG_INFINITY;

/// Errors reported at the surface of the library
#[derive(Debug, Error)]
pub enum CmpeError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not write progress: {0}")]
    Progress(#[source] std::io::Error),
}

/// Best feasible assignment found by an anytime search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Log-score of the objective network for the best assignment, `INFEASIBLE` if none found
    pub best_objective: f64,
    /// Value of each variable in the best assignment
    pub assignment: Option<Vec<usize>>,
    /// Time elapsed since the start of the search when the best assignment was found
    pub found_at: Duration,
    /// Width of the decomposition in use when the best assignment was found
    pub width: usize,
}

impl SearchResult {

    pub fn infeasible() -> Self {
        Self {
            best_objective: INFEASIBLE,
            assignment: None,
            found_at: Duration::ZERO,
            width: 0,
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.assignment.is_some()
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.assignment {
            None => write!(f, "best {} | no feasible assignment", self.best_objective),
            Some(assignment) => {
                write!(f, "best {} | width {} | found after {:.3}s | assignment", self.best_objective, self.width, self.found_at.as_secs_f64())?;
                for value in assignment.iter() {
                    write!(f, " {}", value)?;
                }
                Ok(())
            },
        }
    }
}
