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

use std::time::Duration;

use crate::solvers::mckp::MckpParameters;

/// Parameters of the anytime search
#[derive(Debug, Clone, Copy)]
pub struct SearchParameters {
    /// Largest width of the decompositions. The search runs the widths 1, 3, 5, ... up to it
    max_width: usize,
    /// Upper bound on the log-score of the constraint network
    threshold: f64,
    /// Time given to each width
    time_per_width: Duration,
    /// Minimum time between two progress records
    progress_interval: Duration,
    /// Seed of the random number generator
    seed: u64,
    /// Maximum number of iterations for each width, if any
    max_iterations: Option<usize>,
    /// Parameters of the knapsack solver called at each iteration
    mckp: MckpParameters,
}

impl SearchParameters {

    pub fn new(max_width: usize, threshold: f64, time_per_width: Duration, progress_interval: Duration, seed: u64, max_iterations: Option<usize>, mckp: MckpParameters) -> Self {
        Self {
            max_width,
            threshold,
            time_per_width,
            progress_interval,
            seed,
            max_iterations,
            mckp,
        }
    }

    pub fn max_width(&self) -> usize {
        self.max_width
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn time_per_width(&self) -> Duration {
        self.time_per_width
    }

    pub fn progress_interval(&self) -> Duration {
        self.progress_interval
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn max_iterations(&self) -> Option<usize> {
        self.max_iterations
    }

    pub fn mckp(&self) -> &MckpParameters {
        &self.mckp
    }

    /// Iterates over the widths of the search, by increasing order
    pub fn widths(&self) -> impl Iterator<Item = usize> {
        (1..=self.max_width).step_by(2)
    }
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            max_width: 15,
            threshold: 0.0,
            time_per_width: Duration::from_secs(1200),
            progress_interval: Duration::from_secs(1),
            seed: 0,
            max_iterations: None,
            mckp: MckpParameters::default(),
        }
    }
}
