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

use clap::{Parser, Subcommand};

use std::path::PathBuf;
use std::time::Duration;

use crate::parameters::SearchParameters;
use crate::solvers::mckp::MckpParameters;

#[derive(Debug, Parser)]
#[clap(name="cmpe", version, author, about)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Anytime search of the best assignment of the objective network under the threshold
    Search {
        /// The constraint network, in the UAI format
        #[clap(short, long, value_parser)]
        constraint: PathBuf,
        /// The objective network, in the UAI format
        #[clap(short, long, value_parser)]
        objective: PathBuf,
        /// Upper bound on the log-score of the constraint network
        #[clap(short = 'q', long, allow_negative_numbers = true)]
        threshold: f64,
        /// Largest width of the decompositions (widths 1, 3, 5, ... are searched)
        #[clap(short = 'k', long, default_value_t=15)]
        max_width: usize,
        /// Time given to each width, in seconds
        #[clap(short, long, default_value_t=1200)]
        timeout: u64,
        /// Seed of the random number generator
        #[clap(short, long, default_value_t=0)]
        seed: u64,
        /// Minimum time between two progress records, in seconds
        #[clap(long, default_value="1", value_parser=parse_seconds)]
        interval: Duration,
        /// If present, file in which the progress records are written. If it is a folder, the file
        /// is created inside it with a timestamped name
        #[clap(long)]
        progress: Option<PathBuf>,
        /// If present, maximum number of iterations for each width
        #[clap(long)]
        max_iterations: Option<usize>,
        /// Number of restarts of the knapsack local search
        #[clap(long, default_value_t=100)]
        restarts: usize,
        /// Number of moves in each restart of the knapsack local search
        #[clap(long, default_value_t=1000)]
        moves: usize,
        /// Collect stats during the search
        #[clap(long, action)]
        statistics: bool,
    },
    /// Writes the problem as a 0-1 integer linear program in the LP format
    ExportMip {
        /// The constraint network, in the UAI format
        #[clap(short, long, value_parser)]
        constraint: PathBuf,
        /// The objective network, in the UAI format
        #[clap(short, long, value_parser)]
        objective: PathBuf,
        /// Upper bound on the log-score of the constraint network
        #[clap(short = 'q', long, allow_negative_numbers = true)]
        threshold: f64,
        /// The output file
        #[clap(long)]
        output: PathBuf,
    },
    /// Prints the quantiles of the log-score of a network over random assignments
    Thresholds {
        /// The network, in the UAI format
        #[clap(short, long, value_parser)]
        model: PathBuf,
        /// Number of random assignments
        #[clap(long, default_value_t=1000000)]
        samples: usize,
        /// Seed of the random number generator
        #[clap(short, long, default_value_t=0)]
        seed: u64,
        /// If present, the quantiles are written in this file instead of the standard output
        #[clap(long)]
        output: Option<PathBuf>,
    },
}

/// Parses a non-negative, finite number of seconds
fn parse_seconds(arg: &str) -> Result<Duration, String> {
    let seconds = arg.parse::<f64>().map_err(|e| format!("{}: {}", arg, e))?;
    Duration::try_from_secs_f64(seconds).map_err(|e| format!("{}: {}", arg, e))
}

impl Command {

    /// Returns the parameters of the search, if the command is a search
    pub fn search_parameters(&self) -> Option<SearchParameters> {
        match self {
            Command::Search { threshold, max_width, timeout, seed, interval, max_iterations, restarts, moves, .. } => {
                Some(SearchParameters::new(
                    *max_width,
                    *threshold,
                    Duration::from_secs(*timeout),
                    *interval,
                    *seed,
                    *max_iterations,
                    MckpParameters::new(*restarts, *moves),
                ))
            },
            _ => None,
        }
    }
}
