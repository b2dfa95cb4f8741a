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

// Re-export the modules
pub mod common;
pub mod core;
pub mod parsers;
pub mod solvers;
pub mod parameters;
pub mod progress;
pub mod mip;
pub mod thresholds;
pub mod args;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

pub use common::*;
use args::{Args, Command};
use parameters::SearchParameters;
use progress::{CsvProgress, NoProgress, ProgressSink};
use solvers::{QuietSearch, StatSearch};
use crate::core::problem::Problem;

use peak_alloc::PeakAlloc;
#[global_allocator]
pub static PEAK_ALLOC: PeakAlloc = PeakAlloc;

/// Runs the command given on the command line
pub fn run(args: Args) -> Result<(), CmpeError> {
    let parameters = args.command.search_parameters();
    match args.command {
        Command::Search { constraint, objective, progress, statistics, .. } => {
            let parameters = parameters.unwrap_or_default();
            let result = search(&constraint, &objective, parameters, progress.as_deref(), statistics)?;
            println!("{}", result);
        },
        Command::ExportMip { constraint, objective, threshold, output } => {
            export_mip(&constraint, &objective, threshold, &output)?;
        },
        Command::Thresholds { model, samples, seed, output } => {
            let quantiles = thresholds(&model, samples, seed)?;
            write_quantiles(&quantiles, output.as_deref())?;
        },
    }
    Ok(())
}

/// Loads the two networks and runs the anytime search on them. If a progress path is given, the
/// progress records are written in it (or in a timestamped file inside it if it is a folder).
pub fn search(constraint: &Path, objective: &Path, parameters: SearchParameters, progress: Option<&Path>, statistics: bool) -> Result<SearchResult, CmpeError> {
    let problem = parsers::problem_from_files(constraint, objective)?;
    info!("{} variables, {} constraint factors, {} objective factors, threshold {}", problem.number_variables(), problem.constraint().number_factors(), problem.objective().number_factors(), parameters.threshold());
    match progress {
        None => run_search(problem, parameters, NoProgress, statistics),
        Some(path) => {
            let sink = if path.is_dir() {
                let (sink, file) = CsvProgress::timestamped(path).map_err(|source| CmpeError::Io { path: path.display().to_string(), source })?;
                info!("progress written in {}", file.display());
                sink
            } else {
                CsvProgress::create(path).map_err(|source| CmpeError::Io { path: path.display().to_string(), source })?
            };
            run_search(problem, parameters, sink, statistics)
        },
    }
}

fn run_search<P: ProgressSink>(problem: Problem, parameters: SearchParameters, progress: P, statistics: bool) -> Result<SearchResult, CmpeError> {
    if statistics {
        StatSearch::new(problem, parameters, progress).search()
    } else {
        QuietSearch::new(problem, parameters, progress).search()
    }
}

/// Writes the integer linear program of the problem in the LP format
pub fn export_mip(constraint: &Path, objective: &Path, threshold: f64, output: &Path) -> Result<(), CmpeError> {
    let problem = parsers::problem_from_files(constraint, objective)?;
    mip::write_lp(&problem, threshold, output)?;
    info!("integer program written in {}", output.display());
    Ok(())
}

/// Returns the minimum and the quantiles (every 5%) of the log-score of the network over random
/// assignments
pub fn thresholds(model: &Path, samples: usize, seed: u64) -> Result<Vec<f64>, CmpeError> {
    let (mut variables, network) = parsers::UaiReader::new(model).read()?;
    let mut rng = StdRng::seed_from_u64(seed);
    let scores = thresholds::sample_scores(&mut variables, &network, samples, &mut rng);
    Ok(thresholds::quantiles(&scores))
}

fn write_quantiles(quantiles: &[f64], output: Option<&Path>) -> Result<(), CmpeError> {
    match output {
        None => {
            let stdout = io::stdout();
            write_lines(quantiles, stdout.lock()).map_err(|source| CmpeError::Io { path: "stdout".to_string(), source })
        },
        Some(path) => {
            File::create(path)
                .and_then(|file| write_lines(quantiles, BufWriter::new(file)))
                .map_err(|source| CmpeError::Io { path: path.display().to_string(), source })
        },
    }
}

fn write_lines<W: Write>(quantiles: &[f64], mut writer: W) -> io::Result<()> {
    for q in quantiles.iter() {
        writeln!(writer, "{}", q)?;
    }
    writer.flush()
}
