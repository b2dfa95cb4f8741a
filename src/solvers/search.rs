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

//! Anytime local search for the constrained most probable explanation. The goal is to find an
//! assignment of the variables maximizing the score of the objective network while keeping the
//! score of the constraint network under a threshold.
//!
//! For each width h (1, 3, 5, ...), the variables are split in a cut and components of at most
//! h variables. The search then alternates between
//!     - a move on the cut variables, chosen by a local search (or a random escape when no
//!       improving move exists)
//!     - an optimal-ish assignment of the components given the cut, obtained by solving a
//!       multiple-choice knapsack problem in which each component is a bin
//! Each iteration produces a complete assignment and the best feasible one is kept across
//! all widths.

use std::time::{Duration, Instant};

use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::common::{CmpeError, SearchResult};
use crate::core::buckets::{Aggregates, Buckets};
use crate::core::problem::{FactorIndex, NetworkKind, Problem, VariableIndex};
use crate::core::separator::Decomposition;
use crate::parameters::SearchParameters;
use crate::progress::{ProgressRecord, ProgressSink};
use super::mckp::MckpSolver;
use super::statistics::Statistics;

/// Probability to re-randomize the whole cut when no improving move exists
const GLOBAL_ESCAPE_PROBABILITY: f64 = 0.1;

/// Best move on a single cut variable
struct CutMove {
    variable: VariableIndex,
    value: usize,
    constraint: f64,
    objective: f64,
}

/// The anytime search. It is generic over the destination of the progress records and has a
/// constant parameter that tells if statistics must be recorded or not.
pub struct AnytimeSearch<P, const S: bool>
where
    P: ProgressSink
{
    /// The paired networks, with the current assignment
    problem: Problem,
    parameters: SearchParameters,
    /// Single source of randomness of the search
    rng: StdRng,
    progress: P,
    statistics: Statistics<S>,
    /// For each variable, the factors of the constraint network mentioning it
    constraint_neighbours: Vec<Vec<FactorIndex>>,
    /// For each variable, the factors of the objective network mentioning it
    objective_neighbours: Vec<Vec<FactorIndex>>,
    best: SearchResult,
    /// Time at which the search started
    start: Instant,
    /// Elapsed time at the last progress record
    last_record: Duration,
}

impl<P, const S: bool> AnytimeSearch<P, S>
where
    P: ProgressSink
{
    pub fn new(problem: Problem, parameters: SearchParameters, progress: P) -> Self {
        let constraint_neighbours = Self::neighbours(&problem, NetworkKind::Constraint);
        let objective_neighbours = Self::neighbours(&problem, NetworkKind::Objective);
        let rng = StdRng::seed_from_u64(parameters.seed());
        Self {
            problem,
            parameters,
            rng,
            progress,
            statistics: Statistics::default(),
            constraint_neighbours,
            objective_neighbours,
            best: SearchResult::infeasible(),
            start: Instant::now(),
            last_record: Duration::ZERO,
        }
    }

    fn neighbours(problem: &Problem, kind: NetworkKind) -> Vec<Vec<FactorIndex>> {
        let network = problem.network(kind);
        let mut neighbours: Vec<Vec<FactorIndex>> = vec![vec![]; problem.number_variables()];
        for factor in network.factors_iter() {
            for variable in network[factor].scope().iter().copied() {
                neighbours[variable.0].push(factor);
            }
        }
        neighbours
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn best(&self) -> &SearchResult {
        &self.best
    }

    pub fn into_progress(self) -> P {
        self.progress
    }

    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Runs the search for every width and returns the best feasible assignment found
    pub fn search(&mut self) -> Result<SearchResult, CmpeError> {
        self.start = Instant::now();
        self.last_record = Duration::ZERO;
        let widths = self.parameters.widths().collect::<Vec<usize>>();
        for width in widths {
            self.search_width(width)?;
        }
        self.statistics.print();
        Ok(self.best.clone())
    }

    fn search_width(&mut self, width: usize) -> Result<(), CmpeError> {
        let decomposition = Decomposition::new(&self.problem, width);
        let buckets = Buckets::new(&self.problem, &decomposition);
        info!("width {}: {} cut variables, {} components (largest {}), {} conditioned", width, decomposition.cut().len(), decomposition.number_components(), decomposition.largest_component_size(), buckets.number_conditioned());
        self.statistics.width(decomposition.cut().len(), decomposition.number_components());

        for variable in self.problem.variables_iter().collect::<Vec<VariableIndex>>() {
            self.randomize(variable);
        }
        let mut aggregates = Aggregates::new(&mut self.problem, &decomposition, &buckets);

        let width_start = Instant::now();
        let mut iteration = 0;
        loop {
            if width_start.elapsed() >= self.parameters.time_per_width() {
                break;
            }
            if self.parameters.max_iterations().map_or(false, |max| iteration >= max) {
                break;
            }
            iteration += 1;
            self.statistics.iteration();
            self.iterate(width, &decomposition, &buckets, &mut aggregates);
            self.report(width)?;
        }
        info!("width {} done after {} iterations, best {}", width, iteration, self.best.best_objective);
        Ok(())
    }

    fn iterate(&mut self, width: usize, decomposition: &Decomposition, buckets: &Buckets, aggregates: &mut Aggregates) {
        let threshold = self.parameters.threshold();
        let constraint = self.problem.constraint_score();
        let objective = self.problem.objective_score();

        match self.best_cut_move(decomposition.cut(), constraint, objective, threshold) {
            Some(m) => {
                self.problem.set_value(m.variable, m.value);
                self.statistics.local_move();
                if m.constraint <= threshold {
                    self.update_best(m.objective, width);
                }
            },
            None => self.escape(decomposition.cut()),
        }

        let (constraint_overflow, objective_overflow) = buckets.overflow_scores(&self.problem);
        let budget = threshold - constraint_overflow;
        aggregates.refresh(&mut self.problem, decomposition, buckets);
        let solver = MckpSolver::from_aggregates(aggregates.constraint(), aggregates.objective());
        trace!("knapsack with {} bins ({} fixed), budget {}", solver.number_bins(), solver.number_fixed_bins(), budget);
        let solution = solver.solve(budget, self.parameters.mckp(), &mut self.rng);
        for (component, choice) in decomposition.components_iter().zip(solution.choices().iter().copied()) {
            self.problem.set_address(&decomposition[component], choice);
        }
        if solution.is_feasible() {
            self.update_best(solution.profit() + objective_overflow, width);
        } else {
            trace!("infeasible knapsack for budget {}", budget);
            self.statistics.infeasible_knapsack();
        }
    }

    /// Returns the score of the factors mentioning the variable, for both networks
    fn local_scores(&self, variable: VariableIndex) -> (f64, f64) {
        (
            self.problem.partial_score(NetworkKind::Constraint, &self.constraint_neighbours[variable.0]),
            self.problem.partial_score(NetworkKind::Objective, &self.objective_neighbours[variable.0]),
        )
    }

    /// Evaluates every change of value of a single cut variable. If the current assignment is
    /// infeasible, the selected move is the one with the lowest constraint score, strictly below
    /// the current one. Otherwise, it is the feasible move with the highest objective score,
    /// strictly above the current one.
    fn best_cut_move(&mut self, cut: &[VariableIndex], constraint: f64, objective: f64, threshold: f64) -> Option<CutMove> {
        let feasible = constraint <= threshold;
        let mut best: Option<CutMove> = None;
        for variable in cut.iter().copied() {
            let current = self.problem[variable].value();
            let (constraint_before, objective_before) = self.local_scores(variable);
            for value in 0..self.problem[variable].domain_size() {
                if value == current {
                    continue;
                }
                self.problem.set_value(variable, value);
                let (constraint_after, objective_after) = self.local_scores(variable);
                let new_constraint = constraint - constraint_before + constraint_after;
                let new_objective = objective - objective_before + objective_after;
                let selected = if feasible {
                    let reference = best.as_ref().map_or(objective, |m| m.objective);
                    new_constraint <= threshold && new_objective > reference
                } else {
                    let reference = best.as_ref().map_or(constraint, |m| m.constraint);
                    new_constraint < reference
                };
                if selected {
                    best = Some(CutMove { variable, value, constraint: new_constraint, objective: new_objective });
                }
            }
            self.problem.set_value(variable, current);
        }
        best
    }

    /// Random perturbation of the cut, used when no single-variable move improves the assignment
    fn escape(&mut self, cut: &[VariableIndex]) {
        if cut.is_empty() {
            return;
        }
        if self.rng.gen_bool(GLOBAL_ESCAPE_PROBABILITY) {
            for variable in cut.iter().copied() {
                self.randomize(variable);
            }
            self.statistics.global_escape();
        } else {
            let variable = cut[self.rng.gen_range(0..cut.len())];
            self.randomize(variable);
            self.statistics.local_escape();
        }
    }

    fn randomize(&mut self, variable: VariableIndex) {
        let value = self.rng.gen_range(0..self.problem[variable].domain_size());
        self.problem.set_value(variable, value);
    }

    /// Records the current assignment if its objective score beats the best one
    fn update_best(&mut self, objective: f64, width: usize) {
        if objective > self.best.best_objective {
            let found_at = self.elapsed();
            debug!("new best {} at width {} after {:.3}s", objective, width, found_at.as_secs_f64());
            self.best = SearchResult {
                best_objective: objective,
                assignment: Some(self.problem.assignment()),
                found_at,
                width,
            };
            self.statistics.improvement();
        }
    }

    fn report(&mut self, width: usize) -> Result<(), CmpeError> {
        let elapsed = self.elapsed();
        if elapsed >= self.last_record + self.parameters.progress_interval() {
            let record = ProgressRecord {
                threshold: self.parameters.threshold(),
                width,
                best_objective: self.best.best_objective,
                elapsed,
            };
            self.progress.record(&record).map_err(CmpeError::Progress)?;
            self.last_record = elapsed;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test_search {
    use super::*;
    use crate::common::INFEASIBLE;
    use crate::core::factor::Factor;
    use crate::core::problem::Network;
    use crate::core::variable::Variable;
    use crate::progress::NoProgress;
    use crate::solvers::mckp::MckpParameters;
    use assert_float_eq::*;

    fn random_table(rng: &mut StdRng, size: usize) -> Vec<f64> {
        (0..size).map(|_| rng.gen_range(0.01f64..1.0).ln()).collect()
    }

    /// Random pairwise networks over `n` variables with the same structure, a chain plus some
    /// random edges
    fn random_problem(n: usize, extra: usize, seed: u64) -> Problem {
        let mut rng = StdRng::seed_from_u64(seed);
        let variables = (0..n).map(|i| Variable::new(i, 2 + i % 2)).collect::<Vec<Variable>>();
        let mut scopes = (0..n - 1).map(|i| vec![VariableIndex(i), VariableIndex(i + 1)]).collect::<Vec<Vec<VariableIndex>>>();
        for _ in 0..extra {
            let a = rng.gen_range(0..n);
            let b = rng.gen_range(0..n);
            if a != b {
                scopes.push(vec![VariableIndex(a), VariableIndex(b)]);
            }
        }
        let mut constraint: Vec<Factor> = vec![];
        let mut objective: Vec<Factor> = vec![];
        for scope in scopes {
            let size = scope.iter().map(|v| variables[v.0].domain_size()).product::<usize>();
            constraint.push(Factor::new(scope.clone(), random_table(&mut rng, size), &variables));
            objective.push(Factor::new(scope, random_table(&mut rng, size), &variables));
        }
        Problem::new(variables, Network::new(constraint), Network::new(objective))
    }

    fn brute_force(problem: &mut Problem, threshold: f64) -> f64 {
        let scope = problem.variables_iter().collect::<Vec<VariableIndex>>();
        let size = problem.variables().iter().map(|v| v.domain_size()).product::<usize>();
        let mut best = INFEASIBLE;
        for address in 0..size {
            problem.set_address(&scope, address);
            if problem.constraint_score() <= threshold && problem.objective_score() > best {
                best = problem.objective_score();
            }
        }
        best
    }

    fn parameters(max_width: usize, threshold: f64, max_iterations: usize, seed: u64) -> SearchParameters {
        SearchParameters::new(max_width, threshold, Duration::from_secs(30), Duration::ZERO, seed, Some(max_iterations), MckpParameters::new(20, 200))
    }

    #[test]
    pub fn single_component_reaches_unconstrained_optimum() {
        let mut problem = random_problem(4, 0, 1);
        let optimum = brute_force(&mut problem, f64::INFINITY);
        let mut search = AnytimeSearch::<NoProgress, false>::new(problem, parameters(5, 1e9, 5, 0), NoProgress);
        let result = search.search().unwrap();
        assert!(result.is_feasible());
        assert_float_absolute_eq!(optimum, result.best_objective, 1e-9);
    }

    #[test]
    pub fn best_assignment_is_feasible_and_scored() {
        for seed in 0..5 {
            let mut problem = random_problem(12, 6, seed);
            let reference = problem.clone();
            // Median constraint score of a few random assignments
            let mut rng = StdRng::seed_from_u64(seed);
            let mut scores = (0..21).map(|_| {
                let assignment = problem.variables().iter().map(|v| rng.gen_range(0..v.domain_size())).collect::<Vec<usize>>();
                problem.set_assignment(&assignment);
                problem.constraint_score()
            }).collect::<Vec<f64>>();
            scores.sort_by(|a, b| a.total_cmp(b));
            let threshold = scores[10];

            let mut search = AnytimeSearch::<NoProgress, true>::new(problem, parameters(5, threshold, 20, seed), NoProgress);
            let result = search.search().unwrap();
            assert!(result.is_feasible());
            let mut replay = reference.clone();
            replay.set_assignment(result.assignment.as_ref().unwrap());
            assert!(replay.constraint_score() <= threshold + 1e-9);
            assert_float_absolute_eq!(replay.objective_score(), result.best_objective, 1e-9);
            assert!(result.width == 1 || result.width == 3 || result.width == 5);
        }
    }

    #[test]
    pub fn never_better_than_exhaustive_search() {
        for seed in 0..5 {
            let mut problem = random_problem(7, 3, seed + 100);
            let scope = problem.variables_iter().collect::<Vec<VariableIndex>>();
            problem.set_address(&scope, 0);
            let threshold = problem.constraint_score();
            let optimum = brute_force(&mut problem, threshold);
            let mut search = AnytimeSearch::<NoProgress, false>::new(problem, parameters(3, threshold, 20, seed), NoProgress);
            let result = search.search().unwrap();
            if result.is_feasible() {
                assert!(result.best_objective <= optimum + 1e-9);
            }
        }
    }

    #[test]
    pub fn unsatisfiable_threshold_returns_sentinel() {
        let mut problem = random_problem(6, 2, 3);
        // Log-weights are negative, every score of this problem is below 0
        let threshold = -1e6;
        assert_eq!(INFEASIBLE, brute_force(&mut problem, threshold));
        let mut search = AnytimeSearch::<NoProgress, false>::new(problem, parameters(3, threshold, 10, 0), NoProgress);
        let result = search.search().unwrap();
        assert!(!result.is_feasible());
        assert_eq!(INFEASIBLE, result.best_objective);
    }

    #[test]
    pub fn same_seed_same_result() {
        let problem = random_problem(15, 10, 8);
        let mut a = AnytimeSearch::<NoProgress, false>::new(problem.clone(), parameters(5, -8.0, 15, 42), NoProgress);
        let mut b = AnytimeSearch::<NoProgress, false>::new(problem, parameters(5, -8.0, 15, 42), NoProgress);
        let ra = a.search().unwrap();
        let rb = b.search().unwrap();
        assert_eq!(ra.best_objective, rb.best_objective);
        assert_eq!(ra.assignment, rb.assignment);
        assert_eq!(ra.width, rb.width);
    }

    #[test]
    pub fn progress_is_recorded_at_each_iteration() {
        let problem = random_problem(8, 2, 5);
        let mut search = AnytimeSearch::<Vec<ProgressRecord>, false>::new(problem, parameters(3, 0.0, 3, 1), vec![]);
        let result = search.search().unwrap();
        let records = search.into_progress();
        assert_eq!(vec![1, 1, 1, 3, 3, 3], records.iter().map(|r| r.width).collect::<Vec<usize>>());
        assert!(records.iter().all(|r| r.threshold == 0.0));
        assert!(records.windows(2).all(|w| w[0].best_objective <= w[1].best_objective && w[0].elapsed <= w[1].elapsed));
        assert_eq!(result.best_objective, records[5].best_objective);
    }

    /// Chain of five variables with null pairwise factors. Only the middle variable 1, which has
    /// three values, is weighted in both networks
    fn weighted_cut_chain() -> Problem {
        let variables = (0..5).map(|i| Variable::new(i, if i == 1 { 3 } else { 2 })).collect::<Vec<Variable>>();
        let mut constraint: Vec<Factor> = vec![];
        for i in 0..4 {
            let scope = vec![VariableIndex(i), VariableIndex(i + 1)];
            let size = variables[i].domain_size() * variables[i + 1].domain_size();
            constraint.push(Factor::new(scope, vec![0.0; size], &variables));
        }
        constraint.push(Factor::new(vec![VariableIndex(1)], vec![5.0, 1.0, 3.0], &variables));
        let objective = vec![Factor::new(vec![VariableIndex(1)], vec![10.0, 1.0, 4.0], &variables)];
        Problem::new(variables, Network::new(constraint), Network::new(objective))
    }

    fn cut_move(search: &mut AnytimeSearch<NoProgress, false>, cut: &[VariableIndex], value: usize, threshold: f64) -> Option<(VariableIndex, usize, f64, f64)> {
        search.problem.set_value(VariableIndex(1), value);
        let constraint = search.problem.constraint_score();
        let objective = search.problem.objective_score();
        let m = search.best_cut_move(cut, constraint, objective, threshold);
        assert_eq!(value, search.problem[VariableIndex(1)].value());
        m.map(|m| (m.variable, m.value, m.constraint, m.objective))
    }

    #[test]
    pub fn cut_move_lowers_constraint_when_infeasible() {
        let problem = weighted_cut_chain();
        let decomposition = Decomposition::new(&problem, 3);
        assert_eq!(vec![VariableIndex(1)], decomposition.cut().to_vec());
        let mut search = AnytimeSearch::<NoProgress, false>::new(problem, parameters(3, 0.0, 1, 0), NoProgress);
        let (variable, value, constraint, objective) = cut_move(&mut search, decomposition.cut(), 0, 2.0).unwrap();
        assert_eq!(VariableIndex(1), variable);
        assert_eq!(1, value);
        assert_float_absolute_eq!(1.0, constraint, 1e-9);
        assert_float_absolute_eq!(1.0, objective, 1e-9);
    }

    #[test]
    pub fn cut_move_raises_objective_when_feasible() {
        let problem = weighted_cut_chain();
        let decomposition = Decomposition::new(&problem, 3);
        let mut search = AnytimeSearch::<NoProgress, false>::new(problem, parameters(3, 0.0, 1, 0), NoProgress);
        // Value 0 has the best objective but exceeds the threshold
        let (variable, value, constraint, objective) = cut_move(&mut search, decomposition.cut(), 1, 3.5).unwrap();
        assert_eq!(VariableIndex(1), variable);
        assert_eq!(2, value);
        assert_float_absolute_eq!(3.0, constraint, 1e-9);
        assert_float_absolute_eq!(4.0, objective, 1e-9);
    }

    #[test]
    pub fn no_cut_move_at_local_optimum() {
        let problem = weighted_cut_chain();
        let decomposition = Decomposition::new(&problem, 3);
        let mut search = AnytimeSearch::<NoProgress, false>::new(problem, parameters(3, 0.0, 1, 0), NoProgress);
        assert!(cut_move(&mut search, decomposition.cut(), 2, 3.5).is_none());
        assert!(cut_move(&mut search, decomposition.cut(), 1, 0.5).is_none());
        assert!(cut_move(&mut search, &[], 0, 2.0).is_none());
    }

    #[test]
    pub fn escape_changes_only_the_cut() {
        let variables = (0..7).map(|i| Variable::new(i, 50)).collect::<Vec<Variable>>();
        let problem = Problem::new(variables, Network::new(vec![]), Network::new(vec![]));
        let mut search = AnytimeSearch::<NoProgress, false>::new(problem, parameters(3, 0.0, 1, 7), NoProgress);
        let cut = [VariableIndex(1), VariableIndex(3), VariableIndex(5)];
        let mut single = 0;
        let mut several = 0;
        for _ in 0..200 {
            let before = search.problem.assignment();
            search.escape(&cut);
            let after = search.problem.assignment();
            for i in [0, 2, 4, 6] {
                assert_eq!(before[i], after[i]);
            }
            let changed = cut.iter().filter(|v| before[v.0] != after[v.0]).count();
            if changed <= 1 {
                single += 1;
            } else {
                several += 1;
            }
        }
        // Whole-cut escapes happen about once every ten calls
        assert!(single >= 150);
        assert!((5..=40).contains(&several));

        let before = search.problem.assignment();
        search.escape(&[]);
        assert_eq!(before, search.problem.assignment());
    }

    #[test]
    pub fn zero_width_limit_does_nothing() {
        let problem = random_problem(4, 0, 2);
        let mut search = AnytimeSearch::<NoProgress, false>::new(problem, parameters(0, 0.0, 3, 1), NoProgress);
        assert!(!search.search().unwrap().is_feasible());
    }
}
