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

//! Heuristic solver for the multiple-choice knapsack problem (MCKP). The items are partitioned
//! in bins and exactly one item must be chosen in each bin. The goal is to maximize the total
//! profit of the chosen items while keeping their total cost under a budget.
//!
//! In the search, each bin is a component of the decomposition and each item a joint value of
//! the component: its cost is the entry of the constraint aggregate and its profit the entry of
//! the objective aggregate.
//!
//! The solver works in four steps:
//!     1. Dominated items are removed from each bin
//!     2. The cheapest item of each bin gives the baseline. If the baseline is over budget, no
//!        choice of items can be under budget and the problem is infeasible
//!     3. A single greedy pass improves the baseline bin by bin
//!     4. Randomized restarts of a first-improvement local search refine the solution

use rand::Rng;

use crate::common::INFEASIBLE;
use crate::core::factor::Factor;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Item {
    pub cost: f64,
    pub profit: f64,
    /// Position of the item in its bin before any pruning
    pub position: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct MckpParameters {
    /// Number of restarts of the randomized local search
    restarts: usize,
    /// Number of moves tried in each restart
    iterations: usize,
}

impl MckpParameters {

    pub fn new(restarts: usize, iterations: usize) -> Self {
        Self { restarts, iterations }
    }

    pub fn restarts(&self) -> usize {
        self.restarts
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

impl Default for MckpParameters {
    fn default() -> Self {
        Self {
            restarts: 100,
            iterations: 1000,
        }
    }
}

/// Best solution found by the solver. If the problem is infeasible, the profit is `INFEASIBLE`
/// and the choices are the cheapest item of each bin.
#[derive(Debug, Clone)]
pub struct MckpSolution {
    profit: f64,
    cost: f64,
    /// For each bin, the position (before pruning) of the chosen item
    choices: Vec<usize>,
}

impl MckpSolution {

    pub fn profit(&self) -> f64 {
        self.profit
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn choices(&self) -> &[usize] {
        &self.choices
    }

    pub fn is_feasible(&self) -> bool {
        self.profit != INFEASIBLE
    }
}

/// Sorts the bin by increasing cost and removes the dominated items: an item is kept only if its
/// profit is strictly greater than the profit of every item kept before it. After this, the
/// profits are strictly increasing and the costs non-decreasing along the bin.
pub fn remove_dominated(items: &mut Vec<Item>) {
    if items.is_empty() {
        return;
    }
    items.sort_by(|a, b| a.cost.total_cmp(&b.cost));
    let mut max_profit = items[0].profit;
    let mut kept = 1;
    for i in 1..items.len() {
        if items[i].profit > max_profit {
            max_profit = items[i].profit;
            items.swap(kept, i);
            kept += 1;
        }
    }
    items.truncate(kept);
}

pub struct MckpSolver {
    /// The bins, without their dominated items
    bins: Vec<Vec<Item>>,
    /// Bins with more than one item after pruning. The other bins are fixed to their only item
    multi_item_bins: Vec<usize>,
}

impl MckpSolver {

    /// Creates a new solver where bin `i` has the items (costs[i][j], profits[i][j])
    pub fn new(costs: &[Vec<f64>], profits: &[Vec<f64>]) -> Self {
        assert_eq!(costs.len(), profits.len(), "Mismatch in the number of bins");
        let bins = costs.iter().zip(profits.iter()).enumerate().map(|(i, (c, p))| {
            assert_eq!(c.len(), p.len(), "Mismatch in the number of items in bin {}", i);
            c.iter().copied().zip(p.iter().copied()).enumerate().map(|(position, (cost, profit))| Item { cost, profit, position }).collect::<Vec<Item>>()
        }).collect::<Vec<Vec<Item>>>();
        Self::from_bins(bins)
    }

    /// Creates a new solver from the aggregates of the components. Both slices must have the
    /// same scopes, in the same order.
    pub fn from_aggregates(costs: &[Factor], profits: &[Factor]) -> Self {
        assert_eq!(costs.len(), profits.len(), "Mismatch in the number of bins");
        let bins = costs.iter().zip(profits.iter()).map(|(c, p)| {
            debug_assert_eq!(c.scope(), p.scope());
            c.table().iter().copied().zip(p.table().iter().copied()).enumerate().map(|(position, (cost, profit))| Item { cost, profit, position }).collect::<Vec<Item>>()
        }).collect::<Vec<Vec<Item>>>();
        Self::from_bins(bins)
    }

    fn from_bins(mut bins: Vec<Vec<Item>>) -> Self {
        let mut multi_item_bins: Vec<usize> = vec![];
        for (i, bin) in bins.iter_mut().enumerate() {
            assert!(!bin.is_empty(), "Bin {} has no item", i);
            remove_dominated(bin);
            if bin.len() > 1 {
                multi_item_bins.push(i);
            }
        }
        Self { bins, multi_item_bins }
    }

    pub fn number_bins(&self) -> usize {
        self.bins.len()
    }

    /// Returns the number of bins reduced to a single item
    pub fn number_fixed_bins(&self) -> usize {
        self.bins.len() - self.multi_item_bins.len()
    }

    fn positions(&self, selection: &[usize]) -> Vec<usize> {
        selection.iter().copied().enumerate().map(|(i, j)| self.bins[i][j].position).collect()
    }

    /// Solves the problem for the given budget. Returns an infeasible solution if and only if the
    /// cheapest item of every bin does not fit in the budget.
    pub fn solve<R: Rng + ?Sized>(&self, budget: f64, parameters: &MckpParameters, rng: &mut R) -> MckpSolution {
        let mut selection = vec![0; self.bins.len()];
        let baseline_cost = self.bins.iter().map(|b| b[0].cost).sum::<f64>();
        let baseline_profit = self.bins.iter().map(|b| b[0].profit).sum::<f64>();
        if baseline_cost > budget {
            return MckpSolution {
                profit: INFEASIBLE,
                cost: baseline_cost,
                choices: self.positions(&selection),
            };
        }
        let mut cost = baseline_cost;
        let mut profit = baseline_profit;

        // Single pass: for each bin, the best move that keeps the solution under budget
        for (i, bin) in self.bins.iter().enumerate() {
            let held = bin[selection[i]];
            let mut selected = selection[i];
            let mut selected_profit = profit;
            for (j, item) in bin.iter().enumerate() {
                let new_cost = cost - held.cost + item.cost;
                let new_profit = profit - held.profit + item.profit;
                if new_cost <= budget && new_profit > selected_profit {
                    selected = j;
                    selected_profit = new_profit;
                }
            }
            if selected != selection[i] {
                cost = cost - held.cost + bin[selected].cost;
                profit = selected_profit;
                selection[i] = selected;
            }
        }

        let mut best_profit = profit;
        let mut best_cost = cost;
        let mut best_selection = selection.clone();

        if !self.multi_item_bins.is_empty() {
            for _ in 0..parameters.restarts {
                selection.iter_mut().for_each(|s| *s = 0);
                cost = baseline_cost;
                profit = baseline_profit;
                for _ in 0..parameters.iterations {
                    let i = self.multi_item_bins[rng.gen_range(0..self.multi_item_bins.len())];
                    let bin = &self.bins[i];
                    // Uniform among the items that are not currently selected
                    let mut j = rng.gen_range(0..bin.len() - 1);
                    if j >= selection[i] {
                        j += 1;
                    }
                    let held = bin[selection[i]];
                    let new_cost = cost - held.cost + bin[j].cost;
                    let new_profit = profit - held.profit + bin[j].profit;
                    if new_cost <= budget && new_profit > profit {
                        cost = new_cost;
                        profit = new_profit;
                        selection[i] = j;
                        if profit > best_profit {
                            best_profit = profit;
                            best_cost = cost;
                            best_selection.copy_from_slice(&selection);
                        }
                    }
                }
            }
        }

        MckpSolution {
            profit: best_profit,
            cost: best_cost,
            choices: self.positions(&best_selection),
        }
    }
}

#[cfg(test)]
mod test_mckp {
    use super::*;
    use assert_float_eq::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn item(cost: f64, profit: f64, position: usize) -> Item {
        Item { cost, profit, position }
    }

    fn brute_force(costs: &[Vec<f64>], profits: &[Vec<f64>], budget: f64) -> f64 {
        let mut best = INFEASIBLE;
        let mut choice = vec![0; costs.len()];
        loop {
            let c = choice.iter().enumerate().map(|(i, j)| costs[i][*j]).sum::<f64>();
            let p = choice.iter().enumerate().map(|(i, j)| profits[i][*j]).sum::<f64>();
            if c <= budget && p > best {
                best = p;
            }
            let mut i = 0;
            loop {
                if i == choice.len() {
                    return best;
                }
                choice[i] += 1;
                if choice[i] < costs[i].len() {
                    break;
                }
                choice[i] = 0;
                i += 1;
            }
        }
    }

    #[test]
    pub fn dominated_items_are_removed() {
        let mut items = vec![item(3.0, 9.0, 0), item(1.0, 5.0, 1), item(2.0, 4.0, 2), item(4.0, 10.0, 3), item(4.0, 8.0, 4), item(1.0, 5.0, 5)];
        remove_dominated(&mut items);
        assert_eq!(vec![item(1.0, 5.0, 1), item(3.0, 9.0, 0), item(4.0, 10.0, 3)], items);
    }

    #[test]
    pub fn pruned_bins_are_staircases() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let mut items = (0..20).map(|p| item(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0), p)).collect::<Vec<Item>>();
            let min_cost = items.iter().map(|i| i.cost).fold(f64::INFINITY, f64::min);
            remove_dominated(&mut items);
            assert_eq!(min_cost, items[0].cost);
            for w in items.windows(2) {
                assert!(w[0].cost <= w[1].cost);
                assert!(w[0].profit < w[1].profit);
            }
        }
    }

    #[test]
    pub fn two_bins_example() {
        let costs = vec![vec![1.0, 3.0], vec![2.0, 4.0]];
        let profits = vec![vec![5.0, 9.0], vec![4.0, 10.0]];
        let solver = MckpSolver::new(&costs, &profits);
        let mut rng = StdRng::seed_from_u64(1000000);
        let solution = solver.solve(5.0, &MckpParameters::default(), &mut rng);
        assert!(solution.is_feasible());
        assert_float_absolute_eq!(15.0, solution.profit(), 1e-9);
        assert_float_absolute_eq!(5.0, solution.cost(), 1e-9);
        assert_eq!(vec![0, 1], solution.choices().to_vec());
    }

    #[test]
    pub fn baseline_over_budget_is_infeasible() {
        let costs = vec![vec![1.0, 3.0], vec![2.0, 4.0]];
        let profits = vec![vec![5.0, 9.0], vec![4.0, 10.0]];
        let solver = MckpSolver::new(&costs, &profits);
        let mut rng = StdRng::seed_from_u64(0);
        let solution = solver.solve(2.9, &MckpParameters::default(), &mut rng);
        assert!(!solution.is_feasible());
        assert_eq!(INFEASIBLE, solution.profit());
        assert_eq!(vec![0, 0], solution.choices().to_vec());
    }

    #[test]
    pub fn choices_are_positions_before_pruning() {
        // Bin 0: item 0 is dominated by item 2; bin 1 has a single item
        let costs = vec![vec![2.0, 5.0, 1.0], vec![0.5]];
        let profits = vec![vec![1.0, 7.0, 3.0], vec![2.0]];
        let solver = MckpSolver::new(&costs, &profits);
        assert_eq!(2, solver.bins[0].len());
        assert_eq!(2, solver.number_bins());
        assert_eq!(1, solver.number_fixed_bins());
        let mut rng = StdRng::seed_from_u64(3);
        let solution = solver.solve(10.0, &MckpParameters::default(), &mut rng);
        assert_eq!(vec![1, 0], solution.choices().to_vec());
        assert_float_absolute_eq!(9.0, solution.profit(), 1e-9);
    }

    #[test]
    pub fn only_fixed_bins() {
        let solver = MckpSolver::new(&[vec![1.0], vec![2.0]], &[vec![3.0], vec![4.0]]);
        let mut rng = StdRng::seed_from_u64(3);
        let solution = solver.solve(3.0, &MckpParameters::default(), &mut rng);
        assert_float_absolute_eq!(7.0, solution.profit(), 1e-9);
        assert!(!solver.solve(2.0, &MckpParameters::default(), &mut rng).is_feasible());
    }

    #[test]
    pub fn no_bins() {
        let solver = MckpSolver::new(&[], &[]);
        let mut rng = StdRng::seed_from_u64(3);
        let solution = solver.solve(0.0, &MckpParameters::default(), &mut rng);
        assert!(solution.is_feasible());
        assert_eq!(0.0, solution.profit());
        assert!(!solver.solve(-1.0, &MckpParameters::default(), &mut rng).is_feasible());
    }

    #[test]
    pub fn never_better_than_optimal() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..30 {
            let costs = (0..3).map(|_| (0..4).map(|_| rng.gen_range(0.0..10.0)).collect()).collect::<Vec<Vec<f64>>>();
            let profits = (0..3).map(|_| (0..4).map(|_| rng.gen_range(0.0..10.0)).collect()).collect::<Vec<Vec<f64>>>();
            let budget = rng.gen_range(5.0..25.0);
            let optimal = brute_force(&costs, &profits, budget);
            let solver = MckpSolver::new(&costs, &profits);
            let solution = solver.solve(budget, &MckpParameters::new(10, 100), &mut rng);
            assert_eq!(optimal == INFEASIBLE, !solution.is_feasible());
            if solution.is_feasible() {
                let c = solution.choices().iter().enumerate().map(|(i, j)| costs[i][*j]).sum::<f64>();
                let p = solution.choices().iter().enumerate().map(|(i, j)| profits[i][*j]).sum::<f64>();
                assert!(c <= budget + 1e-9);
                assert_float_absolute_eq!(p, solution.profit(), 1e-9);
                assert!(solution.profit() <= optimal + 1e-9);
            }
        }
    }
}
