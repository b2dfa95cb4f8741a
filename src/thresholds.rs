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

//! Helps choosing the threshold of a search. The log-score of a network is evaluated on
//! uniformly random assignments and the quantiles of these scores are reported: the minimum,
//! then every 5%.

use rand::Rng;

use crate::core::problem::Network;
use crate::core::variable::Variable;

/// Number of quantiles reported after the minimum
const NUMBER_QUANTILES: usize = 20;

/// Returns the scores of the network on `samples` random assignments, sorted by increasing order
pub fn sample_scores<R: Rng + ?Sized>(variables: &mut [Variable], network: &Network, samples: usize, rng: &mut R) -> Vec<f64> {
    let mut scores: Vec<f64> = Vec::with_capacity(samples);
    for _ in 0..samples {
        for variable in variables.iter_mut() {
            let value = rng.gen_range(0..variable.domain_size());
            variable.set_value(value);
        }
        scores.push(network.score(variables));
    }
    scores.sort_by(|a, b| a.total_cmp(b));
    scores
}

/// Returns the minimum of the sorted scores followed by their quantiles at 5%, 10%, ..., 100%
pub fn quantiles(sorted: &[f64]) -> Vec<f64> {
    if sorted.is_empty() {
        return vec![];
    }
    let n = sorted.len();
    let mut q = vec![sorted[0]];
    for i in 1..=NUMBER_QUANTILES {
        let index = (i * n / NUMBER_QUANTILES).max(1) - 1;
        q.push(sorted[index]);
    }
    q
}

#[cfg(test)]
mod test_thresholds {
    use super::*;
    use crate::core::factor::Factor;
    use crate::core::problem::VariableIndex;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    pub fn quantiles_of_a_range() {
        let sorted = (0..100).map(|i| i as f64).collect::<Vec<f64>>();
        let q = quantiles(&sorted);
        assert_eq!(21, q.len());
        assert_eq!(0.0, q[0]);
        assert_eq!(4.0, q[1]);
        assert_eq!(49.0, q[10]);
        assert_eq!(99.0, q[20]);
    }

    #[test]
    pub fn few_samples() {
        let q = quantiles(&[1.0, 2.0, 3.0]);
        assert_eq!(21, q.len());
        assert!(q.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(3.0, q[20]);
        assert!(quantiles(&[]).is_empty());
    }

    #[test]
    pub fn scores_are_sorted_and_reachable() {
        let mut variables = vec![Variable::new(0, 2), Variable::new(1, 3)];
        let f = Factor::new(vec![VariableIndex(0), VariableIndex(1)], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &variables);
        let network = Network::new(vec![f]);
        let mut rng = StdRng::seed_from_u64(5);
        let scores = sample_scores(&mut variables, &network, 500, &mut rng);
        assert_eq!(500, scores.len());
        assert!(scores.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(1.0, scores[0]);
        assert_eq!(6.0, scores[499]);
    }
}
