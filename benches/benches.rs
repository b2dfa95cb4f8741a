use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use cmpe::core::factor::Factor;
use cmpe::core::problem::{Network, Problem, VariableIndex};
use cmpe::core::separator::Decomposition;
use cmpe::core::variable::Variable;
use cmpe::solvers::mckp::{MckpParameters, MckpSolver};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_bins(number_bins: usize, number_items: usize, rng: &mut StdRng) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
    let costs = (0..number_bins).map(|_| (0..number_items).map(|_| rng.gen_range(0.0..10.0)).collect()).collect();
    let profits = (0..number_bins).map(|_| (0..number_items).map(|_| rng.gen_range(0.0..10.0)).collect()).collect();
    (costs, profits)
}

fn grid(side: usize, rng: &mut StdRng) -> Problem {
    let variables = (0..side * side).map(|i| Variable::new(i, 2)).collect::<Vec<Variable>>();
    let mut scopes: Vec<Vec<VariableIndex>> = vec![];
    for i in 0..side {
        for j in 0..side {
            if i + 1 < side {
                scopes.push(vec![VariableIndex(i * side + j), VariableIndex((i + 1) * side + j)]);
            }
            if j + 1 < side {
                scopes.push(vec![VariableIndex(i * side + j), VariableIndex(i * side + j + 1)]);
            }
        }
    }
    let factors = scopes.into_iter().map(|s| {
        let table = (0..4).map(|_| rng.gen_range(0.01f64..1.0).ln()).collect::<Vec<f64>>();
        Factor::new(s, table, &variables)
    }).collect::<Vec<Factor>>();
    Problem::new(variables, Network::new(factors.clone()), Network::new(factors))
}

pub fn bench_mckp(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    let mut group = c.benchmark_group("mckp");
    for number_bins in [10, 50, 200] {
        let (costs, profits) = random_bins(number_bins, 32, &mut rng);
        let solver = MckpSolver::new(&costs, &profits);
        let budget = 4.0 * number_bins as f64;
        group.bench_with_input(BenchmarkId::from_parameter(number_bins), &budget, |b, budget| {
            b.iter(|| solver.solve(*budget, &MckpParameters::default(), &mut rng))
        });
    }
    group.finish();
}

pub fn bench_decomposition(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    let problem = grid(30, &mut rng);
    let mut group = c.benchmark_group("decomposition");
    for width in [1, 5, 15] {
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, width| {
            b.iter(|| Decomposition::new(&problem, *width))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_mckp, bench_decomposition);
criterion_main!(benches);
