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

//! Export of the constrained MPE as a 0-1 integer linear program in the LP format. Each entry
//! of each factor is a binary variable, set to 1 iff the factor is on this entry:
//!     - `c<i>_<e>` for the entry e of the factor i of the constraint network
//!     - `o<i>_<e>` for the entry e of the factor i of the objective network
//! Each factor has exactly one entry selected, the selected entries of two factors sharing a
//! variable must agree on its value, and the log-score of the constraint network is bounded by
//! the threshold. The objective is the log-score of the objective network.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::common::CmpeError;
use crate::core::factor::Factor;
use crate::core::problem::{NetworkKind, Problem, VariableIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Le,
    Eq,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    pub terms: Vec<(String, f64)>,
}

impl LinearExpr {

    pub fn add(&mut self, name: String, coefficient: f64) {
        self.terms.push((name, coefficient));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub name: String,
    pub expr: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
}

/// A maximization problem over binary variables
#[derive(Debug, Clone, Default)]
pub struct Ilp {
    pub objective: LinearExpr,
    pub rows: Vec<Row>,
    pub binaries: Vec<String>,
}

fn entry_name(kind: NetworkKind, factor: usize, entry: usize) -> String {
    match kind {
        NetworkKind::Constraint => format!("c{}_{}", factor, entry),
        NetworkKind::Objective => format!("o{}_{}", factor, entry),
    }
}

/// Builds the integer program of the problem for the given threshold
pub fn ilp_from_problem(problem: &Problem, threshold: f64) -> Ilp {
    let mut ilp = Ilp::default();
    // Every factor of both networks, tagged with its network and its index in the network
    let tables = [NetworkKind::Constraint, NetworkKind::Objective].into_iter().flat_map(|kind| {
        let network = problem.network(kind);
        network.factors_iter().map(move |f| (kind, f.0, &network[f]))
    }).collect::<Vec<(NetworkKind, usize, &Factor)>>();

    let mut budget = LinearExpr::default();
    for (kind, i, factor) in tables.iter().copied() {
        let mut choice = LinearExpr::default();
        for e in 0..factor.number_entries() {
            let name = entry_name(kind, i, e);
            ilp.binaries.push(name.clone());
            choice.add(name.clone(), 1.0);
            match kind {
                NetworkKind::Constraint => budget.add(name, factor.value_at(e)),
                NetworkKind::Objective => ilp.objective.add(name, factor.value_at(e)),
            }
        }
        let prefix = match kind {
            NetworkKind::Constraint => "c",
            NetworkKind::Objective => "o",
        };
        ilp.rows.push(Row { name: format!("one_{}{}", prefix, i), expr: choice, sense: Sense::Eq, rhs: 1.0 });
    }
    ilp.rows.insert(0, Row { name: "budget".to_string(), expr: budget, sense: Sense::Le, rhs: threshold });

    // Consistency between consecutive factors mentioning the same variable
    for variable in problem.variables_iter() {
        let mentions = tables.iter().copied().filter(|(_, _, f)| f.mentions(variable)).collect::<Vec<(NetworkKind, usize, &Factor)>>();
        for pair in mentions.windows(2) {
            let (kind_a, a, factor_a) = pair[0];
            let (kind_b, b, factor_b) = pair[1];
            for value in 0..problem[variable].domain_size() {
                let mut expr = LinearExpr::default();
                for e in entries_with_value(problem, factor_a, variable, value) {
                    expr.add(entry_name(kind_a, a, e), 1.0);
                }
                for e in entries_with_value(problem, factor_b, variable, value) {
                    expr.add(entry_name(kind_b, b, e), -1.0);
                }
                let name = format!("r{}_x{}_{}", ilp.rows.len(), variable.0, value);
                ilp.rows.push(Row { name, expr, sense: Sense::Eq, rhs: 0.0 });
            }
        }
    }
    ilp
}

fn entries_with_value(problem: &Problem, factor: &Factor, variable: VariableIndex, value: usize) -> Vec<usize> {
    (0..factor.number_entries()).filter(|e| factor.value_in_entry(variable, *e, problem.variables()) == Some(value)).collect()
}

/// Writes the program in the LP format
pub fn emit_lp(ilp: &Ilp) -> String {
    let mut out = String::new();
    out.push_str("Maximize\n obj: ");
    out.push_str(&fmt_lin(&ilp.objective));
    out.push('\n');
    out.push_str("Subject To\n");
    for row in &ilp.rows {
        out.push_str(&format!(" {}: {} {} {}\n", row.name, fmt_lin(&row.expr), fmt_sense(row.sense), fmt_num(row.rhs)));
    }
    out.push_str("Binary\n");
    for b in &ilp.binaries {
        out.push_str(&format!(" {}\n", b));
    }
    out.push_str("End\n");
    out
}

pub fn write_lp(problem: &Problem, threshold: f64, output: &Path) -> Result<(), CmpeError> {
    let content = emit_lp(&ilp_from_problem(problem, threshold));
    File::create(output)
        .and_then(|mut file| file.write_all(content.as_bytes()))
        .map_err(|source| CmpeError::Io { path: output.display().to_string(), source })
}

fn fmt_sense(s: Sense) -> &'static str {
    match s {
        Sense::Le => "<=",
        Sense::Eq => "=",
    }
}

fn fmt_num(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{}", v.round() as i64)
    } else {
        format!("{:.9}", v)
    }
}

fn fmt_lin(e: &LinearExpr) -> String {
    let mut parts: Vec<String> = vec![];
    for (n, c) in e.terms.iter() {
        if (c - 1.0).abs() < 1e-12 {
            parts.push(format!("+1 {}", n));
        } else if (c + 1.0).abs() < 1e-12 {
            parts.push(format!("-1 {}", n));
        } else {
            parts.push(format!("{:+.9} {}", c, n));
        }
    }
    if parts.is_empty() {
        parts.push("+0".to_string());
    }
    parts.join(" ")
}
