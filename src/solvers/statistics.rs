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

use crate::PEAK_ALLOC;

/// Implements a bunch of statistics that are collected during the search
#[derive(Default)]
pub struct Statistics<const B: bool> {
    number_widths: usize,
    number_iterations: usize,
    number_local_moves: usize,
    number_global_escapes: usize,
    number_local_escapes: usize,
    number_infeasible_knapsacks: usize,
    number_improvements: usize,
    total_cut_size: usize,
    total_components: usize,
}

impl<const B: bool> Statistics<B> {
    pub fn width(&mut self, cut_size: usize, number_components: usize) {
        if B {
            self.number_widths += 1;
            self.total_cut_size += cut_size;
            self.total_components += number_components;
        }
    }

    pub fn iteration(&mut self) {
        if B {
            self.number_iterations += 1;
        }
    }

    pub fn local_move(&mut self) {
        if B {
            self.number_local_moves += 1;
        }
    }

    pub fn global_escape(&mut self) {
        if B {
            self.number_global_escapes += 1;
        }
    }

    pub fn local_escape(&mut self) {
        if B {
            self.number_local_escapes += 1;
        }
    }

    pub fn infeasible_knapsack(&mut self) {
        if B {
            self.number_infeasible_knapsacks += 1;
        }
    }

    pub fn improvement(&mut self) {
        if B {
            self.number_improvements += 1;
        }
    }

    pub fn print(&self) {
        if B {
            println!("{}", self);
        }
    }
}

impl<const B: bool> fmt::Display for Statistics<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if B {
            let avg_cut = if self.number_widths > 0 {
                (self.total_cut_size as f64) / (self.number_widths as f64)
            } else {
                0.0
            };
            let avg_components = if self.number_widths > 0 {
                (self.total_components as f64) / (self.number_widths as f64)
            } else {
                0.0
            };
            writeln!(f,
                "widths {} | avg cut {:.1} | avg components {:.1} | iterations {} | local moves {} | global escapes {} | local escapes {} | #INFEASIBLE {} | improvements {} | Peak memory usage {} Mb",
                self.number_widths,
                avg_cut,
                avg_components,
                self.number_iterations,
                self.number_local_moves,
                self.number_global_escapes,
                self.number_local_escapes,
                self.number_infeasible_knapsacks,
                self.number_improvements,
                PEAK_ALLOC.peak_usage_as_mb())
        } else {
            write!(f, "")
        }
    }
}
