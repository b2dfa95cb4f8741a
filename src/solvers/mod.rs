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

//! The solvers of the crate: the anytime search over the paired networks and the heuristic
//! multiple-choice knapsack solver it calls at each iteration.

pub mod mckp;
pub mod search;
mod statistics;

pub use search::AnytimeSearch;

pub type StatSearch<P> = AnytimeSearch<P, true>;
pub type QuietSearch<P> = AnytimeSearch<P, false>;
