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

//! Reader for Markov networks in the UAI format. A file is a sequence of whitespace separated
//! tokens:
//!     - the header MARKOV
//!     - the number of variables, followed by the domain size of each variable
//!     - the number of factors, followed by the scope of each factor (its size then the
//!       variables)
//!     - for each factor, its number of entries followed by the entries
//! The entries of a factor are given in the order of its addresses: the first variable of the
//! scope changes the fastest. Each weight must be strictly positive and is stored as its
//! natural logarithm.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::SplitWhitespace;

use super::ParseError;
use crate::core::factor::{domain_product, Factor};
use crate::core::problem::{Network, VariableIndex};
use crate::core::variable::Variable;

/// Iterator over the tokens of the file that converts them to numbers
struct Tokens<'a> {
    tokens: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {

    fn new(content: &'a str) -> Self {
        Self { tokens: content.split_whitespace() }
    }

    fn next_token(&mut self, context: &'static str) -> Result<&'a str, ParseError> {
        self.tokens.next().ok_or(ParseError::Truncated(context))
    }

    fn next_usize(&mut self, context: &'static str) -> Result<usize, ParseError> {
        let token = self.next_token(context)?;
        token.parse::<usize>().map_err(|_| ParseError::Token { token: token.to_string(), context })
    }

    fn next_f64(&mut self, context: &'static str) -> Result<f64, ParseError> {
        let token = self.next_token(context)?;
        token.parse::<f64>().map_err(|_| ParseError::Token { token: token.to_string(), context })
    }
}

pub struct UaiReader {
    input: PathBuf,
}

impl UaiReader {

    pub fn new(input: &Path) -> Self {
        Self { input: input.to_path_buf() }
    }

    /// Reads the variables and the network of the file
    pub fn read(&self) -> Result<(Vec<Variable>, Network), ParseError> {
        let mut content = String::new();
        File::open(&self.input)
            .and_then(|mut file| file.read_to_string(&mut content))
            .map_err(|source| ParseError::Io { path: self.input.display().to_string(), source })?;
        parse(&content)
    }
}

/// Parses the content of a UAI file
pub fn parse(content: &str) -> Result<(Vec<Variable>, Network), ParseError> {
    let mut tokens = Tokens::new(content);
    let header = tokens.next_token("the header")?;
    if header != "MARKOV" {
        return Err(ParseError::Header(header.to_string()));
    }

    let number_variables = tokens.next_usize("the number of variables")?;
    let mut variables: Vec<Variable> = Vec::with_capacity(number_variables);
    for id in 0..number_variables {
        let domain_size = tokens.next_usize("the domain sizes")?;
        if domain_size == 0 {
            return Err(ParseError::EmptyDomain(id));
        }
        variables.push(Variable::new(id, domain_size));
    }

    let number_factors = tokens.next_usize("the number of factors")?;
    let mut scopes: Vec<Vec<VariableIndex>> = Vec::with_capacity(number_factors);
    for factor in 0..number_factors {
        let scope_size = tokens.next_usize("the scopes")?;
        let mut scope: Vec<VariableIndex> = Vec::with_capacity(scope_size);
        for _ in 0..scope_size {
            let variable = tokens.next_usize("the scopes")?;
            if variable >= number_variables {
                return Err(ParseError::UnknownVariable { factor, variable, number_variables });
            }
            if scope.contains(&VariableIndex(variable)) {
                return Err(ParseError::DuplicateVariable { factor, variable });
            }
            scope.push(VariableIndex(variable));
        }
        scopes.push(scope);
    }

    let mut factors: Vec<Factor> = Vec::with_capacity(number_factors);
    for (factor, scope) in scopes.into_iter().enumerate() {
        let expected = domain_product(&scope, &variables);
        let declared = tokens.next_usize("the number of entries")?;
        if declared != expected {
            return Err(ParseError::EntryCount { factor, declared, expected });
        }
        let mut table: Vec<f64> = Vec::with_capacity(expected);
        for entry in 0..expected {
            let weight = tokens.next_f64("the entries")?;
            if weight <= 0.0 || weight.is_nan() {
                return Err(ParseError::NonPositiveWeight { factor, entry, weight });
            }
            table.push(weight.ln());
        }
        factors.push(Factor::new(scope, table, &variables));
    }
    Ok((variables, Network::new(factors)))
}
