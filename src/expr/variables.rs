use std::{collections::HashMap, ops::Index};

use super::token::Token;

/// Ordered list of distinct variable names.
///
/// The order is the order of first appearance in the function text. It
/// defines the coordinate order of the optimized point and the order in which
/// results are reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableList {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl VariableList {
    /// Number of variables, i.e., dimension of the problem.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if the expression has no variables.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of the variable in the coordinate vector.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Iterates over the names in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Returns the names as a slice.
    pub fn as_slice(&self) -> &[String] {
        &self.names
    }
}

impl Index<usize> for VariableList {
    type Output = str;

    fn index(&self, index: usize) -> &Self::Output {
        &self.names[index]
    }
}

impl<'a> IntoIterator for &'a VariableList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

/// Collects distinct variable names in order of their first appearance.
pub fn extract_variables(tokens: &[Token]) -> VariableList {
    let mut variables = VariableList::default();

    for token in tokens {
        if let Token::Variable(name) = token {
            if !variables.positions.contains_key(name) {
                variables.positions.insert(name.clone(), variables.names.len());
                variables.names.push(name.clone());
            }
        }
    }

    variables
}
