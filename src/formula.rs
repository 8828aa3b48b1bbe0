//! Propositional formulas with a next-time operator.
//!
//! Formulas are built as an expression tree and only rendered to text at the
//! solver boundary. The combinators in this module operate on ordered
//! sequences of literal expressions; they never inspect the structure of
//! their arguments beyond equality.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::SynthesisError;

/// The right-hand side of an equality test against a declared variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A value of an integer-range domain.
    Num(i64),
    /// A value of an arbitrary finite symbolic domain.
    Sym(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Num(n) => write!(f, "{}", n),
            Value::Sym(s) => write!(f, "{}", s),
        }
    }
}

/// A propositional formula over declared variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formula {
    True,
    False,
    /// A Boolean variable.
    Var(String),
    /// `variable = value` over an integer or symbolic domain.
    Eq(String, Value),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    /// The next-time operator `X(..)`.
    Next(Box<Formula>),
    Implies(Box<Formula>, Box<Formula>),
}

impl Formula {
    pub fn var<S: Into<String>>(name: S) -> Self {
        Formula::Var(name.into())
    }

    pub fn eq_num<S: Into<String>>(var: S, value: i64) -> Self {
        Formula::Eq(var.into(), Value::Num(value))
    }

    pub fn eq_sym<S: Into<String>, T: Into<String>>(var: S, symbol: T) -> Self {
        Formula::Eq(var.into(), Value::Sym(symbol.into()))
    }

    pub fn not(self) -> Self {
        Formula::Not(Box::new(self))
    }

    pub fn next(self) -> Self {
        Formula::Next(Box::new(self))
    }

    pub fn implies(self, consequence: Formula) -> Self {
        Formula::Implies(Box::new(self), Box::new(consequence))
    }

    /// Evaluate the formula against a single valuation.
    ///
    /// Next-time subformulas are evaluated against the same valuation; the
    /// decoder only evaluates initial-condition formulas, where the current
    /// and the next step coincide.
    pub fn evaluate<V: Valuation>(&self, valuation: &V) -> Result<bool, SynthesisError> {
        match self {
            Formula::True => Ok(true),
            Formula::False => Ok(false),
            Formula::Var(name) => {
                let value = valuation
                    .value(name)
                    .ok_or_else(|| SynthesisError::UnboundVariable(name.clone()))?;
                Ok(value != 0)
            }
            Formula::Eq(name, rhs) => {
                let value = valuation
                    .value(name)
                    .ok_or_else(|| SynthesisError::UnboundVariable(name.clone()))?;
                let expected = match rhs {
                    Value::Num(n) => *n,
                    Value::Sym(s) => valuation
                        .symbol_index(name, s)
                        .ok_or_else(|| SynthesisError::UnboundVariable(name.clone()))?,
                };
                Ok(value == expected)
            }
            Formula::Not(inner) => Ok(!inner.evaluate(valuation)?),
            Formula::And(parts) => {
                for part in parts {
                    if !part.evaluate(valuation)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Formula::Or(parts) => {
                for part in parts {
                    if part.evaluate(valuation)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Formula::Next(inner) => inner.evaluate(valuation),
            Formula::Implies(lhs, rhs) => Ok(!lhs.evaluate(valuation)? || rhs.evaluate(valuation)?),
        }
    }
}

/// A single-step assignment of integer values to declared variables.
///
/// Boolean variables are valuated as 0/1. Symbolic domains are valuated by
/// the integer position of the symbol, resolved through [`symbol_index`].
///
/// [`symbol_index`]: Valuation::symbol_index
pub trait Valuation {
    fn value(&self, var: &str) -> Option<i64>;

    /// The integer encoding of `symbol` within the domain of `var`, if `var`
    /// has a symbolic domain containing it.
    fn symbol_index(&self, var: &str, symbol: &str) -> Option<i64>;
}

impl Valuation for BTreeMap<String, i64> {
    fn value(&self, var: &str) -> Option<i64> {
        self.get(var).copied()
    }

    fn symbol_index(&self, _var: &str, _symbol: &str) -> Option<i64> {
        None
    }
}

/// Conjunction of the given formulas, dropping trivially true elements.
///
/// The empty conjunction is `True`.
pub fn conjunction(parts: Vec<Formula>) -> Formula {
    let mut parts: Vec<Formula> = parts.into_iter().filter(|f| *f != Formula::True).collect();
    match parts.len() {
        0 => Formula::True,
        1 => parts.remove(0),
        _ => Formula::And(parts),
    }
}

/// Disjunction of the given formulas, dropping trivially false elements.
///
/// The empty disjunction is `False`.
pub fn disjunction(parts: Vec<Formula>) -> Formula {
    let mut parts: Vec<Formula> = parts.into_iter().filter(|f| *f != Formula::False).collect();
    match parts.len() {
        0 => Formula::False,
        1 => parts.remove(0),
        _ => Formula::Or(parts),
    }
}

/// Conjunction of the negation of every literal.
pub fn negated_conjunction<'a, I: IntoIterator<Item = &'a Formula>>(literals: I) -> Formula {
    conjunction(literals.into_iter().map(|x| x.clone().not()).collect())
}

/// Conjunction of the negation of every literal except `excluded`.
pub fn negated_conjunction_excluding(literals: &[Formula], excluded: &Formula) -> Formula {
    conjunction(
        literals
            .iter()
            .filter(|x| *x != excluded)
            .map(|x| x.clone().not())
            .collect(),
    )
}

/// Conjunction of the elements of `ordered` that also appear in `keep`,
/// preserving the order of `ordered`.
pub fn conjunction_of_intersection(ordered: &[Formula], keep: &[Formula]) -> Formula {
    conjunction(
        ordered
            .iter()
            .filter(|x| keep.contains(x))
            .cloned()
            .collect(),
    )
}

/// Pairwise mutual exclusion of the literals, for all time.
///
/// No constraint is produced for fewer than two literals. The result rejects
/// every assignment with two or more true literals but accepts the all-false
/// assignment; contrast with [`exactly_one`].
pub fn mutex(literals: &[Formula]) -> Option<Formula> {
    if literals.len() <= 1 {
        return None;
    }
    Some(conjunction(
        literals
            .iter()
            .map(|x| {
                disjunction(vec![
                    x.clone().not(),
                    negated_conjunction_excluding(literals, x),
                ])
            })
            .collect(),
    ))
}

/// N-ary xor of the literals.
///
/// A single literal is returned unchanged, i.e. it is required to hold. For
/// two or more literals the result is satisfied by exactly the assignments
/// that set precisely one literal true.
pub fn exactly_one(literals: &[Formula]) -> Option<Formula> {
    match literals.len() {
        0 => None,
        1 => Some(literals[0].clone()),
        _ => Some(disjunction(
            literals
                .iter()
                .map(|x| {
                    conjunction(vec![
                        x.clone(),
                        negated_conjunction_excluding(literals, x),
                    ])
                })
                .collect(),
        )),
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::True => write!(f, "True"),
            Formula::False => write!(f, "False"),
            Formula::Var(name) => write!(f, "{}", name),
            Formula::Eq(name, value) => write!(f, "{} = {}", name, value),
            Formula::Not(inner) => write!(f, "!({})", inner),
            Formula::And(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " && ")?;
                    }
                    write!(f, "({})", part)?;
                }
                Ok(())
            }
            Formula::Or(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " || ")?;
                    }
                    write!(f, "({})", part)?;
                }
                Ok(())
            }
            Formula::Next(inner) => write!(f, "X({})", inner),
            Formula::Implies(lhs, rhs) => write!(f, "({}) -> ({})", lhs, rhs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literals(names: &[&str]) -> Vec<Formula> {
        names.iter().map(|n| Formula::var(*n)).collect()
    }

    /// Every 0/1 assignment to the given variables.
    fn assignments(names: &[&str]) -> Vec<BTreeMap<String, i64>> {
        let mut result = Vec::with_capacity(1 << names.len());
        for bits in 0..(1_u32 << names.len()) {
            let mut m = BTreeMap::new();
            for (i, name) in names.iter().enumerate() {
                m.insert(name.to_string(), i64::from(bits >> i & 1));
            }
            result.push(m);
        }
        result
    }

    #[test]
    fn exactly_one_satisfied_by_single_true_assignments_only() {
        let names = ["a", "b", "c"];
        let formula = exactly_one(&literals(&names)).unwrap();
        for assignment in assignments(&names) {
            let true_count = assignment.values().filter(|&&v| v != 0).count();
            let expected = true_count == 1;
            assert_eq!(formula.evaluate(&assignment).unwrap(), expected);
        }
    }

    #[test]
    fn mutex_accepts_all_false_and_rejects_multiple_true() {
        let names = ["a", "b", "c"];
        let formula = mutex(&literals(&names)).unwrap();
        for assignment in assignments(&names) {
            let true_count = assignment.values().filter(|&&v| v != 0).count();
            let expected = true_count <= 1;
            assert_eq!(formula.evaluate(&assignment).unwrap(), expected);
        }
    }

    #[test]
    fn no_constraint_for_short_literal_lists() {
        assert_eq!(mutex(&[]), None);
        assert_eq!(mutex(&literals(&["a"])), None);
        assert_eq!(exactly_one(&[]), None);
        assert_eq!(exactly_one(&literals(&["a"])), Some(Formula::var("a")));
    }

    #[test]
    fn empty_combinators_are_trivial() {
        assert_eq!(conjunction(vec![]), Formula::True);
        assert_eq!(disjunction(vec![]), Formula::False);
    }

    #[test]
    fn intersection_preserves_order() {
        let ordered = literals(&["p", "q", "r"]);
        let keep = literals(&["r", "p"]);
        let formula = conjunction_of_intersection(&ordered, &keep);
        assert_eq!(formula.to_string(), "(p) && (r)");
    }

    #[test]
    fn evaluation_of_equalities() {
        let mut valuation = BTreeMap::new();
        valuation.insert("loc".to_string(), 2);
        assert!(Formula::eq_num("loc", 2).evaluate(&valuation).unwrap());
        assert!(!Formula::eq_num("loc", 0).evaluate(&valuation).unwrap());
        assert!(Formula::eq_num("other", 0).evaluate(&valuation).is_err());
    }

    #[test]
    fn rendering() {
        let f = Formula::var("s0")
            .implies(disjunction(vec![Formula::eq_num("loc", 1).next()]));
        assert_eq!(f.to_string(), "(s0) -> (X(loc = 1))");
    }
}
