//! GR(1) specification records.
//!
//! A specification holds the variable declarations of both players and four
//! ordered formula collections (initial and safety for each player), each
//! implicitly conjoined. Liveness is outside this crate's scope.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::SynthesisError;
use crate::formula::Formula;
use crate::transys::Player;

/// The domain of one declared variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Domain {
    Boolean,
    /// Integer range, inclusive on both ends.
    Range(i64, i64),
    /// Arbitrary finite symbolic domain; the position of a symbol is its
    /// integer encoding at the solver level.
    Finite(Vec<String>),
}

impl Domain {
    /// The symbols of a finite symbolic domain.
    pub fn symbols(&self) -> Option<&[String]> {
        match self {
            Domain::Finite(symbols) => Some(symbols),
            _ => None,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Boolean => write!(f, "boolean"),
            Domain::Range(low, high) => write!(f, "[{}, {}]", low, high),
            Domain::Finite(symbols) => {
                write!(f, "{{")?;
                for (i, symbol) in symbols.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", symbol)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// A GR(1) specification under construction or ready for the solver.
///
/// Translation accumulates into one instance passed by exclusive reference;
/// a built specification is treated as immutable by the decoder.
#[derive(Debug, Clone, Default)]
pub struct GrSpec {
    pub env_vars: BTreeMap<String, Domain>,
    pub sys_vars: BTreeMap<String, Domain>,
    pub env_init: Vec<Formula>,
    pub sys_init: Vec<Formula>,
    pub env_safety: Vec<Formula>,
    pub sys_safety: Vec<Formula>,
}

impl GrSpec {
    /// Declare a variable for the given player.
    ///
    /// Names are unique across the union of both declaration maps; a clash
    /// fails with [`SynthesisError::VariableConflict`] before any formula
    /// referencing the name is emitted.
    pub fn declare(
        &mut self,
        player: Player,
        name: &str,
        domain: Domain,
    ) -> Result<(), SynthesisError> {
        if self.env_vars.contains_key(name) || self.sys_vars.contains_key(name) {
            return Err(SynthesisError::VariableConflict(name.to_string()));
        }
        self.vars_mut(player).insert(name.to_string(), domain);
        Ok(())
    }

    fn vars_mut(&mut self, player: Player) -> &mut BTreeMap<String, Domain> {
        match player {
            Player::Env => &mut self.env_vars,
            Player::Sys => &mut self.sys_vars,
        }
    }

    /// The domain of a declared variable of either player.
    pub fn domain_of(&self, name: &str) -> Option<&Domain> {
        self.sys_vars.get(name).or_else(|| self.env_vars.get(name))
    }

    pub(crate) fn init_mut(&mut self, player: Player) -> &mut Vec<Formula> {
        match player {
            Player::Env => &mut self.env_init,
            Player::Sys => &mut self.sys_init,
        }
    }

    pub(crate) fn safety_mut(&mut self, player: Player) -> &mut Vec<Formula> {
        match player {
            Player::Env => &mut self.env_safety,
            Player::Sys => &mut self.sys_safety,
        }
    }

    /// Conjoin another specification into this one.
    ///
    /// Variable maps are united (duplicate names fail with
    /// [`SynthesisError::VariableConflict`]) and formula collections are
    /// concatenated.
    pub fn merge(mut self, other: GrSpec) -> Result<GrSpec, SynthesisError> {
        for (name, domain) in other.env_vars {
            self.declare(Player::Env, &name, domain)?;
        }
        for (name, domain) in other.sys_vars {
            self.declare(Player::Sys, &name, domain)?;
        }
        self.env_init.extend(other.env_init);
        self.sys_init.extend(other.sys_init);
        self.env_safety.extend(other.env_safety);
        self.sys_safety.extend(other.sys_safety);
        Ok(self)
    }
}

fn write_vars(
    f: &mut fmt::Formatter<'_>,
    heading: &str,
    vars: &BTreeMap<String, Domain>,
) -> fmt::Result {
    writeln!(f, "{}:", heading)?;
    for (name, domain) in vars {
        writeln!(f, "    {} : {}", name, domain)?;
    }
    Ok(())
}

fn write_formulas(f: &mut fmt::Formatter<'_>, heading: &str, formulas: &[Formula]) -> fmt::Result {
    writeln!(f, "{}:", heading)?;
    for formula in formulas {
        writeln!(f, "    {}", formula)?;
    }
    Ok(())
}

impl fmt::Display for GrSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_vars(f, "ENVIRONMENT VARIABLES", &self.env_vars)?;
        write_vars(f, "SYSTEM VARIABLES", &self.sys_vars)?;
        write_formulas(f, "ENV INIT", &self.env_init)?;
        write_formulas(f, "SYS INIT", &self.sys_init)?;
        write_formulas(f, "ENV SAFETY", &self.env_safety)?;
        write_formulas(f, "SYS SAFETY", &self.sys_safety)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_conflicts_across_players() {
        let mut spec = GrSpec::default();
        spec.declare(Player::Sys, "a", Domain::Boolean).unwrap();
        let err = spec.declare(Player::Env, "a", Domain::Boolean).unwrap_err();
        assert!(matches!(err, SynthesisError::VariableConflict(_)));
    }

    #[test]
    fn merge_unites_variables_and_formulas() {
        let mut left = GrSpec::default();
        left.declare(Player::Sys, "a", Domain::Boolean).unwrap();
        left.sys_init.push(Formula::var("a"));

        let mut right = GrSpec::default();
        right.declare(Player::Env, "b", Domain::Boolean).unwrap();
        right.env_safety.push(Formula::var("b").next());

        let merged = left.merge(right).unwrap();
        assert!(merged.sys_vars.contains_key("a"));
        assert!(merged.env_vars.contains_key("b"));
        assert_eq!(merged.sys_init.len(), 1);
        assert_eq!(merged.env_safety.len(), 1);
    }

    #[test]
    fn merge_rejects_duplicate_variables() {
        let mut left = GrSpec::default();
        left.declare(Player::Sys, "a", Domain::Boolean).unwrap();
        let mut right = GrSpec::default();
        right.declare(Player::Sys, "a", Domain::Boolean).unwrap();
        assert!(left.merge(right).is_err());
    }
}
