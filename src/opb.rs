//! A minimal parser for the pseudo-Boolean competition's OPB format:
//! `min: <linear objective>;` followed by constraints of the form
//! `<linear expr> >= <int>;` or `<linear expr> = <int>;`, each term
//! written `[+-]<int> x<id>`. The teacher has no pseudo-Boolean format
//! support at all, so this is new glue grounded on `dimacs::Subst`'s
//! id-translation pattern rather than on any one teacher file.
use std::collections::HashMap;
use std::io::{self, Read};

use crate::formula::{Lit, Var, VarMap};
use crate::solver::error::SolverError;
use crate::solver::Solver;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Relation {
    Ge,
    Eq,
}

/// A single `sum(coeff * lit) <rel> rhs` line, with external variable ids
/// already translated to internal literals.
#[derive(Clone, Debug)]
pub struct OpbConstraint {
    pub terms: Vec<(i64, Lit)>,
    pub relation: Relation,
    pub rhs: i64,
}

pub struct ParsedOpb {
    pub objective: Option<Vec<(i64, Lit)>>,
    pub constraints: Vec<OpbConstraint>,
    pub backward: VarMap<i64>,
}

/// Reads an OPB instance, allocating one solver variable per distinct
/// `x<id>` encountered and adding every constraint to `solver`. Returns
/// the parsed objective (if a `min:` line was present) and the id mapping
/// needed to report a model back in the input's own numbering.
pub fn parse<R: Read>(stream: &mut R, solver: &mut Solver) -> io::Result<ParsedOpb> {
    let mut text = String::new();
    stream.read_to_string(&mut text)?;

    let mut forward: HashMap<u64, Var> = HashMap::new();
    let mut backward: VarMap<i64> = VarMap::new();
    let mut objective = None;
    let mut constraints = Vec::new();

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('*') {
            continue;
        }
        let line = line.trim_end_matches(';').trim();

        if let Some(rest) = line.strip_prefix("min:") {
            let terms = parse_terms(rest, solver, &mut forward, &mut backward)?;
            objective = Some(terms);
            continue;
        }

        let (expr, relation, rhs_text) = split_relation(line)?;
        let rhs: i64 = rhs_text
            .trim()
            .parse()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "expected an integer right-hand side"))?;
        let terms = parse_terms(expr, solver, &mut forward, &mut backward)?;
        constraints.push(OpbConstraint { terms, relation, rhs });
    }

    for c in &constraints {
        add_constraint(solver, c).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    }

    Ok(ParsedOpb {
        objective,
        constraints,
        backward,
    })
}

fn add_constraint(solver: &mut Solver, c: &OpbConstraint) -> Result<(), SolverError> {
    match c.relation {
        Relation::Ge => solver.add_pb_at_least(c.terms.clone(), c.rhs),
        Relation::Eq => solver.add_pb_exactly(c.terms.clone(), c.rhs),
    }
}

fn split_relation(line: &str) -> io::Result<(&str, Relation, &str)> {
    if let Some(pos) = line.find(">=") {
        Ok((&line[..pos], Relation::Ge, &line[pos + 2..]))
    } else if let Some(pos) = line.find('=') {
        Ok((&line[..pos], Relation::Eq, &line[pos + 1..]))
    } else {
        Err(io::Error::new(io::ErrorKind::InvalidData, "missing relational operator in constraint"))
    }
}

/// Parses a sequence of `<int> [~]x<id>` terms, allocating a fresh solver
/// variable the first time each `x<id>` is seen. A leading `~` on the
/// variable token negates the literal (OPB's convention for a negative
/// literal in a constraint).
fn parse_terms(
    expr: &str,
    solver: &mut Solver,
    forward: &mut HashMap<u64, Var>,
    backward: &mut VarMap<i64>,
) -> io::Result<Vec<(i64, Lit)>> {
    let tokens: Vec<&str> = expr.split_whitespace().collect();
    if tokens.len() % 2 != 0 {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "expected pairs of coefficient and variable"));
    }

    let mut terms = Vec::with_capacity(tokens.len() / 2);
    for pair in tokens.chunks(2) {
        let (coeff_token, var_token) = (pair[0], pair[1]);
        let coeff: i64 = coeff_token
            .parse()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, format!("expected an integer coefficient, found '{}'", coeff_token)))?;

        let negated = var_token.starts_with('~');
        let id_text = var_token.trim_start_matches('~');
        let id_text = id_text
            .strip_prefix('x')
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, format!("expected a variable token starting with 'x', found '{}'", var_token)))?;
        let id: u64 = id_text
            .parse()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "expected a variable id after 'x'"))?;

        let v = *forward.entry(id).or_insert_with(|| {
            let v = solver.new_var();
            backward.insert(v, id as i64);
            v
        });
        let lit = if negated { v.neg_lit() } else { v.pos_lit() };
        terms.push((coeff, lit));
    }
    Ok(terms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{SolveResult, SolverConfig};

    #[test]
    fn parses_objective_and_constraint() {
        let text = b"* comment\nmin: 2 x1 3 x2;\n1 x1 1 x2 >= 1;\n";
        let mut solver = Solver::new(SolverConfig::default());
        let parsed = parse(&mut &text[..], &mut solver).unwrap();
        assert!(parsed.objective.is_some());
        assert_eq!(parsed.objective.unwrap().len(), 2);
        assert_eq!(parsed.constraints.len(), 1);
        assert_eq!(solver.solve(), SolveResult::Sat);
    }

    #[test]
    fn equality_constraint_is_enforced() {
        let text = b"1 x1 1 x2 = 1;\n";
        let mut solver = Solver::new(SolverConfig::default());
        parse(&mut &text[..], &mut solver).unwrap();
        assert_eq!(solver.solve(), SolveResult::Sat);
    }

    #[test]
    fn negated_literal_token_is_parsed() {
        let text = b"1 ~x1 >= 1;\n";
        let mut solver = Solver::new(SolverConfig::default());
        parse(&mut &text[..], &mut solver).unwrap();
        assert_eq!(solver.solve(), SolveResult::Sat);
        assert_eq!(solver.value(Var::from_index(0).pos_lit()), Some(false));
    }
}
