//! Bounded integer expressions, represented as a constant offset plus a
//! bit-expansion: `value = lo + sum(2^i * bit_i)`. Grounded on the same
//! `(coefficient, literal)` pair shape `pb::PbConstraint` uses, since an
//! `IntExpr` is exactly a PB linear form once its bits are allocated.
use crate::formula::Lit;
use crate::solver::error::SolverError;
use crate::solver::Solver;

/// A bounded integer in `[lo, lo + (2^bits.len() - 1)]`, represented by its
/// offset and a little-endian bit vector of literals.
#[derive(Clone, Debug)]
pub struct IntExpr {
    lo: i64,
    bits: Vec<Lit>,
}

impl IntExpr {
    /// Allocates a fresh integer variable covering `[lo, hi]` using the
    /// minimum number of bits.
    pub fn new_var(solver: &mut Solver, lo: i64, hi: i64) -> IntExpr {
        assert!(hi >= lo);
        let span = (hi - lo) as u64;
        let n_bits = if span == 0 { 0 } else { 64 - span.leading_zeros() };
        let bits = (0..n_bits).map(|_| solver.new_var().pos_lit()).collect();
        IntExpr { lo, bits }
    }

    pub fn constant(value: i64) -> IntExpr {
        IntExpr { lo: value, bits: Vec::new() }
    }

    pub fn lo(&self) -> i64 {
        self.lo
    }

    pub fn hi(&self) -> i64 {
        self.lo + ((1i64 << self.bits.len()) - 1).max(0)
    }

    pub fn bits(&self) -> &[Lit] {
        &self.bits
    }

    /// The `(coefficient, literal)` terms this expression contributes to a
    /// linear PB expression, plus its constant offset — i.e. `lo +
    /// sum(terms)` equals this expression's value.
    pub fn terms(&self) -> (i64, Vec<(i64, Lit)>) {
        let terms = self
            .bits
            .iter()
            .enumerate()
            .map(|(i, &l)| (1i64 << i, l))
            .collect();
        (self.lo, terms)
    }

    /// Evaluates the expression under a literal-valuation closure.
    pub fn eval<F: Fn(Lit) -> bool>(&self, value: F) -> i64 {
        let mut v = self.lo;
        for (i, &l) in self.bits.iter().enumerate() {
            if value(l) {
                v += 1i64 << i;
            }
        }
        v
    }

    /// Adds two bounded integers by concatenating their bit-level terms
    /// into one sum; does not introduce new variables itself — the caller
    /// lowers the resulting combined linear form via `linearize` when it
    /// needs a single reified expression.
    pub fn add(&self, other: &IntExpr) -> CombinedExpr {
        let (c1, t1) = self.terms();
        let (c2, t2) = other.terms();
        let mut terms = t1;
        terms.extend(t2);
        CombinedExpr {
            constant: c1 + c2,
            terms,
        }
    }
}

/// A not-yet-reified sum of `IntExpr`s (and raw PB terms): `constant +
/// sum(coeff * lit)`. `linearize` below is what pins this down to a PB
/// constraint or a Tseitin-encoded literal when the expression appears
/// nonlinearly (e.g. as a term of another product).
pub struct CombinedExpr {
    pub constant: i64,
    pub terms: Vec<(i64, Lit)>,
}

impl CombinedExpr {
    pub fn eval<F: Fn(Lit) -> bool>(&self, value: F) -> i64 {
        let mut v = self.constant;
        for &(c, l) in &self.terms {
            if value(l) {
                v += c;
            }
        }
        v
    }

    /// Lowers `self <= bound` (equivalently `-self >= -bound`, flipped to
    /// the non-negative-coefficient form the solver requires) into a PB
    /// constraint added directly to `solver`.
    pub fn assert_le(&self, solver: &mut Solver, bound: i64) -> Result<(), SolverError> {
        let flipped: Vec<(i64, Lit)> = self.terms.iter().map(|&(c, l)| (c, !l)).collect();
        let sum: i64 = self.terms.iter().map(|&(c, _)| c).sum();
        let threshold = sum - (bound - self.constant);
        solver.add_pb_at_least(flipped, threshold)
    }

    pub fn assert_ge(&self, solver: &mut Solver, bound: i64) -> Result<(), SolverError> {
        solver.add_pb_at_least(self.terms.clone(), bound - self.constant)
    }

    pub fn assert_eq(&self, solver: &mut Solver, value: i64) -> Result<(), SolverError> {
        self.assert_ge(solver, value)?;
        self.assert_le(solver, value)
    }
}

/// Reifies a nonlinear combination (e.g. the product of two `IntExpr`s
/// expanded bit-by-bit into pairwise AND terms) into a Tseitin-encoded
/// conjunction per bit, returning the resulting linear form. This is the
/// "linearize nonlinear products via Tseitin" operation spec.md calls for
/// at the integer-expression layer.
pub fn linearize(
    encoder: &mut crate::encode::Encoder<'_>,
    pairwise_and_terms: &[(i64, Vec<Lit>)],
    constant: i64,
) -> Result<CombinedExpr, SolverError> {
    let mut terms = Vec::with_capacity(pairwise_and_terms.len());
    for &(coeff, ref conj) in pairwise_and_terms {
        let r = encoder.encode_conj(conj)?;
        terms.push((coeff, r));
    }
    Ok(CombinedExpr { constant, terms })
}
