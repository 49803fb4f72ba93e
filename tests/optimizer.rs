use pb_rust::optimize::{Objective, OptimizeResult, OptimizeStrategy, PbOptimizer};
use pb_rust::solver::{Solver, SolverConfig};

#[test]
fn minimizes_sum_subject_to_at_least_two() {
    // minimize x1+x2+x3 subject to x1+x2+x3 >= 2 -> OPTIMUM, value 2.
    let mut s = Solver::new(SolverConfig::default());
    let x1 = s.new_var();
    let x2 = s.new_var();
    let x3 = s.new_var();
    s.add_pb_at_least(vec![(1, x1.pos_lit()), (1, x2.pos_lit()), (1, x3.pos_lit())], 2)
        .unwrap();

    let objective = Objective::new(vec![(1, x1.pos_lit()), (1, x2.pos_lit()), (1, x3.pos_lit())], 0);
    let mut opt = PbOptimizer::new(&mut s, objective, OptimizeStrategy::Linear);
    match opt.run() {
        OptimizeResult::Optimal(model, value) => {
            assert_eq!(value, 2);
            let true_count = [x1, x2, x3].iter().filter(|&&v| model[v]).count();
            assert_eq!(true_count, 2);
        }
        other => panic!("expected Optimal(_, 2), got {:?}", other),
    }
}

#[test]
fn minimizes_weighted_sum_over_a_vertex_cover_style_instance() {
    // minimize 5*x1 + 4*x2 + 3*x3 subject to {x1 v x2, x2 v x3, x1 v x3}
    // -> OPTIMUM, value 7 (pick x2 and x3).
    let mut s = Solver::new(SolverConfig::default());
    let x1 = s.new_var();
    let x2 = s.new_var();
    let x3 = s.new_var();
    s.add_clause(vec![x1.pos_lit(), x2.pos_lit()]).unwrap();
    s.add_clause(vec![x2.pos_lit(), x3.pos_lit()]).unwrap();
    s.add_clause(vec![x1.pos_lit(), x3.pos_lit()]).unwrap();

    let objective = Objective::new(vec![(5, x1.pos_lit()), (4, x2.pos_lit()), (3, x3.pos_lit())], 0);
    let mut opt = PbOptimizer::new(&mut s, objective, OptimizeStrategy::Linear);
    match opt.run() {
        OptimizeResult::Optimal(_, value) => assert_eq!(value, 7),
        other => panic!("expected Optimal(_, 7), got {:?}", other),
    }
}

#[test]
fn maxsat_style_instance_minimizes_total_violated_weight() {
    // Hard clause {1,2}; soft clauses (weight 1) {-1}, {-2}, {-1,-2},
    // modeled as minimizing the sum of one selector literal per soft
    // clause, each forced true whenever its clause is violated:
    // selector_i <- !clause_i, via clause_i v selector_i.
    // -> OPTIMUM, total violated weight 1.
    let mut s = Solver::new(SolverConfig::default());
    let x1 = s.new_var();
    let x2 = s.new_var();
    let sel1 = s.new_var();
    let sel2 = s.new_var();
    let sel3 = s.new_var();

    s.add_clause(vec![x1.pos_lit(), x2.pos_lit()]).unwrap();
    s.add_clause(vec![x1.neg_lit(), sel1.pos_lit()]).unwrap();
    s.add_clause(vec![x2.neg_lit(), sel2.pos_lit()]).unwrap();
    s.add_clause(vec![x1.neg_lit(), x2.neg_lit(), sel3.pos_lit()]).unwrap();

    let objective = Objective::new(
        vec![(1, sel1.pos_lit()), (1, sel2.pos_lit()), (1, sel3.pos_lit())],
        0,
    );
    let mut opt = PbOptimizer::new(&mut s, objective, OptimizeStrategy::Linear);
    match opt.run() {
        OptimizeResult::Optimal(_, value) => assert_eq!(value, 1),
        other => panic!("expected Optimal(_, 1), got {:?}", other),
    }
}

#[test]
fn unsatisfiable_hard_constraints_report_infeasible() {
    let mut s = Solver::new(SolverConfig::default());
    let x1 = s.new_var();
    s.add_clause(vec![x1.pos_lit()]).unwrap();
    s.add_clause(vec![x1.neg_lit()]).unwrap();

    let objective = Objective::new(vec![(1, x1.pos_lit())], 0);
    let mut opt = PbOptimizer::new(&mut s, objective, OptimizeStrategy::Linear);
    assert!(matches!(opt.run(), OptimizeResult::Infeasible));
}

#[test]
fn binary_and_linear_strategies_agree_on_the_optimum() {
    let build = || {
        let mut s = Solver::new(SolverConfig::default());
        let x1 = s.new_var();
        let x2 = s.new_var();
        let x3 = s.new_var();
        s.add_clause(vec![x1.pos_lit(), x2.pos_lit()]).unwrap();
        s.add_clause(vec![x2.pos_lit(), x3.pos_lit()]).unwrap();
        s.add_clause(vec![x1.pos_lit(), x3.pos_lit()]).unwrap();
        (s, x1, x2, x3)
    };

    let (mut s1, a1, b1, c1) = build();
    let obj1 = Objective::new(vec![(5, a1.pos_lit()), (4, b1.pos_lit()), (3, c1.pos_lit())], 0);
    let linear = match PbOptimizer::new(&mut s1, obj1, OptimizeStrategy::Linear).run() {
        OptimizeResult::Optimal(_, v) => v,
        other => panic!("expected Optimal, got {:?}", other),
    };

    let (mut s2, a2, b2, c2) = build();
    let obj2 = Objective::new(vec![(5, a2.pos_lit()), (4, b2.pos_lit()), (3, c2.pos_lit())], 0);
    let binary = match PbOptimizer::new(&mut s2, obj2, OptimizeStrategy::Binary).run() {
        OptimizeResult::Optimal(_, v) => v,
        other => panic!("expected Optimal, got {:?}", other),
    };

    assert_eq!(linear, binary);
}
