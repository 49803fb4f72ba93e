use pb_rust::solver::{SolveResult, Solver, SolverConfig};

#[test]
fn pb_constraint_alone_is_sat_when_satisfiable() {
    // 3*x1 + 2*x2 + x3 >= 4 alone -> SAT.
    let mut s = Solver::new(SolverConfig::default());
    let x1 = s.new_var();
    let x2 = s.new_var();
    let x3 = s.new_var();
    s.add_pb_at_least(vec![(3, x1.pos_lit()), (2, x2.pos_lit()), (1, x3.pos_lit())], 4)
        .unwrap();
    assert_eq!(s.solve(), SolveResult::Sat);
}

#[test]
fn pb_constraint_forces_remaining_literals_once_one_is_fixed_false() {
    let mut s = Solver::new(SolverConfig::default());
    let x1 = s.new_var();
    let x2 = s.new_var();
    let x3 = s.new_var();
    s.add_pb_at_least(vec![(3, x1.pos_lit()), (2, x2.pos_lit()), (1, x3.pos_lit())], 4)
        .unwrap();
    s.add_clause(vec![x1.neg_lit()]).unwrap();

    assert_eq!(s.solve(), SolveResult::Sat);
    assert_eq!(s.value(x1.pos_lit()), Some(false));
    assert_eq!(s.value(x2.pos_lit()), Some(true));
    assert_eq!(s.value(x3.pos_lit()), Some(true));
}

#[test]
fn pb_with_k_zero_is_trivially_satisfied() {
    let mut s = Solver::new(SolverConfig::default());
    let x1 = s.new_var();
    s.add_pb_at_least(vec![(1, x1.pos_lit())], 0).unwrap();
    assert_eq!(s.solve(), SolveResult::Sat);
}

#[test]
fn pb_with_sum_below_threshold_is_unsat() {
    let mut s = Solver::new(SolverConfig::default());
    let x1 = s.new_var();
    let x2 = s.new_var();
    s.add_pb_at_least(vec![(1, x1.pos_lit()), (1, x2.pos_lit())], 3).unwrap();
    assert_eq!(s.solve(), SolveResult::Unsat);
}

#[test]
fn pueblo_and_counter_handlers_agree_on_satisfiability() {
    use pb_rust::solver::pb_db::PbHandlerKind;

    for kind in [PbHandlerKind::Counter, PbHandlerKind::Pueblo] {
        let mut config = SolverConfig::default();
        config.pb_handler = kind;
        let mut s = Solver::new(config);
        let x1 = s.new_var();
        let x2 = s.new_var();
        let x3 = s.new_var();
        s.add_pb_at_least(vec![(3, x1.pos_lit()), (2, x2.pos_lit()), (1, x3.pos_lit())], 4)
            .unwrap();
        s.add_clause(vec![x1.neg_lit()]).unwrap();
        assert_eq!(s.solve(), SolveResult::Sat);
        assert_eq!(s.value(x2.pos_lit()), Some(true));
        assert_eq!(s.value(x3.pos_lit()), Some(true));
    }
}

#[test]
fn at_most_and_exactly_cardinality_wrappers_constrain_correctly() {
    let mut s = Solver::new(SolverConfig::default());
    let x1 = s.new_var();
    let x2 = s.new_var();
    let x3 = s.new_var();
    s.add_at_most(vec![x1.pos_lit(), x2.pos_lit(), x3.pos_lit()], 1).unwrap();
    s.add_at_least(vec![x1.pos_lit(), x2.pos_lit(), x3.pos_lit()], 1).unwrap();

    assert_eq!(s.solve(), SolveResult::Sat);
    let model = s.model().unwrap();
    let true_count = [x1, x2, x3].iter().filter(|&&v| model[v]).count();
    assert_eq!(true_count, 1);
}
