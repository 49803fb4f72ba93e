#[macro_use]
extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate log;

use std::io::{self, Write};
use std::process;

use pb_rust::dimacs;
use pb_rust::opb;
use pb_rust::optimize::{Objective, OptimizeResult, OptimizeStrategy, PbOptimizer};
use pb_rust::solver::decision_heuristic::PhaseSaving;
use pb_rust::solver::restart::RestartStrategy;
use pb_rust::solver::{SolveResult, Solver, SolverConfig};

fn main() {
    let ls012 = ["0", "1", "2"];
    let strategies = ["linear", "binary", "unsat-core", "msu4", "bc", "bcd", "bcd2", "adaptive"];

    let matches = clap::App::new("pb-rust")
        .version(crate_version!())
        .about("Pseudo-Boolean CDCL solver and weighted Boolean optimizer")
        .arg(clap::Arg::with_name("verb").long("verb").takes_value(true).possible_values(&ls012).help("Verbosity level (0=silent, 1=some, 2=more)"))
        .arg(clap::Arg::with_name("opb").long("opb").help("Parse the input as an OPB instance and optimize its objective, rather than a DIMACS CNF satisfiability query"))
        .arg(clap::Arg::with_name("strict").long("strict").help("Validate the DIMACS header during parsing"))
        .arg(clap::Arg::with_name("var-decay").long("var-decay").takes_value(true).help("The variable activity decay factor"))
        .arg(clap::Arg::with_name("cla-decay").long("cla-decay").takes_value(true).help("The clause activity decay factor"))
        .arg(clap::Arg::with_name("rnd-freq").long("rnd-freq").takes_value(true).help("The frequency with which the decision heuristic tries to choose a random variable"))
        .arg(clap::Arg::with_name("phase-saving").long("phase-saving").takes_value(true).possible_values(&ls012).help("Controls the level of phase saving (0=none, 1=limited, 2=full)"))
        .arg(clap::Arg::with_name("luby").long("luby").help("Use the Luby restart sequence instead of geometric restarts"))
        .arg(clap::Arg::with_name("strategy").long("strategy").takes_value(true).possible_values(&strategies).help("The optimizer search strategy to use with --opb"))
        .arg(clap::Arg::with_name("input").required(true))
        .arg(clap::Arg::with_name("output").required(false))
        .get_matches();

    {
        let level = match matches.value_of("verb") {
            Some("0") => log::LevelFilter::Off,
            Some("2") => log::LevelFilter::Trace,
            _ => log::LevelFilter::Info,
        };
        env_logger::Builder::new().filter(None, level).init();
    }

    let mut config = SolverConfig::default();
    if let Some(x) = matches.value_of("var-decay").and_then(|s| s.parse().ok()) {
        if x > 0.0 && x < 1.0 {
            config.decision.var_decay = x;
        }
    }
    if let Some(x) = matches.value_of("cla-decay").and_then(|s| s.parse().ok()) {
        if x > 0.0 && x < 1.0 {
            config.clause_db.clause_decay = x;
        }
    }
    if let Some(x) = matches.value_of("rnd-freq").and_then(|s| s.parse().ok()) {
        if (0.0..=1.0).contains(&x) {
            config.decision.random_var_freq = x;
        }
    }
    match matches.value_of("phase-saving") {
        Some("0") => config.decision.phase_saving = PhaseSaving::None,
        Some("1") => config.decision.phase_saving = PhaseSaving::Limited,
        Some("2") => config.decision.phase_saving = PhaseSaving::Full,
        _ => {}
    }
    if matches.is_present("luby") {
        config.restart.0 = RestartStrategy::Luby { unit: 100.0, inc: 2.0 };
    }

    let in_path = matches.value_of("input").unwrap();
    let out_path = matches.value_of("output");
    let strict = matches.is_present("strict");

    let result = if matches.is_present("opb") {
        let strategy = match matches.value_of("strategy") {
            Some("binary") => OptimizeStrategy::Binary,
            Some("unsat-core") => OptimizeStrategy::UnsatCore,
            Some("msu4") => OptimizeStrategy::Msu4,
            Some("bc") => OptimizeStrategy::Bc,
            Some("bcd") => OptimizeStrategy::Bcd,
            Some("bcd2") => OptimizeStrategy::Bcd2,
            Some("adaptive") => OptimizeStrategy::Adaptive,
            _ => OptimizeStrategy::Linear,
        };
        run_opb(in_path, out_path, config, strategy)
    } else {
        run_dimacs(in_path, out_path, config, strict)
    };

    if let Err(e) = result {
        eprintln!("c error: {}", e);
        process::exit(1);
    }
}

fn run_dimacs(in_path: &str, out_path: Option<&str>, config: SolverConfig, strict: bool) -> io::Result<()> {
    let mut solver = Solver::new(config);

    info!("============================[ Problem Statistics ]=============================");
    let backward = dimacs::parse_file(in_path, &mut solver, strict)?;
    info!("|  Number of variables:  {:12}", solver.n_vars());

    let mut out: Box<dyn Write> = match out_path {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(io::stdout()),
    };

    match solver.solve() {
        SolveResult::Sat => {
            writeln!(out, "s SATISFIABLE")?;
            let model = solver.model().unwrap().clone();
            if !dimacs::validate_model_file(in_path, &backward, &model)? {
                warn!("reported model failed self-check");
            }
            write!(out, "v ")?;
            dimacs::write_model(&mut out, &backward, &model)?;
        }
        SolveResult::Unsat => writeln!(out, "s UNSATISFIABLE")?,
        SolveResult::Unknown => writeln!(out, "s UNKNOWN")?,
    }
    Ok(())
}

fn run_opb(in_path: &str, out_path: Option<&str>, config: SolverConfig, strategy: OptimizeStrategy) -> io::Result<()> {
    let mut solver = Solver::new(config);
    let in_file = std::fs::File::open(in_path)?;
    let parsed = opb::parse(&mut io::BufReader::new(in_file), &mut solver)?;

    let mut out: Box<dyn Write> = match out_path {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(io::stdout()),
    };

    let objective = Objective::new(parsed.objective.unwrap_or_default(), 0);
    let mut opt = PbOptimizer::new(&mut solver, objective, strategy);
    match opt.run() {
        OptimizeResult::Optimal(model, value) => {
            writeln!(out, "o {}", value)?;
            writeln!(out, "s OPTIMUM FOUND")?;
            write!(out, "v ")?;
            dimacs::write_model(&mut out, &parsed.backward, &model)?;
        }
        OptimizeResult::Infeasible => writeln!(out, "s UNSATISFIABLE")?,
        OptimizeResult::Interrupted { best: Some((model, value)), .. } => {
            writeln!(out, "o {}", value)?;
            writeln!(out, "s SATISFIABLE")?;
            write!(out, "v ")?;
            dimacs::write_model(&mut out, &parsed.backward, &model)?;
        }
        OptimizeResult::Interrupted { best: None, .. } => writeln!(out, "s UNKNOWN")?,
    }
    Ok(())
}
