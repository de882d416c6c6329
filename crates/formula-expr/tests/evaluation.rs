use formula_expr::{
    compile, BaseVariables, Binding, EvalError, Expression, ExpressionError, Frame, NamedValues,
    SharedRng, VariableAccessor,
};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn assert_close(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-12, "{actual} != {expected}");
}

fn eval(text: &str) -> f64 {
    let mut expr = Expression::default();
    expr.set_and_parse(text).unwrap();
    expr.execute(None).unwrap()
}

#[test]
fn arithmetic_and_precedence() {
    assert_eq!(eval("1 + 2 * 3"), 7.0);
    assert_eq!(eval("(1 + 2) * 3"), 9.0);
    assert_eq!(eval("2 ^ 3 ^ 2"), 64.0);
    assert_eq!(eval("2 * 3 ^ 2"), 18.0);
    assert_eq!(eval("-2 ^ 2"), 4.0);
    assert_eq!(eval("10 - 4 - 3"), 3.0);
    assert_eq!(eval("12 / 4 / 3"), 1.0);
    assert_eq!(eval("5 - -2"), 7.0);
    assert_eq!(eval("{1 + 1} * 2"), 4.0);
}

#[test]
fn comparisons_and_logic() {
    assert_eq!(eval("3 > 2"), 1.0);
    assert_eq!(eval("3 <= 2"), 0.0);
    assert_eq!(eval("2 = 2"), 1.0);
    assert_eq!(eval("2 <> 2"), 0.0);
    assert_eq!(eval("1 < 2 and 3 < 4"), 1.0);
    assert_eq!(eval("1 < 2 and 4 < 3"), 0.0);
    assert_eq!(eval("1 > 2 or 4 > 3"), 1.0);
    assert_eq!(eval("true and false"), 0.0);
    assert_eq!(eval("true OR false"), 1.0);
}

#[test]
fn function_library() {
    assert_eq!(eval("sqrt(16) + exp(0) + ln(1)"), 5.0);
    assert_eq!(eval("sin(0) + cos(0) + tan(0)"), 1.0);
    assert_eq!(eval("min(4, -1, 7)"), -1.0);
    assert_eq!(eval("max(4, -1, 7)"), 7.0);
    assert_eq!(eval("mod(7, 3)"), 1.0);
    assert_eq!(eval("round(2.5) + round(-2.5)"), 0.0);
    assert_eq!(eval("round(1.49)"), 1.0);
    assert_eq!(eval("sigmoid(0, 0, 1, 1)"), 0.5);
    assert_eq!(eval("if(2 > 1, 10, 20)"), 10.0);
    assert_eq!(eval("if(0, 10, 20)"), 20.0);
}

#[test]
fn if_evaluates_both_branches() {
    let mut expr = Expression::default();
    expr.set_and_parse("if(x > 0, incsum(1), incsum(10))").unwrap();
    expr.enable_incremental_sum();

    // The true branch result is selected, but both increments happened.
    assert_eq!(expr.evaluate(1.0), Ok(1.0));
    assert_eq!(expr.incremental_sum(), 11.0);
    assert_eq!(expr.evaluate(-1.0), Ok(22.0));
    assert_eq!(expr.incremental_sum(), 22.0);

    expr.enable_incremental_sum();
    assert_eq!(expr.incremental_sum(), 0.0);
}

#[test]
fn logical_operators_do_not_short_circuit() {
    let mut expr = Expression::default();
    expr.set_and_parse("(1 > 2 and incsum(1) > 0) + (1 < 2 or incsum(5) > 0)")
        .unwrap();
    expr.enable_incremental_sum();
    assert_eq!(expr.execute(None), Ok(1.0));
    assert_eq!(expr.incremental_sum(), 6.0);
}

#[test]
fn incremental_sum_persists_across_executions() {
    let mut expr = Expression::default();
    expr.set_and_parse("incsum(2)").unwrap();
    let values: Vec<f64> = (0..4).map(|_| expr.execute(None).unwrap()).collect();
    assert_eq!(values, vec![2.0, 4.0, 6.0, 8.0]);
}

#[test]
fn polygon_is_flat_beyond_endpoints() {
    let mut expr = Expression::default();
    expr.set_and_parse("polygon(x, 2,0.2, 5,1, 9,0.4)").unwrap();
    for x in [-100.0, 0.0, 1.999, 2.0] {
        assert_eq!(expr.evaluate(x), Ok(0.2), "x = {x}");
    }
    for x in [9.001, 50.0, 1e9] {
        assert_eq!(expr.evaluate(x), Ok(0.4), "x = {x}");
    }
    assert_close(expr.evaluate(3.5).unwrap(), 0.6);
    assert_close(expr.evaluate(7.0).unwrap(), 0.7);
}

#[test]
fn in_matches_exact_candidates_only() {
    let mut expr = Expression::default();
    expr.set_and_parse("in(x, 1, 4, 7)").unwrap();
    assert_eq!(expr.evaluate(4.0), Ok(1.0));
    assert_eq!(expr.evaluate(7.0), Ok(1.0));
    assert_eq!(expr.evaluate(4.000001), Ok(0.0));
    assert_eq!(expr.evaluate(2.0), Ok(0.0));
}

#[test]
fn two_arguments_bind_to_first_two_slots() {
    let mut expr = Expression::default();
    expr.set_and_parse("a * 10 + b").unwrap();
    assert_eq!(expr.variable_names(), ["a".to_string(), "b".to_string()]);
    assert_eq!(expr.evaluate2(3.0, 4.0), Ok(34.0));
    assert_eq!(expr.evaluate(3.0), Ok(30.0));
}

#[test]
fn accessor_variables_take_precedence_over_locals() {
    let year = 2030;
    let tree = NamedValues::new(BaseVariables::new().with_time(&year))
        .with("dbh", 40.0)
        .with("height", 30.0);

    let mut expr = Expression::new("height / dbh * 100 + (year - 2000)");
    assert_eq!(expr.execute(Some(&tree)), Ok(105.0));
    assert!(expr.variable_names().is_empty());

    // x is local, dbh comes from the accessor.
    let mut expr = Expression::default();
    assert_eq!(expr.evaluate_with(&tree, 2.0, 0.0), Ok(0.0));
    expr.set_expression("x * dbh");
    assert_eq!(expr.evaluate_with(&tree, 2.0, 0.0), Ok(80.0));
    assert_eq!(expr.variable_names(), ["x".to_string()]);
}

#[test]
fn year_without_simulation_time_fails() {
    let values = NamedValues::default().with("dbh", 1.0);
    let mut expr = Expression::new("year + dbh");
    assert_eq!(
        expr.execute(Some(&values)),
        Err(ExpressionError::Eval(EvalError::NoSimulationTime))
    );
}

#[test]
fn model_variables_need_the_accessor_at_run_time() {
    let tree = NamedValues::default().with("dbh", 12.0);
    let mut expr = Expression::new("dbh * 2");
    expr.parse(Some(&tree)).unwrap();
    assert_eq!(
        expr.execute(None),
        Err(ExpressionError::Eval(EvalError::NoAccessor))
    );
    assert_eq!(expr.execute(Some(&tree)), Ok(24.0));
}

#[test]
fn random_functions_use_the_accessor_source() {
    let rng = SharedRng::new(StdRng::seed_from_u64(42));
    let values = NamedValues::new(BaseVariables::new().with_random(&rng));
    let accessor: &dyn VariableAccessor = &values;

    let mut expr = Expression::default();
    expr.set_and_parse("rnd(5, 6)").unwrap();
    for _ in 0..100 {
        let v = expr.execute(Some(accessor)).unwrap();
        assert!((5.0..=6.0).contains(&v), "{v}");
    }

    expr.set_and_parse("rndg(10, 0)").unwrap();
    assert_eq!(expr.execute(Some(accessor)), Ok(10.0));

    assert_eq!(
        expr.execute(None),
        Err(ExpressionError::Eval(EvalError::NoRandomSource))
    );
}

#[test]
fn invalid_sigmoid_type_is_an_evaluation_error() {
    let mut expr = Expression::default();
    expr.set_and_parse("sigmoid(0.5, 7, 1, 1)").unwrap();
    assert_eq!(
        expr.execute(None),
        Err(ExpressionError::Eval(EvalError::InvalidSigmoidType { kind: 7 }))
    );
}

#[test]
fn constant_and_empty_flags() {
    let mut expr = Expression::default();
    expr.set_and_parse("2 * pi_ish").unwrap();
    assert!(!expr.is_constant());
    expr.set_and_parse("2 * 3.14").unwrap();
    assert!(expr.is_constant());
    assert!(!expr.is_empty());
    expr.set_and_parse("").unwrap();
    assert!(expr.is_empty());
    assert_eq!(expr.execute(None), Ok(0.0));
}

#[test]
fn stateful_programs_are_flagged() {
    let mut expr = Expression::default();
    for (text, stateful) in [
        ("incsum(x)", true),
        ("if(x > 1, rnd(0, 1), 0)", true),
        ("rndg(0, 1)", true),
        ("sin(x) + polygon(x, 0,0, 1,1)", false),
    ] {
        expr.set_and_parse(text).unwrap();
        let program = expr.program().unwrap();
        assert_eq!(program.is_stateful(), stateful, "{text}");
    }
}

#[test]
fn shared_program_runs_on_many_threads() {
    let mut locals = Vec::new();
    let program = compile("2*x + 1 + 0*incsum(1)", &mut locals, None, Binding::Lax).unwrap();
    let program = &program;

    let results: Vec<(f64, f64, f64)> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..4)
            .map(|i| {
                scope.spawn(move || {
                    let x = f64::from(i);
                    let mut sum = 10.0 * x;
                    let value = program.run(Frame::new(&[x], &mut sum)).unwrap();
                    (x, value, sum)
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    assert_eq!(results.len(), 4);
    for (x, value, sum) in results {
        assert_eq!(value, 2.0 * x + 1.0);
        // Each run only touches its own accumulator.
        assert_eq!(sum, 10.0 * x + 1.0);
    }
}
