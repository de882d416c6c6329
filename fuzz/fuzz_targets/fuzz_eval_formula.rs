#![no_main]

use formula_expr::{
    AgingCurve, BaseVariables, EvalError, Expression, ExpressionError, HeightDiameterRatioBound,
    NamedValues, SharedRng,
};
use libfuzzer_sys::fuzz_target;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::Cell;

const MAX_EVAL_FORMULA_CHARS: usize = 1_024;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let input = String::from_utf8_lossy(rest);
    let formula: String = input.chars().take(MAX_EVAL_FORMULA_CHARS).collect();

    let year = Cell::new(2000 + i32::from(selector));
    let rng = SharedRng::new(StdRng::seed_from_u64(u64::from(selector)));
    let tree = NamedValues::new(BaseVariables::new().with_time(&year).with_random(&rng))
        .with("dbh", f64::from(selector) / 4.0)
        .with("height", 25.0);

    let mut expr = Expression::new(&formula);
    expr.set_strict(selector & 0b1 != 0);
    match expr.execute(Some(&tree)) {
        Ok(_) => {}
        // Parse failures and missing bindings are expected; anything else would be a VM bug.
        Err(ExpressionError::Parse(_))
        | Err(ExpressionError::Eval(EvalError::InvalidSigmoidType { .. })) => {}
        Err(err) => panic!("unexpected evaluation failure for {formula:?}: {err}"),
    }

    if selector & 0b10 != 0 && expr.linearize(0.0, 100.0, 64).is_ok() {
        let _ = expr.evaluate(f64::from(selector) / 2.55);
    }

    let _ = formula.parse::<AgingCurve>().map(|c| c.evaluate(0.5));
    let _ = formula
        .parse::<HeightDiameterRatioBound>()
        .map(|hd| hd.evaluate(f32::from(selector)));
});
