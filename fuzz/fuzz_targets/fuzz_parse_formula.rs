#![no_main]

use formula_expr::{compile, Binding, NamedValues, VariableAccessor};
use libfuzzer_sys::fuzz_target;

/// Parameter formulas are short; longer inputs only slow the fuzzer down.
const MAX_FUZZ_FORMULA_CHARS: usize = 4_096;
const MAX_INPUT_BYTES: usize = MAX_FUZZ_FORMULA_CHARS * 4; // max UTF-8 bytes per char

fn truncate_to_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let rest = &rest[..rest.len().min(MAX_INPUT_BYTES)];
    let input = String::from_utf8_lossy(rest);
    let formula = truncate_to_chars(&input, MAX_FUZZ_FORMULA_CHARS);

    let binding = if selector & 0b1 == 0 {
        Binding::Lax
    } else {
        Binding::Strict
    };
    let tree = NamedValues::default().with("dbh", 30.0).with("height", 25.0);
    let accessor: Option<&dyn VariableAccessor> = if selector & 0b10 == 0 {
        None
    } else {
        Some(&tree)
    };

    let mut locals = Vec::new();
    if let Ok(program) = compile(formula, &mut locals, accessor, binding) {
        // Every program ends with exactly one stop and only references registered slots.
        assert!(matches!(
            program.instrs().last(),
            Some(formula_expr::Instruction::Stop)
        ));
        assert!(locals.len() <= formula_expr::MAX_LOCAL_VARIABLES);
        let _ = program.to_string();
    }
});
