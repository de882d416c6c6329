use formula_expr::{
    compile, BaseVariables, Binding, Expression, ExpressionError, NamedValues, ParseError,
    VariableAccessor, MAX_LOCAL_VARIABLES,
};
use pretty_assertions::assert_eq;

fn lax(text: &str) -> Result<(), ParseError> {
    let mut expr = Expression::default();
    expr.set_and_parse(text)
}

#[test]
fn unbalanced_parentheses() {
    assert_eq!(lax("(1 + 2"), Err(ParseError::UnbalancedParentheses));
    assert_eq!(lax("((x)"), Err(ParseError::UnbalancedParentheses));
    assert_eq!(lax("x + 1)"), Err(ParseError::UnbalancedParentheses));
    assert_eq!(lax(")"), Err(ParseError::UnbalancedParentheses));
    assert_eq!(lax("min(1, ())"), Err(ParseError::UnbalancedParentheses));
}

#[test]
fn wrong_arity_is_reported_with_counts() {
    assert_eq!(
        lax("sin(1,2)"),
        Err(ParseError::ArgumentCount {
            function: "sin",
            expected: "1",
            found: 2
        })
    );
    assert_eq!(
        lax("if(1, 2)"),
        Err(ParseError::ArgumentCount {
            function: "if",
            expected: "3",
            found: 2
        })
    );
    assert_eq!(
        lax("in(3)"),
        Err(ParseError::ArgumentCount {
            function: "in",
            expected: "at least 2",
            found: 1
        })
    );
    assert_eq!(
        lax("max()"),
        Err(ParseError::ArgumentCount {
            function: "max",
            expected: "at least 1",
            found: 0
        })
    );
    assert!(lax("polygon(x, 0,0, 1,1)").is_ok());
    assert!(matches!(
        lax("polygon(x, 0,0, 1,1, 2)"),
        Err(ParseError::ArgumentCount { found: 6, .. })
    ));
}

#[test]
fn unknown_function_and_missing_bracket() {
    assert_eq!(
        lax("log(10)"),
        Err(ParseError::UnknownFunction { name: "log".into() })
    );
    assert_eq!(
        lax("min(1, 2"),
        Err(ParseError::MissingClosingBracket { function: "min" })
    );
    assert_eq!(
        lax("sqrt("),
        Err(ParseError::MissingClosingBracket { function: "sqrt" })
    );
}

#[test]
fn garbage_input() {
    assert_eq!(lax("2 $ 3"), Err(ParseError::SyntaxError { token: "$".into() }));
    assert_eq!(lax("@"), Err(ParseError::SyntaxError { token: "@".into() }));
    assert_eq!(lax("1 +"), Err(ParseError::UnexpectedEnd));
    assert_eq!(lax("3 4"), Err(ParseError::TrailingInput { token: "4".into() }));
    assert_eq!(
        lax("1..5 + 2"),
        Err(ParseError::InvalidNumber {
            literal: "1..5".into()
        })
    );
    assert_eq!(lax("1 => 2"), Err(ParseError::SyntaxError { token: "=>".into() }));
}

#[test]
fn strict_mode_requires_accessor_or_registered_names() {
    let tree = NamedValues::new(BaseVariables::new()).with("dbh", 20.0);
    let accessor: &dyn VariableAccessor = &tree;

    let mut expr = Expression::new("dbh * 2");
    assert_eq!(expr.execute(Some(accessor)), Ok(40.0));

    let mut expr = Expression::new("dbh * hieght");
    assert_eq!(
        expr.execute(Some(accessor)),
        Err(ExpressionError::Parse(ParseError::VariableNotAvailable {
            name: "hieght".into()
        }))
    );

    // Lax mode accepts the same text by creating a local slot.
    let mut locals = Vec::new();
    let program = compile("dbh * hieght", &mut locals, Some(accessor), Binding::Lax).unwrap();
    assert_eq!(locals, vec!["hieght".to_string()]);
    assert_eq!(program.to_string(), "model[1] hieght * <stop>");
}

#[test]
fn local_slots_are_bounded() {
    let text = (0..=MAX_LOCAL_VARIABLES)
        .map(|i| format!("v{i}"))
        .collect::<Vec<_>>()
        .join(" + ");
    assert_eq!(lax(&text), Err(ParseError::TooManyVariables));

    let mut expr = Expression::default();
    for i in 0..MAX_LOCAL_VARIABLES {
        assert_eq!(expr.add_variable(&format!("v{i}")), Ok(i));
    }
    assert_eq!(expr.add_variable("one_more"), Err(ParseError::TooManyVariables));
}

#[test]
fn errors_have_readable_messages() {
    assert_eq!(
        ParseError::ArgumentCount {
            function: "sin",
            expected: "1",
            found: 2
        }
        .to_string(),
        "function 'sin' expects 1 argument(s), found 2"
    );
    assert_eq!(
        ParseError::VariableNotAvailable { name: "x".into() }.to_string(),
        "variable 'x' is not available"
    );
}
