//! Pruebas del generador sobre árboles construidos a mano.

use latex2go::ast::{BinOp, Bounds, Case, Expr};
use latex2go::codegen::{generate, Caveats, GenerateError};

fn num(value: f64) -> Expr {
    Expr::Number(value)
}

fn var(name: &str) -> Expr {
    Expr::Variable(name.to_string())
}

fn bin(op: BinOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

#[test]
fn addition_needs_no_import() {
    let generated = generate(&bin(BinOp::Add, var("a"), var("b")), "main", "calculate").unwrap();

    assert_eq!(
        generated.source,
        "package main\n\nfunc calculate(a float64, b float64) float64 {\n\treturn a + b\n}\n"
    );
    assert!(generated.caveats.is_empty());
}

#[test]
fn parameters_sort_lexicographically() {
    let root = bin(
        BinOp::Add,
        var("z"),
        bin(BinOp::Add, var("y"), var("x")),
    );

    let generated = generate(&root, "main", "calculate").unwrap();
    assert!(generated
        .source
        .contains("func calculate(x float64, y float64, z float64) float64 {"));
}

#[test]
fn exponentiation_imports_math() {
    let generated = generate(&bin(BinOp::Pow, var("a"), var("b")), "main", "calculate").unwrap();

    assert_eq!(
        generated.source,
        "package main\n\nimport \"math\"\n\nfunc calculate(a float64, b float64) float64 {\n\treturn math.Pow(a, b)\n}\n"
    );
}

#[test]
fn integer_constants_keep_one_decimal() {
    let generated = generate(&Expr::Factorial(Box::new(num(5.0))), "main", "calculate").unwrap();
    assert!(generated.source.contains("return math.Gamma(5.0 + 1.0)"));
}

#[test]
fn subtraction_groups_its_right_operand() {
    let root = bin(
        BinOp::Sub,
        var("a"),
        bin(BinOp::Sub, var("b"), var("c")),
    );

    let generated = generate(&root, "main", "calculate").unwrap();
    assert!(generated.source.contains("return a - (b - c)"));
}

#[test]
fn lower_precedence_operands_are_grouped() {
    let root = bin(
        BinOp::Mul,
        bin(BinOp::Add, var("a"), var("b")),
        var("c"),
    );

    let generated = generate(&root, "main", "calculate").unwrap();
    assert!(generated.source.contains("return (a + b) * c"));
}

#[test]
fn unknown_functions_are_rejected_by_name() {
    let root = Expr::Call {
        name: "unknown".to_string(),
        args: vec![var("x")],
    };

    match generate(&root, "main", "calculate") {
        Err(GenerateError::UnsupportedFunction(name)) => assert_eq!(name, "unknown"),
        other => panic!("unexpected result: {:?}", other.map(|g| g.source)),
    }
}

#[test]
fn frac_arity_is_enforced() {
    let root = Expr::Call {
        name: "frac".to_string(),
        args: vec![var("a")],
    };

    match generate(&root, "main", "calculate") {
        Err(GenerateError::FracArity(count)) => assert_eq!(count, 1),
        other => panic!("unexpected result: {:?}", other.map(|g| g.source)),
    }
}

#[test]
fn comparisons_are_invalid_outside_conditions() {
    let error = generate(&bin(BinOp::Less, var("a"), var("b")), "main", "calculate")
        .err()
        .map(|error| error.to_string());

    assert_eq!(
        error.as_deref(),
        Some("comparison operator '<' is only valid inside a piecewise condition")
    );
}

#[test]
fn misplaced_default_case_is_rejected() {
    let root = Expr::Piecewise(vec![
        Case {
            value: num(1.0),
            condition: None,
        },
        Case {
            value: num(2.0),
            condition: Some(bin(BinOp::Greater, var("x"), num(0.0))),
        },
    ]);

    match generate(&root, "main", "calculate") {
        Err(GenerateError::MisplacedDefaultCase) => {}
        other => panic!("unexpected result: {:?}", other.map(|g| g.source)),
    }
}

#[test]
fn piecewise_without_default_falls_back_to_nan() {
    let root = Expr::Piecewise(vec![Case {
        value: num(1.0),
        condition: Some(bin(BinOp::Greater, var("x"), num(0.0))),
    }]);

    let generated = generate(&root, "main", "calculate").unwrap();
    assert!(generated.source.contains("import \"math\""));
    assert!(generated.source.contains("\treturn math.NaN()\n"));
}

#[test]
fn indefinite_integral_reports_its_caveat() {
    let root = Expr::Integral {
        var: "x".to_string(),
        bounds: None,
        body: Box::new(var("x")),
    };

    let generated = generate(&root, "main", "calculate").unwrap();
    assert!(generated.caveats.contains(Caveats::INDEFINITE_INTEGRAL));
    assert!(generated.source.contains("return math.NaN()"));
}

#[test]
fn high_derivative_orders_report_their_caveat() {
    let root = Expr::Derivative {
        is_partial: false,
        var: "x".to_string(),
        order: 3,
        body: Box::new(var("x")),
    };

    let generated = generate(&root, "main", "calculate").unwrap();
    assert!(generated
        .caveats
        .contains(Caveats::UNSUPPORTED_DERIVATIVE_ORDER));
    assert!(generated
        .source
        .contains("// Derivative of order 3 is not supported"));
    assert!(generated.source.contains("\treturn 0.0\n"));
}

#[test]
fn fractional_sum_bounds_report_their_caveat() {
    let root = Expr::Sum {
        is_product: false,
        var: "i".to_string(),
        lower: Box::new(num(1.5)),
        upper: Box::new(var("n")),
        body: Box::new(var("i")),
    };

    let generated = generate(&root, "main", "calculate").unwrap();
    assert!(generated.caveats.contains(Caveats::TRUNCATED_SUM_BOUNDS));
    assert!(generated.source.contains("lo_ := math.Trunc(1.5)"));
}

#[test]
fn unsupported_constructs_fail_even_in_discarded_bodies() {
    // El cuerpo de una integral indefinida no se emite, pero sí se baja
    let root = Expr::Integral {
        var: "x".to_string(),
        bounds: None,
        body: Box::new(Expr::Call {
            name: "unknown".to_string(),
            args: vec![var("x")],
        }),
    };

    assert!(matches!(
        generate(&root, "main", "calculate"),
        Err(GenerateError::UnsupportedFunction(_))
    ));
}

#[test]
fn generation_is_deterministic() {
    let root = bin(
        BinOp::Add,
        bin(BinOp::Pow, var("x"), num(2.0)),
        bin(BinOp::Pow, var("y"), num(2.0)),
    );

    let first = generate(&root, "main", "calculate").unwrap();
    let second = generate(&root, "main", "calculate").unwrap();
    assert_eq!(first.source, second.source);
}

#[test]
fn go_keywords_are_sanitized() {
    let generated = generate(&var("for"), "main", "calculate").unwrap();

    assert_eq!(
        generated.source,
        "package main\n\nfunc calculate(for_ float64) float64 {\n\treturn for_\n}\n"
    );
}

#[test]
fn derivative_variable_stays_a_parameter() {
    let root = Expr::Derivative {
        is_partial: false,
        var: "x".to_string(),
        order: 1,
        body: Box::new(bin(BinOp::Pow, var("x"), num(2.0))),
    };

    let generated = generate(&root, "main", "calculate").unwrap();
    assert!(generated.source.contains("func calculate(x float64) float64 {"));
    assert!(generated
        .source
        .contains("return (f_(x + h_) - f_(x - h_)) / (2.0 * h_)"));
}
