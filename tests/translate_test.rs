//! Pruebas de extremo a extremo sobre la fachada [`translate`].

use latex2go::codegen::Caveats;
use latex2go::{translate, TranslateError};

fn source(input: &str) -> String {
    match translate(input, "", "") {
        Ok(translation) => translation.source,
        Err(error) => panic!("translation of {:?} failed: {}", input, error),
    }
}

#[test]
fn addition_of_two_parameters() {
    assert_eq!(
        source("a + b"),
        "package main\n\n\
         func calculate(a float64, b float64) float64 {\n\
         \treturn a + b\n\
         }\n"
    );
}

#[test]
fn powers_import_math() {
    assert_eq!(
        source("x^2 + y^2"),
        "package main\n\n\
         import \"math\"\n\n\
         func calculate(x float64, y float64) float64 {\n\
         \treturn math.Pow(x, 2.0) + math.Pow(y, 2.0)\n\
         }\n"
    );
}

#[test]
fn frac_divides_with_explicit_grouping() {
    assert_eq!(
        source("\\frac{a}{b}"),
        "package main\n\n\
         func calculate(a float64, b float64) float64 {\n\
         \treturn (a) / (b)\n\
         }\n"
    );
}

#[test]
fn sqrt_maps_to_the_math_library() {
    assert_eq!(
        source("\\sqrt{x}"),
        "package main\n\n\
         import \"math\"\n\n\
         func calculate(x float64) float64 {\n\
         \treturn math.Sqrt(x)\n\
         }\n"
    );
}

#[test]
fn summation_lowers_to_an_accumulator_loop() {
    assert_eq!(
        source("\\sum_{i=1}^{n} i"),
        "package main\n\n\
         import \"math\"\n\n\
         func calculate(n float64) float64 {\n\
         \tlo_ := math.Trunc(1.0)\n\
         \thi_ := math.Trunc(n)\n\
         \tacc_ := 0.0\n\
         \tfor i := lo_; i <= hi_; i += 1.0 {\n\
         \t\tacc_ += i\n\
         \t}\n\
         \treturn acc_\n\
         }\n"
    );
}

#[test]
fn product_starts_its_accumulator_at_one() {
    let source = source("\\prod_{k=1}^{n} k");
    assert!(source.contains("acc_ := 1.0"));
    assert!(source.contains("acc_ *= k"));
}

#[test]
fn definite_integral_uses_the_trapezoidal_rule() {
    assert_eq!(
        source("\\int_{0}^{1} x dx"),
        "package main\n\n\
         func calculate() float64 {\n\
         \t// Lower bound of integration\n\
         \tlo_ := 0.0\n\
         \t// Upper bound of integration\n\
         \thi_ := 1.0\n\
         \t// Composite trapezoidal rule with 1000 panels\n\
         \th_ := (hi_ - lo_) / 1000.0\n\
         \tacc_ := 0.0\n\
         \tfor k_ := 0; k_ <= 1000; k_++ {\n\
         \t\tx := lo_ + float64(k_)*h_\n\
         \t\tw_ := 1.0\n\
         \t\tif k_ == 0 || k_ == 1000 {\n\
         \t\t\tw_ = 0.5\n\
         \t\t}\n\
         \t\tacc_ += w_ * x\n\
         \t}\n\
         \treturn acc_ * h_\n\
         }\n"
    );
}

#[test]
fn indefinite_integral_succeeds_with_a_caveat() {
    let translation = translate("\\int x dx", "", "").unwrap();

    assert!(translation.caveats.contains(Caveats::INDEFINITE_INTEGRAL));
    assert!(translation.source.contains("return math.NaN()"));
    assert!(translation.source.contains("import \"math\""));
}

#[test]
fn derivative_lowers_to_central_differences() {
    let translation = translate("\\frac{d}{dx} x^2", "", "").unwrap();

    assert!(translation.caveats.is_empty());
    assert!(translation
        .source
        .contains("func calculate(x float64) float64 {"));
    assert!(translation
        .source
        .contains("f_ := func(x float64) float64 {"));
    assert!(translation
        .source
        .contains("return (f_(x + h_) - f_(x - h_)) / (2.0 * h_)"));
}

#[test]
fn second_order_derivative_uses_its_own_stencil() {
    let translation = translate("\\frac{d^2}{dx^2} x", "", "").unwrap();

    assert!(translation.caveats.is_empty());
    assert!(translation
        .source
        .contains("return (f_(x + h_) - 2.0*f_(x) + f_(x - h_)) / math.Pow(h_, 2.0)"));
}

#[test]
fn third_order_derivative_degrades_with_a_caveat() {
    let translation = translate("\\frac{d^3}{dx^3} x", "", "").unwrap();

    assert!(translation
        .caveats
        .contains(Caveats::UNSUPPORTED_DERIVATIVE_ORDER));
    assert!(translation.source.contains("return 0.0"));
}

#[test]
fn limit_evaluates_at_an_epsilon_offset() {
    assert_eq!(
        source("\\lim_{x \\to 0} x"),
        "package main\n\n\
         func calculate() float64 {\n\
         \t// One-sided approximation with a small epsilon offset\n\
         \teps_ := 1e-9\n\
         \tat_ := 0.0 + eps_\n\
         \tf_ := func(x float64) float64 {\n\
         \t\treturn x\n\
         \t}\n\
         \treturn f_(at_)\n\
         }\n"
    );
}

#[test]
fn limit_without_to_surfaces_its_warning() {
    let translation = translate("\\lim_{x 0} x", "", "").unwrap();

    assert_eq!(translation.warnings.len(), 1);
    assert_eq!(
        translation.warnings[0].message(),
        "couldn't find 'to' in limit expression, assuming implied"
    );
}

#[test]
fn piecewise_lowers_to_condition_chains() {
    assert_eq!(
        source("\\begin{cases} x & x > 0 \\\\ -x \\end{cases}"),
        "package main\n\n\
         func calculate(x float64) float64 {\n\
         \tif x > 0.0 {\n\
         \t\treturn x\n\
         \t}\n\
         \treturn -1.0 * x\n\
         }\n"
    );
}

#[test]
fn nested_block_constructs_wrap_in_a_closure() {
    assert_eq!(
        source("(\\sum_{i=1}^{n} i) + 1"),
        "package main\n\n\
         import \"math\"\n\n\
         func calculate(n float64) float64 {\n\
         \treturn func() float64 {\n\
         \t\tlo_ := math.Trunc(1.0)\n\
         \t\thi_ := math.Trunc(n)\n\
         \t\tacc_ := 0.0\n\
         \t\tfor i := lo_; i <= hi_; i += 1.0 {\n\
         \t\t\tacc_ += i\n\
         \t\t}\n\
         \t\treturn acc_\n\
         \t}() + 1.0\n\
         }\n"
    );
}

#[test]
fn factorial_lowers_to_the_gamma_function() {
    let source = source("a! + b");
    assert!(source.contains("import \"math\""));
    assert!(source.contains("return math.Gamma(a + 1.0) + b"));
}

#[test]
fn names_default_when_empty() {
    let translation = translate("a", "", "").unwrap();
    assert!(translation.source.starts_with("package main\n"));
    assert!(translation.source.contains("func calculate("));

    let translation = translate("a", "formulas", "evaluate").unwrap();
    assert!(translation.source.starts_with("package formulas\n"));
    assert!(translation.source.contains("func evaluate("));
}

#[test]
fn empty_input_is_rejected() {
    for input in &["", "   ", "\n\t"] {
        match translate(input, "", "") {
            Err(TranslateError::EmptyInput) => {}
            other => panic!("unexpected result for {:?}: {:?}", input, other.is_ok()),
        }
    }

    assert_eq!(
        TranslateError::EmptyInput.to_string(),
        "latex input cannot be empty"
    );
}

#[test]
fn trailing_tokens_fail_translation() {
    match translate("\\sqrt{x} y", "", "") {
        Err(TranslateError::Parse(errors)) => {
            assert_eq!(
                errors.diagnostics()[0].message(),
                "unexpected token 'y' after expression"
            );
        }
        other => panic!("unexpected result: {:?}", other.is_ok()),
    }
}

#[test]
fn generation_failures_surface_through_the_facade() {
    match translate("\\unknown{x}", "", "") {
        Err(TranslateError::Generate(error)) => {
            assert_eq!(error.to_string(), "unsupported LaTeX function: unknown");
        }
        other => panic!("unexpected result: {:?}", other.is_ok()),
    }
}
