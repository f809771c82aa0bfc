//! Lowering de nodos del AST a fragmentos Go.
//!
//! Cada nodo baja a un valor ([`Snippet`]: código, precedencia del
//! nivel superior y si requiere `math`) o a un bloque de sentencias
//! que termina en `return`. Un bloque usado en posición de expresión
//! se envuelve en un `func() float64 { ... }()` invocado de inmediato.
//!
//! Los constructos sin forma cerrada en aritmética ordinaria se
//! sintetizan como aproximaciones numéricas: regla del trapecio
//! compuesta para integrales definidas, diferencias centrales para
//! derivadas y una perturbación épsilon unilateral para límites.

use unicase::Ascii;

use super::{Caveats, GenerateError};
use crate::ast::{BinOp, Bounds, Case, Expr};

/// Funciones LaTeX soportadas y su contraparte en `math`.
///
/// La búsqueda no distingue mayúsculas, igual que la tabla de palabras
/// clave del lexer del que desciende este proyecto.
const FUNCTIONS: &[(Ascii<&'static str>, &'static str)] = &[
    (Ascii::new("sqrt"), "math.Sqrt"),
    (Ascii::new("sin"), "math.Sin"),
    (Ascii::new("cos"), "math.Cos"),
    (Ascii::new("tan"), "math.Tan"),
];

/// Palabras reservadas de Go, más `math`, en orden alfabético.
const RESERVED: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "math",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

/// Precedencia del nivel superior de un fragmento emitido.
///
/// Solo se parentiza un operando cuando su precedencia lo exige, de
/// modo que la salida se lea como la escribiría una persona.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(super) enum Prec {
    Sum,
    MulDiv,
    Atom,
}

/// Fragmento de expresión ya bajado.
pub(super) struct Snippet {
    pub code: String,
    pub prec: Prec,
    pub needs_math: bool,
}

/// Resultado de bajar un nodo.
pub(super) enum Lowered {
    Value(Snippet),

    /// Sentencias sin sangría base; cada elemento es una línea física.
    Block {
        lines: Vec<String>,
        needs_math: bool,
    },
}

impl Lowered {
    /// Convierte a posición de expresión, envolviendo bloques en un
    /// `func() float64` inmediatamente invocado.
    fn into_value(self) -> Snippet {
        match self {
            Lowered::Value(snippet) => snippet,

            Lowered::Block { lines, needs_math } => {
                let mut code = String::from("func() float64 {\n");
                for line in lines {
                    code.push('\t');
                    code.push_str(&line);
                    code.push('\n');
                }
                code.push_str("}()");

                Snippet {
                    code,
                    prec: Prec::Atom,
                    needs_math,
                }
            }
        }
    }
}

/// Estado de un lowering completo: acumula las limitaciones admitidas.
pub(super) struct Lowerer {
    caveats: Caveats,
}

impl Lowerer {
    pub fn new() -> Self {
        Lowerer {
            caveats: Caveats::empty(),
        }
    }

    pub fn caveats(&self) -> Caveats {
        self.caveats
    }

    /// Baja un nodo, de forma total: todo subárbol se visita aunque su
    /// código no se emita, para que un constructo no soportado falle
    /// siempre.
    pub fn lower(&mut self, expr: &Expr) -> Result<Lowered, GenerateError> {
        match expr {
            Expr::Number(value) => Ok(Lowered::Value(Snippet {
                code: float_literal(*value),
                prec: if *value < 0.0 { Prec::MulDiv } else { Prec::Atom },
                needs_math: false,
            })),

            Expr::Variable(name) => Ok(Lowered::Value(Snippet {
                code: sanitize(name),
                prec: Prec::Atom,
                needs_math: false,
            })),

            Expr::Binary { op, left, right } => self.binary(*op, left, right),
            Expr::Call { name, args } => self.call(name, args),

            Expr::Factorial(operand) => {
                let operand = self.value(operand)?;
                let operand = atom(operand.code, operand.prec);

                Ok(Lowered::Value(Snippet {
                    code: format!("math.Gamma({} + 1.0)", operand),
                    prec: Prec::Atom,
                    needs_math: true,
                }))
            }

            Expr::Sum {
                is_product,
                var,
                lower,
                upper,
                body,
            } => self.sum(*is_product, var, lower, upper, body),

            Expr::Integral { var, bounds, body } => match bounds {
                Some(bounds) => self.definite_integral(var, bounds, body),
                None => self.indefinite_integral(body),
            },

            Expr::Derivative {
                var, order, body, ..
            } => self.derivative(var, *order, body),

            Expr::Limit {
                var,
                approaches,
                body,
            } => self.limit(var, approaches, body),

            Expr::Piecewise(cases) => self.piecewise(cases),
        }
    }

    fn value(&mut self, expr: &Expr) -> Result<Snippet, GenerateError> {
        Ok(self.lower(expr)?.into_value())
    }

    fn binary(&mut self, op: BinOp, left: &Expr, right: &Expr) -> Result<Lowered, GenerateError> {
        let left = self.value(left)?;
        let right = self.value(right)?;
        let needs_math = left.needs_math || right.needs_math;

        let (symbol, prec) = match op {
            BinOp::Add => ("+", Prec::Sum),
            BinOp::Sub => ("-", Prec::Sum),
            BinOp::Mul => ("*", Prec::MulDiv),
            BinOp::Div => ("/", Prec::MulDiv),

            // La exponenciación no existe como operador en Go
            BinOp::Pow => {
                return Ok(Lowered::Value(Snippet {
                    code: format!("math.Pow({}, {})", left.code, right.code),
                    prec: Prec::Atom,
                    needs_math: true,
                }));
            }

            op => return Err(GenerateError::ComparisonOutsideCondition(op)),
        };

        let left = if left.prec < prec {
            format!("({})", left.code)
        } else {
            left.code
        };

        // La resta y la división no son asociativas: un operando
        // derecho de igual precedencia también se parentiza
        let grouped = right.prec < prec
            || (right.prec == prec && matches!(op, BinOp::Sub | BinOp::Div));
        let right = if grouped {
            format!("({})", right.code)
        } else {
            right.code
        };

        Ok(Lowered::Value(Snippet {
            code: format!("{} {} {}", left, symbol, right),
            prec,
            needs_math,
        }))
    }

    fn call(&mut self, name: &str, args: &[Expr]) -> Result<Lowered, GenerateError> {
        // `\frac{a}{b}` baja a división con paréntesis obligatorios en
        // ambos operandos, sin importar su forma
        if Ascii::new(name) == Ascii::new("frac") {
            if args.len() != 2 {
                return Err(GenerateError::FracArity(args.len()));
            }

            let numerator = self.value(&args[0])?;
            let denominator = self.value(&args[1])?;

            return Ok(Lowered::Value(Snippet {
                code: format!("({}) / ({})", numerator.code, denominator.code),
                prec: Prec::MulDiv,
                needs_math: numerator.needs_math || denominator.needs_math,
            }));
        }

        let target = FUNCTIONS
            .iter()
            .find(|(latex, _)| *latex == Ascii::new(name))
            .map(|(_, go)| *go);

        let target = match target {
            Some(target) => target,
            None => return Err(GenerateError::UnsupportedFunction(name.to_string())),
        };

        let mut lowered = Vec::with_capacity(args.len());
        for arg in args {
            lowered.push(self.value(arg)?.code);
        }

        Ok(Lowered::Value(Snippet {
            code: format!("{}({})", target, lowered.join(", ")),
            prec: Prec::Atom,
            needs_math: true,
        }))
    }

    fn sum(
        &mut self,
        is_product: bool,
        var: &str,
        lower: &Expr,
        upper: &Expr,
        body: &Expr,
    ) -> Result<Lowered, GenerateError> {
        self.flag_truncated(lower);
        self.flag_truncated(upper);

        let lower = self.value(lower)?;
        let upper = self.value(upper)?;
        let body = self.value(body)?;

        let v = sanitize(var);
        let (init, combine) = if is_product { ("1.0", "*=") } else { ("0.0", "+=") };

        // Las cotas se truncan para iterar; de ahí que este bloque
        // siempre dependa de math
        let mut lines = Vec::new();
        emit!(lines, 0, "lo_ := math.Trunc({})", lower.code);
        emit!(lines, 0, "hi_ := math.Trunc({})", upper.code);
        emit!(lines, 0, "acc_ := {}", init);
        emit!(lines, 0, "for {} := lo_; {} <= hi_; {} += 1.0 {{", v, v, v);
        emit!(lines, 1, "acc_ {} {}", combine, body.code);
        emit!(lines, 0, "}}");
        emit!(lines, 0, "return acc_");

        Ok(Lowered::Block {
            lines,
            needs_math: true,
        })
    }

    /// Marca la limitación de cotas no enteras cuando es visible
    /// estáticamente.
    fn flag_truncated(&mut self, bound: &Expr) {
        if let Expr::Number(value) = bound {
            if value.fract() != 0.0 {
                self.caveats |= Caveats::TRUNCATED_SUM_BOUNDS;
            }
        }
    }

    fn definite_integral(
        &mut self,
        var: &str,
        bounds: &Bounds,
        body: &Expr,
    ) -> Result<Lowered, GenerateError> {
        let lower = self.value(&bounds.lower)?;
        let upper = self.value(&bounds.upper)?;
        let body = self.value(body)?;

        let v = sanitize(var);
        let needs_math = lower.needs_math || upper.needs_math || body.needs_math;
        let integrand = if body.prec < Prec::MulDiv {
            format!("({})", body.code)
        } else {
            body.code
        };

        let mut lines = Vec::new();
        emit!(lines, 0, "// Lower bound of integration");
        emit!(lines, 0, "lo_ := {}", lower.code);
        emit!(lines, 0, "// Upper bound of integration");
        emit!(lines, 0, "hi_ := {}", upper.code);
        emit!(lines, 0, "// Composite trapezoidal rule with 1000 panels");
        emit!(lines, 0, "h_ := (hi_ - lo_) / 1000.0");
        emit!(lines, 0, "acc_ := 0.0");
        emit!(lines, 0, "for k_ := 0; k_ <= 1000; k_++ {{");
        emit!(lines, 1, "{} := lo_ + float64(k_)*h_", v);
        emit!(lines, 1, "w_ := 1.0");
        emit!(lines, 1, "if k_ == 0 || k_ == 1000 {{");
        emit!(lines, 2, "w_ = 0.5");
        emit!(lines, 1, "}}");
        emit!(lines, 1, "acc_ += w_ * {}", integrand);
        emit!(lines, 0, "}}");
        emit!(lines, 0, "return acc_ * h_");

        Ok(Lowered::Block { lines, needs_math })
    }

    fn indefinite_integral(&mut self, body: &Expr) -> Result<Lowered, GenerateError> {
        // El cuerpo se baja solo para detectar constructos no
        // soportados; su código y banderas se descartan
        self.lower(body)?;
        self.caveats |= Caveats::INDEFINITE_INTEGRAL;

        let mut lines = Vec::new();
        emit!(lines, 0, "// Indefinite integral has no closed form here");
        emit!(lines, 0, "// Symbolic integration is not supported");
        emit!(lines, 0, "return math.NaN()");

        Ok(Lowered::Block {
            lines,
            needs_math: true,
        })
    }

    fn derivative(&mut self, var: &str, order: u32, body: &Expr) -> Result<Lowered, GenerateError> {
        let v = sanitize(var);

        match order {
            1 => {
                let body = self.value(body)?;

                let mut lines = Vec::new();
                emit!(lines, 0, "h_ := 1e-5");
                emit!(lines, 0, "f_ := func({} float64) float64 {{", v);
                emit!(lines, 1, "return {}", body.code);
                emit!(lines, 0, "}}");
                emit!(lines, 0, "// First-order central difference approximation");
                emit!(lines, 0, "return (f_({} + h_) - f_({} - h_)) / (2.0 * h_)", v, v);

                Ok(Lowered::Block {
                    lines,
                    needs_math: body.needs_math,
                })
            }

            2 => {
                let body = self.value(body)?;

                let mut lines = Vec::new();
                emit!(lines, 0, "h_ := 1e-5");
                emit!(lines, 0, "f_ := func({} float64) float64 {{", v);
                emit!(lines, 1, "return {}", body.code);
                emit!(lines, 0, "}}");
                emit!(lines, 0, "// Second-order central difference approximation");
                emit!(
                    lines,
                    0,
                    "return (f_({} + h_) - 2.0*f_({}) + f_({} - h_)) / math.Pow(h_, 2.0)",
                    v,
                    v,
                    v
                );

                Ok(Lowered::Block {
                    lines,
                    needs_math: true,
                })
            }

            order => {
                // Igual que con la integral indefinida: se valida el
                // cuerpo pero no se emite
                self.lower(body)?;
                self.caveats |= Caveats::UNSUPPORTED_DERIVATIVE_ORDER;

                let mut lines = Vec::new();
                emit!(lines, 0, "// Derivative of order {} is not supported", order);
                emit!(lines, 0, "return 0.0");

                Ok(Lowered::Block {
                    lines,
                    needs_math: false,
                })
            }
        }
    }

    fn limit(&mut self, var: &str, approaches: &Expr, body: &Expr) -> Result<Lowered, GenerateError> {
        let approaches = self.value(approaches)?;
        let body = self.value(body)?;
        let v = sanitize(var);

        let mut lines = Vec::new();
        emit!(lines, 0, "// One-sided approximation with a small epsilon offset");
        emit!(lines, 0, "eps_ := 1e-9");
        emit!(lines, 0, "at_ := {} + eps_", approaches.code);
        emit!(lines, 0, "f_ := func({} float64) float64 {{", v);
        emit!(lines, 1, "return {}", body.code);
        emit!(lines, 0, "}}");
        emit!(lines, 0, "return f_(at_)");

        Ok(Lowered::Block {
            lines,
            needs_math: approaches.needs_math || body.needs_math,
        })
    }

    fn piecewise(&mut self, cases: &[Case]) -> Result<Lowered, GenerateError> {
        let mut lines = Vec::new();
        let mut needs_math = false;
        let mut has_default = false;

        for (index, case) in cases.iter().enumerate() {
            match &case.condition {
                Some(condition) => {
                    let (condition, condition_math) = self.condition(condition)?;
                    let value = self.value(&case.value)?;
                    needs_math |= condition_math || value.needs_math;

                    emit!(lines, 0, "if {} {{", condition);
                    emit!(lines, 1, "return {}", value.code);
                    emit!(lines, 0, "}}");
                }

                None => {
                    if index + 1 != cases.len() {
                        return Err(GenerateError::MisplacedDefaultCase);
                    }

                    let value = self.value(&case.value)?;
                    needs_math |= value.needs_math;
                    has_default = true;

                    emit!(lines, 0, "return {}", value.code);
                }
            }
        }

        if !has_default {
            emit!(lines, 0, "// No default case matched");
            emit!(lines, 0, "return math.NaN()");
            needs_math = true;
        }

        Ok(Lowered::Block { lines, needs_math })
    }

    /// Baja la condición de un caso.
    ///
    /// Una comparación baja al operador Go correspondiente; cualquier
    /// otra expresión se considera verdadera cuando es distinta de
    /// cero.
    fn condition(&mut self, condition: &Expr) -> Result<(String, bool), GenerateError> {
        if let Expr::Binary { op, left, right } = condition {
            if let Some(symbol) = comparison_symbol(*op) {
                let left = self.value(left)?;
                let right = self.value(right)?;

                return Ok((
                    format!("{} {} {}", left.code, symbol, right.code),
                    left.needs_math || right.needs_math,
                ));
            }
        }

        let value = self.value(condition)?;
        let code = atom(value.code, value.prec);
        Ok((format!("{} != 0.0", code), value.needs_math))
    }
}

fn comparison_symbol(op: BinOp) -> Option<&'static str> {
    match op {
        BinOp::Equal => Some("=="),
        BinOp::NotEqual => Some("!="),
        BinOp::Less => Some("<"),
        BinOp::LessOrEqual => Some("<="),
        BinOp::Greater => Some(">"),
        BinOp::GreaterOrEqual => Some(">="),
        _ => None,
    }
}

/// Parentiza un fragmento no atómico.
fn atom(code: String, prec: Prec) -> String {
    if prec < Prec::Atom {
        format!("({})", code)
    } else {
        code
    }
}

/// Formatea una constante como literal flotante de Go.
///
/// Un valor entero se imprime con un decimal (`5.0`) para que una
/// división entre constantes no se convierta en división entera.
pub(super) fn float_literal(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Reemplaza nombres que colisionan con palabras reservadas de Go.
///
/// El sufijo `_` no puede chocar con otro identificador de la
/// expresión porque estos son corridas de letras puras.
pub(super) fn sanitize(name: &str) -> String {
    if RESERVED.binary_search(&name).is_ok() {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_words_are_sorted_for_binary_search() {
        let mut sorted = RESERVED.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, RESERVED);
    }

    #[test]
    fn sanitize_only_touches_reserved_words() {
        assert_eq!(sanitize("for"), "for_");
        assert_eq!(sanitize("math"), "math_");
        assert_eq!(sanitize("x"), "x");
        assert_eq!(sanitize("velocity"), "velocity");
    }

    #[test]
    fn integer_literals_keep_a_decimal() {
        assert_eq!(float_literal(5.0), "5.0");
        assert_eq!(float_literal(-1.0), "-1.0");
        assert_eq!(float_literal(0.0), "0.0");
        assert_eq!(float_literal(2.5), "2.5");
    }

    #[test]
    fn blocks_wrap_into_invoked_closures() {
        let block = Lowered::Block {
            lines: vec![String::from("return 1.0")],
            needs_math: false,
        };

        let snippet = block.into_value();
        assert_eq!(snippet.code, "func() float64 {\n\treturn 1.0\n}()");
        assert!(matches!(snippet.prec, Prec::Atom));
    }
}
