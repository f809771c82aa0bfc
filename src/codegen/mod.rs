//! Generación de código Go.
//!
//! # Contrato
//! [`generate`] recibe la raíz de un AST y produce el texto de un
//! archivo Go completo: una única función cuyos parámetros son las
//! variables libres de la expresión (ordenadas lexicográficamente para
//! que la salida sea reproducible byte a byte), todos de tipo
//! `float64`, con `import "math"` solo cuando algún fragmento emitido
//! lo requiere.
//!
//! # División de responsabilidades
//! Este módulo es el conductor: recolecta variables libres con una
//! pila de ámbitos, ensambla el archivo y valida el balance de
//! delimitadores del resultado. El lowering nodo por nodo vive en el
//! backend [`golang`].
//!
//! # Limitaciones reportadas
//! Una integral indefinida, una derivada de orden no soportado o una
//! cota de sumatoria visiblemente no entera producen una generación
//! exitosa acompañada de un bit en [`Caveats`]; nunca salida
//! silenciosamente incorrecta.

use std::collections::BTreeSet;

use bitflags::bitflags;
use thiserror::Error;

use crate::ast::{BinOp, Expr};

mod golang;

bitflags! {
    /// Limitaciones admitidas durante una generación exitosa.
    pub struct Caveats: u32 {
        /// La integral no tiene cotas; la función generada retorna NaN.
        const INDEFINITE_INTEGRAL = 0x01;

        /// Derivada de orden mayor a 2; la función generada retorna 0.
        const UNSUPPORTED_DERIVATIVE_ORDER = 0x02;

        /// Una cota literal de sumatoria tiene parte fraccionaria y
        /// será truncada para iterar.
        const TRUNCATED_SUM_BOUNDS = 0x04;
    }
}

impl Caveats {
    /// Mensajes legibles de cada limitación presente, para que la CLI
    /// los reporte como advertencias.
    pub fn messages(self) -> Vec<&'static str> {
        let mut messages = Vec::new();

        if self.contains(Caveats::INDEFINITE_INTEGRAL) {
            messages.push("indefinite integral has no closed form; the generated function returns NaN");
        }

        if self.contains(Caveats::UNSUPPORTED_DERIVATIVE_ORDER) {
            messages.push("derivative orders above 2 are not supported; the generated function returns 0.0");
        }

        if self.contains(Caveats::TRUNCATED_SUM_BOUNDS) {
            messages.push("non-integer summation bound is truncated for iteration");
        }

        messages
    }
}

/// Un error de generación.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum GenerateError {
    /// El nombre de función no pertenece al conjunto soportado.
    #[error("unsupported LaTeX function: {0}")]
    UnsupportedFunction(String),

    /// Un operador de comparación apareció en posición de valor.
    #[error("comparison operator '{0}' is only valid inside a piecewise condition")]
    ComparisonOutsideCondition(BinOp),

    /// Forma de AST que el parser debería haber impedido.
    #[error("frac function requires exactly 2 arguments, got {0}")]
    FracArity(usize),

    /// Un caso sin condición en posición no final.
    #[error("default case must be the last case in a piecewise expression")]
    MisplacedDefaultCase,

    /// El texto ensamblado no pasó la validación sintáctica. Se
    /// retorna junto con la fuente cruda para diagnóstico.
    #[error("generated source failed validation ({reason}):\n{generated}")]
    Format { generated: String, reason: String },
}

/// Resultado de una generación exitosa.
#[derive(Debug)]
pub struct Generated {
    pub source: String,
    pub caveats: Caveats,
}

/// Genera el archivo Go para un AST.
pub fn generate(root: &Expr, package_name: &str, func_name: &str) -> Result<Generated, GenerateError> {
    let mut parameters = BTreeSet::new();
    collect_variables(root, &mut Vec::new(), &mut parameters);

    let mut lowerer = golang::Lowerer::new();
    let lowered = lowerer.lower(root)?;

    let (body, needs_math) = match lowered {
        golang::Lowered::Value(snippet) => {
            let mut lines = Vec::new();
            emit!(lines, 0, "return {}", snippet.code);
            (lines, snippet.needs_math)
        }

        golang::Lowered::Block { lines, needs_math } => (lines, needs_math),
    };

    let parameters = parameters
        .iter()
        .map(|name| format!("{} float64", golang::sanitize(name)))
        .collect::<Vec<_>>()
        .join(", ");

    let mut source = format!("package {}\n\n", package_name);
    if needs_math {
        source.push_str("import \"math\"\n\n");
    }

    source.push_str(&format!("func {}({}) float64 {{\n", func_name, parameters));
    for line in &body {
        source.push('\t');
        source.push_str(line);
        source.push('\n');
    }
    source.push_str("}\n");

    if let Err(reason) = validate(&source) {
        return Err(GenerateError::Format { generated: source, reason });
    }

    Ok(Generated {
        source,
        caveats: lowerer.caveats(),
    })
}

/// Recolecta las variables libres de la expresión.
///
/// Los constructos que ligan una variable la excluyen dentro de su
/// cuerpo. La derivada es el caso especial: además de ligar dentro del
/// cuerpo, el nodo mismo referencia la variable como punto de
/// evaluación, por lo que se inserta en el conjunto libre.
fn collect_variables(expr: &Expr, bound: &mut Vec<String>, free: &mut BTreeSet<String>) {
    match expr {
        Expr::Number(_) => {}

        Expr::Variable(name) => {
            if !bound.contains(name) {
                free.insert(name.clone());
            }
        }

        Expr::Binary { left, right, .. } => {
            collect_variables(left, bound, free);
            collect_variables(right, bound, free);
        }

        Expr::Call { args, .. } => {
            for arg in args {
                collect_variables(arg, bound, free);
            }
        }

        Expr::Factorial(operand) => collect_variables(operand, bound, free),

        Expr::Sum {
            var,
            lower,
            upper,
            body,
            ..
        } => {
            collect_variables(lower, bound, free);
            collect_variables(upper, bound, free);

            bound.push(var.clone());
            collect_variables(body, bound, free);
            bound.pop();
        }

        Expr::Integral { var, bounds, body } => {
            if let Some(bounds) = bounds {
                collect_variables(&bounds.lower, bound, free);
                collect_variables(&bounds.upper, bound, free);
            }

            bound.push(var.clone());
            collect_variables(body, bound, free);
            bound.pop();
        }

        Expr::Derivative { var, body, .. } => {
            if !bound.contains(var) {
                free.insert(var.clone());
            }

            bound.push(var.clone());
            collect_variables(body, bound, free);
            bound.pop();
        }

        Expr::Limit {
            var,
            approaches,
            body,
        } => {
            collect_variables(approaches, bound, free);

            bound.push(var.clone());
            collect_variables(body, bound, free);
            bound.pop();
        }

        Expr::Piecewise(cases) => {
            for case in cases {
                collect_variables(&case.value, bound, free);
                if let Some(condition) = &case.condition {
                    collect_variables(condition, bound, free);
                }
            }
        }
    }
}

/// Verifica el balance de delimitadores del texto ensamblado.
///
/// El emisor mismo es el formateador, así que esta es la red de
/// seguridad final antes de entregar la fuente.
fn validate(source: &str) -> Result<(), String> {
    let mut parens = 0i32;
    let mut braces = 0i32;
    let mut in_string = false;

    for c in source.chars() {
        match c {
            '"' => in_string = !in_string,
            _ if in_string => {}
            '(' => parens += 1,
            '{' => braces += 1,

            ')' => {
                parens -= 1;
                if parens < 0 {
                    return Err(String::from("unbalanced ')'"));
                }
            }

            '}' => {
                braces -= 1;
                if braces < 0 {
                    return Err(String::from("unbalanced '}'"));
                }
            }

            _ => {}
        }
    }

    if in_string {
        Err(String::from("unterminated string literal"))
    } else if parens != 0 {
        Err(String::from("unbalanced '('"))
    } else if braces != 0 {
        Err(String::from("unbalanced '{'"))
    } else {
        Ok(())
    }
}
