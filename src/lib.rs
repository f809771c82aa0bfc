//! Traductor de expresiones matemáticas LaTeX a funciones Go.
//!
//! # Front end
//! Cada traducción parte de una única expresión LaTeX. La expresión se
//! somete primero a análisis léxico en [`lex`], de lo cual se obtiene
//! un flujo de tokens. El flujo de tokens se dispone en un AST por
//! medio de análisis sintáctico de descenso recursivo con precedencias
//! en [`parse`], acumulando diagnósticos en [`error`] en vez de
//! abortar en el primer problema.
//!
//! # Back end
//! El árbol sintáctico baja a texto fuente Go en [`codegen`]: una
//! función cuyos parámetros son las variables libres de la expresión,
//! con aproximaciones numéricas para los constructos de cálculo que no
//! tienen forma cerrada en aritmética ordinaria.
//!
//! [`translate`] encadena ambas mitades y es la superficie que usa la
//! CLI.

#[macro_use]
mod macros;

pub mod ast;
pub mod codegen;
pub mod error;
pub mod lex;
pub mod parse;
pub mod source;

use thiserror::Error;

use crate::codegen::{Caveats, GenerateError};
use crate::error::{Diagnostic, ParseErrors};

/// Paquete Go que se usa si no se indica uno.
pub const DEFAULT_PACKAGE: &str = "main";

/// Nombre de función que se usa si no se indica uno.
pub const DEFAULT_FUNCTION: &str = "calculate";

/// Falla en alguna fase de la traducción.
#[derive(Error, Debug)]
pub enum TranslateError {
    /// La entrada está vacía o solo contiene espacios.
    #[error("latex input cannot be empty")]
    EmptyInput,

    #[error(transparent)]
    Parse(#[from] ParseErrors),

    #[error(transparent)]
    Generate(#[from] GenerateError),
}

/// Resultado de una traducción exitosa.
#[derive(Debug)]
pub struct Translation {
    /// Texto del archivo Go generado.
    pub source: String,

    /// Limitaciones admitidas durante la generación.
    pub caveats: Caveats,

    /// Advertencias de parseo que no impidieron la traducción.
    pub warnings: Vec<Diagnostic>,
}

/// Traduce una expresión LaTeX a un archivo fuente Go.
///
/// Un nombre de paquete o de función vacío se sustituye por
/// [`DEFAULT_PACKAGE`] o [`DEFAULT_FUNCTION`] respectivamente.
pub fn translate(
    input: &str,
    package_name: &str,
    func_name: &str,
) -> Result<Translation, TranslateError> {
    if input.trim().is_empty() {
        return Err(TranslateError::EmptyInput);
    }

    let package_name = if package_name.is_empty() {
        DEFAULT_PACKAGE
    } else {
        package_name
    };

    let func_name = if func_name.is_empty() {
        DEFAULT_FUNCTION
    } else {
        func_name
    };

    let parsed = parse::parse(input)?;
    let generated = codegen::generate(&parsed.root, package_name, func_name)?;

    Ok(Translation {
        source: generated.source,
        caveats: generated.caveats,
        warnings: parsed.warnings,
    })
}
