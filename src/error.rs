//! Diagnósticos de parseo y su presentación.
//!
//! El parser no aborta en el primer problema: acumula diagnósticos
//! ordenados, cada uno con severidad, mensaje y desplazamiento de
//! origen. El parseo falla si y solo si la lista contiene al menos un
//! diagnóstico de severidad [`Severity::Error`]; las advertencias
//! acompañan a un resultado exitoso.
//!
//! [`Render`] es un adaptador de presentación para la CLI que imprime
//! cada diagnóstico subrayando con un caret el punto de la expresión
//! original donde ocurrió.

use crate::source::Location;
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

/// Severidad de un diagnóstico.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Severity {
    /// No impide la traducción.
    Warning,

    /// Hace fallar el parseo.
    Error,
}

/// Un problema detectado durante el parseo.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    severity: Severity,
    message: String,
    location: Location,
}

impl Diagnostic {
    /// Construye un diagnóstico de severidad de error.
    pub fn error(message: String, location: Location) -> Self {
        Diagnostic {
            severity: Severity::Error,
            message,
            location,
        }
    }

    /// Construye una advertencia.
    pub fn warning(message: String, location: Location) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            message,
            location,
        }
    }

    /// Obtiene la severidad.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Obtiene el mensaje.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Obtiene el desplazamiento de origen.
    pub fn location(&self) -> Location {
        self.location
    }
}

impl Display for Diagnostic {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Error => write!(fmt, "parse error at pos {}: {}", self.location, self.message),
            Severity::Warning => write!(fmt, "warning at pos {}: {}", self.location, self.message),
        }
    }
}

/// Falla de parseo: la lista ordenada de diagnósticos acumulados.
#[derive(Error, Debug)]
#[error("parsing failed:\n\t{}", lines(.diagnostics))]
pub struct ParseErrors {
    diagnostics: Vec<Diagnostic>,
}

impl ParseErrors {
    pub(crate) fn new(diagnostics: Vec<Diagnostic>) -> Self {
        ParseErrors { diagnostics }
    }

    /// Obtiene los diagnósticos en orden de detección.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

fn lines(diagnostics: &[Diagnostic]) -> String {
    let lines = diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();

    lines.join("\n\t")
}

/// Adaptador que imprime diagnósticos contra la expresión original.
pub struct Render<'a> {
    source: &'a str,
    diagnostics: &'a [Diagnostic],
}

impl<'a> Render<'a> {
    /// Asocia una lista de diagnósticos con su expresión de origen.
    pub fn new(source: &'a str, diagnostics: &'a [Diagnostic]) -> Self {
        Render {
            source,
            diagnostics,
        }
    }
}

impl Display for Render<'_> {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        for diagnostic in self.diagnostics {
            let severity = match diagnostic.severity() {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };

            writeln!(fmt, "{}: {}", severity, diagnostic.message())?;
            writeln!(fmt, " --> offset {}", diagnostic.location())?;
            writeln!(fmt, "  |")?;

            // La entrada es un fragmento de una sola expresión; un
            // salto de línea literal se aplana para no romper el
            // subrayado
            let line = self
                .source
                .chars()
                .map(|c| if c == '\n' { ' ' } else { c })
                .collect::<String>();

            writeln!(fmt, "  | {}", line)?;

            let offset = diagnostic.location().offset();
            let column = match self.source.get(..offset) {
                Some(prefix) => prefix.chars().count(),
                None => offset,
            };

            writeln!(fmt, "  | {:skip$}^", "", skip = column)?;
            writeln!(fmt)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_join_diagnostics_with_tabs() {
        let errors = ParseErrors::new(vec![
            Diagnostic::error(String::from("first"), Location::new(0)),
            Diagnostic::warning(String::from("second"), Location::new(3)),
        ]);

        assert_eq!(
            errors.to_string(),
            "parsing failed:\n\tparse error at pos 0: first\n\twarning at pos 3: second"
        );
    }

    #[test]
    fn render_underlines_the_offending_offset() {
        let diagnostics = vec![Diagnostic::error(
            String::from("unexpected token 'y' after expression"),
            Location::new(9),
        )];

        let rendered = Render::new("\\sqrt{x} y", &diagnostics).to_string();
        let expected = concat!(
            "error: unexpected token 'y' after expression\n",
            " --> offset 9\n",
            "  |\n",
            "  | \\sqrt{x} y\n",
            "  |          ^\n",
            "\n",
        );

        assert_eq!(rendered, expected);
    }
}
