//! Rastreo de ubicaciones originales en la expresión de entrada.
//!
//! Los objetos internos que el traductor construye llevan cuenta
//! del desplazamiento en bytes donde inician dentro de la cadena
//! original, lo cual permite señalar el punto exacto en donde
//! ocurre un error de cualquier fase.

use std::fmt::{self, Debug, Display, Formatter};

/// Un objeto cualquiera con una posición original asociada.
#[derive(Debug, Clone, PartialEq)]
pub struct Located<T> {
    location: Location,
    value: T,
}

impl<T> Located<T> {
    /// Obtiene el valor.
    pub fn val(&self) -> &T {
        &self.value
    }

    /// Obtiene la ubicación.
    pub fn location(&self) -> Location {
        self.location
    }

    /// Descarta la ubicación y toma ownership del valor.
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Descompone y toma ownership de las dos partes.
    pub fn split(self) -> (Location, T) {
        (self.location, self.value)
    }

    /// Construye a partir de un valor y una ubicación.
    pub fn at(value: T, location: Location) -> Self {
        Located { value, location }
    }

    /// Transforma el valor con la misma ubicación.
    pub fn map<U, F>(self, map: F) -> Located<U>
    where
        F: FnOnce(T) -> U,
    {
        Located {
            value: map(self.value),
            location: self.location,
        }
    }
}

impl<T> AsRef<T> for Located<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

/// Desplazamiento en bytes del primer carácter de un objeto.
///
/// La entrada es un fragmento de una sola expresión, por lo que
/// no se mantienen pares línea-columna; el desplazamiento basta
/// para subrayar el origen contra la cadena original.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Default)]
pub struct Location {
    offset: usize,
}

impl Location {
    /// Construye a partir de un desplazamiento en bytes.
    pub fn new(offset: usize) -> Self {
        Location { offset }
    }

    /// Obtiene el desplazamiento en bytes.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Display for Location {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.offset)
    }
}

impl Debug for Location {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        <Self as Display>::fmt(self, formatter)
    }
}
