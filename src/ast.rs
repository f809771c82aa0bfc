//! Árbol de sintaxis abstracta.
//!
//! El parser produce un árbol de nodos [`Expr`] que el generador
//! recorre para emitir código. El conjunto de variantes es cerrado:
//! agregar una nueva obliga a actualizar los `match` exhaustivos de
//! ambas fases.
//!
//! Cada hijo es propiedad exclusiva de su padre; no hay compartición
//! ni ciclos, y el árbol completo se descarta al concluir la
//! traducción que lo construyó.

use std::fmt::{self, Display, Formatter};

/// Un nodo de expresión.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Constante numérica.
    Number(f64),

    /// Referencia a una variable libre o ligada.
    Variable(String),

    /// Operación con exactamente dos operandos.
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Llamada a una función nombrada, como `\sqrt{x}` o `\frac{a}{b}`.
    ///
    /// El nombre se conserva tal cual fue escrito; es el generador
    /// quien decide si la función es soportada.
    Call { name: String, args: Vec<Expr> },

    /// Sumatoria `\sum` o productoria `\prod`.
    ///
    /// La variable queda ligada únicamente dentro de `body`; las
    /// cotas se evalúan en el ámbito circundante.
    Sum {
        is_product: bool,
        var: String,
        lower: Box<Expr>,
        upper: Box<Expr>,
        body: Box<Expr>,
    },

    /// Integral `\int`.
    ///
    /// La presencia de cotas distingue una integral definida de una
    /// indefinida, por lo que no se necesita una bandera aparte.
    Integral {
        var: String,
        bounds: Option<Bounds>,
        body: Box<Expr>,
    },

    /// Derivada escrita con el idiom `\frac{d}{dx}`.
    ///
    /// La variable de derivación queda ligada dentro de `body`, pero
    /// el nodo mismo la referencia como punto de evaluación, por lo
    /// que sigue siendo un parámetro de la función generada.
    Derivative {
        is_partial: bool,
        var: String,
        order: u32,
        body: Box<Expr>,
    },

    /// Límite `\lim_{x \to a}`.
    Limit {
        var: String,
        approaches: Box<Expr>,
        body: Box<Expr>,
    },

    /// Factorial postfijo `x!`.
    Factorial(Box<Expr>),

    /// Definición por casos `\begin{cases} ... \end{cases}`.
    Piecewise(Vec<Case>),
}

/// Cotas de una integral definida.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub lower: Box<Expr>,
    pub upper: Box<Expr>,
}

/// Una fila de una definición por casos.
///
/// Una fila sin condición es el caso por defecto y debe ser la
/// última; el generador rechaza cualquier otra posición.
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub value: Expr,
    pub condition: Option<Expr>,
}

/// Operador binario.
///
/// Los seis operadores de comparación solo son válidos como condición
/// de un caso; en posición de valor el generador los rechaza.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl BinOp {
    /// Indica si el operador es de comparación.
    pub fn is_comparison(self) -> bool {
        use BinOp::*;

        matches!(
            self,
            Equal | NotEqual | Less | LessOrEqual | Greater | GreaterOrEqual
        )
    }
}

impl Display for BinOp {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        use BinOp::*;

        let symbol = match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Pow => "^",
            Equal => "=",
            NotEqual => "!=",
            Less => "<",
            LessOrEqual => "<=",
            Greater => ">",
            GreaterOrEqual => ">=",
        };

        fmt.write_str(symbol)
    }
}
