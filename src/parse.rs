//! Análisis sintáctico.
//!
//! # Estrategia
//! El parser es descendente recursivo con manejo de precedencias al
//! estilo Pratt: cada clase de token tiene a lo sumo un rol de prefijo
//! y uno de infijo, y una expresión parseada a precedencia `p` extiende
//! su operando izquierdo mientras la precedencia infija del lookahead
//! supere a `p`. El operador `^` asocia a la derecha parseando su
//! operando derecho un nivel de precedencia abajo.
//!
//! # Gramáticas de comandos
//! Un comando genérico consume grupos `{...}` de forma voraz y
//! verifica aridades fijas al final. Los constructos con gramática
//! propia (`\sum`, `\prod`, `\int`, `\lim`, el idiom de derivada
//! `\frac{d}{dx}` y el entorno `\begin{cases}`) la implementan aparte,
//! decidiendo con lookahead acotado sobre un búfer de tokens
//! pendientes; nunca se reescanea la entrada.
//!
//! # Política de errores
//! Los diagnósticos se acumulan en orden con su desplazamiento de
//! origen. El parseo continúa tras errores recuperables, pero se
//! desenrolla de inmediato cuando falta un token requerido, ya que
//! continuar desincronizaría el flujo. Ligar una variable que ya está
//! ligada por un constructo circundante es un error que se registra
//! sin desenrollar; la ausencia tolerada de "to" en un límite es solo
//! una advertencia.

use std::collections::VecDeque;

use crate::{
    ast::{BinOp, Bounds, Case, Expr},
    error::{Diagnostic, ParseErrors, Severity},
    lex::{Lexer, Token},
    source::{Located, Location},
};

/// Resultado de un parseo exitoso.
///
/// Las advertencias acumuladas acompañan a la raíz; un parseo que
/// registró al menos un error no produce este valor.
#[derive(Debug)]
pub struct Parsed {
    pub root: Expr,
    pub warnings: Vec<Diagnostic>,
}

/// Parsea una expresión completa.
///
/// Falla si se registró algún diagnóstico de error o si quedan tokens
/// tras una expresión completa de nivel superior.
pub fn parse(source: &str) -> Result<Parsed, ParseErrors> {
    let mut parser = Parser::new(source);
    let root = parser.top_level();
    parser.finish(root)
}

/// Niveles de precedencia, de menor a mayor.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
    Lowest,
    Sum,
    Product,
    Exponent,
    Prefix,
    Postfix,
}

/// Marcador de desenrollado; el diagnóstico ya quedó registrado.
struct Unwind;

type Parse<T> = Result<T, Unwind>;

struct Parser<'a> {
    lexer: Lexer<'a>,
    pending: VecDeque<Located<Token>>,
    diagnostics: Vec<Diagnostic>,
    binders: Vec<String>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(source),
            pending: VecDeque::new(),
            diagnostics: Vec::new(),
            binders: Vec::new(),
        }
    }

    fn top_level(&mut self) -> Parse<Expr> {
        let root = self.expression(Prec::Lowest)?;

        // Esta verificación vive únicamente en el nivel superior, de
        // modo que un constructo interno pueda detenerse ante tokens
        // que no le pertenecen (el diferencial de una integral, el
        // separador de una fila de casos)
        if !matches!(self.peek_token(0), Token::Eof) {
            let found = self.peek(0).clone();
            self.error_at(
                found.location(),
                format!(
                    "unexpected token '{}' after expression",
                    found.val().literal()
                ),
            );
        }

        Ok(root)
    }

    fn finish(self, root: Parse<Expr>) -> Result<Parsed, ParseErrors> {
        let has_errors = self
            .diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity() == Severity::Error);

        match root {
            Ok(root) if !has_errors => Ok(Parsed {
                root,
                warnings: self.diagnostics,
            }),

            _ => Err(ParseErrors::new(self.diagnostics)),
        }
    }

    // --- Núcleo Pratt ---

    fn expression(&mut self, min: Prec) -> Parse<Expr> {
        let mut left = self.prefix()?;
        while self.infix_precedence() > min {
            left = self.infix(left)?;
        }

        Ok(left)
    }

    fn prefix(&mut self) -> Parse<Expr> {
        let (location, token) = self.advance().split();
        match token {
            Token::Ident(name) => Ok(Expr::Variable(name)),
            Token::Number(value) => Ok(Expr::Number(value)),
            Token::OpenParen => self.group(),
            Token::Command(name) => self.command(name, location),
            Token::Begin => self.piecewise(),

            // El menos unario se desazucara a una multiplicación por
            // -1; no existe un nodo aparte para él
            Token::Minus => {
                let operand = self.expression(Prec::Prefix)?;
                Ok(Expr::Binary {
                    op: BinOp::Mul,
                    left: Box::new(Expr::Number(-1.0)),
                    right: Box::new(operand),
                })
            }

            token => self.fail_at(
                location,
                format!(
                    "no prefix parse function found for token {} ('{}')",
                    token.kind(),
                    token.literal()
                ),
            ),
        }
    }

    fn infix(&mut self, left: Expr) -> Parse<Expr> {
        let (location, token) = self.advance().split();
        let op = match token {
            Token::Plus => BinOp::Add,
            Token::Minus => BinOp::Sub,
            Token::Times => BinOp::Mul,
            Token::Slash => BinOp::Div,
            Token::Caret => BinOp::Pow,

            // El factorial postfijo liga con el primario inmediato y
            // no consume ningún token adicional
            Token::Bang => return Ok(Expr::Factorial(Box::new(left))),

            token => {
                return self.fail_at(
                    location,
                    format!(
                        "no infix parse function found for token {} ('{}')",
                        token.kind(),
                        token.literal()
                    ),
                )
            }
        };

        // `^` asocia a la derecha: su operando derecho se parsea un
        // nivel de precedencia abajo, con lo cual a^b^c = a^(b^c)
        let right = match op {
            BinOp::Pow => self.expression(Prec::Product)?,
            BinOp::Add | BinOp::Sub => self.expression(Prec::Sum)?,
            _ => self.expression(Prec::Product)?,
        };

        Ok(Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn infix_precedence(&mut self) -> Prec {
        match self.peek_token(0) {
            Token::Plus | Token::Minus => Prec::Sum,
            Token::Times | Token::Slash => Prec::Product,
            Token::Caret => Prec::Exponent,
            Token::Bang => Prec::Postfix,
            _ => Prec::Lowest,
        }
    }

    fn group(&mut self) -> Parse<Expr> {
        let inner = self.expression(Prec::Lowest)?;
        self.expect(Token::CloseParen, "missing closing parenthesis")?;
        Ok(inner)
    }

    // --- Comandos ---

    fn command(&mut self, name: String, location: Location) -> Parse<Expr> {
        match name.as_str() {
            "sum" => self.sum_or_product(false),
            "prod" => self.sum_or_product(true),
            "int" => self.integral(),
            "lim" => self.limit(),

            "frac" => match self.derivative_shape() {
                Some(shape) => self.derivative(shape),
                None => self.call(name, location),
            },

            _ => self.call(name, location),
        }
    }

    /// Parsea los grupos `{...}` de un comando genérico y verifica
    /// aridades fijas.
    fn call(&mut self, name: String, location: Location) -> Parse<Expr> {
        let mut args = Vec::new();
        while matches!(self.peek_token(0), Token::OpenCurly) {
            self.advance();

            if matches!(self.peek_token(0), Token::CloseCurly) {
                return self.fail(format!(
                    "argument expression cannot be empty inside {{}} for command \\{}",
                    name
                ));
            }

            let arg = self.expression(Prec::Lowest)?;

            if !matches!(self.peek_token(0), Token::CloseCurly) {
                return self.fail(format!(
                    "missing '}}' after argument for command \\{}",
                    name
                ));
            }
            self.advance();

            args.push(arg);
        }

        if args.is_empty() {
            return self.fail_at(
                location,
                format!("expected '{{' arguments after command '\\{}'", name),
            );
        }

        let required = match name.to_ascii_lowercase().as_str() {
            "frac" => Some(2),
            "sqrt" | "sin" | "cos" | "tan" => Some(1),
            _ => None,
        };

        if let Some(required) = required {
            if args.len() != required {
                return self.fail_at(
                    location,
                    format!(
                        "\\{} requires {} argument(s), got {}",
                        name,
                        required,
                        args.len()
                    ),
                );
            }
        }

        Ok(Expr::Call { name, args })
    }

    fn sum_or_product(&mut self, is_product: bool) -> Parse<Expr> {
        let name = if is_product { "prod" } else { "sum" };

        self.expect(
            Token::Underscore,
            format!("expected '_' for lower bound after \\{}", name),
        )?;
        self.expect(
            Token::OpenCurly,
            format!("expected '{{' after '_' in \\{}", name),
        )?;

        let var = self.ident(format!(
            "expected identifier for summation variable in \\{}",
            name
        ))?;

        self.expect(
            Token::Equals,
            format!("expected '=' after variable in \\{} lower bound", name),
        )?;

        let lower = self.expression(Prec::Lowest)?;
        self.expect(
            Token::CloseCurly,
            format!("expected '}}' after lower bound in \\{}", name),
        )?;

        self.expect(
            Token::Caret,
            format!("expected '^' for upper bound after lower bound in \\{}", name),
        )?;
        self.expect(
            Token::OpenCurly,
            format!("expected '{{' after '^' in \\{}", name),
        )?;

        let upper = self.expression(Prec::Lowest)?;
        self.expect(
            Token::CloseCurly,
            format!("expected '}}' after upper bound in \\{}", name),
        )?;

        let body = self.bound(&var, |parser| parser.expression(Prec::Lowest))?;

        Ok(Expr::Sum {
            is_product,
            var,
            lower: Box::new(lower),
            upper: Box::new(upper),
            body: Box::new(body),
        })
    }

    fn integral(&mut self) -> Parse<Expr> {
        // La presencia de cotas `_{a}^{b}` distingue una integral
        // definida de una indefinida
        let bounds = if matches!(self.peek_token(0), Token::Underscore) {
            self.advance();

            self.expect(Token::OpenCurly, "expected '{' after '_' in \\int")?;
            let lower = self.expression(Prec::Lowest)?;
            self.expect(Token::CloseCurly, "expected '}' after lower bound in \\int")?;

            self.expect(
                Token::Caret,
                "expected '^' for upper bound after lower bound in \\int",
            )?;
            self.expect(Token::OpenCurly, "expected '{' after '^' in \\int")?;
            let upper = self.expression(Prec::Lowest)?;
            self.expect(Token::CloseCurly, "expected '}' after upper bound in \\int")?;

            Some(Bounds {
                lower: Box::new(lower),
                upper: Box::new(upper),
            })
        } else {
            None
        };

        let body = self.expression(Prec::Lowest)?;

        // Diferencial opcional `d<var>` tras el cuerpo; su ausencia
        // implica `x`. La variable no puede verificarse contra la pila
        // de ligaduras durante el cuerpo porque se conoce hasta aquí
        let var = match self.peek_token(0) {
            Token::Ident(name) if name.len() > 1 && name.starts_with('d') => {
                Some(name[1..].to_string())
            }
            _ => None,
        };

        let var = match var {
            Some(var) => {
                self.advance();
                var
            }
            None => String::from("x"),
        };

        if self.binders.iter().any(|binder| *binder == var) {
            self.error(format!(
                "variable '{}' is already bound by an enclosing construct",
                var
            ));
        }

        Ok(Expr::Integral {
            var,
            bounds,
            body: Box::new(body),
        })
    }

    fn limit(&mut self) -> Parse<Expr> {
        // Se admiten las formas `\lim_{x \to a}` y `\lim{x \to a}`
        match self.peek_token(0) {
            Token::Underscore => {
                self.advance();
                self.expect(Token::OpenCurly, "expected '{' after '_' in \\lim")?;
            }

            Token::OpenCurly => {
                self.advance();
            }

            _ => {
                let found = self.peek(0).clone();
                return self.fail_at(
                    found.location(),
                    format!(
                        "expected next token to be LBRACE, got {} ('{}') instead",
                        found.val().kind(),
                        found.val().literal()
                    ),
                );
            }
        }

        let var = self.ident("expected identifier for limit variable".to_string())?;

        if !self.limit_to() {
            self.warn("couldn't find 'to' in limit expression, assuming implied".to_string());
        }

        let approaches = self.expression(Prec::Lowest)?;
        self.expect(
            Token::CloseCurly,
            "expected '}' after approach value in \\lim",
        )?;

        let body = self.bound(&var, |parser| parser.expression(Prec::Lowest))?;

        Ok(Expr::Limit {
            var,
            approaches: Box::new(approaches),
            body: Box::new(body),
        })
    }

    /// Alternación tolerante de las grafías de "→" en un límite.
    ///
    /// Se aceptan `to` como identificador (sin distinguir mayúsculas),
    /// `\to`, un comando cualquiera seguido de `o`/`to` (caso `\t o`) y
    /// el par de identificadores `t` `o`. Si ninguna calza, no se
    /// consume nada y el llamador degrada a advertencia.
    fn limit_to(&mut self) -> bool {
        match (self.lookahead(0), self.lookahead(1)) {
            (Token::Ident(word), _) if word.eq_ignore_ascii_case("to") => {
                self.advance();
                true
            }

            (Token::Command(word), _) if word == "to" => {
                self.advance();
                true
            }

            (Token::Command(_), Token::Ident(word)) if word == "o" || word == "to" => {
                self.advance();
                self.advance();
                true
            }

            (Token::Ident(first), Token::Ident(second)) if first == "t" && second == "o" => {
                self.advance();
                self.advance();
                true
            }

            _ => false,
        }
    }

    /// Sondea con lookahead puro si los grupos que siguen a `\frac`
    /// forman el idiom de derivada `{d}{dx}`, `{d^N}{dx^N}`,
    /// `{\partial}{\partial x}` o `{\partial^N}{\partial x^N}`.
    ///
    /// No consume ningún token: si la forma no calza por completo
    /// (incluida la igualdad de órdenes), el comando se parsea como un
    /// `\frac` ordinario.
    fn derivative_shape(&mut self) -> Option<(bool, u32, String, usize)> {
        if self.lookahead(0) != Token::OpenCurly {
            return None;
        }

        let is_partial = match self.lookahead(1) {
            Token::Ident(name) => {
                if name != "d" {
                    return None;
                }
                false
            }
            Token::Command(name) => {
                if name != "partial" {
                    return None;
                }
                true
            }
            _ => return None,
        };

        let (order, mut next) = match self.lookahead(2) {
            Token::CloseCurly => (1, 3),
            Token::Caret => match (self.lookahead(3), self.lookahead(4)) {
                (Token::Number(order), Token::CloseCurly)
                    if order.fract() == 0.0 && order >= 1.0 =>
                {
                    (order as u32, 5)
                }
                _ => return None,
            },
            _ => return None,
        };

        if self.lookahead(next) != Token::OpenCurly {
            return None;
        }
        next += 1;

        let var = if is_partial {
            match self.lookahead(next) {
                Token::Command(name) if name == "partial" => next += 1,
                _ => return None,
            }

            match self.lookahead(next) {
                Token::Ident(name) => {
                    next += 1;
                    name
                }
                _ => return None,
            }
        } else {
            match self.lookahead(next) {
                Token::Ident(name) if name.len() > 1 && name.starts_with('d') => {
                    next += 1;
                    name[1..].to_string()
                }
                _ => return None,
            }
        };

        // El orden del denominador debe coincidir con el del numerador
        match self.lookahead(next) {
            Token::CloseCurly if order == 1 => next += 1,
            Token::Caret => match (self.lookahead(next + 1), self.lookahead(next + 2)) {
                (Token::Number(denominator), Token::CloseCurly)
                    if denominator == order as f64 =>
                {
                    next += 3;
                }
                _ => return None,
            },
            _ => return None,
        }

        Some((is_partial, order, var, next))
    }

    fn derivative(&mut self, shape: (bool, u32, String, usize)) -> Parse<Expr> {
        let (is_partial, order, var, tokens) = shape;

        // La forma completa ya fue validada por el sondeo
        for _ in 0..tokens {
            self.advance();
        }

        let body = self.bound(&var, |parser| parser.expression(Prec::Lowest))?;

        Ok(Expr::Derivative {
            is_partial,
            var,
            order,
            body: Box::new(body),
        })
    }

    // --- Entorno de casos ---

    fn piecewise(&mut self) -> Parse<Expr> {
        self.expect(
            Token::OpenCurly,
            "expected '{' after \\begin for cases environment",
        )?;
        self.cases_tag("expected 'cases' for piecewise environment")?;
        self.expect(Token::CloseCurly, "expected '}' after 'cases' in \\begin")?;

        let mut cases = Vec::new();
        loop {
            match self.peek_token(0) {
                Token::End => break,
                Token::Eof => {
                    return self.fail("expected \\end for cases environment".to_string())
                }
                _ => {}
            }

            let value = self.expression(Prec::Lowest)?;

            // `&` separa el valor de su condición; una fila sin
            // condición es el caso por defecto
            let condition = if matches!(self.peek_token(0), Token::Ampersand) {
                self.advance();
                Some(self.condition()?)
            } else {
                None
            };

            cases.push(Case { value, condition });

            match self.peek_token(0) {
                Token::RowBreak => {
                    self.advance();
                }
                Token::End | Token::Eof => {}
                _ => {
                    let found = self.peek(0).clone();
                    return self.fail_at(
                        found.location(),
                        format!(
                            "expected next token to be ROWBREAK, got {} ('{}') instead",
                            found.val().kind(),
                            found.val().literal()
                        ),
                    );
                }
            }
        }

        self.advance(); // \end
        self.expect(Token::OpenCurly, "expected '{' after \\end")?;
        self.cases_tag("expected 'cases' in \\end{}")?;
        self.expect(Token::CloseCurly, "expected '}' after 'cases' in \\end")?;

        Ok(Expr::Piecewise(cases))
    }

    /// Condición de una fila: `expr [cmp expr]`.
    ///
    /// Los operadores de comparación no participan de la tabla Pratt
    /// general; solo esta gramática de un disparo los interpreta.
    fn condition(&mut self) -> Parse<Expr> {
        let left = self.expression(Prec::Lowest)?;

        let op = match self.peek_token(0) {
            Token::Equals => Some(BinOp::Equal),
            Token::Less => Some(BinOp::Less),
            Token::Greater => Some(BinOp::Greater),
            Token::Command(name) if name == "leq" => Some(BinOp::LessOrEqual),
            Token::Command(name) if name == "geq" => Some(BinOp::GreaterOrEqual),
            Token::Command(name) if name == "neq" => Some(BinOp::NotEqual),
            _ => None,
        };

        match op {
            Some(op) => {
                self.advance();
                let right = self.expression(Prec::Lowest)?;

                Ok(Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }

            None => Ok(left),
        }
    }

    fn cases_tag(&mut self, message: &str) -> Parse<()> {
        match self.advance().split() {
            (_, Token::Ident(name)) if name == "cases" => Ok(()),
            (location, _) => self.fail_at(location, message.to_string()),
        }
    }

    // --- Ligaduras ---

    /// Parsea una regla con `var` ligada.
    ///
    /// Religar un nombre que un constructo circundante ya liga es un
    /// error, pero se registra sin desenrollar: el resto de la
    /// expresión aún puede diagnosticarse.
    fn bound<T, F>(&mut self, var: &str, rule: F) -> Parse<T>
    where
        F: FnOnce(&mut Self) -> Parse<T>,
    {
        if self.binders.iter().any(|binder| binder == var) {
            self.error(format!(
                "variable '{}' is already bound by an enclosing construct",
                var
            ));
        }

        self.binders.push(var.to_string());
        let result = rule(self);
        self.binders.pop();

        result
    }

    // --- Flujo de tokens ---

    /// Observa el n-ésimo token pendiente sin consumirlo.
    ///
    /// El búfer crece bajo demanda; tras el final de la entrada el
    /// lexer reporta [`Token::Eof`] indefinidamente, por lo que todo
    /// índice es válido.
    fn peek(&mut self, n: usize) -> &Located<Token> {
        while self.pending.len() <= n {
            let token = self.lexer.next_token();
            self.pending.push_back(token);
        }

        &self.pending[n]
    }

    fn peek_token(&mut self, n: usize) -> &Token {
        self.peek(n).val()
    }

    fn lookahead(&mut self, n: usize) -> Token {
        self.peek(n).val().clone()
    }

    fn advance(&mut self) -> Located<Token> {
        self.peek(0);
        match self.pending.pop_front() {
            Some(token) => token,
            None => Located::at(Token::Eof, self.location()),
        }
    }

    fn location(&mut self) -> Location {
        self.peek(0).location()
    }

    fn expect<M: Into<String>>(&mut self, token: Token, message: M) -> Parse<()> {
        if self.peek_token(0) == &token {
            self.advance();
            Ok(())
        } else {
            let location = self.location();
            self.fail_at(location, message.into())
        }
    }

    fn ident(&mut self, message: String) -> Parse<String> {
        match self.advance().split() {
            (_, Token::Ident(name)) => Ok(name),
            (location, _) => self.fail_at(location, message),
        }
    }

    // --- Diagnósticos ---

    fn error(&mut self, message: String) {
        let location = self.location();
        self.error_at(location, message);
    }

    fn error_at(&mut self, location: Location, message: String) {
        self.diagnostics.push(Diagnostic::error(message, location));
    }

    fn warn(&mut self, message: String) {
        let location = self.location();
        self.diagnostics
            .push(Diagnostic::warning(message, location));
    }

    fn fail<T>(&mut self, message: String) -> Parse<T> {
        let location = self.location();
        self.fail_at(location, message)
    }

    fn fail_at<T>(&mut self, location: Location, message: String) -> Parse<T> {
        self.error_at(location, message);
        Err(Unwind)
    }
}
