//! Análisis léxico.
//!
//! # Tokenization
//! Esta es la primera fase del traductor. Descompone la expresión de
//! entrada en unidades léxicas denominadas tokens. Los espacios en
//! blanco se descartan durante esta operación. Cada token emitido está
//! asociado al desplazamiento en bytes de su primer carácter dentro de
//! la cadena original, lo cual permite rastrear errores tanto en los
//! tokens mismos como en constructos más elevados de fases posteriores.
//!
//! # Contenido de un token
//! Operadores y delimitadores se identifican por el hecho de lo que son
//! y no incluyen lexemas. Los identificadores y los comandos sí incluyen
//! su lexema original. Las constantes numéricas se resuelven a sus
//! valores en vez de preservar sus lexemas.
//!
//! # Reglas importantes del lenguaje
//! - Los identificadores son corridas de letras ASCII; las letras
//!   mayúsculas y minúsculas son distintas.
//! - Una constante numérica admite a lo sumo un punto decimal interior;
//!   un punto final que no va seguido de un dígito no se consume.
//! - `\` seguido de letras forma un comando; los comandos `begin` y
//!   `end` se re-etiquetan como delimitadores de entorno.
//! - `\\` es un separador de filas para el entorno `cases`.
//!
//! # Errores
//! El escaneo nunca falla: un carácter que no pertenece al lenguaje se
//! emite como token [`Token::Illegal`] y es la fase de parseo la que lo
//! reporta como diagnóstico.

use crate::source::{Located, Location};
use std::{
    fmt::{self, Display},
    str::CharIndices,
};

/// Objeto resultante del análisis léxico.
///
/// Un token contiene suficiente información para describir completamente
/// a una entidad léxica en la expresión fuente.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identificador (variable o nombre tras `\`).
    Ident(String),

    /// Constante numérica.
    Number(f64),

    /// Comando `\nombre`.
    Command(String),

    /// `\begin`
    Begin,

    /// `\end`
    End,

    /// `+`
    Plus,

    /// `-`
    Minus,

    /// `*`
    Times,

    /// `/`
    Slash,

    /// `^`
    Caret,

    /// `=`
    Equals,

    /// `!`
    Bang,

    /// `_`
    Underscore,

    /// `&`
    Ampersand,

    /// `\\`
    RowBreak,

    /// `<`
    Less,

    /// `>`
    Greater,

    /// `(`
    OpenParen,

    /// `)`
    CloseParen,

    /// `{`
    OpenCurly,

    /// `}`
    CloseCurly,

    /// Carácter que no pertenece al lenguaje.
    Illegal(char),

    /// Fin de la entrada.
    Eof,
}

impl Token {
    /// Nombre de la clase del token, para mensajes de diagnóstico.
    pub fn kind(&self) -> &'static str {
        use Token::*;

        match self {
            Ident(_) => "IDENT",
            Number(_) => "NUMBER",
            Command(_) => "COMMAND",
            Begin => "BEGIN",
            End => "END",
            Plus => "PLUS",
            Minus => "MINUS",
            Times => "ASTERISK",
            Slash => "SLASH",
            Caret => "CARET",
            Equals => "EQUALS",
            Bang => "EXCLAMATION",
            Underscore => "UNDERSCORE",
            Ampersand => "AMPERSAND",
            RowBreak => "ROWBREAK",
            Less => "LESS",
            Greater => "GREATER",
            OpenParen => "LPAREN",
            CloseParen => "RPAREN",
            OpenCurly => "LBRACE",
            CloseCurly => "RBRACE",
            Illegal(_) => "ILLEGAL",
            Eof => "EOF",
        }
    }

    /// Lexema original del token, o su forma canónica.
    pub fn literal(&self) -> String {
        use Token::*;

        match self {
            Ident(name) => name.clone(),
            Number(value) => format!("{}", value),
            Command(name) => name.clone(),
            Begin => String::from("begin"),
            End => String::from("end"),
            Plus => String::from("+"),
            Minus => String::from("-"),
            Times => String::from("*"),
            Slash => String::from("/"),
            Caret => String::from("^"),
            Equals => String::from("="),
            Bang => String::from("!"),
            Underscore => String::from("_"),
            Ampersand => String::from("&"),
            RowBreak => String::from("\\\\"),
            Less => String::from("<"),
            Greater => String::from(">"),
            OpenParen => String::from("("),
            CloseParen => String::from(")"),
            OpenCurly => String::from("{"),
            CloseCurly => String::from("}"),
            Illegal(c) => c.to_string(),
            Eof => String::new(),
        }
    }
}

impl Display for Token {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{} ('{}')", self.kind(), self.literal())
    }
}

/// Máquina de estados para análisis léxico.
///
/// Un lexer puede encontrarse en uno de diversos estados. La
/// salida del lexer, así como su siguiente estado, se define
/// a partir de tanto su estado actual como el siguiente carácter
/// encontrado en la entrada.
pub struct Lexer<'a> {
    source: std::iter::Peekable<CharIndices<'a>>,
    length: usize,
    state: State,
    start: Location,
    exhausted: bool,
}

/// Posibles estados del lexer.
enum State {
    /// Estado que ocurre antes de encontrar el inicio de un token.
    Start,

    /// Estado de completitud; siempre emite el token incluido,
    /// consume la entrada actual y pasa a [`State::Start`].
    Complete(Token),

    /// Se encontró `\`.
    ///
    /// Puede seguir una corrida de letras (comando) u otro `\`
    /// (separador de filas).
    Backslash,

    /// Nombre de comando tras `\`.
    Name(String),

    /// Constante numérica.
    ///
    /// Este estado incluirá dígitos en el lexema mientras que el
    /// siguiente carácter sea un dígito, y a lo sumo un punto interior.
    Constant(String, bool),

    /// Corrida de letras que forma un identificador.
    Word(String),
}

impl<'a> Lexer<'a> {
    /// Crea un lexer en estado inicial sobre una expresión.
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source: source.char_indices().peekable(),
            length: source.len(),
            state: State::Start,
            start: Location::default(),
            exhausted: false,
        }
    }

    /// Obtiene el siguiente token.
    ///
    /// Una vez agotada la entrada, esta operación produce
    /// [`Token::Eof`] indefinidamente.
    pub fn next_token(&mut self) -> Located<Token> {
        match self.lex() {
            Some(token) => token,
            None => Located::at(Token::Eof, Location::new(self.length)),
        }
    }

    /// Intenta construir un siguiente token.
    fn lex(&mut self) -> Option<Located<Token>> {
        use {State::*, Token::*};

        let token = loop {
            let next_char = self.source.peek().map(|&(_, c)| c);

            // Un punto solo pertenece a una constante si lo sigue un dígito
            let dot_starts_fraction = next_char == Some('.') && {
                let mut probe = self.source.clone();
                probe.next();
                matches!(probe.peek(), Some(&(_, c)) if c.is_ascii_digit())
            };

            // La posición de origen se mueve junto a la posición
            // siguiente siempre que no se haya encontrado una
            // frontera de token
            if let Start = self.state {
                let offset = match self.source.peek() {
                    Some(&(offset, _)) => offset,
                    None => self.length,
                };
                self.start = Location::new(offset);
            }

            // Switch table principal, determina cambios de estado
            // y de salida del lexer a partir de combinaciones del
            // estado actual y el siguiente carácter
            match (&mut self.state, next_char) {
                (Start, None) => return None,

                // Tokens triviales
                (Start, Some('+')) => self.state = Complete(Plus),
                (Start, Some('-')) => self.state = Complete(Minus),
                (Start, Some('*')) => self.state = Complete(Times),
                (Start, Some('/')) => self.state = Complete(Slash),
                (Start, Some('^')) => self.state = Complete(Caret),
                (Start, Some('=')) => self.state = Complete(Equals),
                (Start, Some('!')) => self.state = Complete(Bang),
                (Start, Some('_')) => self.state = Complete(Underscore),
                (Start, Some('&')) => self.state = Complete(Ampersand),
                (Start, Some('<')) => self.state = Complete(Less),
                (Start, Some('>')) => self.state = Complete(Greater),
                (Start, Some('(')) => self.state = Complete(OpenParen),
                (Start, Some(')')) => self.state = Complete(CloseParen),
                (Start, Some('{')) => self.state = Complete(OpenCurly),
                (Start, Some('}')) => self.state = Complete(CloseCurly),
                (Start, Some('\\')) => self.state = Backslash,

                // Identificadores
                (Start, Some(c)) if c.is_ascii_alphabetic() => self.state = Word(c.to_string()),

                // Inicio de una constante numérica. No se consume el
                // dígito, ya que esta lógica ya está implementada en el
                // respectivo caso del estado de constante.
                (Start, Some(c)) if c.is_ascii_digit() => {
                    self.state = Constant(String::new(), false);
                    continue;
                }

                // Espacios en blanco y caracteres inesperados
                (Start, Some(c)) if c.is_whitespace() => (),
                (Start, Some('\u{fffd}')) => self.state = Complete(Illegal('?')),
                (Start, Some(c)) => self.state = Complete(Illegal(c)),

                // Emisión retardada de tokens cualesquiera
                (Complete(value), _) => break std::mem::replace(value, Plus),

                // `\\` separa filas; `\letras` es un comando
                (Backslash, Some('\\')) => self.state = Complete(RowBreak),
                (Backslash, Some(c)) if c.is_ascii_alphabetic() => {
                    self.state = Name(String::new());
                    continue;
                }
                (Backslash, _) => break Illegal('\\'),

                // Extensión de nombres de comando
                (Name(name), Some(c)) if c.is_ascii_alphabetic() => name.push(c),
                (Name(name), _) => match name.as_str() {
                    "begin" => break Begin,
                    "end" => break End,
                    _ => break Command(std::mem::take(name)),
                },

                // Acumulación de constantes numéricas
                (Constant(text, _), Some(c)) if c.is_ascii_digit() => text.push(c),
                (Constant(text, seen_dot @ false), Some('.')) if dot_starts_fraction => {
                    text.push('.');
                    *seen_dot = true;
                }
                (Constant(text, _), _) => break Number(text.parse().unwrap()),

                // Extensión de identificadores
                (Word(word), Some(c)) if c.is_ascii_alphabetic() => word.push(c),
                (Word(word), _) => break Ident(std::mem::take(word)),
            }

            // Si no hubo `continue`, aquí se consume el carácter que
            // se observó con lookahead anteriormente
            self.source.next();
        };

        self.state = State::Start;
        Some(Located::at(token, self.start))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Located<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        let token = self.next_token();
        if let Token::Eof = token.val() {
            self.exhausted = true;
        }

        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        Lexer::new(source)
            .map(|token| token.into_inner())
            .collect()
    }

    #[test]
    fn operators_and_identifiers() {
        assert_eq!(
            tokens("ab + 2 * (c - 1.5)"),
            vec![
                Token::Ident(String::from("ab")),
                Token::Plus,
                Token::Number(2.0),
                Token::Times,
                Token::OpenParen,
                Token::Ident(String::from("c")),
                Token::Minus,
                Token::Number(1.5),
                Token::CloseParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn commands_and_environments() {
        assert_eq!(
            tokens("\\frac{a}{b} \\begin \\end \\\\"),
            vec![
                Token::Command(String::from("frac")),
                Token::OpenCurly,
                Token::Ident(String::from("a")),
                Token::CloseCurly,
                Token::OpenCurly,
                Token::Ident(String::from("b")),
                Token::CloseCurly,
                Token::Begin,
                Token::End,
                Token::RowBreak,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn trailing_dot_is_not_part_of_a_constant() {
        assert_eq!(
            tokens("1."),
            vec![Token::Number(1.0), Token::Illegal('.'), Token::Eof]
        );

        assert_eq!(tokens("1.5"), vec![Token::Number(1.5), Token::Eof]);
    }

    #[test]
    fn lone_backslash_is_illegal() {
        assert_eq!(tokens("\\ x"), vec![
            Token::Illegal('\\'),
            Token::Ident(String::from("x")),
            Token::Eof,
        ]);
    }

    #[test]
    fn offsets_track_byte_positions() {
        let located = Lexer::new("a + b").collect::<Vec<_>>();
        let offsets = located
            .iter()
            .map(|token| token.location().offset())
            .collect::<Vec<_>>();

        assert_eq!(offsets, vec![0, 2, 4, 5]);
    }
}
