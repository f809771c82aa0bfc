/// Agrega una instrucción al cuerpo de un bloque generado.
///
/// Cada línea física de la instrucción se almacena por separado con
/// `$depth` tabuladores de sangría; una instrucción multilínea (un
/// bloque anidado envuelto en `func() float64`) conserva así su
/// sangría relativa al re-sangrar el bloque completo.
macro_rules! emit {
    ($lines:expr, $depth:expr, $($format:tt)*) => {{
        let statement = format!($($format)*);
        for line in statement.split('\n') {
            $lines.push(format!("{}{}", "\t".repeat($depth), line));
        }
    }};
}
