//! Punto de entrada ("driver").
//!
//! Este módulo orquesta las fases de traducción y expone una CLI.

use anyhow::{self, bail, Context};
use clap::{self, crate_version, Arg};
use latex2go::{
    error::Render, translate, TranslateError, DEFAULT_FUNCTION, DEFAULT_PACKAGE,
};

use std::fs::File;
use std::io::Write;

fn main() -> anyhow::Result<()> {
    // Parsing de CLI
    let args = clap::Command::new("latex2go")
        .version(crate_version!())
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("LATEX")
                .takes_value(true)
                .required(true)
                .help("LaTeX expression to translate"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .takes_value(true)
                .help("Output file (stdout if omitted)"),
        )
        .arg(
            Arg::new("package")
                .long("package")
                .value_name("NAME")
                .takes_value(true)
                .default_value(DEFAULT_PACKAGE)
                .help("Go package name for the generated file"),
        )
        .arg(
            Arg::new("func-name")
                .long("func-name")
                .value_name("NAME")
                .takes_value(true)
                .default_value(DEFAULT_FUNCTION)
                .help("Name of the generated Go function"),
        )
        .get_matches();

    // required/default_value garantizan presencia
    let input = args.value_of("input").unwrap_or_default();
    let package = args.value_of("package").unwrap_or_default();
    let func_name = args.value_of("func-name").unwrap_or_default();

    let translation = match translate(input, package, func_name) {
        Ok(translation) => translation,

        // Los errores de parseo se subrayan contra la expresión
        // original antes de abortar
        Err(TranslateError::Parse(errors)) => {
            eprint!("{}", Render::new(input, errors.diagnostics()));
            bail!("failed to translate expression");
        }

        Err(error) => return Err(error.into()),
    };

    for warning in &translation.warnings {
        eprintln!("warning: {}", warning.message());
    }

    for message in translation.caveats.messages() {
        eprintln!("warning: {}", message);
    }

    match args.value_of("output") {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to open for writing: {}", path))?;

            file.write_all(translation.source.as_bytes())
                .with_context(|| format!("Failed to write to file: {}", path))?;
        }

        None => print!("{}", translation.source),
    }

    Ok(())
}
