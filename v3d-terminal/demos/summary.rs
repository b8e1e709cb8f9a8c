/// Example: Print the surfaces and primitive counts of a View3D file
///
/// Usage: cargo run --example summary -- path/to/file.vs3

use std::env;
use std::path::PathBuf;
use v3d_core::{parse_input_with_diagnostics, ControlParams};
use v3d_terminal::{summary, ViewerError};

const DEFAULT_INPUT: &str = include_str!("box.vs3");

fn main() -> Result<(), ViewerError> {
    env_logger::init();

    let text = match env::args().nth(1).map(PathBuf::from) {
        Some(path) => {
            println!("Loading {}", path.display());
            std::fs::read_to_string(path)?
        }
        None => {
            println!("No input file provided, using the built-in box...");
            DEFAULT_INPUT.to_string()
        }
    };

    let output = parse_input_with_diagnostics(&text)?;
    for diagnostic in &output.diagnostics {
        println!("warning: line {}: {}", diagnostic.line, diagnostic.message);
    }

    let model = output.model;
    model.validate()?;
    print!("{}", summary(&model)?);

    if let Some(control) = model.control() {
        match ControlParams::from_block(control) {
            Ok(params) => println!("{:#?}", params),
            Err(e) => println!("control block rejected: {}", e),
        }
    }
    Ok(())
}
