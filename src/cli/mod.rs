pub mod build;
pub mod check;
pub mod ir;

use std::path::Path;
use std::process;

use jmmc::{render_diagnostics, CompilationInput, CompileError, Diagnostic};

/// Load an input bundle or exit with a message.
pub fn load_or_exit(path: &Path) -> CompilationInput {
    match jmmc::load_input(path) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

/// Render diagnostics against the bundled source when there is one.
pub fn report(input: &CompilationInput, path: &Path, diagnostics: &[Diagnostic]) {
    let fallback = path.display().to_string();
    render_diagnostics(
        diagnostics,
        input.display_name(&fallback),
        input.source.as_deref(),
    );
}

/// Report a failed compilation and exit.
pub fn fail(input: &CompilationInput, path: &Path, err: CompileError) -> ! {
    report(input, path, &err.to_diagnostics());
    if !matches!(err, CompileError::Semantic(_)) {
        eprintln!("error: {}", err);
    }
    process::exit(1);
}
