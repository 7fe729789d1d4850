use std::path::PathBuf;

use clap::Args;

use super::{fail, load_or_exit, report};

#[derive(Args)]
pub struct CheckArgs {
    /// Input JSON bundle (program, optional symbols and source)
    pub input: PathBuf,
}

pub fn cmd_check(args: CheckArgs) {
    let bundle = load_or_exit(&args.input);
    match jmmc::check(&bundle.program, &bundle.symbols()) {
        Ok(annotation) => {
            let warnings: Vec<_> = annotation.warnings().cloned().collect();
            report(&bundle, &args.input, &warnings);
            eprintln!("OK: {}", args.input.display());
        }
        Err(e) => fail(&bundle, &args.input, e),
    }
}
