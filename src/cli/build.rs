use std::path::PathBuf;
use std::process;

use clap::Args;
use jmmc::ir::lower::ResourceLimits;
use jmmc::CompileOptions;

use super::{fail, load_or_exit, report};

#[derive(Args)]
pub struct BuildArgs {
    /// Input JSON bundle (program, optional symbols and source)
    pub input: PathBuf,
    /// Output .j file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Also print the three-address IR of every class
    #[arg(long)]
    pub ir: bool,
    /// Value of `.limit stack` in every method
    #[arg(long, value_name = "N", default_value_t = 99)]
    pub stack_limit: u32,
    /// Value of `.limit locals` in every method
    #[arg(long, value_name = "N", default_value_t = 99)]
    pub locals_limit: u32,
}

pub fn cmd_build(args: BuildArgs) {
    let BuildArgs {
        input,
        output,
        ir,
        stack_limit,
        locals_limit,
    } = args;
    let bundle = load_or_exit(&input);
    let options = CompileOptions::default()
        .with_limits(ResourceLimits {
            stack: stack_limit,
            locals: locals_limit,
        })
        .with_print_ir(ir);

    let out = match jmmc::compile_input(&bundle, &options) {
        Ok(out) => out,
        Err(e) => fail(&bundle, &input, e),
    };
    report(&bundle, &input, &out.warnings);

    for class in &out.classes {
        if let Some(text) = &class.ir {
            eprintln!("{}", text);
        }
    }

    let assembly = out.assembly();
    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, &assembly) {
                eprintln!("error: cannot write '{}': {}", path.display(), e);
                process::exit(1);
            }
            eprintln!("Compiled -> {}", path.display());
        }
        None => print!("{}", assembly),
    }
}
