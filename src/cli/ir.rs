use std::path::PathBuf;

use clap::Args;

use super::{fail, load_or_exit};

#[derive(Args)]
pub struct IrArgs {
    /// Input JSON bundle (program, optional symbols and source)
    pub input: PathBuf,
}

pub fn cmd_ir(args: IrArgs) {
    let bundle = load_or_exit(&args.input);
    match jmmc::lower(&bundle.program, &bundle.symbols()) {
        Ok(units) => {
            for unit in &units {
                println!("{}", unit);
            }
        }
        Err(e) => fail(&bundle, &args.input, e),
    }
}
