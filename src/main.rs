use clap::{Parser, Subcommand};

mod cli;

use cli::build::BuildArgs;
use cli::check::CheckArgs;
use cli::ir::IrArgs;

#[derive(Parser)]
#[command(
    name = "jmmc",
    version,
    about = "Type-annotate, lower and assemble Java-subset programs"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile an input bundle to Jasmin assembly
    Build(BuildArgs),
    /// Type-check without lowering
    Check(CheckArgs),
    /// Print the three-address IR
    Ir(IrArgs),
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Build(args) => cli::build::cmd_build(args),
        Command::Check(args) => cli::check::cmd_check(args),
        Command::Ir(args) => cli::ir::cmd_ir(args),
    }
}
