//! # PLC
//!
//! A small statically-typed imperative toy language.
//!
//! ## Usage
//!
//! ```bash
//! plc run path/to/program.plc
//! ```

use clap::Parser as _;

use plc::cli::RunCommand;

/// The command-line arguments for the interpreter.
#[derive(clap::Parser)]
#[command(name = "plc", about = "Lexer, parser, analyzer and interpreter for the PLC toy language")]
struct PlcArguments {
	#[command(subcommand)]
	command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
	/// Run a PLC source file.
	Run(RunCommand),
}

fn main() -> anyhow::Result<()> {
	env_logger::init();

	let Command::Run(run) = PlcArguments::parse().command;
	run.execute()
}
