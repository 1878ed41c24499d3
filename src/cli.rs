//! The CLI surface: a single `run` subcommand, grounded on the teacher's
//! `cli/commands/run.rs` `RunCommand::execute` staging (read file →
//! tokenize → parse → evaluate), without the teacher's package-manager
//! commands (`new`, `add`, `set`) — PLC has no project/package concept.

use std::fs;

use colored::Colorize as _;
use log::debug;

use crate::object::PlcObject;
use crate::{analyzer, interpreter, lexer, parser};

/// Runs a PLC source file: `plc run <FILE>`.
#[derive(clap::Parser)]
pub struct RunCommand {
	/// Path to the `.plc` source file to run.
	pub filename: String,
}

impl RunCommand {
	/// Executes this command: reads `filename`, drives it through the
	/// lex/parse/analyze/interpret pipeline, and reports the result.
	///
	/// # Errors
	///
	/// Returns the error from whichever stage first fails.
	pub fn execute(&self) -> anyhow::Result<()> {
		let source = step("Reading", &self.filename, || {
			fs::read_to_string(&self.filename).map_err(|error| anyhow::anyhow!("could not read `{}`: {error}", self.filename))
		})?;

		let tokens = step("Tokenizing", &self.filename, || lexer::lex(&source).map_err(Into::into))?;
		debug!("lexed {} tokens from {}", tokens.len(), self.filename);

		let ast = step("Parsing", &self.filename, || parser::parse(&tokens).map_err(Into::into))?;
		debug!("parsed {} globals and {} functions", ast.globals.len(), ast.functions.len());

		let typed_ast = step("Analyzing", &self.filename, || analyzer::analyze(&ast).map_err(Into::into))?;
		debug!("analysis complete");

		let result = step("Running", &self.filename, || interpreter::interpret(&typed_ast).map_err(Into::into))?;
		report_result(&result);

		Ok(())
	}
}

/// Runs `action` while printing a colored `"<Label>... "` status line,
/// completed with `Done!`/`Error:` depending on the outcome. Grounded on the
/// teacher's `step!` macro (`cli/commands/mod.rs`), simplified to a plain
/// function since PLC has no quiet/developer-mode configuration to thread
/// through it.
fn step<T>(label: &str, object: &str, action: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<T> {
	print!("{} {}... ", label.bold().green(), object);
	match action() {
		Ok(value) => {
			println!("{}", "Done!".bold().green());
			Ok(value)
		},
		Err(error) => {
			println!("{}", "Error:".bold().red());
			Err(error)
		},
	}
}

fn report_result(result: &PlcObject) {
	println!("{} {result}", "Result:".bold().cyan());
}
