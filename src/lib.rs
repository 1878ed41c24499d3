//! # PLC
//!
//! A small statically-typed imperative toy language: a lexer, a
//! recursive-descent parser, a semantic analyzer, and a tree-walking
//! interpreter.
//!
//! Data flows one way through four stages: `lexer::lex` turns source text
//! into tokens, `parser::parse` turns tokens into an [`ast::Source`],
//! `analyzer::analyze` resolves names and types into a parallel
//! [`typed_ast::Source`], and `interpreter::interpret` walks that tree to
//! produce runtime effects and a final value.

/// The AST produced by the parser: a closed set of untyped node kinds.
pub mod ast;

/// Semantic analysis: name resolution, type checking, and the typed AST.
pub mod analyzer;

/// The built-in function registry shared by the analyzer and interpreter.
pub mod builtin;

/// The CLI surface (`plc run <FILE>`).
pub mod cli;

/// Distinct, inspectable error categories for each pipeline stage.
pub mod error;

/// The tree-walking evaluator.
pub mod interpreter;

/// Character-by-character tokenization.
pub mod lexer;

/// Runtime values.
pub mod object;

/// The recursive-descent parser.
pub mod parser;

/// Converts the parser's AST back into PLC source text, for the
/// parse-reserialize-reparse round-trip invariant.
pub mod printer;

/// A standalone regex exercise, unrelated to the core pipeline.
pub mod regex_exercises;

/// The generic, arena-backed lexical scope tree shared by the analyzer and
/// interpreter (each instantiates its own).
pub mod scope;

/// The typed AST produced by the analyzer.
pub mod typed_ast;

/// The closed set of built-in type names.
pub mod types;

pub use error::{PlcError, PlcResult};
pub use object::PlcObject;

/// Runs a complete PLC program end to end: lex, parse, analyze, interpret.
///
/// # Errors
///
/// Returns the first error raised by any stage.
pub fn run(source: &str) -> PlcResult<PlcObject> {
	let tokens = lexer::lex(source)?;
	let source = parser::parse(&tokens)?;
	let typed_source = analyzer::analyze(&source)?;
	let result = interpreter::interpret(&typed_source)?;
	Ok(result)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn runs_a_complete_program() {
		let result = run("FUN main(): Integer DO RETURN 1 + 2; END").unwrap();
		assert_eq!(result, PlcObject::Integer(num_bigint::BigInt::from(3)));
	}
}
