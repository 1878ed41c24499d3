//! Error types for each pipeline stage. Each stage fails with its own distinct,
//! inspectable error kind rather than a blanket `anyhow::Error`, so callers can
//! match on *what kind* of thing went wrong instead of only a rendered message.

use thiserror::Error;

/// An error raised while scanning source text into tokens. Carries the
/// character index at which the offending input was found.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("lex error at character {index}: {message}")]
pub struct LexError {
	/// Character index where the lexer detected the problem.
	pub index: usize,
	/// Human-readable description of what went wrong.
	pub message: String,
}

impl LexError {
	/// Builds a new lex error at the given character index.
	#[must_use]
	pub fn new(index: usize, message: impl Into<String>) -> Self {
		Self { index, message: message.into() }
	}
}

/// An error raised while turning a token stream into an AST. Carries the
/// index of the offending token (its starting character index in the
/// original source, per spec).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("parse error at token {index}: {message}")]
pub struct ParseError {
	/// Character index of the offending token.
	pub index: usize,
	/// Human-readable description of what went wrong.
	pub message: String,
}

impl ParseError {
	/// Builds a new parse error at the given token index.
	#[must_use]
	pub fn new(index: usize, message: impl Into<String>) -> Self {
		Self { index, message: message.into() }
	}
}

/// An error raised by the analyzer: type mismatches, undefined names, wrong
/// arity, a missing `main`, and so on. Carries only a message, since these
/// are reported in terms of names and types rather than source offsets.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("analysis error: {0}")]
pub struct AnalysisError(pub String);

impl AnalysisError {
	/// Builds a new analysis error with the given message.
	#[must_use]
	pub fn new(message: impl Into<String>) -> Self {
		Self(message.into())
	}
}

/// An error raised by the interpreter at evaluation time: division by zero,
/// index out of bounds, assignment to an immutable variable, and so on.
///
/// The specification folds this together with analysis errors as a single
/// "semantic/runtime" category; we keep it as its own variant of
/// [`PlcError`] so a caller can tell a compile-time type error apart from a
/// failure that only manifests while actually running the program.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("runtime error: {0}")]
pub struct RuntimeError(pub String);

impl RuntimeError {
	/// Builds a new runtime error with the given message.
	#[must_use]
	pub fn new(message: impl Into<String>) -> Self {
		Self(message.into())
	}
}

/// The top-level error type returned by the pipeline's public entry points.
/// Every stage's error type can be converted into this via `?`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlcError {
	/// A lexical error; see [`LexError`].
	#[error(transparent)]
	Lex(#[from] LexError),
	/// A parse error; see [`ParseError`].
	#[error(transparent)]
	Parse(#[from] ParseError),
	/// An analysis error; see [`AnalysisError`].
	#[error(transparent)]
	Analysis(#[from] AnalysisError),
	/// A runtime error; see [`RuntimeError`].
	#[error(transparent)]
	Runtime(#[from] RuntimeError),
}

/// Convenience alias for a result carrying a [`LexError`].
pub type LexResult<T> = Result<T, LexError>;
/// Convenience alias for a result carrying a [`ParseError`].
pub type ParseResult<T> = Result<T, ParseError>;
/// Convenience alias for a result carrying an [`AnalysisError`].
pub type AnalysisResult<T> = Result<T, AnalysisError>;
/// Convenience alias for a result carrying a [`RuntimeError`].
pub type RuntimeResult<T> = Result<T, RuntimeError>;
/// Convenience alias for a result carrying a top-level [`PlcError`].
pub type PlcResult<T> = Result<T, PlcError>;
