//! The built-in function registry.
//!
//! Two constant tables, one consulted by each stage: [`SIGNATURES`] gives the
//! Analyzer the parameter/return types it needs for call-site checking,
//! [`IMPLEMENTATIONS`] gives the Interpreter the actual `fn` to run. Both are
//! `phf::Map`s, grounded on the teacher's `api/builtin.rs` `BUILTINS:
//! phf::Map<&str, BuiltinFunction>` constant-lookup-table pattern.

use crate::error::{RuntimeError, RuntimeResult};
use crate::object::PlcObject;
use crate::types::Type;

/// A built-in function's declared signature, as the Analyzer needs it.
pub struct Signature {
	/// The types of each parameter, in order.
	pub parameter_types: &'static [Type],
	/// The declared return type.
	pub return_type: Type,
}

/// `print(Any) -> Nil`, the language's one built-in function.
pub static SIGNATURES: phf::Map<&str, Signature> = phf::phf_map! {
	"print" => Signature { parameter_types: &[Type::Any], return_type: Type::Nil },
};

/// A built-in function's runtime implementation.
pub type Implementation = fn(&[PlcObject]) -> RuntimeResult<PlcObject>;

pub static IMPLEMENTATIONS: phf::Map<&str, Implementation> = phf::phf_map! {
	"print" => print_impl,
};

/// Writes the single argument's string form to standard output followed by a
/// newline, and returns `NIL`.
fn print_impl(arguments: &[PlcObject]) -> RuntimeResult<PlcObject> {
	let value = arguments.first().ok_or_else(|| RuntimeError::new("print expects exactly one argument"))?;
	println!("{value}");
	Ok(PlcObject::NIL)
}
