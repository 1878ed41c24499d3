//! The closed set of built-in type names.

use strum_macros::{Display, EnumString};

/// A built-in type name as it appears in source (`Integer`, `String`, ...).
/// Closed: there are no user-defined types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
pub enum Type {
	/// Assignable from and to anything.
	Any,
	/// The type of the canonical `NIL` value.
	Nil,
	/// Assignable from `Integer`, `Decimal`, `Character` or `String`.
	Comparable,
	/// An arbitrary-precision signed integer, bounded to 32-bit-signed range at literal time.
	Integer,
	/// An arbitrary-precision decimal.
	Decimal,
	/// `TRUE` or `FALSE`.
	Boolean,
	/// A single character.
	Character,
	/// A string of characters.
	String,
	/// The element type marker for list iteration (reserved; unused at runtime).
	IntegerIterable,
}

impl Type {
	/// Whether a value of type `actual` may be stored into a slot declared as
	/// `self`, per the assignability rules of `requireAssignable`:
	/// - `Any` accepts anything.
	/// - `Comparable` accepts `Integer`, `Decimal`, `Character` or `String`.
	/// - Otherwise the types must match exactly.
	#[must_use]
	pub fn accepts(self, actual: Self) -> bool {
		match self {
			Self::Any => true,
			Self::Comparable => matches!(actual, Self::Integer | Self::Decimal | Self::Character | Self::String),
			target => target == actual,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn any_accepts_everything() {
		assert!(Type::Any.accepts(Type::Integer));
		assert!(Type::Any.accepts(Type::Nil));
	}

	#[test]
	fn comparable_accepts_only_the_comparable_set() {
		assert!(Type::Comparable.accepts(Type::Integer));
		assert!(Type::Comparable.accepts(Type::String));
		assert!(!Type::Comparable.accepts(Type::Boolean));
		assert!(!Type::Comparable.accepts(Type::Nil));
	}

	#[test]
	fn other_types_require_exact_match() {
		assert!(Type::Integer.accepts(Type::Integer));
		assert!(!Type::Integer.accepts(Type::Decimal));
	}
}
