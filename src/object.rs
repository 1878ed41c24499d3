//! Runtime values.

use std::cell::RefCell;
use std::rc::Rc;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::types::Type;

/// A mutable list value, shared by every `PlcObject::List` handle that was
/// copied from the same original value (by assignment, by passing it as an
/// argument, or by reading it out of a variable). Indexed assignment through
/// any one handle is visible through all the others; reassigning a variable
/// to point at a *different* value never affects the others. See the design
/// notes on list aliasing.
pub type PlcListHandle = Rc<RefCell<Vec<PlcObject>>>;

/// A runtime value together with its type tag. The canonical `NIL` value is
/// `PlcObject::Nil`.
#[derive(Debug, Clone)]
pub enum PlcObject {
	/// The canonical `NIL` value.
	Nil,
	/// `TRUE` or `FALSE`.
	Boolean(bool),
	/// An arbitrary-precision integer.
	Integer(BigInt),
	/// An arbitrary-precision decimal.
	Decimal(BigDecimal),
	/// A single character.
	Character(char),
	/// A string.
	String(String),
	/// A mutable list of values.
	List(PlcListHandle),
}

impl PlcObject {
	/// The canonical nil value, spelled out for readability at call sites.
	pub const NIL: Self = Self::Nil;

	/// This value's runtime [`Type`] tag.
	#[must_use]
	pub fn kind(&self) -> Type {
		match self {
			Self::Nil => Type::Nil,
			Self::Boolean(_) => Type::Boolean,
			Self::Integer(_) => Type::Integer,
			Self::Decimal(_) => Type::Decimal,
			Self::Character(_) => Type::Character,
			Self::String(_) => Type::String,
			Self::List(_) => Type::IntegerIterable,
		}
	}

	/// Builds a new, independently-owned list value out of already-evaluated
	/// elements.
	#[must_use]
	pub fn new_list(elements: Vec<Self>) -> Self {
		Self::List(Rc::new(RefCell::new(elements)))
	}
}

/// Value-equality, used by `==`/`!=` and by `SWITCH` case matching. Lists
/// compare by deep equality of their current elements, not by handle
/// identity.
impl PartialEq for PlcObject {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Nil, Self::Nil) => true,
			(Self::Boolean(left), Self::Boolean(right)) => left == right,
			(Self::Integer(left), Self::Integer(right)) => left == right,
			(Self::Decimal(left), Self::Decimal(right)) => left == right,
			(Self::Character(left), Self::Character(right)) => left == right,
			(Self::String(left), Self::String(right)) => left == right,
			(Self::List(left), Self::List(right)) => *left.borrow() == *right.borrow(),
			_ => false,
		}
	}
}

impl std::fmt::Display for PlcObject {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Nil => write!(f, "NIL"),
			Self::Boolean(value) => write!(f, "{}", if *value { "TRUE" } else { "FALSE" }),
			Self::Integer(value) => write!(f, "{value}"),
			Self::Decimal(value) => write!(f, "{value}"),
			Self::Character(value) => write!(f, "{value}"),
			Self::String(value) => write!(f, "{value}"),
			Self::List(values) => {
				write!(f, "[")?;
				for (index, value) in values.borrow().iter().enumerate() {
					if index > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{value}")?;
				}
				write!(f, "]")
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lists_compare_by_deep_equality_not_identity() {
		let a = PlcObject::new_list(vec![PlcObject::Integer(BigInt::from(1))]);
		let b = PlcObject::new_list(vec![PlcObject::Integer(BigInt::from(1))]);
		assert_eq!(a, b);
	}

	#[test]
	fn shared_list_handles_observe_each_others_mutations() {
		let a = PlcObject::new_list(vec![PlcObject::Integer(BigInt::from(1))]);
		let PlcObject::List(handle) = a.clone() else { unreachable!() };
		let b = PlcObject::List(Rc::clone(&handle));
		handle.borrow_mut()[0] = PlcObject::Integer(BigInt::from(42));
		assert_eq!(a, b);
	}

	#[test]
	fn nil_displays_as_nil() {
		assert_eq!(PlcObject::Nil.to_string(), "NIL");
	}
}
