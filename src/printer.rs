//! Converts the parser's AST back into PLC source text.
//!
//! Printing is canonical — it doesn't reproduce the original source's
//! whitespace or parenthesization — but reparsing printed text must
//! reproduce a structurally equal tree (ignoring character indices, which
//! are meaningless once the text has been regenerated). This drives the
//! `parse -> print -> reparse` round-trip invariant (spec.md §8).
//!
//! Grounded on the teacher's `ToCabin` trait (`src/formatter.rs`),
//! simplified to plain `match`-based methods: PLC's grammar has no block
//! variety complex enough to need the teacher's `enum_dispatch`/`ambassador`
//! trait delegation.

use crate::ast::{BinaryOperator, Case, Expression, Function, Global, LiteralValue, Source, Statement};

/// Renders an AST node back into PLC source text.
pub trait ToSource {
	/// Produces PLC source text that reparses to a structurally equal node.
	fn to_source(&self) -> String;
}

impl ToSource for Source {
	fn to_source(&self) -> String {
		let mut pieces: Vec<String> = self.globals.iter().map(ToSource::to_source).collect();
		pieces.extend(self.functions.iter().map(ToSource::to_source));
		pieces.join("\n")
	}
}

impl ToSource for Global {
	fn to_source(&self) -> String {
		// `LIST name::Type = [...]` is the only grammar production whose
		// initializer is itself a list literal, so that shape identifies it
		// unambiguously among a parser-produced `Global`.
		if let Some(Expression::PlcList { values, .. }) = &self.value {
			let elements = values.iter().map(ToSource::to_source).collect::<Vec<_>>().join(", ");
			return format!("LIST {}::{} = [{elements}];", self.name, self.type_name);
		}
		let keyword = if self.mutable { "VAR" } else { "VAL" };
		match &self.value {
			Some(value) => format!("{keyword} {}: {} = {};", self.name, self.type_name, value.to_source()),
			None => format!("{keyword} {}: {};", self.name, self.type_name),
		}
	}
}

impl ToSource for Function {
	fn to_source(&self) -> String {
		let parameters = self
			.parameters
			.iter()
			.zip(&self.parameter_type_names)
			.map(|(name, type_name)| format!("{name}: {type_name}"))
			.collect::<Vec<_>>()
			.join(", ");
		let body = print_block(&self.statements);
		format!("FUN {}({parameters}): {} DO {body} END", self.name, self.return_type_name)
	}
}

fn print_block(statements: &[Statement]) -> String {
	statements.iter().map(ToSource::to_source).collect::<Vec<_>>().join(" ")
}

impl ToSource for Statement {
	fn to_source(&self) -> String {
		match self {
			Self::Expression(expr) => format!("{};", expr.to_source()),
			Self::Declaration { name, type_name, value, .. } => match (type_name, value) {
				(Some(type_name), Some(value)) => format!("LET {name}: {type_name} = {};", value.to_source()),
				(Some(type_name), None) => format!("LET {name}: {type_name};"),
				(None, Some(value)) => format!("LET {name} = {};", value.to_source()),
				(None, None) => format!("LET {name};"),
			},
			Self::Assignment { receiver, value, .. } => format!("{} = {};", receiver.to_source(), value.to_source()),
			Self::If { condition, then_block, else_block, .. } => match else_block {
				Some(else_block) => format!("IF {} DO {} ELSE {} END", condition.to_source(), print_block(then_block), print_block(else_block)),
				None => format!("IF {} DO {} END", condition.to_source(), print_block(then_block)),
			},
			Self::Switch { condition, cases, .. } => {
				let arms = cases.iter().map(ToSource::to_source).collect::<Vec<_>>().join(" ");
				format!("SWITCH {} {arms} END", condition.to_source())
			},
			Self::While { condition, statements, .. } => format!("WHILE {} DO {} END", condition.to_source(), print_block(statements)),
			Self::Return { value, .. } => format!("RETURN {};", value.to_source()),
		}
	}
}

impl ToSource for Case {
	fn to_source(&self) -> String {
		match &self.value {
			Some(value) => format!("CASE {}: {}", value.to_source(), print_block(&self.statements)),
			None => format!("DEFAULT: {}", print_block(&self.statements)),
		}
	}
}

impl ToSource for Expression {
	fn to_source(&self) -> String {
		match self {
			Self::Literal { value, .. } => value.to_source(),
			Self::Group { inner, .. } => format!("({})", inner.to_source()),
			Self::Binary { operator, left, right, .. } => format!("{} {} {}", left.to_source(), operator.to_source(), right.to_source()),
			Self::Access { name, offset, .. } => match offset {
				Some(offset) => format!("{name}[{}]", offset.to_source()),
				None => name.clone(),
			},
			Self::Call { name, arguments, .. } => {
				let arguments = arguments.iter().map(ToSource::to_source).collect::<Vec<_>>().join(", ");
				format!("{name}({arguments})")
			},
			Self::PlcList { values, .. } => {
				let values = values.iter().map(ToSource::to_source).collect::<Vec<_>>().join(", ");
				format!("[{values}]")
			},
		}
	}
}

impl ToSource for LiteralValue {
	fn to_source(&self) -> String {
		match self {
			Self::Nil => "NIL".to_owned(),
			Self::Boolean(true) => "TRUE".to_owned(),
			Self::Boolean(false) => "FALSE".to_owned(),
			Self::Integer(value) => value.to_string(),
			Self::Decimal(text) => text.clone(),
			Self::Character(value) => format!("'{value}'"),
			Self::String(value) => format!("\"{value}\""),
		}
	}
}

impl ToSource for BinaryOperator {
	fn to_source(&self) -> String {
		match self {
			Self::And => "&&",
			Self::Or => "||",
			Self::LessThan => "<",
			Self::GreaterThan => ">",
			Self::Equal => "==",
			Self::NotEqual => "!=",
			Self::Add => "+",
			Self::Subtract => "-",
			Self::Multiply => "*",
			Self::Divide => "/",
			Self::Power => "^",
		}
		.to_owned()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{lexer, parser};

	fn round_trip(source: &str) -> Source {
		let tokens = lexer::lex(source).unwrap();
		let ast = parser::parse(&tokens).unwrap();
		let printed = ast.to_source();
		let reprinted_tokens = lexer::lex(&printed).unwrap();
		parser::parse(&reprinted_tokens).unwrap()
	}

	#[test]
	fn prints_and_reparses_a_function_with_control_flow() {
		let source = "FUN main(): Integer DO LET x: Integer = 1 + 2 * 3; WHILE x < 10 DO x = x + 1; END IF x > 0 DO RETURN x; END RETURN 0; END";
		let reparsed = round_trip(source);
		assert_eq!(reparsed.functions[0].name, "main");
		assert_eq!(reparsed.functions[0].statements.len(), 4);
	}

	#[test]
	fn prints_a_list_global_with_double_colon_syntax() {
		let reparsed = round_trip("LIST xs::Integer = [1, 2, 3]; FUN main(): Integer DO RETURN xs[0]; END");
		assert_eq!(reparsed.globals.len(), 1);
		assert!(reparsed.globals[0].mutable);
		assert!(matches!(&reparsed.globals[0].value, Some(Expression::PlcList { values, .. }) if values.len() == 3));
	}
}
