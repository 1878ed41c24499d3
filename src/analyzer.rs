//! Semantic analysis: a single pass over the parser's [`ast`] that resolves
//! every name against a scope, assigns a type to every expression, and
//! enforces assignability and statement well-formedness.
//!
//! Produces a [`typed_ast::Source`] rather than mutating the parser's tree in
//! place (spec design note: avoid mutable annotation slots on an otherwise
//! immutable AST). Owns its own [`ScopeArena`], independent of the
//! interpreter's.

use std::str::FromStr as _;

use log::{debug, trace};
use num_bigint::BigInt;

use crate::ast::{self, BinaryOperator, LiteralValue};
use crate::builtin;
use crate::error::{AnalysisError, AnalysisResult};
use crate::object::PlcObject;
use crate::scope::ScopeArena;
use crate::typed_ast;
use crate::types::Type;

/// What the Analyzer's scope tree records about a variable: its resolved
/// type, whether it can be reassigned, and — for list variables only — the
/// element type established at declaration, used to type indexed reads.
#[derive(Debug, Clone)]
struct AnalyzerVariable {
	ty: Type,
	mutable: bool,
	element_type: Option<Type>,
}

/// What the Analyzer's scope tree records about a function: enough to
/// type-check call sites without re-walking the function's body.
#[derive(Debug, Clone)]
struct AnalyzerFunction {
	parameter_types: Vec<Type>,
	return_type: Type,
}

struct Analyzer {
	scopes: ScopeArena<AnalyzerVariable, AnalyzerFunction>,
	return_type: Type,
}

/// Runs semantic analysis over a parsed program, producing a type-annotated
/// tree or the first analysis error encountered.
pub fn analyze(source: &ast::Source) -> AnalysisResult<typed_ast::Source> {
	let mut analyzer = Analyzer { scopes: ScopeArena::new(), return_type: Type::Any };
	analyzer.register_builtins();
	analyzer.analyze_source(source)
}

fn resolve_type(name: &str) -> AnalysisResult<Type> {
	Type::from_str(name).map_err(|_| AnalysisError::new(format!("unknown type name `{name}`")))
}

impl Analyzer {
	fn register_builtins(&mut self) {
		for (name, signature) in &builtin::SIGNATURES {
			self.scopes.define_function(
				(*name).to_owned(),
				signature.parameter_types.len(),
				AnalyzerFunction { parameter_types: signature.parameter_types.to_vec(), return_type: signature.return_type },
			);
		}
	}

	fn analyze_source(&mut self, source: &ast::Source) -> AnalysisResult<typed_ast::Source> {
		let globals = source.globals.iter().map(|global| self.analyze_global(global)).collect::<AnalysisResult<Vec<_>>>()?;

		for function in &source.functions {
			self.register_function_signature(function)?;
		}
		let functions = source.functions.iter().map(|function| self.analyze_function(function)).collect::<AnalysisResult<Vec<_>>>()?;

		verify_main(&functions)?;

		Ok(typed_ast::Source { globals, functions })
	}

	fn register_function_signature(&mut self, function: &ast::Function) -> AnalysisResult<()> {
		if self.scopes.lookup_function(&function.name, function.parameters.len()).is_some() {
			return Err(AnalysisError::new(format!(
				"function `{}` is already defined with {} parameter(s)",
				function.name,
				function.parameters.len()
			)));
		}
		let parameter_types = function.parameter_type_names.iter().map(|name| resolve_type(name)).collect::<AnalysisResult<Vec<_>>>()?;
		let return_type = resolve_type(&function.return_type_name)?;
		self.scopes.define_function(function.name.clone(), function.parameters.len(), AnalyzerFunction { parameter_types, return_type });
		Ok(())
	}

	fn analyze_global(&mut self, global: &ast::Global) -> AnalysisResult<typed_ast::Global> {
		debug!("analyzer: visiting global `{}`", global.name);
		if let Some(ast::Expression::PlcList { values, index }) = &global.value {
			let element_type = resolve_type(&global.type_name)?;
			let typed_values =
				values.iter().map(|value| self.analyze_expression(value)).collect::<AnalysisResult<Vec<_>>>().map_err(|error| {
					AnalysisError::new(format!("{error}\n\twhile analyzing the elements of list `{}` declared at index {index}", global.name))
				})?;
			for value in &typed_values {
				if !element_type.accepts(value.ty()) {
					return Err(AnalysisError::new(format!(
						"element of list `{}` has type {:?} but the list's declared element type is {element_type:?}",
						global.name,
						value.ty()
					)));
				}
			}
			self.scopes.define_variable(
				global.name.clone(),
				AnalyzerVariable { ty: Type::IntegerIterable, mutable: global.mutable, element_type: Some(element_type) },
			);
			return Ok(typed_ast::Global {
				name: global.name.clone(),
				ty: Type::IntegerIterable,
				mutable: global.mutable,
				value: Some(typed_ast::Expression::PlcList { values: typed_values, ty: Type::IntegerIterable }),
			});
		}

		let declared_type = resolve_type(&global.type_name)?;
		let value = global
			.value
			.as_ref()
			.map(|value| {
				let typed = self.analyze_expression(value)?;
				if !declared_type.accepts(typed.ty()) {
					return Err(AnalysisError::new(format!(
						"global `{}` is declared {declared_type:?} but its initializer has type {:?}",
						global.name,
						typed.ty()
					)));
				}
				Ok(typed)
			})
			.transpose()?;

		self.scopes.define_variable(global.name.clone(), AnalyzerVariable { ty: declared_type, mutable: global.mutable, element_type: None });

		Ok(typed_ast::Global { name: global.name.clone(), ty: declared_type, mutable: global.mutable, value })
	}

	fn analyze_function(&mut self, function: &ast::Function) -> AnalysisResult<typed_ast::Function> {
		debug!("analyzer: visiting function `{}` ({} parameter(s))", function.name, function.parameters.len());
		let parameter_types = function.parameter_type_names.iter().map(|name| resolve_type(name)).collect::<AnalysisResult<Vec<_>>>()?;
		let return_type = resolve_type(&function.return_type_name)?;

		let parent = self.scopes.enter_child();
		for (name, ty) in function.parameters.iter().zip(&parameter_types) {
			self.scopes.define_variable(name.clone(), AnalyzerVariable { ty: *ty, mutable: true, element_type: None });
		}

		let previous_return_type = self.return_type;
		self.return_type = return_type;

		let statements = self.analyze_statements(&function.statements);

		self.return_type = previous_return_type;
		self.scopes.exit(parent);

		Ok(typed_ast::Function {
			name: function.name.clone(),
			parameters: function.parameters.clone().into_iter().zip(parameter_types).collect(),
			return_type,
			statements: statements?,
		})
	}

	/// Analyzes a statement list in the *current* scope, without pushing a
	/// child. Used for a function's top-level body (the parameter scope
	/// already pushed by [`Self::analyze_function`] serves as its block).
	fn analyze_statements(&mut self, statements: &[ast::Statement]) -> AnalysisResult<Vec<typed_ast::Statement>> {
		statements.iter().map(|statement| self.analyze_statement(statement)).collect()
	}

	/// Analyzes a statement list inside a fresh child scope, restoring the
	/// parent scope on every exit path including an early error return.
	fn analyze_block(&mut self, statements: &[ast::Statement]) -> AnalysisResult<Vec<typed_ast::Statement>> {
		let parent = self.scopes.enter_child();
		let result = self.analyze_statements(statements);
		self.scopes.exit(parent);
		result
	}

	fn analyze_statement(&mut self, statement: &ast::Statement) -> AnalysisResult<typed_ast::Statement> {
		trace!("analyzer: visiting {} statement", statement_kind(statement));
		match statement {
			ast::Statement::Expression(expr) => {
				if !matches!(expr, ast::Expression::Call { .. }) {
					return Err(AnalysisError::new("an expression statement must be a function call"));
				}
				Ok(typed_ast::Statement::Expression(self.analyze_expression(expr)?))
			},
			ast::Statement::Declaration { name, type_name, value, .. } => self.analyze_declaration(name, type_name.as_deref(), value.as_ref()),
			ast::Statement::Assignment { receiver, value, .. } => self.analyze_assignment(receiver, value),
			ast::Statement::If { condition, then_block, else_block, .. } => self.analyze_if(condition, then_block, else_block.as_deref()),
			ast::Statement::Switch { condition, cases, .. } => self.analyze_switch(condition, cases),
			ast::Statement::While { condition, statements, .. } => self.analyze_while(condition, statements),
			ast::Statement::Return { value, .. } => {
				let typed = self.analyze_expression(value)?;
				if !self.return_type.accepts(typed.ty()) {
					return Err(AnalysisError::new(format!("returned type {:?} is not assignable to declared return type {:?}", typed.ty(), self.return_type)));
				}
				Ok(typed_ast::Statement::Return { value: typed })
			},
		}
	}

	fn analyze_declaration(&mut self, name: &str, type_name: Option<&str>, value: Option<&ast::Expression>) -> AnalysisResult<typed_ast::Statement> {
		let typed_value = value.map(|value| self.analyze_expression(value)).transpose()?;

		let ty = match (type_name, &typed_value) {
			(Some(type_name), _) => resolve_type(type_name)?,
			(None, Some(typed_value)) => typed_value.ty(),
			(None, None) => return Err(AnalysisError::new(format!("declaration of `{name}` needs either a type annotation or an initializer"))),
		};

		if let Some(typed_value) = &typed_value {
			if !ty.accepts(typed_value.ty()) {
				return Err(AnalysisError::new(format!("`{name}` is declared {ty:?} but its initializer has type {:?}", typed_value.ty())));
			}
		}

		let element_type = match &typed_value {
			Some(typed_ast::Expression::PlcList { values, .. }) => values.first().map(typed_ast::Expression::ty),
			_ => None,
		};

		self.scopes.define_variable(name.to_owned(), AnalyzerVariable { ty, mutable: true, element_type });

		Ok(typed_ast::Statement::Declaration { name: name.to_owned(), ty, value: typed_value })
	}

	fn analyze_assignment(&mut self, receiver: &ast::Expression, value: &ast::Expression) -> AnalysisResult<typed_ast::Statement> {
		let ast::Expression::Access { name, .. } = receiver else {
			return Err(AnalysisError::new("the left-hand side of an assignment must be a variable or list access"));
		};
		if !self.scopes.lookup_variable(name).is_some_and(|variable| variable.mutable) {
			return Err(AnalysisError::new(format!("cannot assign to immutable variable `{name}`")));
		}

		let typed_receiver = self.analyze_expression(receiver)?;
		let typed_value = self.analyze_expression(value)?;
		if typed_receiver.ty() != typed_value.ty() {
			return Err(AnalysisError::new(format!(
				"cannot assign a value of type {:?} to a target of type {:?}",
				typed_value.ty(),
				typed_receiver.ty()
			)));
		}

		Ok(typed_ast::Statement::Assignment { receiver: typed_receiver, value: typed_value })
	}

	fn analyze_if(&mut self, condition: &ast::Expression, then_block: &[ast::Statement], else_block: Option<&[ast::Statement]>) -> AnalysisResult<typed_ast::Statement> {
		if then_block.is_empty() {
			return Err(AnalysisError::new("an `IF` statement's `DO` branch must not be empty"));
		}
		let typed_condition = self.analyze_expression(condition)?;
		if typed_condition.ty() != Type::Boolean {
			return Err(AnalysisError::new(format!("`IF` condition must be Boolean, found {:?}", typed_condition.ty())));
		}

		let typed_then = self.analyze_block(then_block)?;
		let typed_else = else_block.map(|block| self.analyze_block(block)).transpose()?;

		Ok(typed_ast::Statement::If { condition: typed_condition, then_block: typed_then, else_block: typed_else })
	}

	fn analyze_while(&mut self, condition: &ast::Expression, statements: &[ast::Statement]) -> AnalysisResult<typed_ast::Statement> {
		let typed_condition = self.analyze_expression(condition)?;
		if typed_condition.ty() != Type::Boolean {
			return Err(AnalysisError::new(format!("`WHILE` condition must be Boolean, found {:?}", typed_condition.ty())));
		}
		let typed_statements = self.analyze_block(statements)?;
		Ok(typed_ast::Statement::While { condition: typed_condition, statements: typed_statements })
	}

	fn analyze_switch(&mut self, condition: &ast::Expression, cases: &[ast::Case]) -> AnalysisResult<typed_ast::Statement> {
		let typed_condition = self.analyze_expression(condition)?;

		let mut typed_cases = Vec::with_capacity(cases.len());
		for (position, case) in cases.iter().enumerate() {
			let is_default = case.value.is_none();
			if is_default && position != cases.len() - 1 {
				return Err(AnalysisError::new("only the last `SWITCH` arm may be `DEFAULT`"));
			}

			let typed_value = case
				.value
				.as_ref()
				.map(|value| {
					let typed = self.analyze_expression(value)?;
					if typed.ty() != typed_condition.ty() {
						return Err(AnalysisError::new(format!(
							"`CASE` value has type {:?} but the `SWITCH` condition has type {:?}",
							typed.ty(),
							typed_condition.ty()
						)));
					}
					Ok(typed)
				})
				.transpose()?;

			let typed_statements = self.analyze_block(&case.statements)?;
			typed_cases.push(typed_ast::Case { value: typed_value, statements: typed_statements });
		}

		Ok(typed_ast::Statement::Switch { condition: typed_condition, cases: typed_cases })
	}

	fn analyze_expression(&mut self, expression: &ast::Expression) -> AnalysisResult<typed_ast::Expression> {
		trace!("analyzer: visiting {} expression", expression_kind(expression));
		match expression {
			ast::Expression::Literal { value, index } => self.analyze_literal(value, *index),
			ast::Expression::Group { inner, .. } => self.analyze_group(inner),
			ast::Expression::Binary { operator, left, right, index } => self.analyze_binary(*operator, left, right, *index),
			ast::Expression::Access { name, offset, .. } => self.analyze_access(name, offset.as_deref()),
			ast::Expression::Call { name, arguments, .. } => self.analyze_call(name, arguments),
			ast::Expression::PlcList { values, .. } => self.analyze_list(values),
		}
	}

	fn analyze_literal(&self, value: &LiteralValue, index: usize) -> AnalysisResult<typed_ast::Expression> {
		let (object, ty) = match value {
			LiteralValue::Nil => (PlcObject::Nil, Type::Nil),
			LiteralValue::Boolean(value) => (PlcObject::Boolean(*value), Type::Boolean),
			LiteralValue::Integer(value) => {
				let min = BigInt::from(i32::MIN);
				let max = BigInt::from(i32::MAX);
				if *value < min || *value > max {
					return Err(AnalysisError::new(format!("integer literal `{value}` at index {index} is out of 32-bit signed range")));
				}
				(PlcObject::Integer(value.clone()), Type::Integer)
			},
			LiteralValue::Decimal(text) => {
				let value = text
					.parse::<bigdecimal::BigDecimal>()
					.map_err(|error| AnalysisError::new(format!("invalid decimal literal `{text}` at index {index}: {error}")))?;
				(PlcObject::Decimal(value), Type::Decimal)
			},
			LiteralValue::Character(value) => (PlcObject::Character(*value), Type::Character),
			LiteralValue::String(value) => (PlcObject::String(value.clone()), Type::String),
		};
		Ok(typed_ast::Expression::Literal { value: object, ty })
	}

	fn analyze_group(&mut self, inner: &ast::Expression) -> AnalysisResult<typed_ast::Expression> {
		if !matches!(inner, ast::Expression::Binary { .. }) {
			return Err(AnalysisError::new("a parenthesized expression must contain a binary expression"));
		}
		let typed_inner = self.analyze_expression(inner)?;
		let ty = typed_inner.ty();
		Ok(typed_ast::Expression::Group { inner: Box::new(typed_inner), ty })
	}

	fn analyze_binary(&mut self, operator: BinaryOperator, left: &ast::Expression, right: &ast::Expression, index: usize) -> AnalysisResult<typed_ast::Expression> {
		let typed_left = self.analyze_expression(left)?;
		let typed_right = self.analyze_expression(right)?;
		let (left_ty, right_ty) = (typed_left.ty(), typed_right.ty());

		let ty = match operator {
			BinaryOperator::And | BinaryOperator::Or => {
				if left_ty != Type::Boolean || right_ty != Type::Boolean {
					return Err(AnalysisError::new(format!("`{operator:?}` at index {index} requires both operands to be Boolean")));
				}
				Type::Boolean
			},
			BinaryOperator::LessThan | BinaryOperator::GreaterThan | BinaryOperator::Equal | BinaryOperator::NotEqual => {
				if left_ty != right_ty || !matches!(left_ty, Type::Integer | Type::Decimal | Type::Character | Type::String) {
					return Err(AnalysisError::new(format!(
						"`{operator:?}` at index {index} requires both operands to be the same comparable type, found {left_ty:?} and {right_ty:?}"
					)));
				}
				Type::Boolean
			},
			BinaryOperator::Add => {
				if left_ty == Type::String || right_ty == Type::String {
					Type::String
				} else if left_ty == right_ty && matches!(left_ty, Type::Integer | Type::Decimal) {
					left_ty
				} else {
					return Err(AnalysisError::new(format!("`+` at index {index} requires matching Integer/Decimal operands or a String operand, found {left_ty:?} and {right_ty:?}")));
				}
			},
			BinaryOperator::Subtract | BinaryOperator::Multiply | BinaryOperator::Divide => {
				if left_ty != right_ty || !matches!(left_ty, Type::Integer | Type::Decimal) {
					return Err(AnalysisError::new(format!(
						"`{operator:?}` at index {index} requires both operands to be the same of Integer or Decimal, found {left_ty:?} and {right_ty:?}"
					)));
				}
				left_ty
			},
			BinaryOperator::Power => {
				if left_ty != Type::Integer || right_ty != Type::Integer {
					return Err(AnalysisError::new(format!("`^` at index {index} requires both operands to be Integer, found {left_ty:?} and {right_ty:?}")));
				}
				Type::Integer
			},
		};

		Ok(typed_ast::Expression::Binary { operator, left: Box::new(typed_left), right: Box::new(typed_right), ty })
	}

	fn analyze_access(&mut self, name: &str, offset: Option<&ast::Expression>) -> AnalysisResult<typed_ast::Expression> {
		let variable = self.scopes.lookup_variable(name).ok_or_else(|| AnalysisError::new(format!("undefined variable `{name}`")))?.clone();

		let typed_offset = offset.map(|offset| self.analyze_expression(offset)).transpose()?;
		if let Some(typed_offset) = &typed_offset {
			if typed_offset.ty() != Type::Integer {
				return Err(AnalysisError::new(format!("list index must be Integer, found {:?}", typed_offset.ty())));
			}
			if variable.ty != Type::IntegerIterable {
				return Err(AnalysisError::new(format!("cannot index into `{name}`, which has type {:?}", variable.ty)));
			}
		}

		let ty = if typed_offset.is_some() { variable.element_type.unwrap_or(Type::Any) } else { variable.ty };

		Ok(typed_ast::Expression::Access { name: name.to_owned(), offset: typed_offset.map(Box::new), ty })
	}

	fn analyze_call(&mut self, name: &str, arguments: &[ast::Expression]) -> AnalysisResult<typed_ast::Expression> {
		let function = self
			.scopes
			.lookup_function(name, arguments.len())
			.ok_or_else(|| AnalysisError::new(format!("undefined function `{name}` with {} argument(s)", arguments.len())))?
			.clone();

		let typed_arguments = arguments.iter().zip(&function.parameter_types).map(|(argument, parameter_type)| {
			let typed = self.analyze_expression(argument)?;
			if !parameter_type.accepts(typed.ty()) {
				return Err(AnalysisError::new(format!("argument to `{name}` has type {:?} but parameter expects {parameter_type:?}", typed.ty())));
			}
			Ok(typed)
		}).collect::<AnalysisResult<Vec<_>>>()?;

		Ok(typed_ast::Expression::Call { name: name.to_owned(), arguments: typed_arguments, ty: function.return_type })
	}

	fn analyze_list(&mut self, values: &[ast::Expression]) -> AnalysisResult<typed_ast::Expression> {
		let typed_values = values.iter().map(|value| self.analyze_expression(value)).collect::<AnalysisResult<Vec<_>>>()?;
		if let Some(first) = typed_values.first() {
			for value in &typed_values[1..] {
				if value.ty() != first.ty() {
					return Err(AnalysisError::new(format!("list elements must share one type, found {:?} and {:?}", first.ty(), value.ty())));
				}
			}
		}
		Ok(typed_ast::Expression::PlcList { values: typed_values, ty: Type::IntegerIterable })
	}
}

/// The statement's variant name, for `trace`-level per-visit logging without
/// pulling in a `Debug` dump of the whole (unbounded) subtree.
const fn statement_kind(statement: &ast::Statement) -> &'static str {
	match statement {
		ast::Statement::Expression(_) => "Expression",
		ast::Statement::Declaration { .. } => "Declaration",
		ast::Statement::Assignment { .. } => "Assignment",
		ast::Statement::If { .. } => "If",
		ast::Statement::Switch { .. } => "Switch",
		ast::Statement::While { .. } => "While",
		ast::Statement::Return { .. } => "Return",
	}
}

/// The expression's variant name, for `trace`-level per-visit logging.
const fn expression_kind(expression: &ast::Expression) -> &'static str {
	match expression {
		ast::Expression::Literal { .. } => "Literal",
		ast::Expression::Group { .. } => "Group",
		ast::Expression::Binary { .. } => "Binary",
		ast::Expression::Access { .. } => "Access",
		ast::Expression::Call { .. } => "Call",
		ast::Expression::PlcList { .. } => "PlcList",
	}
}

fn verify_main(functions: &[typed_ast::Function]) -> AnalysisResult<()> {
	let matches_main = functions.iter().filter(|function| function.name == "main" && function.parameters.is_empty() && function.return_type == Type::Integer).count();
	if matches_main != 1 {
		return Err(AnalysisError::new("a program must contain exactly one function named `main` with zero parameters and return type `Integer`"));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{lexer, parser};

	fn analyze_source(source: &str) -> AnalysisResult<typed_ast::Source> {
		let tokens = lexer::lex(source).unwrap();
		let ast = parser::parse(&tokens).unwrap();
		analyze(&ast)
	}

	#[test]
	fn program_with_main_succeeds() {
		assert!(analyze_source("FUN main(): Integer DO RETURN 0; END").is_ok());
	}

	#[test]
	fn program_without_main_fails() {
		assert!(analyze_source("FUN f(): Integer DO RETURN 0; END").is_err());
	}

	#[test]
	fn main_with_wrong_return_type_fails() {
		assert!(analyze_source("FUN main(): Decimal DO RETURN 0.0; END").is_err());
	}

	#[test]
	fn type_annotation_completeness() {
		let source = analyze_source("FUN main(): Integer DO LET x: Integer = 1 + 2 * 3; RETURN x; END").unwrap();
		let typed_ast::Statement::Declaration { value: Some(value), .. } = &source.functions[0].statements[0] else {
			panic!("expected a declaration");
		};
		assert_eq!(value.ty(), Type::Integer);
	}

	#[test]
	fn assignment_to_immutable_global_fails() {
		assert!(analyze_source("VAL x: Integer = 1; FUN main(): Integer DO x = 2; RETURN 0; END").is_err());
	}

	#[test]
	fn expression_statement_must_be_a_call() {
		assert!(analyze_source("FUN main(): Integer DO 1 + 1; RETURN 0; END").is_err());
	}

	#[test]
	fn switch_default_must_be_last() {
		let source = "FUN main(): Integer DO SWITCH 1 DEFAULT: RETURN 0; CASE 1: RETURN 1; END RETURN 0; END";
		assert!(analyze_source(source).is_err());
	}

	#[test]
	fn out_of_range_integer_literal_fails() {
		assert!(analyze_source("FUN main(): Integer DO RETURN 99999999999; END").is_err());
	}
}
