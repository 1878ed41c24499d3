//! Tree-walking evaluator: walks the analyzer's [`typed_ast`] and produces
//! runtime [`PlcObject`] values, mutating its own scope tree and performing
//! I/O through built-in functions.
//!
//! `Return` is not modeled as an exception: [`Flow::Returned`] is threaded
//! back up through every statement-executing function and only unwrapped at
//! the enclosing function call, per the spec's explicit instruction not to
//! emulate exceptions for non-local control flow.

use std::rc::Rc;

use bigdecimal::{BigDecimal, RoundingMode};
use log::trace;
use num_bigint::{BigInt, Sign};

use crate::builtin;
use crate::error::{RuntimeError, RuntimeResult};
use crate::object::PlcObject;
use crate::scope::ScopeArena;
use crate::typed_ast;

/// What the Interpreter's scope tree records about a variable: its current
/// value and whether it may be reassigned.
struct RuntimeVariable {
	value: PlcObject,
	mutable: bool,
}

/// What the Interpreter's scope tree records about a function.
#[derive(Clone)]
enum RuntimeFunction {
	/// A built-in, implemented directly in this crate.
	Builtin(builtin::Implementation),
	/// A user-defined function from the analyzed source.
	User(Rc<typed_ast::Function>),
}

/// The outcome of executing a statement or statement list: either control
/// falls off the end normally, or a `RETURN` unwound through it carrying a
/// value up to the enclosing function call.
enum Flow {
	Normal,
	Returned(PlcObject),
}

struct Interpreter {
	scopes: ScopeArena<RuntimeVariable, RuntimeFunction>,
}

/// Runs a fully analyzed program: defines its globals, registers its
/// functions, and calls `main` with no arguments.
pub fn interpret(source: &typed_ast::Source) -> RuntimeResult<PlcObject> {
	let mut interpreter = Interpreter { scopes: ScopeArena::new() };
	interpreter.register_builtins();
	interpreter.eval_globals(&source.globals)?;
	interpreter.register_functions(&source.functions);
	interpreter.run_main()
}

impl Interpreter {
	fn register_builtins(&mut self) {
		for (name, implementation) in &builtin::IMPLEMENTATIONS {
			let arity = builtin::SIGNATURES.get(name).map_or(0, |signature| signature.parameter_types.len());
			self.scopes.define_function((*name).to_owned(), arity, RuntimeFunction::Builtin(*implementation));
		}
	}

	fn eval_globals(&mut self, globals: &[typed_ast::Global]) -> RuntimeResult<()> {
		for global in globals {
			let value = global.value.as_ref().map(|value| self.eval_expression(value)).transpose()?.unwrap_or(PlcObject::NIL);
			self.scopes.define_variable(global.name.clone(), RuntimeVariable { value, mutable: global.mutable });
		}
		Ok(())
	}

	fn register_functions(&mut self, functions: &[typed_ast::Function]) {
		for function in functions {
			let arity = function.arity();
			self.scopes.define_function(function.name.clone(), arity, RuntimeFunction::User(Rc::new(function.clone())));
		}
	}

	fn run_main(&mut self) -> RuntimeResult<PlcObject> {
		let main = self.scopes.lookup_function("main", 0).cloned().ok_or_else(|| RuntimeError::new("no `main/0` function found"))?;
		let RuntimeFunction::User(main) = main else {
			return Err(RuntimeError::new("`main` must not be a built-in"));
		};
		self.call_user_function(&main, Vec::new())
	}

	fn call_user_function(&mut self, function: &typed_ast::Function, arguments: Vec<PlcObject>) -> RuntimeResult<PlcObject> {
		let parent = self.scopes.enter_child();
		for ((name, _ty), value) in function.parameters.iter().zip(arguments) {
			self.scopes.define_variable(name.clone(), RuntimeVariable { value, mutable: true });
		}

		let result = self.exec_statements(&function.statements);
		self.scopes.exit(parent);

		match result? {
			Flow::Returned(value) => Ok(value),
			Flow::Normal => Ok(PlcObject::NIL),
		}
	}

	/// Executes a statement list in a fresh child scope, restoring the
	/// parent scope on every exit path including an early error return.
	fn exec_scoped_block(&mut self, statements: &[typed_ast::Statement]) -> RuntimeResult<Flow> {
		let parent = self.scopes.enter_child();
		let result = self.exec_statements(statements);
		self.scopes.exit(parent);
		result
	}

	/// Executes a statement list in the *current* scope, stopping as soon
	/// as one of them returns.
	fn exec_statements(&mut self, statements: &[typed_ast::Statement]) -> RuntimeResult<Flow> {
		for statement in statements {
			if let Flow::Returned(value) = self.exec_statement(statement)? {
				return Ok(Flow::Returned(value));
			}
		}
		Ok(Flow::Normal)
	}

	fn exec_statement(&mut self, statement: &typed_ast::Statement) -> RuntimeResult<Flow> {
		trace!("interpreter: executing {} statement", statement_kind(statement));
		match statement {
			typed_ast::Statement::Expression(expr) => {
				self.eval_expression(expr)?;
				Ok(Flow::Normal)
			},
			typed_ast::Statement::Declaration { name, value, .. } => {
				let value = value.as_ref().map(|value| self.eval_expression(value)).transpose()?.unwrap_or(PlcObject::NIL);
				self.scopes.define_variable(name.clone(), RuntimeVariable { value, mutable: true });
				Ok(Flow::Normal)
			},
			typed_ast::Statement::Assignment { receiver, value } => {
				self.exec_assignment(receiver, value)?;
				Ok(Flow::Normal)
			},
			typed_ast::Statement::If { condition, then_block, else_block } => {
				if self.eval_bool(condition)? {
					self.exec_scoped_block(then_block)
				} else if let Some(else_block) = else_block {
					self.exec_scoped_block(else_block)
				} else {
					Ok(Flow::Normal)
				}
			},
			typed_ast::Statement::Switch { condition, cases } => self.exec_switch(condition, cases),
			typed_ast::Statement::While { condition, statements } => self.exec_while(condition, statements),
			typed_ast::Statement::Return { value } => Ok(Flow::Returned(self.eval_expression(value)?)),
		}
	}

	fn exec_assignment(&mut self, receiver: &typed_ast::Expression, value: &typed_ast::Expression) -> RuntimeResult<()> {
		let typed_ast::Expression::Access { name, offset, .. } = receiver else {
			return Err(RuntimeError::new("assignment target must be a variable or list access"));
		};

		if !self.scopes.lookup_variable(name).is_some_and(|variable| variable.mutable) {
			return Err(RuntimeError::new(format!("cannot assign to immutable variable `{name}`")));
		}

		let new_value = self.eval_expression(value)?;

		match offset {
			None => {
				self.scopes.lookup_variable_mut(name).ok_or_else(|| RuntimeError::new(format!("undefined variable `{name}`")))?.value = new_value;
			},
			Some(offset) => {
				let index = self.eval_index(offset)?;
				let current = &self.scopes.lookup_variable(name).ok_or_else(|| RuntimeError::new(format!("undefined variable `{name}`")))?.value;
				let PlcObject::List(handle) = current else {
					return Err(RuntimeError::new(format!("`{name}` is not a list")));
				};
				let mut elements = handle.borrow_mut();
				let slot = elements.get_mut(index).ok_or_else(|| RuntimeError::new(format!("index {index} out of bounds for list `{name}`")))?;
				*slot = new_value;
			},
		}
		Ok(())
	}

	fn exec_while(&mut self, condition: &typed_ast::Expression, statements: &[typed_ast::Statement]) -> RuntimeResult<Flow> {
		while self.eval_bool(condition)? {
			if let Flow::Returned(value) = self.exec_scoped_block(statements)? {
				return Ok(Flow::Returned(value));
			}
		}
		Ok(Flow::Normal)
	}

	fn exec_switch(&mut self, condition: &typed_ast::Expression, cases: &[typed_ast::Case]) -> RuntimeResult<Flow> {
		let scrutinee = self.eval_expression(condition)?;
		for case in cases {
			let matches = match &case.value {
				Some(value_expr) => self.eval_expression(value_expr)? == scrutinee,
				None => true,
			};
			if matches {
				return self.exec_scoped_block(&case.statements);
			}
		}
		Ok(Flow::Normal)
	}

	fn eval_bool(&mut self, expression: &typed_ast::Expression) -> RuntimeResult<bool> {
		match self.eval_expression(expression)? {
			PlcObject::Boolean(value) => Ok(value),
			other => Err(RuntimeError::new(format!("expected a Boolean, found {other}"))),
		}
	}

	fn eval_index(&mut self, expression: &typed_ast::Expression) -> RuntimeResult<usize> {
		match self.eval_expression(expression)? {
			PlcObject::Integer(value) => bigint_to_usize(&value, "list index"),
			other => Err(RuntimeError::new(format!("expected an Integer index, found {other}"))),
		}
	}

	fn eval_expression(&mut self, expression: &typed_ast::Expression) -> RuntimeResult<PlcObject> {
		match expression {
			typed_ast::Expression::Literal { value, .. } => Ok(value.clone()),
			typed_ast::Expression::Group { inner, .. } => self.eval_expression(inner),
			typed_ast::Expression::Binary { operator, left, right, .. } => self.eval_binary(*operator, left, right),
			typed_ast::Expression::Access { name, offset, .. } => self.eval_access(name, offset.as_deref()),
			typed_ast::Expression::Call { name, arguments, .. } => self.eval_call(name, arguments),
			typed_ast::Expression::PlcList { values, .. } => {
				let elements = values.iter().map(|value| self.eval_expression(value)).collect::<RuntimeResult<Vec<_>>>()?;
				Ok(PlcObject::new_list(elements))
			},
		}
	}

	fn eval_access(&mut self, name: &str, offset: Option<&typed_ast::Expression>) -> RuntimeResult<PlcObject> {
		match offset {
			None => Ok(self.scopes.lookup_variable(name).ok_or_else(|| RuntimeError::new(format!("undefined variable `{name}`")))?.value.clone()),
			Some(offset) => {
				let index = self.eval_index(offset)?;
				let variable = self.scopes.lookup_variable(name).ok_or_else(|| RuntimeError::new(format!("undefined variable `{name}`")))?;
				let PlcObject::List(handle) = &variable.value else {
					return Err(RuntimeError::new(format!("`{name}` is not a list")));
				};
				let elements = handle.borrow();
				elements.get(index).cloned().ok_or_else(|| RuntimeError::new(format!("index {index} out of bounds for list `{name}`")))
			},
		}
	}

	fn eval_call(&mut self, name: &str, arguments: &[typed_ast::Expression]) -> RuntimeResult<PlcObject> {
		let values = arguments.iter().map(|argument| self.eval_expression(argument)).collect::<RuntimeResult<Vec<_>>>()?;
		let function =
			self.scopes.lookup_function(name, arguments.len()).cloned().ok_or_else(|| RuntimeError::new(format!("undefined function `{name}`")))?;
		match function {
			RuntimeFunction::Builtin(implementation) => implementation(&values),
			RuntimeFunction::User(function) => self.call_user_function(&function, values),
		}
	}

	fn eval_binary(&mut self, operator: crate::ast::BinaryOperator, left: &typed_ast::Expression, right: &typed_ast::Expression) -> RuntimeResult<PlcObject> {
		use crate::ast::BinaryOperator as Op;

		match operator {
			Op::And => {
				if !self.eval_bool(left)? {
					return Ok(PlcObject::Boolean(false));
				}
				Ok(PlcObject::Boolean(self.eval_bool(right)?))
			},
			Op::Or => {
				if self.eval_bool(left)? {
					return Ok(PlcObject::Boolean(true));
				}
				Ok(PlcObject::Boolean(self.eval_bool(right)?))
			},
			Op::Equal => Ok(PlcObject::Boolean(self.eval_expression(left)? == self.eval_expression(right)?)),
			Op::NotEqual => Ok(PlcObject::Boolean(self.eval_expression(left)? != self.eval_expression(right)?)),
			Op::LessThan => {
				let (left, right) = (self.eval_expression(left)?, self.eval_expression(right)?);
				Ok(PlcObject::Boolean(compare(&left, &right)?.is_lt()))
			},
			Op::GreaterThan => {
				let (left, right) = (self.eval_expression(left)?, self.eval_expression(right)?);
				Ok(PlcObject::Boolean(compare(&left, &right)?.is_gt()))
			},
			Op::Add => {
				let (left, right) = (self.eval_expression(left)?, self.eval_expression(right)?);
				match (left, right) {
					(PlcObject::String(left), right) => Ok(PlcObject::String(left + &right.to_string())),
					(left, PlcObject::String(right)) => Ok(PlcObject::String(left.to_string() + &right)),
					(PlcObject::Integer(left), PlcObject::Integer(right)) => Ok(PlcObject::Integer(left + right)),
					(PlcObject::Decimal(left), PlcObject::Decimal(right)) => Ok(PlcObject::Decimal(left + right)),
					(left, right) => Err(RuntimeError::new(format!("cannot add {left} and {right}"))),
				}
			},
			Op::Subtract => {
				let (left, right) = (self.eval_expression(left)?, self.eval_expression(right)?);
				match (left, right) {
					(PlcObject::Integer(left), PlcObject::Integer(right)) => Ok(PlcObject::Integer(left - right)),
					(PlcObject::Decimal(left), PlcObject::Decimal(right)) => Ok(PlcObject::Decimal(left - right)),
					(left, right) => Err(RuntimeError::new(format!("cannot subtract {right} from {left}"))),
				}
			},
			Op::Multiply => {
				let (left, right) = (self.eval_expression(left)?, self.eval_expression(right)?);
				match (left, right) {
					(PlcObject::Integer(left), PlcObject::Integer(right)) => Ok(PlcObject::Integer(left * right)),
					(PlcObject::Decimal(left), PlcObject::Decimal(right)) => Ok(PlcObject::Decimal(left * right)),
					(left, right) => Err(RuntimeError::new(format!("cannot multiply {left} and {right}"))),
				}
			},
			Op::Divide => {
				let (left, right) = (self.eval_expression(left)?, self.eval_expression(right)?);
				match (left, right) {
					(PlcObject::Integer(left), PlcObject::Integer(right)) => {
						if right == BigInt::from(0) {
							return Err(RuntimeError::new("division by zero"));
						}
						Ok(PlcObject::Integer(left / right))
					},
					(PlcObject::Decimal(left), PlcObject::Decimal(right)) => Ok(PlcObject::Decimal(divide_decimal(left, right)?)),
					(left, right) => Err(RuntimeError::new(format!("cannot divide {left} by {right}"))),
				}
			},
			Op::Power => {
				let (left, right) = (self.eval_expression(left)?, self.eval_expression(right)?);
				match (left, right) {
					(PlcObject::Integer(base), PlcObject::Integer(exponent)) => {
						let exponent = bigint_to_exponent(&exponent)?;
						Ok(PlcObject::Integer(bigint_pow(&base, exponent)))
					},
					(left, right) => Err(RuntimeError::new(format!("cannot raise {left} to the power of {right}"))),
				}
			},
		}
	}
}

/// The statement's variant name, for `trace`-level per-statement logging
/// without a `Debug` dump of the whole (unbounded) subtree.
const fn statement_kind(statement: &typed_ast::Statement) -> &'static str {
	match statement {
		typed_ast::Statement::Expression(_) => "Expression",
		typed_ast::Statement::Declaration { .. } => "Declaration",
		typed_ast::Statement::Assignment { .. } => "Assignment",
		typed_ast::Statement::If { .. } => "If",
		typed_ast::Statement::Switch { .. } => "Switch",
		typed_ast::Statement::While { .. } => "While",
		typed_ast::Statement::Return { .. } => "Return",
	}
}

fn compare(left: &PlcObject, right: &PlcObject) -> RuntimeResult<std::cmp::Ordering> {
	match (left, right) {
		(PlcObject::Integer(left), PlcObject::Integer(right)) => Ok(left.cmp(right)),
		(PlcObject::Decimal(left), PlcObject::Decimal(right)) => Ok(left.cmp(right)),
		(PlcObject::Character(left), PlcObject::Character(right)) => Ok(left.cmp(right)),
		(PlcObject::String(left), PlcObject::String(right)) => Ok(left.cmp(right)),
		(left, right) => Err(RuntimeError::new(format!("cannot compare {left} and {right}"))),
	}
}

/// Divides two decimals with HALF_EVEN rounding, to a scale wide enough to
/// hold the more precise of the two operands.
fn divide_decimal(left: BigDecimal, right: BigDecimal) -> RuntimeResult<BigDecimal> {
	if right == BigDecimal::from(0) {
		return Err(RuntimeError::new("division by zero"));
	}
	let scale = left.fractional_digit_count().max(right.fractional_digit_count()).max(0);
	Ok((left / right).with_scale_round(scale, RoundingMode::HalfEven))
}

/// Converts a non-negative [`BigInt`] to a [`usize`], used for list indices.
fn bigint_to_usize(value: &BigInt, context: &str) -> RuntimeResult<usize> {
	if value.sign() == Sign::Minus {
		return Err(RuntimeError::new(format!("{context} must not be negative")));
	}
	value.to_str_radix(10).parse::<usize>().map_err(|_| RuntimeError::new(format!("{context} is out of range")))
}

/// Converts a [`BigInt`] exponent to a [`u32`] for [`bigint_pow`], requiring
/// it to fit the 32-bit signed range and be non-negative.
fn bigint_to_exponent(value: &BigInt) -> RuntimeResult<u32> {
	let parsed = value.to_str_radix(10).parse::<i32>().map_err(|_| RuntimeError::new("exponent does not fit in a 32-bit signed integer"))?;
	u32::try_from(parsed).map_err(|_| RuntimeError::new("exponent must not be negative"))
}

/// Arbitrary-precision integer exponentiation by repeated squaring.
fn bigint_pow(base: &BigInt, exponent: u32) -> BigInt {
	let mut result = BigInt::from(1);
	let mut squared_base = base.clone();
	let mut remaining_exponent = exponent;
	while remaining_exponent > 0 {
		if remaining_exponent & 1 == 1 {
			result *= &squared_base;
		}
		squared_base = &squared_base * &squared_base;
		remaining_exponent >>= 1;
	}
	result
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{analyzer, lexer, parser};

	fn run(source: &str) -> PlcObject {
		let tokens = lexer::lex(source).unwrap();
		let ast = parser::parse(&tokens).unwrap();
		let typed = analyzer::analyze(&ast).unwrap();
		interpret(&typed).unwrap()
	}

	#[test]
	fn while_loop_prints_and_returns() {
		let result = run(
			"FUN main(): Integer DO LET x: Integer = 0; WHILE x < 3 DO x = x + 1; END print(x); RETURN x; END",
		);
		assert_eq!(result, PlcObject::Integer(BigInt::from(3)));
	}

	#[test]
	fn and_short_circuits() {
		let result = run(
			"LIST marker::Integer = [0];
			 FUN noisy(): Boolean DO marker[0] = 1; RETURN TRUE; END
			 FUN main(): Integer DO
			   IF FALSE && noisy() DO RETURN 1; END
			   RETURN marker[0];
			 END",
		);
		assert_eq!(result, PlcObject::Integer(BigInt::from(0)));
	}

	#[test]
	fn division_by_zero_errors() {
		let tokens = lexer::lex("FUN main(): Integer DO RETURN 1 / 0; END").unwrap();
		let ast = parser::parse(&tokens).unwrap();
		let typed = analyzer::analyze(&ast).unwrap();
		assert!(interpret(&typed).is_err());
	}

	#[test]
	fn list_indexing_reads_and_writes() {
		let result = run("LIST xs::Integer = [1, 2, 3]; FUN main(): Integer DO xs[0] = 9; RETURN xs[0]; END");
		assert_eq!(result, PlcObject::Integer(BigInt::from(9)));
	}

	#[test]
	fn out_of_bounds_index_errors() {
		let tokens = lexer::lex("LIST xs::Integer = [1]; FUN main(): Integer DO RETURN xs[5]; END").unwrap();
		let ast = parser::parse(&tokens).unwrap();
		let typed = analyzer::analyze(&ast).unwrap();
		assert!(interpret(&typed).is_err());
	}

	#[test]
	fn recursive_function_call_works() {
		let result = run(
			"FUN fact(n: Integer): Integer DO IF n == 0 DO RETURN 1; END RETURN n * fact(n - 1); END FUN main(): Integer DO RETURN fact(5); END",
		);
		assert_eq!(result, PlcObject::Integer(BigInt::from(120)));
	}

	#[test]
	fn switch_falls_to_default() {
		let result = run("FUN main(): Integer DO SWITCH 9 CASE 1: RETURN 1; DEFAULT: RETURN 2; END RETURN 0; END");
		assert_eq!(result, PlcObject::Integer(BigInt::from(2)));
	}
}
