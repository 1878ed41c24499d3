//! Whole-pipeline integration tests, one per concrete scenario.

use num_bigint::BigInt;
use plc::ast;
use plc::object::PlcObject;
use plc::{analyzer, lexer, parser};

fn run(source: &str) -> plc::PlcResult<PlcObject> {
	plc::run(source)
}

#[test]
fn regex_email_scenario() {
	assert!(plc::regex_exercises::email().is_match("thelegend27@gmail.com"));
	assert!(!plc::regex_exercises::email().is_match("toplvl@domain.io"));
	assert!(!plc::regex_exercises::email().is_match("t@gmail.com"));
}

#[test]
fn lexer_scenario() {
	let tokens = lexer::lex("-123.456").unwrap();
	assert_eq!(tokens.len(), 1);
	assert_eq!(tokens[0].literal, "-123.456");
	assert_eq!(tokens[0].token_type, lexer::TokenType::Decimal);

	let tokens = lexer::lex("-").unwrap();
	assert_eq!(tokens.len(), 1);
	assert_eq!(tokens[0].token_type, lexer::TokenType::Operator);
	assert_eq!(tokens[0].literal, "-");

	assert!(lexer::lex("01").is_err());
}

#[test]
fn parser_scenario() {
	let tokens = lexer::lex("FUN main(): Integer DO LET x: Integer = 1 + 2 * 3; RETURN x; END").unwrap();
	let source = parser::parse(&tokens).unwrap();
	let ast::Statement::Declaration { name, type_name, value, .. } = &source.functions[0].statements[0] else {
		panic!("expected a Declaration statement");
	};
	assert_eq!(name, "x");
	assert_eq!(type_name.as_deref(), Some("Integer"));

	let Some(ast::Expression::Binary { operator: ast::BinaryOperator::Add, left, right, .. }) = value else {
		panic!("expected a top-level Add expression");
	};
	assert!(matches!(**left, ast::Expression::Literal { value: ast::LiteralValue::Integer(ref n), .. } if *n == BigInt::from(1)));
	assert!(matches!(**right, ast::Expression::Binary { operator: ast::BinaryOperator::Multiply, .. }));
}

#[test]
fn analyzer_main_contract_scenario() {
	let tokens = lexer::lex("FUN main(): Integer DO RETURN 0; END").unwrap();
	let source = parser::parse(&tokens).unwrap();
	assert!(analyzer::analyze(&source).is_ok());

	let tokens = lexer::lex("FUN other(): Integer DO RETURN 0; END").unwrap();
	let source = parser::parse(&tokens).unwrap();
	assert!(analyzer::analyze(&source).is_err());

	let tokens = lexer::lex("FUN main(): Decimal DO RETURN 0.0; END").unwrap();
	let source = parser::parse(&tokens).unwrap();
	assert!(analyzer::analyze(&source).is_err());
}

#[test]
fn interpreter_while_loop_scenario() {
	let result = run(
		"FUN main(): Integer DO
		   LET x: Integer = 0;
		   WHILE x < 3 DO x = x + 1; END
		   print(x);
		   RETURN x;
		 END",
	)
	.unwrap();
	assert_eq!(result, PlcObject::Integer(BigInt::from(3)));
}

#[test]
fn interpreter_short_circuit_and_never_evaluates_right() {
	let result = run(
		"LIST marker::Integer = [0];
		 FUN noisy(): Boolean DO marker[0] = 1; RETURN TRUE; END
		 FUN main(): Integer DO
		   IF FALSE && noisy() DO RETURN 1; END
		   RETURN marker[0];
		 END",
	)
	.unwrap();
	assert_eq!(result, PlcObject::Integer(BigInt::from(0)));
}

#[test]
fn interpreter_short_circuit_or_never_evaluates_right() {
	let result = run(
		"LIST marker::Integer = [0];
		 FUN noisy(): Boolean DO marker[0] = 1; RETURN TRUE; END
		 FUN main(): Integer DO
		   IF TRUE || noisy() DO RETURN marker[0]; END
		   RETURN 9;
		 END",
	)
	.unwrap();
	assert_eq!(result, PlcObject::Integer(BigInt::from(0)));
}
