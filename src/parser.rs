//! Recursive-descent parser: turns a flat token sequence into an
//! [`ast::Source`](crate::ast::Source).
//!
//! Single-token lookahead throughout. `peek_keyword`/`peek_operator` test the
//! next token's literal text without consuming it; `expect_*` consumes on a
//! successful match and errors (carrying the offending token's index)
//! otherwise. Grounded on the teacher's `Parse`/`TokenQueue` trait split
//! (`parser/mod.rs`), adapted from a `VecDeque`-based queue to a plain cursor
//! over a `&[Token]` slice since this grammar has no need to splice tokens
//! back in mid-parse.

use num_bigint::BigInt;

use crate::ast::{BinaryOperator, Case, Expression, Function, Global, LiteralValue, Source, Statement};
use crate::error::{ParseError, ParseResult};
use crate::lexer::{RESERVED_KEYWORDS, Token, TokenType};

/// A cursor over a token slice, tracking the next unconsumed token's index.
struct TokenCursor<'tokens> {
	tokens: &'tokens [Token],
	position: usize,
}

impl<'tokens> TokenCursor<'tokens> {
	const fn new(tokens: &'tokens [Token]) -> Self {
		Self { tokens, position: 0 }
	}

	fn peek(&self) -> Option<&Token> {
		self.tokens.get(self.position)
	}

	/// The character index to report an error at if the next token is
	/// missing or wrong: the next token's index, or the end of the source
	/// (one past the last token) if there isn't one.
	fn error_index(&self) -> usize {
		self.peek().map_or_else(
			|| self.tokens.last().map_or(0, |token| token.index + token.literal.chars().count()),
			|token| token.index,
		)
	}

	fn advance(&mut self) -> Option<&'tokens Token> {
		let token = self.tokens.get(self.position)?;
		self.position += 1;
		Some(token)
	}

	fn peek_is_type(&self, token_type: TokenType) -> bool {
		self.peek().is_some_and(|token| token.token_type == token_type)
	}

	/// Whether the next token is an identifier-typed token with this exact
	/// literal text. Used to match reserved keywords, which the lexer
	/// tokenizes as plain `Identifier`s.
	fn peek_keyword(&self, keyword: &str) -> bool {
		self.peek().is_some_and(|token| token.token_type == TokenType::Identifier && token.literal == keyword)
	}

	fn peek_operator(&self, operator: &str) -> bool {
		self.peek().is_some_and(|token| token.token_type == TokenType::Operator && token.literal == operator)
	}

	fn peek_one_of_operators(&self, operators: &[&str]) -> Option<String> {
		let token = self.peek()?;
		(token.token_type == TokenType::Operator && operators.contains(&token.literal.as_str())).then(|| token.literal.clone())
	}

	fn expect_keyword(&mut self, keyword: &str) -> ParseResult<()> {
		if self.peek_keyword(keyword) {
			self.advance();
			Ok(())
		} else {
			Err(ParseError::new(self.error_index(), format!("expected `{keyword}`")))
		}
	}

	fn expect_operator(&mut self, operator: &str) -> ParseResult<()> {
		if self.peek_operator(operator) {
			self.advance();
			Ok(())
		} else {
			Err(ParseError::new(self.error_index(), format!("expected `{operator}`")))
		}
	}

	/// Consumes an identifier token and returns its literal text. Rejects
	/// reserved keywords that happen to be spelled like one, the same as
	/// the grammar's `id` production implicitly does by virtue of keywords
	/// always being consumed through `expect_keyword` first.
	fn expect_identifier(&mut self) -> ParseResult<String> {
		match self.peek() {
			Some(token) if token.token_type == TokenType::Identifier => {
				let literal = token.literal.clone();
				self.advance();
				Ok(literal)
			},
			_ => Err(ParseError::new(self.error_index(), "expected an identifier")),
		}
	}
}

/// Parses a full token sequence into a [`Source`].
pub fn parse(tokens: &[Token]) -> ParseResult<Source> {
	let mut cursor = TokenCursor::new(tokens);
	let source = parse_source(&mut cursor)?;
	if cursor.peek().is_some() {
		return Err(ParseError::new(cursor.error_index(), "unexpected trailing tokens after the last function"));
	}
	Ok(source)
}

fn is_block_terminator(cursor: &TokenCursor<'_>) -> bool {
	["END", "ELSE", "CASE", "DEFAULT"].iter().any(|keyword| cursor.peek_keyword(keyword))
}

fn parse_source(cursor: &mut TokenCursor<'_>) -> ParseResult<Source> {
	let mut globals = Vec::new();
	while cursor.peek_keyword("LIST") || cursor.peek_keyword("VAR") || cursor.peek_keyword("VAL") {
		globals.push(parse_global(cursor)?);
	}

	let mut functions = Vec::new();
	while cursor.peek_keyword("FUN") {
		functions.push(parse_function(cursor)?);
	}

	Ok(Source { globals, functions })
}

fn parse_global(cursor: &mut TokenCursor<'_>) -> ParseResult<Global> {
	let index = cursor.peek().map_or(0, |token| token.index);

	if cursor.peek_keyword("LIST") {
		cursor.advance();
		let name = cursor.expect_identifier()?;
		cursor.expect_operator(":")?;
		cursor.expect_operator(":")?;
		let type_name = cursor.expect_identifier()?;
		cursor.expect_operator("=")?;
		cursor.expect_operator("[")?;
		let mut values = Vec::new();
		if !cursor.peek_operator("]") {
			values.push(parse_expression(cursor)?);
			while cursor.peek_operator(",") {
				cursor.advance();
				values.push(parse_expression(cursor)?);
			}
		}
		cursor.expect_operator("]")?;
		cursor.expect_operator(";")?;
		return Ok(Global { name, type_name, mutable: true, value: Some(Expression::PlcList { values, index }), index });
	}

	let mutable = if cursor.peek_keyword("VAR") {
		cursor.advance();
		true
	} else {
		cursor.expect_keyword("VAL")?;
		false
	};

	let name = cursor.expect_identifier()?;
	cursor.expect_operator(":")?;
	let type_name = cursor.expect_identifier()?;

	let value = if cursor.peek_operator("=") {
		cursor.advance();
		Some(parse_expression(cursor)?)
	} else {
		None
	};
	if !mutable && value.is_none() {
		return Err(ParseError::new(index, "a `VAL` global must have an initializer"));
	}
	cursor.expect_operator(";")?;

	Ok(Global { name, type_name, mutable, value, index })
}

fn parse_function(cursor: &mut TokenCursor<'_>) -> ParseResult<Function> {
	let index = cursor.peek().map_or(0, |token| token.index);
	cursor.expect_keyword("FUN")?;
	let name = cursor.expect_identifier()?;
	cursor.expect_operator("(")?;

	let mut parameters = Vec::new();
	let mut parameter_type_names = Vec::new();
	if !cursor.peek_operator(")") {
		loop {
			parameters.push(cursor.expect_identifier()?);
			cursor.expect_operator(":")?;
			parameter_type_names.push(cursor.expect_identifier()?);
			if cursor.peek_operator(",") {
				cursor.advance();
				continue;
			}
			break;
		}
	}
	cursor.expect_operator(")")?;

	let return_type_name = if cursor.peek_operator(":") {
		cursor.advance();
		cursor.expect_identifier()?
	} else {
		"Any".to_owned()
	};

	cursor.expect_keyword("DO")?;
	let statements = parse_block(cursor)?;
	cursor.expect_keyword("END")?;

	Ok(Function { name, parameters, parameter_type_names, return_type_name, statements, index })
}

fn parse_block(cursor: &mut TokenCursor<'_>) -> ParseResult<Vec<Statement>> {
	let mut statements = Vec::new();
	while !is_block_terminator(cursor) && cursor.peek().is_some() {
		statements.push(parse_statement(cursor)?);
	}
	Ok(statements)
}

fn parse_statement(cursor: &mut TokenCursor<'_>) -> ParseResult<Statement> {
	if cursor.peek_keyword("LET") {
		return parse_declaration(cursor);
	}
	if cursor.peek_keyword("SWITCH") {
		return parse_switch(cursor);
	}
	if cursor.peek_keyword("IF") {
		return parse_if(cursor);
	}
	if cursor.peek_keyword("WHILE") {
		return parse_while(cursor);
	}
	if cursor.peek_keyword("RETURN") {
		let index = cursor.peek().map_or(0, |token| token.index);
		cursor.advance();
		let value = parse_expression(cursor)?;
		cursor.expect_operator(";")?;
		return Ok(Statement::Return { value, index });
	}

	let index = cursor.peek().map_or(0, |token| token.index);
	let expr = parse_expression(cursor)?;
	if cursor.peek_operator("=") {
		cursor.advance();
		let value = parse_expression(cursor)?;
		cursor.expect_operator(";")?;
		return Ok(Statement::Assignment { receiver: expr, value, index });
	}
	cursor.expect_operator(";")?;
	Ok(Statement::Expression(expr))
}

fn parse_declaration(cursor: &mut TokenCursor<'_>) -> ParseResult<Statement> {
	let index = cursor.peek().map_or(0, |token| token.index);
	cursor.expect_keyword("LET")?;
	let name = cursor.expect_identifier()?;

	let type_name = if cursor.peek_operator(":") {
		cursor.advance();
		Some(cursor.expect_identifier()?)
	} else {
		None
	};

	let value = if cursor.peek_operator("=") {
		cursor.advance();
		Some(parse_expression(cursor)?)
	} else {
		None
	};

	cursor.expect_operator(";")?;
	Ok(Statement::Declaration { name, type_name, value, index })
}

fn parse_if(cursor: &mut TokenCursor<'_>) -> ParseResult<Statement> {
	let index = cursor.peek().map_or(0, |token| token.index);
	cursor.expect_keyword("IF")?;
	let condition = parse_expression(cursor)?;
	cursor.expect_keyword("DO")?;
	let then_block = parse_block(cursor)?;

	let else_block = if cursor.peek_keyword("ELSE") {
		cursor.advance();
		Some(parse_block(cursor)?)
	} else {
		None
	};

	cursor.expect_keyword("END")?;
	Ok(Statement::If { condition, then_block, else_block, index })
}

fn parse_while(cursor: &mut TokenCursor<'_>) -> ParseResult<Statement> {
	let index = cursor.peek().map_or(0, |token| token.index);
	cursor.expect_keyword("WHILE")?;
	let condition = parse_expression(cursor)?;
	cursor.expect_keyword("DO")?;
	let statements = parse_block(cursor)?;
	cursor.expect_keyword("END")?;
	Ok(Statement::While { condition, statements, index })
}

fn parse_switch(cursor: &mut TokenCursor<'_>) -> ParseResult<Statement> {
	let index = cursor.peek().map_or(0, |token| token.index);
	cursor.expect_keyword("SWITCH")?;
	let condition = parse_expression(cursor)?;

	let mut cases = Vec::new();
	loop {
		if cursor.peek_keyword("CASE") {
			let case_index = cursor.peek().map_or(0, |token| token.index);
			cursor.advance();
			let value = parse_expression(cursor)?;
			cursor.expect_operator(":")?;
			let statements = parse_block(cursor)?;
			cases.push(Case { value: Some(value), statements, index: case_index });
		} else if cursor.peek_keyword("DEFAULT") {
			let case_index = cursor.peek().map_or(0, |token| token.index);
			cursor.advance();
			cursor.expect_operator(":")?;
			let statements = parse_block(cursor)?;
			cases.push(Case { value: None, statements, index: case_index });
		} else {
			break;
		}
	}

	cursor.expect_keyword("END")?;
	Ok(Statement::Switch { condition, cases, index })
}

fn parse_expression(cursor: &mut TokenCursor<'_>) -> ParseResult<Expression> {
	parse_logical(cursor)
}

fn parse_logical(cursor: &mut TokenCursor<'_>) -> ParseResult<Expression> {
	let mut left = parse_compare(cursor)?;
	while let Some(operator) = cursor.peek_one_of_operators(&["&&", "||"]) {
		let index = cursor.peek().map_or(0, |token| token.index);
		cursor.advance();
		let right = parse_compare(cursor)?;
		let operator = if operator == "&&" { BinaryOperator::And } else { BinaryOperator::Or };
		left = Expression::Binary { operator, left: Box::new(left), right: Box::new(right), index };
	}
	Ok(left)
}

fn parse_compare(cursor: &mut TokenCursor<'_>) -> ParseResult<Expression> {
	let mut left = parse_additive(cursor)?;
	while let Some(operator) = cursor.peek_one_of_operators(&["<", ">", "==", "!="]) {
		let index = cursor.peek().map_or(0, |token| token.index);
		cursor.advance();
		let right = parse_additive(cursor)?;
		let operator = match operator.as_str() {
			"<" => BinaryOperator::LessThan,
			">" => BinaryOperator::GreaterThan,
			"==" => BinaryOperator::Equal,
			_ => BinaryOperator::NotEqual,
		};
		left = Expression::Binary { operator, left: Box::new(left), right: Box::new(right), index };
	}
	Ok(left)
}

fn parse_additive(cursor: &mut TokenCursor<'_>) -> ParseResult<Expression> {
	let mut left = parse_multiplicative(cursor)?;
	while let Some(operator) = cursor.peek_one_of_operators(&["+", "-"]) {
		let index = cursor.peek().map_or(0, |token| token.index);
		cursor.advance();
		let right = parse_multiplicative(cursor)?;
		let operator = if operator == "+" { BinaryOperator::Add } else { BinaryOperator::Subtract };
		left = Expression::Binary { operator, left: Box::new(left), right: Box::new(right), index };
	}
	Ok(left)
}

fn parse_multiplicative(cursor: &mut TokenCursor<'_>) -> ParseResult<Expression> {
	let mut left = parse_primary(cursor)?;
	while let Some(operator) = cursor.peek_one_of_operators(&["*", "/", "^"]) {
		let index = cursor.peek().map_or(0, |token| token.index);
		cursor.advance();
		let right = parse_primary(cursor)?;
		let operator = match operator.as_str() {
			"*" => BinaryOperator::Multiply,
			"/" => BinaryOperator::Divide,
			_ => BinaryOperator::Power,
		};
		left = Expression::Binary { operator, left: Box::new(left), right: Box::new(right), index };
	}
	Ok(left)
}

fn parse_primary(cursor: &mut TokenCursor<'_>) -> ParseResult<Expression> {
	let Some(token) = cursor.peek().cloned() else {
		return Err(ParseError::new(cursor.error_index(), "expected an expression but found end of input"));
	};

	if token.token_type == TokenType::Identifier {
		match token.literal.as_str() {
			"NIL" => {
				cursor.advance();
				return Ok(Expression::Literal { value: LiteralValue::Nil, index: token.index });
			},
			"TRUE" => {
				cursor.advance();
				return Ok(Expression::Literal { value: LiteralValue::Boolean(true), index: token.index });
			},
			"FALSE" => {
				cursor.advance();
				return Ok(Expression::Literal { value: LiteralValue::Boolean(false), index: token.index });
			},
			_ => {},
		}
	}

	match token.token_type {
		TokenType::Integer => {
			cursor.advance();
			let value = token.literal.parse::<BigInt>().map_err(|error| ParseError::new(token.index, format!("invalid integer literal: {error}")))?;
			Ok(Expression::Literal { value: LiteralValue::Integer(value), index: token.index })
		},
		TokenType::Decimal => {
			cursor.advance();
			Ok(Expression::Literal { value: LiteralValue::Decimal(token.literal.clone()), index: token.index })
		},
		TokenType::Character => {
			cursor.advance();
			let value = unescape_character(&token)?;
			Ok(Expression::Literal { value: LiteralValue::Character(value), index: token.index })
		},
		TokenType::String => {
			cursor.advance();
			let value = unescape_string(&token)?;
			Ok(Expression::Literal { value: LiteralValue::String(value), index: token.index })
		},
		TokenType::Operator if token.literal == "(" => {
			cursor.advance();
			let inner = parse_expression(cursor)?;
			cursor.expect_operator(")")?;
			Ok(Expression::Group { inner: Box::new(inner), index: token.index })
		},
		TokenType::Operator if token.literal == "[" => {
			cursor.advance();
			let mut values = Vec::new();
			if !cursor.peek_operator("]") {
				values.push(parse_expression(cursor)?);
				while cursor.peek_operator(",") {
					cursor.advance();
					values.push(parse_expression(cursor)?);
				}
			}
			cursor.expect_operator("]")?;
			Ok(Expression::PlcList { values, index: token.index })
		},
		TokenType::Identifier if !RESERVED_KEYWORDS.contains(token.literal.as_str()) => {
			cursor.advance();
			let name = token.literal.clone();

			if cursor.peek_operator("(") {
				cursor.advance();
				let mut arguments = Vec::new();
				if !cursor.peek_operator(")") {
					arguments.push(parse_expression(cursor)?);
					while cursor.peek_operator(",") {
						cursor.advance();
						arguments.push(parse_expression(cursor)?);
					}
				}
				cursor.expect_operator(")")?;
				return Ok(Expression::Call { name, arguments, index: token.index });
			}

			if cursor.peek_operator("[") {
				cursor.advance();
				let offset = parse_expression(cursor)?;
				cursor.expect_operator("]")?;
				return Ok(Expression::Access { name, offset: Some(Box::new(offset)), index: token.index });
			}

			Ok(Expression::Access { name, offset: None, index: token.index })
		},
		_ => Err(ParseError::new(token.index, format!("unexpected token `{}`", token.literal))),
	}
}

/// Maps a recognized escape character to its literal value. The lexer only
/// ever admits `b n r t ' " \`, so `f` is unreachable in practice but
/// included for parity with the escape set named in the grammar notes.
fn escape_replacement(escaped: char) -> Option<char> {
	match escaped {
		'b' => Some('\u{8}'),
		'n' => Some('\n'),
		'r' => Some('\r'),
		't' => Some('\t'),
		'f' => Some('\u{C}'),
		'\'' => Some('\''),
		'"' => Some('"'),
		'\\' => Some('\\'),
		_ => None,
	}
}

/// Strips the surrounding quotes from a string token's raw literal and
/// replaces escape sequences with their literal characters in a single
/// left-to-right scan over the already-quote-stripped inner slice.
fn unescape_string(token: &Token) -> ParseResult<String> {
	let inner = token.literal.get(1..token.literal.len().saturating_sub(1)).unwrap_or_default();
	unescape_body(inner, token.index)
}

fn unescape_character(token: &Token) -> ParseResult<char> {
	let inner = token.literal.get(1..token.literal.len().saturating_sub(1)).unwrap_or_default();
	let unescaped = unescape_body(inner, token.index)?;
	unescaped.chars().next().ok_or_else(|| ParseError::new(token.index, "empty character literal"))
}

fn unescape_body(body: &str, index: usize) -> ParseResult<String> {
	let mut result = String::with_capacity(body.len());
	let mut chars = body.chars();
	while let Some(c) = chars.next() {
		if c == '\\' {
			let escaped = chars.next().ok_or_else(|| ParseError::new(index, "dangling escape at end of literal"))?;
			let replacement = escape_replacement(escaped).ok_or_else(|| ParseError::new(index, format!("invalid escape sequence `\\{escaped}`")))?;
			result.push(replacement);
		} else {
			result.push(c);
		}
	}
	Ok(result)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::lexer::lex;

	fn parse_source(source: &str) -> Source {
		let tokens = lex(source).unwrap();
		parse(&tokens).unwrap()
	}

	#[test]
	fn parses_let_with_precedence() {
		let source = parse_source("FUN main(): Integer DO LET x: Integer = 1 + 2 * 3; RETURN 0; END");
		let Statement::Declaration { value: Some(Expression::Binary { operator, left, right, .. }), .. } = &source.functions[0].statements[0] else {
			panic!("expected a declaration with a binary initializer");
		};
		assert_eq!(*operator, BinaryOperator::Add);
		assert!(matches!(**left, Expression::Literal { value: LiteralValue::Integer(_), .. }));
		assert!(matches!(**right, Expression::Binary { operator: BinaryOperator::Multiply, .. }));
	}

	#[test]
	fn parses_main_with_return() {
		let source = parse_source("FUN main(): Integer DO RETURN 0; END");
		assert_eq!(source.functions.len(), 1);
		assert_eq!(source.functions[0].name, "main");
		assert_eq!(source.functions[0].return_type_name, "Integer");
	}

	#[test]
	fn parses_switch_with_default_last() {
		let source = parse_source("FUN main(): Integer DO SWITCH 1 CASE 1: RETURN 1; DEFAULT: RETURN 0; END RETURN 0; END");
		let Statement::Switch { cases, .. } = &source.functions[0].statements[0] else {
			panic!("expected a switch statement");
		};
		assert_eq!(cases.len(), 2);
		assert!(cases[0].value.is_some());
		assert!(cases[1].value.is_none());
	}

	#[test]
	fn string_literal_unescapes_in_one_pass() {
		let source = parse_source(r#"FUN main(): Integer DO LET x: String = "a\nb"; RETURN 0; END"#);
		let Statement::Declaration { value: Some(Expression::Literal { value: LiteralValue::String(value), .. }), .. } = &source.functions[0].statements[0] else {
			panic!("expected a string declaration");
		};
		assert_eq!(value, "a\nb");
	}

	#[test]
	fn missing_main_return_type_defaults_to_any() {
		let source = parse_source("FUN f() DO RETURN 0; END");
		assert_eq!(source.functions[0].return_type_name, "Any");
	}

	#[test]
	fn list_global_parses() {
		let source = parse_source("LIST xs::Integer = [1, 2, 3];");
		assert_eq!(source.globals.len(), 1);
		assert!(source.globals[0].mutable);
	}
}
