//! Turns a source string into a flat sequence of [`Token`]s.
//!
//! The tokenizer is a hand-rolled cursor over the source characters; token
//! kinds are identified by single-character dispatch, not by matching a
//! table of regular expressions. The one place this crate reaches for
//! [`regex_macro`] is the unrelated [`crate::regex_exercises`] module.

use crate::error::{LexError, LexResult};

/// The kind of a [`Token`]. Keywords (`FUN`, `IF`, `RETURN`, ...) are not
/// distinguished at this layer: they come out as plain [`TokenType::Identifier`]
/// tokens, and it's the parser's job to match them by their literal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
	/// A name: a letter (or `@` followed by a letter) followed by letters,
	/// digits, `_` or `-`. Includes reserved keywords.
	Identifier,
	/// An arbitrary-precision integer literal, optionally negative.
	Integer,
	/// An arbitrary-precision decimal literal, optionally negative.
	Decimal,
	/// A single-character literal, raw source text including its quotes.
	Character,
	/// A string literal, raw source text including its quotes.
	String,
	/// A punctuation token: one of the operator/separator characters, or one
	/// of the two-character sequences `!= == && ||`.
	Operator,
}

impl std::fmt::Display for TokenType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			Self::Identifier => "identifier",
			Self::Integer => "integer",
			Self::Decimal => "decimal",
			Self::Character => "character",
			Self::String => "string",
			Self::Operator => "operator",
		};
		write!(f, "{name}")
	}
}

/// A single lexical token. Immutable once emitted by [`lex`].
///
/// `literal` holds the raw matched source text, quotes included for
/// [`TokenType::Character`] and [`TokenType::String`] tokens — unescaping and
/// quote-stripping happen later, in the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
	/// The kind of token this is.
	pub token_type: TokenType,
	/// The raw source text this token was matched from.
	pub literal: String,
	/// The character index (into the original source) this token starts at.
	pub index: usize,
}

impl Token {
	/// Constructs a new token.
	#[must_use]
	pub fn new(token_type: TokenType, literal: impl Into<String>, index: usize) -> Self {
		Self { token_type, literal: literal.into(), index }
	}
}

/// A cursor over a source string's characters, tracking the current read
/// position as a character index (not a byte offset).
struct Cursor {
	chars: Vec<char>,
	position: usize,
}

impl Cursor {
	fn new(source: &str) -> Self {
		Self { chars: source.chars().collect(), position: 0 }
	}

	fn is_at_end(&self) -> bool {
		self.position >= self.chars.len()
	}

	fn current_char(&self) -> Option<char> {
		self.chars.get(self.position).copied()
	}

	fn peek_char(&self, offset: usize) -> Option<char> {
		self.chars.get(self.position + offset).copied()
	}

	fn advance(&mut self) -> Option<char> {
		let next = self.current_char()?;
		self.position += 1;
		Some(next)
	}

	fn position(&self) -> usize {
		self.position
	}
}

/// Whether `escaped` is one of the recognized escape characters (`b n r t '
/// " \`), i.e. the character immediately following a `\` inside a character
/// or string literal.
fn is_recognized_escape(escaped: char) -> bool {
	matches!(escaped, 'b' | 'n' | 'r' | 't' | '\'' | '"' | '\\')
}

/// Whether `c` can start an identifier: a letter, or (checked by the caller)
/// `@` followed by a letter.
fn is_identifier_start(c: char) -> bool {
	c.is_alphabetic()
}

/// Whether `c` can continue an identifier after its first character.
fn is_identifier_continue(c: char) -> bool {
	c.is_alphanumeric() || c == '_' || c == '-'
}

/// Scans the entire source string into a flat sequence of tokens. Skips runs
/// of whitespace between tokens. Fails with a [`LexError`] carrying the
/// character index of the first unrecognized or malformed input.
pub fn lex(source: &str) -> LexResult<Vec<Token>> {
	let mut cursor = Cursor::new(source);
	let mut tokens = Vec::new();

	loop {
		skip_whitespace(&mut cursor);
		if cursor.is_at_end() {
			break;
		}
		let start = cursor.position();
		tokens.push(lex_token(&mut cursor, start)?);
	}

	Ok(tokens)
}

fn skip_whitespace(cursor: &mut Cursor) {
	while cursor.current_char().is_some_and(char::is_whitespace) {
		cursor.advance();
	}
}

/// Dispatches on the current character to lex exactly one token.
fn lex_token(cursor: &mut Cursor, start: usize) -> LexResult<Token> {
	let Some(c) = cursor.current_char() else {
		return Err(LexError::new(start, "unexpected end of input"));
	};

	if is_identifier_start(c) || (c == '@' && cursor.peek_char(1).is_some_and(char::is_alphabetic)) {
		return Ok(lex_identifier(cursor, start));
	}
	if c.is_ascii_digit() || (c == '-' && cursor.peek_char(1).is_some_and(|d| d.is_ascii_digit())) {
		return lex_number(cursor, start);
	}
	if c == '\'' {
		return lex_character(cursor, start);
	}
	if c == '"' {
		return lex_string(cursor, start);
	}
	Ok(lex_operator(cursor, start))
}

fn lex_identifier(cursor: &mut Cursor, start: usize) -> Token {
	let mut literal = String::new();
	if cursor.current_char() == Some('@') {
		literal.push(cursor.advance().expect("checked by caller"));
	}
	literal.push(cursor.advance().expect("checked by caller"));
	while let Some(c) = cursor.current_char() {
		if is_identifier_continue(c) {
			literal.push(cursor.advance().expect("just peeked"));
		} else {
			break;
		}
	}
	Token::new(TokenType::Identifier, literal, start)
}

/// Lexes an `INTEGER` or `DECIMAL` token. A leading `-` is consumed as part
/// of the literal, not as a separate operator token, matching the grammar's
/// design: there is no unary-minus production in the parser.
fn lex_number(cursor: &mut Cursor, start: usize) -> LexResult<Token> {
	let mut literal = String::new();
	if cursor.current_char() == Some('-') {
		literal.push(cursor.advance().expect("checked by caller"));
	}

	let mut int_part = String::new();
	while let Some(c) = cursor.current_char() {
		if c.is_ascii_digit() {
			int_part.push(cursor.advance().expect("just peeked"));
		} else {
			break;
		}
	}
	if int_part.len() > 1 && int_part.starts_with('0') {
		return Err(LexError::new(start, format!("integer literal `{int_part}` has a leading zero")));
	}
	literal.push_str(&int_part);

	if cursor.current_char() == Some('.') && cursor.peek_char(1).is_some_and(|c| c.is_ascii_digit()) {
		literal.push(cursor.advance().expect("just peeked"));
		while let Some(c) = cursor.current_char() {
			if c.is_ascii_digit() {
				literal.push(cursor.advance().expect("just peeked"));
			} else {
				break;
			}
		}
		return Ok(Token::new(TokenType::Decimal, literal, start));
	}

	Ok(Token::new(TokenType::Integer, literal, start))
}

fn lex_character(cursor: &mut Cursor, start: usize) -> LexResult<Token> {
	let mut literal = String::new();
	literal.push(cursor.advance().expect("checked by caller")); // opening '

	match cursor.current_char() {
		None => return Err(LexError::new(cursor.position(), "unterminated character literal")),
		Some('\'') => return Err(LexError::new(cursor.position(), "empty character literal")),
		Some('\n') => return Err(LexError::new(cursor.position(), "newline inside character literal")),
		Some('\\') => {
			literal.push(cursor.advance().expect("just peeked"));
			let escaped = cursor.current_char().ok_or_else(|| LexError::new(cursor.position(), "unterminated escape sequence"))?;
			if !is_recognized_escape(escaped) {
				return Err(LexError::new(cursor.position(), format!("invalid escape sequence `\\{escaped}`")));
			}
			literal.push(cursor.advance().expect("just peeked"));
		},
		Some(_) => literal.push(cursor.advance().expect("just peeked")),
	}

	match cursor.current_char() {
		Some('\'') => literal.push(cursor.advance().expect("just peeked")),
		_ => return Err(LexError::new(cursor.position(), "unterminated character literal")),
	}

	Ok(Token::new(TokenType::Character, literal, start))
}

fn lex_string(cursor: &mut Cursor, start: usize) -> LexResult<Token> {
	let mut literal = String::new();
	literal.push(cursor.advance().expect("checked by caller")); // opening "

	loop {
		match cursor.current_char() {
			None => return Err(LexError::new(cursor.position(), "unterminated string literal")),
			Some('\n') => return Err(LexError::new(cursor.position(), "newline inside string literal")),
			Some('"') => {
				literal.push(cursor.advance().expect("just peeked"));
				break;
			},
			Some('\\') => {
				literal.push(cursor.advance().expect("just peeked"));
				let escaped = cursor.current_char().ok_or_else(|| LexError::new(cursor.position(), "unterminated escape sequence"))?;
				if !is_recognized_escape(escaped) {
					return Err(LexError::new(cursor.position(), format!("invalid escape sequence `\\{escaped}`")));
				}
				literal.push(cursor.advance().expect("just peeked"));
			},
			Some(_) => literal.push(cursor.advance().expect("just peeked")),
		}
	}

	Ok(Token::new(TokenType::String, literal, start))
}

/// The two-character operators that must be matched greedily before falling
/// back to single-character operators.
const TWO_CHAR_OPERATORS: [&str; 4] = ["!=", "==", "&&", "||"];

/// Words the grammar reserves for statement/expression keywords. The lexer
/// itself doesn't treat these specially — they come out as plain
/// [`TokenType::Identifier`] tokens — but the parser consults this set to
/// tell a keyword apart from a name in `id` position. A constant-lookup
/// `phf::Set`, grounded on the same crate's [`crate::builtin::SIGNATURES`]
/// table.
pub static RESERVED_KEYWORDS: phf::Set<&'static str> = phf::phf_set! {
	"LIST", "VAR", "VAL", "FUN", "LET", "IF", "DO", "ELSE", "END", "WHILE",
	"SWITCH", "CASE", "DEFAULT", "RETURN", "NIL", "TRUE", "FALSE",
};

fn lex_operator(cursor: &mut Cursor, start: usize) -> Token {
	if let (Some(a), Some(b)) = (cursor.current_char(), cursor.peek_char(1)) {
		let pair = [a, b].iter().collect::<String>();
		if TWO_CHAR_OPERATORS.contains(&pair.as_str()) {
			cursor.advance();
			cursor.advance();
			return Token::new(TokenType::Operator, pair, start);
		}
	}
	let c = cursor.advance().expect("checked by caller");
	Token::new(TokenType::Operator, c.to_string(), start)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn token_literals(source: &str) -> Vec<(TokenType, String)> {
		lex(source).unwrap().into_iter().map(|token| (token.token_type, token.literal)).collect()
	}

	#[test]
	fn lexes_negative_decimal_as_one_token() {
		assert_eq!(token_literals("-123.456"), vec![(TokenType::Decimal, "-123.456".to_owned())]);
	}

	#[test]
	fn lone_minus_is_an_operator() {
		assert_eq!(token_literals("-"), vec![(TokenType::Operator, "-".to_owned())]);
	}

	#[test]
	fn leading_zero_integer_is_a_lex_error() {
		assert!(lex("01").is_err());
	}

	#[test]
	fn zero_alone_is_fine() {
		assert_eq!(token_literals("0"), vec![(TokenType::Integer, "0".to_owned())]);
	}

	#[test]
	fn two_char_operators_are_greedy() {
		assert_eq!(token_literals("!="), vec![(TokenType::Operator, "!=".to_owned())]);
		assert_eq!(token_literals("&&"), vec![(TokenType::Operator, "&&".to_owned())]);
	}

	#[test]
	fn string_literal_keeps_quotes_and_escapes_raw() {
		assert_eq!(token_literals("\"a\\nb\""), vec![(TokenType::String, "\"a\\nb\"".to_owned())]);
	}

	#[test]
	fn unterminated_string_is_an_error() {
		assert!(lex("\"abc").is_err());
	}

	#[test]
	fn identifier_allows_kebab_case_and_at_prefix() {
		assert_eq!(token_literals("foo-bar"), vec![(TokenType::Identifier, "foo-bar".to_owned())]);
		assert_eq!(token_literals("@item"), vec![(TokenType::Identifier, "@item".to_owned())]);
	}

	#[test]
	fn whitespace_between_tokens_is_skipped() {
		assert_eq!(
			token_literals("  1   2  "),
			vec![(TokenType::Integer, "1".to_owned()), (TokenType::Integer, "2".to_owned())]
		);
	}
}
