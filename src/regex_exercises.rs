//! A standalone regex exercise, kept isolated from the core pipeline: no
//! lexer/parser/analyzer/interpreter module depends on anything here. Five
//! compiled patterns, each exposed as a function returning the same
//! lazily-compiled `&'static Regex` on every call, grounded on the teacher's
//! own use of `regex_macro::regex!` in `lexer.rs`/`parser/mod.rs`.

use regex_macro::Regex;

/// Matches `user@domain.tld` addresses where the user part is at least two
/// characters and the top-level domain is at least three.
#[must_use]
pub fn email() -> &'static Regex {
	regex_macro::regex!(r"^[A-Za-z0-9._%+-]{2,}@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{3,}$")
}

/// Matches strings of odd length (at least one character).
#[must_use]
pub fn odd_length() -> &'static Regex {
	regex_macro::regex!(r"(?s)^(?:..)*.$")
}

/// Matches a comma-separated list of single lowercase letters, e.g. `a,b,c`.
#[must_use]
pub fn character_list() -> &'static Regex {
	regex_macro::regex!(r"^[a-z](?:,\s*[a-z])*$")
}

/// Matches a decimal number with an optional sign and at least one digit on
/// each side of the point.
#[must_use]
pub fn decimal() -> &'static Regex {
	regex_macro::regex!(r"^-?\d+\.\d+$")
}

/// Matches a double-quoted string literal, allowing `\`-escaped characters.
#[must_use]
pub fn string() -> &'static Regex {
	regex_macro::regex!(r#"^"(?:\\.|[^"\\])*"$"#)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn email_matches_valid_address() {
		assert!(email().is_match("thelegend27@gmail.com"));
	}

	#[test]
	fn email_rejects_short_tld() {
		assert!(!email().is_match("toplvl@domain.io"));
	}

	#[test]
	fn email_rejects_short_user() {
		assert!(!email().is_match("t@gmail.com"));
	}

	#[test]
	fn odd_length_accepts_single_char() {
		assert!(odd_length().is_match("a"));
		assert!(odd_length().is_match("abc"));
	}

	#[test]
	fn odd_length_rejects_even_length() {
		assert!(!odd_length().is_match("ab"));
		assert!(!odd_length().is_match(""));
	}

	#[test]
	fn character_list_matches_comma_separated_letters() {
		assert!(character_list().is_match("a,b,c"));
		assert!(character_list().is_match("a, b, c"));
		assert!(!character_list().is_match("a,1,c"));
	}

	#[test]
	fn decimal_requires_digits_on_both_sides_of_the_point() {
		assert!(decimal().is_match("3.14"));
		assert!(decimal().is_match("-0.5"));
		assert!(!decimal().is_match("3."));
		assert!(!decimal().is_match(".5"));
	}

	#[test]
	fn string_matches_escaped_quoted_literal() {
		assert!(string().is_match(r#""hello \"world\"""#));
		assert!(!string().is_match("\"unterminated"));
	}
}
