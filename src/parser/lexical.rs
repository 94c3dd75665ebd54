//! Lexical primitives
//!
//! Identifiers (plain and back-tick-quoted), string literals with the fixed
//! escape set, numbers, and `{param}` references. All of these are parsed
//! directly off the cursor; there is no separate token stream.

use super::CypherParser;
use crate::ast::Literal;
use crate::error::{Result, SyntaxError};

impl CypherParser<'_> {
    /// A plain identifier or a back-tick-quoted one. Back-ticked
    /// identifiers keep their inner text and drop the quotes.
    pub(crate) fn parse_identifier_name(&mut self) -> Result<String> {
        self.skip_whitespace();
        if self.peek_char_is('`') {
            self.parse_backtick_identifier()
        } else {
            self.parse_plain_identifier()
        }
    }

    fn parse_plain_identifier(&mut self) -> Result<String> {
        let start = self.pos;
        match self.peek_char() {
            Some(c) if c.is_alphabetic() || c == '_' => self.pos += c.len_utf8(),
            _ => return Err(self.unexpected(&["identifier"])),
        }
        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        Ok(self.input[start..self.pos].to_string())
    }

    /// `` `any text, `` with `` `` `` escaping a back-tick ``
    fn parse_backtick_identifier(&mut self) -> Result<String> {
        let start = self.pos;
        self.pos += 1;
        let mut name = String::new();
        loop {
            match self.peek_char() {
                None => {
                    return Err(SyntaxError::Lexical {
                        offset: start,
                        message: "unterminated back-tick identifier".into(),
                    });
                }
                Some('`') => {
                    self.pos += 1;
                    if self.peek_char_is('`') {
                        name.push('`');
                        self.pos += 1;
                    } else {
                        break;
                    }
                }
                Some(c) => {
                    name.push(c);
                    self.pos += c.len_utf8();
                }
            }
        }
        if name.is_empty() {
            return Err(SyntaxError::Lexical {
                offset: start,
                message: "empty back-tick identifier".into(),
            });
        }
        Ok(name)
    }

    /// Single- or double-quoted string with `\t \n \r \" \' \\ \/` escapes.
    /// Any other escape is a lexical error.
    pub(crate) fn parse_string_literal(&mut self) -> Result<String> {
        self.skip_whitespace();
        let start = self.pos;
        let quote = match self.peek_char() {
            Some(c @ ('"' | '\'')) => c,
            _ => return Err(self.unexpected(&["string"])),
        };
        self.pos += 1;
        let mut value = String::new();
        loop {
            match self.peek_char() {
                None => {
                    return Err(SyntaxError::Lexical {
                        offset: start,
                        message: "unterminated string".into(),
                    });
                }
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(value);
                }
                Some('\\') => {
                    let escape_offset = self.pos;
                    self.pos += 1;
                    let escaped = match self.peek_char() {
                        Some('t') => '\t',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('"') => '"',
                        Some('\'') => '\'',
                        Some('\\') => '\\',
                        Some('/') => '/',
                        Some(other) => {
                            return Err(SyntaxError::Lexical {
                                offset: escape_offset,
                                message: format!("unknown escape character '\\{other}'"),
                            });
                        }
                        None => {
                            return Err(SyntaxError::Lexical {
                                offset: start,
                                message: "unterminated string".into(),
                            });
                        }
                    };
                    value.push(escaped);
                    self.pos += 1;
                }
                Some(c) => {
                    value.push(c);
                    self.pos += c.len_utf8();
                }
            }
        }
    }

    /// Integer or float literal. `negative` folds an already-consumed minus
    /// sign into the value. A lone `.` followed by digits is a float
    /// (`.5`); `1..` stops before the range dots.
    pub(crate) fn parse_number_literal(&mut self, negative: bool) -> Result<Literal> {
        self.skip_whitespace();
        let start = self.pos;
        while self.peek_digit() {
            self.pos += 1;
        }
        let mut is_float = false;
        if self.peek_char_is('.') && !self.rest().starts_with("..") {
            let after_dot = self.rest()[1..].chars().next();
            if matches!(after_dot, Some(c) if c.is_ascii_digit()) {
                self.pos += 1;
                while self.peek_digit() {
                    self.pos += 1;
                }
                is_float = true;
            }
        }
        if self.pos == start {
            return Err(self.unexpected(&["number"]));
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let exponent_mark = self.pos;
            self.pos += 1;
            if matches!(self.peek_char(), Some('+' | '-')) {
                self.pos += 1;
            }
            if !self.peek_digit() {
                return Err(SyntaxError::Lexical {
                    offset: exponent_mark,
                    message: "malformed exponent".into(),
                });
            }
            while self.peek_digit() {
                self.pos += 1;
            }
            is_float = true;
        }
        let text = &self.input[start..self.pos];
        if is_float {
            let value: f64 = text.parse().map_err(|_| SyntaxError::Lexical {
                offset: start,
                message: format!("malformed number '{text}'"),
            })?;
            Ok(Literal::Float(if negative { -value } else { value }))
        } else {
            let value: i64 = text.parse().map_err(|_| SyntaxError::Lexical {
                offset: start,
                message: format!("integer literal '{text}' out of range"),
            })?;
            Ok(Literal::Integer(if negative { -value } else { value }))
        }
    }

    /// Plain unsigned integer, for range bounds.
    pub(crate) fn parse_unsigned_int(&mut self) -> Result<u32> {
        self.skip_whitespace();
        let start = self.pos;
        while self.peek_digit() {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.unexpected(&["integer"]));
        }
        self.input[start..self.pos]
            .parse()
            .map_err(|_| SyntaxError::Lexical {
                offset: start,
                message: "integer out of range".into(),
            })
    }

    /// Signed integer, for id lists and SKIP/LIMIT.
    pub(crate) fn parse_signed_integer(&mut self) -> Result<i64> {
        self.skip_whitespace();
        let start = self.pos;
        if self.peek_char_is('-') {
            self.pos += 1;
        }
        while self.peek_digit() {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.unexpected(&["integer"]));
        }
        self.input[start..self.pos]
            .parse()
            .map_err(|_| SyntaxError::Lexical {
                offset: start,
                message: "integer out of range".into(),
            })
    }

    /// `{name}`, `{0}` or `` {`quoted name`} ``.
    pub(crate) fn parse_parameter_name(&mut self) -> Result<String> {
        self.expect_char('{')?;
        let name = self.parse_parameter_body_name()?;
        self.expect_char('}')?;
        Ok(name)
    }

    /// The name part of a parameter, after the opening brace.
    pub(crate) fn parse_parameter_body_name(&mut self) -> Result<String> {
        self.skip_whitespace();
        if self.peek_digit() {
            let start = self.pos;
            while self.peek_digit() {
                self.pos += 1;
            }
            Ok(self.input[start..self.pos].to_string())
        } else {
            self.parse_identifier_name()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::CypherParser;

    fn lex(input: &str) -> CypherParser<'_> {
        CypherParser::new(input)
    }

    #[test]
    fn test_plain_identifier() {
        assert_eq!(lex("  foo_1 ").parse_identifier_name().unwrap(), "foo_1");
    }

    #[test]
    fn test_backtick_identifier_with_escape() {
        assert_eq!(
            lex("`odd `` name`").parse_identifier_name().unwrap(),
            "odd ` name"
        );
    }

    #[test]
    fn test_unterminated_backtick_identifier() {
        let err = lex("`oops").parse_identifier_name().unwrap_err();
        assert!(matches!(err, SyntaxError::Lexical { offset: 0, .. }));
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            lex(r#""a\tb\n\"c\\""#).parse_string_literal().unwrap(),
            "a\tb\n\"c\\"
        );
        assert_eq!(lex(r"'it\'s'").parse_string_literal().unwrap(), "it's");
    }

    #[test]
    fn test_unknown_escape_is_lexical_error() {
        let err = lex(r#""a\qb""#).parse_string_literal().unwrap_err();
        assert!(matches!(err, SyntaxError::Lexical { .. }));
    }

    #[test]
    fn test_unterminated_string() {
        let err = lex("'never closed").parse_string_literal().unwrap_err();
        assert!(matches!(err, SyntaxError::Lexical { offset: 0, .. }));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            lex("42").parse_number_literal(false).unwrap(),
            Literal::Integer(42)
        );
        assert_eq!(
            lex("3.5").parse_number_literal(false).unwrap(),
            Literal::Float(3.5)
        );
        assert_eq!(
            lex(".5").parse_number_literal(false).unwrap(),
            Literal::Float(0.5)
        );
        assert_eq!(
            lex("2e3").parse_number_literal(false).unwrap(),
            Literal::Float(2000.0)
        );
        assert_eq!(
            lex("7").parse_number_literal(true).unwrap(),
            Literal::Integer(-7)
        );
    }

    #[test]
    fn test_number_stops_before_range_dots() {
        let mut parser = lex("1..3");
        assert_eq!(
            parser.parse_number_literal(false).unwrap(),
            Literal::Integer(1)
        );
        assert!(parser.rest().starts_with(".."));
    }

    #[test]
    fn test_parameter_names() {
        assert_eq!(lex("{foo}").parse_parameter_name().unwrap(), "foo");
        assert_eq!(lex("{0}").parse_parameter_name().unwrap(), "0");
        assert_eq!(lex("{`a b`}").parse_parameter_name().unwrap(), "a b");
    }
}
