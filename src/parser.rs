use std::fmt;

use crate::ast::{Query, SetLiteral, Token};
use crate::lexer::Scanner;

/// A fatal error raised while parsing a query string.
///
/// Carries the offset (a char index into the cleaned query) at which the
/// scanner gave up, along with the cleaned query text. No partial AST is
/// ever returned.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub index: usize,
    pub message: String,
    pub query: String,
}

impl ParseError {
    pub fn new(index: usize, message: impl Into<String>, query: impl Into<String>) -> Self {
        ParseError {
            index,
            message: message.into(),
            query: query.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parse error: {} at index {} in query '{}'",
            self.message, self.index, self.query
        )
    }
}

impl std::error::Error for ParseError {}

/// Strips spaces from a query, except spaces within single- or
/// double-quoted string literals. The cleaned form is also the cache key
/// used by [`crate::engine::Engine::parse`], so whitespace variants of a
/// query share one cache entry.
pub fn clean_query(text: &str) -> String {
    let mut quote_stack: Vec<char> = Vec::new();
    let mut output = String::with_capacity(text.len());
    let mut previous: Option<char> = None;

    for c in text.chars() {
        if (c == '"' || c == '\'') && previous != Some('\\') {
            if quote_stack.last() == Some(&c) {
                quote_stack.pop();
            } else {
                quote_stack.push(c);
            }
            output.push(c);
        } else if c == ' ' {
            if !quote_stack.is_empty() {
                output.push(c);
            }
        } else {
            output.push(c);
        }
        previous = Some(c);
    }
    output
}

/// Parses a query string into a [`Query`].
///
/// The string is cleaned first; scanning is a single greedy pass with no
/// backtracking. The grammar accepts one evaluable term, optionally
/// followed by a comparison operator and a second evaluable term; any
/// other arrangement of tokens is a [`ParseError`]. Scanning stops at the
/// first offset where no recognizer matches; text beyond it is ignored.
pub fn parse_query(text: &str) -> Result<Query, ParseError> {
    parse_cleaned(&clean_query(text), text)
}

/// Parses an already-cleaned query string, recording `raw` as the
/// original text.
pub(crate) fn parse_cleaned(cleaned: &str, raw: &str) -> Result<Query, ParseError> {
    let scanner = Scanner::new(cleaned);

    let mut primary: Option<SetLiteral> = None;
    let mut operator = None;
    let mut secondary: Option<SetLiteral> = None;

    let mut i = 0;
    while let Some((next, token)) = scanner.token_at(i)? {
        match token {
            Token::Operator(op) => {
                if operator.is_some() {
                    return Err(ParseError::new(
                        i,
                        "unexpected comparison operator, expected end of query",
                        cleaned,
                    ));
                }
                if primary.is_none() || secondary.is_some() {
                    return Err(ParseError::new(
                        i,
                        "a comparison operator must follow a single evaluatable term",
                        cleaned,
                    ));
                }
                operator = Some(op);
            }
            other => {
                let set = other.into_set();
                if primary.is_none() {
                    primary = Some(set);
                } else if operator.is_some() {
                    if secondary.is_some() {
                        return Err(ParseError::new(
                            i,
                            "unexpected token, expected end of query",
                            cleaned,
                        ));
                    }
                    secondary = Some(set);
                } else {
                    return Err(ParseError::new(
                        i,
                        "unexpected token, expected a comparison operator or end of query",
                        cleaned,
                    ));
                }
            }
        }
        i = next;
    }

    let Some(primary) = primary else {
        return Err(ParseError::new(
            0,
            "failed to parse query, expected a set literal or selection query",
            cleaned,
        ));
    };
    if operator.is_some() && secondary.is_none() {
        return Err(ParseError::new(
            scanner.len().saturating_sub(1),
            "query has a comparison operator but no right-hand term",
            cleaned,
        ));
    }

    Ok(Query {
        primary,
        operator,
        secondary,
        raw: raw.to_string(),
    })
}
