use crate::ast::{
    ComparisonOperator, FilterQuery, KeySelector, PathComponent, SelectionQuery, SetLiteral, Token,
};
use crate::parser::{self, ParseError};

const PATH_DELIMITER: char = '/';
const PATH_ROOT: char = '$';
const PATH_WILDCARD: char = '*';
const PROPERTY_IDENTIFIER: char = '.';
const SET_START: char = '{';
const SET_END: char = '}';
const SET_ARRAY_DELIMITER: char = ',';
const SET_RANGE_DELIMITER: &str = "..";
const FILTER_START: char = '[';
const FILTER_END: char = ']';

/// Single-pass scanner over a cleaned query string.
///
/// Each token kind has its own recognizer: it inspects the character at
/// the given offset and either returns the resume offset paired with the
/// token it read, or declines with `None`. [`Scanner::token_at`] probes
/// the recognizers in a fixed priority order, so there is no backtracking
/// across kinds.
///
/// Offsets are char indices, not byte indices.
pub struct Scanner {
    input: Vec<char>,
}

type Scan<T> = Result<Option<(usize, T)>, ParseError>;

impl Scanner {
    pub fn new(input: &str) -> Self {
        Scanner {
            input: input.chars().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    fn char_at(&self, i: usize) -> Option<char> {
        self.input.get(i).copied()
    }

    fn slice(&self, from: usize, to: usize) -> String {
        self.input[from..to.min(self.input.len())].iter().collect()
    }

    fn error(&self, index: usize, message: impl Into<String>) -> ParseError {
        ParseError::new(index, message, self.slice(0, self.input.len()))
    }

    /// Attempts to read a token of any top-level kind at the given
    /// offset, probing recognizers in priority order: comparison
    /// operator, string literal, numeric literal, boolean literal, set
    /// literal, selection query.
    pub fn token_at(&self, i: usize) -> Scan<Token> {
        if let Some(found) = self.operator_at(i) {
            return Ok(Some(found));
        }
        if let Some(found) = self.string_at(i)? {
            let (next, value) = found;
            return Ok(Some((next, Token::String(value))));
        }
        if let Some(found) = self.numeric_at(i) {
            return Ok(Some(found));
        }
        if let Some(found) = self.boolean_at(i) {
            return Ok(Some(found));
        }
        if let Some(found) = self.set_at(i)? {
            return Ok(Some(found));
        }
        if let Some(found) = self.selection_at(i)? {
            return Ok(Some(found));
        }
        Ok(None)
    }

    /// Comparison operators match longest-first: the 3-char symbols are
    /// probed before the 2-char symbols before the 1-char symbols.
    fn operator_at(&self, i: usize) -> Option<(usize, Token)> {
        for probe in [3, 2, 1] {
            if i + probe <= self.input.len() {
                let candidate = self.slice(i, i + probe);
                if let Some(op) = ComparisonOperator::from_symbol(&candidate) {
                    return Some((i + probe, Token::Operator(op)));
                }
            }
        }
        None
    }

    /// String literals are single- or double-quoted; a backslash escapes
    /// the next character (whatever it is). Reaching the end of input
    /// before the closing quote is a fatal parse error.
    pub(crate) fn string_at(&self, i: usize) -> Scan<String> {
        let quote = match self.char_at(i) {
            Some(c @ ('\'' | '"')) => c,
            _ => return Ok(None),
        };
        let mut j = i + 1;
        let mut value = String::new();
        loop {
            match self.char_at(j) {
                None => {
                    return Err(self.error(i, format!("unterminated string literal, expected {quote}")));
                }
                Some(c) if c == quote => return Ok(Some((j + 1, value))),
                Some('\\') => {
                    if let Some(escaped) = self.char_at(j + 1) {
                        value.push(escaped);
                    }
                    j += 2;
                }
                Some(c) => {
                    value.push(c);
                    j += 1;
                }
            }
        }
    }

    /// Numeric literals: an optional leading `-`, digits, and at most one
    /// decimal point. A second point ends the number rather than erroring;
    /// scanning resumes at that point.
    fn numeric_at(&self, i: usize) -> Option<(usize, Token)> {
        let first = self.char_at(i)?;
        let negative = first == '-';
        if !first.is_ascii_digit()
            && !(negative && self.char_at(i + 1).is_some_and(|c| c.is_ascii_digit()))
        {
            return None;
        }

        let mut text = String::from(first);
        let mut point_found = false;
        let mut j = i + 1;
        while let Some(c) = self.char_at(j) {
            if c.is_ascii_digit() {
                text.push(c);
            } else if c == '.' && !point_found {
                point_found = true;
                text.push(c);
            } else {
                break;
            }
            j += 1;
        }

        let token = if point_found {
            Token::Float(text.parse().unwrap_or(f64::NAN))
        } else {
            match text.parse::<i64>() {
                Ok(n) => Token::Integer(n),
                Err(_) => Token::Float(text.parse().unwrap_or(f64::NAN)),
            }
        };
        Some((j, token))
    }

    fn boolean_at(&self, i: usize) -> Option<(usize, Token)> {
        for (keyword, value) in [("true", true), ("false", false)] {
            let end = i + keyword.len();
            if end <= self.input.len() && self.slice(i, end) == keyword {
                return Some((end, Token::Boolean(value)));
            }
        }
        None
    }

    /// Key names are runs of `[A-Za-z0-9_-]`. Only probed from inside a
    /// path component.
    fn key_name_at(&self, i: usize) -> Option<(usize, String)> {
        let mut j = i;
        let mut name = String::new();
        while let Some(c) = self.char_at(j) {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                name.push(c);
                j += 1;
            } else {
                break;
            }
        }
        if name.is_empty() { None } else { Some((j, name)) }
    }

    /// Set literals: `{}`, a comma-delimited list, or a `..` range.
    /// Mixing the two delimiters in one set is a parse error, as is any
    /// member that is not a numeric, string, boolean or selection-query
    /// token.
    fn set_at(&self, i: usize) -> Scan<Token> {
        if self.char_at(i) != Some(SET_START) {
            return Ok(None);
        }
        let mut j = i + 1;
        if self.char_at(j) == Some(SET_END) {
            return Ok(Some((j + 1, Token::Set(SetLiteral::empty()))));
        }

        let mut tokens = Vec::new();
        let mut used_array_delimiter = false;
        let mut used_range_delimiter = false;
        while let Some((next, token)) = self.token_at(j)? {
            match token {
                Token::Integer(_)
                | Token::Float(_)
                | Token::String(_)
                | Token::Boolean(_)
                | Token::Selection(_) => {}
                _ => {
                    return Err(self.error(
                        j,
                        "unexpected token in set literal; sets may only contain string, \
                         numeric, boolean and selection query values",
                    ));
                }
            }
            j = next;
            tokens.push(token);

            if self.char_at(j) == Some(SET_ARRAY_DELIMITER) {
                if used_range_delimiter {
                    return Err(self.error(
                        j,
                        "unexpected ',' in a set literal that already used the range delimiter",
                    ));
                }
                used_array_delimiter = true;
                j += 1;
            } else if self.slice(j, j + SET_RANGE_DELIMITER.len()) == SET_RANGE_DELIMITER {
                if used_array_delimiter {
                    return Err(self.error(
                        j,
                        "unexpected '..' in a set literal that already used the array delimiter",
                    ));
                }
                used_range_delimiter = true;
                j += SET_RANGE_DELIMITER.len();
            } else if self.char_at(j) == Some(SET_END) {
                j += 1;
                break;
            } else {
                let found = self
                    .char_at(j)
                    .map(|c| format!("'{c}'"))
                    .unwrap_or_else(|| "end of input".to_string());
                return Err(self.error(
                    j,
                    format!("unexpected {found} in set literal, expected ',', '..' or '}}'"),
                ));
            }
        }
        Ok(Some((
            j,
            Token::Set(SetLiteral {
                tokens,
                is_range: used_range_delimiter,
            }),
        )))
    }

    /// Selection queries: an optional `$` root anchor followed by one or
    /// more path components. A `$` with no component after it is a parse
    /// error.
    fn selection_at(&self, i: usize) -> Scan<Token> {
        let rooted = self.char_at(i) == Some(PATH_ROOT);
        let start = if rooted { i + 1 } else { i };

        let Some((mut j, first)) = self.path_component_at(start)? else {
            if rooted {
                let found = self
                    .char_at(start)
                    .map(|c| format!("character '{c}'"))
                    .unwrap_or_else(|| "end of input".to_string());
                return Err(self.error(
                    start,
                    format!("unexpected {found} after '$', expected a path component"),
                ));
            }
            return Ok(None);
        };

        let mut components = vec![first];
        while let Some((next, component)) = self.path_component_at(j)? {
            components.push(component);
            j = next;
        }
        Ok(Some((
            j,
            Token::Selection(SelectionQuery {
                components,
                use_root: rooted,
            }),
        )))
    }

    /// Path components: `/key`, `//key` (recursive), `/*`, `/.property`,
    /// or a bare `/`, followed by any number of `[...]` filter queries.
    fn path_component_at(&self, i: usize) -> Scan<PathComponent> {
        if self.char_at(i) != Some(PATH_DELIMITER) {
            return Ok(None);
        }
        let mut j = i + 1;
        let mut component = PathComponent::default();

        if self.char_at(j) == Some(PATH_DELIMITER) {
            component.recursive = true;
            j += 1;
        }

        if self.char_at(j) == Some(PATH_WILDCARD) {
            component.key = Some(KeySelector::Wildcard);
            j += 1;
        } else {
            let mut using_property = false;
            if self.char_at(j) == Some(PROPERTY_IDENTIFIER) {
                using_property = true;
                j += 1;
            } else if self.char_at(j) == Some(PATH_DELIMITER) {
                return Err(self.error(
                    j,
                    "three path delimiters in a row; the maximum legal count is two",
                ));
            }

            match self.key_name_at(j) {
                Some((next, name)) => {
                    if using_property {
                        component.property = Some(name);
                    } else {
                        component.key = Some(KeySelector::Key(name));
                    }
                    j = next;
                }
                None if using_property => {
                    let found = self
                        .char_at(j)
                        .map(|c| format!("character '{c}'"))
                        .unwrap_or_else(|| "end of input".to_string());
                    return Err(self.error(
                        j,
                        format!("unexpected {found}, expected a property name"),
                    ));
                }
                None => {}
            }
        }

        while let Some((next, filter)) = self.filter_query_at(j)? {
            component.filters.push(filter);
            j = next;
        }
        Ok(Some((j, component)))
    }

    /// Filter queries are balanced-bracket spans whose contents are parsed
    /// as a complete sub-query. String literals inside the brackets are
    /// skipped with the string recognizer, so a `]` inside quotes does not
    /// close the filter.
    fn filter_query_at(&self, i: usize) -> Scan<FilterQuery> {
        if self.char_at(i) != Some(FILTER_START) {
            return Ok(None);
        }
        let mut j = i + 1;
        let mut depth = 1usize;
        let mut inner = String::new();
        while depth > 0 {
            match self.char_at(j) {
                None => {
                    return Err(self.error(i, "unterminated filter query, expected ']'"));
                }
                Some(FILTER_START) => {
                    depth += 1;
                    inner.push(FILTER_START);
                    j += 1;
                }
                Some(FILTER_END) => {
                    depth -= 1;
                    j += 1;
                    if depth > 0 {
                        inner.push(FILTER_END);
                    }
                }
                Some('\'' | '"') => {
                    let (next, _) = self
                        .string_at(j)?
                        .expect("quote char always starts a string scan");
                    inner.push_str(&self.slice(j, next));
                    j = next;
                }
                Some(c) => {
                    inner.push(c);
                    j += 1;
                }
            }
        }

        if inner.is_empty() {
            return Err(self.error(
                j,
                "empty filter query; the brackets must contain a query",
            ));
        }
        let query = parser::parse_query(&inner)?;
        Ok(Some((
            j,
            FilterQuery {
                query: Box::new(query),
            },
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operators_match_longest_first() {
        let scanner = Scanner::new("<=");
        let (next, token) = scanner.operator_at(0).unwrap();
        assert_eq!(next, 2);
        assert_eq!(token, Token::Operator(ComparisonOperator::LessOrEqual));

        let scanner = Scanner::new("}~{");
        let (next, token) = scanner.operator_at(0).unwrap();
        assert_eq!(next, 3);
        assert_eq!(token, Token::Operator(ComparisonOperator::JointSet));
    }

    #[test]
    fn second_point_ends_a_number() {
        let scanner = Scanner::new("1.2.3");
        let (next, token) = scanner.numeric_at(0).unwrap();
        assert_eq!(token, Token::Float(1.2));
        assert_eq!(next, 3);
    }
}
