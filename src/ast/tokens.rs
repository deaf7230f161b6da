use crate::ast::operators::ComparisonOperator;
use crate::ast::query::Query;

/// A token encountered while scanning a query string.
///
/// Only the kinds that can appear at the top level of a query (or inside a
/// set literal) are represented. Key names are scanned with their own
/// recognizer but only ever occur inside a [`PathComponent`], so they are
/// stored there as plain strings.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// String literal enclosed in single or double quotes
    ///
    /// # Examples
    /// ```text
    /// 'hello'
    /// "it's ok"
    /// ```
    String(String),

    /// Integer literal
    Integer(i64),

    /// Floating-point literal
    Float(f64),

    /// Boolean literal (`true` or `false`)
    Boolean(bool),

    /// One of the eleven comparison operators
    Operator(ComparisonOperator),

    /// Set literal or range, `{...}`
    Set(SetLiteral),

    /// Selection query: one or more path components, optionally rooted
    Selection(SelectionQuery),
}

impl Token {
    /// Promotes a literal or selection query into a one-element set
    /// literal so that every top-level query term is evaluated the same
    /// way. Sets pass through unchanged.
    pub fn into_set(self) -> SetLiteral {
        match self {
            Token::Set(set) => set,
            other => SetLiteral {
                tokens: vec![other],
                is_range: false,
            },
        }
    }
}

/// A set literal, `{1,2,3}` or `{'a'..'z'}`.
///
/// Ranges are flagged rather than eagerly expanded; expansion happens at
/// evaluation time, when the endpoint types are known.
#[derive(Debug, Clone, PartialEq)]
pub struct SetLiteral {
    /// Member tokens in the order they were written
    pub tokens: Vec<Token>,

    /// True when the `..` delimiter was used
    pub is_range: bool,
}

impl SetLiteral {
    pub fn empty() -> Self {
        SetLiteral {
            tokens: Vec::new(),
            is_range: false,
        }
    }
}

/// A selection query: an optional root anchor (`$`) followed by one or
/// more path components.
///
/// ```text
/// /foo//bar[/baz=='qux']
/// $/config/flags/*
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionQuery {
    /// Path components in the order they were written
    pub components: Vec<PathComponent>,

    /// True when the query is pinned to the root data context rather
    /// than the current scope
    pub use_root: bool,
}

/// The key portion of a path component: a literal key or the `*` wildcard.
#[derive(Debug, Clone, PartialEq)]
pub enum KeySelector {
    /// `*` - matches every child key
    Wildcard,

    /// A literal key name; array indices are written as their decimal form
    Key(String),
}

/// One `/`-delimited step in a selection query.
///
/// A component with neither key nor property is the identity step (a bare
/// `/`). A doubled delimiter (`//`) sets the recursive flag, and a leading
/// `.` on the name switches from key lookup to property computation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathComponent {
    /// Key to match against child entries, if a key form was used
    pub key: Option<KeySelector>,

    /// Property name (`size`, `type`, `explode`, `path`, `key`), if a
    /// property form was used. Names are validated at evaluation time.
    pub property: Option<String>,

    /// Search every composite descendant as well as the current scope
    pub recursive: bool,

    /// Filter queries applied to the matched results, in declaration
    /// order, as a logical AND
    pub filters: Vec<FilterQuery>,
}

/// A `[...]` filter attached to a path component, wrapping a complete
/// recursively parsed query that is asserted against each candidate
/// result.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterQuery {
    pub query: Box<Query>,
}
