use crate::ast::operators::ComparisonOperator;
use crate::ast::tokens::SetLiteral;

/// A complete parsed query.
///
/// A query has exactly one primary term and, when it is an assertion, a
/// comparison operator and a secondary term. The parser rejects an
/// operator without a secondary term, so `operator.is_some()` implies
/// `secondary.is_some()`.
///
/// Both terms are stored as set literals: bare literals and selection
/// queries are promoted to one-element sets during parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// The first (non-optional) term
    pub primary: SetLiteral,

    /// The comparison operator, present only for assertion queries
    pub operator: Option<ComparisonOperator>,

    /// The second term, present exactly when `operator` is
    pub secondary: Option<SetLiteral>,

    /// The string this query was originally parsed from
    pub raw: String,
}

impl Query {
    /// True when the query compares two terms (or must otherwise be
    /// evaluated to a boolean rather than a result set).
    pub fn is_assertion(&self) -> bool {
        self.operator.is_some()
    }
}
