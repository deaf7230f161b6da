/// The comparison operators accepted between the two terms of an
/// assertion query.
///
/// Symbols are matched longest-first during scanning, so `<=` wins over
/// `<` and `}~{` wins over both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    /// `==` - set equality (unordered, structural)
    Equal,
    /// `=~` - rough equality (regex match for strings, floored equality
    /// for numbers, truthiness for booleans, joint membership for
    /// composites)
    RoughEqual,
    /// `!=` - negation of `==`
    NotEqual,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `<=`
    LessOrEqual,
    /// `>=`
    GreaterOrEqual,
    /// `}~{` - sets share at least one structurally equal member
    JointSet,
    /// `}!{` - negation of `}~{`
    DisjointSet,
    /// `}>{` - left set contains an equal counterpart for every member of
    /// the right set
    Superset,
    /// `}<{` - left set is contained by the right set
    Subset,
}

impl ComparisonOperator {
    /// All recognized symbols. Order is irrelevant; the scanner probes by
    /// length.
    pub const SYMBOLS: [&'static str; 11] = [
        "==", "=~", ">", "<", ">=", "<=", "!=", "}~{", "}>{", "}<{", "}!{",
    ];

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "==" => Some(ComparisonOperator::Equal),
            "=~" => Some(ComparisonOperator::RoughEqual),
            "!=" => Some(ComparisonOperator::NotEqual),
            "<" => Some(ComparisonOperator::Less),
            ">" => Some(ComparisonOperator::Greater),
            "<=" => Some(ComparisonOperator::LessOrEqual),
            ">=" => Some(ComparisonOperator::GreaterOrEqual),
            "}~{" => Some(ComparisonOperator::JointSet),
            "}!{" => Some(ComparisonOperator::DisjointSet),
            "}>{" => Some(ComparisonOperator::Superset),
            "}<{" => Some(ComparisonOperator::Subset),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::Equal => "==",
            ComparisonOperator::RoughEqual => "=~",
            ComparisonOperator::NotEqual => "!=",
            ComparisonOperator::Less => "<",
            ComparisonOperator::Greater => ">",
            ComparisonOperator::LessOrEqual => "<=",
            ComparisonOperator::GreaterOrEqual => ">=",
            ComparisonOperator::JointSet => "}~{",
            ComparisonOperator::DisjointSet => "}!{",
            ComparisonOperator::Superset => "}>{",
            ComparisonOperator::Subset => "}<{",
        }
    }
}
