//! Query execution: walks parsed queries against a data tree, producing
//! path-tagged result sets for selections and booleans for assertions.

use std::fmt;

use crate::ast::{
    ComparisonOperator, FilterQuery, KeySelector, PathComponent, Query, SelectionQuery,
    SetLiteral, Token,
};
use crate::data;
use crate::value::{SharedValue, Value};

/// One evaluated result: the absolute path it was found at, a snapshot of
/// the value, and a handle to the tree it came from.
///
/// Results produced by set and range literals have no location in any
/// tree; their `path` and `source` are `None` and they are cloned by
/// value rather than re-queried.
///
/// Values are snapshots taken at evaluation time. The underlying tree may
/// change afterwards; a stale result is an accepted hazard, not a bug.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub path: Option<String>,
    pub value: Value,
    pub source: Option<SharedValue>,
}

impl QueryResult {
    fn literal(value: Value) -> Self {
        QueryResult {
            path: None,
            value,
            source: None,
        }
    }
}

/// An ordered sequence of results; insertion order is evaluation order.
/// Empty sets are valid and propagate silently through chained
/// operations.
pub type ResultSet = Vec<QueryResult>;

/// A fatal error raised while evaluating a query.
///
/// Unmatched keys, empty scopes and type mismatches in comparisons are
/// not errors; they degrade to empty result sets or false assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// A selection was requested from an assertion query
    SelectOnAssertion,

    /// A property name that the language does not define
    UnknownProperty(String),

    /// A range literal that did not evaluate to exactly two endpoints
    MalformedRange(usize),

    /// Range endpoints of two different types
    RangeTypeMismatch {
        start: &'static str,
        end: &'static str,
    },

    /// Range endpoints of a type that cannot be iterated
    UnsupportedRangeType(&'static str),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::SelectOnAssertion => {
                write!(f, "cannot select results from an assertion query")
            }
            EvalError::UnknownProperty(name) => write!(f, "unrecognised property '{name}'"),
            EvalError::MalformedRange(count) => {
                write!(f, "range evaluated with {count} endpoints, expected 2")
            }
            EvalError::RangeTypeMismatch { start, end } => write!(
                f,
                "illegal range with start type '{start}' and end type '{end}'; \
                 ranges must use the same type at each end"
            ),
            EvalError::UnsupportedRangeType(kind) => write!(
                f,
                "unsupported type '{kind}' used in range; ranges support only strings and numbers"
            ),
        }
    }
}

impl std::error::Error for EvalError {}

/// Executes a selection query against a tree, scoped at the root.
///
/// Fails if the query is an assertion.
pub fn select(query: &Query, source: &SharedValue) -> Result<ResultSet, EvalError> {
    if query.is_assertion() {
        return Err(EvalError::SelectOnAssertion);
    }
    let root = source.borrow();
    Context::new(&root, source).eval_set(&query.primary, &root, "/")
}

/// Executes a selection query scoped to the sub-tree at `scope_path`.
/// The scope is resolved structurally from the root; an unresolvable
/// path yields an empty result set.
pub fn select_at(
    query: &Query,
    source: &SharedValue,
    scope_path: &str,
) -> Result<ResultSet, EvalError> {
    if query.is_assertion() {
        return Err(EvalError::SelectOnAssertion);
    }
    let root = source.borrow();
    let Some(scope) = resolve(&root, scope_path) else {
        return Ok(Vec::new());
    };
    Context::new(&root, source).eval_set(&query.primary, scope, scope_path)
}

/// Evaluates a query as an assertion against a tree.
///
/// An assertion query compares its two evaluated sets with its operator;
/// a plain selection query asserts the truthiness of its result values.
pub fn assert(query: &Query, source: &SharedValue) -> Result<bool, EvalError> {
    let root = source.borrow();
    Context::new(&root, source).eval_assertion(query, &root, "/")
}

/// Evaluates an assertion scoped to the sub-tree at `scope_path`.
pub fn assert_at(query: &Query, source: &SharedValue, scope_path: &str) -> Result<bool, EvalError> {
    let root = source.borrow();
    let Some(scope) = resolve(&root, scope_path) else {
        return Ok(false);
    };
    Context::new(&root, source).eval_assertion(query, scope, scope_path)
}

/// Structurally resolves an absolute path to a single result against the
/// current state of the tree. Used by the change dispatcher to
/// re-evaluate a subscription path after a mutation; a path that no
/// longer exists yields an empty set.
pub fn select_path(source: &SharedValue, path: &str) -> ResultSet {
    let root = source.borrow();
    match resolve(&root, path) {
        Some(value) => vec![QueryResult {
            path: Some(path.to_string()),
            value: value.clone(),
            source: Some(source.clone()),
        }],
        None => Vec::new(),
    }
}

/// Walks an absolute `/`-delimited path down a value, returning the node
/// it names. Array segments parse as indices.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        current = current.child(segment)?;
    }
    Some(current)
}

/// The final segment of an absolute path; the root path has none.
pub fn key_name(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    path.rsplit('/').next()
}

/// Evaluation context: the root data for `$`-anchored queries plus the
/// shared handle stamped onto every tree-located result.
struct Context<'a> {
    root: &'a Value,
    source: &'a SharedValue,
}

impl<'a> Context<'a> {
    fn new(root: &'a Value, source: &'a SharedValue) -> Self {
        Context { root, source }
    }

    fn located(&self, path: String, value: Value) -> QueryResult {
        QueryResult {
            path: Some(path),
            value,
            source: Some(self.source.clone()),
        }
    }

    fn eval_token(
        &self,
        token: &Token,
        scope: &Value,
        scope_path: &str,
    ) -> Result<ResultSet, EvalError> {
        match token {
            Token::String(s) => Ok(vec![QueryResult::literal(Value::String(s.clone()))]),
            Token::Integer(n) => Ok(vec![QueryResult::literal(Value::Integer(*n))]),
            Token::Float(n) => Ok(vec![QueryResult::literal(Value::Float(*n))]),
            Token::Boolean(b) => Ok(vec![QueryResult::literal(Value::Boolean(*b))]),
            Token::Set(set) => self.eval_set(set, scope, scope_path),
            Token::Selection(selection) => self.eval_selection(selection, scope, scope_path),
            Token::Operator(_) => unreachable!("operators are never evaluated as terms"),
        }
    }

    /// Evaluates a set literal: ranges flatten into their generated
    /// values, plain sets concatenate the evaluation of each member in
    /// declared order.
    fn eval_set(
        &self,
        set: &SetLiteral,
        scope: &Value,
        scope_path: &str,
    ) -> Result<ResultSet, EvalError> {
        if set.is_range {
            if set.tokens.len() != 2 {
                return Err(EvalError::MalformedRange(set.tokens.len()));
            }
            let start_results = self.eval_token(&set.tokens[0], scope, scope_path)?;
            let end_results = self.eval_token(&set.tokens[1], scope, scope_path)?;
            let (Some(start), Some(end)) = (start_results.first(), end_results.first()) else {
                return Ok(Vec::new());
            };

            return match (&start.value, &end.value) {
                (Value::String(s), Value::String(e)) => Ok(eval_string_range(s, e)),
                (s, e) if s.type_name() == "number" && e.type_name() == "number" => {
                    Ok(eval_numeric_range(s, e))
                }
                (s, e) if s.type_name() == e.type_name() => {
                    Err(EvalError::UnsupportedRangeType(s.type_name()))
                }
                (s, e) => Err(EvalError::RangeTypeMismatch {
                    start: s.type_name(),
                    end: e.type_name(),
                }),
            };
        }

        let mut results = Vec::new();
        for token in &set.tokens {
            results.extend(self.eval_token(token, scope, scope_path)?);
        }
        Ok(results)
    }

    /// Evaluates a selection query by seeding a single synthetic result
    /// at the scope (or the root, for `$`-anchored queries) and folding
    /// the path components left to right. Folding stops as soon as the
    /// running set empties.
    fn eval_selection(
        &self,
        selection: &SelectionQuery,
        scope: &Value,
        scope_path: &str,
    ) -> Result<ResultSet, EvalError> {
        let (seed_path, seed_value) = if selection.use_root {
            ("/".to_string(), self.root.clone())
        } else {
            (scope_path.to_string(), scope.clone())
        };
        let mut results = vec![self.located(seed_path, seed_value)];

        for component in &selection.components {
            let mut next = Vec::new();
            for result in &results {
                let path = result.path.as_deref().unwrap_or("/");
                next.extend(self.eval_path_component(component, &result.value, path)?);
            }
            results = next;
            if results.is_empty() {
                break;
            }
        }
        Ok(results)
    }

    /// Evaluates one path component against one scope, producing zero or
    /// more child results, then applies the component's filter queries in
    /// declaration order as a logical AND.
    fn eval_path_component(
        &self,
        component: &PathComponent,
        scope: &Value,
        path: &str,
    ) -> Result<ResultSet, EvalError> {
        let appendable = if path == "/" { "" } else { path };

        let mut results = match (&component.key, &component.property) {
            (None, None) => {
                vec![self.located(path.to_string(), scope.clone())]
            }
            (Some(key), _) => self.fetch_by_key(key, scope, appendable, component.recursive),
            (None, Some(property)) => {
                self.fetch_by_property(property, scope, path, component.recursive)?
            }
        };

        if !results.is_empty() && !component.filters.is_empty() {
            for filter in &component.filters {
                let mut surviving = Vec::new();
                for result in results {
                    if self.eval_filter(filter, &result.value)? {
                        surviving.push(result);
                    }
                }
                results = surviving;
                if results.is_empty() {
                    break;
                }
            }
        }
        Ok(results)
    }

    /// A filter is asserted against the candidate result's value, with
    /// the outer root kept as the root context so `$`-anchored filter
    /// queries can reach back into the whole tree.
    fn eval_filter(&self, filter: &FilterQuery, scope: &Value) -> Result<bool, EvalError> {
        self.eval_assertion(&filter.query, scope, "/")
    }

    /// Matches children of the scope whose key equals the selector (or
    /// all children for the wildcard). With the recursive flag, every
    /// composite child is searched too, depth-first, each child appearing
    /// before its own descendants.
    fn fetch_by_key(
        &self,
        key: &KeySelector,
        scope: &Value,
        path: &str,
        recursive: bool,
    ) -> ResultSet {
        let mut results = Vec::new();
        for (child_key, child) in scope.children() {
            let matched = match key {
                KeySelector::Wildcard => true,
                KeySelector::Key(name) => *name == child_key,
            };
            let child_path = format!("{path}/{child_key}");
            if matched {
                results.push(self.located(child_path.clone(), child.clone()));
            }
            if recursive && child.is_composite() {
                results.extend(self.fetch_by_key(key, child, &child_path, recursive));
            }
        }
        results
    }

    /// Computes a named property of the scope. With the recursive flag
    /// the property is computed at the scope first and then at every
    /// descendant.
    fn fetch_by_property(
        &self,
        property: &str,
        scope: &Value,
        path: &str,
        recursive: bool,
    ) -> Result<ResultSet, EvalError> {
        let appendable = if path == "/" { "" } else { path };
        let property_path = format!("{appendable}/.{property}");
        let mut results = Vec::new();

        match property {
            "size" => match scope {
                Value::Array(items) => {
                    results.push(self.located(property_path, Value::Integer(items.len() as i64)));
                }
                Value::String(s) => {
                    results.push(
                        self.located(property_path, Value::Integer(s.chars().count() as i64)),
                    );
                }
                Value::Object(map) => {
                    results.push(self.located(property_path, Value::Integer(map.len() as i64)));
                }
                _ => {}
            },
            "type" => {
                results.push(self.located(property_path, Value::String(scope.type_name().into())));
            }
            "explode" => {
                if let Value::String(s) = scope {
                    for (i, c) in s.chars().enumerate() {
                        results.push(
                            self.located(format!("{appendable}/{i}"), Value::String(c.to_string())),
                        );
                    }
                }
            }
            "path" => {
                results.push(self.located(property_path, Value::String(path.to_string())));
            }
            "key" => {
                let key = key_name(path).unwrap_or("");
                results.push(self.located(property_path, Value::String(key.to_string())));
            }
            other => return Err(EvalError::UnknownProperty(other.to_string())),
        }

        if recursive && scope.is_composite() {
            for (child_key, child) in scope.children() {
                let child_path = format!("{appendable}/{child_key}");
                results.extend(self.fetch_by_property(property, child, &child_path, recursive)?);
            }
        }
        Ok(results)
    }

    /// Evaluates a query as an assertion. With no operator the assertion
    /// is the truthiness of the primary set; with an operator the two
    /// sets' values are compared.
    fn eval_assertion(
        &self,
        query: &Query,
        scope: &Value,
        scope_path: &str,
    ) -> Result<bool, EvalError> {
        let primary: Vec<Value> = self
            .eval_set(&query.primary, scope, scope_path)?
            .into_iter()
            .map(|r| r.value)
            .collect();

        let (Some(operator), Some(secondary_set)) = (&query.operator, &query.secondary) else {
            return Ok(data::truthy_set(&primary));
        };

        let secondary: Vec<Value> = self
            .eval_set(secondary_set, scope, scope_path)?
            .into_iter()
            .map(|r| r.value)
            .collect();

        Ok(match operator {
            ComparisonOperator::Equal => data::eq_set_strict(&primary, &secondary),
            ComparisonOperator::NotEqual => !data::eq_set_strict(&primary, &secondary),
            ComparisonOperator::RoughEqual => data::eq_set_rough(&primary, &secondary),
            ComparisonOperator::Less => data::lt_set(&primary, &secondary),
            ComparisonOperator::Greater => data::gt_set(&primary, &secondary),
            ComparisonOperator::LessOrEqual => data::lte_set(&primary, &secondary),
            ComparisonOperator::GreaterOrEqual => data::gte_set(&primary, &secondary),
            ComparisonOperator::JointSet => data::joint_set(&primary, &secondary),
            ComparisonOperator::DisjointSet => !data::joint_set(&primary, &secondary),
            ComparisonOperator::Superset => data::super_set(&primary, &secondary),
            ComparisonOperator::Subset => data::super_set(&secondary, &primary),
        })
    }
}

/// Expands a numeric range, inclusive at both ends, stepping by one from
/// the start value. A descending range counts down; equal endpoints give
/// a single value.
fn eval_numeric_range(start: &Value, end: &Value) -> ResultSet {
    if let (Value::Integer(s), Value::Integer(e)) = (start, end) {
        let values: Vec<i64> = if e < s {
            (*e..=*s).rev().collect()
        } else {
            (*s..=*e).collect()
        };
        return values
            .into_iter()
            .map(|n| QueryResult::literal(Value::Integer(n)))
            .collect();
    }

    let (Some(s), Some(e)) = (start.as_f64(), end.as_f64()) else {
        return Vec::new();
    };
    let mut results = Vec::new();
    let mut current = s;
    if e < s {
        while current >= e {
            results.push(QueryResult::literal(Value::Float(current)));
            current -= 1.0;
        }
    } else {
        while current <= e {
            results.push(QueryResult::literal(Value::Float(current)));
            current += 1.0;
        }
    }
    results
}

/// The three mutually iterable character columns of a string range.
fn column_unlocked(c: char) -> bool {
    c.is_ascii_digit() || c.is_ascii_uppercase() || c.is_ascii_lowercase()
}

/// Steps one character forward within its column, reporting a carry when
/// the column wraps (`9` to `0`, `Z` to `A`, `z` to `a`).
fn increment_char(c: char) -> (char, bool) {
    match c {
        '9' => ('0', true),
        'Z' => ('A', true),
        'z' => ('a', true),
        '\u{7f}' => (c, true),
        _ => match char::from_u32(c as u32 + 1) {
            Some(next) => (next, false),
            None => (c, true),
        },
    }
}

/// Expands a string range with a fixed-width odometer.
///
/// Characters outside the digit, uppercase and lowercase columns are
/// locked and never incremented, except that a string whose characters
/// are all locked has its lowest-order character force-unlocked.
/// Incrementing carries into the next unlocked higher-order position;
/// the range completes when the generated string equals the end string,
/// or terminates early once a carry exhausts the highest-order unlocked
/// position. Equal bounds give a single value; unequal lengths or
/// descending bounds give an empty range.
fn eval_string_range(start: &str, end: &str) -> ResultSet {
    let literal = |s: &str| QueryResult::literal(Value::String(s.to_string()));

    if start == end {
        return vec![literal(start)];
    }
    let start_chars: Vec<char> = start.chars().collect();
    let end_chars: Vec<char> = end.chars().collect();
    if start > end || start_chars.len() != end_chars.len() {
        return Vec::new();
    }

    let mut locks: Vec<bool> = start_chars.iter().map(|&c| !column_unlocked(c)).collect();
    if locks.iter().all(|&locked| locked) {
        let last = locks.len() - 1;
        locks[last] = false;
    }
    let next_working_col = |from: usize| -> Option<usize> {
        (0..from).rev().find(|&w| !locks[w])
    };

    let mut results = Vec::new();
    let mut generated = start_chars;
    loop {
        results.push(literal(&generated.iter().collect::<String>()));
        if generated == end_chars {
            return results;
        }

        let Some(mut working) = next_working_col(generated.len()) else {
            return results;
        };
        loop {
            let (next, carry) = increment_char(generated[working]);
            generated[working] = next;
            if !carry {
                break;
            }
            match next_working_col(working) {
                Some(higher) => working = higher,
                None => return results,
            }
        }
    }
}
