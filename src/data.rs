//! Structural equality, rough equality, tree diffing and the N-way set
//! comparison primitives shared by the evaluator, the mutation helpers
//! and the change dispatcher.

use std::fmt;

use indexmap::IndexMap;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use crate::value::{NULL, Value};

/// Deep structural equality between two values.
///
/// Arrays compare element-wise by index and length; objects compare by
/// key count and per-key recursive equality (insertion order is
/// irrelevant); numbers compare across the integer/float representations.
/// Equality is never reference-based.
pub fn eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Integer(x), Value::Integer(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Integer(_), Value::Float(_)) | (Value::Float(_), Value::Integer(_)) => {
            num_eq(a, b)
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(xi, yi)| eq(xi, yi))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| eq(v, w)))
        }
        _ => false,
    }
}

/// Variadic form of [`eq`]: true when every value in the slice is
/// structurally equal to the first. Empty and single-element slices are
/// trivially equal.
pub fn eq_all(values: &[&Value]) -> bool {
    values.windows(2).all(|pair| eq(pair[0], pair[1]))
}

/// Exact numeric equality across the integer/float split, using decimal
/// arithmetic so that large integers do not lose precision on the way
/// through an f64.
fn num_eq(a: &Value, b: &Value) -> bool {
    let decimal = |v: &Value| match v {
        Value::Integer(n) => Decimal::from_i64(*n),
        Value::Float(n) => Decimal::from_f64(*n),
        _ => None,
    };
    match (decimal(a), decimal(b)) {
        (Some(x), Some(y)) => x == y,
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

/// The coerced form of a child key, matched to the container it will be
/// used against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoercedKey {
    /// Array index
    Index(i64),
    /// Object key
    Key(String),
}

/// Coerces a key to the form accepted by the given container: integers
/// for arrays (`None` if the key is not numeric), non-blank strings for
/// objects (`None` if the key is empty or whitespace-only). Scalars take
/// no keys at all.
pub fn coerce_key(key: &str, container: &Value) -> Option<CoercedKey> {
    match container {
        Value::Array(_) => key.trim().parse::<i64>().ok().map(CoercedKey::Index),
        Value::Object(_) => {
            if key.trim().is_empty() {
                None
            } else {
                Some(CoercedKey::Key(key.to_string()))
            }
        }
        _ => None,
    }
}

/// How a path changed between two versions of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModSymbol {
    /// `+` - the path did not exist before
    Addition,
    /// `-` - the path no longer exists
    Removal,
    /// `~` - the path exists on both sides with different values
    Alteration,
}

impl ModSymbol {
    pub fn as_char(&self) -> char {
        match self {
            ModSymbol::Addition => '+',
            ModSymbol::Removal => '-',
            ModSymbol::Alteration => '~',
        }
    }
}

impl fmt::Display for ModSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One entry in a diff table: the change classification plus the value on
/// each side. Missing values are recorded as [`Value::Null`].
#[derive(Debug, Clone, PartialEq)]
pub struct Modification {
    pub symbol: ModSymbol,
    pub old: Value,
    pub new: Value,
}

/// A path-keyed table of changes, ordered by discovery. Produced fresh on
/// every [`compare`] call and consumed immediately; never persisted.
pub type DiffTable = IndexMap<String, Modification>;

fn modification_symbol(old: &Value, new: &Value) -> ModSymbol {
    if matches!(old, Value::Null) {
        ModSymbol::Addition
    } else if matches!(new, Value::Null) {
        ModSymbol::Removal
    } else {
        ModSymbol::Alteration
    }
}

/// Compares two versions of a value rooted at `at_path` and returns a
/// table of every changed path.
///
/// Equal values produce an empty table. Scalar-to-scalar changes record a
/// single entry at `at_path`. When either side is composite, the
/// recursion covers the union of both sides' children (new-side children
/// first, tagging paths missing from the old side as additions; then
/// old-side children, tagging paths missing from the new side as
/// removals), and `at_path` itself always receives an entry.
pub fn compare(old: &Value, new: &Value, at_path: &str) -> DiffTable {
    let mut modifications = DiffTable::new();
    if eq(old, new) {
        return modifications;
    }

    let path_stack = if at_path == "/" { "" } else { at_path };
    let old_simple = !old.is_composite();
    let new_simple = !new.is_composite();

    if old_simple && new_simple {
        modifications.insert(
            at_path.to_string(),
            Modification {
                symbol: modification_symbol(old, new),
                old: old.clone(),
                new: new.clone(),
            },
        );
    }

    if !new_simple {
        for (key, new_child) in new.children() {
            let old_child = if old_simple {
                &NULL
            } else {
                old.child(&key).unwrap_or(&NULL)
            };
            let child_table = compare(old_child, new_child, &format!("{path_stack}/{key}"));
            modifications.extend(child_table);
        }
    }

    if !old_simple {
        for (key, old_child) in old.children() {
            let new_child = if new_simple {
                &NULL
            } else {
                new.child(&key).unwrap_or(&NULL)
            };
            let child_table = compare(old_child, new_child, &format!("{path_stack}/{key}"));
            modifications.extend(child_table);
        }
    }

    if !modifications.contains_key(at_path) {
        modifications.insert(
            at_path.to_string(),
            Modification {
                symbol: modification_symbol(old, new),
                old: old.clone(),
                new: new.clone(),
            },
        );
    }
    modifications
}

/// True when at least one member of the set is truthy. Empty sets are
/// falsy.
pub fn truthy_set(set: &[Value]) -> bool {
    set.iter().any(Value::is_truthy)
}

/// Unordered multiset equality: every member of one set has a distinct
/// structurally-equal match in the other, and the cardinalities agree.
pub fn eq_set_strict(set1: &[Value], set2: &[Value]) -> bool {
    if set1.len() != set2.len() {
        return false;
    }
    let mut used = vec![false; set2.len()];
    for value in set1 {
        let Some(slot) = set2
            .iter()
            .enumerate()
            .position(|(j, candidate)| !used[j] && eq(value, candidate))
        else {
            return false;
        };
        used[slot] = true;
    }
    true
}

/// Rough set equality: any member of the first set is roughly equal to
/// any member of the second.
pub fn eq_set_rough(set1: &[Value], set2: &[Value]) -> bool {
    joint_set_with(set1, set2, eq_rough)
}

/// True when the two sets share at least one structurally equal member.
pub fn joint_set(set1: &[Value], set2: &[Value]) -> bool {
    joint_set_with(set1, set2, eq)
}

pub fn lt_set(set1: &[Value], set2: &[Value]) -> bool {
    joint_set_with(set1, set2, math_lt)
}

pub fn gt_set(set1: &[Value], set2: &[Value]) -> bool {
    joint_set_with(set1, set2, math_gt)
}

pub fn lte_set(set1: &[Value], set2: &[Value]) -> bool {
    joint_set_with(set1, set2, math_lte)
}

pub fn gte_set(set1: &[Value], set2: &[Value]) -> bool {
    joint_set_with(set1, set2, math_gte)
}

/// Runs every pairing of members from the two sets through the
/// comparison, returning true on the first hit.
fn joint_set_with(set1: &[Value], set2: &[Value], relate: impl Fn(&Value, &Value) -> bool) -> bool {
    set2.iter()
        .any(|right| set1.iter().any(|left| relate(left, right)))
}

/// True when every member of `subset` has a distinct structurally equal
/// counterpart in `superset`. Order is irrelevant; counterparts are
/// counted, so duplicated subset members need duplicated matches.
pub fn super_set(superset: &[Value], subset: &[Value]) -> bool {
    let mut used = vec![false; superset.len()];
    subset.iter().all(|sub_value| {
        match superset
            .iter()
            .enumerate()
            .position(|(j, super_value)| !used[j] && eq(sub_value, super_value))
        {
            Some(slot) => {
                used[slot] = true;
                true
            }
            None => false,
        }
    })
}

/// Rough equality between two values. Both sides must have the same type
/// name; the comparison then relaxes per type:
///
/// - strings: the right operand is compiled as a regex and tested against
///   the left (an invalid pattern matches nothing)
/// - numbers: floored equality
/// - booleans: truthiness equivalence
/// - arrays: joint membership (any structurally equal pair)
/// - objects: any key present on both sides with structurally equal values
pub fn eq_rough(left: &Value, right: &Value) -> bool {
    if left.type_name() != right.type_name() {
        return false;
    }
    match (left, right) {
        (Value::String(l), Value::String(r)) => {
            Regex::new(r).map(|re| re.is_match(l)).unwrap_or(false)
        }
        (Value::Array(l), Value::Array(r)) => joint_set(l, r),
        (Value::Object(l), Value::Object(r)) => l
            .iter()
            .any(|(k, lv)| r.get(k).is_some_and(|rv| eq(lv, rv))),
        (Value::Boolean(_), Value::Boolean(_)) => left.is_truthy() == right.is_truthy(),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(l), Some(r)) => l.floor() == r.floor(),
            _ => false,
        },
    }
}

pub fn math_lt(left: &Value, right: &Value) -> bool {
    math_compare(left, right, |o| o == std::cmp::Ordering::Less)
}

pub fn math_gt(left: &Value, right: &Value) -> bool {
    math_compare(left, right, |o| o == std::cmp::Ordering::Greater)
}

pub fn math_lte(left: &Value, right: &Value) -> bool {
    math_compare(left, right, |o| o != std::cmp::Ordering::Greater)
}

pub fn math_gte(left: &Value, right: &Value) -> bool {
    math_compare(left, right, |o| o != std::cmp::Ordering::Less)
}

/// Ordering comparison restricted to same-typed number or string
/// operands; every cross-type or unordered pairing is false.
fn math_compare(
    left: &Value,
    right: &Value,
    accept: impl Fn(std::cmp::Ordering) -> bool,
) -> bool {
    match (left, right) {
        (Value::String(l), Value::String(r)) => accept(l.cmp(r)),
        (Value::Integer(l), Value::Integer(r)) => accept(l.cmp(r)),
        (l, r) if l.type_name() == "number" && r.type_name() == "number" => {
            let decimal = |v: &Value| match v {
                Value::Integer(n) => Decimal::from_i64(*n),
                Value::Float(n) => Decimal::from_f64(*n),
                _ => None,
            };
            if let (Some(ld), Some(rd)) = (decimal(l), decimal(r)) {
                accept(ld.cmp(&rd))
            } else {
                match (l.as_f64(), r.as_f64()) {
                    (Some(lf), Some(rf)) => lf.partial_cmp(&rf).is_some_and(accept),
                    _ => false,
                }
            }
        }
        _ => false,
    }
}
