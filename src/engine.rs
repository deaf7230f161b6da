//! The engine owns the two pieces of shared state the language needs — a
//! parsed-query cache and the subscription registry — with an explicit
//! lifecycle instead of ambient globals.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::Query;
use crate::callbacks::{Callbacks, ListenerFn};
use crate::evaluator::{self, EvalError, ResultSet};
use crate::parser::{self, ParseError};
use crate::transform;
use crate::value::{SharedValue, Value};

/// Any failure from a string-in, result-out engine entry point.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Parse(ParseError),
    Eval(EvalError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(e) => write!(f, "{e}"),
            Error::Eval(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

impl From<EvalError> for Error {
    fn from(e: EvalError) -> Self {
        Error::Eval(e)
    }
}

/// A query engine instance.
///
/// Holds the query cache (keyed by the whitespace-normalized query text,
/// append-only, never invalidated) and the change-notification registry.
/// Single-threaded; create one per execution context.
///
/// # Examples
///
/// ```
/// use taproot::{db, Engine, Value};
///
/// let engine = Engine::new();
/// let tree = db(Value::from(serde_json::json!({"menu": {"size": "large"}})));
///
/// let results = engine.select("/menu/size", &tree).unwrap();
/// assert_eq!(results[0].value, Value::String("large".into()));
/// assert!(engine.assert("/menu/size == {'large'}", &tree).unwrap());
/// ```
#[derive(Default)]
pub struct Engine {
    cache: RefCell<HashMap<String, Rc<Query>>>,
    callbacks: Callbacks,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a query string, consulting the cache first. Repeated parses
    /// of the same query (modulo whitespace outside string literals)
    /// return the same shared AST. Failed parses are not cached.
    pub fn parse(&self, text: &str) -> Result<Rc<Query>, ParseError> {
        let cleaned = parser::clean_query(text);
        if let Some(cached) = self.cache.borrow().get(&cleaned) {
            return Ok(cached.clone());
        }
        let query = Rc::new(parser::parse_cleaned(&cleaned, text)?);
        self.cache.borrow_mut().insert(cleaned, query.clone());
        Ok(query)
    }

    /// Runs a selection query against a tree, scoped at the root.
    pub fn select(&self, query: &str, tree: &SharedValue) -> Result<ResultSet, Error> {
        let parsed = self.parse(query)?;
        Ok(evaluator::select(&parsed, tree)?)
    }

    /// Runs a selection query scoped to the sub-tree at `scope_path`.
    pub fn select_at(
        &self,
        query: &str,
        tree: &SharedValue,
        scope_path: &str,
    ) -> Result<ResultSet, Error> {
        let parsed = self.parse(query)?;
        Ok(evaluator::select_at(&parsed, tree, scope_path)?)
    }

    /// Evaluates a query as an assertion against a tree.
    pub fn assert(&self, query: &str, tree: &SharedValue) -> Result<bool, Error> {
        let parsed = self.parse(query)?;
        Ok(evaluator::assert(&parsed, tree)?)
    }

    /// Evaluates an assertion scoped to the sub-tree at `scope_path`.
    pub fn assert_at(
        &self,
        query: &str,
        tree: &SharedValue,
        scope_path: &str,
    ) -> Result<bool, Error> {
        let parsed = self.parse(query)?;
        Ok(evaluator::assert_at(&parsed, tree, scope_path)?)
    }

    /// The engine's subscription registry.
    pub fn callbacks(&self) -> &Callbacks {
        &self.callbacks
    }

    /// Subscribes a callback to modifications at `path` on the given
    /// tree.
    pub fn listen(&self, path: &str, tree: &SharedValue, callback: ListenerFn) {
        self.callbacks.listen(path, tree, callback);
    }

    /// Removes a subscription previously added with [`Engine::listen`],
    /// identified by the same `(tree, callback)` pair.
    pub fn unlisten(&self, path: &str, tree: &SharedValue, callback: &ListenerFn) {
        self.callbacks.unlisten(path, tree, callback);
    }

    /// Signals a value replacement at `path`, dispatching subscriber
    /// notifications for every affected path.
    pub fn notify(&self, path: &str, tree: &SharedValue, old: &Value, new: &Value) {
        self.callbacks.notify(path, tree, old, new);
    }

    /// Clears the subscription registry. The query cache is untouched;
    /// it is append-only for the life of the engine.
    pub fn reset(&self) {
        self.callbacks.reset();
    }

    /// Sets a single key on the composite at `path`, notifying
    /// subscribers when the tree changes.
    pub fn set(&self, tree: &SharedValue, path: &str, key: &str, value: Value) -> bool {
        transform::set_key(&self.callbacks, tree, path, key, value)
    }

    /// Sets a batch of keys on the composite at `path` with one
    /// notification covering the whole batch.
    pub fn set_entries(
        &self,
        tree: &SharedValue,
        path: &str,
        entries: &[(String, Value)],
    ) -> bool {
        transform::set_entries(&self.callbacks, tree, path, entries)
    }

    /// Deletes a key from the composite at `path`.
    pub fn destroy_key(&self, tree: &SharedValue, path: &str, key: &str) -> bool {
        transform::destroy_key(&self.callbacks, tree, path, key)
    }

    /// Deletes the value at `path` from its parent.
    pub fn destroy(&self, tree: &SharedValue, path: &str) -> bool {
        transform::destroy(&self.callbacks, tree, path)
    }

    /// Moves the value at `path` to a new key on the same parent.
    pub fn rename(&self, tree: &SharedValue, path: &str, new_key: &str) -> bool {
        transform::rename_key(&self.callbacks, tree, path, new_key)
    }

    /// Replaces the value at `path`.
    pub fn replace(&self, tree: &SharedValue, path: &str, value: Value) -> bool {
        transform::replace(&self.callbacks, tree, path, value)
    }
}
