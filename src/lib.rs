//! Taproot: a path query language for JSON-like data trees.
//!
//! Queries select values by path (`/menu/items/*`), recursively
//! (`//name`), through computed properties (`/menu/.size`) and filters
//! (`//user[/age >= {18}]`), or assert comparisons between whole result
//! sets (`/tags }>{ {'a','b'}`). Mutations made through the engine are
//! diffed structurally and dispatched to path subscribers, deepest path
//! first.
//!
//! ```
//! use taproot::{db, Engine, Value};
//!
//! let engine = Engine::new();
//! let tree = db(Value::from(serde_json::json!({
//!     "a": {"c": {"inner": 1}},
//!     "b": {"c": {"inner": 2}},
//! })));
//!
//! let results = engine.select("//c", &tree).unwrap();
//! let paths: Vec<_> = results.iter().map(|r| r.path.clone().unwrap()).collect();
//! assert_eq!(paths, ["/a/c", "/b/c"]);
//! ```
pub mod ast;
pub mod callbacks;
pub mod data;
pub mod engine;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod transform;
pub mod value;

pub use ast::{ComparisonOperator, Query, Token};
pub use callbacks::{Callbacks, ListenerFn};
pub use engine::{Engine, Error};
pub use evaluator::{EvalError, QueryResult, ResultSet};
pub use parser::{ParseError, clean_query, parse_query};
pub use value::{SharedValue, Value, db};
