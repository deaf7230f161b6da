//! # Taproot Query Language - Abstract Syntax Tree
//!
//! This module defines the AST for Taproot, a path query language for
//! selecting from, asserting against and observing JSON-like data trees.
//!
//! ## Architecture Overview
//!
//! The AST module is organized into focused submodules:
//!
//! - **[tokens]** - Token kinds produced by the scanner (literals, sets,
//!   selection queries and their path components)
//! - **[operators]** - The eleven comparison operators
//! - **[query]** - The complete parsed query structure
//!
//! ## Query Structure
//!
//! Every query is either a *selection* (one evaluable term) or an
//! *assertion* (two terms joined by a comparison operator):
//!
//! ```text
//! /menu/items/*[/.type=='object']
//! /user/age >= {18}
//! {'a'..'f'} }>{ /flags
//! ```
//!
//! Bare literals and selection queries are promoted to one-element set
//! literals during parsing, so evaluation always starts from a set.
pub mod operators;
pub mod query;
pub mod tokens;

pub use operators::ComparisonOperator;
pub use query::Query;
pub use tokens::{FilterQuery, KeySelector, PathComponent, SelectionQuery, SetLiteral, Token};
