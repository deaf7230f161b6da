// tests/parser_tests.rs

use std::rc::Rc;

use taproot::ast::{KeySelector, SetLiteral, Token};
use taproot::{ComparisonOperator, Engine, clean_query, parse_query};

// ============================================================================
// Query cleaning
// ============================================================================

#[test]
fn test_cleaning_strips_spaces_outside_string_literals() {
    assert_eq!(clean_query("//foo == 'bar'"), "//foo=='bar'");
    assert_eq!(clean_query("//foo == 'bar baz\" '"), "//foo=='bar baz\" '");
}

#[test]
fn test_cleaning_respects_escaped_quotes() {
    // The escaped quote does not close the literal, so the space stays
    assert_eq!(clean_query(r"'a\' b'"), r"'a\' b'");
}

// ============================================================================
// Query assembly
// ============================================================================

#[test]
fn test_full_query_structure() {
    let q = parse_query("/foo//bar/.property/baz[$//bar] == {1,'2', /foo, true}").unwrap();

    assert!(q.is_assertion());
    assert_eq!(q.operator, Some(ComparisonOperator::Equal));

    // Primary: one selection query promoted into a one-element set
    assert_eq!(q.primary.tokens.len(), 1);
    let Token::Selection(selection) = &q.primary.tokens[0] else {
        panic!("expected a selection query primary");
    };
    assert_eq!(selection.components.len(), 4);
    assert_eq!(
        selection.components[0].key,
        Some(KeySelector::Key("foo".to_string()))
    );
    assert!(selection.components[1].recursive);
    assert_eq!(
        selection.components[1].key,
        Some(KeySelector::Key("bar".to_string()))
    );
    assert_eq!(
        selection.components[2].property,
        Some("property".to_string())
    );
    let baz = &selection.components[3];
    assert_eq!(baz.key, Some(KeySelector::Key("baz".to_string())));
    assert_eq!(baz.filters.len(), 1);
    assert_eq!(*baz.filters[0].query, parse_query("$//bar").unwrap());

    // Secondary: a four-element set
    let secondary = q.secondary.as_ref().unwrap();
    assert_eq!(secondary.tokens.len(), 4);
    assert_eq!(secondary.tokens[0], Token::Integer(1));
    assert_eq!(secondary.tokens[1], Token::String("2".to_string()));
    assert!(matches!(secondary.tokens[2], Token::Selection(_)));
    assert_eq!(secondary.tokens[3], Token::Boolean(true));
}

#[test]
fn test_flat_root_query() {
    let q = parse_query("/").unwrap();
    assert!(!q.is_assertion());
    let Token::Selection(selection) = &q.primary.tokens[0] else {
        panic!("expected a selection query primary");
    };
    assert_eq!(selection.components.len(), 1);
    assert_eq!(selection.components[0].key, None);
    assert_eq!(selection.components[0].property, None);
}

#[test]
fn test_literals_promote_to_sets() {
    let q = parse_query("7").unwrap();
    assert_eq!(
        q.primary,
        SetLiteral {
            tokens: vec![Token::Integer(7)],
            is_range: false,
        }
    );

    let q = parse_query("'x'").unwrap();
    assert_eq!(q.primary.tokens, vec![Token::String("x".to_string())]);

    // A set stays a set
    let q = parse_query("{1,2}").unwrap();
    assert_eq!(q.primary.tokens.len(), 2);
}

#[test]
fn test_raw_string_is_preserved() {
    let q = parse_query("/foo == {1}").unwrap();
    assert_eq!(q.raw, "/foo == {1}");
}

#[test]
fn test_parsing_is_idempotent() {
    let a = parse_query("//foo/bar[/baz] == {1..3}").unwrap();
    let b = parse_query("//foo/bar[/baz] == {1..3}").unwrap();
    assert_eq!(a, b);
}

// ============================================================================
// Parse errors
// ============================================================================

#[test]
fn test_empty_and_nonsense_queries_fail() {
    let err = parse_query("").unwrap_err();
    assert!(err.message.contains("failed to parse query"));
    assert_eq!(err.index, 0);

    let err = parse_query("gibberish").unwrap_err();
    assert!(err.message.contains("failed to parse query"));
}

#[test]
fn test_operator_before_primary_fails() {
    let err = parse_query("== {1}").unwrap_err();
    assert!(err.message.contains("must follow"));
}

#[test]
fn test_double_operator_fails() {
    let err = parse_query("{1} == == {2}").unwrap_err();
    assert!(err.message.contains("unexpected comparison operator"));
}

#[test]
fn test_operator_after_complete_assertion_fails() {
    let err = parse_query("{1} == {2} == {3}").unwrap_err();
    assert!(err.message.contains("unexpected comparison operator"));
}

#[test]
fn test_missing_secondary_fails() {
    let err = parse_query("{1} ==").unwrap_err();
    assert!(err.message.contains("no right-hand term"));
}

#[test]
fn test_two_terms_without_operator_fails() {
    let err = parse_query("{1} {2}").unwrap_err();
    assert!(err.message.contains("expected a comparison operator"));
}

#[test]
fn test_third_term_fails() {
    let err = parse_query("{1} == {2} {3}").unwrap_err();
    assert!(err.message.contains("expected end of query"));
}

#[test]
fn test_error_carries_cleaned_query_text() {
    let err = parse_query("{1} ==  == {2}").unwrap_err();
    assert_eq!(err.query, "{1}===={2}");
}

// ============================================================================
// Engine cache
// ============================================================================

#[test]
fn test_cache_returns_shared_ast() {
    let engine = Engine::new();
    let first = engine.parse("/foo/bar == {1}").unwrap();
    let second = engine.parse("/foo/bar == {1}").unwrap();
    assert!(Rc::ptr_eq(&first, &second));
}

#[test]
fn test_whitespace_variants_share_a_cache_entry() {
    let engine = Engine::new();
    let spaced = engine.parse("//foo == 'bar'").unwrap();
    let compact = engine.parse("//foo=='bar'").unwrap();
    assert!(Rc::ptr_eq(&spaced, &compact));
}

#[test]
fn test_spaces_inside_strings_are_significant_to_the_cache() {
    let engine = Engine::new();
    let a = engine.parse("//foo == 'bar baz'").unwrap();
    let b = engine.parse("//foo == 'barbaz'").unwrap();
    assert!(!Rc::ptr_eq(&a, &b));
}

#[test]
fn test_failed_parses_are_not_cached() {
    let engine = Engine::new();
    assert!(engine.parse("==").is_err());
    assert!(engine.parse("==").is_err());
}
