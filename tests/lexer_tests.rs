// tests/lexer_tests.rs

use taproot::ComparisonOperator;
use taproot::ast::{KeySelector, SetLiteral, Token};
use taproot::lexer::Scanner;

fn token_at(input: &str, index: usize) -> Option<(usize, Token)> {
    Scanner::new(input).token_at(index).unwrap()
}

fn token_err(input: &str, index: usize) -> taproot::ParseError {
    Scanner::new(input).token_at(index).unwrap_err()
}

// ============================================================================
// Comparison operators
// ============================================================================

#[test]
fn test_all_comparison_operators() {
    let cases = vec![
        ("==", 2, ComparisonOperator::Equal),
        ("=~", 2, ComparisonOperator::RoughEqual),
        ("!=", 2, ComparisonOperator::NotEqual),
        ("<", 1, ComparisonOperator::Less),
        (">", 1, ComparisonOperator::Greater),
        ("<=", 2, ComparisonOperator::LessOrEqual),
        (">=", 2, ComparisonOperator::GreaterOrEqual),
        ("}~{", 3, ComparisonOperator::JointSet),
        ("}!{", 3, ComparisonOperator::DisjointSet),
        ("}>{", 3, ComparisonOperator::Superset),
        ("}<{", 3, ComparisonOperator::Subset),
    ];
    for (input, expected_end, expected) in cases {
        let (end, token) = token_at(input, 0).unwrap();
        assert_eq!(end, expected_end, "resume offset for {input}");
        assert_eq!(token, Token::Operator(expected), "token for {input}");
    }
}

#[test]
fn test_operators_prefer_longest_match() {
    // '<=' must not scan as '<' followed by '='
    let (end, token) = token_at("<=5", 0).unwrap();
    assert_eq!(end, 2);
    assert_eq!(token, Token::Operator(ComparisonOperator::LessOrEqual));

    // '}~{' must not scan as a stray '}'
    let (end, token) = token_at("}~{", 0).unwrap();
    assert_eq!(end, 3);
    assert_eq!(token, Token::Operator(ComparisonOperator::JointSet));
}

// ============================================================================
// String literals
// ============================================================================

#[test]
fn test_string_literals() {
    let (end, token) = token_at("'hello'", 0).unwrap();
    assert_eq!(end, 7);
    assert_eq!(token, Token::String("hello".to_string()));

    let (end, token) = token_at("\"double\"", 0).unwrap();
    assert_eq!(end, 8);
    assert_eq!(token, Token::String("double".to_string()));
}

#[test]
fn test_string_escape_takes_next_character_literally() {
    // \' keeps the quote, \\ keeps the backslash, \n is just 'n'
    let (_, token) = token_at(r"'a\'b'", 0).unwrap();
    assert_eq!(token, Token::String("a'b".to_string()));

    let (_, token) = token_at(r"'a\\b'", 0).unwrap();
    assert_eq!(token, Token::String(r"a\b".to_string()));

    let (_, token) = token_at(r"'a\nb'", 0).unwrap();
    assert_eq!(token, Token::String("anb".to_string()));
}

#[test]
fn test_unterminated_string_is_fatal() {
    let err = token_err("'never closed", 0);
    assert_eq!(err.index, 0);
    assert!(err.message.contains("unterminated string"));
}

#[test]
fn test_string_mid_query_offset() {
    let (end, token) = token_at("=='bar'", 2).unwrap();
    assert_eq!(end, 7);
    assert_eq!(token, Token::String("bar".to_string()));
}

// ============================================================================
// Numeric literals
// ============================================================================

#[test]
fn test_numeric_literals() {
    let cases = vec![
        ("0", 1, Token::Integer(0)),
        ("42", 2, Token::Integer(42)),
        ("-7", 2, Token::Integer(-7)),
        ("3.14", 4, Token::Float(3.14)),
        ("-0.5", 4, Token::Float(-0.5)),
    ];
    for (input, expected_end, expected) in cases {
        let (end, token) = token_at(input, 0).unwrap();
        assert_eq!(end, expected_end, "resume offset for {input}");
        assert_eq!(token, expected, "token for {input}");
    }
}

#[test]
fn test_number_ends_at_second_point() {
    let (end, token) = token_at("1.2.3", 0).unwrap();
    assert_eq!(token, Token::Float(1.2));
    assert_eq!(end, 3);
}

#[test]
fn test_number_ends_at_non_digit() {
    let (end, token) = token_at("12abc", 0).unwrap();
    assert_eq!(token, Token::Integer(12));
    assert_eq!(end, 2);
}

#[test]
fn test_lone_minus_is_not_a_number() {
    assert_eq!(token_at("-", 0), None);
    assert_eq!(token_at("-x", 0), None);
}

// ============================================================================
// Boolean literals
// ============================================================================

#[test]
fn test_boolean_literals() {
    let (end, token) = token_at("true", 0).unwrap();
    assert_eq!((end, token), (4, Token::Boolean(true)));

    let (end, token) = token_at("false", 0).unwrap();
    assert_eq!((end, token), (5, Token::Boolean(false)));
}

// ============================================================================
// Set literals
// ============================================================================

#[test]
fn test_empty_set() {
    let (end, token) = token_at("{}", 0).unwrap();
    assert_eq!(end, 2);
    assert_eq!(token, Token::Set(SetLiteral::empty()));
}

#[test]
fn test_set_of_literals() {
    let (end, token) = token_at("{1,'2,',true}", 0).unwrap();
    assert_eq!(end, 13);
    assert_eq!(
        token,
        Token::Set(SetLiteral {
            tokens: vec![
                Token::Integer(1),
                Token::String("2,".to_string()),
                Token::Boolean(true),
            ],
            is_range: false,
        })
    );
}

#[test]
fn test_set_mid_query_offset() {
    let (end, token) = token_at("--{1.5,false,true}--", 2).unwrap();
    assert_eq!(end, 18);
    assert_eq!(
        token,
        Token::Set(SetLiteral {
            tokens: vec![
                Token::Float(1.5),
                Token::Boolean(false),
                Token::Boolean(true),
            ],
            is_range: false,
        })
    );
}

#[test]
fn test_range_set() {
    let (end, token) = token_at("{'a'..'d'}", 0).unwrap();
    assert_eq!(end, 10);
    assert_eq!(
        token,
        Token::Set(SetLiteral {
            tokens: vec![
                Token::String("a".to_string()),
                Token::String("d".to_string()),
            ],
            is_range: true,
        })
    );
}

#[test]
fn test_set_with_selection_query_member() {
    let (end, token) = token_at("{1,2,/foo}", 0).unwrap();
    assert_eq!(end, 10);
    let Token::Set(set) = token else {
        panic!("expected a set token");
    };
    assert_eq!(set.tokens.len(), 3);
    let Token::Selection(selection) = &set.tokens[2] else {
        panic!("expected a selection query member");
    };
    assert!(!selection.use_root);
    assert_eq!(
        selection.components[0].key,
        Some(KeySelector::Key("foo".to_string()))
    );
}

#[test]
fn test_set_rejects_mixed_delimiters() {
    let err = token_err("{'a'..'d',2}", 0);
    assert!(err.message.contains("range delimiter"));

    let err = token_err("{'b','a'..'d'}", 0);
    assert!(err.message.contains("array delimiter"));
}

#[test]
fn test_set_rejects_operator_members() {
    let err = token_err("{==}", 0);
    assert!(err.message.contains("unexpected token in set literal"));
}

#[test]
fn test_set_rejects_nested_sets() {
    let err = token_err("{{1},2}", 0);
    assert!(err.message.contains("unexpected token in set literal"));
}

#[test]
fn test_set_rejects_garbage_between_members() {
    let err = token_err("{1;2}", 0);
    assert!(err.message.contains("unexpected ';'"));
}

#[test]
fn test_set_end_of_input_at_delimiter_is_fatal() {
    let err = token_err("{1,2", 0);
    assert!(err.message.contains("end of input"));
}

// ============================================================================
// Selection queries and path components
// ============================================================================

#[test]
fn test_simple_selection() {
    let (end, token) = token_at("/foo", 0).unwrap();
    assert_eq!(end, 4);
    let Token::Selection(selection) = token else {
        panic!("expected a selection query");
    };
    assert!(!selection.use_root);
    assert_eq!(selection.components.len(), 1);
    assert_eq!(
        selection.components[0].key,
        Some(KeySelector::Key("foo".to_string()))
    );
    assert!(!selection.components[0].recursive);
}

#[test]
fn test_recursive_and_wildcard_components() {
    let (_, token) = token_at("//bar/*", 0).unwrap();
    let Token::Selection(selection) = token else {
        panic!("expected a selection query");
    };
    assert_eq!(selection.components.len(), 2);
    assert!(selection.components[0].recursive);
    assert_eq!(selection.components[1].key, Some(KeySelector::Wildcard));
}

#[test]
fn test_property_component() {
    let (_, token) = token_at("/menu/.size", 0).unwrap();
    let Token::Selection(selection) = token else {
        panic!("expected a selection query");
    };
    assert_eq!(selection.components[1].key, None);
    assert_eq!(selection.components[1].property, Some("size".to_string()));
}

#[test]
fn test_bare_root_component() {
    let (end, token) = token_at("/", 0).unwrap();
    assert_eq!(end, 1);
    let Token::Selection(selection) = token else {
        panic!("expected a selection query");
    };
    assert_eq!(selection.components.len(), 1);
    assert_eq!(selection.components[0].key, None);
    assert_eq!(selection.components[0].property, None);
}

#[test]
fn test_keynames_allow_digits_underscores_hyphens() {
    let (_, token) = token_at("/items-2/_x/0", 0).unwrap();
    let Token::Selection(selection) = token else {
        panic!("expected a selection query");
    };
    let keys: Vec<_> = selection
        .components
        .iter()
        .map(|c| c.key.clone().unwrap())
        .collect();
    assert_eq!(
        keys,
        vec![
            KeySelector::Key("items-2".to_string()),
            KeySelector::Key("_x".to_string()),
            KeySelector::Key("0".to_string()),
        ]
    );
}

#[test]
fn test_root_anchor() {
    let (_, token) = token_at("$/config", 0).unwrap();
    let Token::Selection(selection) = token else {
        panic!("expected a selection query");
    };
    assert!(selection.use_root);
}

#[test]
fn test_root_anchor_requires_a_component() {
    let err = token_err("$", 0);
    assert!(err.message.contains("expected a path component"));

    let err = token_err("$x", 0);
    assert!(err.message.contains("expected a path component"));
}

#[test]
fn test_three_delimiters_are_fatal() {
    let err = token_err("///foo", 0);
    assert!(err.message.contains("three path delimiters"));
}

#[test]
fn test_property_dot_requires_a_name() {
    let err = token_err("/foo/.[", 0);
    assert!(err.message.contains("expected a property name"));
}

// ============================================================================
// Filter queries
// ============================================================================

#[test]
fn test_filter_query_attaches_to_component() {
    let (end, token) = token_at("/foo[/bar]", 0).unwrap();
    assert_eq!(end, 10);
    let Token::Selection(selection) = token else {
        panic!("expected a selection query");
    };
    let filters = &selection.components[0].filters;
    assert_eq!(filters.len(), 1);
    assert!(!filters[0].query.is_assertion());
}

#[test]
fn test_multiple_filters_on_one_component() {
    let (_, token) = token_at("/foo[/a][/b=={1}]", 0).unwrap();
    let Token::Selection(selection) = token else {
        panic!("expected a selection query");
    };
    let filters = &selection.components[0].filters;
    assert_eq!(filters.len(), 2);
    assert!(filters[1].query.is_assertion());
}

#[test]
fn test_filter_brackets_nest() {
    let (end, _) = token_at("/foo[/bar[/baz]]", 0).unwrap();
    assert_eq!(end, 16);
}

#[test]
fn test_bracket_inside_filter_string_does_not_close_it() {
    let (end, token) = token_at("/foo[/a==']']", 0).unwrap();
    assert_eq!(end, 13);
    let Token::Selection(selection) = token else {
        panic!("expected a selection query");
    };
    let filter = &selection.components[0].filters[0];
    let secondary = filter.query.secondary.as_ref().unwrap();
    assert_eq!(secondary.tokens, vec![Token::String("]".to_string())]);
}

#[test]
fn test_unterminated_filter_is_fatal() {
    let err = token_err("/foo[/bar", 0);
    assert!(err.message.contains("unterminated filter"));
}

#[test]
fn test_empty_filter_is_fatal() {
    let err = token_err("/foo[]", 0);
    assert!(err.message.contains("empty filter"));
}
