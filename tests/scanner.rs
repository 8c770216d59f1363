#[cfg(test)]
mod scanner_tests {
    use treelox::error::LoxError;
    use treelox::scanner::*;
    use treelox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_arithmetic() {
        assert_token_sequence(
            "1 + 2 * 3",
            &[
                (TokenType::NUMBER(0.0), "1"),
                (TokenType::PLUS, "+"),
                (TokenType::NUMBER(0.0), "2"),
                (TokenType::STAR, "*"),
                (TokenType::NUMBER(0.0), "3"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_extended_operators() {
        assert_token_sequence(
            "a % b ? c : d != e <= f",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::PERCENT, "%"),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::QUESTION, "?"),
                (TokenType::IDENTIFIER, "c"),
                (TokenType::COLON, ":"),
                (TokenType::IDENTIFIER, "d"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::IDENTIFIER, "e"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::IDENTIFIER, "f"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_keywords() {
        assert_token_sequence(
            "lambda print class classy this",
            &[
                (TokenType::LAMBDA, "lambda"),
                (TokenType::PRINT, "print"),
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "classy"),
                (TokenType::THIS, "this"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_05_literal_payloads() {
        let (tokens, errors) = scan_tokens("\"hi there\" 3.25 7.");

        assert!(errors.is_empty());
        assert!(matches!(&tokens[0].token_type, TokenType::STRING(s) if s == "hi there"));
        assert!(matches!(tokens[1].token_type, TokenType::NUMBER(n) if n == 3.25));
        // the trailing dot is not part of the number
        assert!(matches!(tokens[2].token_type, TokenType::NUMBER(n) if n == 7.0));
        assert_eq!(tokens[3].token_type, TokenType::DOT);
    }

    #[test]
    fn test_scanner_06_token_display() {
        let (tokens, _) = scan_tokens("var x = 3; \"s\" 1.5");
        let shown: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();

        assert_eq!(
            shown,
            vec![
                "VAR var null",
                "IDENTIFIER x null",
                "EQUAL = null",
                "NUMBER 3 3.0",
                "SEMICOLON ; null",
                "STRING \"s\" s",
                "NUMBER 1.5 1.5",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn test_large_whole_number_display() {
        let (tokens, _) = scan_tokens("10000000000000000 999999999999999");
        let shown: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();

        assert_eq!(
            shown,
            vec![
                "NUMBER 10000000000000000 10000000000000000.0",
                "NUMBER 999999999999999 999999999999999.0",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn test_scanner_07_comments_and_lines() {
        let source = "a // line comment\n/* block\n /* nested */ still */ b\n/**/c";
        let (tokens, errors) = scan_tokens(source);

        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);

        let names: Vec<(&str, usize)> = tokens
            .iter()
            .map(|t| (t.lexeme.as_str(), t.line))
            .collect();
        assert_eq!(names, vec![("a", 1), ("b", 3), ("c", 4), ("", 4)]);
    }

    #[test]
    fn test_scanner_08_multiline_string_counts_lines() {
        let (tokens, errors) = scan_tokens("\"one\ntwo\" x");

        assert!(errors.is_empty());
        assert_eq!(tokens[1].lexeme, "x");
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let results: Vec<_> = Scanner::new(source).collect();

        // COMMA, DOT, error '$', LEFT_PAREN, error '#', EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let errors: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(|e| e.to_string())
            .collect();

        assert_eq!(
            errors,
            vec![
                "[line 1] Error: Unexpected character: $",
                "[line 1] Error: Unexpected character: #",
            ]
        );

        fn assert_token_matches(
            result: &Result<Token, LoxError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(
                        token.token_type, expected_type,
                        "Expected token type {:?}, got {:?}",
                        expected_type, token.token_type
                    );
                    assert_eq!(
                        token.lexeme, expected_lexeme,
                        "Expected lexeme '{}', got '{}'",
                        expected_lexeme, token.lexeme
                    );
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn test_multibyte_unexpected_character() {
        let (tokens, errors) = scan_tokens("a é b");

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error: Unexpected character: é"
        );
        assert_eq!(tokens.len(), 3); // a, b, EOF
    }

    #[test]
    fn test_unterminated_string() {
        let (tokens, errors) = scan_tokens("print \"abc\n");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 2] Error: Unterminated string.");
        assert_eq!(tokens.last().map(|t| t.token_type.clone()), Some(TokenType::EOF));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let (_, errors) = scan_tokens("1 /* open /* inner */");

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error: Unterminated block comment."
        );
    }

    #[test]
    fn test_tokens_serialize_to_json() {
        let (tokens, _) = scan_tokens("x");
        let json = serde_json::to_value(&tokens[0]).expect("token serializes");

        assert_eq!(json["lexeme"], "x");
        assert_eq!(json["line"], 1);
    }
}
