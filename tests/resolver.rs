#[cfg(test)]
mod resolver_tests {
    use treelox::ast::*;
    use treelox::parser::Parser;
    use treelox::resolver::{ResolveReport, Resolver};
    use treelox::scanner::scan_tokens;

    fn resolve(source: &str) -> (Vec<Stmt>, ResolveReport) {
        let (tokens, errors) = scan_tokens(source);
        assert!(errors.is_empty(), "scan errors: {:?}", errors);

        let statements = Parser::new(&tokens).parse().expect("program parses");
        let report = Resolver::new().resolve(&statements);

        (statements, report)
    }

    fn errors(source: &str) -> Vec<String> {
        resolve(source)
            .1
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect()
    }

    fn warnings(source: &str) -> Vec<String> {
        resolve(source)
            .1
            .warnings
            .iter()
            .map(|w| w.to_string())
            .collect()
    }

    #[test]
    fn test_clean_program_has_no_diagnostics() {
        let (_, report) = resolve(
            "var g = 1;\nfun f(a) { var b = a + g; return b; }\nclass C { init() { this.x = 1; } }",
        );

        assert!(!report.has_errors());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        assert_eq!(
            errors("{ var a = 1; var a = 2; print a; }"),
            vec!["[line 1] Error at 'a': Variable with this name already declared in this scope."]
        );
    }

    #[test]
    fn test_globals_may_be_redeclared() {
        assert!(errors("var a = 1; var a = 2;").is_empty());
    }

    #[test]
    fn test_read_in_own_initializer() {
        assert_eq!(
            errors("var a = 1; { var a = a; print a; }"),
            vec!["[line 1] Error at 'a': Cannot read local variable in its own initializer."]
        );
    }

    #[test]
    fn test_this_outside_class() {
        assert_eq!(
            errors("print this;"),
            vec!["[line 1] Error at 'this': Cannot use 'this' outside of class."]
        );
        assert_eq!(
            errors("fun f() { return this; }"),
            vec!["[line 1] Error at 'this': Cannot use 'this' outside of class."]
        );
    }

    #[test]
    fn test_this_in_static_method() {
        assert_eq!(
            errors("class A { class make() { return this; } }"),
            vec!["[line 1] Error at 'this': Cannot use 'this' in a static context."]
        );

        // also inside a function nested in the static method
        assert_eq!(
            errors("class A { class make() { fun inner() { return this; } return inner; } }"),
            vec!["[line 1] Error at 'this': Cannot use 'this' in a static context."]
        );
    }

    #[test]
    fn test_return_checks() {
        assert_eq!(
            errors("return 1;"),
            vec!["[line 1] Error at 'return': Cannot return from top-level code."]
        );
        assert_eq!(
            errors("class A { init() { return 1; } }"),
            vec!["[line 1] Error at 'return': Cannot return a value from an initializer."]
        );

        // a bare return in an initializer is fine
        assert!(errors("class A { init() { return; } }").is_empty());
    }

    #[test]
    fn test_collects_every_error() {
        let found = errors("return;\nprint this;\n{ var x; var x; print x; }");

        assert_eq!(found.len(), 3);
        assert!(found[0].starts_with("[line 1]"));
        assert!(found[1].starts_with("[line 2]"));
        assert!(found[2].starts_with("[line 3]"));
    }

    #[test]
    fn test_unused_local_warns_once() {
        assert_eq!(
            warnings("{\n  var used = 1;\n  var unused = 2;\n  print used;\n}"),
            vec!["[line 3] Warning: Local variable 'unused' is never used."]
        );
    }

    #[test]
    fn test_assignment_alone_is_not_a_use() {
        assert_eq!(
            warnings("{ var a; a = 1; }"),
            vec!["[line 1] Warning: Local variable 'a' is never used."]
        );
    }

    #[test]
    fn test_read_from_closure_counts_as_use() {
        assert!(warnings("fun outer() { var a = 1; fun inner() { return a; } return inner; }")
            .is_empty());
    }

    #[test]
    fn test_globals_and_parameters_never_warn() {
        assert!(warnings("var g = 1; fun f(unused) {}").is_empty());
    }

    #[test]
    fn test_shadowed_name_tracked_per_declaration() {
        // the inner `a` is read; the outer one is not
        assert_eq!(
            warnings("{\n  var a = 1;\n  {\n    var a = 2;\n    print a;\n  }\n}"),
            vec!["[line 2] Warning: Local variable 'a' is never used."]
        );
    }

    #[test]
    fn test_depths_are_recorded() {
        let (statements, report) = resolve("var g = 0; { var a = 1; { print a; print g; } }");
        assert!(!report.has_errors());

        let Stmt::Block(outer) = &statements[1] else {
            panic!("expected block");
        };
        let Stmt::Block(inner) = &outer[1] else {
            panic!("expected inner block");
        };

        let depth_of = |stmt: &Stmt| match stmt {
            Stmt::Print(Expr::Variable { depth, .. }) => depth.get(),
            other => panic!("unexpected statement {:?}", other),
        };

        assert_eq!(depth_of(&inner[0]), Some(1));
        assert_eq!(depth_of(&inner[1]), None);
    }

    #[test]
    fn test_lambda_does_not_claim_a_name() {
        // two lambdas in one scope must not collide
        assert!(errors(
            "fun f() { var a = lambda (x) x; var b = lambda (y) y; return a(b(1)); }"
        )
        .is_empty());
    }
}
