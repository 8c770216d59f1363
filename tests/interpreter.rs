mod common;

#[cfg(test)]
mod interpreter_tests {
    use treelox::interpreter::Interpreter;
    use treelox::lox::RunStatus;
    use treelox::token::{Token, TokenType};
    use treelox::value::Value;

    use super::common::{run, SharedBuffer};

    /// Runs a program that must succeed and returns what it printed.
    fn output(source: &str) -> String {
        let (status, out, err) = run(source);
        assert_eq!(status, RunStatus::Ok, "stderr: {}", err);
        out
    }

    /// Runs a program that must fail at runtime and returns the diagnostic.
    fn runtime_error(source: &str) -> String {
        let (status, _, err) = run(source);
        assert_eq!(status, RunStatus::RuntimeError);
        err
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_arithmetic_and_concatenation() {
        assert_eq!(
            output(
                "print 1 + 2 * 3;\nprint 10 / 4;\nprint \"a\" + \"b\";\nprint \"n\" + 1;\n\
                 print 7 % 3;\nprint -7 % 3;\nprint (1 + 2) * 3;"
            ),
            "7\n2.5\nab\nn1\n1\n-1\n9\n"
        );
    }

    #[test]
    fn test_equality_and_truthiness() {
        assert_eq!(
            output(
                "print nil == nil; print 1 == \"1\"; print \"a\" == \"a\"; print nil == false;\n\
                 print !nil; print !0; print !\"\";"
            ),
            "true\nfalse\ntrue\nfalse\ntrue\nfalse\nfalse\n"
        );
    }

    #[test]
    fn test_logical_operators_return_operands() {
        // `boom` is never evaluated
        assert_eq!(
            output("print nil or \"x\"; print 1 and 2; print false and boom;"),
            "x\n2\nfalse\n"
        );
    }

    #[test]
    fn test_ternary() {
        assert_eq!(
            output("print true ? 1 : 2; print nil ? 1 : false ? 2 : 3;"),
            "1\n3\n"
        );
    }

    #[test]
    fn test_modulo_by_zero_is_nan() {
        assert_eq!(output("print 5 % 0;"), "NaN\n");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements and scope
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_loops_and_multi_var() {
        assert_eq!(
            output(
                "var a = 1, b = 2; print a + b;\n\
                 for (var i = 0; i < 3; i = i + 1) print i;\n\
                 var n = 0; while (n < 2) n = n + 1; print n;"
            ),
            "3\n0\n1\n2\n2\n"
        );
    }

    #[test]
    fn test_block_scoping() {
        assert_eq!(
            output("var a = 1; { var a = 2; print a; } print a;"),
            "2\n1\n"
        );
    }

    #[test]
    fn test_uninitialized_variable_is_nil() {
        assert_eq!(output("var x; print x;"), "nil\n");
    }

    #[test]
    fn test_static_resolution_ignores_later_shadowing() {
        let source = "var a = \"global\";\n\
                      {\n\
                        fun show() { print a; }\n\
                        show();\n\
                        var a = \"block\";\n\
                        show();\n\
                        print a;\n\
                      }";

        assert_eq!(output(source), "global\nglobal\nblock\n");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Functions and closures
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_recursion() {
        assert_eq!(
            output("fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }\nprint fib(10);"),
            "55\n"
        );
    }

    #[test]
    fn test_closures_keep_independent_state() {
        let source = "fun makeCounter() {\n\
                        var i = 0;\n\
                        fun count() { i = i + 1; return i; }\n\
                        return count;\n\
                      }\n\
                      var c = makeCounter();\n\
                      print c(); print c();\n\
                      var d = makeCounter();\n\
                      print d(); print c;";

        assert_eq!(output(source), "1\n2\n1\n<fn count>\n");
    }

    #[test]
    fn test_return_unwinds_loops() {
        assert_eq!(
            output(
                "fun first() { var i = 0; while (true) { if (i == 3) return i; i = i + 1; } }\n\
                 print first();\nfun nothing() {}\nprint nothing();"
            ),
            "3\nnil\n"
        );
    }

    #[test]
    fn test_lambdas() {
        assert_eq!(
            output(
                "var add = lambda (a, b) a + b;\nprint add(2, 3);\n\
                 var twice = lambda (x) { return x * 2; };\nprint twice(4);\nprint add;"
            ),
            "5\n8\n<fn lambda>\n"
        );
    }

    #[test]
    fn test_lambda_captures_enclosing_scope() {
        assert_eq!(
            output(
                "fun adder(n) { return lambda (x) x + n; }\nvar add5 = adder(5);\nprint add5(1);"
            ),
            "6\n"
        );
    }

    #[test]
    fn test_natives() {
        assert_eq!(
            output("print clock() > 0; print clock;"),
            "true\n<native fn clock>\n"
        );
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Classes
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_classes_methods_and_statics() {
        let source = "class Point {\n\
                        init(x, y) { this.x = x; this.y = y; }\n\
                        sum() { return this.x + this.y; }\n\
                        class origin() { return Point(0, 0); }\n\
                      }\n\
                      var p = Point(1, 2);\n\
                      print p.sum();\n\
                      print Point.origin().sum();\n\
                      print p;\n\
                      print Point;\n\
                      var m = p.sum;\n\
                      print m();";

        assert_eq!(output(source), "3\n0\nPoint instance\nPoint\n3\n");
    }

    #[test]
    fn test_static_methods_reachable_from_instances() {
        assert_eq!(
            output("class M { class twice(n) { return n * 2; } }\nprint M.twice(4);\nprint M().twice(5);"),
            "8\n10\n"
        );
    }

    #[test]
    fn test_static_method_sees_enclosing_locals() {
        let source = "fun build() {\n\
                        var base = 10;\n\
                        class K { class plus(n) { return base + n; } }\n\
                        return K;\n\
                      }\n\
                      print build().plus(5);";

        assert_eq!(output(source), "15\n");
    }

    #[test]
    fn test_initializer_always_returns_instance() {
        assert_eq!(
            output("class A { init() { this.v = 1; return; } }\nvar a = A();\nprint a.init() == a;\nprint a.v;"),
            "true\n1\n"
        );
    }

    #[test]
    fn test_set_yields_assigned_value() {
        assert_eq!(output("class B {} var b = B(); print b.f = 5; print b.f;"), "5\n5\n");
    }

    #[test]
    fn test_fields_shadow_methods() {
        assert_eq!(
            output("class C { m() { return \"method\"; } }\nvar c = C();\nc.m = \"field\";\nprint c.m;"),
            "field\n"
        );
    }

    #[test]
    fn test_methods_capture_this() {
        let source = "class Box {\n\
                        init(v) { this.v = v; }\n\
                        getter() { return lambda () this.v; }\n\
                      }\n\
                      var g = Box(7).getter();\n\
                      print g();";

        assert_eq!(output(source), "7\n");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Runtime errors
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_operand_errors() {
        assert_eq!(
            runtime_error("print 1 - \"a\";"),
            "Operands of '-' must be numbers.\n[line 1]\n"
        );
        assert_eq!(
            runtime_error("print -\"a\";"),
            "Operand of '-' must be a number.\n[line 1]\n"
        );
        assert_eq!(
            runtime_error("print 1 + nil;"),
            "Operands of '+' must be two numbers or the first operand must be a string.\n[line 1]\n"
        );
        assert_eq!(
            runtime_error("\n\nprint 1 / 0;"),
            "Division by zero.\n[line 3]\n"
        );
    }

    #[test]
    fn test_variable_errors() {
        assert_eq!(
            runtime_error("print nope;"),
            "Undefined variable 'nope'.\n[line 1]\n"
        );
        assert_eq!(
            runtime_error("nope = 1;"),
            "Undefined variable 'nope'.\n[line 1]\n"
        );
    }

    #[test]
    fn test_call_errors() {
        assert_eq!(
            runtime_error("\"str\"();"),
            "Can only call functions and classes.\n[line 1]\n"
        );
        assert_eq!(
            runtime_error("fun f(a) {}\nf();"),
            "Expected 1 arguments but got 0.\n[line 2]\n"
        );
        assert_eq!(
            runtime_error("class P { init(a, b) {} }\nP(1);"),
            "Expected 2 arguments but got 1.\n[line 2]\n"
        );
    }

    #[test]
    fn test_property_errors() {
        assert_eq!(
            runtime_error("var o = 1; print o.x;"),
            "Only instances have properties.\n[line 1]\n"
        );
        assert_eq!(
            runtime_error("class C {} C().y;"),
            "Undefined property 'y'.\n[line 1]\n"
        );
        assert_eq!(
            runtime_error("var n = 1; n.x = 1;"),
            "Only instances have fields.\n[line 1]\n"
        );
    }

    #[test]
    fn test_output_before_runtime_error_is_kept() {
        let (status, out, err) = run("print 1;\nprint nil + 1;\nprint 2;");

        assert_eq!(status, RunStatus::RuntimeError);
        assert_eq!(out, "1\n");
        assert!(err.ends_with("[line 2]\n"));
    }

    #[test]
    fn test_unbounded_recursion_is_a_runtime_error() {
        assert_eq!(
            runtime_error("fun r() { r(); }\nr();"),
            "Stack overflow.\n[line 1]\n"
        );
    }

    #[test]
    fn test_call_depth_limit_with_deeply_nested_method_body() {
        let source = "class C {\n\
                      m(n) {\n\
                      { { { { { { { { { {\n\
                      if (true) { while (true) { return this.m(n + 1); } }\n\
                      } } } } } } } } } }\n\
                      }\n\
                      }\n\
                      C().m(0);";

        assert_eq!(runtime_error(source), "Stack overflow.\n[line 4]\n");
    }

    #[test]
    fn test_call_depth_limit_inside_nested_expression() {
        assert_eq!(
            runtime_error(
                "fun r(n) { return 1 + (1 + (1 + (1 + (1 + r(n + 1))))); }\nr(0);"
            ),
            "Stack overflow.\n[line 1]\n"
        );
    }

    #[test]
    fn test_deeply_nested_grouping() {
        let depth = 5_000;
        let source = format!("print {}1{};", "(".repeat(depth), ")".repeat(depth));

        assert_eq!(output(&source), "1\n");
    }

    #[test]
    fn test_print_native_from_globals() {
        let out = SharedBuffer::default();
        let mut interpreter = Interpreter::with_output(Box::new(out.clone()));

        let print = interpreter.globals().borrow().get_local("print");
        let Some(Value::Callable(print)) = print else {
            panic!("print should be a global callable");
        };

        let paren = Token::new(TokenType::RIGHT_PAREN, ")", 1);
        let result = print
            .call(&mut interpreter, &paren, vec![Value::String("hi".to_string())])
            .unwrap();

        assert_eq!(result, Value::Nil);
        assert_eq!(out.contents(), "hi\n");
        assert!(interpreter.globals().borrow().get_local("clock").is_some());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Static errors and warnings
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_scan_and_parse_errors_reported_together() {
        let (status, out, err) = run("var a = 1 +;\n@\nvar b = ;\n");

        assert_eq!(status, RunStatus::StaticError);
        assert_eq!(out, "");
        assert_eq!(
            err,
            "[line 2] Error: Unexpected character: @\n\
             [line 1] Error at ';': Expect expression.\n\
             [line 3] Error at ';': Expect expression.\n"
        );
    }

    #[test]
    fn test_static_errors_prevent_execution() {
        for source in ["print 1; print (2;", "print 1; @", "print 1; return 2;"] {
            let (status, out, err) = run(source);

            assert_eq!(status, RunStatus::StaticError, "source: {}", source);
            assert_eq!(out, "", "source: {}", source);
            assert!(err.starts_with("[line 1] Error"), "stderr: {}", err);
        }
    }

    #[test]
    fn test_warnings_do_not_block_execution() {
        let (status, out, err) = run("{ var unused = 1; }\nprint \"ok\";");

        assert_eq!(status, RunStatus::Ok);
        assert_eq!(out, "ok\n");
        assert_eq!(err, "[line 1] Warning: Local variable 'unused' is never used.\n");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(RunStatus::Ok.exit_code(), 0);
        assert_eq!(RunStatus::StaticError.exit_code(), 65);
        assert_eq!(RunStatus::RuntimeError.exit_code(), 70);
    }
}
