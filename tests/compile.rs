//! End-to-end tests: compile a source program, then execute the emitted
//! assembly on the simulator in `common` and observe the process-level
//! behavior.

mod common;

use indoc::indoc;
use tack::{codegen::Target, compile};

fn exec(src: &str) -> common::Outcome {
    let asm = compile(src, Target::x86_64_linux).expect("compilation should succeed");
    common::run(&asm)
}

#[test]
fn countdown_loop_exits_zero() {
    let outcome = exec(indoc! {"
        let x = 5
        for x > 0 {
            x = x - 1
        }
        exit x
    "});
    assert_eq!(outcome.exit_code, 0);
}

#[test]
fn arithmetic_matches_tree_evaluation() {
    let cases = [
        ("6 / 3", 2),
        ("2 + 3 * 3 + 2", 13),
        ("1 + 2 + 6 / 3 - 1", 4),
        ("(1 + 4) * 8 / 2 - 3", 17),
        ("1 + 4 * 8 / (2 + 3)", 7),
        // Equal-precedence runs nest to the right: 8 / (4 / 2).
        ("8 / 4 / 2", 4),
        ("7 / 2", 3),
    ];
    for (expr, expected) in cases {
        let outcome = exec(&format!("exit {expr}"));
        assert_eq!(outcome.exit_code, expected, "for `{expr}`");
    }
}

#[test]
fn implicit_exit_returns_zero() {
    let outcome = exec("let x = 1");
    assert_eq!(outcome.exit_code, 0);
}

#[test]
fn variables_read_back_their_values() {
    let outcome = exec(indoc! {"
        let a = 11
        let b = 31
        exit a + b - 1
    "});
    assert_eq!(outcome.exit_code, 41);
}

#[test]
fn assignment_overwrites_in_place() {
    let outcome = exec(indoc! {"
        let a = 1
        a = a + 41
        exit a
    "});
    assert_eq!(outcome.exit_code, 42);
}

#[test]
fn outer_variable_is_writable_inside_a_scope() {
    let outcome = exec(indoc! {"
        let x = 1
        {
            x = x + 41
        }
        exit x
    "});
    assert_eq!(outcome.exit_code, 42);
}

#[test]
fn scope_exit_restores_stack_depth() {
    let outcome = exec(indoc! {"
        let a = 7
        {
            let b = 1
            let c = 2
            let d = b + c
            a = a + d
        }
        exit a
    "});
    assert_eq!(outcome.exit_code, 10);
    // Only `a` survives to the exit.
    assert_eq!(outcome.final_stack_depth, 1);
}

#[test]
fn deeply_nested_scopes_stay_balanced() {
    let outcome = exec(indoc! {"
        let acc = 0
        {
            let a = 1
            {
                let b = 2
                {
                    let c = 3
                    acc = a + b + c
                }
            }
        }
        exit acc
    "});
    assert_eq!(outcome.exit_code, 6);
    assert_eq!(outcome.final_stack_depth, 1);
}

#[test]
fn if_runs_body_when_test_holds() {
    let outcome = exec(indoc! {"
        let x = 5
        if x > 3 {
            exit 1
        }
        exit 2
    "});
    assert_eq!(outcome.exit_code, 1);
}

#[test]
fn if_skips_body_when_test_fails() {
    let outcome = exec(indoc! {"
        let x = 5
        if x < 3 {
            exit 1
        }
        exit 2
    "});
    assert_eq!(outcome.exit_code, 2);
}

#[test]
fn equality_test_compares_exactly() {
    let outcome = exec(indoc! {"
        let x = 2
        if x == 2 {
            exit 5
        }
        exit 6
    "});
    assert_eq!(outcome.exit_code, 5);
}

#[test]
fn bare_test_means_greater_than_zero() {
    let truthy = exec("let x = 3 if x { exit 7 } exit 1");
    assert_eq!(truthy.exit_code, 7);

    let falsy = exec("let x = 0 if x { exit 7 } exit 1");
    assert_eq!(falsy.exit_code, 1);
}

#[test]
fn for_loop_accumulates() {
    let outcome = exec(indoc! {"
        let n = 5
        let sum = 0
        for n > 0 {
            sum = sum + n
            n = n - 1
        }
        exit sum
    "});
    assert_eq!(outcome.exit_code, 15);
}

#[test]
fn for_loop_is_skipped_when_test_fails_up_front() {
    let outcome = exec(indoc! {"
        let n = 0
        let touched = 9
        for n > 0 {
            touched = touched + 1
        }
        exit touched
    "});
    assert_eq!(outcome.exit_code, 9);
}

#[test]
fn loop_body_declarations_are_reclaimed_every_iteration() {
    let outcome = exec(indoc! {"
        let n = 3
        let sum = 0
        for n > 0 {
            let square = n * n
            sum = sum + square
            n = n - 1
        }
        exit sum
    "});
    assert_eq!(outcome.exit_code, 14);
    assert_eq!(outcome.final_stack_depth, 2);
}

#[test]
fn print_writes_the_pooled_bytes() {
    let outcome = exec(indoc! {r#"
        print "hello"
        print " "
        print "world"
    "#});
    assert_eq!(outcome.stdout, b"hello world");
    assert_eq!(outcome.exit_code, 0);
}

#[test]
fn print_scans_up_to_the_terminator() {
    // The literal spans two source lines; the newline byte is part of it.
    let outcome = exec("print \"hi\nthere\" exit 0");
    assert_eq!(outcome.stdout, b"hi\nthere");
}

#[test]
fn printed_variable_resolves_to_its_string() {
    let outcome = exec(indoc! {r#"
        let greeting = "ok"
        print greeting
        exit 0
    "#});
    assert_eq!(outcome.stdout, b"ok");
}

#[test]
fn countdown_demo_runs() {
    let outcome = exec(include_str!("../demos/countdown.tack"));
    assert_eq!(outcome.exit_code, 0);
}

#[test]
fn hello_demo_runs() {
    let outcome = exec(include_str!("../demos/hello.tack"));
    assert_eq!(outcome.stdout, b"Hello from tack!");
    assert_eq!(outcome.exit_code, 0);
}

#[test]
fn big_demo_runs() {
    let outcome = exec(include_str!("../demos/big.tack"));
    assert_eq!(outcome.exit_code, 0);
    let printed = String::from_utf8(outcome.stdout).unwrap();
    assert!(printed.contains("rounds finished"));
    assert!(printed.contains("== summary =="));
    assert!(printed.contains("even split"));
}
