mod common;

use common::{run_code, run_code_capture_output, run_with_functions, trace_function};
use php_core::compiler::compile_source;
use php_core::compiler::runnable::dump_to_string;
use php_core::core::value::Val;
use php_core::runtime::error::EngineError;
use php_core::runtime::executor::{ExecutionConfig, execute_code, execute_code_with_config};

fn run_with_x(code: &str, x: Val) -> String {
    let mut config = ExecutionConfig::default();
    config.globals.insert("x".into(), x);
    execute_code_with_config(code, config)
        .expect("code execution failed")
        .output_str()
}

#[test]
fn test_syntax_equivalence() {
    let braced = "<?php if ($x) { echo 'A'; } else { echo 'B'; }";
    let alternate = "<?php if ($x): echo 'A'; else: echo 'B'; endif;";

    for (x, expected) in [
        (Val::Bool(true), "A"),
        (Val::Int(0), "B"),
        (Val::string("0"), "B"),
        (Val::string("0.0"), "A"),
        (Val::Null, "B"),
    ] {
        assert_eq!(run_with_x(braced, x.clone()), expected, "braced, x = {:?}", x);
        assert_eq!(run_with_x(alternate, x.clone()), expected, "alternate, x = {:?}", x);
    }

    let braced = compile_source(braced, "-").unwrap();
    let alternate = compile_source(alternate, "-").unwrap();
    assert_eq!(
        dump_to_string(braced.as_ref()),
        dump_to_string(alternate.as_ref())
    );
    assert_eq!(
        dump_to_string(alternate.as_ref()),
        "if ($x) {echo 'A';} else {echo 'B';}"
    );
}

#[test]
fn test_dump_recompiles_to_same_behavior() {
    let alternate = "<?php if ($x): echo 'A'; elseif (!$x): echo 'B'; endif;";
    let dumped = format!(
        "<?php {}",
        dump_to_string(compile_source(alternate, "-").unwrap().as_ref())
    );
    for x in [Val::Bool(true), Val::Bool(false)] {
        assert_eq!(run_with_x(alternate, x.clone()), run_with_x(&dumped, x));
    }
}

#[test]
fn test_overflowing_float_dump_recompiles() {
    let source = "<?php if ($x) { echo 1e999; } else { echo 2.5; }";
    let dump = dump_to_string(compile_source(source, "-").unwrap().as_ref());
    assert_eq!(dump, "if ($x) {echo 1e999;} else {echo 2.5;}");

    let dumped = format!("<?php {}", dump);
    for x in [Val::Bool(true), Val::Bool(false)] {
        assert_eq!(run_with_x(source, x.clone()), run_with_x(&dumped, x));
    }
    assert_eq!(run_with_x(&dumped, Val::Bool(true)), "INF");
}

#[test]
fn test_elseif_chain_runs_one_branch() {
    let source = r#"<?php
        $a = false; $b = true; $c = false;
        if ($a) echo 'A'; elseif ($b) echo 'B'; elseif ($c) echo 'C';
    "#;
    let (_, output) = run_code_capture_output(source).unwrap();
    assert_eq!(output, "B");

    let source = r#"<?php
        $a = false; $b = true; $c = false;
        if ($a):
            echo 'A';
        elseif ($b):
            echo 'B';
        elseif ($c):
            echo 'C';
        endif;
    "#;
    let (_, output) = run_code_capture_output(source).unwrap();
    assert_eq!(output, "B");
}

#[test]
fn test_condition_evaluated_once() {
    let result = run_with_functions(
        "<?php if (trace(0)) { echo 'yes'; } elseif (trace(1)) { echo 'no'; }",
        vec![trace_function()],
    )
    .unwrap();
    assert_eq!(result.output_str(), "01no");
}

#[test]
fn test_if_without_else_produces_nothing() {
    let (value, output) = run_code_capture_output("<?php if (false) echo 'x';").unwrap();
    assert_eq!(value, Val::Null);
    assert_eq!(output, "");
}

#[test]
fn test_return_unwinds_nested_branches() {
    let source = r#"<?php
        if (true) {
            if (true):
                echo 'in';
                return 'early';
            endif;
            echo 'unreachable';
        }
        echo 'unreachable';
    "#;
    let (value, output) = run_code_capture_output(source).unwrap();
    assert_eq!(value, Val::string("early"));
    assert_eq!(output, "in");
}

#[test]
fn test_missing_open_paren_is_syntax_error() {
    let err = execute_code("<?php\nif x) { echo 1; }").unwrap_err();
    match err {
        EngineError::Syntax(e) => {
            assert_eq!(e.token, "identifier \"x\"");
            assert_eq!((e.loc.line, e.loc.column), (2, 4));
        }
        other => panic!("Expected syntax error, got {:?}", other),
    }
}

#[test]
fn test_syntax_error_produces_no_output() {
    let err = execute_code("<?php echo 'before'; if ($x) echo 1; else").unwrap_err();
    assert_eq!(
        err.to_string(),
        "syntax error, unexpected end of file in - on line 1 column 42"
    );
}

#[test]
fn test_alternate_syntax_requires_endif_semicolon() {
    assert!(matches!(
        execute_code("<?php if (true): echo 1; endif echo 2;"),
        Err(EngineError::Syntax(_))
    ));
}

#[test]
fn test_nested_blocks_and_assignment() {
    let source = r#"<?php
        $x = 1;
        {
            $y = $x;
            { $x = 2; }
        }
        if ($y) return $x;
    "#;
    assert_eq!(run_code(source), Val::Int(2));
}
