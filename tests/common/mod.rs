//! Common test helpers
//!
//! Execution helpers that delegate to the centralized
//! `runtime::executor` API, plus a few native functions used to observe
//! call binding from scripts.

#![allow(dead_code)]

use php_core::core::value::Val;
use php_core::core::zval::Zval;
use php_core::runtime::callable::{Callable, NativeFunction, ParamInfo, UserFunction};
use php_core::runtime::context::{Context, FuncContext, RootContext};
use php_core::runtime::error::EngineError;
use php_core::runtime::executor::{
    ExecutionConfig, ExecutionResult, execute_code, execute_code_with_config,
};
use php_core::runtime::global::Global;
use php_core::runtime::output::BufferWriter;
use std::rc::Rc;

/// Execute PHP code and return the result value
///
/// Code must contain the full `<?php` opening tag.
/// Panics if execution fails.
pub fn run_code(code: &str) -> Val {
    execute_code(code).expect("code execution failed").value
}

/// Execute code and return both the value and everything it echoed
pub fn run_code_capture_output(code: &str) -> Result<(Val, String), EngineError> {
    let result = execute_code(code)?;
    let output = result.output_str();
    Ok((result.value, output))
}

/// Execute code with the test functions below registered
pub fn run_with_functions(
    code: &str,
    functions: Vec<Rc<dyn Callable>>,
) -> Result<ExecutionResult, EngineError> {
    let config = ExecutionConfig {
        functions,
        ..Default::default()
    };
    execute_code_with_config(code, config)
}

/// Root context whose output goes to a discarded buffer
pub fn test_root() -> RootContext {
    RootContext::new(Global::builder().with_output(BufferWriter::new()).build())
}

/// Compile `body` as the body of a user function
pub fn user_function(name: &str, params: Vec<ParamInfo>, body: &str) -> Rc<dyn Callable> {
    let source = format!("<?php {}", body);
    let node = php_core::compiler::compile_source(&source, name).expect("function body compiles");
    Rc::new(UserFunction::new(name, params, node))
}

fn set_to_five(_ctx: &FuncContext<'_>, args: &[Zval]) -> Result<Zval, EngineError> {
    if let Some(arg) = args.first() {
        arg.set(Val::Int(5));
    }
    Ok(Zval::null())
}

/// `set_to_five(&$x)`
pub fn set_to_five_by_ref() -> Rc<dyn Callable> {
    Rc::new(NativeFunction::new(
        "set_to_five",
        vec![ParamInfo::by_ref("x")],
        set_to_five,
    ))
}

/// `set_to_five($x)`
pub fn set_to_five_by_value() -> Rc<dyn Callable> {
    Rc::new(NativeFunction::new(
        "set_to_five",
        vec![ParamInfo::by_value("x")],
        set_to_five,
    ))
}

fn trace(ctx: &FuncContext<'_>, args: &[Zval]) -> Result<Zval, EngineError> {
    let value = args.first().cloned().unwrap_or_default();
    let text = value.as_type(php_core::core::value::ValType::String, ctx.config())?;
    if let Val::String(s) = text.value() {
        ctx.write(&s)?;
    }
    Ok(value)
}

/// `trace($x)`: echoes its argument and returns it
pub fn trace_function() -> Rc<dyn Callable> {
    Rc::new(NativeFunction::new(
        "trace",
        vec![ParamInfo::by_value("x")],
        trace,
    ))
}

fn globals_view(ctx: &FuncContext<'_>, _args: &[Zval]) -> Result<Zval, EngineError> {
    ctx.offset_get(b"GLOBALS")
}

/// `globals_view()`: the caller-independent `$GLOBALS` snapshot
pub fn globals_view_function() -> Rc<dyn Callable> {
    Rc::new(NativeFunction::new("globals_view", Vec::new(), globals_view))
}

fn nap(_ctx: &FuncContext<'_>, _args: &[Zval]) -> Result<Zval, EngineError> {
    std::thread::sleep(std::time::Duration::from_millis(1100));
    Ok(Zval::null())
}

/// `nap()`: blocks just over one second
pub fn nap_function() -> Rc<dyn Callable> {
    Rc::new(NativeFunction::new("nap", Vec::new(), nap))
}

fn fail(_ctx: &FuncContext<'_>, _args: &[Zval]) -> Result<Zval, EngineError> {
    Err(EngineError::Call {
        function: "fail".into(),
        message: "fail() always fails".into(),
    })
}

pub fn fail_function() -> Rc<dyn Callable> {
    Rc::new(NativeFunction::new("fail", Vec::new(), fail))
}
