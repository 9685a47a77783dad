//! Centralized Code Execution API
//!
//! Compiles a script, runs it on a fresh [`RootContext`] and captures its
//! output.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use php_core::runtime::executor::{execute_code, ExecutionConfig};
//!
//! let result = execute_code("<?php return 42;").unwrap();
//! assert_eq!(result.value, Val::Int(42));
//!
//! let mut config = ExecutionConfig::default();
//! config.ini.insert("precision".into(), Val::Int(4));
//! let result = execute_code_with_config("<?php echo 0.333333;", config).unwrap();
//! assert_eq!(result.output_str(), "0.3333");
//! ```

use crate::compiler::compile_source;
use crate::core::value::Val;
use crate::core::zval::Zval;
use crate::runtime::call::catch_return;
use crate::runtime::callable::Callable;
use crate::runtime::context::{Context, RootContext};
use crate::runtime::error::EngineError;
use crate::runtime::global::Global;
use crate::runtime::output::{BufferWriter, CapturingErrorHandler, ErrorLevel};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Result of executing PHP code
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Value of a top-level `return`, or null
    pub value: Val,
    /// Captured script output
    pub output: Vec<u8>,
    /// Notices and warnings reported during the run
    pub diagnostics: Vec<(ErrorLevel, String)>,
}

impl ExecutionResult {
    pub fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

/// Configuration for code execution
#[derive(Clone, Default)]
pub struct ExecutionConfig {
    /// File name used in diagnostics
    pub filename: Option<String>,
    /// ini overrides (`precision`, `max_execution_time`, ...)
    pub ini: IndexMap<String, Val>,
    /// Initial global variables
    pub globals: IndexMap<String, Val>,
    /// Functions callable from the script
    pub functions: Vec<Rc<dyn Callable>>,
    /// External interrupt flag
    pub interrupt: Option<Arc<AtomicBool>>,
}

/// Execute PHP code with default configuration
pub fn execute_code(code: &str) -> Result<ExecutionResult, EngineError> {
    execute_code_with_config(code, ExecutionConfig::default())
}

/// Execute PHP code with custom configuration
pub fn execute_code_with_config(
    code: &str,
    config: ExecutionConfig,
) -> Result<ExecutionResult, EngineError> {
    let filename = config.filename.as_deref().unwrap_or("-");
    let program = compile_source(code, filename)?;

    let buffer = BufferWriter::new();
    let output = buffer.contents();
    let diagnostics: Rc<RefCell<Vec<(ErrorLevel, String)>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&diagnostics);

    let mut builder = Global::builder()
        .with_output(buffer)
        .with_error_handler(CapturingErrorHandler::new(move |level: ErrorLevel, msg: &str| {
            sink.borrow_mut().push((level, msg.to_string()))
        }));
    for (name, value) in config.ini {
        builder = builder.with_config(name, value);
    }
    for function in config.functions {
        builder = builder.with_function(function);
    }
    if let Some(flag) = config.interrupt {
        builder = builder.with_interrupt(flag);
    }

    let root = RootContext::new(builder.build());
    for (name, value) in config.globals {
        root.offset_set(name.as_bytes(), Zval::new(value))?;
    }

    let value = catch_return(program.run(&root))?.value();
    root.global().flush()?;

    let output = output.borrow().clone();
    let diagnostics = diagnostics.borrow().clone();
    Ok(ExecutionResult {
        value,
        output,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_returns_value_and_output() {
        let result = execute_code("<?php echo 'hi'; return 42;").unwrap();
        assert_eq!(result.value, Val::Int(42));
        assert_eq!(result.output_str(), "hi");
    }

    #[test]
    fn test_execute_reports_undefined_variable() {
        let result = execute_code("<?php echo $nope;").unwrap();
        assert_eq!(result.output_str(), "");
        assert_eq!(
            result.diagnostics,
            vec![(ErrorLevel::Warning, "Undefined variable $nope".to_string())]
        );
    }

    #[test]
    fn test_initial_globals() {
        let mut config = ExecutionConfig::default();
        config.globals.insert("x".into(), Val::Int(3));
        let result = execute_code_with_config("<?php return $x;", config).unwrap();
        assert_eq!(result.value, Val::Int(3));
    }
}
