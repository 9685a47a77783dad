use crate::core::value::ValType;
use crate::parser::span::Loc;
use std::fmt;
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Unexpected token while compiling; aborts the enclosing construct.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error, unexpected {token} in {loc}")]
pub struct SyntaxError {
    /// Human readable description of the offending token
    pub token: String,
    pub loc: Loc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingAction {
    Assign,
    Unset,
}

impl fmt::Display for BindingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingAction::Assign => f.write_str("re-assign"),
            BindingAction::Unset => f.write_str("unset"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    /// A coercion pair with no defined rule
    #[error("Cannot convert {from} to {to}")]
    ConversionUnsupported { from: ValType, to: ValType },
    /// Write or unset of a reserved pseudo-variable; nothing was mutated
    #[error("Cannot {action} ${name}")]
    ProtectedBinding { name: String, action: BindingAction },
    /// Raised inside a callee body and propagated to the caller as-is
    #[error("{message}")]
    Call { function: String, message: String },
    #[error("Call to undefined function {name}()")]
    UndefinedFunction { name: String },
    #[error("Cannot add element to the array as the next element is already occupied")]
    NextElementOccupied,
    #[error("Maximum execution time of {seconds} second{} exceeded", plural(.seconds))]
    Timeout { seconds: i64 },
    #[error("Execution interrupted")]
    Interrupted,
    #[error("Failed to write output: {0}")]
    Output(String),
}

fn plural(n: &i64) -> &'static str {
    if *n == 1 { "" } else { "s" }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Output(e.to_string())
    }
}
