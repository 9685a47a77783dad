//! Executable tree protocol
//!
//! A compiled program is an immutable tree of [`Runnable`] nodes. Running
//! a node yields one of three outcomes:
//!
//! - `Ok(Outcome::Value(..))`: normal completion, with or without a value
//! - `Ok(Outcome::Return(..))`: an explicit `return`; unwinds every
//!   enclosing statement until the function or script boundary catches it
//! - `Err(EngineError)`: a real failure, propagated unchanged
//!
//! Every node can also write itself back out as source in brace syntax.

use crate::core::zval::Zval;
use crate::parser::span::Loc;
use crate::runtime::context::Context;
use crate::runtime::error::{EngineError, EngineResult};
use std::fmt;
use std::io;

#[derive(Debug, Clone)]
pub enum Outcome {
    Value(Option<Zval>),
    Return(Zval),
}

impl Outcome {
    /// Completion without a value
    pub fn none() -> Self {
        Outcome::Value(None)
    }

    pub fn value(value: Zval) -> Self {
        Outcome::Value(Some(value))
    }

    pub fn is_return(&self) -> bool {
        matches!(self, Outcome::Return(_))
    }

    /// Carried value, null when there is none
    pub fn into_zval(self) -> Zval {
        match self {
            Outcome::Value(value) => value.unwrap_or_default(),
            Outcome::Return(value) => value,
        }
    }
}

pub type RunResult = Result<Outcome, EngineError>;

pub trait Runnable: fmt::Debug {
    fn run(&self, ctx: &dyn Context) -> RunResult;

    /// Storage-sharing handle for by-reference binding. Nodes that do not
    /// name a storage location hand out a shared handle to a temporary.
    fn run_ref(&self, ctx: &dyn Context) -> EngineResult<Zval> {
        Ok(self.run(ctx)?.into_zval().share())
    }

    fn loc(&self) -> &Loc;

    /// Re-serialize as source, always in brace syntax
    fn dump(&self, w: &mut dyn io::Write) -> io::Result<()>;
}

pub type Node = Box<dyn Runnable>;

/// Run an expression node and take its value
pub fn eval(node: &dyn Runnable, ctx: &dyn Context) -> EngineResult<Zval> {
    Ok(node.run(ctx)?.into_zval())
}

/// Exact source bytes of the dump.
pub fn dump_to_bytes(node: &dyn Runnable) -> Vec<u8> {
    let mut buf = Vec::new();
    // writing into a Vec cannot fail
    let _ = node.dump(&mut buf);
    buf
}

/// Dump as text. Lossy: bytes of string literals that are not valid
/// UTF-8 become U+FFFD, so use [`dump_to_bytes`] when recompiling.
pub fn dump_to_string(node: &dyn Runnable) -> String {
    String::from_utf8_lossy(&dump_to_bytes(node)).into_owned()
}
