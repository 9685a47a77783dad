//! Execution core of a PHP-semantics scripting engine.
//!
//! - [`core`]: the value model, holders and the ordered associative container
//! - [`parser`]: the pull-based token source consumed by the compiler
//! - [`compiler`]: compiles tokens into immutable [`compiler::Runnable`] trees
//! - [`runtime`]: execution contexts, call dispatch, configuration and output

pub mod compiler;
pub mod core;
pub mod parser;
pub mod runtime;
