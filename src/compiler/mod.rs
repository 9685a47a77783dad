//! Compiles a token stream into an immutable [`Runnable`] tree.

pub mod control_flow;
pub mod expr;
pub mod runnable;
pub mod stmt;

pub use runnable::{Node, Outcome, RunResult, Runnable};

use crate::parser::stream::{TokenSource, TokenStream};
use crate::runtime::error::SyntaxError;

/// Whole-program compiler over any [`TokenSource`]
pub struct Compiler<'a> {
    source: &'a mut dyn TokenSource,
}

impl<'a> Compiler<'a> {
    pub fn new(source: &'a mut dyn TokenSource) -> Self {
        Self { source }
    }

    /// Compile everything up to end of input. A token that closes a
    /// construct which was never opened is a syntax error.
    pub fn compile_program(&mut self) -> Result<Node, SyntaxError> {
        let program = stmt::compile_base(&mut *self.source)?;
        let trailing = self.source.next_item()?;
        if !trailing.is_eof() {
            return Err(trailing.unexpected());
        }
        Ok(program)
    }
}

#[tracing::instrument(level = "debug", skip(src))]
pub fn compile_source(src: &str, filename: &str) -> Result<Node, SyntaxError> {
    let mut stream = TokenStream::new(src, filename);
    Compiler::new(&mut stream).compile_program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::runnable::dump_to_string;

    #[test]
    fn test_compile_program() {
        let program = compile_source("<?php $a = 1;\nif ($a): echo $a; endif;", "-").unwrap();
        assert_eq!(dump_to_string(program.as_ref()), "$a = 1;if ($a) {echo $a;}");
    }

    #[test]
    fn test_unbalanced_closer() {
        let err = compile_source("<?php echo 1; }", "x.php").unwrap_err();
        assert_eq!(
            err.to_string(),
            "syntax error, unexpected token \"}\" in x.php on line 1 column 15"
        );
        let err = compile_source("<?php endif;", "-").unwrap_err();
        assert_eq!(err.token, "token \"endif\"");
    }
}
