//! Conditional statement
//!
//! Both surface forms compile to the same [`RunnableIf`] shape:
//!
//! ```text
//! if (cond) stmt [elseif (cond) stmt]* [else stmt]
//! if (cond): stmts [elseif (cond): stmts]* [else: stmts] endif;
//! ```
//!
//! Branch bodies are always statement sequences, so a braced block, a
//! single statement and an alternate-syntax body are indistinguishable
//! once compiled. An `elseif` becomes a nested conditional in the
//! no-branch.

use crate::compiler::expr::{compile_expr, expect_single};
use crate::compiler::runnable::{Node, Outcome, RunResult, Runnable, eval};
use crate::compiler::stmt::{compile_base, compile_branch};
use crate::parser::lexer::token::{Item, TokenKind};
use crate::parser::span::Loc;
use crate::parser::stream::TokenSource;
use crate::runtime::context::Context;
use crate::runtime::error::SyntaxError;
use std::io;

#[derive(Debug)]
pub struct RunnableIf {
    cond: Node,
    yes: Node,
    no: Option<Node>,
    loc: Loc,
}

impl Runnable for RunnableIf {
    fn run(&self, ctx: &dyn Context) -> RunResult {
        if eval(self.cond.as_ref(), ctx)?.to_bool() {
            self.yes.run(ctx)
        } else if let Some(no) = &self.no {
            no.run(ctx)
        } else {
            Ok(Outcome::none())
        }
    }

    fn loc(&self) -> &Loc {
        &self.loc
    }

    fn dump(&self, w: &mut dyn io::Write) -> io::Result<()> {
        w.write_all(b"if (")?;
        self.cond.dump(w)?;
        w.write_all(b") {")?;
        self.yes.dump(w)?;
        w.write_all(b"}")?;
        if let Some(no) = &self.no {
            w.write_all(b" else {")?;
            no.dump(w)?;
            w.write_all(b"}")?;
        }
        Ok(())
    }
}

/// Compile a conditional; `item` is the already consumed `if` or `elseif`.
/// Any unexpected token aborts the whole statement.
pub fn compile_if(item: Item, c: &mut dyn TokenSource) -> Result<Node, SyntaxError> {
    expect_single(c, b'(')?;
    let cond = compile_expr(c)?;
    expect_single(c, b')')?;

    let next = c.next_item()?;
    let (yes, no) = if next.is_single(b':') {
        tracing::trace!(loc = %item.loc, "compiling alternate syntax conditional");
        compile_alternate(c)?
    } else {
        c.backup();
        compile_braced(c)?
    };

    Ok(Box::new(RunnableIf {
        cond,
        yes,
        no,
        loc: item.loc,
    }))
}

/// `if (cond): ... [elseif | else: ... endif; | endif;]`
fn compile_alternate(c: &mut dyn TokenSource) -> Result<(Node, Option<Node>), SyntaxError> {
    let yes = compile_base(c)?;

    let next = c.next_item()?;
    let no = match next.kind {
        // the nested conditional consumes the rest, including `endif;`
        TokenKind::ElseIf => Some(compile_if(next, c)?),
        TokenKind::Else => {
            expect_single(c, b':')?;
            let no = compile_base(c)?;
            let end = c.next_item()?;
            if end.kind != TokenKind::EndIf {
                return Err(end.unexpected());
            }
            expect_single(c, b';')?;
            Some(no)
        }
        TokenKind::EndIf => {
            expect_single(c, b';')?;
            None
        }
        _ => return Err(next.unexpected()),
    };
    Ok((yes, no))
}

/// `if (cond) stmt [elseif ... | else stmt]`; no terminator is required
fn compile_braced(c: &mut dyn TokenSource) -> Result<(Node, Option<Node>), SyntaxError> {
    let yes = compile_branch(c)?;

    let next = c.next_item()?;
    let no = match next.kind {
        TokenKind::ElseIf => Some(compile_if(next, c)?),
        TokenKind::Else => Some(compile_branch(c)?),
        _ => {
            c.backup();
            None
        }
    };
    Ok((yes, no))
}
