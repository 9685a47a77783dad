//! Statement nodes

use crate::compiler::control_flow::compile_if;
use crate::compiler::expr::{compile_expr, expect_single};
use crate::compiler::runnable::{Node, Outcome, RunResult, Runnable, eval};
use crate::core::convert::precision_of;
use crate::core::value::{Val, ValType};
use crate::parser::lexer::token::TokenKind;
use crate::parser::span::Loc;
use crate::parser::stream::TokenSource;
use crate::runtime::context::Context;
use crate::runtime::error::SyntaxError;
use crate::runtime::output::ErrorLevel;
use std::io;

/// Statements run in order; a return signal stops the sequence.
#[derive(Debug)]
pub struct Sequence {
    items: Vec<Node>,
    loc: Loc,
}

impl Sequence {
    pub fn new(items: Vec<Node>, loc: Loc) -> Self {
        Self { items, loc }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Runnable for Sequence {
    fn run(&self, ctx: &dyn Context) -> RunResult {
        for item in &self.items {
            ctx.global().check_execution()?;
            if let Outcome::Return(value) = item.run(ctx)? {
                return Ok(Outcome::Return(value));
            }
        }
        Ok(Outcome::none())
    }

    fn loc(&self) -> &Loc {
        &self.loc
    }

    fn dump(&self, w: &mut dyn io::Write) -> io::Result<()> {
        for item in &self.items {
            item.dump(w)?;
        }
        Ok(())
    }
}

/// Standalone `{ ... }`
#[derive(Debug)]
pub struct Block {
    body: Node,
    loc: Loc,
}

impl Runnable for Block {
    fn run(&self, ctx: &dyn Context) -> RunResult {
        self.body.run(ctx)
    }

    fn loc(&self) -> &Loc {
        &self.loc
    }

    fn dump(&self, w: &mut dyn io::Write) -> io::Result<()> {
        w.write_all(b"{")?;
        self.body.dump(w)?;
        w.write_all(b"}")
    }
}

#[derive(Debug)]
pub struct Echo {
    args: Vec<Node>,
    loc: Loc,
}

impl Runnable for Echo {
    fn run(&self, ctx: &dyn Context) -> RunResult {
        let precision = precision_of(ctx.config());
        for arg in &self.args {
            let value = eval(arg.as_ref(), ctx)?.value();
            if let Val::Array(_) = value {
                ctx.report(ErrorLevel::Warning, "Array to string conversion");
            }
            if let Val::String(s) = value.as_type(ValType::String, precision)? {
                ctx.write(&s)?;
            }
        }
        Ok(Outcome::none())
    }

    fn loc(&self) -> &Loc {
        &self.loc
    }

    fn dump(&self, w: &mut dyn io::Write) -> io::Result<()> {
        w.write_all(b"echo ")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                w.write_all(b", ")?;
            }
            arg.dump(w)?;
        }
        w.write_all(b";")
    }
}

#[derive(Debug)]
pub struct Return {
    expr: Option<Node>,
    loc: Loc,
}

impl Runnable for Return {
    fn run(&self, ctx: &dyn Context) -> RunResult {
        let value = match &self.expr {
            Some(expr) => eval(expr.as_ref(), ctx)?.duplicate(),
            None => Default::default(),
        };
        Ok(Outcome::Return(value))
    }

    fn loc(&self) -> &Loc {
        &self.loc
    }

    fn dump(&self, w: &mut dyn io::Write) -> io::Result<()> {
        match &self.expr {
            Some(expr) => {
                w.write_all(b"return ")?;
                expr.dump(w)?;
                w.write_all(b";")
            }
            None => w.write_all(b"return;"),
        }
    }
}

/// Expression evaluated for its side effects
#[derive(Debug)]
pub struct ExprStmt {
    expr: Node,
}

impl Runnable for ExprStmt {
    fn run(&self, ctx: &dyn Context) -> RunResult {
        eval(self.expr.as_ref(), ctx)?;
        Ok(Outcome::none())
    }

    fn loc(&self) -> &Loc {
        self.expr.loc()
    }

    fn dump(&self, w: &mut dyn io::Write) -> io::Result<()> {
        self.expr.dump(w)?;
        w.write_all(b";")
    }
}

/// Statements up to the end of input or a token that closes the enclosing
/// construct (`}`, `elseif`, `else`, `endif`). The closing token is left in
/// the stream.
pub fn compile_base(c: &mut dyn TokenSource) -> Result<Node, SyntaxError> {
    let first = c.peek_item()?;
    let mut items = Vec::new();
    loop {
        let next = c.peek_item()?;
        let closes = next.is_eof()
            || next.is_single(b'}')
            || matches!(
                next.kind,
                TokenKind::ElseIf | TokenKind::Else | TokenKind::EndIf
            );
        if closes {
            break;
        }
        items.push(compile_statement(c)?);
    }
    Ok(Box::new(Sequence::new(items, first.loc)))
}

/// Body of a brace-syntax branch: the contents of a `{}` block, or a
/// one-statement sequence. Either way the result is a [`Sequence`].
pub fn compile_branch(c: &mut dyn TokenSource) -> Result<Node, SyntaxError> {
    let item = c.next_item()?;
    if item.is_single(b'{') {
        let body = compile_base(c)?;
        expect_single(c, b'}')?;
        return Ok(body);
    }
    c.backup();
    let loc = item.loc;
    let stmt = compile_statement(c)?;
    Ok(Box::new(Sequence::new(vec![stmt], loc)))
}

pub fn compile_statement(c: &mut dyn TokenSource) -> Result<Node, SyntaxError> {
    let item = c.next_item()?;
    match item.kind {
        TokenKind::If => compile_if(item, c),
        TokenKind::Echo => {
            let mut args = vec![compile_expr(c)?];
            loop {
                let sep = c.next_item()?;
                if sep.is_single(b';') {
                    break;
                }
                if !sep.is_single(b',') {
                    return Err(sep.unexpected());
                }
                args.push(compile_expr(c)?);
            }
            Ok(Box::new(Echo {
                args,
                loc: item.loc,
            }))
        }
        TokenKind::Return => {
            let next = c.next_item()?;
            let expr = if next.is_single(b';') {
                None
            } else {
                c.backup();
                let expr = compile_expr(c)?;
                expect_single(c, b';')?;
                Some(expr)
            };
            Ok(Box::new(Return {
                expr,
                loc: item.loc,
            }))
        }
        TokenKind::Single if item.is_single(b'{') => {
            let body = compile_base(c)?;
            expect_single(c, b'}')?;
            Ok(Box::new(Block {
                body,
                loc: item.loc,
            }))
        }
        // empty statement
        TokenKind::Single if item.is_single(b';') => {
            Ok(Box::new(Sequence::new(Vec::new(), item.loc)))
        }
        TokenKind::Eof | TokenKind::ElseIf | TokenKind::Else | TokenKind::EndIf => {
            Err(item.unexpected())
        }
        _ => {
            c.backup();
            let expr = compile_expr(c)?;
            expect_single(c, b';')?;
            Ok(Box::new(ExprStmt { expr }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::runnable::dump_to_string;
    use crate::parser::stream::TokenStream;

    fn dump(src: &str) -> String {
        let mut stream = TokenStream::new(src, "-");
        let node = compile_base(&mut stream).unwrap();
        dump_to_string(node.as_ref())
    }

    #[test]
    fn test_dump_statements() {
        assert_eq!(dump("<?php echo 1, 'a';"), "echo 1, 'a';");
        assert_eq!(dump("<?php return;"), "return;");
        assert_eq!(dump("<?php return $x;"), "return $x;");
        assert_eq!(dump("<?php $a = 1; { f(); }"), "$a = 1;{f();}");
        assert_eq!(dump("<?php ;"), "");
    }

    #[test]
    fn test_missing_semicolon() {
        let mut stream = TokenStream::new("<?php echo 1", "-");
        let err = compile_base(&mut stream).unwrap_err();
        assert_eq!(err.token, "end of file");

        let mut stream = TokenStream::new("<?php return 1 2;", "-");
        let err = compile_base(&mut stream).unwrap_err();
        assert_eq!(err.token, "integer \"2\"");
    }

    #[test]
    fn test_base_stops_at_closing_tokens() {
        let mut stream = TokenStream::new("<?php echo 1; } echo 2;", "-");
        compile_base(&mut stream).unwrap();
        assert!(stream.next_item().unwrap().is_single(b'}'));
    }

    #[test]
    fn test_branch_shapes_match() {
        let mut braced = TokenStream::new("{ echo 1; }", "-");
        let mut single = TokenStream::new("echo 1;", "-");
        assert_eq!(
            dump_to_string(compile_branch(&mut braced).unwrap().as_ref()),
            dump_to_string(compile_branch(&mut single).unwrap().as_ref())
        );
    }
}
