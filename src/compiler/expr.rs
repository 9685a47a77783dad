//! Expression nodes
//!
//! Only the expressions needed to drive statements are supported:
//! literals, `true`/`false`/`null`, variables, `$a = expr`, `$a = &$b`,
//! function calls, parentheses and `!expr`.

use crate::compiler::runnable::{Node, Outcome, RunResult, Runnable, eval};
use crate::core::value::Val;
use crate::core::zval::Zval;
use crate::parser::lexer::token::{Item, TokenKind};
use crate::parser::span::Loc;
use crate::parser::stream::TokenSource;
use crate::runtime::call::call;
use crate::runtime::context::Context;
use crate::runtime::error::{EngineError, EngineResult, SyntaxError};
use crate::runtime::output::ErrorLevel;
use std::io;

#[derive(Debug)]
pub struct Literal {
    value: Val,
    loc: Loc,
}

impl Literal {
    pub fn new(value: Val, loc: Loc) -> Self {
        Self { value, loc }
    }
}

impl Runnable for Literal {
    fn run(&self, _ctx: &dyn Context) -> RunResult {
        Ok(Outcome::value(Zval::new(self.value.clone())))
    }

    fn loc(&self) -> &Loc {
        &self.loc
    }

    fn dump(&self, w: &mut dyn io::Write) -> io::Result<()> {
        match &self.value {
            Val::Null => w.write_all(b"NULL"),
            Val::Bool(true) => w.write_all(b"true"),
            Val::Bool(false) => w.write_all(b"false"),
            Val::Int(i) => write!(w, "{}", i),
            // overflowing literals lex back to the same infinity
            Val::Float(f) if f.is_infinite() && f.is_sign_positive() => w.write_all(b"1e999"),
            Val::Float(f) if f.is_infinite() => w.write_all(b"-1e999"),
            Val::Float(f) => write!(w, "{:?}", f),
            Val::String(s) => {
                w.write_all(b"'")?;
                for &b in s.iter() {
                    if b == b'\'' || b == b'\\' {
                        w.write_all(b"\\")?;
                    }
                    w.write_all(&[b])?;
                }
                w.write_all(b"'")
            }
            // never produced by the compiler
            other => write!(w, "{:?}", other),
        }
    }
}

#[derive(Debug)]
pub struct Variable {
    name: String,
    loc: Loc,
}

impl Variable {
    pub fn new(name: impl Into<String>, loc: Loc) -> Self {
        Self {
            name: name.into(),
            loc,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Runnable for Variable {
    fn run(&self, ctx: &dyn Context) -> RunResult {
        if ctx.offset_exists(self.name.as_bytes())? {
            return ctx.offset_get(self.name.as_bytes()).map(Outcome::value);
        }
        ctx.report(
            ErrorLevel::Warning,
            &format!("Undefined variable ${}", self.name),
        );
        Ok(Outcome::value(Zval::null()))
    }

    /// Promote the binding to a reference so the returned handle and the
    /// scope observe each other's writes. Creates the binding if absent.
    fn run_ref(&self, ctx: &dyn Context) -> EngineResult<Zval> {
        let name = self.name.as_bytes();
        let current = if ctx.offset_exists(name)? {
            ctx.offset_get(name)?
        } else {
            Zval::null()
        };
        if current.is_ref() {
            return Ok(current);
        }
        let shared = current.share();
        ctx.offset_set(name, shared.clone())?;
        Ok(shared)
    }

    fn loc(&self) -> &Loc {
        &self.loc
    }

    fn dump(&self, w: &mut dyn io::Write) -> io::Result<()> {
        write!(w, "${}", self.name)
    }
}

/// `$name = expr`
#[derive(Debug)]
pub struct Assign {
    name: String,
    value: Node,
    loc: Loc,
}

impl Runnable for Assign {
    fn run(&self, ctx: &dyn Context) -> RunResult {
        let value = eval(self.value.as_ref(), ctx)?.value().duplicate();
        let name = self.name.as_bytes();

        let existing = if ctx.offset_exists(name)? {
            Some(ctx.offset_get(name)?)
        } else {
            None
        };
        match existing {
            // write through so every alias sees the new value
            Some(binding) if binding.is_ref() => binding.set(value.duplicate()),
            _ => ctx.offset_set(name, Zval::new(value.duplicate()))?,
        }
        Ok(Outcome::value(Zval::new(value)))
    }

    fn loc(&self) -> &Loc {
        &self.loc
    }

    fn dump(&self, w: &mut dyn io::Write) -> io::Result<()> {
        write!(w, "${} = ", self.name)?;
        self.value.dump(w)
    }
}

/// `$name = &$target`
#[derive(Debug)]
pub struct AssignRef {
    name: String,
    target: Variable,
    loc: Loc,
}

impl Runnable for AssignRef {
    fn run(&self, ctx: &dyn Context) -> RunResult {
        let shared = self.target.run_ref(ctx)?;
        ctx.offset_set(self.name.as_bytes(), shared.clone())?;
        Ok(Outcome::value(shared))
    }

    fn run_ref(&self, ctx: &dyn Context) -> EngineResult<Zval> {
        self.run(ctx).map(Outcome::into_zval)
    }

    fn loc(&self) -> &Loc {
        &self.loc
    }

    fn dump(&self, w: &mut dyn io::Write) -> io::Result<()> {
        write!(w, "${} = &", self.name)?;
        self.target.dump(w)
    }
}

/// `name(args...)`, resolved at run time
#[derive(Debug)]
pub struct CallExpr {
    name: String,
    args: Vec<Node>,
    loc: Loc,
}

impl Runnable for CallExpr {
    fn run(&self, ctx: &dyn Context) -> RunResult {
        let callee = ctx.global().function(&self.name).ok_or_else(|| {
            EngineError::UndefinedFunction {
                name: self.name.clone(),
            }
        })?;
        call(ctx, callee.as_ref(), &self.args, None).map(Outcome::value)
    }

    fn loc(&self) -> &Loc {
        &self.loc
    }

    fn dump(&self, w: &mut dyn io::Write) -> io::Result<()> {
        write!(w, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                w.write_all(b", ")?;
            }
            arg.dump(w)?;
        }
        w.write_all(b")")
    }
}

/// `!expr`
#[derive(Debug)]
pub struct Not {
    expr: Node,
    loc: Loc,
}

impl Runnable for Not {
    fn run(&self, ctx: &dyn Context) -> RunResult {
        let value = eval(self.expr.as_ref(), ctx)?;
        Ok(Outcome::value(Zval::new(Val::Bool(!value.to_bool()))))
    }

    fn loc(&self) -> &Loc {
        &self.loc
    }

    fn dump(&self, w: &mut dyn io::Write) -> io::Result<()> {
        w.write_all(b"!")?;
        self.expr.dump(w)
    }
}

/// `(expr)`; kept as a node so dumps preserve grouping
#[derive(Debug)]
pub struct Paren {
    expr: Node,
    loc: Loc,
}

impl Runnable for Paren {
    fn run(&self, ctx: &dyn Context) -> RunResult {
        self.expr.run(ctx)
    }

    fn run_ref(&self, ctx: &dyn Context) -> EngineResult<Zval> {
        self.expr.run_ref(ctx)
    }

    fn loc(&self) -> &Loc {
        &self.loc
    }

    fn dump(&self, w: &mut dyn io::Write) -> io::Result<()> {
        w.write_all(b"(")?;
        self.expr.dump(w)?;
        w.write_all(b")")
    }
}

pub(crate) fn expect_single(c: &mut dyn TokenSource, ch: u8) -> Result<Item, SyntaxError> {
    let item = c.next_item()?;
    if !item.is_single(ch) {
        return Err(item.unexpected());
    }
    Ok(item)
}

fn variable_name(item: &Item) -> &str {
    item.literal.strip_prefix('$').unwrap_or(&item.literal)
}

pub fn compile_expr(c: &mut dyn TokenSource) -> Result<Node, SyntaxError> {
    let item = c.next_item()?;
    match item.kind {
        TokenKind::Variable => compile_variable(item, c),
        TokenKind::LNumber => Ok(Box::new(Literal::new(parse_int_literal(&item)?, item.loc))),
        TokenKind::DNumber => Ok(Box::new(Literal::new(parse_float_literal(&item)?, item.loc))),
        TokenKind::ConstantString => Ok(Box::new(Literal::new(
            Val::string(unquote(&item.literal)),
            item.loc,
        ))),
        TokenKind::Identifier => compile_identifier(item, c),
        TokenKind::Single if item.is_single(b'!') => Ok(Box::new(Not {
            expr: compile_expr(c)?,
            loc: item.loc,
        })),
        TokenKind::Single if item.is_single(b'(') => {
            let expr = compile_expr(c)?;
            expect_single(c, b')')?;
            Ok(Box::new(Paren {
                expr,
                loc: item.loc,
            }))
        }
        _ => Err(item.unexpected()),
    }
}

fn compile_variable(item: Item, c: &mut dyn TokenSource) -> Result<Node, SyntaxError> {
    let name = variable_name(&item).to_string();
    let next = c.next_item()?;
    if !next.is_single(b'=') {
        c.backup();
        return Ok(Box::new(Variable::new(name, item.loc)));
    }

    let rhs = c.next_item()?;
    if rhs.is_single(b'&') {
        let target = c.next_item()?;
        if target.kind != TokenKind::Variable {
            return Err(target.unexpected());
        }
        return Ok(Box::new(AssignRef {
            name,
            target: Variable::new(variable_name(&target), target.loc.clone()),
            loc: item.loc,
        }));
    }
    c.backup();
    Ok(Box::new(Assign {
        name,
        value: compile_expr(c)?,
        loc: item.loc,
    }))
}

fn compile_identifier(item: Item, c: &mut dyn TokenSource) -> Result<Node, SyntaxError> {
    match item.literal.to_ascii_lowercase().as_str() {
        "true" => return Ok(Box::new(Literal::new(Val::Bool(true), item.loc))),
        "false" => return Ok(Box::new(Literal::new(Val::Bool(false), item.loc))),
        "null" => return Ok(Box::new(Literal::new(Val::Null, item.loc))),
        _ => {}
    }

    expect_single(c, b'(')?;
    let mut args = Vec::new();
    let next = c.next_item()?;
    if !next.is_single(b')') {
        c.backup();
        loop {
            args.push(compile_expr(c)?);
            let sep = c.next_item()?;
            if sep.is_single(b')') {
                break;
            }
            if !sep.is_single(b',') {
                return Err(sep.unexpected());
            }
        }
    }
    Ok(Box::new(CallExpr {
        name: item.literal,
        args,
        loc: item.loc,
    }))
}

/// Integer literal in decimal, hex, binary or octal. Values beyond the
/// integer range become floats.
fn parse_int_literal(item: &Item) -> Result<Val, SyntaxError> {
    let digits: String = item.literal.chars().filter(|&c| c != '_').collect();
    let lower = digits.to_ascii_lowercase();
    let (body, radix) = if let Some(hex) = lower.strip_prefix("0x") {
        (hex, 16)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        (bin, 2)
    } else if let Some(oct) = lower.strip_prefix("0o") {
        (oct, 8)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (&lower[1..], 8)
    } else {
        (lower.as_str(), 10)
    };

    if body.is_empty() || !body.chars().all(|c| c.is_digit(radix)) {
        return Err(item.unexpected());
    }
    if let Ok(i) = i64::from_str_radix(body, radix) {
        return Ok(Val::Int(i));
    }
    let f = body.chars().fold(0.0f64, |acc, c| {
        acc * radix as f64 + c.to_digit(radix).unwrap_or(0) as f64
    });
    Ok(Val::Float(f))
}

fn parse_float_literal(item: &Item) -> Result<Val, SyntaxError> {
    let digits: String = item.literal.chars().filter(|&c| c != '_').collect();
    digits
        .parse::<f64>()
        .map(Val::Float)
        .map_err(|_| item.unexpected())
}

/// Strip the quotes from a string literal and resolve its escapes.
/// Single-quoted strings only know `\\` and `\'`.
pub fn unquote(literal: &str) -> Vec<u8> {
    let bytes = literal.as_bytes();
    let Some((&quote, rest)) = bytes.split_first() else {
        return Vec::new();
    };
    let s = rest.strip_suffix(&[quote]).unwrap_or(rest);
    if quote == b'\'' {
        unescape_single(s)
    } else {
        unescape_double(s)
    }
}

fn unescape_single(s: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(s.len());
    let mut i = 0;
    while i < s.len() {
        if s[i] == b'\\' && matches!(s.get(i + 1), Some(b'\\' | b'\'')) {
            result.push(s[i + 1]);
            i += 2;
        } else {
            result.push(s[i]);
            i += 1;
        }
    }
    result
}

/// Reference: $PHP_SRC_PATH/Zend/zend_language_scanner.l - zend_scan_escape_string
fn unescape_double(s: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(s.len());
    let mut i = 0;
    while i < s.len() {
        if s[i] != b'\\' || i + 1 >= s.len() {
            result.push(s[i]);
            i += 1;
            continue;
        }
        let mut consumed = 2;
        match s[i + 1] {
            b'n' => result.push(b'\n'),
            b'r' => result.push(b'\r'),
            b't' => result.push(b'\t'),
            b'\\' => result.push(b'\\'),
            b'$' => result.push(b'$'),
            b'"' => result.push(b'"'),
            b'v' => result.push(b'\x0B'), // vertical tab
            b'e' => result.push(b'\x1B'), // escape
            b'f' => result.push(b'\x0C'), // form feed
            // Hexadecimal: \xH or \xHH
            b'x' if s.get(i + 2).is_some_and(u8::is_ascii_hexdigit) => {
                let digits = s[i + 2..]
                    .iter()
                    .take(2)
                    .take_while(|b| b.is_ascii_hexdigit())
                    .count();
                let value = s[i + 2..i + 2 + digits]
                    .iter()
                    .fold(0u32, |acc, &b| acc * 16 + (b as char).to_digit(16).unwrap_or(0));
                result.push(value as u8);
                consumed += digits;
            }
            // Octal: \nnn (up to 3 digits, wraps past 0xFF)
            b'0'..=b'7' => {
                let digits = s[i + 1..]
                    .iter()
                    .take(3)
                    .take_while(|b| (b'0'..=b'7').contains(*b))
                    .count();
                let value = s[i + 1..i + 1 + digits]
                    .iter()
                    .fold(0u32, |acc, &b| acc * 8 + (b - b'0') as u32);
                result.push(value as u8);
                consumed = 1 + digits;
            }
            // Unicode: \u{XXXX}
            b'u' if s.get(i + 2) == Some(&b'{') => {
                let close = s[i + 3..].iter().position(|&b| b == b'}');
                let decoded = close.and_then(|end| {
                    let hex = std::str::from_utf8(&s[i + 3..i + 3 + end]).ok()?;
                    let ch = char::from_u32(u32::from_str_radix(hex, 16).ok()?)?;
                    Some((ch, end))
                });
                match decoded {
                    Some((ch, end)) => {
                        let mut buf = [0u8; 4];
                        result.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                        consumed = 4 + end;
                    }
                    None => result.extend_from_slice(&s[i..i + 2]),
                }
            }
            // Unknown escape, keep both characters
            _ => result.extend_from_slice(&s[i..i + 2]),
        }
        i += consumed;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::runnable::dump_to_string;
    use crate::parser::stream::TokenStream;

    fn compile(src: &str) -> Result<Node, SyntaxError> {
        let mut stream = TokenStream::new(src, "-");
        compile_expr(&mut stream)
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote(r"'a\'b\\c\n'"), b"a'b\\c\\n");
        assert_eq!(unquote(r#""a\tb\"\$""#), b"a\tb\"$");
        assert_eq!(unquote(r#""\x41\101\0""#), b"AA\0");
        assert_eq!(unquote(r#""\u{48}\q""#), b"H\\q");
        assert_eq!(unquote(r#""\u{1F600}""#), "\u{1F600}".as_bytes());
        assert_eq!(unquote(r#""\400""#), b"\0");
    }

    #[test]
    fn test_int_literals() {
        let lit = |s: &str| {
            parse_int_literal(&Item::new(TokenKind::LNumber, s, Loc::new("-".into(), 1, 1)))
        };
        assert_eq!(lit("42").unwrap(), Val::Int(42));
        assert_eq!(lit("1_000").unwrap(), Val::Int(1000));
        assert_eq!(lit("0x1F").unwrap(), Val::Int(31));
        assert_eq!(lit("0b101").unwrap(), Val::Int(5));
        assert_eq!(lit("017").unwrap(), Val::Int(15));
        assert_eq!(lit("0o17").unwrap(), Val::Int(15));
        assert_eq!(lit("0").unwrap(), Val::Int(0));
        assert_eq!(lit("9223372036854775808").unwrap(), Val::Float(9223372036854775808.0));
        assert!(lit("08").is_err());
    }

    #[test]
    fn test_dump_expressions() {
        let cases = [
            ("$a = &$b", "$a = &$b"),
            ("$a = 'it\\'s'", "$a = 'it\\'s'"),
            ("!($x)", "!($x)"),
            ("f(1, 'a\\'b', TRUE, null)", "f(1, 'a\\'b', true, NULL)"),
            ("1.5", "1.5"),
            ("1e999", "1e999"),
        ];
        for (src, expected) in cases {
            let node = compile(src).unwrap();
            assert_eq!(dump_to_string(node.as_ref()), expected, "dump of {}", src);
        }
    }

    #[test]
    fn test_syntax_errors() {
        assert!(compile("$a = &1").is_err());
        assert!(compile("f(1 2)").is_err());
        assert!(compile("(1").is_err());
        let err = compile(")").unwrap_err();
        assert_eq!(err.token, "token \")\"");
    }
}
