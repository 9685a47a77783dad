//! Callees
//!
//! A [`Callable`] declares its parameters so the dispatcher can decide,
//! position by position, whether an argument is bound by reference or by
//! value. [`NativeFunction`] wraps a Rust handler, [`UserFunction`] wraps a
//! compiled body.

use crate::compiler::runnable::{Node, Outcome, RunResult};
use crate::core::value::Val;
use crate::core::zval::Zval;
use crate::runtime::context::{Context, FuncContext};
use crate::runtime::error::EngineError;

#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    pub name: String,
    pub by_ref: bool,
    pub default: Option<Val>,
}

impl ParamInfo {
    pub fn by_value(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            by_ref: false,
            default: None,
        }
    }

    pub fn by_ref(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            by_ref: true,
            default: None,
        }
    }

    pub fn with_default(mut self, value: Val) -> Self {
        self.default = Some(value);
        self
    }
}

pub trait Callable {
    fn name(&self) -> &str;

    /// Declared parameters, positionally aligned with the arguments
    fn params(&self) -> &[ParamInfo];

    /// Run the body. May yield [`Outcome::Return`]; the dispatcher consumes it.
    fn call(&self, ctx: &FuncContext<'_>, args: &[Zval]) -> RunResult;
}

pub type NativeHandler = fn(&FuncContext<'_>, &[Zval]) -> Result<Zval, EngineError>;

pub struct NativeFunction {
    name: String,
    params: Vec<ParamInfo>,
    handler: NativeHandler,
}

impl NativeFunction {
    pub fn new(name: impl Into<String>, params: Vec<ParamInfo>, handler: NativeHandler) -> Self {
        Self {
            name: name.into(),
            params,
            handler,
        }
    }
}

impl Callable for NativeFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn params(&self) -> &[ParamInfo] {
        &self.params
    }

    fn call(&self, ctx: &FuncContext<'_>, args: &[Zval]) -> RunResult {
        (self.handler)(ctx, args).map(Outcome::value)
    }
}

/// Function whose body is a compiled tree
pub struct UserFunction {
    name: String,
    params: Vec<ParamInfo>,
    body: Node,
}

impl UserFunction {
    pub fn new(name: impl Into<String>, params: Vec<ParamInfo>, body: Node) -> Self {
        Self {
            name: name.into(),
            params,
            body,
        }
    }

    fn too_few_arguments(&self, passed: usize) -> EngineError {
        let required = self.params.iter().filter(|p| p.default.is_none()).count();
        let qualifier = if required == self.params.len() {
            "exactly"
        } else {
            "at least"
        };
        EngineError::Call {
            function: self.name.clone(),
            message: format!(
                "Too few arguments to function {}(), {} passed and {} {} expected",
                self.name, passed, qualifier, required
            ),
        }
    }
}

impl Callable for UserFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn params(&self) -> &[ParamInfo] {
        &self.params
    }

    /// Reference: $PHP_SRC_PATH/Zend/zend_execute.c - i_init_func_execute_data
    fn call(&self, ctx: &FuncContext<'_>, args: &[Zval]) -> RunResult {
        for (i, param) in self.params.iter().enumerate() {
            let holder = match (args.get(i), &param.default) {
                (Some(arg), _) => arg.binding(),
                (None, Some(default)) => Zval::new(default.duplicate()),
                (None, None) => return Err(self.too_few_arguments(args.len())),
            };
            ctx.offset_set(param.name.as_bytes(), holder)?;
        }

        match self.body.run(ctx)? {
            Outcome::Return(value) => Ok(Outcome::Return(value)),
            // falling off the end returns null
            Outcome::Value(_) => Ok(Outcome::none()),
        }
    }
}
