//! Call dispatch
//!
//! [`call`] is the path every compiled call expression takes:
//!
//! 1. Arguments are evaluated in the caller's context, left to right,
//!    before the callee's context exists
//! 2. By-reference parameters receive a shared holder onto the caller's
//!    storage; all others receive a duplicate
//! 3. A fresh [`FuncContext`] is created with empty locals
//! 4. The body runs; its return signal becomes the call's result, any
//!    error propagates unchanged
//!
//! [`call_zval`] skips steps 1 and 2 for trusted internal callers that
//! already hold correctly aliased arguments.
//!
//! Reference: $PHP_SRC_PATH/Zend/zend_execute.c - ZEND_SEND_VAR / ZEND_SEND_REF

use crate::compiler::runnable::{Node, Outcome, RunResult, eval};
use crate::core::value::ObjectRef;
use crate::core::zval::Zval;
use crate::runtime::callable::Callable;
use crate::runtime::context::{ArgList, Context, FuncContext};
use crate::runtime::error::EngineResult;

#[tracing::instrument(level = "debug", skip_all, fields(function = callee.name(), argc = args.len()))]
pub fn call(
    ctx: &dyn Context,
    callee: &dyn Callable,
    args: &[Node],
    this: Option<ObjectRef>,
) -> EngineResult<Zval> {
    ctx.global().check_execution()?;

    let params = callee.params();
    let mut evaluated = ArgList::with_capacity(args.len());
    for (i, arg) in args.iter().enumerate() {
        let by_ref = params.get(i).is_some_and(|p| p.by_ref);
        let holder = if by_ref {
            arg.run_ref(ctx)?
        } else {
            eval(arg.as_ref(), ctx)?.duplicate()
        };
        evaluated.push(holder);
    }

    let call_ctx = FuncContext::new(ctx, this, evaluated, callee.name());
    catch_return(callee.call(&call_ctx, call_ctx.args()))
}

/// Dispatch with pre-evaluated arguments. The caller is responsible for
/// promoting by-reference arguments and duplicating the rest.
#[tracing::instrument(level = "debug", skip_all, fields(function = callee.name(), argc = args.len()))]
pub fn call_zval(
    ctx: &dyn Context,
    callee: &dyn Callable,
    args: ArgList,
    this: Option<ObjectRef>,
) -> EngineResult<Zval> {
    debug_assert!(
        callee
            .params()
            .iter()
            .zip(args.iter())
            .all(|(param, arg)| !param.by_ref || arg.is_ref()),
        "by-reference parameter of {}() received an owned holder",
        callee.name()
    );
    ctx.global().check_execution()?;

    let call_ctx = FuncContext::new(ctx, this, args, callee.name());
    catch_return(callee.call(&call_ctx, call_ctx.args()))
}

/// The only place a return signal is turned back into a plain value
pub fn catch_return(result: RunResult) -> EngineResult<Zval> {
    match result? {
        Outcome::Return(value) => Ok(value),
        Outcome::Value(value) => Ok(value.unwrap_or_default()),
    }
}
