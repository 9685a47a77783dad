//! Execution contexts
//!
//! Every scope is a [`Context`]: a container-like view over its variable
//! bindings plus access to the process-wide [`Global`].
//!
//! - [`RootContext`]: the global scope, owns the global symbol table
//! - [`FuncContext`]: one per call; empty locals, bound receiver, fixed
//!   argument list and a reference to the caller used only to reach
//!   configuration and output
//!
//! Reserved names (`$GLOBALS`, `$this`) are intercepted before the generic
//! symbol table lookup.
//!
//! Reference: $PHP_SRC_PATH/Zend/zend_execute_API.c - zend_rebuild_symbol_table

use crate::core::array::{ArrayIter, ArrayKey, PhpArray};
use crate::core::value::{ObjectRef, Val};
use crate::core::zval::Zval;
use crate::runtime::error::{BindingAction, EngineError, EngineResult};
use crate::runtime::global::{Config, Global};
use crate::runtime::output::ErrorLevel;
use smallvec::SmallVec;
use std::rc::Rc;

pub const INLINE_ARG_CAPACITY: usize = 8;
pub type ArgList = SmallVec<[Zval; INLINE_ARG_CAPACITY]>;

/// Variable names with engine-defined meaning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservedName {
    Globals,
    This,
}

const RESERVED_NAMES: &[(ReservedName, &[u8])] = &[
    (ReservedName::Globals, b"GLOBALS"),
    (ReservedName::This, b"this"),
];

impl ReservedName {
    pub fn lookup(name: &[u8]) -> Option<Self> {
        RESERVED_NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(kind, _)| *kind)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReservedName::Globals => "GLOBALS",
            ReservedName::This => "this",
        }
    }

    fn protected(self, action: BindingAction) -> EngineError {
        EngineError::ProtectedBinding {
            name: self.as_str().to_string(),
            action,
        }
    }
}

pub trait Context {
    fn global(&self) -> &Rc<Global>;

    /// The global scope at the bottom of the chain
    fn root(&self) -> &RootContext;

    /// Bound receiver, if any
    fn this(&self) -> Option<&ObjectRef>;

    /// `n`-th caller up the chain (1 = immediate caller)
    fn parent(&self, n: usize) -> Option<&dyn Context>;

    fn offset_exists(&self, name: &[u8]) -> EngineResult<bool>;

    /// Binding for `name`; a fresh null holder when absent
    fn offset_get(&self, name: &[u8]) -> EngineResult<Zval>;

    fn offset_set(&self, name: &[u8], value: Zval) -> EngineResult<()>;

    fn offset_unset(&self, name: &[u8]) -> EngineResult<()>;

    fn count(&self) -> i64;

    fn new_iterator(&self) -> ArrayIter;

    fn config(&self) -> &Config {
        self.global().config()
    }

    fn get_config(&self, name: &str, default: Val) -> Val {
        self.global().get_config(name, default)
    }

    fn write(&self, bytes: &[u8]) -> EngineResult<usize> {
        self.global().write(bytes)
    }

    fn report(&self, level: ErrorLevel, message: &str) {
        self.global().report(level, message)
    }
}

pub struct RootContext {
    globals: PhpArray,
    global: Rc<Global>,
}

impl RootContext {
    pub fn new(global: Rc<Global>) -> Self {
        Self {
            globals: PhpArray::new(),
            global,
        }
    }

    /// Fresh array reflecting the global bindings at the time of the call
    pub fn as_array(&self) -> PhpArray {
        self.globals.duplicate()
    }
}

impl Context for RootContext {
    fn global(&self) -> &Rc<Global> {
        &self.global
    }

    fn root(&self) -> &RootContext {
        self
    }

    fn this(&self) -> Option<&ObjectRef> {
        None
    }

    fn parent(&self, _n: usize) -> Option<&dyn Context> {
        None
    }

    fn offset_exists(&self, name: &[u8]) -> EngineResult<bool> {
        if ReservedName::lookup(name) == Some(ReservedName::Globals) {
            return Ok(true);
        }
        Ok(self.globals.exists(&ArrayKey::from_bytes(name)))
    }

    fn offset_get(&self, name: &[u8]) -> EngineResult<Zval> {
        if ReservedName::lookup(name) == Some(ReservedName::Globals) {
            return Ok(Zval::new(Val::Array(self.as_array())));
        }
        Ok(self.globals.get(&ArrayKey::from_bytes(name)))
    }

    fn offset_set(&self, name: &[u8], value: Zval) -> EngineResult<()> {
        if let Some(reserved) = ReservedName::lookup(name) {
            return Err(reserved.protected(BindingAction::Assign));
        }
        self.globals.set(Some(ArrayKey::from_bytes(name)), value)
    }

    fn offset_unset(&self, name: &[u8]) -> EngineResult<()> {
        if let Some(reserved) = ReservedName::lookup(name) {
            return Err(reserved.protected(BindingAction::Unset));
        }
        self.globals.unset(&ArrayKey::from_bytes(name));
        Ok(())
    }

    fn count(&self) -> i64 {
        self.globals.count()
    }

    fn new_iterator(&self) -> ArrayIter {
        self.globals.new_iterator()
    }
}

/// Scope of one function invocation
pub struct FuncContext<'a> {
    caller: &'a dyn Context,
    locals: PhpArray,
    this: Option<ObjectRef>,
    args: ArgList,
    function: String,
}

impl<'a> FuncContext<'a> {
    pub fn new(
        caller: &'a dyn Context,
        this: Option<ObjectRef>,
        args: ArgList,
        function: &str,
    ) -> Self {
        Self {
            caller,
            locals: PhpArray::new(),
            this,
            args,
            function: function.to_string(),
        }
    }

    /// Arguments as passed, after by-ref promotion or duplication
    pub fn args(&self) -> &[Zval] {
        &self.args
    }

    pub fn function_name(&self) -> &str {
        &self.function
    }
}

impl Context for FuncContext<'_> {
    fn global(&self) -> &Rc<Global> {
        self.caller.global()
    }

    fn root(&self) -> &RootContext {
        self.caller.root()
    }

    fn this(&self) -> Option<&ObjectRef> {
        self.this.as_ref()
    }

    fn parent(&self, n: usize) -> Option<&dyn Context> {
        if n <= 1 {
            Some(self.caller)
        } else {
            self.caller.parent(n - 1)
        }
    }

    fn offset_exists(&self, name: &[u8]) -> EngineResult<bool> {
        match ReservedName::lookup(name) {
            Some(ReservedName::Globals) => Ok(true),
            Some(ReservedName::This) => Ok(self.this.is_some()),
            None => Ok(self.locals.exists(&ArrayKey::from_bytes(name))),
        }
    }

    fn offset_get(&self, name: &[u8]) -> EngineResult<Zval> {
        match ReservedName::lookup(name) {
            Some(ReservedName::Globals) => Ok(Zval::new(Val::Array(self.root().as_array()))),
            Some(ReservedName::This) => Ok(self
                .this
                .clone()
                .map(|obj| Zval::new(Val::Object(obj)))
                .unwrap_or_default()),
            None => Ok(self.locals.get(&ArrayKey::from_bytes(name))),
        }
    }

    fn offset_set(&self, name: &[u8], value: Zval) -> EngineResult<()> {
        if let Some(reserved) = ReservedName::lookup(name) {
            return Err(reserved.protected(BindingAction::Assign));
        }
        self.locals.set(Some(ArrayKey::from_bytes(name)), value)
    }

    fn offset_unset(&self, name: &[u8]) -> EngineResult<()> {
        if let Some(reserved) = ReservedName::lookup(name) {
            return Err(reserved.protected(BindingAction::Unset));
        }
        self.locals.unset(&ArrayKey::from_bytes(name));
        Ok(())
    }

    fn count(&self) -> i64 {
        self.locals.count()
    }

    fn new_iterator(&self) -> ArrayIter {
        self.locals.new_iterator()
    }
}
