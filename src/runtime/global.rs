//! Process-wide state shared by every context of one execution
//!
//! A [`Global`] is built once by [`GlobalBuilder`] before execution starts
//! and is read-only afterwards. Contexts hold it by `Rc`; nothing in the
//! engine mutates configuration mid-run.

use crate::core::convert::DEFAULT_PRECISION;
use crate::core::value::Val;
use crate::runtime::callable::Callable;
use crate::runtime::error::EngineError;
use crate::runtime::output::{
    ErrorHandler, ErrorLevel, OutputWriter, StderrErrorHandler, StdoutWriter,
};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// ini-style settings
#[derive(Debug, Clone)]
pub struct Config {
    entries: IndexMap<String, Val>,
}

impl Default for Config {
    fn default() -> Self {
        let mut entries = IndexMap::new();
        entries.insert("precision".to_string(), Val::Int(DEFAULT_PRECISION));
        entries.insert("max_execution_time".to_string(), Val::Int(0));
        Self { entries }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Val>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Stored value for `name`, or `default` when unset
    pub fn get_config(&self, name: &str, default: Val) -> Val {
        self.entries.get(name).cloned().unwrap_or(default)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Val)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

pub struct Global {
    config: Config,
    functions: IndexMap<String, Rc<dyn Callable>>,
    output: RefCell<Box<dyn OutputWriter>>,
    error_handler: RefCell<Box<dyn ErrorHandler>>,
    started: Instant,
    max_execution_time: i64,
    interrupt: Arc<AtomicBool>,
}

impl Global {
    pub fn builder() -> GlobalBuilder {
        GlobalBuilder::new()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn get_config(&self, name: &str, default: Val) -> Val {
        self.config.get_config(name, default)
    }

    /// Function lookup is case-insensitive, like PHP.
    pub fn function(&self, name: &str) -> Option<Rc<dyn Callable>> {
        self.functions.get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn write(&self, bytes: &[u8]) -> Result<usize, EngineError> {
        self.output.borrow_mut().write(bytes)
    }

    pub fn flush(&self) -> Result<(), EngineError> {
        self.output.borrow_mut().flush()
    }

    pub fn report(&self, level: ErrorLevel, message: &str) {
        self.error_handler.borrow_mut().report(level, message);
    }

    /// Flag that interrupts execution at the next statement or call boundary
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    /// Fails once the interrupt flag is raised or `max_execution_time` ran out.
    /// Reference: $PHP_SRC_PATH/Zend/zend_execute_API.c - zend_timeout
    pub fn check_execution(&self) -> Result<(), EngineError> {
        if self.interrupt.load(Ordering::Relaxed) {
            tracing::debug!("execution interrupted");
            return Err(EngineError::Interrupted);
        }
        if self.max_execution_time > 0
            && self.started.elapsed().as_secs() as i64 >= self.max_execution_time
        {
            return Err(EngineError::Timeout {
                seconds: self.max_execution_time,
            });
        }
        Ok(())
    }
}

impl Default for Global {
    fn default() -> Self {
        GlobalBuilder::new().into_global()
    }
}

/// Builder for [`Global`]
///
/// # Example
///
/// ```rust,ignore
/// let global = Global::builder()
///     .with_config("precision", 4)
///     .with_output(BufferWriter::new())
///     .build();
/// ```
pub struct GlobalBuilder {
    config: Config,
    functions: IndexMap<String, Rc<dyn Callable>>,
    output: Option<Box<dyn OutputWriter>>,
    error_handler: Option<Box<dyn ErrorHandler>>,
    interrupt: Option<Arc<AtomicBool>>,
}

impl GlobalBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            functions: IndexMap::new(),
            output: None,
            error_handler: None,
            interrupt: None,
        }
    }

    pub fn with_config(mut self, name: impl Into<String>, value: impl Into<Val>) -> Self {
        self.config.set(name, value);
        self
    }

    pub fn with_function(mut self, function: Rc<dyn Callable>) -> Self {
        self.functions
            .insert(function.name().to_ascii_lowercase(), function);
        self
    }

    pub fn with_output<W: OutputWriter + 'static>(mut self, output: W) -> Self {
        self.output = Some(Box::new(output));
        self
    }

    pub fn with_error_handler<H: ErrorHandler + 'static>(mut self, handler: H) -> Self {
        self.error_handler = Some(Box::new(handler));
        self
    }

    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    pub fn build(self) -> Rc<Global> {
        Rc::new(self.into_global())
    }

    fn into_global(self) -> Global {
        let max_execution_time = self
            .config
            .get_config("max_execution_time", Val::Int(0))
            .to_int();
        tracing::debug!(
            functions = self.functions.len(),
            max_execution_time,
            "global state built"
        );
        Global {
            config: self.config,
            functions: self.functions,
            output: RefCell::new(
                self.output
                    .unwrap_or_else(|| Box::new(StdoutWriter::default())),
            ),
            error_handler: RefCell::new(
                self.error_handler
                    .unwrap_or_else(|| Box::new(StderrErrorHandler::default())),
            ),
            started: Instant::now(),
            max_execution_time,
            interrupt: self.interrupt.unwrap_or_default(),
        }
    }
}

impl Default for GlobalBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::output::BufferWriter;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.get_config("precision", Val::Null), Val::Int(14));
        assert_eq!(
            config.get_config("missing", Val::from("fallback")),
            Val::from("fallback")
        );
    }

    #[test]
    fn test_builder_routes_output() {
        let buffer = BufferWriter::new();
        let contents = buffer.contents();
        let global = Global::builder().with_output(buffer).build();
        global.write(b"abc").unwrap();
        assert_eq!(contents.borrow().as_slice(), b"abc");
    }

    #[test]
    fn test_interrupt_flag() {
        let global = Global::builder().build();
        assert!(global.check_execution().is_ok());
        global.interrupt_handle().store(true, Ordering::Relaxed);
        assert_eq!(global.check_execution(), Err(EngineError::Interrupted));
    }
}
