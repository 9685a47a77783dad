//! Output sink and diagnostic reporting
//!
//! Script output is a raw byte sink; notices and warnings go through a
//! separate [`ErrorHandler`] so they never mix with program output.

use crate::runtime::error::EngineError;
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

/// PHP error levels matching Zend constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorLevel {
    Notice,      // E_NOTICE
    Warning,     // E_WARNING
    Error,       // E_ERROR
    ParseError,  // E_PARSE
    UserNotice,  // E_USER_NOTICE
    UserWarning, // E_USER_WARNING
    UserError,   // E_USER_ERROR
    Deprecated,  // E_DEPRECATED
}

impl ErrorLevel {
    /// Convert error level to the corresponding bitmask value
    pub fn to_bitmask(self) -> u32 {
        match self {
            ErrorLevel::Error => 1,         // E_ERROR
            ErrorLevel::Warning => 2,       // E_WARNING
            ErrorLevel::ParseError => 4,    // E_PARSE
            ErrorLevel::Notice => 8,        // E_NOTICE
            ErrorLevel::UserError => 256,   // E_USER_ERROR
            ErrorLevel::UserWarning => 512, // E_USER_WARNING
            ErrorLevel::UserNotice => 1024, // E_USER_NOTICE
            ErrorLevel::Deprecated => 8192, // E_DEPRECATED
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ErrorLevel::Notice => "Notice",
            ErrorLevel::Warning => "Warning",
            ErrorLevel::Error => "Error",
            ErrorLevel::ParseError => "Parse error",
            ErrorLevel::UserNotice => "User notice",
            ErrorLevel::UserWarning => "User warning",
            ErrorLevel::UserError => "User error",
            ErrorLevel::Deprecated => "Deprecated",
        }
    }
}

pub trait ErrorHandler {
    /// Report an error/warning/notice at runtime
    fn report(&mut self, level: ErrorLevel, message: &str);
}

/// Default error handler that writes to stderr
pub struct StderrErrorHandler {
    stderr: io::Stderr,
}

impl Default for StderrErrorHandler {
    fn default() -> Self {
        Self {
            stderr: io::stderr(),
        }
    }
}

impl ErrorHandler for StderrErrorHandler {
    fn report(&mut self, level: ErrorLevel, message: &str) {
        // Diagnostics must never abort execution
        let _ = writeln!(self.stderr, "{}: {}", level.label(), message);
        let _ = self.stderr.flush();
    }
}

/// Capturing error handler for testing
pub struct CapturingErrorHandler<F: FnMut(ErrorLevel, &str)> {
    callback: F,
}

impl<F: FnMut(ErrorLevel, &str)> CapturingErrorHandler<F> {
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F: FnMut(ErrorLevel, &str)> ErrorHandler for CapturingErrorHandler<F> {
    fn report(&mut self, level: ErrorLevel, message: &str) {
        (self.callback)(level, message);
    }
}

/// Raw byte sink for script output
pub trait OutputWriter {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, EngineError>;
    fn flush(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}

pub struct StdoutWriter {
    stdout: io::Stdout,
}

impl Default for StdoutWriter {
    fn default() -> Self {
        Self {
            stdout: io::stdout(),
        }
    }
}

impl OutputWriter for StdoutWriter {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, EngineError> {
        self.stdout.write_all(bytes)?;
        Ok(bytes.len())
    }

    fn flush(&mut self) -> Result<(), EngineError> {
        self.stdout.flush()?;
        Ok(())
    }
}

/// Capturing output writer for testing
pub struct CapturingOutputWriter<F: FnMut(&[u8])> {
    callback: F,
}

impl<F: FnMut(&[u8])> CapturingOutputWriter<F> {
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F: FnMut(&[u8])> OutputWriter for CapturingOutputWriter<F> {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, EngineError> {
        (self.callback)(bytes);
        Ok(bytes.len())
    }
}

/// In-memory sink whose contents stay readable through [`BufferWriter::contents`]
#[derive(Debug, Clone, Default)]
pub struct BufferWriter {
    buffer: Rc<RefCell<Vec<u8>>>,
}

impl BufferWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Rc<RefCell<Vec<u8>>> {
        Rc::clone(&self.buffer)
    }
}

impl OutputWriter for BufferWriter {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, EngineError> {
        self.buffer.borrow_mut().extend_from_slice(bytes);
        Ok(bytes.len())
    }
}
