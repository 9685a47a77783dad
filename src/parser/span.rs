use serde::Serialize;
use std::fmt;
use std::rc::Rc;

/// Source position of a token or compiled node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Loc {
    pub filename: Rc<str>,
    pub line: usize,
    pub column: usize,
}

impl Loc {
    pub fn new(filename: Rc<str>, line: usize, column: usize) -> Self {
        Self {
            filename,
            line,
            column,
        }
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on line {} column {}",
            self.filename, self.line, self.column
        )
    }
}
