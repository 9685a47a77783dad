use crate::parser::span::Loc;
use std::rc::Rc;

/// Maps byte offsets of one source buffer to line/column positions.
#[derive(Debug, Clone)]
pub struct LineIndex {
    filename: Rc<str>,
    /// Offset of the start of each line.
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(filename: &str, source: &[u8]) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(memchr::memchr_iter(b'\n', source).map(|i| i + 1));
        Self {
            filename: Rc::from(filename),
            line_starts,
            len: source.len(),
        }
    }

    /// Returns (line, column) for a given byte offset, both 1-based.
    /// Offsets past the end clamp to the end of input.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(insert_idx) => insert_idx - 1,
        };
        (line + 1, offset - self.line_starts[line] + 1)
    }

    pub fn loc(&self, offset: usize) -> Loc {
        let (line, column) = self.line_col(offset);
        Loc::new(Rc::clone(&self.filename), line, column)
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let index = LineIndex::new("-", b"ab\ncd\n\nef");
        assert_eq!(index.line_col(0), (1, 1));
        assert_eq!(index.line_col(1), (1, 2));
        assert_eq!(index.line_col(3), (2, 1));
        assert_eq!(index.line_col(6), (3, 1));
        assert_eq!(index.line_col(8), (4, 2));
        assert_eq!(index.line_col(100), (4, 3));
    }

    #[test]
    fn test_loc_carries_filename() {
        let index = LineIndex::new("a.php", b"x\ny");
        let loc = index.loc(2);
        assert_eq!(&*loc.filename, "a.php");
        assert_eq!((loc.line, loc.column), (2, 1));
    }
}
