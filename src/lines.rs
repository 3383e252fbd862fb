//! Numbered line reading shared by the manifest and snapshot parsers

use crate::error::{MtoolError, Result};
use std::io::BufRead;

/// Iterator over `(line, text)` pairs of a line-oriented input
///
/// Lines are split on `\n` and numbered from 1. A line that is not valid
/// UTF-8 is reported as a malformed record on that line.
pub(crate) struct NumberedLines<R> {
    reader: R,
    line: usize,
    buf: Vec<u8>,
}

impl<R: BufRead> NumberedLines<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for NumberedLines<R> {
    type Item = Result<(usize, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                self.line += 1;
                let line = self.line;
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                }
                let text = String::from_utf8(std::mem::take(&mut self.buf))
                    .map_err(|_| MtoolError::malformed(line, "invalid UTF-8"));
                Some(text.map(|text| (line, text)))
            }
            Err(e) => Some(Err(e.into())),
        }
    }
}
