
// Buffered line reader shared by all text parsers of the crate.
// Inspired by: https://stackoverflow.com/questions/45882329/read-large-files-line-by-line-in-rust
use std::io::{self, prelude::*};

use anyhow::*;

/// Character encoding of a text export.
/// MassLynx writes its parameter dumps in latin1, everything else we read is UTF-8.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Encoding {
    Utf8,
    Latin1,
}

pub struct TextReader<R: Read> {
    reader: io::BufReader<R>,
    buf: Vec<u8>,
    encoding: Encoding,
    line_number: usize,
}

impl<R: Read> TextReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_capacity(inner, 64 * 1024)
    }

    pub fn with_capacity(inner: R, capacity: usize) -> Self {
        Self {
            reader: io::BufReader::with_capacity(capacity, inner),
            buf: Vec::with_capacity(1024),
            encoding: Encoding::Utf8,
            line_number: 0,
        }
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// 1-based number of the last line returned by the iterator.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    fn decode(&self, bytes: &[u8]) -> Result<String> {
        match self.encoding {
            Encoding::Utf8 => {
                let s = std::str::from_utf8(bytes)
                    .map_err(|e| anyhow!("invalid UTF-8 on line {}: {}", self.line_number, e))?;
                Ok(s.to_string())
            }
            // every latin1 byte is the code point of the same value
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

impl<R: Read> Iterator for TextReader<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();

        match self.reader.read_until(b'\n', &mut self.buf) {
            Err(e) => Some(Err(e.into())),
            std::result::Result::Ok(0) => None,
            std::result::Result::Ok(_) => {
                self.line_number += 1;

                let mut end = self.buf.len();
                if end > 0 && self.buf[end - 1] == b'\n' { end -= 1 }
                if end > 0 && self.buf[end - 1] == b'\r' { end -= 1 }

                Some(self.decode(&self.buf[..end]))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_line_endings() {
        let lines: Vec<String> = TextReader::new("a\r\nb\n\nc".as_bytes())
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(lines, vec!["a", "b", "", "c"]);
    }

    #[test]
    fn decodes_latin1() {
        let bytes: &[u8] = &[b'T', 0xB0, b'C'];
        let mut reader = TextReader::new(bytes).encoding(Encoding::Latin1);
        assert_eq!(reader.next().unwrap().unwrap(), "T°C");
        assert_eq!(reader.line_number(), 1);
    }

    #[test]
    fn rejects_invalid_utf8() {
        let bytes: &[u8] = &[b'T', 0xB0, b'C'];
        let mut reader = TextReader::new(bytes);
        assert!(reader.next().unwrap().is_err());
    }
}
