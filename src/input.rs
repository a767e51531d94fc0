// File: src/input.rs
use std::io::{self, BufRead};

/// One input line, read as bytes so that a stray non-UTF-8 line cannot stall a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawLine {
    Text(String),
    /// Not valid UTF-8; holds the lossy decoding for reporting.
    Undecodable(String),
}

impl RawLine {
    pub fn text(&self) -> &str {
        match self {
            RawLine::Text(text) | RawLine::Undecodable(text) => text,
        }
    }
}

/// Reads the next line without its `\n`/`\r\n` ending. `Ok(None)` at end of input.
pub fn read_raw_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<RawLine>> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(Some(match std::str::from_utf8(buf) {
        Ok(text) => RawLine::Text(text.to_string()),
        Err(_) => RawLine::Undecodable(String::from_utf8_lossy(buf).into_owned()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_line_does_not_stop_reading() {
        let mut input: &[u8] = b"dog\r\ncaf\xe9\ncat";
        let mut buf = Vec::new();
        let mut lines = Vec::new();
        while let Some(line) = read_raw_line(&mut input, &mut buf).unwrap() {
            lines.push(line);
        }
        assert_eq!(
            lines,
            vec![
                RawLine::Text("dog".into()),
                RawLine::Undecodable("caf\u{fffd}".into()),
                RawLine::Text("cat".into()),
            ]
        );
    }
}
