//! Reader draining helpers

use std::io::{self, BufReader, BufWriter, Read, Write};

/// Drain a reader to a byte vector
pub fn drain(reader: impl Read) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    BufReader::new(reader).read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Drain a reader to a UTF-8 string
pub fn drain_to_string(reader: impl Read) -> io::Result<String> {
    String::from_utf8(drain(reader)?)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Write each line followed by a newline
pub fn write_lines<W: Write, S: AsRef<str>>(writer: W, lines: &[S]) -> io::Result<()> {
    let mut writer = BufWriter::new(writer);
    for line in lines {
        writeln!(writer, "{}", line.as_ref())?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain() {
        let data: &[u8] = b"hello bytes";
        assert_eq!(drain(data).unwrap(), b"hello bytes");
    }

    #[test]
    fn test_drain_to_string() {
        let data: &[u8] = "caf\u{e9}".as_bytes();
        assert_eq!(drain_to_string(data).unwrap(), "caf\u{e9}");
    }

    #[test]
    fn test_drain_to_string_rejects_invalid_utf8() {
        let data: &[u8] = &[0xFF, 0xFE];
        let err = drain_to_string(data).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_write_lines() {
        let mut out = Vec::new();
        write_lines(&mut out, &["one", "two"]).unwrap();
        assert_eq!(out, b"one\ntwo\n");
    }
}
