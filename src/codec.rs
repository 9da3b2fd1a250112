//! Checked little-endian reading over an in-memory byte slice.
//!
//! Writing has no counterpart here: writers build a `Vec<u8>` with
//! `extend_from_slice(&value.to_le_bytes())` at the call site. Reading goes
//! through [`ByteReader`] so every field access is bounds-checked and a
//! truncated stream surfaces as `UnexpectedEof` naming the missing field.

use std::io;

/// Cursor over a borrowed byte slice with typed little-endian reads.
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Bytes not yet consumed.
    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn take(&mut self, len: usize, field: &str) -> io::Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("truncated {field}"),
            ));
        }
        let slice = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    pub(crate) fn read_u8(&mut self, field: &str) -> io::Result<u8> {
        Ok(self.take(1, field)?[0])
    }

    pub(crate) fn read_i32(&mut self, field: &str) -> io::Result<i32> {
        Ok(i32::from_le_bytes(self.take(4, field)?.try_into().unwrap()))
    }

    pub(crate) fn read_u32(&mut self, field: &str) -> io::Result<u32> {
        Ok(u32::from_le_bytes(self.take(4, field)?.try_into().unwrap()))
    }

    pub(crate) fn read_i64(&mut self, field: &str) -> io::Result<i64> {
        Ok(i64::from_le_bytes(self.take(8, field)?.try_into().unwrap()))
    }

    pub(crate) fn read_f64(&mut self, field: &str) -> io::Result<f64> {
        Ok(f64::from_le_bytes(self.take(8, field)?.try_into().unwrap()))
    }

    pub(crate) fn read_bytes(&mut self, len: usize, field: &str) -> io::Result<&'a [u8]> {
        self.take(len, field)
    }

    /// Reads an `i64` byte length followed by that many UTF-8 bytes.
    pub(crate) fn read_string(&mut self, field: &str) -> io::Result<String> {
        let len = self.read_i64(field)?;
        let len = usize::try_from(len).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("negative length for {field}: {len}"),
            )
        })?;
        let bytes = self.take(len, field)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid UTF-8 in {field}: {e}"),
            )
        })
    }

    /// Reads the next `i32` without advancing the cursor.
    pub(crate) fn peek_i32(&self, field: &str) -> io::Result<i32> {
        if self.remaining() < 4 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("truncated {field}"),
            ));
        }
        Ok(i32::from_le_bytes(
            self.data[self.offset..self.offset + 4].try_into().unwrap(),
        ))
    }

    /// Advances the cursor by `len` bytes without interpreting them.
    pub(crate) fn skip(&mut self, len: usize, field: &str) -> io::Result<()> {
        self.take(len, field)?;
        Ok(())
    }
}

/// Appends an `i64` byte length followed by the UTF-8 bytes of `s`.
pub(crate) fn write_string(buf: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    buf.extend_from_slice(&(bytes.len() as i64).to_le_bytes());
    buf.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_reads() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&42i32.to_le_bytes());
        buf.extend_from_slice(&(-7i64).to_le_bytes());
        buf.extend_from_slice(&1.5f64.to_le_bytes());
        buf.push(1);

        let mut reader = ByteReader::new(&buf);
        assert_eq!(reader.read_i32("a").unwrap(), 42);
        assert_eq!(reader.read_i64("b").unwrap(), -7);
        assert_eq!(reader.read_f64("c").unwrap(), 1.5);
        assert_eq!(reader.read_u8("d").unwrap(), 1);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_string_round_trip() {
        let mut buf = Vec::new();
        write_string(&mut buf, "hello world");

        let mut reader = ByteReader::new(&buf);
        assert_eq!(reader.read_string("greeting").unwrap(), "hello world");
    }

    #[test]
    fn test_truncated_read_names_field() {
        let buf = [0u8; 2];
        let mut reader = ByteReader::new(&buf);
        let err = reader.read_i32("entry marker").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert!(err.to_string().contains("entry marker"));
    }

    #[test]
    fn test_negative_string_length_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(-1i64).to_le_bytes());

        let mut reader = ByteReader::new(&buf);
        let err = reader.read_string("name").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_peek_does_not_advance() {
        let buf = 9i32.to_le_bytes();
        let reader_buf = buf.to_vec();
        let mut reader = ByteReader::new(&reader_buf);
        assert_eq!(reader.peek_i32("marker").unwrap(), 9);
        assert_eq!(reader.read_i32("marker").unwrap(), 9);
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&2i64.to_le_bytes());
        buf.extend_from_slice(&[0xff, 0xfe]);

        let mut reader = ByteReader::new(&buf);
        let err = reader.read_string("name").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
