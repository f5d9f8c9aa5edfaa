// SPDX-License-Identifier: MIT OR Apache-2.0
//! Binary stream primitives for procedure persistence.
//!
//! The on-disk format uses big-endian primitives and length-prefixed UTF-8
//! strings so files are portable across platforms and remain readable by
//! older scene loaders. [`StreamWriter`] and [`StreamReader`] wrap any
//! [`Write`]/[`Read`] and are shared by the procedure framing code and the
//! per-kind payload serializers.

use std::any::Any;
use std::io::{Read, Write};

use thiserror::Error;

/// Errors from the primitive encode layer
#[derive(Debug, Error)]
pub enum StreamError {
    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A string exceeded the 16-bit length prefix
    #[error("string of {0} bytes exceeds the stream limit")]
    StringTooLong(usize),
    /// A string field did not decode as UTF-8
    #[error("stream contained invalid UTF-8")]
    InvalidUtf8,
}

/// Errors surfaced while reconstructing a procedure from a stream
#[derive(Debug, Error)]
pub enum ReadError {
    /// The version tag is not one this implementation understands
    #[error("unsupported procedure format version {0}")]
    InvalidFormat(i16),
    /// A module kind identifier is not present in the registry
    #[error("unknown module kind `{0}`")]
    UnknownKind(String),
    /// A count, index, or payload field was out of range
    #[error("malformed procedure stream: {0}")]
    Malformed(String),
    /// Primitive decode failure
    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl From<std::io::Error> for ReadError {
    fn from(err: std::io::Error) -> Self {
        Self::Stream(StreamError::Io(err))
    }
}

/// Writer half of the procedure binary format
pub struct StreamWriter<'a> {
    out: &'a mut dyn Write,
}

impl<'a> StreamWriter<'a> {
    /// Wrap a byte sink
    pub fn new(out: &'a mut dyn Write) -> Self {
        Self { out }
    }

    /// Write a big-endian `i16`
    pub fn write_i16(&mut self, value: i16) -> Result<(), StreamError> {
        self.out.write_all(&value.to_be_bytes())?;
        Ok(())
    }

    /// Write a big-endian `i32`
    pub fn write_i32(&mut self, value: i32) -> Result<(), StreamError> {
        self.out.write_all(&value.to_be_bytes())?;
        Ok(())
    }

    /// Write a big-endian `f32`
    pub fn write_f32(&mut self, value: f32) -> Result<(), StreamError> {
        self.out.write_all(&value.to_be_bytes())?;
        Ok(())
    }

    /// Write a big-endian `f64`
    pub fn write_f64(&mut self, value: f64) -> Result<(), StreamError> {
        self.out.write_all(&value.to_be_bytes())?;
        Ok(())
    }

    /// Write a string as a 16-bit byte length followed by UTF-8 bytes
    pub fn write_string(&mut self, value: &str) -> Result<(), StreamError> {
        let bytes = value.as_bytes();
        let len =
            u16::try_from(bytes.len()).map_err(|_| StreamError::StringTooLong(bytes.len()))?;
        self.out.write_all(&len.to_be_bytes())?;
        self.out.write_all(bytes)?;
        Ok(())
    }
}

/// Reader half of the procedure binary format
pub struct StreamReader<'a> {
    input: &'a mut dyn Read,
}

impl<'a> StreamReader<'a> {
    /// Wrap a byte source
    pub fn new(input: &'a mut dyn Read) -> Self {
        Self { input }
    }

    /// Read a big-endian `i16`
    pub fn read_i16(&mut self) -> Result<i16, StreamError> {
        let mut buf = [0u8; 2];
        self.input.read_exact(&mut buf)?;
        Ok(i16::from_be_bytes(buf))
    }

    /// Read a big-endian `i32`
    pub fn read_i32(&mut self) -> Result<i32, StreamError> {
        let mut buf = [0u8; 4];
        self.input.read_exact(&mut buf)?;
        Ok(i32::from_be_bytes(buf))
    }

    /// Read a big-endian `f32`
    pub fn read_f32(&mut self) -> Result<f32, StreamError> {
        let mut buf = [0u8; 4];
        self.input.read_exact(&mut buf)?;
        Ok(f32::from_be_bytes(buf))
    }

    /// Read a big-endian `f64`
    pub fn read_f64(&mut self) -> Result<f64, StreamError> {
        let mut buf = [0u8; 8];
        self.input.read_exact(&mut buf)?;
        Ok(f64::from_be_bytes(buf))
    }

    /// Read a string written by [`StreamWriter::write_string`]
    pub fn read_string(&mut self) -> Result<String, StreamError> {
        let mut len_buf = [0u8; 2];
        self.input.read_exact(&mut len_buf)?;
        let len = u16::from_be_bytes(len_buf) as usize;
        let mut bytes = vec![0u8; len];
        self.input.read_exact(&mut bytes)?;
        String::from_utf8(bytes).map_err(|_| StreamError::InvalidUtf8)
    }
}

/// Opaque host context threaded through payload serialization
///
/// Module kinds whose parameters reference scene-level entities (an image
/// map, an object handle) downcast this to the host's concrete type to
/// resolve them. The engine never looks inside; self-contained kinds ignore
/// it entirely.
pub trait SceneContext {
    /// The context as [`Any`], for downcasting by module kinds
    fn as_any(&self) -> &dyn Any;
}

/// Context for hosts (and tests) whose module kinds are all self-contained
impl SceneContext for () {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_primitives_round_trip() {
        let mut buf = Vec::new();
        {
            let mut w = StreamWriter::new(&mut buf);
            w.write_i16(-7).unwrap();
            w.write_i32(123_456).unwrap();
            w.write_f32(0.25).unwrap();
            w.write_f64(-1.5e300).unwrap();
            w.write_string("marble vein").unwrap();
        }

        let mut cursor = Cursor::new(buf);
        let mut r = StreamReader::new(&mut cursor);
        assert_eq!(r.read_i16().unwrap(), -7);
        assert_eq!(r.read_i32().unwrap(), 123_456);
        assert_eq!(r.read_f32().unwrap(), 0.25);
        assert_eq!(r.read_f64().unwrap(), -1.5e300);
        assert_eq!(r.read_string().unwrap(), "marble vein");
    }

    #[test]
    fn test_integers_are_big_endian() {
        let mut buf = Vec::new();
        StreamWriter::new(&mut buf).write_i32(1).unwrap();
        assert_eq!(buf, [0, 0, 0, 1]);
    }

    #[test]
    fn test_string_length_prefix() {
        let mut buf = Vec::new();
        StreamWriter::new(&mut buf).write_string("ab").unwrap();
        assert_eq!(buf, [0, 2, b'a', b'b']);
    }

    #[test]
    fn test_overlong_string_rejected() {
        let big = "x".repeat(usize::from(u16::MAX) + 1);
        let mut buf = Vec::new();
        let err = StreamWriter::new(&mut buf).write_string(&big);
        assert!(matches!(err, Err(StreamError::StringTooLong(_))));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let mut cursor = Cursor::new(vec![0u8, 2, 0xff, 0xfe]);
        let err = StreamReader::new(&mut cursor).read_string();
        assert!(matches!(err, Err(StreamError::InvalidUtf8)));
    }

    #[test]
    fn test_truncated_stream_is_io_error() {
        let mut cursor = Cursor::new(vec![0u8; 3]);
        let err = StreamReader::new(&mut cursor).read_f64();
        assert!(matches!(err, Err(StreamError::Io(_))));
    }
}
