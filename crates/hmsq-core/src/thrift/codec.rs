//! Thrift binary protocol primitives.
//!
//! Big-endian reader/writer for the protocol's type system, plus the
//! recursive `skip` algorithm that keeps the stream byte-accurate across
//! fields the decoder does not recognize. Any short read here is a decode
//! failure: once a read comes up short the stream is no longer reliably
//! positioned, so the error is Transient and the connection is abandoned.

use crate::error::{MetastoreError, Result};
use std::io::{Read, Write};

/// Maximum nesting depth accepted while skipping unknown values. Bounds
/// stack growth on malformed or adversarial payloads.
const MAX_SKIP_DEPTH: u32 = 64;

/// Chunk size for length-prefixed reads. A corrupt 4-byte length must not
/// translate into a multi-gigabyte allocation before the short read is
/// detected, so buffers grow chunk by chunk as bytes actually arrive.
const READ_CHUNK: usize = 4096;

/// Thrift wire type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TType {
    /// End of struct fields
    Stop,
    /// Boolean (one byte, 0 or 1)
    Bool,
    /// Signed byte
    Byte,
    /// 8-byte IEEE float
    Double,
    /// 16-bit integer
    I16,
    /// 32-bit integer
    I32,
    /// 64-bit integer
    I64,
    /// Length-prefixed UTF-8 string
    String,
    /// Nested struct
    Struct,
    /// Map of key/value pairs
    Map,
    /// Set of elements
    Set,
    /// List of elements
    List,
}

impl TType {
    /// Decode a wire tag byte.
    pub fn from_u8(value: u8) -> Result<TType> {
        match value {
            0 => Ok(TType::Stop),
            2 => Ok(TType::Bool),
            3 => Ok(TType::Byte),
            4 => Ok(TType::Double),
            6 => Ok(TType::I16),
            8 => Ok(TType::I32),
            10 => Ok(TType::I64),
            11 => Ok(TType::String),
            12 => Ok(TType::Struct),
            13 => Ok(TType::Map),
            14 => Ok(TType::Set),
            15 => Ok(TType::List),
            other => Err(MetastoreError::transient(format!(
                "unknown Thrift type tag {}",
                other
            ))),
        }
    }

    /// Encode as a wire tag byte.
    pub fn as_u8(&self) -> u8 {
        match self {
            TType::Stop => 0,
            TType::Bool => 2,
            TType::Byte => 3,
            TType::Double => 4,
            TType::I16 => 6,
            TType::I32 => 8,
            TType::I64 => 10,
            TType::String => 11,
            TType::Struct => 12,
            TType::Map => 13,
            TType::Set => 14,
            TType::List => 15,
        }
    }
}

/// Binary protocol reader over any byte stream.
pub struct ThriftReader<R: Read> {
    inner: R,
}

impl<R: Read> ThriftReader<R> {
    /// Wrap a byte stream.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inner.read_exact(buf).map_err(|e| {
            MetastoreError::transient("truncated Thrift stream").with_detail(e.to_string())
        })
    }

    /// Read a single byte.
    pub fn read_byte(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// Read a boolean.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_byte()? != 0)
    }

    /// Read a big-endian i16.
    pub fn read_i16(&mut self) -> Result<i16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(i16::from_be_bytes(buf))
    }

    /// Read a big-endian i32.
    pub fn read_i32(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(i32::from_be_bytes(buf))
    }

    /// Read a big-endian i64.
    pub fn read_i64(&mut self) -> Result<i64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(i64::from_be_bytes(buf))
    }

    /// Read a big-endian f64.
    pub fn read_double(&mut self) -> Result<f64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(f64::from_be_bytes(buf))
    }

    /// Read a length-prefixed UTF-8 string (4-byte length, then raw bytes,
    /// never NUL-terminated).
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_string_len()?;
        let mut buf = Vec::with_capacity(len.min(READ_CHUNK));
        let mut chunk = [0u8; READ_CHUNK];
        let mut remaining = len;
        while remaining > 0 {
            let n = remaining.min(READ_CHUNK);
            self.read_exact(&mut chunk[..n])?;
            buf.extend_from_slice(&chunk[..n]);
            remaining -= n;
        }
        String::from_utf8(buf).map_err(|e| {
            MetastoreError::transient("invalid UTF-8 in Thrift string").with_detail(e.to_string())
        })
    }

    fn read_string_len(&mut self) -> Result<usize> {
        let len = self.read_i32()?;
        if len < 0 {
            return Err(MetastoreError::transient(format!(
                "negative Thrift string length {}",
                len
            )));
        }
        Ok(len as usize)
    }

    /// Read a struct field header. Returns `(TType::Stop, 0)` at end of
    /// struct; the field id is only present on the wire for non-Stop fields.
    pub fn read_field_begin(&mut self) -> Result<(TType, i16)> {
        let ttype = TType::from_u8(self.read_byte()?)?;
        if ttype == TType::Stop {
            return Ok((TType::Stop, 0));
        }
        let field_id = self.read_i16()?;
        Ok((ttype, field_id))
    }

    /// Read a map header: key type, value type, element count.
    pub fn read_map_begin(&mut self) -> Result<(TType, TType, usize)> {
        let key_type = TType::from_u8(self.read_byte()?)?;
        let value_type = TType::from_u8(self.read_byte()?)?;
        let count = self.read_collection_count()?;
        Ok((key_type, value_type, count))
    }

    /// Read a list header: element type, element count.
    pub fn read_list_begin(&mut self) -> Result<(TType, usize)> {
        let elem_type = TType::from_u8(self.read_byte()?)?;
        let count = self.read_collection_count()?;
        Ok((elem_type, count))
    }

    /// Read a set header. Identical framing to a list.
    pub fn read_set_begin(&mut self) -> Result<(TType, usize)> {
        self.read_list_begin()
    }

    fn read_collection_count(&mut self) -> Result<usize> {
        let count = self.read_i32()?;
        if count < 0 {
            return Err(MetastoreError::transient(format!(
                "negative Thrift collection count {}",
                count
            )));
        }
        Ok(count as usize)
    }

    /// Consume exactly the bytes of one value of type `ttype` without
    /// interpreting it, recursing into nested structs, maps, sets, and lists.
    ///
    /// This is what lets decoders read only the fields they understand while
    /// staying byte-accurate for everything else the remote schema carries.
    pub fn skip(&mut self, ttype: TType) -> Result<()> {
        self.skip_inner(ttype, 0)
    }

    fn skip_inner(&mut self, ttype: TType, depth: u32) -> Result<()> {
        if depth > MAX_SKIP_DEPTH {
            return Err(MetastoreError::transient(
                "Thrift skip recursion limit exceeded",
            ));
        }
        match ttype {
            TType::Stop => Err(MetastoreError::transient("cannot skip a Stop tag")),
            TType::Bool | TType::Byte => {
                self.read_byte()?;
                Ok(())
            }
            TType::I16 => {
                self.read_i16()?;
                Ok(())
            }
            TType::I32 => {
                self.read_i32()?;
                Ok(())
            }
            TType::I64 => {
                self.read_i64()?;
                Ok(())
            }
            TType::Double => {
                self.read_double()?;
                Ok(())
            }
            TType::String => {
                // Skip raw bytes without requiring valid UTF-8.
                let len = self.read_string_len()?;
                let mut chunk = [0u8; READ_CHUNK];
                let mut remaining = len;
                while remaining > 0 {
                    let n = remaining.min(READ_CHUNK);
                    self.read_exact(&mut chunk[..n])?;
                    remaining -= n;
                }
                Ok(())
            }
            TType::Struct => {
                loop {
                    let (field_type, _) = self.read_field_begin()?;
                    if field_type == TType::Stop {
                        return Ok(());
                    }
                    self.skip_inner(field_type, depth + 1)?;
                }
            }
            TType::Map => {
                let (key_type, value_type, count) = self.read_map_begin()?;
                for _ in 0..count {
                    self.skip_inner(key_type, depth + 1)?;
                    self.skip_inner(value_type, depth + 1)?;
                }
                Ok(())
            }
            TType::Set | TType::List => {
                let (elem_type, count) = self.read_list_begin()?;
                for _ in 0..count {
                    self.skip_inner(elem_type, depth + 1)?;
                }
                Ok(())
            }
        }
    }
}

/// Binary protocol writer over any byte sink.
pub struct ThriftWriter<W: Write> {
    inner: W,
}

impl<W: Write> ThriftWriter<W> {
    /// Wrap a byte sink.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        self.inner
            .write_all(buf)
            .map_err(|e| MetastoreError::transient("Thrift write failed").with_detail(e.to_string()))
    }

    /// Write a single byte.
    pub fn write_byte(&mut self, value: u8) -> Result<()> {
        self.write_all(&[value])
    }

    /// Write a boolean.
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_byte(u8::from(value))
    }

    /// Write a big-endian i16.
    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.write_all(&value.to_be_bytes())
    }

    /// Write a big-endian i32.
    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_all(&value.to_be_bytes())
    }

    /// Write a big-endian i64.
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.write_all(&value.to_be_bytes())
    }

    /// Write a big-endian f64.
    pub fn write_double(&mut self, value: f64) -> Result<()> {
        self.write_all(&value.to_be_bytes())
    }

    /// Write a length-prefixed UTF-8 string.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_i32(value.len() as i32)?;
        self.write_all(value.as_bytes())
    }

    /// Write a struct field header.
    pub fn write_field_begin(&mut self, ttype: TType, field_id: i16) -> Result<()> {
        self.write_byte(ttype.as_u8())?;
        self.write_i16(field_id)
    }

    /// Write the struct terminator.
    pub fn write_field_stop(&mut self) -> Result<()> {
        self.write_byte(TType::Stop.as_u8())
    }

    /// Write a list header.
    pub fn write_list_begin(&mut self, elem_type: TType, count: usize) -> Result<()> {
        self.write_byte(elem_type.as_u8())?;
        self.write_i32(count as i32)
    }

    /// Write a map header.
    pub fn write_map_begin(&mut self, key_type: TType, value_type: TType, count: usize) -> Result<()> {
        self.write_byte(key_type.as_u8())?;
        self.write_byte(value_type.as_u8())?;
        self.write_i32(count as i32)
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        self.inner
            .flush()
            .map_err(|e| MetastoreError::transient("Thrift flush failed").with_detail(e.to_string()))
    }
}
