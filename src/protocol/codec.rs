//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! Every value starts with a one-byte tag. Integers and doubles are
//! big-endian.
//!
//! ```text
//! ┌─────────┬──────────────────────────────────────────────┐
//! │ Tag (1) │ Payload                                      │
//! └─────────┴──────────────────────────────────────────────┘
//!
//! 0x01 Number   f64 (8)
//! 0x02 Text     len u32 (4) + len bytes
//! 0x03 Boolean  0x00 | 0x01
//! 0x04 Error    code (1)
//! 0x05 Array    rows u32 (4) + cols u32 (4) + rows*cols tagged cells
//! 0x06 Missing  -
//! 0x07 Nil      -
//! ```
//!
//! ### Request Frame
//! ```text
//! ┌──────────────────┬───────────┬──────────────────────────┐
//! │ Name (Text)      │ Count (4) │ Count tagged arguments   │
//! └──────────────────┴───────────┴──────────────────────────┘
//! ```
//!
//! ### Response Frame
//! Exactly one tagged value, no envelope.

use std::io::{ErrorKind, Read, Write};

use bytes::{BufMut, BytesMut};

use crate::error::{CellwireError, Result};
use super::{Array, ErrorCode, Request, Value};

pub const TAG_NUMBER: u8 = 0x01;
pub const TAG_TEXT: u8 = 0x02;
pub const TAG_BOOLEAN: u8 = 0x03;
pub const TAG_ERROR: u8 = 0x04;
pub const TAG_ARRAY: u8 = 0x05;
pub const TAG_MISSING: u8 = 0x06;
pub const TAG_NIL: u8 = 0x07;

/// Maximum Text payload accepted on decode (16 MB)
pub const MAX_TEXT_LEN: usize = 16 * 1024 * 1024;

/// Maximum number of cells accepted in a decoded Array
pub const MAX_ARRAY_CELLS: usize = 16 * 1024 * 1024;

/// Hard ceiling on arguments per request frame
pub const MAX_ARGS: usize = 255;

/// Upper bound on up-front Vec reservation driven by a wire count
const PREALLOC_LIMIT: usize = 4096;

// =============================================================================
// Byte Sources
// =============================================================================

/// Something decode can pull exact byte counts from
pub trait ByteSource {
    /// Fill `buf` completely or fail without yielding partial data
    fn fill_exact(&mut self, buf: &mut [u8]) -> Result<()>;
}

/// In-memory bytes; running out is a decode failure
impl ByteSource for &[u8] {
    fn fill_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.len() < buf.len() {
            return Err(CellwireError::Decode(format!(
                "stream exhausted: needed {} bytes, {} available",
                buf.len(),
                self.len()
            )));
        }
        let (head, tail) = self.split_at(buf.len());
        buf.copy_from_slice(head);
        *self = tail;
        Ok(())
    }
}

/// Adapts any `Read` as a [`ByteSource`]
///
/// EOF mid-value is a decode failure; every other I/O error is a
/// connection failure.
pub struct StreamSource<R> {
    inner: R,
}

impl<R: Read> StreamSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Read> ByteSource for StreamSource<R> {
    fn fill_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inner.read_exact(buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => {
                CellwireError::Decode(format!("stream ended mid-value: {}", e))
            }
            _ => CellwireError::Connection(format!("read failed: {}", e)),
        })
    }
}

// =============================================================================
// Value Encoding
// =============================================================================

/// Append one tagged value to `buf`
pub fn put_value(buf: &mut BytesMut, value: &Value) -> Result<()> {
    match value {
        Value::Array(array) => {
            buf.put_u8(TAG_ARRAY);
            buf.put_u32(wire_len(array.rows(), "array rows")?);
            buf.put_u32(wire_len(array.cols(), "array cols")?);
            for cell in array.cells() {
                if let Value::Array(_) = cell {
                    return Err(CellwireError::ContractViolation(
                        "arrays cannot be nested inside arrays".to_string(),
                    ));
                }
                put_value(buf, cell)?;
            }
            Ok(())
        }
        Value::Number(n) => {
            buf.put_u8(TAG_NUMBER);
            buf.put_f64(*n);
            Ok(())
        }
        Value::Text(bytes) => put_text(buf, bytes),
        Value::Boolean(b) => {
            buf.put_u8(TAG_BOOLEAN);
            buf.put_u8(u8::from(*b));
            Ok(())
        }
        Value::Error(code) => {
            buf.put_u8(TAG_ERROR);
            buf.put_u8(code.code());
            Ok(())
        }
        Value::Missing => {
            buf.put_u8(TAG_MISSING);
            Ok(())
        }
        Value::Nil => {
            buf.put_u8(TAG_NIL);
            Ok(())
        }
    }
}

fn put_text(buf: &mut BytesMut, bytes: &[u8]) -> Result<()> {
    let len = wire_len(bytes.len(), "text length")?;
    buf.reserve(1 + 4 + bytes.len());
    buf.put_u8(TAG_TEXT);
    buf.put_u32(len);
    buf.put_slice(bytes);
    Ok(())
}

fn wire_len(n: usize, what: &str) -> Result<u32> {
    u32::try_from(n).map_err(|_| {
        CellwireError::ContractViolation(format!("{} {} does not fit in u32", what, n))
    })
}

/// Encode one value to a fresh byte vector
pub fn encode_value(value: &Value) -> Result<Vec<u8>> {
    let mut buf = BytesMut::new();
    put_value(&mut buf, value)?;
    Ok(buf.to_vec())
}

// =============================================================================
// Request Encoding
// =============================================================================

/// Append a request frame: name, argument count, arguments
pub fn put_request(buf: &mut BytesMut, name: &[u8], args: &[Value]) -> Result<()> {
    if args.len() > MAX_ARGS {
        return Err(CellwireError::ContractViolation(format!(
            "{} arguments exceeds the frame limit of {}",
            args.len(),
            MAX_ARGS
        )));
    }

    put_text(buf, name)?;
    buf.put_u32(args.len() as u32);
    for arg in args {
        put_value(buf, arg)?;
    }
    Ok(())
}

/// Encode a request frame to a fresh byte vector
pub fn encode_request(request: &Request) -> Result<Vec<u8>> {
    let mut buf = BytesMut::new();
    put_request(&mut buf, &request.name, &request.args)?;
    Ok(buf.to_vec())
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode exactly one tagged value
///
/// Either returns a complete value or fails; nothing partial escapes.
pub fn decode_value<S: ByteSource + ?Sized>(source: &mut S) -> Result<Value> {
    let tag = read_u8(source)?;
    decode_payload(tag, source, true)
}

/// Decode one request frame
pub fn decode_request<S: ByteSource + ?Sized>(source: &mut S) -> Result<Request> {
    let tag = read_u8(source)?;
    if tag != TAG_TEXT {
        return Err(CellwireError::Decode(format!(
            "request name must be Text, got tag 0x{:02x}",
            tag
        )));
    }
    let name = read_text(source)?;

    let count = read_u32(source)? as usize;
    if count > MAX_ARGS {
        return Err(CellwireError::Decode(format!(
            "argument count {} exceeds the frame limit of {}",
            count, MAX_ARGS
        )));
    }

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        args.push(decode_value(source)?);
    }

    Ok(Request { name, args })
}

fn decode_payload<S: ByteSource + ?Sized>(
    tag: u8,
    source: &mut S,
    allow_array: bool,
) -> Result<Value> {
    match tag {
        TAG_NUMBER => {
            let mut raw = [0u8; 8];
            source.fill_exact(&mut raw)?;
            Ok(Value::Number(f64::from_be_bytes(raw)))
        }
        TAG_TEXT => Ok(Value::Text(read_text(source)?)),
        TAG_BOOLEAN => match read_u8(source)? {
            0 => Ok(Value::Boolean(false)),
            1 => Ok(Value::Boolean(true)),
            other => Err(CellwireError::Decode(format!(
                "invalid boolean byte 0x{:02x}",
                other
            ))),
        },
        TAG_ERROR => {
            let code = read_u8(source)?;
            ErrorCode::from_code(code)
                .map(Value::Error)
                .ok_or_else(|| CellwireError::Decode(format!("unknown error code {}", code)))
        }
        TAG_ARRAY if allow_array => decode_array(source),
        TAG_ARRAY => Err(CellwireError::Decode(
            "nested array inside array".to_string(),
        )),
        TAG_MISSING => Ok(Value::Missing),
        TAG_NIL => Ok(Value::Nil),
        _ => Err(CellwireError::Decode(format!(
            "unknown value tag: 0x{:02x}",
            tag
        ))),
    }
}

fn decode_array<S: ByteSource + ?Sized>(source: &mut S) -> Result<Value> {
    let rows = read_u32(source)? as usize;
    let cols = read_u32(source)? as usize;

    let count = rows.checked_mul(cols).ok_or_else(|| {
        CellwireError::Decode(format!("array {}x{} overflows addressable memory", rows, cols))
    })?;
    if count > MAX_ARRAY_CELLS {
        return Err(CellwireError::Decode(format!(
            "array of {} cells exceeds limit of {}",
            count, MAX_ARRAY_CELLS
        )));
    }

    let mut cells = Vec::with_capacity(count.min(PREALLOC_LIMIT));
    for _ in 0..count {
        let tag = read_u8(source)?;
        cells.push(decode_payload(tag, source, false)?);
    }

    let array = Array::new(rows, cols, cells).map_err(|e| CellwireError::Decode(e.to_string()))?;
    Ok(Value::Array(array))
}

fn read_text<S: ByteSource + ?Sized>(source: &mut S) -> Result<Vec<u8>> {
    let len = read_u32(source)? as usize;
    if len > MAX_TEXT_LEN {
        return Err(CellwireError::Decode(format!(
            "text too large: {} bytes (max {})",
            len, MAX_TEXT_LEN
        )));
    }

    let mut bytes = vec![0u8; len];
    if len > 0 {
        source.fill_exact(&mut bytes)?;
    }
    Ok(bytes)
}

fn read_u8<S: ByteSource + ?Sized>(source: &mut S) -> Result<u8> {
    let mut raw = [0u8; 1];
    source.fill_exact(&mut raw)?;
    Ok(raw[0])
}

fn read_u32<S: ByteSource + ?Sized>(source: &mut S) -> Result<u32> {
    let mut raw = [0u8; 4];
    source.fill_exact(&mut raw)?;
    Ok(u32::from_be_bytes(raw))
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one request frame from a stream (peer side)
pub fn read_request<R: Read>(reader: &mut R) -> Result<Request> {
    decode_request(&mut StreamSource::new(reader))
}

/// Read one value from a stream
pub fn read_value<R: Read>(reader: &mut R) -> Result<Value> {
    decode_value(&mut StreamSource::new(reader))
}

/// Write a request frame to a stream and flush
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    let bytes = encode_request(request)?;
    write_flush(writer, &bytes)
}

/// Write one value to a stream and flush (peer side response)
pub fn write_value<W: Write>(writer: &mut W, value: &Value) -> Result<()> {
    let bytes = encode_value(value)?;
    write_flush(writer, &bytes)
}

fn write_flush<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<()> {
    writer
        .write_all(bytes)
        .and_then(|_| writer.flush())
        .map_err(|e| CellwireError::Connection(format!("write failed: {}", e)))
}
