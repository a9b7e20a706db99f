//! Protocol Module
//!
//! Defines the value model and the wire protocol between the add-in and
//! the function server.
//!
//! ## Protocol Format (Binary, big-endian)
//!
//! ### Request
//! ```text
//! ┌──────────────────┬───────────┬──────────────────────────┐
//! │ Name (Text)      │ Count (4) │ Count tagged arguments   │
//! └──────────────────┴───────────┴──────────────────────────┘
//! ```
//!
//! ### Value Tags
//! - 0x01: NUMBER
//! - 0x02: TEXT
//! - 0x03: BOOLEAN
//! - 0x04: ERROR
//! - 0x05: ARRAY
//! - 0x06: MISSING
//! - 0x07: NIL
//!
//! ### Response
//! One tagged value. Strict request/response ordering, no correlation id.

mod value;
mod request;
mod codec;

pub use value::{Array, ErrorCode, Value, ValueKind};
pub use request::Request;
pub use codec::{
    decode_request, decode_value, encode_request, encode_value, put_request, put_value,
    read_request, read_value, write_request, write_value, ByteSource, StreamSource,
    MAX_ARGS, MAX_ARRAY_CELLS, MAX_TEXT_LEN,
};
pub use codec::{
    TAG_ARRAY, TAG_BOOLEAN, TAG_ERROR, TAG_MISSING, TAG_NIL, TAG_NUMBER, TAG_TEXT,
};
