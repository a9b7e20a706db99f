//! Value definitions
//!
//! The closed set of cell values that travel between the spreadsheet and
//! the function server.

use std::fmt;
use std::str::FromStr;

use crate::error::{CellwireError, Result};

/// Spreadsheet error codes, numbered the way the host engine numbers them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    Null = 0,
    Div0 = 7,
    Value = 15,
    Ref = 23,
    Name = 29,
    Num = 36,
    NA = 42,
    GettingData = 43,
}

impl ErrorCode {
    /// Look up a code from its wire byte
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ErrorCode::Null),
            7 => Some(ErrorCode::Div0),
            15 => Some(ErrorCode::Value),
            23 => Some(ErrorCode::Ref),
            29 => Some(ErrorCode::Name),
            36 => Some(ErrorCode::Num),
            42 => Some(ErrorCode::NA),
            43 => Some(ErrorCode::GettingData),
            _ => None,
        }
    }

    /// The wire byte for this code
    pub fn code(self) -> u8 {
        self as u8
    }

    /// The literal the spreadsheet shows for this error
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Null => "#NULL!",
            ErrorCode::Div0 => "#DIV/0!",
            ErrorCode::Value => "#VALUE!",
            ErrorCode::Ref => "#REF!",
            ErrorCode::Name => "#NAME?",
            ErrorCode::Num => "#NUM!",
            ErrorCode::NA => "#N/A",
            ErrorCode::GettingData => "#GETTING_DATA",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = CellwireError;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        [
            ErrorCode::Null,
            ErrorCode::Div0,
            ErrorCode::Value,
            ErrorCode::Ref,
            ErrorCode::Name,
            ErrorCode::Num,
            ErrorCode::NA,
            ErrorCode::GettingData,
        ]
        .into_iter()
        .find(|code| code.as_str() == upper)
        .ok_or_else(|| CellwireError::ContractViolation(format!("unknown error literal: {}", s)))
    }
}

/// Discriminant of a [`Value`], useful for logging and error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    Text,
    Boolean,
    Error,
    Array,
    Missing,
    Nil,
}

/// A single cell value or function argument
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Numeric cell content
    Number(f64),

    /// Byte string in the host's single-byte encoding (not UTF-8 aware)
    Text(Vec<u8>),

    Boolean(bool),

    /// Spreadsheet error such as `#DIV/0!`
    Error(ErrorCode),

    /// Rectangular grid of non-array values
    Array(Array),

    /// The caller omitted this argument
    Missing,

    /// Explicit blank, distinct from `Missing`
    Nil,
}

impl Value {
    /// Build a text value from anything byte-like
    pub fn text(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Text(bytes.into())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Number(_) => ValueKind::Number,
            Value::Text(_) => ValueKind::Text,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Error(_) => ValueKind::Error,
            Value::Array(_) => ValueKind::Array,
            Value::Missing => ValueKind::Missing,
            Value::Nil => ValueKind::Nil,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&[u8]> {
        match self {
            Value::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.as_bytes().to_vec())
    }
}

impl From<ErrorCode> for Value {
    fn from(code: ErrorCode) -> Self {
        Value::Error(code)
    }
}

impl From<Array> for Value {
    fn from(array: Array) -> Self {
        Value::Array(array)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            // Single-byte encoding: map each byte to the code point of the same value
            Value::Text(t) => t.iter().try_for_each(|&b| write!(f, "{}", b as char)),
            Value::Boolean(true) => f.write_str("TRUE"),
            Value::Boolean(false) => f.write_str("FALSE"),
            Value::Error(code) => write!(f, "{}", code),
            Value::Array(array) => write!(f, "{}", array),
            Value::Missing | Value::Nil => Ok(()),
        }
    }
}

/// Row-major grid of values
///
/// Fields are private so every `Array` in existence satisfies
/// `cells.len() == rows * cols` and holds no nested arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    rows: usize,
    cols: usize,
    cells: Vec<Value>,
}

impl Array {
    /// Build an array, validating shape and rejecting nested arrays
    pub fn new(rows: usize, cols: usize, cells: Vec<Value>) -> Result<Self> {
        let expected = rows.checked_mul(cols).ok_or_else(|| {
            CellwireError::ContractViolation(format!("array {}x{} overflows", rows, cols))
        })?;

        if cells.len() != expected {
            return Err(CellwireError::ContractViolation(format!(
                "array {}x{} needs {} cells, got {}",
                rows,
                cols,
                expected,
                cells.len()
            )));
        }

        if cells.iter().any(|c| matches!(c, Value::Array(_))) {
            return Err(CellwireError::ContractViolation(
                "arrays cannot be nested inside arrays".to_string(),
            ));
        }

        Ok(Self { rows, cols, cells })
    }

    /// A zero-sized array
    pub fn empty() -> Self {
        Self {
            rows: 0,
            cols: 0,
            cells: Vec::new(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cells(&self) -> &[Value] {
        &self.cells
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell at (row, col), or `None` when out of range
    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells.get(row * self.cols + col)
    }

    /// One row as a slice
    pub fn row(&self, row: usize) -> Option<&[Value]> {
        if row >= self.rows {
            return None;
        }
        let start = row * self.cols;
        Some(&self.cells[start..start + self.cols])
    }

    pub fn into_cells(self) -> Vec<Value> {
        self.cells
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for r in 0..self.rows {
            if r > 0 {
                f.write_str(";")?;
            }
            for c in 0..self.cols {
                if c > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{}", self.cells[r * self.cols + c])?;
            }
        }
        f.write_str("}")
    }
}
