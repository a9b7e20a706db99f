//! Request definitions
//!
//! A single function call sent to the function server.

use super::Value;

/// One function call: a name and its ordered arguments
///
/// Built fresh for every call; carries no id and is never retried.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Function name in the host's byte encoding
    pub name: Vec<u8>,

    /// Positional arguments, possibly empty
    pub args: Vec<Value>,
}

impl Request {
    pub fn new(name: impl Into<Vec<u8>>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// A call with no arguments
    pub fn bare(name: impl Into<Vec<u8>>) -> Self {
        Self::new(name, Vec::new())
    }

    /// Function name for log lines
    pub fn name_lossy(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }
}
