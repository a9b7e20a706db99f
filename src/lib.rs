//! # cellwire
//!
//! Forwards spreadsheet user-defined function calls to a remote function
//! server and hands the typed result back to the calculation engine:
//! - Compact binary codec for spreadsheet values (numbers, text, booleans,
//!   error codes, 2-D arrays, missing/nil sentinels)
//! - Single-socket transport with bounded receive timeout
//! - Strictly synchronous request/response client
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Host integration (calculation thread)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ call(name, args)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   ProtocolClient                             │
//! │          (one outstanding request, no retry)                 │
//! └──────────┬─────────────────────────────────┬────────────────┘
//!            │                                 │ failures
//!            ▼                                 ▼
//!   ┌─────────────────┐               ┌─────────────────┐
//!   │      Codec      │               │   Diagnostics   │
//!   │ (Value <-> wire)│               │  (last error)   │
//!   └────────┬────────┘               └─────────────────┘
//!            │
//!            ▼
//!   ┌─────────────────┐
//!   │    Transport    │
//!   │  (TcpStream)    │
//!   └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod diagnostics;

pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CellwireError, Result};
pub use config::ClientConfig;
pub use diagnostics::{Diagnostics, LogLevel, TracingDiagnostics};
pub use protocol::{Array, ErrorCode, Request, Value};
pub use network::{ProtocolClient, Transport};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of cellwire
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
