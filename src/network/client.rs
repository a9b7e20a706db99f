//! Protocol Client
//!
//! One synchronous request/response exchange per cell evaluation.

use std::sync::Arc;

use bytes::BytesMut;

use crate::config::ClientConfig;
use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::error::{CellwireError, Result};
use crate::protocol::{decode_value, put_request, Value};
use super::Transport;

/// Issues function calls against a single function server
///
/// ## State
/// - `Unconnected --connect(ok)--> Connected`
/// - `Connected --call(ok)--> Connected`
/// - `Connected --I/O or decode failure--> Unconnected`
/// - `Connected --disconnect()--> Unconnected`
///
/// `call` takes `&mut self`, so a second call can never start while one
/// is in flight on the same client.
///
/// There is no retry: a failed call is reported and the next call dials
/// again.
pub struct ProtocolClient {
    config: ClientConfig,
    transport: Transport,
    diagnostics: Arc<dyn Diagnostics>,

    /// Reused frame buffer
    frame: BytesMut,
}

impl ProtocolClient {
    /// Create a client that reports through `tracing`
    pub fn new(config: ClientConfig) -> Self {
        let diagnostics = Arc::new(TracingDiagnostics::new(config.log_level));
        Self::with_diagnostics(config, diagnostics)
    }

    /// Create a client that reports through the given collaborator
    pub fn with_diagnostics(config: ClientConfig, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            config,
            transport: Transport::new(),
            diagnostics,
            frame: BytesMut::with_capacity(256),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &Arc<dyn Diagnostics> {
        &self.diagnostics
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Connect to the configured endpoint; a no-op when already connected
    pub fn connect(&mut self) -> Result<()> {
        let result = self.transport.connect(
            &self.config.host,
            self.config.port,
            self.config.timeout,
        );
        if let Err(ref e) = result {
            self.report(&format!("connect to {} failed: {}", self.config.endpoint(), e));
        }
        result
    }

    pub fn disconnect(&mut self) {
        self.transport.disconnect();
    }

    /// Call `name` with `args` and block for its result
    pub fn call(&mut self, name: &str, args: &[Value]) -> Result<Value> {
        if args.len() > self.config.max_args {
            let err = CellwireError::ContractViolation(format!(
                "{} called with {} arguments, maximum is {}",
                name,
                args.len(),
                self.config.max_args
            ));
            self.report(&err.to_string());
            return Err(err);
        }

        // Frame first so encode failures never touch the socket
        self.frame.clear();
        if let Err(e) = put_request(&mut self.frame, name.as_bytes(), args) {
            self.report(&format!("{}: {}", name, e));
            return Err(e);
        }

        self.connect()?;

        match self.exchange(name, args.len()) {
            Ok(value) => {
                tracing::trace!("{} returned {:?}", name, value.kind());
                Ok(value)
            }
            Err(e) => {
                // The transport already dropped the socket on I/O failure; a
                // half-decoded frame leaves the stream out of step as well
                if !e.is_connection() {
                    self.transport.disconnect();
                }
                self.report(&format!("{}: {}", name, e));
                Err(e)
            }
        }
    }

    /// Call `name` with no arguments; still sends an explicit zero count
    pub fn call0(&mut self, name: &str) -> Result<Value> {
        self.call(name, &[])
    }

    fn exchange(&mut self, name: &str, argc: usize) -> Result<Value> {
        tracing::trace!(
            "Sending {} with {} args ({} bytes)",
            name,
            argc,
            self.frame.len()
        );

        self.transport.write(&self.frame)?;
        self.transport.flush()?;

        decode_value(&mut self.transport)
    }

    fn report(&self, message: &str) {
        self.diagnostics.set_last_error(message);
    }
}
