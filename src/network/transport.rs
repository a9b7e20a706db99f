//! Transport
//!
//! Owns the single socket to the function server.

use std::io::{self, BufReader, BufWriter, Read, Write};
use std::net::{IpAddr, Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::{CellwireError, Result};
use crate::protocol::ByteSource;

// =============================================================================
// Process-wide network scope
// =============================================================================

static ACTIVE_SCOPES: AtomicUsize = AtomicUsize::new(0);

/// Reference-counted claim on the process networking subsystem
///
/// The first claim marks the subsystem as initialized and the last drop
/// tears it down. A `Transport` holds one only while its socket is open,
/// so a failed dial leaves the count untouched.
#[derive(Debug)]
pub struct NetScope {
    _private: (),
}

impl NetScope {
    fn acquire() -> Self {
        if ACTIVE_SCOPES.fetch_add(1, Ordering::AcqRel) == 0 {
            tracing::debug!("Network subsystem initialized");
        }
        Self { _private: () }
    }

    /// Number of live scopes in this process
    pub fn active() -> usize {
        ACTIVE_SCOPES.load(Ordering::Acquire)
    }
}

impl Drop for NetScope {
    fn drop(&mut self) {
        if ACTIVE_SCOPES.fetch_sub(1, Ordering::AcqRel) == 1 {
            tracing::debug!("Network subsystem released");
        }
    }
}

// =============================================================================
// Transport
// =============================================================================

/// An open socket, split into buffered halves
struct Link {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Peer address for logging
    peer_addr: String,

    timeout: Duration,

    /// Held exactly as long as the socket is open
    _scope: NetScope,
}

/// Owns exactly one connection to a function server
///
/// Lifecycle: unconnected → `connect` → connected → (`disconnect` or any
/// I/O failure) → unconnected.
#[derive(Default)]
pub struct Transport {
    link: Option<Link>,
    dials: u64,
}

impl Transport {
    /// Create an unconnected transport
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Number of real dial attempts made so far
    pub fn dial_count(&self) -> u64 {
        self.dials
    }

    pub fn peer_addr(&self) -> Option<&str> {
        self.link.as_ref().map(|l| l.peer_addr.as_str())
    }

    /// Open the connection; a no-op when already connected
    ///
    /// Resolution, dial and socket option failures all surface as
    /// `Connection` errors.
    pub fn connect(&mut self, host: &str, port: u16, timeout: Duration) -> Result<()> {
        if self.link.is_some() {
            tracing::trace!("Already connected, skipping dial");
            return Ok(());
        }

        self.dials += 1;
        tracing::debug!("Dialing {}:{} (timeout {:?})", host, port, timeout);

        let addrs = resolve(host, port)?;
        let stream = dial(&addrs, timeout)?;

        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| format!("{}:{}", host, port));

        configure(&stream, timeout).map_err(|e| {
            CellwireError::Connection(format!("cannot configure socket to {}: {}", peer_addr, e))
        })?;

        let read_stream = stream.try_clone().map_err(|e| {
            CellwireError::Connection(format!("cannot split socket to {}: {}", peer_addr, e))
        })?;

        tracing::debug!("Connected to {}", peer_addr);
        self.link = Some(Link {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            peer_addr,
            timeout,
            _scope: NetScope::acquire(),
        });
        Ok(())
    }

    /// Close the socket if open; always leaves the transport unconnected
    pub fn disconnect(&mut self) {
        if let Some(link) = self.link.take() {
            let _ = link.writer.get_ref().shutdown(Shutdown::Both);
            tracing::debug!("Disconnected from {}", link.peer_addr);
        }
    }

    /// Buffer `bytes` for sending
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let result = match self.link.as_mut() {
            Some(link) => link.writer.write_all(bytes),
            None => return Err(not_connected()),
        };
        result.map_err(|e| self.fail("write", e))
    }

    /// Push buffered bytes onto the wire
    pub fn flush(&mut self) -> Result<()> {
        let result = match self.link.as_mut() {
            Some(link) => link.writer.flush(),
            None => return Err(not_connected()),
        };
        result.map_err(|e| self.fail("flush", e))
    }

    /// Block until `buf` is full, the peer closes, or the timeout elapses
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let result = match self.link.as_mut() {
            Some(link) => link.reader.read_exact(buf),
            None => return Err(not_connected()),
        };
        result.map_err(|e| self.fail("read", e))
    }

    /// Drop the socket after an I/O failure and describe what happened
    fn fail(&mut self, op: &str, e: io::Error) -> CellwireError {
        let (peer, timeout) = self
            .link
            .as_ref()
            .map(|l| (l.peer_addr.clone(), l.timeout))
            .unwrap_or_else(|| ("unknown".to_string(), Duration::ZERO));

        let message = match e.kind() {
            // Windows reports TimedOut where Unix reports WouldBlock
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
                format!("{} from {} timed out after {:?}", op, peer, timeout)
            }
            io::ErrorKind::UnexpectedEof => format!("{}: {} closed the connection", op, peer),
            _ => format!("{} to {} failed: {}", op, peer, e),
        };

        tracing::debug!("{}; dropping connection", message);
        self.disconnect();
        CellwireError::Connection(message)
    }
}

impl ByteSource for Transport {
    fn fill_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.read_exact(buf)
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn not_connected() -> CellwireError {
    CellwireError::Connection("not connected".to_string())
}

/// Numeric addresses skip the resolver
fn resolve(host: &str, port: u16) -> Result<Vec<SocketAddr>> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(vec![SocketAddr::new(ip, port)]);
    }

    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|e| CellwireError::Connection(format!("cannot resolve {}: {}", host, e)))?
        .collect();

    if addrs.is_empty() {
        return Err(CellwireError::Connection(format!(
            "{} resolved to no addresses",
            host
        )));
    }
    Ok(addrs)
}

/// Try each address in order, keeping the last failure
fn dial(addrs: &[SocketAddr], timeout: Duration) -> Result<TcpStream> {
    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect_timeout(addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                tracing::trace!("Dial {} failed: {}", addr, e);
                last_err = Some((addr, e));
            }
        }
    }

    Err(match last_err {
        Some((addr, e)) => CellwireError::Connection(format!("cannot connect to {}: {}", addr, e)),
        None => CellwireError::Connection("no address to dial".to_string()),
    })
}

fn configure(stream: &TcpStream, timeout: Duration) -> io::Result<()> {
    // Request frames are small; don't let Nagle hold them back
    stream.set_nodelay(true)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;
    Ok(())
}
