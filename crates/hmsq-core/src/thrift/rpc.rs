//! RPC invocation engine.
//!
//! One invocation is one TCP connection: resolve the endpoint, connect with
//! a bounded timeout, send a framed Call message, read back a Reply or
//! Exception envelope, and validate method-name and sequence-id correlation.
//! There is no pooling or multiplexing; the stream is dropped (and the
//! socket closed) on every exit path.

use crate::config::{HmsConfig, HmsTransport};
use crate::error::{MetastoreError, Result};
use crate::thrift::codec::{TType, ThriftReader, ThriftWriter};
use std::io::{BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Thrift binary protocol version tag (strict write).
const THRIFT_VERSION_1: i32 = 0x8001_0000_u32 as i32;
/// High bits carrying the version in a message header.
const VERSION_MASK: i32 = 0xffff_0000_u32 as i32;

/// Fixed socket timeouts. A configured connection-timeout value exists in
/// `HmsConfig` but the socket layer intentionally keeps these constants;
/// see DESIGN.md.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const SOCKET_TIMEOUT: Duration = Duration::from_secs(60);

/// Thrift message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Request from client to server
    Call,
    /// Successful response
    Reply,
    /// Server-side application exception
    Exception,
    /// Fire-and-forget request (never sent by this client)
    Oneway,
}

impl MessageKind {
    fn from_i32(value: i32) -> Result<MessageKind> {
        match value {
            1 => Ok(MessageKind::Call),
            2 => Ok(MessageKind::Reply),
            3 => Ok(MessageKind::Exception),
            4 => Ok(MessageKind::Oneway),
            other => Err(MetastoreError::transient(format!(
                "unknown Thrift message kind {}",
                other
            ))),
        }
    }

    fn as_i32(&self) -> i32 {
        match self {
            MessageKind::Call => 1,
            MessageKind::Reply => 2,
            MessageKind::Exception => 3,
            MessageKind::Oneway => 4,
        }
    }
}

/// Blocking Thrift RPC client for a single HMS endpoint.
///
/// Opens a fresh connection per invocation. The sequence-id counter is the
/// only shared state and is atomic; everything else is per-call.
pub struct HmsRpcClient {
    config: HmsConfig,
    seqid: AtomicI32,
}

impl HmsRpcClient {
    /// Create a client for the given endpoint configuration.
    pub fn new(config: HmsConfig) -> Self {
        Self {
            config,
            seqid: AtomicI32::new(0),
        }
    }

    /// The endpoint configuration this client was built with.
    pub fn config(&self) -> &HmsConfig {
        &self.config
    }

    /// Perform one RPC invocation.
    ///
    /// `write_args` encodes the argument struct fields (the engine writes
    /// the terminating Stop); `read_result` decodes the method's result
    /// struct from the reply body.
    pub fn invoke<T>(
        &self,
        method: &str,
        write_args: impl FnOnce(&mut ThriftWriter<&mut Vec<u8>>) -> Result<()>,
        read_result: impl FnOnce(&mut ThriftReader<&mut BufReader<TcpStream>>) -> Result<T>,
    ) -> Result<T> {
        if self.config.transport == HmsTransport::ThriftTls {
            return Err(MetastoreError::unsupported(
                "thrift+ssl transport is not supported by this client",
            ));
        }

        let seqid = self.seqid.fetch_add(1, Ordering::Relaxed) + 1;
        let mut stream = self.connect()?;

        // Encode the full request up front so a serialization problem never
        // leaves a half-written message on the socket.
        let mut request = Vec::with_capacity(128);
        {
            let mut writer = ThriftWriter::new(&mut request);
            writer.write_i32(THRIFT_VERSION_1 | MessageKind::Call.as_i32())?;
            writer.write_string(method)?;
            writer.write_i32(seqid)?;
            write_args(&mut writer)?;
            writer.write_field_stop()?;
        }

        debug!(method, seqid, bytes = request.len(), "sending HMS call");
        stream.write_all(&request).map_err(|e| {
            MetastoreError::transient(format!("failed to send {} request", method))
                .with_detail(e.to_string())
        })?;
        stream.flush().map_err(MetastoreError::from)?;

        let mut buffered = BufReader::new(stream);
        let mut reader = ThriftReader::new(&mut buffered);

        let header = reader.read_i32()?;
        if header & VERSION_MASK != THRIFT_VERSION_1 {
            return Err(MetastoreError::transient(format!(
                "Thrift protocol version mismatch in {} reply (header {:#010x})",
                method, header
            )));
        }
        let kind = MessageKind::from_i32(header & 0xff)?;
        let reply_method = reader.read_string()?;
        let reply_seqid = reader.read_i32()?;

        if kind == MessageKind::Exception {
            let (message, exception_type) = read_application_exception(&mut reader)?;
            warn!(method, exception_type, "HMS rejected call");
            return Err(MetastoreError::transient(format!(
                "remote application exception (type {}) from {}",
                exception_type, method
            ))
            .with_detail(message));
        }
        if kind != MessageKind::Reply {
            return Err(MetastoreError::transient(format!(
                "unexpected {:?} message in response to {}",
                kind, method
            )));
        }
        if reply_method != method || reply_seqid != seqid {
            return Err(MetastoreError::transient(format!(
                "response correlation failure: got {}#{}, expected {}#{}",
                reply_method, reply_seqid, method, seqid
            )));
        }

        read_result(&mut reader)
    }

    /// Resolve the endpoint and connect, trying each resolved address in
    /// order; the first successful connection wins.
    fn connect(&self) -> Result<TcpStream> {
        let authority = (self.config.host.as_str(), self.config.port);
        let addrs = authority.to_socket_addrs().map_err(|e| {
            MetastoreError::transient(format!(
                "failed to resolve metastore host {}",
                self.config.host
            ))
            .with_detail(e.to_string())
        })?;

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(SOCKET_TIMEOUT))?;
                    stream.set_write_timeout(Some(SOCKET_TIMEOUT))?;
                    stream.set_nodelay(true)?;
                    debug!(%addr, "connected to HMS");
                    return Ok(stream);
                }
                Err(e) => {
                    debug!(%addr, error = %e, "HMS connection attempt failed");
                    last_error = Some(e);
                }
            }
        }

        let detail = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no addresses resolved".to_string());
        Err(MetastoreError::transient(format!(
            "cannot connect to metastore {}:{}",
            self.config.host, self.config.port
        ))
        .with_detail(detail))
    }
}

/// Decode a `TApplicationException` struct: field 1 = message, field 2 =
/// numeric exception type, everything else skipped.
fn read_application_exception<R: std::io::Read>(
    reader: &mut ThriftReader<R>,
) -> Result<(String, i32)> {
    let mut message = String::new();
    let mut exception_type = 0;
    loop {
        let (ttype, field_id) = reader.read_field_begin()?;
        match (field_id, ttype) {
            (_, TType::Stop) => return Ok((message, exception_type)),
            (1, TType::String) => message = reader.read_string()?,
            (2, TType::I32) => exception_type = reader.read_i32()?,
            (_, other) => reader.skip(other)?,
        }
    }
}
