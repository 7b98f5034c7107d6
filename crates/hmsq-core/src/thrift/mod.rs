//! Hand-written Thrift binary protocol client.
//!
//! Implements the subset of the Thrift binary protocol the Hive metastore
//! speaks: big-endian primitives, struct/map/set/list framing, unframed
//! request/response messages, and type-directed skipping of fields this
//! client was not written to understand. No generated code and no RPC
//! runtime; everything on the wire is produced and consumed here.

pub mod codec;
pub mod decode;
pub mod rpc;

pub use codec::{TType, ThriftReader, ThriftWriter};
pub use rpc::{HmsRpcClient, MessageKind};
