//! HMSQ Core - Hive metastore connector for SQL query engines
//!
//! This library provides catalog metadata access against a Hive-compatible
//! metastore service with:
//!
//! - A hand-written Thrift binary protocol client (no generated code)
//! - Forward-compatible struct decoding via type-directed field skipping
//! - Storage format detection from serde/input-format class names
//! - Partition enumeration with local-filesystem discovery for local tables
//! - Partition predicate pushdown for partitioned scans

pub mod config;
pub mod connector;
pub mod error;
pub mod mapper;
pub mod predicate;
pub mod retry;
pub mod thrift;
pub mod types;

// Re-export commonly used types
pub use config::{HmsConfig, HmsTransport, MetastoreConfig};
pub use connector::{HmsConnector, MetastoreConnector};
pub use error::{ErrorCode, MetastoreError, Result};
pub use predicate::{generate_partition_predicate, ColumnFilter, CompareOp, TableFilterSet};
pub use retry::RetryPolicy;
pub use types::{
    MetastoreFormat, MetastoreNamespace, MetastoreTable, MetastoreTableProperties, PartitionSpec,
    PartitionValue,
};
