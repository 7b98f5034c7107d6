//! CLI command implementations.

pub mod namespaces;
pub mod partitions;
pub mod table;
pub mod tables;
