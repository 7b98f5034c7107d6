//! Metastore connector operations.
//!
//! [`MetastoreConnector`] is the flat backend interface the query layer
//! programs against; [`HmsConnector`] is the Hive metastore implementation.
//! Every operation performs one RPC invocation (partition listing and table
//! stats also fetch the table internally for location and partitioning).
//!
//! A connector instance holds a most-recent-namespace-list cache behind a
//! mutex; instances are cheap, so callers wanting parallelism should use one
//! connector per thread rather than sharing one.

use crate::config::HmsConfig;
use crate::error::{MetastoreError, Result};
use crate::mapper;
use crate::thrift::codec::{TType, ThriftReader};
use crate::thrift::decode::{read_exception_message, read_string_list, read_table};
use crate::thrift::rpc::HmsRpcClient;
use crate::types::{
    MetastoreNamespace, MetastoreTable, MetastoreTableProperties, PartitionSpec, PartitionValue,
};
use parking_lot::Mutex;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Backend-neutral metastore operations.
///
/// One flat trait, one implementation per backend. Optional operations carry
/// a default `Unsupported` body so new backends only implement what they can.
pub trait MetastoreConnector {
    /// List all namespaces (databases) in the catalog.
    fn list_namespaces(&self) -> Result<Vec<MetastoreNamespace>>;

    /// List table names within a namespace.
    fn list_tables(&self, namespace: &str) -> Result<Vec<String>>;

    /// Fetch and map a single table.
    fn get_table(&self, namespace: &str, table: &str) -> Result<MetastoreTable>;

    /// List the table's partitions. `predicate` is the textual partition
    /// filter produced by predicate pushdown; empty means unfiltered.
    fn list_partitions(
        &self,
        namespace: &str,
        table: &str,
        predicate: &str,
    ) -> Result<Vec<PartitionValue>>;

    /// Fetch table-level statistics.
    fn get_table_stats(&self, _namespace: &str, _table: &str) -> Result<MetastoreTableProperties> {
        Err(MetastoreError::unsupported(
            "table statistics are not supported by this connector",
        ))
    }
}

/// Hive metastore connector speaking the Thrift binary protocol.
pub struct HmsConnector {
    catalog: String,
    client: HmsRpcClient,
    namespace_cache: Mutex<Vec<String>>,
}

impl HmsConnector {
    /// Build a connector for a parsed endpoint configuration.
    pub fn new(catalog: impl Into<String>, config: HmsConfig) -> Self {
        Self {
            catalog: catalog.into(),
            client: HmsRpcClient::new(config),
            namespace_cache: Mutex::new(Vec::new()),
        }
    }

    /// Build a connector from an endpoint URI such as
    /// `thrift://localhost:9083`.
    pub fn from_endpoint(catalog: impl Into<String>, endpoint: &str) -> Result<Self> {
        Ok(Self::new(catalog, crate::config::parse_hms_endpoint(endpoint)?))
    }

    /// The catalog label this connector was attached under.
    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    /// Namespace names from the most recent successful `list_namespaces`.
    pub fn last_namespaces(&self) -> Vec<String> {
        self.namespace_cache.lock().clone()
    }

    fn fetch_partition_names(&self, namespace: &str, table: &str) -> Result<Vec<String>> {
        let result = self.client.invoke(
            "get_partition_names",
            |w| {
                w.write_field_begin(TType::String, 1)?;
                w.write_string(namespace)?;
                w.write_field_begin(TType::String, 2)?;
                w.write_string(table)?;
                // All partitions; the service treats -1 as unbounded.
                w.write_field_begin(TType::I16, 3)?;
                w.write_i16(-1)
            },
            |r| read_partition_names_result(r, namespace, table),
        )?;
        Ok(result)
    }
}

impl MetastoreConnector for HmsConnector {
    fn list_namespaces(&self) -> Result<Vec<MetastoreNamespace>> {
        let names = self.client.invoke(
            "get_all_databases",
            |_| Ok(()),
            |r| read_string_list_result(r, "get_all_databases"),
        )?;
        info!(catalog = %self.catalog, count = names.len(), "listed HMS namespaces");
        *self.namespace_cache.lock() = names.clone();

        Ok(names
            .into_iter()
            .map(|name| MetastoreNamespace {
                name,
                catalog: self.catalog.clone(),
                description: None,
                location: None,
                properties: MetastoreTableProperties::new(),
            })
            .collect())
    }

    fn list_tables(&self, namespace: &str) -> Result<Vec<String>> {
        let names = self.client.invoke(
            "get_all_tables",
            |w| {
                w.write_field_begin(TType::String, 1)?;
                w.write_string(namespace)
            },
            |r| read_string_list_result(r, "get_all_tables"),
        )?;
        debug!(namespace, count = names.len(), "listed HMS tables");
        Ok(names)
    }

    fn get_table(&self, namespace: &str, table: &str) -> Result<MetastoreTable> {
        let raw = self.client.invoke(
            "get_table",
            |w| {
                w.write_field_begin(TType::String, 1)?;
                w.write_string(namespace)?;
                w.write_field_begin(TType::String, 2)?;
                w.write_string(table)
            },
            |r| read_table_result(r, namespace, table),
        )?;

        mapper::map_table(
            &self.catalog,
            namespace,
            table,
            raw.storage,
            PartitionSpec {
                columns: raw.partition_keys,
            },
            raw.parameters,
            raw.owner,
        )
    }

    fn list_partitions(
        &self,
        namespace: &str,
        table: &str,
        predicate: &str,
    ) -> Result<Vec<PartitionValue>> {
        let resolved = self.get_table(namespace, table)?;
        if !resolved.is_partitioned() {
            debug!(namespace, table, "table is unpartitioned");
            return Ok(Vec::new());
        }
        if !predicate.is_empty() {
            // The modeled wire method enumerates all names; the predicate is
            // carried for callers that post-filter. See DESIGN.md.
            debug!(namespace, table, predicate, "partition predicate supplied");
        }

        let mut names = self.fetch_partition_names(namespace, table)?;

        let location = normalize_location(&resolved.storage_descriptor.location);
        let depth = resolved.partition_spec.columns.len();
        if is_local_path(&location) {
            let discovered = discover_local_partitions(Path::new(&location), depth);
            if !discovered.is_empty() {
                debug!(
                    namespace,
                    table,
                    count = discovered.len(),
                    "local partition discovery superseded remote listing"
                );
                names = discovered;
            }
        }

        Ok(names
            .into_iter()
            .map(|name| PartitionValue {
                values: parse_partition_values(&name),
                location: join_location(&location, &name),
            })
            .collect())
    }

    fn get_table_stats(&self, namespace: &str, table: &str) -> Result<MetastoreTableProperties> {
        // HMS keeps table-level stats (numRows, totalSize, ...) in the
        // table's parameter map.
        let resolved = self.get_table(namespace, table)?;
        Ok(resolved.properties)
    }
}

/// Decode a `list<string>`-returning result struct: field 0 = value,
/// field 1 = remote failure.
fn read_string_list_result<R: Read>(
    reader: &mut ThriftReader<R>,
    method: &str,
) -> Result<Vec<String>> {
    let mut values = Vec::new();
    loop {
        let (ttype, field_id) = reader.read_field_begin()?;
        match (field_id, ttype) {
            (_, TType::Stop) => return Ok(values),
            (0, TType::List) => values = read_string_list(reader)?,
            (1, TType::Struct) => {
                let message = read_exception_message(reader)?;
                return Err(MetastoreError::transient(format!(
                    "metastore error from {}",
                    method
                ))
                .with_detail(message));
            }
            (_, other) => reader.skip(other)?,
        }
    }
}

/// Decode the `get_table` result struct: field 0 = table, field 1 = general
/// metastore failure, field 2 = no-such-object.
fn read_table_result<R: Read>(
    reader: &mut ThriftReader<R>,
    namespace: &str,
    table: &str,
) -> Result<crate::thrift::decode::RawTable> {
    let mut value = None;
    loop {
        let (ttype, field_id) = reader.read_field_begin()?;
        match (field_id, ttype) {
            (_, TType::Stop) => {
                return value.ok_or_else(|| {
                    MetastoreError::transient(format!(
                        "empty get_table result for {}.{}",
                        namespace, table
                    ))
                });
            }
            (0, TType::Struct) => value = Some(read_table(reader)?),
            (1, TType::Struct) => {
                let message = read_exception_message(reader)?;
                return Err(MetastoreError::transient(format!(
                    "metastore error fetching {}.{}",
                    namespace, table
                ))
                .with_detail(message));
            }
            (2, TType::Struct) => {
                let message = read_exception_message(reader)?;
                return Err(MetastoreError::not_found(format!(
                    "table {}.{} not found",
                    namespace, table
                ))
                .with_detail(message));
            }
            (_, other) => reader.skip(other)?,
        }
    }
}

/// Decode the `get_partition_names` result struct: field 0 = names,
/// field 1 = no-such-object (mapped to an empty listing), field 2 = general
/// metastore failure.
fn read_partition_names_result<R: Read>(
    reader: &mut ThriftReader<R>,
    namespace: &str,
    table: &str,
) -> Result<Vec<String>> {
    let mut names = Vec::new();
    loop {
        let (ttype, field_id) = reader.read_field_begin()?;
        match (field_id, ttype) {
            (_, TType::Stop) => return Ok(names),
            (0, TType::List) => names = read_string_list(reader)?,
            (1, TType::Struct) => {
                // A table without registered partitions is a valid listing,
                // not an error.
                let message = read_exception_message(reader)?;
                debug!(namespace, table, message, "no partitions registered");
                return Ok(Vec::new());
            }
            (2, TType::Struct) => {
                let message = read_exception_message(reader)?;
                return Err(MetastoreError::transient(format!(
                    "metastore error listing partitions of {}.{}",
                    namespace, table
                ))
                .with_detail(message));
            }
            (_, other) => reader.skip(other)?,
        }
    }
}

/// Strip a `file://` or `file:` prefix and trailing slashes.
pub fn normalize_location(location: &str) -> String {
    let stripped = location
        .strip_prefix("file://")
        .or_else(|| location.strip_prefix("file:"))
        .unwrap_or(location);
    stripped.trim_end_matches('/').to_string()
}

fn is_local_path(normalized: &str) -> bool {
    !normalized.is_empty() && !normalized.contains("://")
}

fn join_location(base: &str, partition_name: &str) -> String {
    if base.is_empty() {
        return partition_name.to_string();
    }
    format!("{}/{}", base, partition_name)
}

/// Split a partition name (`key=value` segments joined by '/') into its
/// ordered value list. A segment without '=' contributes its raw text.
pub fn parse_partition_values(name: &str) -> Vec<String> {
    name.split('/')
        .map(|segment| match segment.split_once('=') {
            Some((_, value)) => value.to_string(),
            None => segment.to_string(),
        })
        .collect()
}

/// Walk a local table directory exactly `depth` levels deep, collecting
/// '/'-joined partition names. Directories whose names lack '=' are not
/// partition levels. Results are sorted and deduplicated.
pub fn discover_local_partitions(root: &Path, depth: usize) -> Vec<String> {
    let mut names = Vec::new();
    if depth > 0 {
        walk_partition_level(root, depth, "", &mut names);
    }
    names.sort();
    names.dedup();
    names
}

fn walk_partition_level(dir: &Path, depth_left: usize, prefix: &str, out: &mut Vec<String>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) if name.contains('=') => name,
            _ => continue,
        };
        let joined = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", prefix, name)
        };
        if depth_left == 1 {
            out.push(joined);
        } else {
            walk_partition_level(&path, depth_left - 1, &joined, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_normalize_location_strips_file_scheme() {
        assert_eq!(normalize_location("file:///data/events/"), "/data/events");
        assert_eq!(normalize_location("file:/data/events"), "/data/events");
        assert_eq!(
            normalize_location("s3://warehouse/db/events/"),
            "s3://warehouse/db/events"
        );
        assert_eq!(normalize_location("/data/events///"), "/data/events");
    }

    #[test]
    fn test_is_local_path() {
        assert!(is_local_path("/data/events"));
        assert!(is_local_path("relative/events"));
        assert!(!is_local_path("s3://warehouse/db/events"));
        assert!(!is_local_path(""));
    }

    #[test]
    fn test_parse_partition_values() {
        assert_eq!(parse_partition_values("y=2020/m=01"), vec!["2020", "01"]);
        assert_eq!(
            parse_partition_values("ds=2024-01-01"),
            vec!["2024-01-01"]
        );
        // A segment without '=' contributes its raw text.
        assert_eq!(parse_partition_values("y=2020/raw"), vec!["2020", "raw"]);
    }

    #[test]
    fn test_join_location() {
        assert_eq!(join_location("/data/events", "y=2020"), "/data/events/y=2020");
        assert_eq!(join_location("", "y=2020"), "y=2020");
    }

    #[test]
    fn test_discover_local_partitions_two_levels() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("y=2020/m=01")).unwrap();
        fs::create_dir_all(root.join("y=2020/m=02")).unwrap();
        // Not a partition level: no '='.
        fs::create_dir_all(root.join("y=2020/other")).unwrap();
        // A stray file must not be picked up.
        fs::write(root.join("y=2020/_SUCCESS"), b"").unwrap();

        let names = discover_local_partitions(root, 2);
        assert_eq!(names, vec!["y=2020/m=01", "y=2020/m=02"]);
    }

    #[test]
    fn test_discover_local_partitions_respects_depth() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("y=2020/m=01/d=05")).unwrap();

        // Depth 1 stops at the year level even though deeper levels exist.
        assert_eq!(discover_local_partitions(root, 1), vec!["y=2020"]);
        assert_eq!(discover_local_partitions(root, 2), vec!["y=2020/m=01"]);
        assert_eq!(discover_local_partitions(root, 3), vec!["y=2020/m=01/d=05"]);
    }

    #[test]
    fn test_discover_local_partitions_missing_root() {
        let names = discover_local_partitions(Path::new("/nonexistent/hms/table"), 2);
        assert!(names.is_empty());
    }

    #[test]
    fn test_default_table_stats_is_unsupported() {
        struct StubConnector;
        impl MetastoreConnector for StubConnector {
            fn list_namespaces(&self) -> Result<Vec<MetastoreNamespace>> {
                Ok(Vec::new())
            }
            fn list_tables(&self, _: &str) -> Result<Vec<String>> {
                Ok(Vec::new())
            }
            fn get_table(&self, _: &str, _: &str) -> Result<MetastoreTable> {
                Err(MetastoreError::not_found("stub"))
            }
            fn list_partitions(&self, _: &str, _: &str, _: &str) -> Result<Vec<PartitionValue>> {
                Ok(Vec::new())
            }
        }

        let err = StubConnector.get_table_stats("db", "t").unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::Unsupported);
    }
}
