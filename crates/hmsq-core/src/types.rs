//! Metastore entity types.
//!
//! Owned value records returned by connector operations. Instances are
//! constructed fresh per call and never mutated after return; callers own
//! them outright and nothing is shared across connector instances.

use serde::Serialize;
use std::collections::HashMap;

/// Logical storage format of a table, resolved by the format mapper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum MetastoreFormat {
    /// Columnar Parquet files
    Parquet,
    /// Line-delimited JSON
    Json,
    /// Columnar ORC files
    Orc,
    /// Delimited text (CSV and friends)
    Csv,
    /// Delta Lake table (reported by some metastores, not pattern-detected)
    Delta,
    /// Iceberg table (reported by some metastores, not pattern-detected)
    Iceberg,
    /// Not yet resolved
    #[default]
    Unknown,
}

impl MetastoreFormat {
    /// Stable string form for logs and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetastoreFormat::Parquet => "Parquet",
            MetastoreFormat::Json => "JSON",
            MetastoreFormat::Orc => "ORC",
            MetastoreFormat::Csv => "CSV",
            MetastoreFormat::Delta => "Delta",
            MetastoreFormat::Iceberg => "Iceberg",
            MetastoreFormat::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for MetastoreFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Table-level properties as reported by the metastore.
pub type MetastoreTableProperties = HashMap<String, String>;

/// A namespace (database/schema) in the metastore.
#[derive(Debug, Clone, Serialize)]
pub struct MetastoreNamespace {
    /// Namespace name
    pub name: String,
    /// Owning catalog label (the attach name on the engine side)
    pub catalog: String,
    /// Optional description
    pub description: Option<String>,
    /// Optional storage location
    pub location: Option<String>,
    /// Namespace properties
    pub properties: HashMap<String, String>,
}

/// A column as declared in the metastore.
#[derive(Debug, Clone, Serialize)]
pub struct MetastoreColumn {
    /// Column name
    pub name: String,
    /// Declared type string (e.g. "string", "bigint", "decimal(10,2)")
    pub column_type: String,
}

/// Physical storage description of a table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StorageDescriptor {
    /// Location URI of the table data
    pub location: String,
    /// Resolved logical format; non-Unknown on any successfully mapped table
    pub format: MetastoreFormat,
    /// Ordered data columns
    pub columns: Vec<MetastoreColumn>,
    /// Serde key/value parameters
    pub serde_parameters: HashMap<String, String>,
    /// Serde class name, if reported
    pub serde_class: Option<String>,
    /// Input format class name, if reported
    pub input_format: Option<String>,
    /// Output format class name, if reported
    pub output_format: Option<String>,
}

/// A partition column definition.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionColumn {
    /// Partition column name
    pub name: String,
    /// Declared type string as reported by the metastore
    pub column_type: String,
}

/// Ordered partition column definitions.
///
/// Column order defines the positional mapping used when decoding
/// partition-name segments into values. Empty means unpartitioned.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PartitionSpec {
    /// Partition columns in declaration order
    pub columns: Vec<PartitionColumn>,
}

impl PartitionSpec {
    /// Whether the table carries any partition columns.
    pub fn is_partitioned(&self) -> bool {
        !self.columns.is_empty()
    }
}

/// A single partition of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionValue {
    /// Raw string values in the same order as the partition spec columns
    pub values: Vec<String>,
    /// Resolved filesystem/object-store location of the partition data
    pub location: String,
}

/// Full table metadata.
#[derive(Debug, Clone, Serialize)]
pub struct MetastoreTable {
    /// Owning catalog label
    pub catalog: String,
    /// Namespace (database) name
    pub namespace: String,
    /// Table name
    pub name: String,
    /// Physical storage description
    pub storage_descriptor: StorageDescriptor,
    /// Partition columns; empty means unpartitioned
    pub partition_spec: PartitionSpec,
    /// Table properties
    pub properties: MetastoreTableProperties,
    /// Table owner, if reported
    pub owner: Option<String>,
}

impl MetastoreTable {
    /// Whether the table has a non-empty partition spec.
    pub fn is_partitioned(&self) -> bool {
        self.partition_spec.is_partitioned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_spec_emptiness() {
        let spec = PartitionSpec::default();
        assert!(!spec.is_partitioned());

        let spec = PartitionSpec {
            columns: vec![PartitionColumn {
                name: "ds".into(),
                column_type: "string".into(),
            }],
        };
        assert!(spec.is_partitioned());
    }

    #[test]
    fn test_format_display() {
        assert_eq!(MetastoreFormat::Parquet.to_string(), "Parquet");
        assert_eq!(MetastoreFormat::Csv.to_string(), "CSV");
        assert_eq!(MetastoreFormat::default(), MetastoreFormat::Unknown);
    }
}
