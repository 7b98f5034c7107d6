//! Format detection and table mapping.
//!
//! The metastore reports storage formats indirectly through serde and
//! input/output format class names. The mapper resolves those heterogeneous
//! signals into a [`MetastoreFormat`] and assembles the final table record.

use crate::error::{MetastoreError, Result};
use crate::types::{
    MetastoreFormat, MetastoreTable, MetastoreTableProperties, PartitionSpec, StorageDescriptor,
};
use tracing::debug;

fn contains_any(value: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| value.contains(needle))
}

/// Pattern-match an input/output format class name.
fn detect_from_pattern(field: Option<&str>) -> MetastoreFormat {
    let Some(field) = field else {
        return MetastoreFormat::Unknown;
    };
    let lower = field.to_lowercase();
    if contains_any(&lower, &["mapredparquetinputformat", "parquet"]) {
        MetastoreFormat::Parquet
    } else if contains_any(&lower, &["jsoninputformat", "json"]) {
        MetastoreFormat::Json
    } else if contains_any(&lower, &["orcinputformat", "orc"]) {
        MetastoreFormat::Orc
    } else if contains_any(&lower, &["textinputformat", "csv", "text"]) {
        MetastoreFormat::Csv
    } else {
        MetastoreFormat::Unknown
    }
}

/// Pattern-match a serde class name.
fn detect_from_serde(field: Option<&str>) -> MetastoreFormat {
    let Some(field) = field else {
        return MetastoreFormat::Unknown;
    };
    let lower = field.to_lowercase();
    if contains_any(&lower, &["parquethiveserde", "parquet"]) {
        MetastoreFormat::Parquet
    } else if contains_any(&lower, &["jsonserde", "json"]) {
        MetastoreFormat::Json
    } else if contains_any(&lower, &["orcserde", "orc"]) {
        MetastoreFormat::Orc
    } else if contains_any(&lower, &["lazysimpleserde", "csv", "text"]) {
        MetastoreFormat::Csv
    } else {
        MetastoreFormat::Unknown
    }
}

/// Resolve the logical format of a storage descriptor.
///
/// Precedence, first match wins: an already-explicit format, the
/// input-format class, the output-format class, the serde class.
pub fn detect_format(sd: &StorageDescriptor) -> MetastoreFormat {
    if sd.format != MetastoreFormat::Unknown {
        return sd.format;
    }

    let from_input = detect_from_pattern(sd.input_format.as_deref());
    if from_input != MetastoreFormat::Unknown {
        return from_input;
    }

    let from_output = detect_from_pattern(sd.output_format.as_deref());
    if from_output != MetastoreFormat::Unknown {
        return from_output;
    }

    detect_from_serde(sd.serde_class.as_deref())
}

/// Assemble a [`MetastoreTable`] from decoded wire pieces.
///
/// A missing storage location is `InvalidConfig` (checked before format
/// detection); an undetectable format is `Unsupported`. A successfully
/// mapped table always carries a non-Unknown format.
pub fn map_table(
    catalog: &str,
    namespace: &str,
    table_name: &str,
    mut sd: StorageDescriptor,
    partition_spec: PartitionSpec,
    properties: MetastoreTableProperties,
    owner: Option<String>,
) -> Result<MetastoreTable> {
    if sd.location.is_empty() {
        return Err(
            MetastoreError::invalid_config("HMS table location is missing")
                .with_detail(table_name.to_string()),
        );
    }

    sd.format = detect_format(&sd);
    if sd.format == MetastoreFormat::Unknown {
        let signal = sd
            .serde_class
            .clone()
            .or_else(|| sd.input_format.clone())
            .unwrap_or_else(|| "unknown".to_string());
        return Err(MetastoreError::unsupported(format!(
            "unsupported HMS serde format for table {}",
            table_name
        ))
        .with_detail(signal));
    }

    debug!(
        table = table_name,
        format = %sd.format,
        partitioned = partition_spec.is_partitioned(),
        "mapped HMS table"
    );

    Ok(MetastoreTable {
        catalog: catalog.to_string(),
        namespace: namespace.to_string(),
        name: table_name.to_string(),
        storage_descriptor: sd,
        partition_spec,
        properties,
        owner,
    })
}
