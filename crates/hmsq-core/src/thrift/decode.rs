//! Field-id-directed decoders for the metastore's Thrift structs.
//!
//! Each decoder loops over (type tag, field id) headers until Stop, reads
//! the fields it recognizes, and skips everything else via the codec. The
//! remote schema carries many fields this client has no use for; skipping
//! keeps the stream byte-accurate without modeling them. Any read failure
//! mid-decode means the connection state can no longer be trusted and is
//! reported as Transient.

use crate::error::{MetastoreError, Result};
use crate::thrift::codec::{TType, ThriftReader};
use crate::types::{MetastoreColumn, PartitionColumn, StorageDescriptor};
use std::collections::HashMap;
use std::io::Read;

/// A table record as it arrives off the wire, before format mapping.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Table name (field 1)
    pub table_name: String,
    /// Database name (field 2)
    pub db_name: String,
    /// Owner (field 3)
    pub owner: Option<String>,
    /// Storage descriptor (field 7)
    pub storage: StorageDescriptor,
    /// Partition key columns (field 8)
    pub partition_keys: Vec<PartitionColumn>,
    /// Table parameters (field 9)
    pub parameters: HashMap<String, String>,
}

/// Decode a `FieldSchema` struct: 1 = name, 2 = type, 3 = comment (skipped).
pub fn read_field_schema<R: Read>(reader: &mut ThriftReader<R>) -> Result<MetastoreColumn> {
    let mut column = MetastoreColumn {
        name: String::new(),
        column_type: String::new(),
    };
    loop {
        let (ttype, field_id) = reader.read_field_begin()?;
        match (field_id, ttype) {
            (_, TType::Stop) => return Ok(column),
            (1, TType::String) => column.name = reader.read_string()?,
            (2, TType::String) => column.column_type = reader.read_string()?,
            (_, other) => reader.skip(other)?,
        }
    }
}

/// Decode a `SerDeInfo` struct: 1 = name (skipped), 2 = serializationLib,
/// 3 = parameters.
pub fn read_serde_info<R: Read>(
    reader: &mut ThriftReader<R>,
) -> Result<(Option<String>, HashMap<String, String>)> {
    let mut serde_class = None;
    let mut parameters = HashMap::new();
    loop {
        let (ttype, field_id) = reader.read_field_begin()?;
        match (field_id, ttype) {
            (_, TType::Stop) => return Ok((serde_class, parameters)),
            (2, TType::String) => serde_class = Some(reader.read_string()?),
            (3, TType::Map) => parameters = read_string_map(reader)?,
            (_, other) => reader.skip(other)?,
        }
    }
}

/// Decode a `StorageDescriptor` struct: 1 = cols, 2 = location,
/// 3 = inputFormat, 4 = outputFormat, 7 = serdeInfo, 10 = parameters.
pub fn read_storage_descriptor<R: Read>(
    reader: &mut ThriftReader<R>,
) -> Result<StorageDescriptor> {
    let mut sd = StorageDescriptor::default();
    loop {
        let (ttype, field_id) = reader.read_field_begin()?;
        match (field_id, ttype) {
            (_, TType::Stop) => return Ok(sd),
            (1, TType::List) => {
                let (elem_type, count) = reader.read_list_begin()?;
                expect_elem_type(elem_type, TType::Struct, "StorageDescriptor.cols")?;
                sd.columns.reserve(count);
                for _ in 0..count {
                    sd.columns.push(read_field_schema(reader)?);
                }
            }
            (2, TType::String) => sd.location = reader.read_string()?,
            (3, TType::String) => sd.input_format = non_empty(reader.read_string()?),
            (4, TType::String) => sd.output_format = non_empty(reader.read_string()?),
            (7, TType::Struct) => {
                let (serde_class, parameters) = read_serde_info(reader)?;
                sd.serde_class = serde_class;
                sd.serde_parameters = parameters;
            }
            (_, other) => reader.skip(other)?,
        }
    }
}

/// Decode a `Table` struct: 1 = tableName, 2 = dbName, 3 = owner, 7 = sd,
/// 8 = partitionKeys, 9 = parameters. Unrelated ids (create time, retention,
/// view text, table type, ...) are skipped.
pub fn read_table<R: Read>(reader: &mut ThriftReader<R>) -> Result<RawTable> {
    let mut table = RawTable::default();
    loop {
        let (ttype, field_id) = reader.read_field_begin()?;
        match (field_id, ttype) {
            (_, TType::Stop) => return Ok(table),
            (1, TType::String) => table.table_name = reader.read_string()?,
            (2, TType::String) => table.db_name = reader.read_string()?,
            (3, TType::String) => table.owner = non_empty(reader.read_string()?),
            (7, TType::Struct) => table.storage = read_storage_descriptor(reader)?,
            (8, TType::List) => {
                let (elem_type, count) = reader.read_list_begin()?;
                expect_elem_type(elem_type, TType::Struct, "Table.partitionKeys")?;
                table.partition_keys.reserve(count);
                for _ in 0..count {
                    let column = read_field_schema(reader)?;
                    table.partition_keys.push(PartitionColumn {
                        name: column.name,
                        column_type: column.column_type,
                    });
                }
            }
            (9, TType::Map) => table.parameters = read_string_map(reader)?,
            (_, other) => reader.skip(other)?,
        }
    }
}

/// Decode a `list<string>` value.
pub fn read_string_list<R: Read>(reader: &mut ThriftReader<R>) -> Result<Vec<String>> {
    let (elem_type, count) = reader.read_list_begin()?;
    expect_elem_type(elem_type, TType::String, "string list")?;
    let mut values = Vec::with_capacity(count.min(4096));
    for _ in 0..count {
        values.push(reader.read_string()?);
    }
    Ok(values)
}

/// Decode a `map<string,string>` value.
pub fn read_string_map<R: Read>(reader: &mut ThriftReader<R>) -> Result<HashMap<String, String>> {
    let (key_type, value_type, count) = reader.read_map_begin()?;
    expect_elem_type(key_type, TType::String, "map key")?;
    expect_elem_type(value_type, TType::String, "map value")?;
    let mut map = HashMap::with_capacity(count.min(4096));
    for _ in 0..count {
        let key = reader.read_string()?;
        let value = reader.read_string()?;
        map.insert(key, value);
    }
    Ok(map)
}

/// Decode a remote exception struct (`NoSuchObjectException`,
/// `MetaException`, ...): field 1 = message, all else skipped.
pub fn read_exception_message<R: Read>(reader: &mut ThriftReader<R>) -> Result<String> {
    let mut message = String::new();
    loop {
        let (ttype, field_id) = reader.read_field_begin()?;
        match (field_id, ttype) {
            (_, TType::Stop) => return Ok(message),
            (1, TType::String) => message = reader.read_string()?,
            (_, other) => reader.skip(other)?,
        }
    }
}

fn expect_elem_type(actual: TType, expected: TType, context: &str) -> Result<()> {
    if actual != expected {
        return Err(MetastoreError::transient(format!(
            "unexpected element type {:?} in {} (expected {:?})",
            actual, context, expected
        )));
    }
    Ok(())
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
