//! Partition predicate pushdown.
//!
//! Translates a structured filter tree into the textual partition-filter
//! syntax the metastore accepts. Only filters on partition columns can be
//! pushed down; everything else is omitted. The translation is deliberately
//! conservative: a boolean combinator is emitted whole or not at all, because
//! a partially-translated AND/OR could silently change which partitions are
//! excluded.

use crate::types::MetastoreTable;
use std::collections::BTreeMap;
use tracing::debug;

/// Reserved partition value Hive stores for NULL partition keys.
pub const HIVE_DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// Comparison operators expressible in the metastore filter syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        }
    }
}

/// A filter expression over table columns, as handed down by the planner.
#[derive(Debug, Clone)]
pub enum ColumnFilter {
    Compare {
        column: String,
        op: CompareOp,
        value: String,
    },
    InList {
        column: String,
        values: Vec<String>,
    },
    IsNull {
        column: String,
    },
    IsNotNull {
        column: String,
    },
    And(Vec<ColumnFilter>),
    Or(Vec<ColumnFilter>),
}

/// Per-column filter entries produced by the planner's filter combiner,
/// keyed by projected column index. Ordered so predicate output is stable.
#[derive(Debug, Clone, Default)]
pub struct TableFilterSet {
    pub filters: BTreeMap<usize, ColumnFilter>,
}

/// Outcome of translating one filter node.
enum Translation {
    /// Pushable text for this node
    Translated(String),
    /// Not a partition-column filter; safe to omit under AND semantics
    Ignored,
    /// No textual equivalent; poisons any enclosing combinator
    Unsupported,
}

fn translate(filter: &ColumnFilter, partition_columns: &[&str]) -> Translation {
    let is_partition = |column: &str| partition_columns.contains(&column);

    match filter {
        ColumnFilter::Compare { column, op, value } => {
            if !is_partition(column) {
                return Translation::Ignored;
            }
            Translation::Translated(format!("{}{}'{}'", column, op.as_str(), value))
        }
        ColumnFilter::InList { column, values } => {
            if !is_partition(column) {
                return Translation::Ignored;
            }
            if values.is_empty() {
                return Translation::Unsupported;
            }
            let quoted: Vec<String> = values.iter().map(|v| format!("'{}'", v)).collect();
            Translation::Translated(format!("{} IN ({})", column, quoted.join(", ")))
        }
        ColumnFilter::IsNotNull { column } => {
            if !is_partition(column) {
                return Translation::Ignored;
            }
            // Hive represents NULL partition keys with a reserved marker value.
            Translation::Translated(format!("{} != '{}'", column, HIVE_DEFAULT_PARTITION))
        }
        // No textual equivalent exists in the filter grammar.
        ColumnFilter::IsNull { .. } => Translation::Unsupported,
        ColumnFilter::And(children) => translate_combinator(children, " and ", partition_columns),
        ColumnFilter::Or(children) => translate_combinator(children, " or ", partition_columns),
    }
}

fn translate_combinator(
    children: &[ColumnFilter],
    joiner: &str,
    partition_columns: &[&str],
) -> Translation {
    let mut parts = Vec::with_capacity(children.len());
    for child in children {
        match translate(child, partition_columns) {
            Translation::Translated(text) => parts.push(text),
            // Dropping one arm of a combinator would change its meaning.
            Translation::Unsupported => return Translation::Unsupported,
            Translation::Ignored => {
                if joiner == " or " {
                    // An OR with an untranslatable arm cannot be narrowed.
                    return Translation::Ignored;
                }
            }
        }
    }
    if parts.is_empty() {
        return Translation::Ignored;
    }
    if parts.len() == 1 {
        return Translation::Translated(parts.remove(0));
    }
    Translation::Translated(format!("({})", parts.join(joiner)))
}

/// Build the partition predicate string for a table scan.
///
/// `filter_set` is keyed by projected column index; `column_ids` maps those
/// back to table column positions and `names` holds the table's column names.
/// Returns an empty string when nothing can be pushed down. The top-level
/// entries share AND semantics, so a single unsupported entry empties the
/// whole predicate rather than emitting a weaker one.
pub fn generate_partition_predicate(
    table: &MetastoreTable,
    filter_set: &TableFilterSet,
    column_ids: &[usize],
    names: &[String],
) -> String {
    if !table.is_partitioned() {
        return String::new();
    }
    let partition_columns: Vec<&str> = table
        .partition_spec
        .columns
        .iter()
        .map(|c| c.name.as_str())
        .collect();

    let mut parts = Vec::new();
    for (projected_idx, filter) in &filter_set.filters {
        let resolved = resolve_column(*projected_idx, column_ids, names)
            .map(|name| bind_column(filter, name));
        let bound = match resolved {
            Some(bound) => bound,
            None => continue,
        };
        match translate(&bound, &partition_columns) {
            Translation::Translated(text) => parts.push(text),
            Translation::Ignored => continue,
            Translation::Unsupported => {
                debug!(
                    table = %table.name,
                    "partition filter not pushable; skipping predicate pushdown"
                );
                return String::new();
            }
        }
    }
    parts.join(" and ")
}

fn resolve_column<'a>(
    projected_idx: usize,
    column_ids: &[usize],
    names: &'a [String],
) -> Option<&'a str> {
    let global = *column_ids.get(projected_idx)?;
    names.get(global).map(String::as_str)
}

/// Planner filter-set entries are columnless leaves scoped to their entry's
/// column; rebind them (and any nested combinator children that carry no
/// column of their own) before translation.
fn bind_column(filter: &ColumnFilter, name: &str) -> ColumnFilter {
    match filter {
        ColumnFilter::Compare { column, op, value } => ColumnFilter::Compare {
            column: pick(column, name),
            op: *op,
            value: value.clone(),
        },
        ColumnFilter::InList { column, values } => ColumnFilter::InList {
            column: pick(column, name),
            values: values.clone(),
        },
        ColumnFilter::IsNull { column } => ColumnFilter::IsNull {
            column: pick(column, name),
        },
        ColumnFilter::IsNotNull { column } => ColumnFilter::IsNotNull {
            column: pick(column, name),
        },
        ColumnFilter::And(children) => {
            ColumnFilter::And(children.iter().map(|c| bind_column(c, name)).collect())
        }
        ColumnFilter::Or(children) => {
            ColumnFilter::Or(children.iter().map(|c| bind_column(c, name)).collect())
        }
    }
}

fn pick(existing: &str, fallback: &str) -> String {
    if existing.is_empty() {
        fallback.to_string()
    } else {
        existing.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MetastoreTable, PartitionColumn, PartitionSpec, StorageDescriptor};

    fn partitioned_table(columns: &[&str]) -> MetastoreTable {
        MetastoreTable {
            catalog: "hms".into(),
            namespace: "db".into(),
            name: "events".into(),
            storage_descriptor: StorageDescriptor::default(),
            partition_spec: PartitionSpec {
                columns: columns
                    .iter()
                    .map(|name| PartitionColumn {
                        name: (*name).to_string(),
                        column_type: "string".into(),
                    })
                    .collect(),
            },
            properties: Default::default(),
            owner: None,
        }
    }

    fn eq(column: &str, value: &str) -> ColumnFilter {
        ColumnFilter::Compare {
            column: column.into(),
            op: CompareOp::Eq,
            value: value.into(),
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_equality_and_in_list() {
        let table = partitioned_table(&["a", "b"]);
        let mut filter_set = TableFilterSet::default();
        filter_set.filters.insert(0, eq("", "x"));
        filter_set.filters.insert(
            1,
            ColumnFilter::InList {
                column: String::new(),
                values: vec!["y".into(), "z".into()],
            },
        );
        let predicate = generate_partition_predicate(
            &table,
            &filter_set,
            &[0, 1],
            &names(&["a", "b"]),
        );
        assert_eq!(predicate, "a='x' and b IN ('y', 'z')");
    }

    #[test]
    fn test_non_partition_column_is_omitted() {
        let table = partitioned_table(&["a"]);
        let mut filter_set = TableFilterSet::default();
        filter_set.filters.insert(0, eq("", "x"));
        filter_set.filters.insert(1, eq("", "5"));
        let predicate = generate_partition_predicate(
            &table,
            &filter_set,
            &[0, 1],
            &names(&["a", "value"]),
        );
        assert_eq!(predicate, "a='x'");
    }

    #[test]
    fn test_is_null_drops_entire_predicate() {
        let table = partitioned_table(&["a", "b"]);
        let mut filter_set = TableFilterSet::default();
        filter_set.filters.insert(0, eq("", "x"));
        filter_set.filters.insert(
            1,
            ColumnFilter::IsNull {
                column: String::new(),
            },
        );
        let predicate = generate_partition_predicate(
            &table,
            &filter_set,
            &[0, 1],
            &names(&["a", "b"]),
        );
        assert_eq!(predicate, "");
    }

    #[test]
    fn test_is_not_null_uses_default_partition_marker() {
        let table = partitioned_table(&["a"]);
        let mut filter_set = TableFilterSet::default();
        filter_set.filters.insert(
            0,
            ColumnFilter::IsNotNull {
                column: String::new(),
            },
        );
        let predicate =
            generate_partition_predicate(&table, &filter_set, &[0], &names(&["a"]));
        assert_eq!(predicate, "a != '__HIVE_DEFAULT_PARTITION__'");
    }

    #[test]
    fn test_range_comparison() {
        let table = partitioned_table(&["dt"]);
        let mut filter_set = TableFilterSet::default();
        filter_set.filters.insert(
            0,
            ColumnFilter::Compare {
                column: String::new(),
                op: CompareOp::GtEq,
                value: "2024-01-01".into(),
            },
        );
        let predicate =
            generate_partition_predicate(&table, &filter_set, &[0], &names(&["dt"]));
        assert_eq!(predicate, "dt>='2024-01-01'");
    }

    #[test]
    fn test_nested_or_is_parenthesized() {
        let table = partitioned_table(&["a"]);
        let mut filter_set = TableFilterSet::default();
        filter_set.filters.insert(
            0,
            ColumnFilter::Or(vec![eq("", "x"), eq("", "y")]),
        );
        let predicate =
            generate_partition_predicate(&table, &filter_set, &[0], &names(&["a"]));
        assert_eq!(predicate, "(a='x' or a='y')");
    }

    #[test]
    fn test_or_with_non_partition_arm_is_omitted() {
        let table = partitioned_table(&["a"]);
        let filter = ColumnFilter::Or(vec![
            eq("a", "x"),
            eq("value", "5"),
        ]);
        let mut filter_set = TableFilterSet::default();
        filter_set.filters.insert(0, filter);
        let predicate = generate_partition_predicate(
            &table,
            &filter_set,
            &[0],
            &names(&["a"]),
        );
        assert_eq!(predicate, "");
    }

    #[test]
    fn test_and_with_is_null_child_is_dropped_whole() {
        let table = partitioned_table(&["a", "b"]);
        let filter = ColumnFilter::And(vec![
            eq("a", "x"),
            ColumnFilter::IsNull { column: "b".into() },
        ]);
        let mut filter_set = TableFilterSet::default();
        filter_set.filters.insert(0, filter);
        let predicate = generate_partition_predicate(
            &table,
            &filter_set,
            &[0],
            &names(&["a"]),
        );
        assert_eq!(predicate, "");
    }

    #[test]
    fn test_unpartitioned_table_yields_empty_predicate() {
        let table = MetastoreTable {
            partition_spec: PartitionSpec::default(),
            ..partitioned_table(&[])
        };
        let mut filter_set = TableFilterSet::default();
        filter_set.filters.insert(0, eq("", "x"));
        let predicate =
            generate_partition_predicate(&table, &filter_set, &[0], &names(&["a"]));
        assert_eq!(predicate, "");
    }

    #[test]
    fn test_empty_in_list_is_not_pushable() {
        let table = partitioned_table(&["a"]);
        let mut filter_set = TableFilterSet::default();
        filter_set.filters.insert(
            0,
            ColumnFilter::InList {
                column: String::new(),
                values: vec![],
            },
        );
        let predicate =
            generate_partition_predicate(&table, &filter_set, &[0], &names(&["a"]));
        assert_eq!(predicate, "");
    }
}
