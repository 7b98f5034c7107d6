//! Partitions command implementation.

use anyhow::Result;
use hmsq_core::{HmsConnector, MetastoreConnector};

/// List a table's partitions, one per line as `values -> location`.
pub fn run(connector: &HmsConnector, namespace: &str, table: &str, predicate: &str) -> Result<()> {
    let policy = crate::cli_retry_policy();
    let partitions = policy.run(|| connector.list_partitions(namespace, table, predicate))?;

    if partitions.is_empty() {
        println!("No partitions found for {}.{}", namespace, table);
        return Ok(());
    }
    for partition in &partitions {
        println!("{} -> {}", partition.values.join("/"), partition.location);
    }
    Ok(())
}
