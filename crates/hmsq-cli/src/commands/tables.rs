//! Tables command implementation.

use anyhow::Result;
use hmsq_core::{HmsConnector, MetastoreConnector};

/// List table names in a namespace.
pub fn run(connector: &HmsConnector, namespace: &str) -> Result<()> {
    let policy = crate::cli_retry_policy();
    let tables = policy.run(|| connector.list_tables(namespace))?;

    if tables.is_empty() {
        println!("No tables found in {}", namespace);
        return Ok(());
    }
    for table in &tables {
        println!("{}", table);
    }
    Ok(())
}
