//! Table command implementation.

use anyhow::Result;
use hmsq_core::{HmsConnector, MetastoreConnector};

/// Show a table's mapped metadata as JSON.
pub fn run(connector: &HmsConnector, namespace: &str, table: &str) -> Result<()> {
    let policy = crate::cli_retry_policy();
    let resolved = policy.run(|| connector.get_table(namespace, table))?;

    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}
