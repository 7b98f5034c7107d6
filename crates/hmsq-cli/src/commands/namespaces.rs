//! Namespaces command implementation.

use anyhow::Result;
use hmsq_core::{HmsConnector, MetastoreConnector};

/// List all namespaces in the catalog.
pub fn run(connector: &HmsConnector) -> Result<()> {
    let policy = crate::cli_retry_policy();
    let namespaces = policy.run(|| connector.list_namespaces())?;

    if namespaces.is_empty() {
        println!("No namespaces found");
        return Ok(());
    }
    for namespace in &namespaces {
        println!("{}", namespace.name);
    }
    Ok(())
}
