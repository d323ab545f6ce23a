//! Cancel command implementation.

use anyhow::Result;
use console::style;

use qport_adapter_ionq::Backend;

use super::common::{backend_for, parse_handle};

/// Execute the cancel command.
pub async fn execute(handle: &str, api_key: Option<String>) -> Result<()> {
    let handle = parse_handle(handle)?;
    let backend = backend_for(&handle, api_key)?;
    backend.cancel(&handle).await?;
    println!(
        "{} Cancelled {}",
        style("✓").green().bold(),
        style(handle.str_at(0).unwrap_or_default()).dim()
    );
    Ok(())
}
