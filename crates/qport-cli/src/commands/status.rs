//! Status command implementation.

use anyhow::Result;
use console::style;

use qport_adapter_ionq::Backend;
use qport_hal::StatusEnum;

use super::common::{backend_for, parse_handle};

/// Execute the status command.
pub async fn execute(handle: &str, api_key: Option<String>) -> Result<()> {
    let handle = parse_handle(handle)?;
    let backend = backend_for(&handle, api_key)?;
    let status = backend.circuit_status(&handle).await?;

    let name = match status.status {
        StatusEnum::Completed => style(status.status.to_string()).green(),
        StatusEnum::Error | StatusEnum::Cancelled => style(status.status.to_string()).red(),
        _ => style(status.status.to_string()).yellow(),
    };
    println!("{} {}", name.bold(), status.status.description());
    if !status.message.is_empty() {
        println!("  {}", status.message);
    }
    Ok(())
}
