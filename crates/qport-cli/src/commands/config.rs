//! Config command implementation.

use anyhow::Result;
use console::style;

use qport_adapter_ionq::set_ionq_config;
use qport_hal::default_config_path;

/// Store (or with `None`, remove) the IonQ API key.
pub fn execute_ionq(api_key: Option<String>) -> Result<()> {
    let stored = api_key.is_some();
    set_ionq_config(api_key)?;
    let path = default_config_path()?;
    println!(
        "{} IonQ API key {} in {}",
        style("✓").green().bold(),
        if stored { "stored" } else { "removed" },
        style(path.display()).green()
    );
    Ok(())
}
