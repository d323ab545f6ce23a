//! Result command implementation.
//!
//! Poll a handle until its counts are available, then print them.

use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use qport_adapter_ionq::Backend;

use super::common::{backend_for, parse_handle, print_counts};

fn seconds(value: f64, what: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(value).map_err(|_| anyhow::anyhow!("Invalid {what}: {value}"))
}

/// Execute the result command.
pub async fn execute(
    handle: &str,
    timeout: Option<f64>,
    wait: f64,
    format: &str,
    api_key: Option<String>,
) -> Result<()> {
    if !matches!(format, "table" | "json") {
        anyhow::bail!("Unknown format: '{format}'. Available: table, json");
    }
    let timeout = timeout.map(|t| seconds(t, "timeout")).transpose()?;
    let wait = seconds(wait, "wait")?;

    let handle = parse_handle(handle)?;
    let backend = backend_for(&handle, api_key)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Waiting for results...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = backend.get_result(&handle, timeout, wait).await;
    spinner.finish_and_clear();
    let counts = result?.get_counts();

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&counts)?);
    } else {
        print_counts(&counts);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds() {
        assert_eq!(seconds(0.5, "wait").unwrap(), Duration::from_millis(500));
        assert!(seconds(-1.0, "wait").is_err());
        assert!(seconds(f64::NAN, "timeout").is_err());
    }
}
