//! Convert command implementation.

use anyhow::Result;
use console::style;

use qport_adapter_ionq::tk_to_ionq;

use super::common::{load_circuit, write_output};

/// Execute the convert command.
pub fn execute(input: &str, output: Option<&str>) -> Result<()> {
    let circuit = load_circuit(input)?;
    let (body, measures) = tk_to_ionq(&circuit)?;
    let json = serde_json::to_string_pretty(&body)?;
    write_output(&json, output)?;

    if let Some(path) = output {
        eprintln!(
            "{} Converted {} ({} gates, {} measured qubits) to {}",
            style("✓").green().bold(),
            style(input).green(),
            body.circuit.len(),
            measures.len(),
            style(path).green()
        );
    }
    Ok(())
}
