//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use qport_adapter_ionq::IonQBackend;
use qport_hal::{Counts, ResultHandle};
use qport_ir::Circuit;
use qport_qasm::circuit_from_qasm;

/// Load a circuit from an OpenQASM 2.0 file.
pub fn load_circuit(path: &str) -> Result<Circuit> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }
    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;
    let mut circuit = circuit_from_qasm(&source).with_context(|| format!("Parse error in {path}"))?;
    if circuit.name().is_empty() {
        if let Some(stem) = Path::new(path).file_stem() {
            circuit.set_name(stem.to_string_lossy());
        }
    }
    Ok(circuit)
}

/// Write `content` to `output`, or to stdout.
pub fn write_output(content: &str, output: Option<&str>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("Failed to write file: {path}"))
        }
        None => {
            println!("{content}");
            Ok(())
        }
    }
}

/// Parse a handle printed by `submit`.
pub fn parse_handle(text: &str) -> Result<ResultHandle> {
    text.trim()
        .parse()
        .with_context(|| format!("Invalid result handle: {text}"))
}

/// Backend able to serve `handle`.
pub fn backend_for(handle: &ResultHandle, api_key: Option<String>) -> Result<IonQBackend> {
    if IonQBackend::is_debug_handle(handle) {
        return Ok(IonQBackend::offline("qpu", "job")?);
    }
    Ok(IonQBackend::new("qpu", api_key, "job")?)
}

/// Print counts as a table with a bar per outcome.
pub fn print_counts(counts: &Counts) {
    let total = counts.total();
    println!(
        "\n{} Results ({} shots):",
        style("✓").green().bold(),
        total
    );

    let mut sorted: Vec<_> = counts.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    #[allow(clippy::cast_precision_loss)]
    let total = total.max(1) as f64;
    for (outcome, count) in sorted.iter().take(16) {
        #[allow(clippy::cast_precision_loss)]
        let prob = *count as f64 / total * 100.0;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let bar = "█".repeat((prob / 2.0).round() as usize);
        let label = if outcome.is_empty() {
            "-".to_string()
        } else {
            outcome.to_string()
        };
        println!(
            "  {}: {:>6} ({:>5.2}%) {}",
            style(label).cyan(),
            count,
            prob,
            style(bar).green()
        );
    }

    if sorted.len() > 16 {
        println!("  ... and {} more outcomes", sorted.len() - 16);
    }
}
