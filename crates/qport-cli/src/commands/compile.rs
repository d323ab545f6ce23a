//! Compile command implementation.

use std::path::Path;

use anyhow::Result;
use console::style;

use qport_adapter_ionq::{Backend, IonQBackend};
use qport_qasm::circuit_to_qasm;

use super::common::{load_circuit, write_output};

fn default_output(input: &str) -> String {
    let p = Path::new(input);
    let stem = p.file_stem().unwrap_or_default().to_string_lossy();
    p.with_file_name(format!("{stem}_compiled.qasm"))
        .to_string_lossy()
        .into_owned()
}

/// Execute the compile command.
pub fn execute(input: &str, output: Option<&str>, optimisation_level: u8) -> Result<()> {
    println!(
        "{} Compiling {} for IonQ (level {})",
        style("→").cyan().bold(),
        style(input).green(),
        optimisation_level
    );

    let circuit = load_circuit(input)?;
    println!(
        "  Loaded: {} qubits, depth {}, {} ops",
        circuit.num_qubits(),
        circuit.depth(),
        circuit.num_ops()
    );

    let backend = IonQBackend::offline("qpu", "job")?;
    let compiled = backend.get_compiled_circuit(&circuit, optimisation_level)?;
    if !backend.valid_circuit(&compiled) {
        anyhow::bail!("Compiled circuit still breaks an IonQ requirement (more than 11 qubits or mid-circuit measurement?)");
    }

    println!("{} Compilation complete", style("✓").green().bold());
    println!(
        "  Result: depth {}, {} ops",
        compiled.depth(),
        compiled.num_ops()
    );

    let output_path = output.map_or_else(|| default_output(input), str::to_string);
    write_output(&circuit_to_qasm(&compiled)?, Some(&output_path))?;
    println!("  Output: {}", style(&output_path).green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output() {
        assert_eq!(default_output("bell.qasm"), "bell_compiled.qasm");
        assert_eq!(default_output("dir/ghz.qasm"), "dir/ghz_compiled.qasm");
    }
}
