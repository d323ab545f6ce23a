//! Submit command implementation.

use anyhow::Result;
use console::style;
use tracing::info;

use qport_adapter_ionq::{Backend, IonQBackend};

use super::common::load_circuit;

/// Options of the submit command.
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    pub input: String,
    pub shots: u32,
    pub device: String,
    pub label: String,
    /// `None` submits the circuit uncompiled.
    pub optimisation_level: Option<u8>,
    pub postprocess: bool,
    pub debug: bool,
    pub api_key: Option<String>,
}

/// Execute the submit command.
pub async fn execute(opts: &SubmitOptions) -> Result<()> {
    let backend = if opts.debug {
        IonQBackend::offline(&opts.device, &opts.label)?
    } else {
        IonQBackend::new(&opts.device, opts.api_key.clone(), &opts.label)?
    };

    let mut circuit = load_circuit(&opts.input)?;
    if let Some(level) = opts.optimisation_level {
        backend.compile_circuit(&mut circuit, level)?;
    }

    eprintln!(
        "{} Submitting {} to IonQ {} ({} shots{})",
        style("→").cyan().bold(),
        style(&opts.input).green(),
        style(&opts.device).yellow(),
        opts.shots,
        if opts.debug { ", debug" } else { "" }
    );

    let handle = backend
        .process_circuit(&circuit, opts.shots, true, opts.postprocess)
        .await?;
    info!(handle = %handle, "submitted");

    eprintln!("{} Submitted. Result handle:", style("✓").green().bold());
    println!("{handle}");
    Ok(())
}
