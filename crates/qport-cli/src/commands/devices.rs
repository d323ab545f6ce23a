//! Devices command implementation.

use console::style;

use qport_adapter_ionq::{API_KEY_ENV, IonQBackend, IonQConfig};
use qport_hal::ExtensionConfig;

/// Execute the devices command.
pub fn execute() {
    println!("{} Available devices:\n", style("IonQ").cyan().bold());

    for info in IonQBackend::available_devices() {
        let device = info.device_name.as_deref().unwrap_or("-");
        println!("  {} {}", style("●").green(), style(device).bold());
        println!("    Backend: {} {}", info.name, info.version);
        println!("    Qubits: {} (all-to-all)", info.n_nodes());
        let gates: Vec<&str> = info.gate_set.iter().map(String::as_str).collect();
        println!("    Gates: {}", gates.join(", "));
        println!();
    }

    let configured = IonQConfig::from_default_config_file()
        .ok()
        .and_then(|c| c.api_key)
        .is_some()
        || std::env::var(API_KEY_ENV).is_ok_and(|k| !k.is_empty());
    if !configured {
        println!(
            "  {} no API key; run `qport config ionq --api-key KEY` or set {API_KEY_ENV}",
            style("○").dim()
        );
    }
}
