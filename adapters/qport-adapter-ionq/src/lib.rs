//! qport Adapter for IonQ Trapped-Ion Devices
//!
//! This crate provides a backend for IonQ's cloud service through the
//! `v0.1` jobs REST API (`https://api.ionq.co/v0.1/jobs/`).
//!
//! # Devices
//!
//! | Device      | Qubits | Connectivity |
//! |-------------|--------|--------------|
//! | `qpu`       | 11     | all-to-all   |
//! | `simulator` | 11     | all-to-all   |
//!
//! # Authentication
//!
//! The API key is taken from, in order: the `api_key` argument of
//! [`IonQBackend::new`], the `ionq` section of the qport config file (see
//! [`set_ionq_config`]), then the `IONQ_API_KEY` environment variable.
//!
//! ```bash
//! export IONQ_API_KEY="your-ionq-key"
//! ```
//!
//! # Gate Set
//!
//! | qport gate     | IonQ gate |
//! |----------------|-----------|
//! | `x` `y` `z` `h`| same name |
//! | `s` / `sdg`    | `s` / `si`|
//! | `t` / `tdg`    | `t` / `ti`|
//! | `sx` / `sxdg`  | `v` / `vi`|
//! | `rx` `ry` `rz` | same name, `rotation` in radians |
//! | `cx`           | `cnot`    |
//! | `swap`         | `swap`    |
//! | `rxx` `ryy` `rzz` | `xx` `yy` `zz` |
//!
//! All measurements must come at the end of the circuit. IonQ measures
//! every qubit; the backend reads out the measured ones in classical bit
//! order.
//!
//! # Example
//!
//! ```ignore
//! use qport_adapter_ionq::{Backend, IonQBackend};
//! use qport_ir::{Circuit, QubitId};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = IonQBackend::new("simulator", None, "job")?;
//!
//!     let mut circuit = Circuit::with_size("bell", 2, 2);
//!     circuit.h(QubitId(0))?.cx(QubitId(0), QubitId(1))?.measure_all()?;
//!
//!     let compiled = backend.get_compiled_circuit(&circuit, 2)?;
//!     let result = backend.run_circuit(&compiled, 100, true, false).await?;
//!     println!("{:?}", result.get_counts());
//!     Ok(())
//! }
//! ```

mod api;
mod backend;
mod config;
mod convert;
mod error;

pub use api::{IONQ_JOBS_URL, IonQClient, JOBS_URL_ENV, JobData, JobRequest, JobResponse, Numeric};
pub use backend::{BACKEND_NAME, DEBUG_HANDLE_PREFIX, IONQ_N_QUBITS, IonQBackend};
pub use config::{API_KEY_ENV, IonQConfig, set_ionq_config};
pub use convert::{IONQ_GATES, IONQ_SINGLEQS, IonQCircuit, IonQGate, ionq_pass, tk_to_ionq};
pub use error::{IonQError, IonQResult};

// Re-export common types for convenience.
pub use qport_hal::Backend;
