//! End-to-end tests of the `qport` binary.
//!
//! Every invocation points `QPORT_CONFIG` at a temporary file so the user's
//! config is never read or written.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

const BELL: &str = r#"OPENQASM 2.0;
include "qelib1.inc";
qreg q[2];
creg c[2];
h q[0];
cx q[0],q[1];
measure q -> c;
"#;

struct Env {
    dir: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn bell(&self) -> PathBuf {
        let path = self.path("bell.qasm");
        std::fs::write(&path, BELL).unwrap();
        path
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_qport"))
            .args(args)
            .env("QPORT_CONFIG", self.path("config.json"))
            .env_remove("IONQ_API_KEY")
            .env_remove("QPORT_IONQ_DEVICE")
            .output()
            .unwrap()
    }
}

fn text(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_convert_to_ionq_json() {
    let env = Env::new();
    let out = env.path("bell.json");
    let output = env.run(&["convert", "-i", text(&env.bell()), "-o", text(&out)]);
    assert!(output.status.success(), "{}", stderr(&output));

    let json: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["qubits"], 2);
    assert_eq!(json["circuit"][0]["gate"], "h");
    assert_eq!(json["circuit"][1]["gate"], "cnot");
    assert_eq!(json["circuit"][1]["control"], 0);
}

#[test]
fn test_convert_rejects_gates_outside_the_set() {
    let env = Env::new();
    let input = env.path("ccx.qasm");
    std::fs::write(
        &input,
        "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[3];\nccx q[0],q[1],q[2];\n",
    )
    .unwrap();

    let output = env.run(&["convert", "-i", text(&input)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Unsupported gate: ccx"));
}

#[test]
fn test_compile_writes_qasm() {
    let env = Env::new();
    let input = env.path("toffoli.qasm");
    std::fs::write(
        &input,
        "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[3];\ncreg c[3];\nccx q[0],q[1],q[2];\nmeasure q -> c;\n",
    )
    .unwrap();
    let out = env.path("out.qasm");

    let output = env.run(&["compile", "-i", text(&input), "-o", text(&out), "-O", "1"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let qasm = std::fs::read_to_string(&out).unwrap();
    assert!(qasm.starts_with("OPENQASM 2.0;"));
    assert!(qasm.contains("qreg node[3];"));
    assert!(!qasm.contains("ccx"));
}

#[test]
fn test_debug_submit_and_result() {
    let env = Env::new();
    let output = env.run(&["submit", "-i", text(&env.bell()), "-s", "64", "--debug"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let handle = stdout(&output).trim().to_string();
    assert!(handle.contains("_MACHINE_DEBUG_"), "{handle}");

    let output = env.run(&["status", &handle]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("COMPLETED"));

    let output = env.run(&["result", &handle, "--format", "json", "--wait", "0.01"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let counts: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(counts["00"], 64);
}

#[test]
fn test_missing_api_key() {
    let env = Env::new();
    let output = env.run(&["submit", "-i", text(&env.bell())]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("Error:"));
    assert!(err.contains("No IonQ api key provided or found in config file."));
}

#[test]
fn test_config_ionq_persists_key() {
    let env = Env::new();
    let output = env.run(&["config", "ionq", "--api-key", "secret"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let json: Value =
        serde_json::from_str(&std::fs::read_to_string(env.path("config.json")).unwrap()).unwrap();
    assert_eq!(json["extensions"]["ionq"]["api_key"], "secret");

    let output = env.run(&["config", "ionq", "--clear"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let json: Value =
        serde_json::from_str(&std::fs::read_to_string(env.path("config.json")).unwrap()).unwrap();
    assert!(json["extensions"]["ionq"]["api_key"].is_null());
}

#[test]
fn test_devices() {
    let env = Env::new();
    let output = env.run(&["devices"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("qpu"));
    assert!(out.contains("Qubits: 11"));
}

#[test]
fn test_bad_handle() {
    let env = Env::new();
    let output = env.run(&["status", "job-1"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Invalid result handle"));
}
