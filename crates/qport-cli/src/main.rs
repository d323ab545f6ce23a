//! qport Command-Line Interface
//!
//! Converts Qiskit-exported OpenQASM 2.0 circuits, compiles them for IonQ
//! devices and manages IonQ jobs through persistent result handles.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Args, Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{cancel, compile, config, convert, devices, result, status, submit};

/// qport - Qiskit interchange and IonQ submission
#[derive(Parser)]
#[command(name = "qport")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// API key given on the command line.
#[derive(Args, Debug, Clone, Default)]
struct Auth {
    /// IonQ API key (defaults to the config file, then IONQ_API_KEY)
    #[arg(long)]
    api_key: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an OpenQASM 2.0 circuit into an IonQ JSON circuit
    Convert {
        /// Input file (OpenQASM 2.0)
        #[arg(short, long)]
        input: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Compile a circuit for IonQ and write it back as OpenQASM 2.0
    Compile {
        /// Input file (OpenQASM 2.0)
        #[arg(short, long)]
        input: String,

        /// Output file (defaults to <input>_compiled.qasm)
        #[arg(short, long)]
        output: Option<String>,

        /// Optimisation level (0-2)
        #[arg(short = 'O', long, default_value = "2")]
        optimisation_level: u8,
    },

    /// Submit a circuit to IonQ and print its result handle
    Submit {
        /// Input file (OpenQASM 2.0)
        #[arg(short, long)]
        input: String,

        /// Number of shots
        #[arg(short, long, default_value = "1024")]
        shots: u32,

        /// IonQ device (qpu, simulator)
        #[arg(short, long, env = "QPORT_IONQ_DEVICE", default_value = "qpu")]
        device: String,

        /// Prefix of generated job names
        #[arg(long, default_value = "job")]
        label: String,

        /// Optimisation level (0-2)
        #[arg(short = 'O', long, default_value = "2")]
        optimisation_level: u8,

        /// Submit the circuit as given, without compiling it
        #[arg(long)]
        no_compile: bool,

        /// Strip final single-qubit gates and apply them to the results
        #[arg(long)]
        postprocess: bool,

        /// Do not contact IonQ; every job returns all-zero readouts
        #[arg(long)]
        debug: bool,

        #[command(flatten)]
        auth: Auth,
    },

    /// Query the status of a submitted circuit
    Status {
        /// Result handle printed by `submit`
        handle: String,

        #[command(flatten)]
        auth: Auth,
    },

    /// Wait for and print the counts of a submitted circuit
    Result {
        /// Result handle printed by `submit`
        handle: String,

        /// Give up after this many seconds
        #[arg(short, long)]
        timeout: Option<f64>,

        /// Seconds between status polls
        #[arg(short, long, default_value = "1.0")]
        wait: f64,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,

        #[command(flatten)]
        auth: Auth,
    },

    /// Cancel a submitted circuit
    Cancel {
        /// Result handle printed by `submit`
        handle: String,

        #[command(flatten)]
        auth: Auth,
    },

    /// Store settings in the qport config file
    Config {
        #[command(subcommand)]
        section: ConfigSection,
    },

    /// List available IonQ devices
    Devices,
}

#[derive(Subcommand)]
enum ConfigSection {
    /// IonQ settings
    Ionq {
        /// API key to store
        #[arg(long, required_unless_present = "clear")]
        api_key: Option<String>,

        /// Remove the stored API key
        #[arg(long, conflicts_with = "api_key")]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Convert { input, output } => convert::execute(&input, output.as_deref()),

        Commands::Compile {
            input,
            output,
            optimisation_level,
        } => compile::execute(&input, output.as_deref(), optimisation_level),

        Commands::Submit {
            input,
            shots,
            device,
            label,
            optimisation_level,
            no_compile,
            postprocess,
            debug,
            auth,
        } => {
            submit::execute(&submit::SubmitOptions {
                input,
                shots,
                device,
                label,
                optimisation_level: (!no_compile).then_some(optimisation_level),
                postprocess,
                debug,
                api_key: auth.api_key,
            })
            .await
        }

        Commands::Status { handle, auth } => status::execute(&handle, auth.api_key).await,

        Commands::Result {
            handle,
            timeout,
            wait,
            format,
            auth,
        } => result::execute(&handle, timeout, wait, &format, auth.api_key).await,

        Commands::Cancel { handle, auth } => cancel::execute(&handle, auth.api_key).await,

        Commands::Config { section } => match section {
            ConfigSection::Ionq { api_key, clear } => {
                config::execute_ionq(if clear { None } else { api_key })
            }
        },

        Commands::Devices => {
            devices::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
