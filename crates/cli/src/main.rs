//! bcr-programmer CLI: command-line controller programming tool.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use bcr_programmer_core::catalog::{ControlCatalog, DeviceModel};
use bcr_programmer_core::pacing::{CancelToken, CancellableSleep, PacingPolicy};
use bcr_programmer_core::session::DeviceSession;
use bcr_programmer_core::sysex::Frame;
use bcr_programmer_core::transport::MidiTransport;
use bcr_programmer_core::{device, script};
use clap::{Parser, Subcommand};
use tracing::{error, info};

const MODEL: DeviceModel = DeviceModel::Bcr2000;

/// Prints frames instead of sending them.
struct DryRunTransport {
    frames: usize,
}

impl MidiTransport for DryRunTransport {
    fn send(&mut self, data: &[u8]) -> bcr_programmer_core::error::Result<()> {
        let decoded = Frame::decode(data)?;
        println!("{:5} {:02X?}  {}", decoded.block_index, data, decoded.text);
        self.frames += 1;
        Ok(())
    }
}

#[derive(Parser)]
#[command(
    name = "bcr-programmer",
    version,
    about = "Program BCR2000 buttons and encoders over BCL SysEx"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List connected BCR2000 MIDI outputs.
    ListDevices,
    /// Program every connected BCR2000.
    Program {
        /// JSON control catalog to use instead of the built-in layout.
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Blocks sent back to back before pausing.
        #[arg(long, default_value_t = bcr_programmer_core::pacing::DEFAULT_PAUSE_EVERY)]
        pause_every: u32,
        /// Pause length in milliseconds.
        #[arg(long, default_value_t = bcr_programmer_core::pacing::DEFAULT_PAUSE.as_millis() as u64)]
        pause_ms: u64,
        /// Print the frames instead of sending them.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the BCL script that would be sent.
    ShowScript {
        /// JSON control catalog to use instead of the built-in layout.
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Print the built-in control catalog as JSON.
    ExportCatalog,
}

fn load_catalog(path: Option<&Path>) -> Result<ControlCatalog> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("read catalog {}", path.display()))?;
            let catalog = ControlCatalog::from_json(&json)
                .with_context(|| format!("load catalog {}", path.display()))?;
            info!(catalog = catalog.name(), controls = catalog.len(), "Catalog loaded");
            Ok(catalog)
        }
        None => Ok(MODEL.catalog()?),
    }
}

fn program(catalog: &ControlCatalog, policy: PacingPolicy, token: &CancelToken) -> Result<()> {
    let devices = device::discover_devices(MODEL)?;
    if devices.is_empty() {
        anyhow::bail!("No {} found", MODEL.name());
    }

    let mut failures = 0;
    for info in &devices {
        if token.is_cancelled() {
            break;
        }
        // Each run gets a fresh connection, closed when the session is dropped.
        let result = device::open_device(info).and_then(|transport| {
            let delay = CancellableSleep::new(token.clone());
            DeviceSession::with_policy(transport, delay, policy).configure(catalog)
        });
        match result {
            Ok(report) => println!(
                "{}: configured {} controls ({} blocks)",
                info.name, report.controls_configured, report.blocks_sent
            ),
            Err(e) => {
                error!(port = %info.name, error = %e, "Programming failed");
                eprintln!("{}: {e}", info.name);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} devices failed", devices.len());
    }
    Ok(())
}

fn dry_run(catalog: &ControlCatalog, policy: PacingPolicy, token: &CancelToken) -> Result<()> {
    let mut transport = DryRunTransport { frames: 0 };
    let delay = CancellableSleep::new(token.clone());
    let report = DeviceSession::with_policy(&mut transport, delay, policy).configure(catalog)?;
    println!("dry run: {} blocks, {} frames", report.blocks_sent, transport.frames);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::ListDevices => {
            let devices = device::discover_devices(MODEL)?;
            if devices.is_empty() {
                println!("No {} found.", MODEL.name());
                println!("Ensure the controller is connected and in USB mode.");
            } else {
                for dev in &devices {
                    println!("{} (port #{}: {})", dev.model.name(), dev.port_index, dev.name);
                }
            }
        }
        Commands::Program {
            catalog,
            pause_every,
            pause_ms,
            dry_run: dry,
        } => {
            let catalog = load_catalog(catalog.as_deref())?;
            let policy = PacingPolicy {
                pause_every,
                pause: Duration::from_millis(pause_ms),
            };

            let token = CancelToken::new();
            let handler_token = token.clone();
            ctrlc::set_handler(move || handler_token.cancel())
                .context("install Ctrl-C handler")?;

            if dry {
                dry_run(&catalog, policy, &token)?;
            } else {
                program(&catalog, policy, &token)?;
            }
        }
        Commands::ShowScript { catalog } => {
            let catalog = load_catalog(catalog.as_deref())?;
            print!("{}", script::init_script());
            for control in &catalog {
                print!("{}", script::script_for(control));
            }
        }
        Commands::ExportCatalog => {
            println!("{}", MODEL.catalog()?.to_json()?);
        }
    }

    Ok(())
}
