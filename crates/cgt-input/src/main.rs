//! `cgt-input`: feeds keyboard and mouse commands from stdin to the virtual
//! HID device.
//!
//! ```text
//! main()
//!  └─ load_config()              -- input.toml or --config
//!  └─ VirtualHidTransport::open  -- fatal if the device is missing
//!  └─ VirtualHidClient::new      -- releases anything left held
//!  └─ stdin lines ─▶ Command::parse ─▶ Command::apply
//! ```
//!
//! A bad line or a failed report is logged and the loop carries on.  On EOF,
//! `quit` or Ctrl+C the client is dropped, which releases every key and
//! button.

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::Context;
use cgt_input::infrastructure::hid_transport::platform_backend;
use cgt_input::{load_config, Command, VirtualHidClient, VirtualHidTransport};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Sends keyboard and mouse input to the CG-Transport virtual HID device.
#[derive(Debug, Parser)]
#[command(name = "cgt-input", version)]
struct Cli {
    /// Configuration file; defaults to the platform config directory.
    #[arg(long, env = "CGT_INPUT_CONFIG")]
    config: Option<PathBuf>,

    /// Override the viewport width used to scale `move` coordinates.
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Override the viewport height used to scale `move` coordinates.
    #[arg(long, requires = "width")]
    height: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref()).context("failed to load input config")?;
    if let (Some(width), Some(height)) = (cli.width, cli.height) {
        config.viewport.width = width;
        config.viewport.height = height;
    }

    // RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        vendor_id = format!("{:04x}", config.device.vendor_id),
        product_id = format!("{:04x}", config.device.product_id),
        width = config.viewport.width,
        height = config.viewport.height,
        "cgt-input starting"
    );

    let (enumerator, opener) = platform_backend();
    let transport = match VirtualHidTransport::open(&config.device, &enumerator, &opener) {
        Ok(t) => t,
        Err(e) => {
            error!("cannot open virtual HID device: {e}");
            return Err(e).context("is the virtual HID driver installed?");
        }
    };
    let mut client =
        VirtualHidClient::new(transport, config.viewport).context("failed to reset the virtual HID device")?;

    let mut lines = spawn_stdin_reader();
    loop {
        let line = tokio::select! {
            line = lines.recv() => line,
            _ = tokio::signal::ctrl_c() => {
                info!("received Ctrl+C; releasing input");
                break;
            }
        };
        let Some(line) = line else {
            debug!("stdin closed");
            break;
        };

        match Command::parse(&line) {
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => {
                if let Err(e) = command.apply(&mut client) {
                    warn!(?command, "command failed: {e}");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(line = %line, "ignoring line: {e}"),
        }
    }

    // Releases every held key and button.
    drop(client);
    info!("cgt-input stopped");
    Ok(())
}

/// Reads stdin on its own thread; the channel closes on EOF or read error.
///
/// A blocking stdin read cannot be cancelled, so it must not sit on the
/// runtime's blocking pool where shutdown would wait for it.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(64);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("failed to read stdin: {e}");
                    break;
                }
            }
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["cgt-input"]);
        assert!(cli.config.is_none());
        assert!(cli.width.is_none());
    }

    #[test]
    fn test_viewport_override_needs_both_dimensions() {
        let cli = Cli::parse_from(["cgt-input", "--width", "2560", "--height", "1440"]);
        assert_eq!((cli.width, cli.height), (Some(2560), Some(1440)));
        assert!(Cli::try_parse_from(["cgt-input", "--width", "2560"]).is_err());
    }
}
