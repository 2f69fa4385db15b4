//! `cgt-frame-monitor`: attaches to a running producer and logs stream health.
//!
//! ```text
//! main()
//!  └─ load_config()              -- frames.toml or --config
//!  └─ FrameConsumer::open()      -- fatal if the producer is not running
//!  └─ spawn_blocking(read_loop)
//!       ├─ wait_and_read()       -- frame-ready wait, 100 ms slices
//!       ├─ StatsTracker          -- per-second fps and stage timings
//!       └─ is_stopped()          -- ends the session
//! ```
//!
//! The read loop blocks on named events, which is why it runs on the
//! blocking pool rather than on an async task.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use anyhow::Context;
use cgt_core::MediaKind;
use cgt_frames::application::{FramePayloadView, StatsTracker};
use cgt_frames::{load_config, FrameConsumer};
use clap::{Parser, ValueEnum};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

const WAIT_SLICE: Duration = Duration::from_millis(100);
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Audio,
    VideoYuv,
    VideoTexture,
}

impl From<KindArg> for MediaKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Audio => MediaKind::Audio,
            KindArg::VideoYuv => MediaKind::VideoYuv,
            KindArg::VideoTexture => MediaKind::VideoTexture,
        }
    }
}

/// Logs frame rate and pipeline timings of a CG-Transport frame stream.
#[derive(Debug, Parser)]
#[command(name = "cgt-frame-monitor", version)]
struct Cli {
    /// Media kind to attach to.
    #[arg(value_enum, default_value_t = KindArg::VideoTexture)]
    kind: KindArg,

    /// Configuration file; defaults to the platform config directory.
    #[arg(long, env = "CGT_FRAMES_CONFIG")]
    config: Option<PathBuf>,

    /// Ask the captured process to stop presenting locally while attached.
    #[arg(long)]
    suppress_present: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).context("failed to load frames config")?;

    // RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let kind = MediaKind::from(cli.kind);
    info!(kind = kind.label(), dir = %config.shm.dir.display(), "cgt-frame-monitor starting");

    let consumer = match FrameConsumer::open(&config, kind) {
        Ok(c) => c,
        Err(e) => {
            error!(kind = kind.label(), "cannot attach to producer: {e}");
            return Err(e).context("is the producer running?");
        }
    };
    if cli.suppress_present {
        consumer
            .suppress_local_present(true)
            .context("failed to set do-not-present")?;
    }

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; detaching");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    let consumer = tokio::task::spawn_blocking(move || read_loop(consumer, &running))
        .await
        .context("read loop panicked")??;

    if cli.suppress_present {
        if let Err(e) = consumer.suppress_local_present(false) {
            warn!("failed to clear do-not-present: {e}");
        }
    }
    info!(last_sequence = consumer.last_sequence(), "cgt-frame-monitor stopped");
    Ok(())
}

/// Reads frames until the producer stops or `running` is cleared.
///
/// Hands the consumer back so the caller can undo its side effects.
fn read_loop(mut consumer: FrameConsumer, running: &AtomicBool) -> anyhow::Result<FrameConsumer> {
    let kind = consumer.kind();
    let mut tracker = StatsTracker::new();
    let mut interval_start = Instant::now();
    let mut first = true;

    while running.load(Ordering::Relaxed) {
        let got_frame = match consumer.wait_and_read(WAIT_SLICE)? {
            Some(frame) => {
                tracker.observe(frame.stats()?);
                if first {
                    info!(kind = kind.label(), seq = frame.sequence(), "first frame: {}", describe(&frame.payload()?));
                    first = false;
                } else {
                    debug!(kind = kind.label(), seq = frame.sequence(), slot = %frame.slot(), "frame");
                }
                true
            }
            None => false,
        };
        if !got_frame && consumer.is_stopped()? {
            info!(kind = kind.label(), "producer signaled stopped");
            break;
        }

        let elapsed = interval_start.elapsed();
        if elapsed >= REPORT_INTERVAL {
            report(kind, &mut tracker, elapsed);
            interval_start = Instant::now();
        }
    }
    Ok(consumer)
}

fn report(kind: MediaKind, tracker: &mut StatsTracker, elapsed: Duration) {
    match tracker.take_interval(elapsed) {
        Some(sample) => info!(
            kind = kind.label(),
            frames = sample.frames,
            fps = format!("{:.1}", sample.fps),
            mean_total_us = sample.mean_total_us(),
            encode_us = sample.delta.hardware_encode_us,
            wait_us = sample.delta.wait_for_buffer_us,
            acquire_ok = format!("{:.2}", sample.delta.acquire_success_ratio()),
            "stream stats"
        ),
        None => info!(kind = kind.label(), "no frames in the last interval"),
    }
}

fn describe(payload: &FramePayloadView<'_>) -> String {
    match payload {
        FramePayloadView::Yuv(data) => format!("yuv, {} bytes", data.len()),
        FramePayloadView::Texture(t) => format!("texture {}/{}", t.instance_id, t.texture_id),
        FramePayloadView::Audio { header, data, .. } => {
            format!("{}, {} channels, {} bytes", header.codec_name(), header.channels, data.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_texture_stream() {
        let cli = Cli::parse_from(["cgt-frame-monitor"]);
        assert_eq!(cli.kind, KindArg::VideoTexture);
        assert!(cli.config.is_none());
        assert!(!cli.suppress_present);
    }

    #[test]
    fn test_cli_accepts_kind_and_config() {
        let cli = Cli::parse_from(["cgt-frame-monitor", "audio", "--config", "/tmp/frames.toml"]);
        assert_eq!(MediaKind::from(cli.kind), MediaKind::Audio);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/frames.toml")));
    }
}
