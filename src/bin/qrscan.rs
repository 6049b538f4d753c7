use anyhow::{Context, Result, bail};
use clap::Parser;
use live_qr::surface::PreviewSurface;
use live_qr::tools::ReplayCamera;
use live_qr::{CameraProvider, CaptureSessionManager, RqrrDecoder, ScanConfig, StartOutcome};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "qrscan", version, about = "Scan QR codes from a live camera feed")]
struct Cli {
    /// Replay images from this directory instead of opening a camera
    #[arg(long)]
    replay: Option<PathBuf>,
    /// Frames per second pushed by the replay camera
    #[arg(long, default_value_t = 15)]
    fps: u32,
    /// Capture device index
    #[cfg(feature = "camera")]
    #[arg(long, default_value_t = 0)]
    camera_index: u32,
    /// Milliseconds between scan cycles (overrides QR_SCAN_PERIOD_MS)
    #[arg(long)]
    period_ms: Option<u64>,
    /// Sampling bitmap width (overrides QR_SAMPLE_WIDTH)
    #[arg(long)]
    sample_width: Option<u32>,
    /// Sampling bitmap height (overrides QR_SAMPLE_HEIGHT)
    #[arg(long)]
    sample_height: Option<u32>,
    /// Start scanning right away instead of waiting for `start`
    #[arg(long)]
    autostart: bool,
    /// Convert frames to grayscale on the rayon pool
    #[arg(long)]
    parallel: bool,
}

impl Cli {
    fn config(&self) -> Result<ScanConfig> {
        let mut config = ScanConfig::from_env();
        if let Some(ms) = self.period_ms {
            config = config.with_scan_period(Duration::from_millis(ms));
        }
        let (width, height) = config.sample_size();
        config = config.with_sample_size(
            self.sample_width.unwrap_or(width),
            self.sample_height.unwrap_or(height),
        );
        config.validate().context("invalid scan configuration")?;
        Ok(config)
    }

    fn camera(&self) -> Result<Arc<dyn CameraProvider>> {
        if let Some(root) = &self.replay {
            if !root.is_dir() {
                bail!("replay directory {} does not exist", root.display());
            }
            return Ok(Arc::new(ReplayCamera::from_dir(root, self.fps)));
        }
        self.device_camera()
    }

    #[cfg(feature = "camera")]
    fn device_camera(&self) -> Result<Arc<dyn CameraProvider>> {
        Ok(Arc::new(live_qr::capture::NokhwaCamera::new(self.camera_index)))
    }

    #[cfg(not(feature = "camera"))]
    fn device_camera(&self) -> Result<Arc<dyn CameraProvider>> {
        bail!("built without camera support; pass --replay DIR or rebuild with --features camera")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config()?;
    let camera = cli.camera()?;
    let decoder = Arc::new(RqrrDecoder::new().with_parallel(cli.parallel));
    let manager = Arc::new(CaptureSessionManager::new(
        camera,
        PreviewSurface::shared(),
        decoder,
        config,
    )?);

    let printer = tokio::spawn(print_results(manager.state().subscribe_last_result()));
    if cli.autostart {
        spawn_start(&manager);
    }

    eprintln!("commands: start | stop | status | quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => {}
            "start" => spawn_start(&manager),
            "stop" => manager.stop().await,
            "status" => print_status(&manager),
            "quit" | "exit" => break,
            other => eprintln!("unknown command: {other}"),
        }
    }

    manager.stop().await;
    printer.abort();
    Ok(())
}

// Acquisition can wait on a permission prompt; keep reading commands meanwhile
fn spawn_start(manager: &Arc<CaptureSessionManager>) {
    let manager = Arc::clone(manager);
    tokio::spawn(async move {
        match manager.start().await {
            Ok(StartOutcome::Started) => eprintln!("scanning"),
            Ok(StartOutcome::AlreadyRunning) => eprintln!("already {}", manager.lifecycle()),
            Ok(StartOutcome::Cancelled) => eprintln!("start cancelled"),
            Err(err) => eprintln!("error: {err}"),
        }
    });
}

fn print_status(manager: &CaptureSessionManager) {
    let stats = manager.stats();
    println!("state: {}", manager.lifecycle());
    println!("live: {}", manager.is_live());
    println!(
        "last result: {}",
        manager.last_result().as_deref().unwrap_or("<none>")
    );
    println!(
        "cycles: {} (hits {}, misses {}, skipped {}, waiting {}, overruns {})",
        stats.cycles, stats.hits, stats.misses, stats.skipped, stats.waiting, stats.overruns
    );
}

async fn print_results(mut results: watch::Receiver<Option<String>>) {
    while results.changed().await.is_ok() {
        if let Some(payload) = results.borrow_and_update().as_deref() {
            println!("{payload}");
        }
    }
}
