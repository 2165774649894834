use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::sync::broadcast::{self, error::RecvError};

use gesturepanel::{
    GesturePipeline, ImageOverlay, NullRenderer, OverlayRenderer, PanelConfig, PipelineEvent,
    ReplayProvider, SyntheticCamera,
};

#[derive(Parser)]
#[command(name = "gesturepanel")]
#[command(about = "Replay a recorded hand-landmark trace through the gesture pipeline")]
struct Cli {
    /// Path to a landmark trace (JSON array, one entry per frame)
    #[arg(value_name = "TRACE")]
    trace_path: PathBuf,

    /// Panel configuration file (JSON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Name of the gesture module whose bindings to use
    #[arg(short, long)]
    module: Option<String>,

    /// How long to keep the session running
    #[arg(long, default_value_t = 5000)]
    duration_ms: u64,

    /// Simulated inference time per frame
    #[arg(long, default_value_t = 0)]
    latency_ms: u64,

    /// Save overlay frames to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    overlay_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_filter = if args.verbose {
        "gesturepanel=debug"
    } else {
        "gesturepanel=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let config = match &args.config {
        Some(path) => PanelConfig::load(path)?,
        None => PanelConfig::default(),
    };
    let module = config
        .gesture_module(args.module.as_deref())
        .ok_or_else(|| match &args.module {
            Some(name) => anyhow::anyhow!("No gesture module named '{}'", name),
            None => anyhow::anyhow!("Config has no gesture module"),
        })?;

    if args.verbose {
        println!("Using module '{}' with bindings:", module.name);
        for binding in module.gesture_bindings().unwrap_or_default() {
            println!("  {:<12} {}", binding.gesture, binding.action);
        }
        println!();
    }

    let settings = config.pipeline.clone();
    let renderer: Box<dyn OverlayRenderer> = match args.overlay_out {
        Some(dir) => Box::new(
            ImageOverlay::new(settings.capture_width, settings.capture_height)
                .with_output_dir(dir)?,
        ),
        None => Box::new(NullRenderer),
    };
    let provider = ReplayProvider::open(&args.trace_path)
        .with_latency(Duration::from_millis(args.latency_ms));

    let mut pipeline = GesturePipeline::new(SyntheticCamera::new(), provider, renderer)
        .with_settings(settings)
        .for_module(module)?;

    let mut events = pipeline.events();
    pipeline.start().await?;

    let stop = pipeline.stop_handle();
    let duration = Duration::from_millis(args.duration_ms);
    let (stats, _, _) = tokio::join!(
        pipeline.run(),
        async move {
            tokio::time::sleep(duration).await;
            stop.stop();
        },
        print_events(&mut events),
    );

    println!("\n=== Gesture Session Summary ===");
    println!("Frames processed: {}", stats.frames_processed);
    println!("Frames skipped (inference busy): {}", stats.frames_skipped);
    println!("Frames failed: {}", stats.frames_failed);
    if stats.results_discarded > 0 {
        println!("Late results discarded: {}", stats.results_discarded);
    }

    Ok(())
}

async fn print_events(events: &mut broadcast::Receiver<PipelineEvent>) {
    loop {
        match events.recv().await {
            Ok(PipelineEvent::GestureChanged(change)) => {
                println!("Detected: {}", change.gesture);
            }
            Ok(PipelineEvent::ActionTriggered(signal)) => {
                println!("  -> {}", signal.action);
            }
            Ok(PipelineEvent::ActionCleared { action }) => {
                println!("  (cleared: {})", action);
            }
            Ok(PipelineEvent::FrameFailed { sequence, error }) => {
                println!("Frame {} failed: {}", sequence, error);
            }
            Ok(PipelineEvent::SessionStarted { .. }) => {}
            Ok(PipelineEvent::SessionStopped { .. }) | Err(RecvError::Closed) => break,
            Err(RecvError::Lagged(skipped)) => {
                println!("({} events dropped)", skipped);
            }
        }
    }
}
