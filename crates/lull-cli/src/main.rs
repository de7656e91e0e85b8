use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;
use lull_core::{
    DeferralBuilder, DeferralConfig, DeferralMode, IdleError, LoopHandle, LoopStats, QueueCounts,
    RunLoop,
};
use serde::Serialize;
use tokio::time::{Duration, sleep};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod gallery;

use gallery::{Gallery, GallerySummary, Layout, ListEvent};

#[derive(Parser)]
#[command(name = "lull", about = "Scroll a simulated gallery and assign row images when the loop is idle")]
struct Cli {
    /// Number of rows in the list
    #[arg(long, default_value_t = 100)]
    rows: usize,
    /// Row height in points
    #[arg(long, default_value_t = 120.0)]
    row_height: f64,
    /// Viewport height in points
    #[arg(long, default_value_t = 844.0)]
    viewport: f64,
    /// Extra queue slots on top of the visible-row estimate
    #[arg(long, default_value_t = lull_core::domain::DEFAULT_SLACK)]
    slack: usize,
    /// Image assigned to every row
    #[arg(long, default_value = "rose.jpg")]
    image: PathBuf,
    /// JSON deferral config (overrides --row-height/--viewport/--slack for the queue bound)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Assign images synchronously while rendering
    #[arg(long)]
    immediate: bool,
    /// Scroll frames in the scripted drag
    #[arg(long, default_value_t = 40)]
    fling: usize,
    /// Points scrolled per frame
    #[arg(long, default_value_t = 90.0)]
    frame_delta: f64,
    /// Print the final summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Idle(#[from] IdleError),
}

#[derive(Debug, Serialize)]
struct Summary {
    mode: DeferralMode,
    capacity: usize,
    run_loop: LoopStats,
    queue: QueueCounts,
    gallery: GallerySummary,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "lull failed");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<DeferralConfig, CliError> {
    let Some(path) = &cli.config else {
        return Ok(DeferralConfig::Viewport {
            viewport_extent: cli.viewport,
            item_extent: cli.row_height,
            slack: cli.slack,
        });
    };
    let text = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.clone(),
        source,
    })?;
    Ok(DeferralConfig::from_json(&text)?)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(&cli)?;
    let (run_loop, handle) = RunLoop::<ListEvent>::new();

    let mut builder = DeferralBuilder::new(config);
    if !cli.immediate {
        builder = builder.source(Rc::new(run_loop.observers()));
    }
    let deferral = builder.build()?;
    info!(mode = ?deferral.mode(), capacity = %deferral.capacity(), "gallery ready");

    let layout = Layout {
        rows: cli.rows,
        row_height: cli.row_height,
        viewport: cli.viewport,
    };
    let mut gallery = Gallery::new(layout, cli.image.clone(), deferral);
    gallery.layout_visible();

    let script = tokio::spawn(drag_and_release(handle, cli.fling, cli.frame_delta));
    let stats = run_loop.run(|event, cx| gallery.handle(event, cx)).await;
    match script.await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(error = %err, "scroll script ended early"),
        Err(err) => warn!(error = %err, "scroll script panicked"),
    }

    let summary = Summary {
        mode: gallery.deferral().mode(),
        capacity: gallery.deferral().capacity().get(),
        run_loop: stats,
        queue: gallery.deferral().counts(),
        gallery: gallery.summary(),
    };
    if cli.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{text}"),
            Err(err) => warn!(error = %err, "summary not serializable"),
        }
    } else {
        info!(
            rows_rendered = summary.gallery.rows_rendered,
            loaded = summary.gallery.loaded,
            visible = summary.gallery.visible.len(),
            executed = summary.queue.executed,
            evicted = summary.queue.evicted,
            idle_transitions = summary.run_loop.idle_transitions,
            "done"
        );
    }
    Ok(())
}

/// Drag for the first half of the frames, then let the list decelerate.
/// Dropping the handle at the end lets the loop finish.
async fn drag_and_release(
    handle: LoopHandle<ListEvent>,
    frames: usize,
    delta: f64,
) -> Result<(), IdleError> {
    let frame = Duration::from_millis(16);
    let dragged = frames / 2;

    handle.send(ListEvent::DragBegan)?;
    for _ in 0..dragged {
        handle.send(ListEvent::ScrolledBy(delta))?;
        sleep(frame).await;
    }
    let mut velocity = delta;
    for _ in dragged..frames {
        velocity *= 0.9;
        handle.send(ListEvent::ScrolledBy(velocity))?;
        sleep(frame).await;
    }
    handle.send(ListEvent::DragEnded)?;
    Ok(())
}
