use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use scissors::{
    ControllerEvent, GrayImage, ImageGraph, Point, SearchConfig, SearchController,
    ShortestPaths, TaskState, WeigherKind,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scissors")]
#[command(about = "Trace minimum-cost paths through grayscale images", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Trace the cheapest path between two pixels and print it as JSON
    Trace {
        /// Binary (P5) or ASCII (P2) PGM image
        image: PathBuf,

        /// Start pixel as `x,y`
        #[arg(long, value_parser = parse_point)]
        from: Point,

        /// End pixel as `x,y`
        #[arg(long, value_parser = parse_point)]
        to: Point,

        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Weight function, overriding the config
        #[arg(long)]
        weigher: Option<WeigherKind>,

        /// Vertices settled between progress reports, overriding the config
        #[arg(long)]
        batch_size: Option<usize>,

        /// Cancel the search if it runs longer than this many milliseconds
        #[arg(long)]
        cancel_after: Option<u64>,
    },
    /// List the available weight functions
    Weighers,
}

const POLL_INTERVAL: Duration = Duration::from_millis(50);

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Trace {
            image,
            from,
            to,
            config,
            weigher,
            batch_size,
            cancel_after,
        } => {
            let mut config = match config {
                Some(path) => SearchConfig::from_json_file(path)?,
                None => SearchConfig::default(),
            }
            .with_env_overrides()?;
            if let Some(weigher) = weigher {
                config.weigher = weigher;
            }
            if let Some(batch_size) = batch_size {
                config.batch_size = batch_size;
            }
            config.validate()?;
            trace(&image, from, to, &config, cancel_after.map(Duration::from_millis))?;
        }
        Commands::Weighers => {
            for kind in WeigherKind::ALL {
                println!("{kind}");
            }
        }
    }

    Ok(())
}

fn trace(
    image: &std::path::Path,
    from: Point,
    to: Point,
    config: &SearchConfig,
    cancel_after: Option<Duration>,
) -> Result<()> {
    let bytes =
        std::fs::read(image).with_context(|| format!("failed to read {}", image.display()))?;
    let graph = Arc::new(ImageGraph::new(
        GrayImage::from_pgm(&bytes).with_context(|| format!("in {}", image.display()))?,
    ));
    let Some(from_id) = graph.id_at(from) else {
        bail!("--from {},{} lies outside the image", from.x, from.y);
    };
    let Some(to_id) = graph.id_at(to) else {
        bail!("--to {},{} lies outside the image", to.x, to.y);
    };
    info!(
        width = graph.width(),
        height = graph.height(),
        weigher = %config.weigher,
        "loaded image"
    );

    let weigher = config.weigher.build(&graph);
    let solver = ShortestPaths::new(Arc::clone(&graph), weigher);
    let mut controller = SearchController::with_config(solver, config);

    let started = Instant::now();
    controller.start(from_id);
    let mut reported_decile = 0;
    let mut failure = None;
    while controller.is_running() {
        if cancel_after.is_some_and(|limit| started.elapsed() >= limit) {
            controller.cancel();
        }
        for event in controller.wait_timeout(POLL_INTERVAL) {
            match event {
                ControllerEvent::ProgressChanged(p) => {
                    // Truncation to a decile is intended.
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let decile = (p * 10.0) as u32;
                    if decile > reported_decile {
                        reported_decile = decile;
                        info!("{}% of pixels settled", decile * 10);
                    }
                }
                ControllerEvent::StateChanged { old, new } => debug!(?old, ?new, "state"),
                ControllerEvent::Failed(err) => failure = Some(err),
                ControllerEvent::PendingPathsChanged(_) => {}
            }
        }
    }

    match controller.state() {
        TaskState::Completed => {}
        TaskState::Cancelled => bail!(
            "search cancelled after {} ms",
            started.elapsed().as_millis()
        ),
        TaskState::Failed => {
            return Err(failure.unwrap_or_else(|| anyhow::anyhow!("search failed")));
        }
        state => bail!("search ended in unexpected state {state:?}"),
    }
    info!(elapsed_ms = started.elapsed().as_millis(), "search complete");

    let Some(paths) = controller.committed() else {
        bail!("search completed without results");
    };
    let Some(path) = paths.try_path_to(to_id) else {
        bail!("no path from {},{} to {},{}", from.x, from.y, to.x, to.y);
    };
    let polyline = graph.path_to_polyline(&path);
    println!("{}", serde_json::to_string(&polyline)?);
    Ok(())
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{s}`"))?;
    let coord = |v: &str| {
        v.trim()
            .parse::<usize>()
            .map_err(|_| format!("`{v}` is not a pixel coordinate"))
    };
    Ok(Point::new(coord(x)?, coord(y)?))
}
