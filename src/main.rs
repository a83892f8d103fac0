mod logger;
mod raster;

use std::path::PathBuf;

use clap::Parser;
use data::heatmap::{self, Outcome};
use exchange::Recording;
use iced_core::Point;

use raster::PixelBuffer;

#[derive(Parser)]
#[command(name = "bandscope")]
#[command(about = "Replays a recorded order book session into a band heatmap")]
#[command(version)]
struct Cli {
    /// Recording file: opening snapshot plus event stream, as JSON.
    recording: PathBuf,
    /// Engine settings, as JSON.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "heatmap.ppm")]
    out: PathBuf,
    /// Overrides the configured number of price bands.
    #[arg(long)]
    granularity: Option<usize>,
    /// Canvas point to describe after the replay, as `x,y`.
    #[arg(long, value_parser = parse_point)]
    hover: Option<Point>,
    /// Compares the incremental band state with a fresh rebuild at the end.
    #[arg(long)]
    verify: bool,
    /// Logs to stdout instead of the log file.
    #[arg(long)]
    debug: bool,
}

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error(transparent)]
    Config(#[from] data::config::Error),
    #[error(transparent)]
    Recording(#[from] exchange::Error),
    #[error("Failed to write image: {0}")]
    Io(#[from] std::io::Error),
    #[error("Incremental state diverged from rebuild at band {0}")]
    Diverged(usize),
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{s}`"))?;

    let x = x.trim().parse::<f32>().map_err(|e| e.to_string())?;
    let y = y.trim().parse::<f32>().map_err(|e| e.to_string())?;

    Ok(Point::new(x, y))
}

#[derive(Debug, Default)]
struct Tally {
    painted: usize,
    invisible: usize,
    rebuilt: usize,
    queued: usize,
    rejected: usize,
}

impl Tally {
    fn count(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Painted => self.painted += 1,
            Outcome::Invisible => self.invisible += 1,
            Outcome::Rebuilt(_) => self.rebuilt += 1,
            Outcome::Queued => self.queued += 1,
            Outcome::Rejected => self.rejected += 1,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let is_debug = cli.debug || cfg!(feature = "debug");

    if let Err(e) = logger::setup(is_debug) {
        eprintln!("Failed to initialize logger: {e}");
    }

    if let Err(e) = run(cli) {
        log::error!("{e}");
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let config = match &cli.config {
        Some(path) => data::config::load(path)?,
        None => heatmap::Config::default(),
    };

    let Recording { snapshot, events } = Recording::load(&cli.recording)?;

    let size = config.canvas_size();
    let mut canvas = PixelBuffer::new(size.width, size.height);

    let mut engine = data::Engine::new(config, &snapshot, size);
    engine.rebuild(&mut canvas, false);

    if let Some(granularity) = cli.granularity {
        engine.set_price_granularity(granularity, &mut canvas);
    }

    let mut tally = Tally::default();
    for event in events {
        let timestamp = event.timestamp();

        tally.count(engine.apply_update(event, &mut canvas));
        if let Some(outcome) = engine.refresh(timestamp, &mut canvas) {
            tally.count(outcome);
        }
    }

    engine.draw_overlay(&mut canvas);
    canvas.write_ppm(&cli.out)?;

    log::info!(
        "Replay done: {} painted, {} invisible, {} rebuilds, {} queued, {} rejected",
        tally.painted,
        tally.invisible,
        tally.rebuilt,
        tally.queued,
        tally.rejected
    );

    match engine.top_of_book() {
        (Some(bid), Some(ask)) => log::info!("Top of book: {bid} / {ask}"),
        (bid, ask) => log::info!("Top of book: {bid:?} / {ask:?}"),
    }
    log::info!(
        "Color domain {} after {} changes, wrote {}",
        engine.color_domain_max(),
        engine.domain_changes().len(),
        cli.out.display()
    );

    if let Some(point) = cli.hover {
        match engine.band_at(point) {
            Some(info) => println!("{}", info.describe()),
            None => println!("no band at ({}, {})", point.x, point.y),
        }
    }

    if cli.verify {
        engine.verify_against_rebuild().map_err(Error::Diverged)?;
        log::info!("Incremental band state matches a fresh rebuild");
    }

    Ok(())
}
