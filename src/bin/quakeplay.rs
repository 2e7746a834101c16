use std::{
    fs,
    path::{Path, PathBuf},
    thread,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use quakeplay::{
    Engine, EngineConfig, MagFilter, ManualScheduler, MemoryLayer, WebMercator,
    geojson::parse_feature_collection,
    query::{Catalog, CatalogQuery, OrderBy, QueryBounds, parse_utc_datetime},
    source::SourceKind,
    timefmt::{fmt_hms, fmt_utc_ms},
};

#[derive(Parser, Debug)]
#[command(name = "quakeplay", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a GeoJSON feed file and print its summary.
    Inspect(InspectArgs),
    /// Replay a GeoJSON feed file headlessly, printing per-tick visibility.
    Replay(ReplayArgs),
    /// Validate a catalog query and print the request URL.
    QueryUrl(QueryUrlArgs),
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input feed JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct ReplayArgs {
    /// Input feed JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Virtual seconds per real second.
    #[arg(long, default_value_t = 3600.0)]
    speed: f64,

    /// Fade-out window in real seconds (0 disables).
    #[arg(long, default_value_t = 0.0)]
    fade: f64,

    /// Hide events below this magnitude.
    #[arg(long)]
    min_mag: Option<f64>,

    /// Hide events above this magnitude.
    #[arg(long)]
    max_mag: Option<f64>,

    /// Sleep between ticks for wall-clock pacing instead of replaying as
    /// fast as possible.
    #[arg(long)]
    realtime: bool,
}

#[derive(Parser, Debug)]
struct QueryUrlArgs {
    #[arg(long, value_enum, default_value_t = CatalogChoice::Usgs)]
    catalog: CatalogChoice,

    /// Query start, `YYYY-MM-DD[THH:MM]` or RFC 3339, UTC.
    #[arg(long)]
    start: String,

    /// Query end, same forms as start.
    #[arg(long)]
    end: String,

    #[arg(long, default_value_t = 0.0)]
    min_mag: f64,

    #[arg(long)]
    max_mag: Option<f64>,

    /// Bounding box as `west,south,east,north` degrees.
    #[arg(long, value_delimiter = ',', num_args = 4, allow_hyphen_values = true)]
    bbox: Option<Vec<f64>>,

    /// Radius filter as `lat,lon,km`.
    #[arg(long, value_delimiter = ',', num_args = 3, allow_hyphen_values = true)]
    radius_km: Option<Vec<f64>>,

    #[arg(long, default_value_t = 20_000)]
    limit: u32,

    #[arg(long, value_enum, default_value_t = OrderChoice::Time)]
    order: OrderChoice,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CatalogChoice {
    Usgs,
    Emsc,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OrderChoice {
    Time,
    TimeAsc,
    Magnitude,
    MagnitudeAsc,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Inspect(args) => cmd_inspect(args),
        Command::Replay(args) => cmd_replay(args),
        Command::QueryUrl(args) => cmd_query_url(args),
    }
}

fn load_file(
    engine: &mut Engine,
    sched: &mut ManualScheduler,
    layer: &mut MemoryLayer,
    path: &Path,
) -> anyhow::Result<bool> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let source = SourceKind::UserFile { name };
    let generation = engine.begin_load(sched, layer);
    let payload = fs::read_to_string(path)
        .with_context(|| format!("read feed '{}'", path.display()))
        .map_err(Into::into)
        .and_then(|text| parse_feature_collection(&text));
    let installed = engine.commit_load(generation, payload, &source, &WebMercator, layer);
    for entry in engine.drain_status() {
        println!("{entry}");
    }
    Ok(installed)
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let mut engine = Engine::new(EngineConfig::default());
    let mut sched = ManualScheduler::new();
    let mut layer = MemoryLayer::new();
    if !load_file(&mut engine, &mut sched, &mut layer, &args.in_path)? {
        anyhow::bail!("load failed");
    }

    let dataset = engine.dataset().context("dataset missing after load")?;
    println!("events:     {}", dataset.len());
    println!(
        "time range: {} - {} ({})",
        fmt_utc_ms(dataset.window.start_ms),
        fmt_utc_ms(dataset.window.end_ms),
        fmt_hms(dataset.window.span_ms() as f64)
    );
    println!("magnitudes: {} - {}", dataset.mag_min(), dataset.mag_max());
    Ok(())
}

fn cmd_replay(args: ReplayArgs) -> anyhow::Result<()> {
    let mut engine = Engine::new(EngineConfig::default());
    let mut sched = ManualScheduler::new();
    let mut layer = MemoryLayer::new();
    if !load_file(&mut engine, &mut sched, &mut layer, &args.in_path)? {
        anyhow::bail!("load failed");
    }

    engine.set_speed(args.speed, &mut sched, &mut layer);
    engine.set_fade_seconds(args.fade, &mut layer);
    engine.set_mag_filter(
        MagFilter {
            min: args.min_mag,
            max: args.max_mag,
        },
        &mut layer,
    );

    engine.reset(&mut sched, &mut layer);
    engine.start(&mut sched);
    for entry in engine.drain_status() {
        println!("{entry}");
    }

    let interval = engine.clock().tick_interval();
    while engine.is_playing() {
        engine.tick(&mut sched, &mut layer);
        println!(
            "{}  visible {:>5}  styles {:>3}",
            fmt_utc_ms(engine.clock().virtual_time_ms() as i64),
            engine.visible_count(),
            engine.style_cache_len()
        );
        if args.realtime {
            thread::sleep(interval);
        }
    }
    for entry in engine.drain_status() {
        println!("{entry}");
    }
    Ok(())
}

fn cmd_query_url(args: QueryUrlArgs) -> anyhow::Result<()> {
    let bounds = match (&args.bbox, &args.radius_km) {
        (Some(_), Some(_)) => anyhow::bail!("--bbox and --radius-km are mutually exclusive"),
        (Some(b), None) => QueryBounds::Bbox {
            west: b[0],
            south: b[1],
            east: b[2],
            north: b[3],
        },
        (None, Some(r)) => QueryBounds::RadiusKm {
            lat: r[0],
            lon: r[1],
            km: r[2],
        },
        (None, None) => QueryBounds::None,
    };

    let query = CatalogQuery {
        catalog: match args.catalog {
            CatalogChoice::Usgs => Catalog::Usgs,
            CatalogChoice::Emsc => Catalog::Emsc,
        },
        start: parse_utc_datetime(&args.start)?,
        end: parse_utc_datetime(&args.end)?,
        min_magnitude: args.min_mag,
        max_magnitude: args.max_mag,
        bounds,
        limit: args.limit,
        order: match args.order {
            OrderChoice::Time => OrderBy::Time,
            OrderChoice::TimeAsc => OrderBy::TimeAsc,
            OrderChoice::Magnitude => OrderBy::Magnitude,
            OrderChoice::MagnitudeAsc => OrderBy::MagnitudeAsc,
        },
    };

    println!("{}", query.to_url()?);
    Ok(())
}
