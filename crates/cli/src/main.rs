//! SarComp CLI - SAR backscatter change composites

mod manifest;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use manifest::{format_date, load_stack, parse_date};
use sarcomp_algorithms::composite::{
    compute_composite, CompositeOutput, CompositeParams, DEFAULT_BASELINE_DAYS,
    DEFAULT_MONITORING_DAYS,
};
use sarcomp_algorithms::selection::{PassSelection, DEFAULT_SLOPE_THRESHOLD};
use sarcomp_algorithms::terrain::{terrain_model, EwSlope, TerrainParams};
use sarcomp_algorithms::trend::Weighting;
use sarcomp_colormap::Rgb;
use sarcomp_core::io::{read_geotiff, write_geotiff, write_rgba_geotiff};
use sarcomp_core::series::SceneStack;
use sarcomp_core::terrain::{FlatTerrain, TerrainLookup, TerrainRaster};
use sarcomp_core::{
    Algorithm, DateRange, Pass, Polarization, Raster, SeriesSource, Timestamp, MILLIS_PER_DAY,
};
use sarcomp_parallel::{num_cpus, CancelToken, ProcessingMode};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "sarcomp")]
#[command(author, version, about = "SAR backscatter time-series change composites", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a per-pixel model over a scene stack and write its bands
    Composite(CompositeArgs),
    /// East-west facing slope of a DEM, in degrees
    Terrain {
        /// Input DEM file
        #[arg(long)]
        dem: PathBuf,
        /// Output file
        #[arg(long)]
        out: PathBuf,
        /// Z-factor for unit conversion
        #[arg(short, long, default_value = "1.0")]
        z_factor: f64,
    },
    /// Print one pixel's time series as CSV
    Series {
        /// Scene manifest (JSON)
        #[arg(long)]
        manifest: PathBuf,
        #[arg(long)]
        row: usize,
        #[arg(long)]
        col: usize,
        /// VV or VH
        #[arg(long, default_value = "VV")]
        polarization: String,
    },
}

#[derive(clap::Args)]
struct CompositeArgs {
    /// Scene manifest (JSON); same-day scenes need RFC 3339 times
    #[arg(long)]
    manifest: PathBuf,
    /// DEM for terrain-aware pass selection (best, filter-steep)
    #[arg(long)]
    dem: Option<PathBuf>,
    /// Start of history [default: end - 180 days]
    #[arg(long)]
    baseline_start: Option<String>,
    /// Start of the monitoring window [default: end - 90 days]
    #[arg(long)]
    monitoring_start: Option<String>,
    /// End of the monitoring window, exclusive [default: today]
    #[arg(long)]
    end: Option<String>,
    /// Per-pixel model: trend, step, spike
    #[arg(short, long, default_value = "step")]
    algorithm: String,
    /// Pass selection: combine, ascending, descending, best, filter-steep
    #[arg(short, long, default_value = "combine")]
    pass: String,
    /// East-west slope threshold for filter-steep, in degrees
    #[arg(short, long, default_value_t = DEFAULT_SLOPE_THRESHOLD)]
    threshold: f64,
    /// Remove the annual harmonic fitted over the history window
    #[arg(long)]
    remove_season: bool,
    /// Trend weighting: none, linear
    #[arg(short, long, default_value = "none")]
    weighting: String,
    /// Step: observations required after a breakpoint (exclusive)
    #[arg(long, default_value = "3")]
    min_obs: usize,
    /// VV or VH
    #[arg(long, default_value = "VV")]
    polarization: String,
    /// Z-factor applied to the DEM
    #[arg(short, long, default_value = "1.0")]
    z_factor: f64,
    /// Output directory
    #[arg(short, long)]
    out_dir: PathBuf,
    /// Worker threads [default: all cores]
    #[arg(long)]
    threads: Option<usize>,
}

/// Legend entry as written to `legend.json`
#[derive(Serialize)]
struct LegendRecord {
    date: String,
    timestamp: Timestamp,
    name: &'static str,
    color: Rgb,
    text_color: Rgb,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Logging already initialized");
    }
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_dem(path: &Path) -> Result<Raster<f64>> {
    let pb = spinner("Reading DEM...");
    let raster: Raster<f64> = read_geotiff(path).context("Failed to read DEM")?;
    pb.finish_and_clear();
    info!("DEM: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}

fn write_result(raster: &Raster<f64>, path: &Path) -> Result<()> {
    write_geotiff(raster, path).with_context(|| format!("Failed to write {}", path.display()))
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn today() -> Timestamp {
    let now = chrono::Utc::now().timestamp_millis();
    now - now.rem_euclid(MILLIS_PER_DAY)
}

/// Map CLI arguments onto composite parameters
fn composite_params(args: &CompositeArgs) -> Result<CompositeParams> {
    let end = match &args.end {
        Some(s) => parse_date(s)?,
        None => today(),
    };
    let mut params = CompositeParams::ending_at(end);
    if let Some(s) = &args.baseline_start {
        params.baseline_start = parse_date(s)?;
    }
    if let Some(s) = &args.monitoring_start {
        params.monitoring_start = parse_date(s)?;
    }

    params.algorithm = args.algorithm.parse()?;
    params.pass_selection = match args.pass.parse()? {
        PassSelection::FilterSteep(_) => PassSelection::FilterSteep(args.threshold),
        other => other,
    };
    params.weighting = args.weighting.parse::<Weighting>()?;
    params.polarization = args.polarization.parse()?;
    params.remove_season = args.remove_season;
    params.min_obs = args.min_obs;
    params.mode = match args.threads {
        Some(n) => ProcessingMode::ParallelWith(n),
        None => ProcessingMode::Parallel,
    };

    params.validate()?;
    Ok(params)
}

/// Terrain for the run: slope/aspect from the DEM, or flat when the pass
/// selection does not consult terrain
fn load_terrain(
    args: &CompositeArgs,
    params: &CompositeParams,
    stack: &SceneStack,
) -> Result<Box<dyn TerrainLookup>> {
    if params.pass_selection.terrain_threshold().is_none() {
        if args.dem.is_some() {
            info!("Pass selection '{}' ignores the DEM", params.pass_selection);
        }
        return Ok(Box::new(FlatTerrain));
    }
    let Some(path) = &args.dem else {
        bail!("Pass selection '{}' requires --dem", params.pass_selection);
    };

    let dem = read_dem(path)?;
    if dem.shape() != stack.shape() {
        bail!(
            "DEM is {:?} but scenes are {:?}; resample the DEM onto the scene grid",
            dem.shape(),
            stack.shape()
        );
    }
    let terrain: TerrainRaster = terrain_model(&dem, &TerrainParams { z_factor: args.z_factor })?;
    Ok(Box::new(terrain))
}

fn write_composite(output: &CompositeOutput, out_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let pb = spinner("Writing bands...");
    for band in output.bands() {
        let stats = band.raster.statistics();
        info!(
            "{}: {} valid, {} masked, mean {}",
            band.name,
            stats.valid_count,
            stats.nodata_count,
            stats.mean.map_or_else(|| "-".to_string(), |m| format!("{m:.4}"))
        );
        write_result(&band.raster, &out_dir.join(format!("{}.tif", band.name)))?;
    }

    let template = &output.bands()[0].raster;
    let rgba = output.to_rgba()?;
    write_rgba_geotiff(&rgba, template.shape(), template.transform(), out_dir.join("preview.tif"))
        .context("Failed to write preview")?;

    if let Some(legend) = output.legend() {
        let records: Vec<LegendRecord> = legend
            .iter()
            .map(|e| LegendRecord {
                date: format_date(e.timestamp),
                timestamp: e.timestamp,
                name: e.name,
                color: e.color,
                text_color: e.text_color,
            })
            .collect();
        let path = out_dir.join("legend.json");
        let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &records).context("Failed to write legend")?;
    }
    pb.finish_and_clear();
    Ok(())
}

fn run_composite(args: &CompositeArgs) -> Result<()> {
    let params = composite_params(args)?;
    info!(
        "{} composite, monitoring {} to {} (history from {})",
        params.algorithm,
        format_date(params.monitoring_start),
        format_date(params.end),
        format_date(params.baseline_start)
    );
    debug!("{:?}", params);
    if params.remove_season && params.monitoring_start - params.baseline_start < 365 * MILLIS_PER_DAY {
        info!("History is shorter than a year; the season model will be poorly constrained");
    }

    let pb = spinner("Reading scenes...");
    let stack = load_stack(&args.manifest, params.polarization)?;
    pb.finish_and_clear();
    let (rows, cols) = stack.shape();
    info!("{} {} scenes, {} x {}", stack.len(), params.polarization, cols, rows);
    let (xmin, ymin, xmax, ymax) = stack.template().bounds();
    debug!("Extent: ({xmin:.3}, {ymin:.3}) - ({xmax:.3}, {ymax:.3})");
    info!("Threads: {}", args.threads.unwrap_or_else(num_cpus));

    let terrain = load_terrain(args, &params, &stack)?;

    let start = Instant::now();
    let pb = spinner("Fitting...");
    let output = compute_composite(&stack, terrain.as_ref(), &params, &CancelToken::new())?;
    pb.finish_and_clear();
    let elapsed = start.elapsed();

    write_composite(&output, &args.out_dir)?;
    done("Composite", &args.out_dir, elapsed);
    Ok(())
}

fn run_series(manifest: &Path, row: usize, col: usize, polarization: Polarization) -> Result<()> {
    let stack = load_stack(manifest, polarization)?;
    let (first, last) = stack.span().context("Empty scene stack")?;
    let series = stack.select((row, col), DateRange::new(first, last + 1)?)?;
    let (x, y) = stack.template().pixel_to_geo(col, row);
    info!("Pixel ({row}, {col}) centred at ({x:.3}, {y:.3})");

    println!("date,timestamp,ascending,descending");
    for obs in series {
        let value = obs.value.get().map(|v| v.to_string()).unwrap_or_default();
        let (asc, desc) = match obs.pass {
            Pass::Ascending => (value, String::new()),
            Pass::Descending => (String::new(), value),
        };
        println!("{},{},{},{}", format_date(obs.timestamp), obs.timestamp, asc, desc);
    }
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Composite(args) => run_composite(&args)?,

        Commands::Terrain { dem, out, z_factor } => {
            let raster = read_dem(&dem)?;
            let start = Instant::now();
            let result = EwSlope.execute(raster, TerrainParams { z_factor })?;
            let elapsed = start.elapsed();
            write_result(&result, &out)?;
            done(EwSlope.name(), &out, elapsed);
        }

        Commands::Series {
            manifest,
            row,
            col,
            polarization,
        } => run_series(&manifest, row, col, polarization.parse()?)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> CompositeArgs {
        let mut argv = vec!["sarcomp", "composite", "--manifest", "m.json", "--out-dir", "out"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Composite(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn defaults_map_onto_params() {
        let params = composite_params(&args(&["--end", "2021-01-01"])).unwrap();
        assert_eq!(params.end, parse_date("2021-01-01").unwrap());
        assert_eq!(params.end - params.baseline_start, DEFAULT_BASELINE_DAYS * MILLIS_PER_DAY);
        assert_eq!(params.end - params.monitoring_start, DEFAULT_MONITORING_DAYS * MILLIS_PER_DAY);
        assert_eq!(params.pass_selection, PassSelection::Combine);
        assert_eq!(params.mode, ProcessingMode::Parallel);
    }

    #[test]
    fn threshold_applies_to_filter_steep() {
        let params = composite_params(&args(&[
            "--end", "2021-01-01", "--pass", "filter-steep", "--threshold", "12.5", "--threads", "2",
        ]))
        .unwrap();
        assert_eq!(params.pass_selection, PassSelection::FilterSteep(12.5));
        assert_eq!(params.mode, ProcessingMode::ParallelWith(2));
    }

    #[test]
    fn bad_arguments_fail_fast() {
        assert!(composite_params(&args(&["--algorithm", "wiggle"])).is_err());
        assert!(composite_params(&args(&["--weighting", "cubic"])).is_err());
        assert!(composite_params(&args(&["--polarization", "HH"])).is_err());
        assert!(composite_params(&args(&[
            "--baseline-start", "2021-01-01", "--monitoring-start", "2020-06-01", "--end", "2021-02-01",
        ]))
        .is_err());
    }

    #[test]
    fn composite_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let mut entries = Vec::new();
        for i in 0..20 {
            let name = format!("s{i:02}.tif");
            let value = if i < 14 { -15.0 } else { -7.0 };
            write_geotiff(&Raster::filled(3, 3, value), dir.path().join(&name)).unwrap();
            let date = format_date(parse_date("2020-07-01").unwrap() + i * 6 * MILLIS_PER_DAY);
            let pass = if i % 2 == 0 { "ASCENDING" } else { "DESCENDING" };
            entries.push(format!(
                r#"{{"path": "{name}", "date": "{date}", "pass": "{pass}", "polarization": "VV"}}"#
            ));
        }
        let manifest = dir.path().join("scenes.json");
        std::fs::write(&manifest, format!("[{}]", entries.join(","))).unwrap();
        let out_dir = dir.path().join("out");

        let mut a = args(&[
            "--baseline-start", "2020-07-01", "--monitoring-start", "2020-08-30", "--end", "2020-12-01",
        ]);
        a.manifest = manifest.clone();
        a.out_dir = out_dir.clone();
        run_composite(&a).unwrap();

        let before: Raster<f64> = read_geotiff(out_dir.join("before.tif")).unwrap();
        let after: Raster<f64> = read_geotiff(out_dir.join("after.tif")).unwrap();
        assert_eq!(before.get(1, 1).unwrap(), -15.0);
        assert_eq!(after.get(1, 1).unwrap(), -7.0);
        assert!(out_dir.join("preview.tif").exists());
        assert!(!out_dir.join("legend.json").exists());

        a.algorithm = "spike".into();
        run_composite(&a).unwrap();
        let legend: serde_json::Value =
            serde_json::from_reader(File::open(out_dir.join("legend.json")).unwrap()).unwrap();
        assert_eq!(legend.as_array().unwrap().len(), 6);
        assert_eq!(legend[0]["date"], "2020-08-30");
        assert_eq!(legend[0]["color"], "#FF0000");
        assert_eq!(legend[0]["name"], "red");
        assert_eq!(legend[5]["name"], "magenta");

        run_series(&manifest, 2, 2, Polarization::VV).unwrap();
    }
}
