//! Radar regridder.
//!
//! Reads one or two sweep snapshots (JSON), resamples them onto the
//! configured grid using cached index matrices and writes the resulting
//! field as JSON. With two inputs the output is the difference
//! `second - first`, optionally floored at a rain threshold and masked
//! beyond the configured range. With `--heights` the beam heights of the
//! snapshots' site and elevation are written instead of reflectivity.

mod snapshot;

use std::ops::Sub;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use grid_index::compare::{apply_mask, difference, floor_below, MissingValue};
use grid_index::{
    EffectiveEarthModel, GridConfig, GridField, IndexCache, IndexCacheConfig, RadarSource,
    Regridder, SweepSource,
};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use snapshot::{RegridOutput, Snapshot};

#[derive(Parser, Debug)]
#[command(name = "regridder")]
#[command(about = "Resample radar sweeps onto a regular grid")]
struct Args {
    /// Grid configuration file (YAML). Falls back to GRID_* environment variables.
    #[arg(short, long, env = "GRID_CONFIG")]
    config: Option<PathBuf>,

    /// Sweep snapshot (JSON). Give twice to compute a difference.
    #[arg(short, long, required = true)]
    input: Vec<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Index cache directory (overrides INDEX_CACHE_DIR)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Raise values below this threshold (dBZ) to the threshold
    #[arg(long)]
    rain_threshold: Option<f32>,

    /// Write beam heights (m) for each snapshot's site and elevation
    #[arg(long, conflicts_with = "rain_threshold")]
    heights: bool,

    /// Set cells beyond the configured max range to null
    #[arg(long)]
    mask: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let json = run(&args)?;
    match &args.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{}", json),
    }

    Ok(())
}

/// Regrid the inputs named in `args` and return the output document.
fn run(args: &Args) -> Result<String> {
    if args.input.len() > 2 {
        bail!("expected one or two inputs, got {}", args.input.len());
    }

    let grid_config = match &args.config {
        Some(path) => GridConfig::from_yaml_file(path)
            .with_context(|| format!("loading grid config {}", path.display()))?,
        None => GridConfig::from_env().context("grid config from environment")?,
    };

    let mut cache_config = IndexCacheConfig::from_env();
    if let Some(dir) = &args.cache_dir {
        cache_config.cache_dir = dir.clone();
    }
    let cache = IndexCache::new(&cache_config)
        .with_context(|| format!("opening index cache {}", cache_config.cache_dir.display()))?;

    info!(
        shape = ?grid_config.shape,
        resolution_m = grid_config.resolution_m,
        cache_dir = %cache_config.cache_dir.display(),
        heights = args.heights,
        "Starting regridder"
    );

    let mut regridder = Regridder::new(grid_config, cache)?;

    let sources = args
        .input
        .iter()
        .map(|path| read_source(path))
        .collect::<Result<Vec<_>>>()?;
    let name = match sources.as_slice() {
        [first, second] => format!("{} - {}", second.name(), first.name()),
        [only] => only.name().to_string(),
        _ => bail!("no input given"),
    };

    let json = if args.heights {
        let model = EffectiveEarthModel::default();
        let mut fields = Vec::with_capacity(sources.len());
        for source in &sources {
            let field = regridder
                .source_beam_height(source, &model)
                .with_context(|| format!("beam height for {}", source.name()))?;
            fields.push(field);
        }
        let field = combine(&regridder, fields, args.mask)?;
        let valid_cells = field.valid_count();
        log_complete(&regridder, valid_cells);
        serde_json::to_string(&build_output(&regridder, name, valid_cells, field))?
    } else {
        let mut fields = Vec::with_capacity(sources.len());
        for source in &sources {
            let mut field = regridder
                .regrid(source)
                .with_context(|| format!("regridding {}", source.name()))?;
            if let Some(threshold) = args.rain_threshold {
                field = floor_below(&field, threshold);
            }
            fields.push(field);
        }
        let field = combine(&regridder, fields, args.mask)?;
        let valid_cells = field.valid_count();
        log_complete(&regridder, valid_cells);
        serde_json::to_string(&build_output(&regridder, name, valid_cells, field))?
    };

    Ok(json)
}

fn read_source(path: &Path) -> Result<SweepSource> {
    Snapshot::from_json_file(path)
        .and_then(Snapshot::into_source)
        .with_context(|| format!("reading snapshot {}", path.display()))
}

/// Difference of two fields (or the only one), masked beyond range if asked.
fn combine<T>(
    regridder: &Regridder,
    mut fields: Vec<GridField<T>>,
    mask: bool,
) -> Result<GridField<T>>
where
    T: MissingValue + Sub<Output = T>,
{
    let field = match (fields.pop(), fields.pop()) {
        (Some(second), Some(first)) => difference(&first, &second)?,
        (Some(only), None) => only,
        _ => bail!("no input regridded"),
    };
    if mask {
        return Ok(apply_mask(&field, &regridder.range_mask())?);
    }
    Ok(field)
}

fn log_complete(regridder: &Regridder, valid_cells: usize) {
    let stats = regridder.cache().stats();
    info!(
        memory_hits = stats.memory_hits,
        disk_hits = stats.disk_hits,
        builds = stats.builds,
        valid_cells,
        "Regridding complete"
    );
}

fn build_output<T: Serialize>(
    regridder: &Regridder,
    name: String,
    valid_cells: usize,
    field: GridField<T>,
) -> RegridOutput<T> {
    let coords = regridder.coordinates();
    RegridOutput {
        name,
        corners: *regridder.geometry().corners(),
        resolution_m: regridder.config().resolution_m,
        cell_reference: coords.reference,
        lon: coords.lon.clone(),
        lat: coords.lat.clone(),
        valid_cells,
        field,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    // Cell centers of a 4x4 grid of 1000 m cells around (0, 0)
    const AXIS: [f64; 4] = [-0.0135, -0.0045, 0.0045, 0.0135];

    const GRID_YAML: &str = "\
center_lon: 0.0
center_lat: 0.0
resolution_m: 1000.0
shape: [4, 4]
max_range_m: 1500.0
";

    fn write_snapshot(dir: &Path, name: &str, value: f32, elevation_deg: f64) -> PathBuf {
        let lon: Vec<f64> = (0..16).map(|k| AXIS[k % 4]).collect();
        let lat: Vec<f64> = (0..16).map(|k| AXIS[k / 4]).collect();
        let snapshot = json!({
            "name": name,
            "rows": 4,
            "cols": 4,
            "lon": lon,
            "lat": lat,
            "values": vec![value; 16],
            "site": [0.0, 0.0],
            "elevation_deg": elevation_deg,
        });
        let path = dir.join(format!("{}.json", name));
        std::fs::write(&path, snapshot.to_string()).unwrap();
        path
    }

    fn args(dir: &Path, input: Vec<PathBuf>) -> Args {
        let config = dir.join("grid.yaml");
        std::fs::write(&config, GRID_YAML).unwrap();
        Args {
            config: Some(config),
            input,
            output: None,
            cache_dir: Some(dir.join("cache")),
            rain_threshold: None,
            heights: false,
            mask: false,
            log_level: "info".to_string(),
        }
    }

    fn field_data(json: &str) -> Vec<Value> {
        let output: Value = serde_json::from_str(json).unwrap();
        output["field"]["data"].as_array().unwrap().clone()
    }

    fn is_inner(k: usize) -> bool {
        matches!((k / 4, k % 4), (1..=2, 1..=2))
    }

    #[test]
    fn test_single_input() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_snapshot(dir.path(), "boo", 10.0, 0.5);
        let json = run(&args(dir.path(), vec![a])).unwrap();

        let output: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(output["name"], "boo");
        assert_eq!(output["valid_cells"], 16);
        assert!(field_data(&json).iter().all(|v| v.as_f64() == Some(10.0)));
    }

    #[test]
    fn test_masked_difference() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_snapshot(dir.path(), "early", 10.0, 0.5);
        let b = write_snapshot(dir.path(), "late", 25.0, 0.5);
        let mut args = args(dir.path(), vec![a, b]);
        args.mask = true;

        let json = run(&args).unwrap();
        let output: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(output["name"], "late - early");
        assert_eq!(output["valid_cells"], 4);

        let data = field_data(&json);
        assert_eq!(data.len(), 16);
        for (k, v) in data.iter().enumerate() {
            if is_inner(k) {
                assert_eq!(v.as_f64(), Some(15.0), "cell {}", k);
            } else {
                assert!(v.is_null(), "cell {} should be masked", k);
            }
        }
    }

    #[test]
    fn test_rain_threshold_floors_before_difference() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_snapshot(dir.path(), "early", 10.0, 0.5);
        let b = write_snapshot(dir.path(), "late", 25.0, 0.5);
        let mut args = args(dir.path(), vec![a, b]);
        args.rain_threshold = Some(20.0);

        let json = run(&args).unwrap();
        assert!(field_data(&json).iter().all(|v| v.as_f64() == Some(5.0)));
    }

    #[test]
    fn test_second_run_reuses_disk_cache() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_snapshot(dir.path(), "boo", 10.0, 0.5);
        let args = args(dir.path(), vec![a]);

        let first = run(&args).unwrap();
        let entries = std::fs::read_dir(dir.path().join("cache")).unwrap().count();
        assert_eq!(entries, 1);
        assert_eq!(run(&args).unwrap(), first);
    }

    #[test]
    fn test_heights_difference() {
        let dir = tempfile::tempdir().unwrap();
        let low = write_snapshot(dir.path(), "low", 10.0, 0.5);
        let high = write_snapshot(dir.path(), "high", 10.0, 1.5);
        let mut args = args(dir.path(), vec![low, high]);
        args.heights = true;

        let json = run(&args).unwrap();
        let data = field_data(&json);
        assert_eq!(data.len(), 16);
        assert!(data.iter().all(|v| v.as_f64().unwrap() > 0.0));

        args.mask = true;
        let masked = field_data(&run(&args).unwrap());
        for (k, v) in masked.iter().enumerate() {
            assert_eq!(v.is_null(), !is_inner(k), "cell {}", k);
        }
    }

    #[test]
    fn test_heights_need_site() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.json");
        let snapshot = json!({
            "name": "bare",
            "rows": 1,
            "cols": 1,
            "lon": [0.0],
            "lat": [0.0],
            "values": [1.0],
        });
        std::fs::write(&path, snapshot.to_string()).unwrap();
        let mut args = args(dir.path(), vec![path]);
        args.heights = true;

        let err = run(&args).unwrap_err();
        assert!(format!("{:#}", err).contains("has no site"));
    }

    #[test]
    fn test_rejects_more_than_two_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_snapshot(dir.path(), "boo", 10.0, 0.5);
        let args = args(dir.path(), vec![a.clone(), a.clone(), a]);
        assert!(run(&args).is_err());
    }

    #[test]
    fn test_heights_conflict_with_rain_threshold() {
        let parsed = Args::try_parse_from([
            "regridder",
            "--config",
            "grid.yaml",
            "--input",
            "a.json",
            "--heights",
            "--rain-threshold",
            "5",
        ]);
        assert!(parsed.is_err());
    }
}
