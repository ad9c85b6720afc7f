//! Scene manifests and date arguments

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sarcomp_core::io::read_geotiff;
use sarcomp_core::series::{Scene, SceneStack};
use sarcomp_core::{Pass, Polarization, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One scene band on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// GeoTIFF with sigma0 in dB; relative paths are resolved against the
    /// manifest's directory
    pub path: PathBuf,
    /// Acquisition time, RFC 3339 or `YYYY-MM-DD`
    pub date: String,
    pub pass: Pass,
    pub polarization: Polarization,
}

/// Parse an RFC 3339 timestamp or a calendar date (midnight UTC)
pub fn parse_date(s: &str) -> Result<Timestamp> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp_millis());
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{s}', expected YYYY-MM-DD or RFC 3339"))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .with_context(|| format!("Invalid date '{s}'"))?;
    Ok(midnight.and_utc().timestamp_millis())
}

/// `YYYY-MM-DD` for a timestamp
pub fn format_date(timestamp: Timestamp) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Read the manifest entries
pub fn read_manifest(path: &Path) -> Result<Vec<ManifestEntry>> {
    let file = File::open(path).with_context(|| format!("Failed to open manifest {}", path.display()))?;
    let entries: Vec<ManifestEntry> =
        serde_json::from_reader(BufReader::new(file)).context("Failed to parse manifest")?;
    Ok(entries)
}

/// Load every scene of one polarization into a stack
pub fn load_stack(path: &Path, polarization: Polarization) -> Result<SceneStack> {
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let mut scenes = Vec::new();
    let mut seen: HashMap<Timestamp, PathBuf> = HashMap::new();

    for entry in read_manifest(path)? {
        if entry.polarization != polarization {
            continue;
        }
        let file = if entry.path.is_absolute() {
            entry.path.clone()
        } else {
            base.join(&entry.path)
        };
        debug!("Reading {} ({}, {})", file.display(), entry.date, entry.pass);
        let timestamp = parse_date(&entry.date)?;
        if let Some(other) = seen.insert(timestamp, file.clone()) {
            bail!(
                "Scenes {} and {} share the acquisition time {}; give same-day scenes RFC 3339 times",
                other.display(),
                file.display(),
                entry.date
            );
        }
        let band = read_geotiff::<f64, _>(&file)
            .with_context(|| format!("Failed to read scene {}", file.display()))?;
        scenes.push(Scene {
            timestamp,
            pass: entry.pass,
            band,
        });
    }

    if scenes.is_empty() {
        bail!("Manifest {} lists no {polarization} scenes", path.display());
    }
    SceneStack::new(scenes).context("Inconsistent scene stack")
}
