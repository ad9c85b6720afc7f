//! Change composites over a scene stack
//!
//! For every location the driver pulls the series from a [`SeriesSource`],
//! masks passes according to the terrain, optionally removes the annual
//! season, and runs one detector. Each detector result becomes a set of
//! named bands; masked results are NaN.

mod params;

pub use params::{
    CompositeParams, FitAlgorithm, DEFAULT_BASELINE_DAYS, DEFAULT_MONITORING_DAYS,
};

use crate::season::{fit_season, remove_season};
use crate::spike::find_spike;
use crate::step::fit_step;
use crate::trend::fit_trend;
use sarcomp_colormap::{composite_to_rgba, spike_legend, LegendEntry, Stretch};
use sarcomp_core::raster::Raster;
use sarcomp_core::series::{check_sorted, valid_count, within};
use sarcomp_core::{DateRange, Location, Masked, Result, SeriesSource, TerrainLookup};
use sarcomp_parallel::CancelToken;

/// One named output band
#[derive(Debug, Clone)]
pub struct Band {
    pub name: &'static str,
    pub raster: Raster<f64>,
}

/// Bands of a composite run, in [`FitAlgorithm::band_names`] order
#[derive(Debug, Clone)]
pub struct CompositeOutput {
    algorithm: FitAlgorithm,
    stretch: Stretch,
    bands: Vec<Band>,
    legend: Option<Vec<LegendEntry>>,
}

impl CompositeOutput {
    pub fn algorithm(&self) -> FitAlgorithm {
        self.algorithm
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// Band by name
    pub fn band(&self, name: &str) -> Option<&Raster<f64>> {
        self.bands.iter().find(|b| b.name == name).map(|b| &b.raster)
    }

    /// Spike date legend; `None` for other algorithms
    pub fn legend(&self) -> Option<&[LegendEntry]> {
        self.legend.as_deref()
    }

    /// Stretch applied by [`CompositeOutput::to_rgba`]
    pub fn stretch(&self) -> &Stretch {
        &self.stretch
    }

    /// RGBA preview of the first three bands
    pub fn to_rgba(&self) -> Result<Vec<u8>> {
        composite_to_rgba(
            [&self.bands[0].raster, &self.bands[1].raster, &self.bands[2].raster],
            &self.stretch,
        )
    }
}

/// Time windows of one run, validated once
#[derive(Debug, Clone, Copy)]
struct Windows {
    full: DateRange,
    baseline: DateRange,
    monitoring: DateRange,
}

/// Compute a change composite.
///
/// Parameters are validated before any location is visited. Locations with
/// too little data yield NaN in every fitted band; source, terrain and
/// ordering failures abort the run, as does cancellation.
pub fn compute_composite<S, T>(
    source: &S,
    terrain: &T,
    params: &CompositeParams,
    cancel: &CancelToken,
) -> Result<CompositeOutput>
where
    S: SeriesSource + ?Sized,
    T: TerrainLookup + ?Sized,
{
    params.validate()?;
    let windows = Windows {
        full: params.full_range()?,
        baseline: params.baseline_range()?,
        monitoring: params.monitoring_range()?,
    };

    let (rows, cols) = source.shape();
    let values = params.mode.map_locations((rows, cols), cancel, |location| {
        fit_location(source, terrain, params, &windows, location)
    })?;

    let transform = source.transform();
    let bands = params
        .algorithm
        .band_names()
        .iter()
        .enumerate()
        .map(|(b, &name)| {
            let data: Vec<f64> = values.iter().map(|v| v[b]).collect();
            let mut raster = Raster::from_vec(data, rows, cols)?;
            raster.set_transform(transform);
            raster.set_nodata(Some(f64::NAN));
            Ok(Band { name, raster })
        })
        .collect::<Result<Vec<_>>>()?;

    let (stretch, legend) = match params.algorithm {
        FitAlgorithm::Spike => (Stretch::UNIT, Some(spike_legend(windows.monitoring))),
        _ => (Stretch::for_polarization(params.polarization), None),
    };

    Ok(CompositeOutput {
        algorithm: params.algorithm,
        stretch,
        bands,
        legend,
    })
}

/// Band values at one location, NaN where masked
fn fit_location<S, T>(
    source: &S,
    terrain: &T,
    params: &CompositeParams,
    windows: &Windows,
    location: Location,
) -> Result<Vec<f64>>
where
    S: SeriesSource + ?Sized,
    T: TerrainLookup + ?Sized,
{
    let raw = source.select(location, windows.full)?;
    check_sorted(&raw)?;

    let sample = match params.pass_selection.terrain_threshold() {
        Some(_) => terrain.terrain_at(location)?,
        None => None,
    };
    let mut full = params.pass_selection.apply(&raw, sample);

    if params.remove_season {
        let model = fit_season(within(&full, windows.baseline));
        full = remove_season(&full, model.as_ref());
    }
    let monitoring = within(&full, windows.monitoring);

    let nan = f64::NAN;
    let masked = |m: Masked| m.unwrap_or(nan);
    let values = match params.algorithm {
        FitAlgorithm::Trend => match fit_trend(monitoring, windows.monitoring, params.weighting) {
            Some(fit) => vec![
                fit.level_at_start,
                fit.level_at_end,
                masked(fit.r_squared),
                fit.count as f64,
                fit.slope_per_year,
            ],
            None => vec![nan; 5],
        },
        FitAlgorithm::Step => {
            // Series sizes are reported even where no step fits
            let in_series = valid_count(&full) as f64;
            let in_change = valid_count(monitoring) as f64;
            match fit_step(&full, monitoring, params.min_obs) {
                Some(fit) => vec![
                    fit.left_level,
                    fit.right_level,
                    masked(fit.r_squared),
                    in_series,
                    in_change,
                    fit.breakpoint as f64,
                    fit.left_count as f64,
                    fit.right_count as f64,
                ],
                None => vec![nan, nan, nan, in_series, in_change, nan, nan, nan],
            }
        }
        FitAlgorithm::Spike => match find_spike(monitoring, windows.monitoring) {
            Some(fit) => {
                let [r, g, b] = fit.color(windows.monitoring);
                vec![r, g, b, fit.spike_timestamp as f64, masked(fit.ratio), fit.baseline]
            }
            None => vec![nan; 6],
        },
    };
    Ok(values)
}
