//! GHG-intensity table: per-(month, hour) grid emission factors.

use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Deserialize;
use tracing::debug;

use crate::error::{PlanError, Result};
use crate::{HOURS, MONTHS};

/// One row of the intensity dataset. Other columns in the file are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IntensityRow {
    #[serde(rename = "Month")]
    pub month: i64,
    #[serde(rename = "avg_GHGIntensity")]
    pub avg_ghg_intensity: f64,
}

/// Ordered 24-value intensity sequence for each of the 12 months.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityTable {
    months: Vec<Vec<f64>>,
}

impl IntensityTable {
    /// Groups rows by month, keeping file order within a month.
    ///
    /// A month with 24 rows maps them to hours 1..=24 in order; a month with a
    /// single row uses that value for every hour.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Data`] if a month has no rows, a row count other
    /// than 1 or 24, a month number outside 1..=12, or a non-finite value.
    pub fn from_rows(rows: impl IntoIterator<Item = IntensityRow>) -> Result<Self> {
        let mut by_month: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
        for (index, row) in rows.into_iter().enumerate() {
            let month = usize::try_from(row.month)
                .ok()
                .filter(|m| (1..=MONTHS).contains(m))
                .ok_or_else(|| {
                    PlanError::Data(format!(
                        "row {}: month {} is outside 1..=12",
                        index + 1,
                        row.month
                    ))
                })?;
            if !row.avg_ghg_intensity.is_finite() {
                return Err(PlanError::Data(format!(
                    "row {}: intensity for month {month} is not a finite number",
                    index + 1
                )));
            }
            by_month.entry(month).or_default().push(row.avg_ghg_intensity);
        }

        let mut months = Vec::with_capacity(MONTHS);
        for month in 1..=MONTHS {
            let values = by_month.remove(&month).unwrap_or_default();
            let hourly = match values.len() {
                0 => {
                    return Err(PlanError::Data(format!(
                        "no intensity rows for month {month}"
                    )));
                }
                1 => vec![values[0]; HOURS],
                HOURS => values,
                n => {
                    return Err(PlanError::Data(format!(
                        "month {month} has {n} intensity rows, expected 1 or {HOURS}"
                    )));
                }
            };
            months.push(hourly);
        }
        Ok(Self { months })
    }

    /// Parses a headed CSV with `Month` and `avg_GHGIntensity` columns.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Data`] for unparseable rows and anything
    /// [`IntensityTable::from_rows`] rejects.
    pub fn from_csv_reader(reader: impl Read) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let rows = rdr
            .deserialize::<IntensityRow>()
            .enumerate()
            .map(|(index, row)| {
                row.map_err(|e| PlanError::Data(format!("row {}: {e}", index + 1)))
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(rows = rows.len(), "parsed intensity rows");
        Self::from_rows(rows)
    }

    /// Reads the dataset from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Data`] if the file cannot be opened or parsed.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            PlanError::Data(format!("cannot open \"{}\": {e}", path.display()))
        })?;
        Self::from_csv_reader(file)
    }

    /// Deterministic stand-in for the external dataset.
    ///
    /// Winter months run dirtier than summer, afternoons dirtier than nights,
    /// with a little Gaussian noise on top. Values stay strictly positive.
    pub fn synthetic(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let months = (1..=MONTHS)
            .map(|month| {
                let seasonal = 1.0 + 0.25 * (2.0 * PI * (month - 1) as f64 / MONTHS as f64).cos();
                (1..=HOURS)
                    .map(|hour| {
                        let diurnal = 1.0 + 0.3 * (PI * (hour as f64 - 8.0) / 12.0).sin();
                        let noisy = 60.0 * seasonal * diurnal + gaussian_noise(&mut rng, 2.0);
                        noisy.max(1.0)
                    })
                    .collect()
            })
            .collect();
        Self { months }
    }

    /// Intensity for model slot (`month` 1..=12, `hour` 1..=24).
    pub fn at(&self, month: usize, hour: usize) -> f64 {
        self.months[month - 1][hour - 1]
    }

    /// The 24 hourly values of `month`.
    pub fn month(&self, month: usize) -> &[f64] {
        &self.months[month - 1]
    }
}

/// Box–Muller sample with zero mean.
fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    let u1: f64 = rng.random::<f64>().clamp(1e-9, 1.0);
    let u2: f64 = rng.random::<f64>();
    std_dev * (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}
