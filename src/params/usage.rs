//! Household usage: monthly period totals spread into an hourly profile.

use serde::Serialize;

use super::tariff::{Tariff, TariffPeriod};
use crate::HOURS;
use crate::error::{PlanError, Result};

/// Household consumption per representative day, by tariff period (kWh).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UsageTotals {
    pub on_peak_kwh: f64,
    pub mid_peak_kwh: f64,
    pub off_peak_kwh: f64,
}

impl Default for UsageTotals {
    fn default() -> Self {
        Self {
            on_peak_kwh: 500.0,
            mid_peak_kwh: 300.0,
            off_peak_kwh: 380.0,
        }
    }
}

impl UsageTotals {
    pub fn for_period(&self, period: TariffPeriod) -> f64 {
        match period {
            TariffPeriod::OnPeak => self.on_peak_kwh,
            TariffPeriod::MidPeak => self.mid_peak_kwh,
            TariffPeriod::OffPeak => self.off_peak_kwh,
        }
    }

    pub fn total_kwh(&self) -> f64 {
        self.on_peak_kwh + self.mid_peak_kwh + self.off_peak_kwh
    }

    /// Cost of buying all usage from the grid at the period rates, with no
    /// battery. Independent of any solve.
    pub fn baseline_cost(&self, tariff: &Tariff) -> f64 {
        TariffPeriod::ALL
            .iter()
            .map(|&period| self.for_period(period) * tariff.rate(period))
            .sum()
    }
}

/// Hourly household usage (kWh), identical for every month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageProfile {
    hourly_kwh: Vec<f64>,
}

impl UsageProfile {
    /// Splits each period total evenly over that period's hours, rounded to
    /// 4 decimal places.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::ModelBuild`] if a total is negative or not finite,
    /// or if a period with a nonzero total has no hours.
    pub fn derive(totals: &UsageTotals, tariff: &Tariff) -> Result<Self> {
        let mut hourly_kwh = vec![0.0; HOURS];
        for period in TariffPeriod::ALL {
            let total = totals.for_period(period);
            if !total.is_finite() || total < 0.0 {
                return Err(PlanError::ModelBuild(format!(
                    "{} usage must be a non-negative number, got {total}",
                    period.label()
                )));
            }
            let slots = tariff.slots(period);
            if slots.is_empty() {
                if total > 0.0 {
                    return Err(PlanError::ModelBuild(format!(
                        "{} usage is {total} kWh but the period has no hours",
                        period.label()
                    )));
                }
                continue;
            }
            let per_hour = round_to(total / slots.len() as f64, 4);
            for hour in slots {
                hourly_kwh[hour - 1] = per_hour;
            }
        }
        Ok(Self { hourly_kwh })
    }

    /// Usage in model slot `hour` (1..=24).
    pub fn at(&self, hour: usize) -> f64 {
        self.hourly_kwh[hour - 1]
    }

    pub fn hourly(&self) -> &[f64] {
        &self.hourly_kwh
    }

    pub fn daily_total(&self) -> f64 {
        self.hourly_kwh.iter().sum()
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10_f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn default_profile_sums_to_daily_total() {
        let profile = UsageProfile::derive(&UsageTotals::default(), &Tariff::default())
            .expect("default usage derives");
        assert_eq!(profile.hourly().len(), 24);
        assert_abs_diff_eq!(profile.daily_total(), 1180.0, epsilon = 1e-3);
    }

    #[test]
    fn hourly_values_are_rounded_per_period() {
        let tariff = Tariff::default();
        let profile =
            UsageProfile::derive(&UsageTotals::default(), &tariff).expect("default usage derives");
        assert_eq!(profile.at(8), 83.3333);
        assert_eq!(profile.at(12), 50.0);
        assert_eq!(profile.at(1), 31.6667);
        assert_eq!(profile.at(24), 31.6667);
    }

    #[test]
    fn baseline_cost_matches_tariff() {
        let cost = UsageTotals::default().baseline_cost(&Tariff::default());
        assert_abs_diff_eq!(cost, 150.06, epsilon = 1e-9);
    }

    #[test]
    fn empty_period_with_usage_is_rejected() {
        let tariff = Tariff {
            mid_peak_hours: Vec::new(),
            on_peak_hours: (0..24).collect(),
            ..Tariff::default()
        };
        let err = UsageProfile::derive(&UsageTotals::default(), &tariff);
        assert!(matches!(err, Err(PlanError::ModelBuild(_))));
    }

    #[test]
    fn negative_total_is_rejected() {
        let totals = UsageTotals {
            off_peak_kwh: -1.0,
            ..UsageTotals::default()
        };
        let err = UsageProfile::derive(&totals, &Tariff::default());
        assert!(matches!(err, Err(PlanError::ModelBuild(_))));
    }
}
