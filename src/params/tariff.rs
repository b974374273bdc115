//! Time-of-use tariff: period hour sets and per-kWh rates.

use serde::{Deserialize, Serialize};

use crate::HOURS;

/// Tariff period a clock hour belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TariffPeriod {
    OnPeak,
    MidPeak,
    OffPeak,
}

impl TariffPeriod {
    pub const ALL: [Self; 3] = [Self::OnPeak, Self::MidPeak, Self::OffPeak];

    pub fn label(self) -> &'static str {
        match self {
            Self::OnPeak => "on-peak",
            Self::MidPeak => "mid-peak",
            Self::OffPeak => "off-peak",
        }
    }
}

/// Per-kWh rates and the clock hours (0..=23) of the on/mid-peak periods.
///
/// Every hour in neither set is off-peak. Model slot `hour` (1-based) covers
/// clock hour `hour - 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tariff {
    pub on_peak_rate: f64,
    pub mid_peak_rate: f64,
    pub off_peak_rate: f64,
    pub on_peak_hours: Vec<u32>,
    pub mid_peak_hours: Vec<u32>,
}

impl Default for Tariff {
    fn default() -> Self {
        Self {
            on_peak_rate: 0.17,
            mid_peak_rate: 0.113,
            off_peak_rate: 0.082,
            on_peak_hours: vec![7, 8, 9, 10, 17, 18],
            mid_peak_hours: vec![11, 12, 13, 14, 15, 16],
        }
    }
}

impl Tariff {
    /// Period of a model slot (`hour` in 1..=24).
    pub fn period_of_slot(&self, hour: usize) -> TariffPeriod {
        self.period_of_clock_hour(hour.saturating_sub(1) as u32)
    }

    pub fn period_of_clock_hour(&self, clock_hour: u32) -> TariffPeriod {
        if self.on_peak_hours.contains(&clock_hour) {
            TariffPeriod::OnPeak
        } else if self.mid_peak_hours.contains(&clock_hour) {
            TariffPeriod::MidPeak
        } else {
            TariffPeriod::OffPeak
        }
    }

    pub fn rate(&self, period: TariffPeriod) -> f64 {
        match period {
            TariffPeriod::OnPeak => self.on_peak_rate,
            TariffPeriod::MidPeak => self.mid_peak_rate,
            TariffPeriod::OffPeak => self.off_peak_rate,
        }
    }

    /// Model slots (1-based) belonging to `period`, ascending.
    pub fn slots(&self, period: TariffPeriod) -> Vec<usize> {
        (1..=HOURS)
            .filter(|&hour| self.period_of_slot(hour) == period)
            .collect()
    }

    /// Number of hours per day in `period`.
    pub fn hour_count(&self, period: TariffPeriod) -> usize {
        self.slots(period).len()
    }

    /// Describes the first structural problem with the hour sets, if any.
    pub fn hour_set_problem(&self) -> Option<String> {
        for (name, hours) in [
            ("on_peak_hours", &self.on_peak_hours),
            ("mid_peak_hours", &self.mid_peak_hours),
        ] {
            if let Some(bad) = hours.iter().find(|&&h| h >= HOURS as u32) {
                return Some(format!("{name} contains clock hour {bad}, expected 0..=23"));
            }
            let mut sorted = hours.clone();
            sorted.sort_unstable();
            sorted.dedup();
            if sorted.len() != hours.len() {
                return Some(format!("{name} lists an hour more than once"));
            }
        }
        if let Some(shared) = self
            .on_peak_hours
            .iter()
            .find(|h| self.mid_peak_hours.contains(h))
        {
            return Some(format!("clock hour {shared} is both on-peak and mid-peak"));
        }
        None
    }
}
