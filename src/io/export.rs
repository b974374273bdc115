//! CSV and JSON export for extracted plans.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::extract::Plan;

/// Column header of the per-hour schedule table.
const SCHEDULE_HEADER: &str = "month,hour,charge_flag,discharge_flag,charge_kwh,\
                               discharge_kwh,charged_kwh,discharged_kwh,grid_kwh,\
                               soc_kwh,usage_kwh,intensity";

/// Writes `Month,Cost` with one row per month.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_costs_csv(plan: &Plan, writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(["Month", "Cost"])?;
    for m in &plan.months {
        wtr.write_record(&[m.month.to_string(), format!("{:.4}", m.monthly_cost)])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes `Month,GHG` with one row per month.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_ghg_csv(plan: &Plan, writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(["Month", "GHG"])?;
    for m in &plan.months {
        wtr.write_record(&[m.month.to_string(), format!("{:.4}", m.monthly_ghg)])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes every (month, hour) decision as one row.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_schedule_csv(plan: &Plan, writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(SCHEDULE_HEADER.split(',').map(str::trim))?;
    for m in &plan.months {
        for h in &m.hours {
            wtr.write_record(&[
                m.month.to_string(),
                h.hour.to_string(),
                u8::from(h.charge_flag).to_string(),
                u8::from(h.discharge_flag).to_string(),
                format!("{:.4}", h.charge_kwh),
                format!("{:.4}", h.discharge_kwh),
                format!("{:.4}", h.charged_kwh),
                format!("{:.4}", h.discharged_kwh),
                format!("{:.4}", h.grid_kwh),
                format!("{:.4}", h.state_of_charge_kwh),
                format!("{:.4}", h.usage_kwh),
                format!("{:.4}", h.intensity),
            ])?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the whole plan as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_plan_json(plan: &Plan, mut writer: impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, plan)?;
    writeln!(writer)?;
    Ok(())
}

/// Paths written by [`export_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFiles {
    pub costs: PathBuf,
    pub ghg: PathBuf,
    pub schedule: PathBuf,
    pub plan_json: Option<PathBuf>,
}

/// Writes `costs.csv`, `ghg.csv`, `schedule.csv` and optionally `plan.json`
/// into `out_dir`, creating the directory if needed.
///
/// # Errors
///
/// Returns an error if the directory or any file cannot be written.
pub fn export_all(plan: &Plan, out_dir: &Path, with_json: bool) -> Result<ExportedFiles> {
    fs::create_dir_all(out_dir)?;
    let files = ExportedFiles {
        costs: out_dir.join("costs.csv"),
        ghg: out_dir.join("ghg.csv"),
        schedule: out_dir.join("schedule.csv"),
        plan_json: with_json.then(|| out_dir.join("plan.json")),
    };

    write_costs_csv(plan, create(&files.costs)?)?;
    write_ghg_csv(plan, create(&files.ghg)?)?;
    write_schedule_csv(plan, create(&files.schedule)?)?;
    if let Some(path) = &files.plan_json {
        write_plan_json(plan, create(path)?)?;
    }

    info!(dir = %out_dir.display(), json = with_json, "plan exported");
    Ok(files)
}

fn create(path: &Path) -> io::Result<io::BufWriter<File>> {
    File::create(path).map(io::BufWriter::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{HourlyDispatch, MonthlySchedule};

    fn make_hour(hour: usize) -> HourlyDispatch {
        HourlyDispatch {
            hour,
            charge_flag: hour == 2,
            discharge_flag: hour == 8,
            charge_kwh: if hour == 2 { 5.0 } else { 0.0 },
            discharge_kwh: if hour == 8 { 5.0 } else { 0.0 },
            charged_kwh: if hour == 2 { 5.0 } else { 0.0 },
            discharged_kwh: if hour == 8 { 5.0 } else { 0.0 },
            grid_kwh: 31.6667,
            state_of_charge_kwh: 2.7,
            usage_kwh: 31.6667,
            intensity: 55.5,
        }
    }

    fn make_plan() -> Plan {
        let months = (1..=12)
            .map(|month| MonthlySchedule {
                month,
                hours: (1..=24).map(make_hour).collect(),
                cost_on_peak: 100.0,
                cost_mid_peak: 30.0,
                cost_off_peak: 19.0 + month as f64 / 8.0,
                monthly_cost: 149.0 + month as f64 / 8.0,
                monthly_ghg: 1000.0 * month as f64,
                baseline_cost: 150.06,
            })
            .collect();
        Plan {
            months,
            objective_value: 42.0,
            baseline_cost: 150.06,
        }
    }

    fn lines(buf: &[u8]) -> Vec<String> {
        String::from_utf8(buf.to_vec())
            .unwrap_or_default()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn costs_table_holds_monthly_cost() {
        let mut buf = Vec::new();
        write_costs_csv(&make_plan(), &mut buf).ok();
        let lines = lines(&buf);
        assert_eq!(lines.len(), 13);
        assert_eq!(lines[0], "Month,Cost");
        assert_eq!(lines[1], "1,149.1250");
        assert_eq!(lines[12], "12,150.5000");
    }

    #[test]
    fn ghg_table_holds_monthly_ghg() {
        let mut buf = Vec::new();
        write_ghg_csv(&make_plan(), &mut buf).ok();
        let lines = lines(&buf);
        assert_eq!(lines[0], "Month,GHG");
        assert_eq!(lines[3], "3,3000.0000");
    }

    #[test]
    fn schedule_has_one_row_per_slot() {
        let mut buf = Vec::new();
        write_schedule_csv(&make_plan(), &mut buf).ok();
        let lines = lines(&buf);
        // 1 header + 12 * 24 rows
        assert_eq!(lines.len(), 289);
        assert!(lines[0].starts_with("month,hour,charge_flag"));
        assert_eq!(lines[2].split(',').nth(2), Some("1"));
    }

    #[test]
    fn deterministic_output() {
        let plan = make_plan();
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_schedule_csv(&plan, &mut buf1).ok();
        write_schedule_csv(&plan, &mut buf2).ok();
        assert_eq!(buf1, buf2);
    }

    #[test]
    fn schedule_round_trip_parseable() {
        let mut buf = Vec::new();
        write_schedule_csv(&make_plan(), &mut buf).ok();

        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let headers = rdr.headers().cloned().ok();
        assert_eq!(headers.as_ref().map(csv::StringRecord::len), Some(12));

        let mut row_count = 0;
        for record in rdr.records() {
            let rec = record.ok();
            assert!(rec.is_some(), "every row should parse");
            if let Some(rec) = rec {
                for i in 4..12 {
                    assert!(rec[i].parse::<f64>().is_ok(), "column {i} should parse as f64");
                }
            }
            row_count += 1;
        }
        assert_eq!(row_count, 288);
    }

    #[test]
    fn json_carries_months_and_objective() {
        let mut buf = Vec::new();
        write_plan_json(&make_plan(), &mut buf).ok();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap_or_default();
        assert_eq!(value["months"].as_array().map(Vec::len), Some(12));
        assert_eq!(value["objective_value"].as_f64(), Some(42.0));
    }

    #[test]
    fn export_all_writes_every_file() {
        let dir = std::env::temp_dir().join(format!("bess-plan-export-{}", std::process::id()));
        let files = export_all(&make_plan(), &dir, true).expect("export succeeds");
        assert!(files.costs.exists());
        assert!(files.ghg.exists());
        assert!(files.schedule.exists());
        assert!(files.plan_json.as_ref().is_some_and(|p| p.exists()));
        fs::remove_dir_all(&dir).ok();
    }
}
