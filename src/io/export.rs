//! CSV export of the per-step flow table.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::FlowRecord;

/// Column header for the flow table export.
const HEADER: &str = "timestep,consumption,pv_production,pv_consumption,grid_consumption,\
                      gen_consumption,batt_consumption,gen_battery,pv_battery,grid_battery,\
                      pv_curtailment,pv_grid,pv_balance,green_batt_consumption,\
                      grey_batt_consumption,blue_batt_consumption,gen_production,batt_flow,\
                      batt_inflow,batt_outflow,battery_soc,grid_interface,grid_inflow,\
                      grid_outflow,shortage_consumption,grid_curtailment,grid_charging,\
                      generators_active";

/// Exports the flow table to a CSV file at the given path.
///
/// Writes a header row followed by one data row per step. Produces
/// deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(records: &[FlowRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(records, buf)
}

/// Writes the flow table as CSV to any writer.
///
/// Powers use four decimals; `generators_active` is the number of units
/// running during the step.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(records: &[FlowRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in records {
        let powers = [
            r.consumption,
            r.pv_production,
            r.pv_consumption,
            r.grid_consumption,
            r.gen_consumption,
            r.batt_consumption,
            r.gen_battery,
            r.pv_battery,
            r.grid_battery,
            r.pv_curtailment,
            r.pv_grid,
            r.pv_balance,
            r.green_batt_consumption,
            r.grey_batt_consumption,
            r.blue_batt_consumption,
            r.gen_production,
            r.batt_flow,
            r.batt_inflow,
            r.batt_outflow,
            r.battery_soc,
            r.grid_interface,
            r.grid_inflow,
            r.grid_outflow,
            r.shortage_consumption,
            r.grid_curtailment,
        ];

        let mut row = Vec::with_capacity(powers.len() + 3);
        row.push(r.timestep.to_string());
        row.extend(powers.iter().map(|v| format!("{v:.4}")));
        row.push(r.grid_charging.to_string());
        row.push(r.active_generators().to_string());
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::types::fixtures::empty_record;

    fn make_record(t: usize) -> FlowRecord {
        let mut r = empty_record(t);
        r.consumption = 400.0;
        r.pv_production = -120.5;
        r.pv_consumption = 120.5;
        r.grid_consumption = 279.5;
        r.grid_interface = 279.5;
        r.grid_outflow = -279.5;
        r.battery_soc = 250.0;
        r.generator_active = [true, true, false];
        r
    }

    fn to_string(records: &[FlowRecord]) -> String {
        let mut buf = Vec::new();
        write_csv(records, &mut buf).ok();
        String::from_utf8(buf).unwrap_or_default()
    }

    #[test]
    fn header_lists_every_column() {
        let output = to_string(&[make_record(0)]);
        let first_line = output.lines().next().unwrap_or("");
        assert!(first_line.starts_with("timestep,consumption,pv_production,"));
        assert!(first_line.ends_with(",grid_charging,generators_active"));
        assert_eq!(first_line.split(',').count(), 28);
    }

    #[test]
    fn row_count_matches_step_count() {
        let records: Vec<FlowRecord> = (0..24).map(make_record).collect();
        let output = to_string(&records);
        // 1 header + 24 data rows
        assert_eq!(output.lines().count(), 25);
    }

    #[test]
    fn values_use_four_decimals() {
        let output = to_string(&[make_record(3)]);
        let row = output.lines().nth(1).unwrap_or("");
        assert!(row.starts_with("3,400.0000,-120.5000,120.5000,279.5000,"));
        assert!(row.ends_with(",false,2"));
    }

    #[test]
    fn deterministic_output() {
        let records: Vec<FlowRecord> = (0..5).map(make_record).collect();
        assert_eq!(to_string(&records), to_string(&records));
    }

    #[test]
    fn output_is_parseable() {
        let records: Vec<FlowRecord> = (0..3).map(make_record).collect();
        let output = to_string(&records);

        let mut rdr = csv::ReaderBuilder::new().from_reader(output.as_bytes());
        let headers = rdr.headers().cloned().ok();
        assert_eq!(headers.as_ref().map(csv::StringRecord::len), Some(28));

        let mut row_count = 0;
        for record in rdr.records() {
            let rec = record.ok();
            assert!(rec.is_some(), "every row should parse");
            let rec = rec.unwrap_or_default();
            for i in 1..26 {
                let val: Result<f64, _> = rec[i].parse();
                assert!(val.is_ok(), "column {i} should parse as f64");
            }
            assert!(rec[26].parse::<bool>().is_ok());
            assert!(rec[27].parse::<usize>().is_ok());
            row_count += 1;
        }
        assert_eq!(row_count, 3);
    }
}
