//! CSV reader and writer for consumption / PV profiles.
//!
//! Columns: `time` (optional, `%Y-%m-%d %H:%M[:%S]`), `consumption_kwh`
//! and `pv_kwh_per_mwp`. An empty PV cell is read as NaN and ends up as
//! zero production.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::info;

use crate::sim::error::ProfileError;
use crate::sim::profile::ProfileSeries;

const TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];
const TIME_FORMAT_OUT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize)]
struct ProfileRow {
    #[serde(default)]
    time: Option<String>,
    consumption_kwh: f64,
    #[serde(default)]
    pv_kwh_per_mwp: Option<f64>,
}

fn parse_time(raw: &str, row: usize) -> Result<NaiveDateTime, ProfileError> {
    let raw = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| ProfileError::Csv {
            row,
            message: format!("cannot parse time \"{raw}\""),
        })
}

/// Reads a profile from a CSV file.
///
/// # Errors
///
/// Returns [`ProfileError::Io`] if the file cannot be opened, otherwise the
/// errors of [`parse_profile_csv`].
pub fn read_profile_csv(path: &Path) -> Result<ProfileSeries, ProfileError> {
    let file = File::open(path).map_err(|source| ProfileError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let profile = parse_profile_csv(io::BufReader::new(file))?;
    info!(
        path = %path.display(),
        samples = profile.len(),
        timestamps = profile.timestamps().is_some(),
        "profile loaded"
    );
    Ok(profile)
}

/// Parses a profile from CSV text with a header row.
///
/// Timestamps are attached only when every row has one.
///
/// # Errors
///
/// Returns [`ProfileError::Csv`] with the 1-based data row for malformed
/// rows, or any validation error of [`ProfileSeries::new`].
pub fn parse_profile_csv(reader: impl Read) -> Result<ProfileSeries, ProfileError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut consumption = Vec::new();
    let mut pv = Vec::new();
    let mut times = Vec::new();
    let mut missing_time = false;

    for (i, result) in rdr.deserialize::<ProfileRow>().enumerate() {
        let row = i + 1;
        let record = result.map_err(|e| ProfileError::Csv {
            row,
            message: e.to_string(),
        })?;

        consumption.push(record.consumption_kwh);
        pv.push(record.pv_kwh_per_mwp.unwrap_or(f64::NAN));
        match record.time.as_deref().filter(|t| !t.is_empty()) {
            Some(raw) => times.push(parse_time(raw, row)?),
            None => missing_time = true,
        }
    }

    let profile = ProfileSeries::new(consumption, pv)?;
    if missing_time {
        if !times.is_empty() {
            return Err(ProfileError::Csv {
                row: times.len() + 1,
                message: "time column is only partly filled".to_string(),
            });
        }
        Ok(profile)
    } else {
        profile.with_timestamps(times)
    }
}

/// Writes a profile in the format read by [`parse_profile_csv`].
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_profile_csv(profile: &ProfileSeries, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    let timestamps = profile.timestamps();

    if timestamps.is_some() {
        wtr.write_record(["time", "consumption_kwh", "pv_kwh_per_mwp"])?;
    } else {
        wtr.write_record(["consumption_kwh", "pv_kwh_per_mwp"])?;
    }

    for (i, (c, p)) in profile
        .consumption_kwh()
        .iter()
        .zip(profile.pv_kwh_per_mwp())
        .enumerate()
    {
        let c = c.to_string();
        let p = p.to_string();
        match timestamps {
            Some(ts) => {
                let t = ts[i].format(TIME_FORMAT_OUT).to_string();
                wtr.write_record([t.as_str(), c.as_str(), p.as_str()])?;
            }
            None => wtr.write_record([c.as_str(), p.as_str()])?,
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;

    use super::*;

    #[test]
    fn reads_series_without_time() {
        let data = "consumption_kwh,pv_kwh_per_mwp\n10,0\n12.5,3\n";
        let p = parse_profile_csv(data.as_bytes());
        assert!(p.is_ok(), "{:?}", p.err());
        let p = p.ok();
        assert_eq!(p.as_ref().map(|p| p.consumption_kwh().to_vec()), Some(vec![10.0, 12.5]));
        assert_eq!(p.as_ref().map(|p| p.timestamps().is_none()), Some(true));
    }

    #[test]
    fn empty_pv_cell_becomes_zero() {
        let data = "consumption_kwh,pv_kwh_per_mwp\n10,\n11,4\n";
        let p = parse_profile_csv(data.as_bytes()).ok();
        assert_eq!(p.map(|p| p.pv_kwh_per_mwp().to_vec()), Some(vec![0.0, 4.0]));
    }

    #[test]
    fn reads_both_time_formats() {
        let data = "time,consumption_kwh,pv_kwh_per_mwp\n\
                    2024-03-01 00:00,1,0\n\
                    2024-03-01 00:15:00,1,0\n";
        let p = parse_profile_csv(data.as_bytes());
        assert!(p.is_ok(), "{:?}", p.err());
        let ts = p.ok().and_then(|p| p.timestamps().map(<[_]>::to_vec)).unwrap_or_default();
        assert_eq!(ts.len(), 2);
        assert_eq!(ts[1].minute(), 15);
    }

    #[test]
    fn bad_number_reports_row() {
        let data = "consumption_kwh,pv_kwh_per_mwp\n1,0\nabc,0\n";
        let err = parse_profile_csv(data.as_bytes());
        assert!(matches!(err, Err(ProfileError::Csv { row: 2, .. })));
    }

    #[test]
    fn bad_time_reports_row() {
        let data = "time,consumption_kwh,pv_kwh_per_mwp\n01/03/2024,1,0\n";
        let err = parse_profile_csv(data.as_bytes());
        assert!(matches!(err, Err(ProfileError::Csv { row: 1, .. })));
    }

    #[test]
    fn partial_time_column_is_rejected() {
        let data = "time,consumption_kwh,pv_kwh_per_mwp\n2024-03-01 00:00,1,0\n,1,0\n";
        let err = parse_profile_csv(data.as_bytes());
        assert!(matches!(err, Err(ProfileError::Csv { .. })));
    }

    #[test]
    fn header_only_is_empty() {
        let data = "consumption_kwh,pv_kwh_per_mwp\n";
        assert!(matches!(
            parse_profile_csv(data.as_bytes()),
            Err(ProfileError::Empty)
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_profile_csv(Path::new("/nonexistent/profile.csv"));
        assert!(matches!(err, Err(ProfileError::Io { .. })));
    }

    #[test]
    fn written_profile_reads_back() {
        let data = "time,consumption_kwh,pv_kwh_per_mwp\n\
                    2024-03-01 00:00:00,1.25,0\n\
                    2024-03-01 00:15:00,2,7.5\n";
        let original = parse_profile_csv(data.as_bytes()).ok();
        assert!(original.is_some());

        let mut buf = Vec::new();
        if let Some(p) = &original {
            write_profile_csv(p, &mut buf).ok();
        }
        let back = parse_profile_csv(buf.as_slice()).ok();
        assert_eq!(back, original);
    }
}
