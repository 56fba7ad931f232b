//! CSV output
//!
//! Reads and writes measurement tables with the columns
//! `suite,benchmark,kernel,time`.

use crate::error::{MeasureError, Result};
use kerntime_shared::types::record::MeasurementRecord;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Write `records` to `output_path`.
///
/// The table is written next to the target and renamed into place, so a
/// reader never observes a half-written cache entry.
pub fn write_records(records: &[MeasurementRecord], output_path: &Path) -> Result<()> {
    debug!("Writing {} records to {}", records.len(), output_path.display());

    let tmp_path = tmp_path(output_path);
    let file = File::create(&tmp_path).map_err(|e| MeasureError::io(&tmp_path, e))?;

    let mut writer = csv::Writer::from_writer(BufWriter::new(file));
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush().map_err(|e| MeasureError::io(&tmp_path, e))?;
    drop(writer);

    std::fs::rename(&tmp_path, output_path).map_err(|e| MeasureError::io(output_path, e))?;

    info!("Wrote {} records to {}", records.len(), output_path.display());
    Ok(())
}

/// Read a table previously written by [`write_records`]
pub fn read_records(input_path: &Path) -> Result<Vec<MeasurementRecord>> {
    let file = File::open(input_path).map_err(|e| MeasureError::io(input_path, e))?;
    let mut reader = csv::Reader::from_reader(std::io::BufReader::new(file));

    let records = reader
        .deserialize()
        .collect::<std::result::Result<Vec<MeasurementRecord>, _>>()?;

    debug!("Read {} records from {}", records.len(), input_path.display());
    Ok(records)
}

/// Write records as CSV to any writer (used for stdout)
pub fn write_records_to<W: std::io::Write>(records: &[MeasurementRecord], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .flush()
        .map_err(|e| MeasureError::io("<stream>", e))?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let records = vec![
            MeasurementRecord::new("cuda", "bfs", "Kernel_0", 12.5),
            MeasurementRecord::new("cuda", "bfs", "Kernel2(with, commas)", 4.0),
        ];

        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("measurements.csv");

        write_records(&records, &path).unwrap();
        assert!(path.exists());
        assert!(!temp_dir.path().join("measurements.csv.tmp").exists());

        assert_eq!(read_records(&path).unwrap(), records);
    }

    #[test]
    fn test_column_names() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("out.csv");

        write_records(&[MeasurementRecord::new("julia", "nw", "k", 1.0)], &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().next(), Some("suite,benchmark,kernel,time"));
    }

    #[test]
    fn test_read_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = read_records(&temp_dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(err, MeasureError::Io { .. }));
    }

    #[test]
    fn test_write_to_stream() {
        let mut out = Vec::new();
        write_records_to(&[MeasurementRecord::new("a", "b", "c", 2.5)], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "suite,benchmark,kernel,time\na,b,c,2.5\n");
    }
}
