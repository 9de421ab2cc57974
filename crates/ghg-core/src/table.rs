//! CSV table output
//!
//! Records are written with the header
//! `Company Name,Year,Location,Carbon Emission`; unknown fields are empty.

use std::io;
use std::path::Path;

use crate::{EmissionRecord, GhgError, Result};

/// Write records to any writer as CSV with a header row
pub fn write_records<W: io::Write>(writer: W, records: &[EmissionRecord]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer
            .serialize(record)
            .map_err(|e| GhgError::ExportError(e.to_string()))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Read records from any CSV reader with a header row
pub fn read_records<R: io::Read>(reader: R) -> Result<Vec<EmissionRecord>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    csv_reader
        .deserialize()
        .map(|row| row.map_err(|e| GhgError::ExportError(e.to_string())))
        .collect()
}

/// Write records to a CSV file, replacing any existing file
pub fn write_csv(path: impl AsRef<Path>, records: &[EmissionRecord]) -> Result<()> {
    let file = std::fs::File::create(path.as_ref())?;
    write_records(file, records)
}

/// Read records from a CSV file
pub fn read_csv(path: impl AsRef<Path>) -> Result<Vec<EmissionRecord>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .map_err(|e| GhgError::NotFound(format!("{}: {e}", path.display())))?;
    read_records(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_and_empty_fields() {
        let records = vec![
            EmissionRecord::new("GreenTech Ltd")
                .with_year("2019")
                .with_location("Mumbai")
                .with_emission("5 tonnes"),
            EmissionRecord::new("Acme Corp").with_year("2021"),
        ];

        let mut buf = Vec::new();
        write_records(&mut buf, &records).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Company Name,Year,Location,Carbon Emission")
        );
        assert_eq!(lines.next(), Some("GreenTech Ltd,2019,Mumbai,5 tonnes"));
        assert_eq!(lines.next(), Some("Acme Corp,2021,,"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_file_roundtrip_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleaned_data.csv");

        let records = vec![
            EmissionRecord::new("Tata Steel Ltd").with_location("Jamshedpur, India"),
            EmissionRecord::new("GreenTech Ltd").with_emission("12.5 MtCO2e"),
        ];
        write_csv(&path, &records).unwrap();

        assert_eq!(read_csv(&path).unwrap(), records);
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_csv("/nonexistent/cleaned_data.csv").unwrap_err();
        assert!(matches!(err, GhgError::NotFound(_)));
    }
}
