use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::{Writer, WriterBuilder};
use tracing::debug;

use crate::error::ExtractError;
use crate::materialize::{TableMap, TableRecords};

fn write_records<W: Write>(
    writer: &mut Writer<W>,
    records: &TableRecords,
) -> Result<(), ExtractError> {
    writer.write_record(&records.headers)?;
    for row in &records.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_table_csv(
    path: &Path,
    records: &TableRecords,
    delimiter: u8,
) -> Result<(), ExtractError> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_path(path)?;
    write_records(&mut writer, records)
}

pub fn write_table_csv_to_string(
    records: &TableRecords,
    delimiter: u8,
) -> Result<String, ExtractError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::<u8>::new());
    write_records(&mut writer, records)?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ExtractError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|error| ExtractError::InvalidOption(format!("invalid utf-8 csv output: {error}")))
}

/// Writes one `<key>.csv` per table into `dir`, creating it if needed.
/// Returns the written paths in table order.
pub fn write_tables_to_dir(
    dir: &Path,
    tables: &TableMap,
    delimiter: u8,
) -> Result<Vec<PathBuf>, ExtractError> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(tables.len());
    for records in tables {
        let path = dir.join(format!("{}.csv", records.key));
        write_table_csv(&path, records, delimiter)?;
        debug!(path = %path.display(), rows = records.len(), "wrote table csv");
        written.push(path);
    }
    Ok(written)
}
