// Primitives for reading CSV files.

use std::io;

use crate::dash::*;

/// Reads all the records of a CSV file as text, without interpreting any header.
///
/// Rows may have different lengths. Invalid UTF-8 is replaced rather than
/// rejected so that one bad cell does not drop the file.
pub fn read_csv_table(path: &str) -> DashResult<RawTable> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    read_records(rdr, path)
}

fn read_records<R: io::Read>(rdr: csv::Reader<R>, path: &str) -> DashResult<RawTable> {
    let mut records: Vec<Vec<String>> = Vec::new();
    for (idx, line_r) in rdr.into_byte_records().enumerate() {
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        let record: Vec<String> = line
            .iter()
            .map(|cell| String::from_utf8_lossy(cell).into_owned())
            .collect();
        records.push(record);
    }
    debug!("read_records: {:?}: {} records", path, records.len());
    Ok(RawTable::from_records(records))
}
