//! # TXT to CSV Converter Module
//!
//! Converts text files of `VEHICLE - PHONE` lines (an optional third
//! ` - ` part is ignored) into a two-column CSV with the phone number first.

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::Path;

use crate::errors::ConversionError;

/// Header row of every converted file
pub const CSV_HEADER: [&str; 2] = ["Number", "Vehicle Number"];
/// Separator between the parts of a source line
pub const RECORD_SEPARATOR: &str = " - ";
/// Upload extension accepted by the converter
pub const TEXT_EXTENSION: &str = ".txt";
/// Extension of converted files
pub const CSV_EXTENSION: &str = ".csv";

const INVALID_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Split a source line into `(vehicle, phone)`.
///
/// Returns `None` for lines without the separator or with an empty part.
pub fn parse_record(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.trim().splitn(3, RECORD_SEPARATOR);
    let vehicle = parts.next()?.trim();
    let phone = parts.next()?.trim();
    if vehicle.is_empty() || phone.is_empty() {
        return None;
    }
    Some((vehicle, phone))
}

/// Convert text lines to CSV rows, returning the number of records written
pub fn convert_txt_to_csv<R: BufRead, W: Write>(
    reader: R,
    writer: W,
) -> Result<usize, ConversionError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;

    let mut saw_line = false;
    let mut records = 0;
    for line in reader.lines() {
        let line = line.map_err(|e| match e.kind() {
            ErrorKind::InvalidData => ConversionError::InvalidEncoding,
            _ => ConversionError::Io(e),
        })?;
        saw_line = true;
        if let Some((vehicle, phone)) = parse_record(&line) {
            csv_writer.write_record([phone, vehicle])?;
            records += 1;
        }
    }
    csv_writer.flush()?;

    if !saw_line {
        return Err(ConversionError::EmptyInput);
    }
    if records == 0 {
        return Err(ConversionError::NoRecords);
    }
    Ok(records)
}

/// Convert `source` into `destination`, overwriting it
pub fn convert_file(source: &Path, destination: &Path) -> Result<usize, ConversionError> {
    let reader = BufReader::new(File::open(source)?);
    let writer = File::create(destination)?;
    convert_txt_to_csv(reader, writer)
}

fn strip_extension<'a>(name: &'a str, extension: &str) -> Option<&'a str> {
    let split = name.len().checked_sub(extension.len())?;
    let tail = name.get(split..)?;
    if tail.eq_ignore_ascii_case(extension) {
        name.get(..split)
    } else {
        None
    }
}

/// Whether an uploaded file name looks like a text file
pub fn is_text_upload(file_name: &str) -> bool {
    strip_extension(file_name, TEXT_EXTENSION).is_some()
}

/// Default CSV name for an upload, `numbers.txt` becomes `numbers.csv`
pub fn default_csv_name(upload_name: &str) -> String {
    let stem = strip_extension(upload_name, TEXT_EXTENSION).unwrap_or(upload_name);
    format!("{stem}{CSV_EXTENSION}")
}

/// Clean a user-typed file name, or `None` when nothing usable is left
pub fn sanitize_csv_name(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut name: String = trimmed
        .chars()
        .map(|c| if INVALID_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect();
    if strip_extension(&name, CSV_EXTENSION).is_none() {
        name.push_str(CSV_EXTENSION);
    }
    Some(name)
}
