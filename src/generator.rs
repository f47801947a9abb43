//! # Generator Module
//!
//! Turns validated conversation answers into vehicle numbers of the form
//! `PREFIX + MID + SERIES + NNNN`, e.g. `AB12CD0001`.
//!
//! ## Features
//!
//! - Field parsers for the five answers (letters are uppercased)
//! - Lazy, restartable number sequences with an exact length
//! - Batch requests covering several series over the same range

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::errors::{FieldError, GenerationError};

/// Number of letters in the prefix and series fields
pub const LETTER_FIELD_LEN: usize = 2;
/// Number of digits in the middle field
pub const MID_DIGITS_LEN: usize = 2;
/// Number of digits typed for start/end, and the zero-padding width
pub const NUMBER_DIGITS_LEN: usize = 4;

lazy_static! {
    static ref SERIES_SEPARATOR: Regex =
        Regex::new(r"[,;\s]+").expect("Series separator pattern should be valid");
}

/// Parse a two-letter field (prefix or series), returning it uppercased
pub fn parse_letters(input: &str) -> Result<String, FieldError> {
    let trimmed = input.trim();
    if trimmed.chars().count() != LETTER_FIELD_LEN
        || !trimmed.chars().all(|c| c.is_ascii_alphabetic())
    {
        return Err(FieldError::Letters {
            expected: LETTER_FIELD_LEN,
        });
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// Parse the two-digit middle field, keeping leading zeros
pub fn parse_mid_digits(input: &str) -> Result<String, FieldError> {
    let trimmed = input.trim();
    if !is_digits(trimmed, MID_DIGITS_LEN) {
        return Err(FieldError::Digits {
            expected: MID_DIGITS_LEN,
        });
    }
    Ok(trimmed.to_string())
}

/// Parse a four-digit start or end number
pub fn parse_number(input: &str) -> Result<u32, FieldError> {
    let trimmed = input.trim();
    let invalid = FieldError::Digits {
        expected: NUMBER_DIGITS_LEN,
    };
    if !is_digits(trimmed, NUMBER_DIGITS_LEN) {
        return Err(invalid);
    }
    trimmed.parse().map_err(|_| invalid)
}

/// Parse a batch series list such as `cd, ef gh`.
///
/// Entries that are not two letters are dropped, duplicates keep their first
/// position. Fails when nothing valid remains or when more than `max` series
/// are left.
pub fn parse_series_list(input: &str, max: usize) -> Result<Vec<String>, FieldError> {
    let mut series: Vec<String> = Vec::new();
    for token in SERIES_SEPARATOR.split(input.trim()) {
        if let Ok(code) = parse_letters(token) {
            if !series.contains(&code) {
                series.push(code);
            }
        }
    }

    if series.is_empty() {
        return Err(FieldError::NoSeries);
    }
    if series.len() > max {
        return Err(FieldError::TooManySeries {
            count: series.len(),
            max,
        });
    }
    Ok(series)
}

fn is_digits(text: &str, len: usize) -> bool {
    text.len() == len && text.bytes().all(|b| b.is_ascii_digit())
}

fn plate_stem(prefix: &str, mid: &str, series: &str) -> String {
    format!("{prefix}{mid}{series}")
}

/// Format one vehicle number: the stem followed by `n` zero-padded to four digits
pub fn format_plate(stem: &str, n: u32) -> String {
    format!("{stem}{n:0width$}", width = NUMBER_DIGITS_LEN)
}

/// The five validated answers for a single series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    prefix: String,
    mid: String,
    series: String,
    start: u32,
    end: u32,
}

impl GenerationRequest {
    /// Validate and normalize the five fields.
    ///
    /// Letters are uppercased. Fails with [`GenerationError::Range`] when
    /// `start > end`.
    pub fn new(
        prefix: &str,
        mid: &str,
        series: &str,
        start: u32,
        end: u32,
    ) -> Result<Self, GenerationError> {
        let prefix = parse_letters(prefix)?;
        let mid = parse_mid_digits(mid)?;
        let series = parse_letters(series)?;
        if start > end {
            return Err(GenerationError::Range { start, end });
        }
        Ok(Self {
            prefix,
            mid,
            series,
            start,
            end,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn mid(&self) -> &str {
        &self.mid
    }

    pub fn series(&self) -> &str {
        &self.series
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// Number of values produced, `end - start + 1`
    pub fn total(&self) -> usize {
        (self.end - self.start) as usize + 1
    }

    /// Display pattern such as `AB12CD####`
    pub fn pattern(&self) -> String {
        format!(
            "{}{}{}{}",
            self.prefix(),
            self.mid(),
            self.series(),
            "#".repeat(NUMBER_DIGITS_LEN)
        )
    }

    /// Suggested name for the delivered file
    pub fn file_name(&self) -> String {
        format!("vehicle_numbers_{}{}{}.txt", self.prefix, self.mid, self.series)
    }

    /// A fresh sequence over the whole range. Can be called any number of times.
    pub fn numbers(&self) -> PlateNumbers {
        PlateNumbers {
            stem: plate_stem(&self.prefix, &self.mid, &self.series),
            numbers: self.start..=self.end,
        }
    }
}

/// Ordered, finite sequence of formatted vehicle numbers
#[derive(Debug, Clone)]
pub struct PlateNumbers {
    stem: String,
    numbers: RangeInclusive<u32>,
}

impl Iterator for PlateNumbers {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.numbers.next().map(|n| format_plate(&self.stem, n))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.numbers.size_hint()
    }
}

impl ExactSizeIterator for PlateNumbers {}

/// Validate the fields and return the sequence for a single series
pub fn generate(
    prefix: &str,
    mid: &str,
    series: &str,
    start: u32,
    end: u32,
) -> Result<PlateNumbers, GenerationError> {
    GenerationRequest::new(prefix, mid, series, start, end).map(|request| request.numbers())
}

/// Validate the fields and return the concatenated sequences of every series
pub fn generate_batch(
    prefix: &str,
    mid: &str,
    series: &[String],
    start: u32,
    end: u32,
) -> Result<Vec<String>, GenerationError> {
    BatchRequest::new(prefix, mid, series, start, end).map(|batch| batch.numbers().collect())
}

/// Several series sharing prefix, middle digits and range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    prefix: String,
    mid: String,
    series: Vec<String>,
    start: u32,
    end: u32,
}

impl BatchRequest {
    pub fn new(
        prefix: &str,
        mid: &str,
        series: &[String],
        start: u32,
        end: u32,
    ) -> Result<Self, GenerationError> {
        let prefix = parse_letters(prefix)?;
        let mid = parse_mid_digits(mid)?;
        if series.is_empty() {
            return Err(FieldError::NoSeries.into());
        }
        let series = series
            .iter()
            .map(|s| parse_letters(s))
            .collect::<Result<Vec<_>, _>>()?;
        if start > end {
            return Err(GenerationError::Range { start, end });
        }
        Ok(Self {
            prefix,
            mid,
            series,
            start,
            end,
        })
    }

    /// One single-series request per series, in input order
    pub fn requests(&self) -> impl Iterator<Item = GenerationRequest> + '_ {
        self.series.iter().map(move |series| GenerationRequest {
            prefix: self.prefix.clone(),
            mid: self.mid.clone(),
            series: series.clone(),
            start: self.start,
            end: self.end,
        })
    }

    /// All numbers, series by series
    pub fn numbers(&self) -> impl Iterator<Item = String> + '_ {
        self.requests().flat_map(|request| request.numbers())
    }

    pub fn series(&self) -> &[String] {
        &self.series
    }

    pub fn per_series(&self) -> usize {
        (self.end - self.start) as usize + 1
    }

    pub fn total(&self) -> usize {
        self.per_series() * self.series.len()
    }

    pub fn pattern(&self) -> String {
        format!(
            "{}{}[SERIES]{}",
            self.prefix,
            self.mid,
            "#".repeat(NUMBER_DIGITS_LEN)
        )
    }

    pub fn file_name(&self) -> String {
        format!("vehicle_numbers_batch_{}{}.txt", self.prefix, self.mid)
    }
}

/// Which flavour of conversation collected the answers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Single,
    Batch,
}

/// A complete, validated job ready to be generated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationJob {
    Single(GenerationRequest),
    Batch(BatchRequest),
}

impl GenerationJob {
    /// Assemble a job from collected answers
    pub fn build(
        mode: Mode,
        prefix: &str,
        mid: &str,
        series: &[String],
        start: u32,
        end: u32,
    ) -> Result<Self, GenerationError> {
        match mode {
            Mode::Single => {
                let series = series.first().ok_or(FieldError::NoSeries)?;
                GenerationRequest::new(prefix, mid, series, start, end).map(GenerationJob::Single)
            }
            Mode::Batch => BatchRequest::new(prefix, mid, series, start, end).map(GenerationJob::Batch),
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            GenerationJob::Single(_) => Mode::Single,
            GenerationJob::Batch(_) => Mode::Batch,
        }
    }

    pub fn numbers(&self) -> Box<dyn Iterator<Item = String> + '_> {
        match self {
            GenerationJob::Single(request) => Box::new(request.numbers()),
            GenerationJob::Batch(batch) => Box::new(batch.numbers()),
        }
    }

    pub fn total(&self) -> usize {
        match self {
            GenerationJob::Single(request) => request.total(),
            GenerationJob::Batch(batch) => batch.total(),
        }
    }

    pub fn series(&self) -> &[String] {
        match self {
            GenerationJob::Single(request) => std::slice::from_ref(&request.series),
            GenerationJob::Batch(batch) => batch.series(),
        }
    }

    pub fn start(&self) -> u32 {
        match self {
            GenerationJob::Single(request) => request.start,
            GenerationJob::Batch(batch) => batch.start,
        }
    }

    pub fn end(&self) -> u32 {
        match self {
            GenerationJob::Single(request) => request.end,
            GenerationJob::Batch(batch) => batch.end,
        }
    }

    /// First and last number of the job, without generating the rest
    pub fn first_and_last(&self) -> (String, String) {
        let (prefix, mid, first_series, last_series) = match self {
            GenerationJob::Single(request) => (
                request.prefix(),
                request.mid(),
                request.series(),
                request.series(),
            ),
            GenerationJob::Batch(batch) => {
                let first = batch.series.first();
                let last = batch.series.last();
                match (first, last) {
                    (Some(first), Some(last)) => (
                        batch.prefix.as_str(),
                        batch.mid.as_str(),
                        first.as_str(),
                        last.as_str(),
                    ),
                    _ => return (String::new(), String::new()),
                }
            }
        };
        (
            format_plate(&plate_stem(prefix, mid, first_series), self.start()),
            format_plate(&plate_stem(prefix, mid, last_series), self.end()),
        )
    }

    pub fn pattern(&self) -> String {
        match self {
            GenerationJob::Single(request) => request.pattern(),
            GenerationJob::Batch(batch) => batch.pattern(),
        }
    }

    pub fn file_name(&self) -> String {
        match self {
            GenerationJob::Single(request) => request.file_name(),
            GenerationJob::Batch(batch) => batch.file_name(),
        }
    }
}
