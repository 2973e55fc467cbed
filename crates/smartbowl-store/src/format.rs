//! CSV serialization of samples.
//!
//! The output format is consumed by existing dashboards and must stay stable:
//!
//! ```text
//! time,amount,consumed,added,refills
//! 2017-06-01T12:00:00Z,48.00,2.00,0.00,0
//! ```
//!
//! - The instant is ISO-8601 UTC with second precision.
//! - Amounts always carry exactly two decimal digits. The shortest decimal
//!   representation of the value is rounded half-up (away from zero), so
//!   `1.005` becomes `1.01`. Non-finite values render as `NaN`, `Infinity`
//!   and `-Infinity`.
//! - The refill count is a plain integer.
//! - Every line, including the last, ends with `\n`.

use smartbowl_types::Sample;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::error::{Error, Result};

/// Column names of the CSV header row.
pub const CSV_HEADER: [&str; 5] = ["time", "amount", "consumed", "added", "refills"];

const INSTANT_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");

/// Format an instant as second-precision ISO-8601 UTC, e.g. `2017-06-01T12:00:00Z`.
pub fn format_instant(instant: OffsetDateTime) -> String {
    let utc = instant.to_offset(time::UtcOffset::UTC);
    utc.format(INSTANT_FORMAT)
        .unwrap_or_else(|_| utc.unix_timestamp().to_string())
}

/// Format an amount with exactly two decimal digits, rounding half-up.
///
/// # Examples
///
/// ```
/// use smartbowl_store::format::format_amount;
///
/// assert_eq!(format_amount(1.005), "1.01");
/// assert_eq!(format_amount(2.0), "2.00");
/// assert_eq!(format_amount(-0.125), "-0.13");
/// ```
pub fn format_amount(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    // Display for f64 yields the shortest round-trip digits and never an exponent.
    let repr = value.abs().to_string();
    let (int_part, frac_part) = repr.split_once('.').unwrap_or((repr.as_str(), ""));

    let mut digits: Vec<u8> = int_part.bytes().map(|b| b - b'0').collect();
    let mut frac = frac_part.bytes().map(|b| b - b'0');
    digits.push(frac.next().unwrap_or(0));
    digits.push(frac.next().unwrap_or(0));

    if frac.next().unwrap_or(0) >= 5 {
        round_up(&mut digits);
    }

    let split = digits.len() - 2;
    let mut out = String::with_capacity(digits.len() + 2);
    if value.is_sign_negative() {
        out.push('-');
    }
    out.extend(digits[..split].iter().map(|d| char::from(b'0' + d)));
    out.push('.');
    out.extend(digits[split..].iter().map(|d| char::from(b'0' + d)));
    out
}

/// Add one unit in the last place of a big-endian decimal digit string.
fn round_up(digits: &mut Vec<u8>) {
    for digit in digits.iter_mut().rev() {
        if *digit == 9 {
            *digit = 0;
        } else {
            *digit += 1;
            return;
        }
    }
    digits.insert(0, 1);
}

/// Render one sample as the five CSV fields.
pub fn csv_row(sample: &Sample) -> [String; 5] {
    [
        format_instant(sample.timestamp()),
        format_amount(sample.amount_remaining()),
        format_amount(sample.amount_consumed()),
        format_amount(sample.amount_added()),
        sample.refill_count().to_string(),
    ]
}

/// Render the header row followed by one row per sample.
pub fn write_csv(samples: &[Sample]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::with_capacity(64 * (samples.len() + 1)));

    writer.write_record(CSV_HEADER)?;
    for sample in samples {
        writer.write_record(csv_row(sample))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::CsvBuffer(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| Error::CsvBuffer(e.to_string()))
}
