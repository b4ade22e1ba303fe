use chrono::NaiveDate;

use crate::error::{LottoError, Result};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y%m%d"];

/// Accepts `2022-11-22` and `20221122`.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| LottoError::validation("date", input, "expected YYYY-MM-DD or YYYYMMDD"))
}

/// Parses the `draw_date` field of the open-data feeds, e.g. `2022-11-22T00:00:00.000`.
pub fn parse_draw_date(input: &str) -> Result<NaiveDate> {
    let day = input.get(..10).unwrap_or(input);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| LottoError::fetch(format!("bad draw_date {:?}: {}", input, e)))
}

/// Splits numbers on whitespace and commas, so both `6 11 13 28 47 25` and
/// `6,11,13,28,47,25` are accepted.
pub fn parse_numbers<S: AsRef<str>>(parts: &[S]) -> Result<Vec<u32>> {
    let mut numbers = Vec::new();
    for part in parts {
        for token in part
            .as_ref()
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
        {
            let number = token.parse::<u32>().map_err(|_| {
                LottoError::validation("number", token, "not a non-negative integer")
            })?;
            numbers.push(number);
        }
    }
    Ok(numbers)
}

pub fn format_numbers(numbers: &[u32]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
