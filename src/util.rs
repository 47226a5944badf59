// Parsing and formatting helpers shared by the decoder, the delta
// calculator and the report builders.
//
// Every ad hoc "strip the %, parse, default to zero" step goes through
// `Percent` so the rest of the code never touches raw percentage text.
use chrono::{DateTime, SecondsFormat, Utc};
use num_format::{Locale, ToFormattedString};
use serde::Serializer;
use std::fmt;

/// A percentage value with a fixed two-decimal rendering (`"85.50%"`).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Percent(pub f64);

impl Percent {
    pub const ZERO: Percent = Percent(0.0);

    /// Lenient parse: drops every `%`, trims, and falls back to zero for
    /// empty, unparseable or non-finite input.
    pub fn parse(s: &str) -> Percent {
        let cleaned = s.replace('%', "");
        let v = cleaned.trim().parse::<f64>().unwrap_or(0.0);
        if v.is_finite() {
            Percent(v)
        } else {
            Percent::ZERO
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// The value as it reads once rendered, i.e. rounded to two decimals.
    pub fn rounded(self) -> Percent {
        Percent::parse(&self.to_string())
    }

    /// Render with a forced `+` on non-negative values, e.g. `"+1.5%"`.
    pub fn signed(self, decimals: usize) -> String {
        let sign = if self.0 >= 0.0 { "+" } else { "" };
        format!("{}{:.*}%", sign, decimals, self.0)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.0)
    }
}

/// Parse a count cell such as `"1,204"`. Empty or unparseable input is 0;
/// fractional input is truncated toward zero.
pub fn parse_count_safe(s: Option<&str>) -> i64 {
    let Some(s) = s else { return 0 };
    let s = s.replace(',', "");
    let s = s.trim();
    if s.is_empty() {
        return 0;
    }
    if let Ok(v) = s.parse::<i64>() {
        return v;
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => v.trunc() as i64,
        _ => 0,
    }
}

pub fn average(v: &[f64]) -> f64 {
    // Returns 0 for an empty slice rather than NaN.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

/// Fixed decimals with en-locale thousands separators, e.g. `1,234.50`.
pub fn format_number(n: f64, decimals: usize) -> String {
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_val: i64 = parts.next().unwrap_or("0").parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = parts.next() {
        res.push('.');
        res.push_str(frac);
    }
    // Only show a minus sign when something non-zero survived rounding.
    if n < 0.0 && s.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-05-01T08:30:00.000Z`.
pub fn serialize_iso_millis<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}
