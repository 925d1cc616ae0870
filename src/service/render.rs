//! Identifier format renderer.
//!
//! Pure functions turning a sequence number and a configuration into a
//! formatted identifier. `now` is always a parameter, so rendering is
//! deterministic and usable for non-mutating previews.

use chrono::{DateTime, Datelike, Utc};

use crate::domain::{SequenceConfig, SequenceFormat};

/// Render an identifier for the given sequence number.
///
/// Non-empty segments are joined with the config's separator; a non-empty
/// suffix is appended as a final segment. Custom patterns are substituted
/// verbatim, without the suffix.
#[must_use]
pub fn render(sequence: i64, config: &SequenceConfig, now: DateTime<Utc>) -> String {
    let number = padded(sequence, config.pad_length);

    let segments: Vec<String> = match config.format {
        SequenceFormat::SequentialOnly => vec![number],
        SequenceFormat::PrefixSequential | SequenceFormat::Unknown => {
            vec![config.prefix.clone(), number]
        }
        SequenceFormat::PrefixTimestamp => {
            vec![config.prefix.clone(), now.timestamp_millis().to_string()]
        }
        SequenceFormat::PrefixYearSequential => {
            vec![config.prefix.clone(), render_date("YYYY", now), number]
        }
        SequenceFormat::PrefixYearmonthSequential => {
            vec![config.prefix.clone(), render_date("YYYYMM", now), number]
        }
        SequenceFormat::PrefixDateSequential => {
            vec![config.prefix.clone(), render_date("YYYYMMDD", now), number]
        }
        SequenceFormat::YearPrefixSequential => {
            vec![render_date("YYYY", now), config.prefix.clone(), number]
        }
        SequenceFormat::DatePrefixSequential => {
            vec![render_date("YYYYMMDD", now), config.prefix.clone(), number]
        }
        SequenceFormat::Custom => return render_custom(&number, config, now),
    };

    let mut segments = segments;
    if !config.suffix.is_empty() {
        segments.push(config.suffix.clone());
    }

    join_segments(&segments, &config.separator)
}

/// Substitute `{prefix}`, `{date}`, and `{sequence}` into the custom pattern.
///
/// Validation guarantees a pattern is present for custom configs; rendering
/// still degrades to `prefix-sequential` if one is missing, rather than
/// emitting a broken identifier.
fn render_custom(number: &str, config: &SequenceConfig, now: DateTime<Utc>) -> String {
    let Some(pattern) = config.custom_pattern.as_deref() else {
        let segments = [config.prefix.clone(), number.to_string()];
        return join_segments(&segments, &config.separator);
    };

    let date = config
        .date_format
        .as_deref()
        .map_or_else(String::new, |fmt| render_date(fmt, now));

    pattern
        .replace("{prefix}", &config.prefix)
        .replace("{date}", &date)
        .replace("{sequence}", number)
}

/// Left-zero-pad a sequence number to the configured width.
#[must_use]
pub fn padded(sequence: i64, pad_length: u32) -> String {
    format!("{sequence:0width$}", width = pad_length as usize)
}

/// Render a date format string (`YYYY`, `YY`, `MM`, `DD` tokens, longest
/// match first; everything else passes through as a literal).
#[must_use]
pub fn render_date(format: &str, now: DateTime<Utc>) -> String {
    let mut out = String::with_capacity(format.len() + 4);
    let mut rest = format;

    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix("YYYY") {
            out.push_str(&format!("{:04}", now.year()));
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("YY") {
            out.push_str(&format!("{:02}", now.year() % 100));
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("MM") {
            out.push_str(&format!("{:02}", now.month()));
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("DD") {
            out.push_str(&format!("{:02}", now.day()));
            rest = tail;
        } else {
            let mut chars = rest.chars();
            // rest is non-empty, so next() always yields
            if let Some(c) = chars.next() {
                out.push(c);
            }
            rest = chars.as_str();
        }
    }

    out
}

/// Join non-empty segments with the separator.
fn join_segments(segments: &[String], separator: &str) -> String {
    segments
        .iter()
        .filter(|s| !s.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(separator)
}
