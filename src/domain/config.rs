//! Sequence configuration types.
//!
//! One `SequenceConfig` exists per document type (`customer`, `invoice`,
//! `purchase-order`, ...) and controls how identifiers for that type are
//! rendered and when the counter resets.

use serde::{Deserialize, Serialize};

/// Identifier format template.
///
/// Non-empty segments are joined with the config's separator; a non-empty
/// suffix is appended as a final segment. `Custom` substitutes `{prefix}`,
/// `{date}`, and `{sequence}` into `custom_pattern` verbatim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SequenceFormat {
    /// `{padded(sequence)}`
    SequentialOnly,
    /// `{prefix}{sep}{padded(sequence)}`
    #[default]
    PrefixSequential,
    /// `{prefix}{sep}{unix_millis(now)}`
    PrefixTimestamp,
    /// `{prefix}{sep}{YYYY}{sep}{padded}`
    PrefixYearSequential,
    /// `{prefix}{sep}{YYYYMM}{sep}{padded}`
    PrefixYearmonthSequential,
    /// `{prefix}{sep}{YYYYMMDD}{sep}{padded}`
    PrefixDateSequential,
    /// `{YYYY}{sep}{prefix}{sep}{padded}`
    YearPrefixSequential,
    /// `{YYYYMMDD}{sep}{prefix}{sep}{padded}`
    DatePrefixSequential,
    /// `custom_pattern` with `{prefix}`, `{date}`, `{sequence}` substituted.
    Custom,
    /// Unrecognized format value; rendered as `prefix-sequential`.
    #[serde(other)]
    Unknown,
}

impl SequenceFormat {
    /// Whether identifiers of this format carry a sequential numeric tail.
    ///
    /// `PrefixTimestamp` derives its numeric part from the clock instead;
    /// `Custom` always carries `{sequence}` (enforced by validation).
    #[must_use]
    pub const fn is_sequential(self) -> bool {
        !matches!(self, Self::PrefixTimestamp)
    }

    /// Whether this format renders a prefix segment.
    #[must_use]
    pub const fn uses_prefix(self) -> bool {
        !matches!(self, Self::SequentialOnly)
    }
}

impl std::fmt::Display for SequenceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::SequentialOnly => "sequential-only",
            Self::PrefixSequential => "prefix-sequential",
            Self::PrefixTimestamp => "prefix-timestamp",
            Self::PrefixYearSequential => "prefix-year-sequential",
            Self::PrefixYearmonthSequential => "prefix-yearmonth-sequential",
            Self::PrefixDateSequential => "prefix-date-sequential",
            Self::YearPrefixSequential => "year-prefix-sequential",
            Self::DatePrefixSequential => "date-prefix-sequential",
            Self::Custom => "custom",
            Self::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// When the sequence counter resets to its starting baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetFrequency {
    /// Never reset the counter.
    #[default]
    Never,
    /// Reset when the calendar date changes.
    Daily,
    /// Reset when the calendar month changes.
    Monthly,
    /// Reset when the calendar year changes.
    Yearly,
}

/// Per-document-type sequence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceConfig {
    /// Document type key (`invoice`, `purchase-order`, ...). Sole identity key.
    pub document_type: String,

    /// Prefix segment, may be empty.
    #[serde(default)]
    pub prefix: String,

    /// Suffix segment, may be empty.
    #[serde(default)]
    pub suffix: String,

    /// Minimum digit width of the numeric portion.
    #[serde(default = "default_pad_length")]
    pub pad_length: u32,

    /// Separator inserted between non-empty segments.
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Format template.
    #[serde(default)]
    pub format: SequenceFormat,

    /// Date rendering for `custom` patterns containing `{date}`.
    /// Token alphabet: `YYYY`, `YY`, `MM`, `DD` (e.g. `YYYYMM`, `YYMMDD`, `MMYY`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,

    /// Template for the `custom` format; must contain `{sequence}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_pattern: Option<String>,

    /// When the counter resets to the starting baseline.
    #[serde(default)]
    pub reset_frequency: ResetFrequency,

    /// First value issued after initialization or a reset.
    #[serde(default = "default_starting_number")]
    pub starting_number: i64,

    /// Inactive configs reject allocation requests.
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

const fn default_pad_length() -> u32 {
    6
}

fn default_separator() -> String {
    "-".to_string()
}

const fn default_starting_number() -> i64 {
    1
}

const fn default_is_active() -> bool {
    true
}

/// Maximum digit width; wider padding than this signals a typo, not a need.
const MAX_PAD_LENGTH: u32 = 20;

impl SequenceConfig {
    /// Default configuration materialized at first use of a document type.
    ///
    /// The prefix is derived from the first three alphanumeric characters of
    /// the type key, uppercased (`invoice` -> `INV`, `purchase-order` -> `PUR`).
    #[must_use]
    pub fn defaults_for(document_type: &str) -> Self {
        let prefix: String = document_type
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .take(3)
            .collect::<String>()
            .to_uppercase();

        Self {
            document_type: document_type.to_string(),
            prefix,
            suffix: String::new(),
            pad_length: default_pad_length(),
            separator: default_separator(),
            format: SequenceFormat::PrefixSequential,
            date_format: None,
            custom_pattern: None,
            reset_frequency: ResetFrequency::Never,
            starting_number: default_starting_number(),
            is_active: true,
        }
    }

    /// The counter value that precedes the first issued number.
    #[must_use]
    pub const fn baseline(&self) -> i64 {
        self.starting_number - 1
    }

    /// Validate the configuration.
    ///
    /// Format problems are caught here, at configuration time, so a bad
    /// pattern can never corrupt issued numbers at allocation time.
    ///
    /// # Errors
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.document_type.is_empty() {
            return Err("document_type cannot be empty".to_string());
        }
        if self.document_type.len() > 255 {
            return Err("document_type cannot exceed 255 characters".to_string());
        }
        if self.pad_length > MAX_PAD_LENGTH {
            return Err(format!("pad_length cannot exceed {MAX_PAD_LENGTH}"));
        }
        if self.starting_number < 1 {
            return Err("starting_number must be at least 1".to_string());
        }

        if self.format == SequenceFormat::Custom {
            let pattern = self
                .custom_pattern
                .as_deref()
                .ok_or_else(|| "custom format requires custom_pattern".to_string())?;
            validate_custom_pattern(pattern)?;

            if pattern.contains("{date}") && self.date_format.is_none() {
                return Err("custom_pattern uses {date} but date_format is unset".to_string());
            }
        }

        if let Some(date_format) = self.date_format.as_deref() {
            validate_date_format(date_format)?;
        }

        Ok(())
    }
}

/// Validate a custom pattern string.
///
/// Placeholders are `{prefix}`, `{date}`, and `{sequence}`; `{sequence}` is
/// mandatory, everything outside braces is literal.
fn validate_custom_pattern(pattern: &str) -> Result<(), String> {
    if pattern.is_empty() {
        return Err("custom_pattern cannot be empty".to_string());
    }

    let mut chars = pattern.chars();
    let mut has_sequence = false;

    while let Some(c) = chars.next() {
        if c == '{' {
            let mut placeholder = String::new();
            let mut found_close = false;

            for inner in chars.by_ref() {
                if inner == '}' {
                    found_close = true;
                    break;
                }
                placeholder.push(inner);
            }

            if !found_close {
                return Err("unclosed placeholder in custom_pattern".to_string());
            }

            match placeholder.as_str() {
                "sequence" => has_sequence = true,
                "prefix" | "date" => {}
                other => return Err(format!("invalid placeholder: {{{other}}}")),
            }
        }
    }

    if !has_sequence {
        return Err("custom_pattern must contain {sequence}".to_string());
    }

    Ok(())
}

/// Validate a date format string.
///
/// Must contain at least one of the known tokens; other characters pass
/// through as literals when rendered.
fn validate_date_format(format: &str) -> Result<(), String> {
    if format.is_empty() {
        return Err("date_format cannot be empty".to_string());
    }

    const TOKENS: [&str; 4] = ["YYYY", "YY", "MM", "DD"];
    if TOKENS.iter().any(|t| format.contains(t)) {
        Ok(())
    } else {
        Err(format!(
            "date_format '{format}' contains none of YYYY, YY, MM, DD"
        ))
    }
}
