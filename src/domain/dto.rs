//! Data Transfer Objects for API requests and responses.

use serde::{Deserialize, Serialize};

use super::{ResetFrequency, SequenceFormat};

/// Standard API response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Response code (0 = success, non-zero = error).
    pub code: i32,

    /// Human-readable message.
    pub message: String,

    /// Response data (null on error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create a success response.
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            message: "success".to_string(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Create a success response with no data.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            code: 0,
            message: "success".to_string(),
            data: None,
        }
    }
}

/// Response carrying a freshly allocated identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifierResponse {
    /// Document type the identifier was allocated for.
    pub document_type: String,

    /// The allocated identifier.
    pub identifier: String,
}

/// Request to reserve or release an identifier out of band.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentifierRequest {
    /// Document type.
    pub document_type: String,

    /// Fully formatted identifier.
    pub identifier: String,
}

impl IdentifierRequest {
    /// Validate the request.
    ///
    /// # Errors
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.document_type.is_empty() {
            return Err("document_type is required".to_string());
        }
        if self.identifier.is_empty() {
            return Err("identifier is required".to_string());
        }
        Ok(())
    }
}

/// Response for a release request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseResponse {
    /// Whether the identifier was present and removed.
    pub released: bool,
}

/// Response carrying preview candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResponse {
    /// Document type previewed.
    pub document_type: String,

    /// Upcoming candidates from the current cursor, in order.
    pub candidates: Vec<String>,
}

/// Partial configuration update; unset fields keep their current values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigPatch {
    /// New prefix.
    pub prefix: Option<String>,

    /// New suffix.
    pub suffix: Option<String>,

    /// New pad length.
    pub pad_length: Option<u32>,

    /// New separator.
    pub separator: Option<String>,

    /// New format template.
    pub format: Option<SequenceFormat>,

    /// New date format. `Some(None)` is not expressible; an empty string clears.
    pub date_format: Option<String>,

    /// New custom pattern; an empty string clears.
    pub custom_pattern: Option<String>,

    /// New reset frequency.
    pub reset_frequency: Option<ResetFrequency>,

    /// New starting number.
    pub starting_number: Option<i64>,

    /// Activate or deactivate the config.
    pub is_active: Option<bool>,
}

/// Request to update one document type's configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateConfigRequest {
    /// Document type to update (materialized with defaults if new).
    pub document_type: String,

    /// Fields to merge.
    #[serde(flatten)]
    pub patch: ConfigPatch,
}

/// Request to apply one format across every configured document type.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkFormatRequest {
    /// Format template to apply.
    pub format: SequenceFormat,

    /// Separator to apply.
    pub separator: String,

    /// Pad length to apply.
    pub pad_length: u32,
}

/// One failed type in a bulk update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkFormatFailure {
    /// Document type that failed.
    pub document_type: String,

    /// Why it failed.
    pub reason: String,
}

/// Outcome of a bulk format update. Successes are not rolled back when
/// other types fail; callers surface this as a partial-success result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkFormatResponse {
    /// Types updated successfully.
    pub updated: Vec<String>,

    /// Types that failed, with reasons.
    pub failed: Vec<BulkFormatFailure>,
}

/// Request to reset one document type's counter and used index.
#[derive(Debug, Clone, Deserialize)]
pub struct ResetRequest {
    /// Document type to reset.
    pub document_type: String,

    /// Must be `true`; the reset is irreversible.
    #[serde(default)]
    pub confirm: bool,
}

/// Sequence statistics for one document type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsResponse {
    /// Document type.
    pub document_type: String,

    /// Numbers consumed since the current baseline.
    pub total_generated: i64,

    /// What the next identifier would look like (advisory; ignores the used index).
    pub next_number_preview: String,

    /// Identifiers currently in the used index.
    pub used_count: u64,
}
